use ninja_engine::{ActorCore, ActorId, Facing, StateGate, StateMachine, Stateful, Vec2};

use super::bullet::{Bullet, BulletLaunch};
use super::common::{
    ActorError, EnemyContext, HasHealth, Hovering, SegmentAction, SpawnRequest,
    TargetsNearestPlayer,
};

const FRAME_WIDTH: f32 = 24.0;
const FRAME_HEIGHT: f32 = 32.0;
pub(crate) const TIME_TO_OPEN_MS: u64 = 2000;
pub(crate) const OPEN_FIRE_DELAY_MS: u64 = 500;
pub(crate) const FIRE_RATE_MS: u64 = 500;
pub(crate) const MAX_BULLETS: u32 = 2;
pub(crate) const TIME_TO_CLOSE_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArmoredTurretState {
    /// Shielded; hits are ignored.
    Closed,
    Open,
}

#[derive(Debug, Clone)]
pub(crate) struct ArmoredTurret {
    core: ActorCore,
    machine: StateMachine<ArmoredTurretState>,
    locked_player: Option<usize>,
    bullets_shot: u32,
}

impl ArmoredTurret {
    /// Starts closed. The first lock-on happens on the first update, once players exist.
    pub(crate) fn new(id: ActorId, center: Vec2, now_ms: u64) -> Self {
        let mut core = ActorCore::new(id, FRAME_WIDTH, FRAME_HEIGHT, center);
        core.turn(Facing::Left);
        Self {
            core,
            machine: StateMachine::new(ArmoredTurretState::Closed, now_ms),
            locked_player: None,
            bullets_shot: 0,
        }
    }

    pub(crate) fn state(&self) -> ArmoredTurretState {
        self.machine.current()
    }

    pub(crate) fn bullets_shot(&self) -> u32 {
        self.bullets_shot
    }

    pub(crate) fn is_shielded(&self) -> bool {
        self.machine.current() == ArmoredTurretState::Closed
    }

    pub(crate) fn update(&mut self, cx: &mut EnemyContext<'_>) -> Result<(), ActorError> {
        if self.machine.current() != ArmoredTurretState::Closed {
            return Ok(());
        }
        if self.locked_player.is_none() {
            self.lock_on(cx);
        }
        let target_x = self
            .locked_player
            .and_then(|slot| cx.player(slot))
            .map(|player| player.bounds.x);
        if let Some(target_x) = target_x {
            let body_x = self.core.body.x;
            match self.core.facing() {
                Facing::Right if target_x < body_x => self.core.turn(Facing::Left),
                Facing::Left if target_x > body_x => self.core.turn(Facing::Right),
                _ => {}
            }
        }
        if self.elapsed_in_state(&*cx) >= TIME_TO_OPEN_MS {
            self.set_state(cx, ArmoredTurretState::Open);
        }
        Ok(())
    }

    /// Runs a deferred fire or close step that this turret scheduled earlier.
    pub(crate) fn on_scheduled(
        &mut self,
        cx: &mut EnemyContext<'_>,
        action: SegmentAction,
    ) -> Result<(), ActorError> {
        match (self.machine.current(), action) {
            (ArmoredTurretState::Open, SegmentAction::TurretFire) => {
                self.fire(cx);
                Ok(())
            }
            (ArmoredTurretState::Open, SegmentAction::TurretClose) => {
                self.set_state(cx, ArmoredTurretState::Closed);
                Ok(())
            }
            (state, action) => Err(ActorError::UnhandledAction {
                actor: "armored_turret",
                state: format!("{state:?}"),
                action,
            }),
        }
    }

    fn lock_on(&mut self, cx: &EnemyContext<'_>) {
        self.locked_player = self.nearest(cx.players).map(|player| player.slot);
    }

    fn fire(&mut self, cx: &mut EnemyContext<'_>) {
        self.bullets_shot += 1;
        let bullet = Bullet::fire(cx.ids.allocate(), &self.core, BulletLaunch::TURRET, cx.now_ms);
        cx.spawns.push(SpawnRequest::Bullet(bullet));
        let id = self.core.id;
        if self.bullets_shot < MAX_BULLETS {
            cx.schedule_in(id, FIRE_RATE_MS, SegmentAction::TurretFire);
        } else {
            cx.schedule_in(id, TIME_TO_CLOSE_MS, SegmentAction::TurretClose);
        }
    }
}

impl HasHealth for ArmoredTurret {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }
}

impl TargetsNearestPlayer for ArmoredTurret {}
impl Hovering for ArmoredTurret {}

impl<'a> Stateful<EnemyContext<'a>> for ArmoredTurret {
    type State = ArmoredTurretState;

    fn state_machine(&self) -> &StateMachine<ArmoredTurretState> {
        &self.machine
    }

    fn state_machine_mut(&mut self) -> &mut StateMachine<ArmoredTurretState> {
        &mut self.machine
    }

    fn on_begin_state(
        &mut self,
        cx: &mut EnemyContext<'a>,
        _previous: ArmoredTurretState,
        next: ArmoredTurretState,
    ) {
        match next {
            ArmoredTurretState::Closed => {
                self.lock_on(cx);
                self.bullets_shot = 0;
            }
            ArmoredTurretState::Open => {
                cx.schedule_in(self.core.id, OPEN_FIRE_DELAY_MS, SegmentAction::TurretFire);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::common::fixtures::World;
    use super::*;
    use ninja_engine::Rect;

    fn run_due(world: &mut World, turret: &mut ArmoredTurret) {
        for due in world.schedule.drain_due(world.now_ms) {
            assert_eq!(due.owner, turret.core.id);
            turret.on_scheduled(&mut world.cx(), due.action).expect("scheduled");
        }
    }

    #[test]
    fn faces_the_locked_player_while_closed() {
        let mut world = World::with_floor();
        world.player_at(0, Rect::new(250.0, 156.0, 20.0, 36.0));
        let mut turret = ArmoredTurret::new(ActorId(50), Vec2::new(100.0, 176.0), 0);

        turret.update(&mut world.cx()).expect("update");

        assert_eq!(turret.core.facing(), Facing::Right);
        assert!(turret.is_shielded());
    }

    #[test]
    fn opens_fires_twice_and_closes_on_schedule() {
        let mut world = World::with_floor();
        world.player_at(0, Rect::new(20.0, 156.0, 20.0, 36.0));
        let mut turret = ArmoredTurret::new(ActorId(50), Vec2::new(100.0, 176.0), 0);

        world.now_ms = 1999;
        turret.update(&mut world.cx()).expect("update");
        assert_eq!(turret.state(), ArmoredTurretState::Closed);

        world.now_ms = 2000;
        turret.update(&mut world.cx()).expect("update");
        assert_eq!(turret.state(), ArmoredTurretState::Open);
        assert_eq!(world.schedule.pending_for(ActorId(50)), 1);

        world.now_ms = 2499;
        run_due(&mut world, &mut turret);
        assert!(world.spawns.is_empty());

        world.now_ms = 2500;
        run_due(&mut world, &mut turret);
        assert_eq!(turret.bullets_shot(), 1);
        assert_eq!(world.spawns.len(), 1);

        world.now_ms = 3000;
        run_due(&mut world, &mut turret);
        assert_eq!(turret.bullets_shot(), 2);
        assert_eq!(world.spawns.len(), 2);
        assert_eq!(turret.state(), ArmoredTurretState::Open);

        world.now_ms = 3500;
        run_due(&mut world, &mut turret);
        assert_eq!(turret.state(), ArmoredTurretState::Closed);
        assert_eq!(turret.bullets_shot(), 0);
        assert!(world.schedule.is_empty());
    }

    #[test]
    fn fired_bullets_leave_from_the_facing_side() {
        let mut world = World::with_floor();
        world.player_at(0, Rect::new(20.0, 156.0, 20.0, 36.0));
        let mut turret = ArmoredTurret::new(ActorId(50), Vec2::new(100.0, 176.0), 0);
        world.now_ms = 2000;
        turret.update(&mut world.cx()).expect("update");
        world.now_ms = 2500;
        run_due(&mut world, &mut turret);

        let Some(SpawnRequest::Bullet(bullet)) = world.spawns.first() else {
            panic!("expected a bullet spawn");
        };
        assert!(bullet.is_indestructible());
        assert_eq!(bullet.core().facing(), Facing::Left);
        assert_eq!(bullet.core().center(), Vec2::new(88.0, 174.0));
    }

    #[test]
    fn stray_action_is_reported() {
        let mut world = World::with_floor();
        let mut turret = ArmoredTurret::new(ActorId(50), Vec2::new(100.0, 176.0), 0);

        let err = turret
            .on_scheduled(&mut world.cx(), SegmentAction::TurretFire)
            .expect_err("closed turret cannot fire");

        assert!(matches!(err, ActorError::UnhandledAction { actor: "armored_turret", .. }));
    }
}
