use ninja_engine::{
    ActorCore, ActorId, Facing, Rect, StateGate, StateMachine, Stateful, Vec2,
};

use super::common::{
    probe_ahead, ActorError, EnemyContext, HasHealth, Hovering, TargetsNearestPlayer,
};

const FRAME_WIDTH: f32 = 27.0;
const FRAME_HEIGHT: f32 = 32.0;
const WALKING_SPEED: f32 = 80.0;
const JUMP_SPEED: f32 = -300.0;
const GRAVITY_SCALE: f32 = 0.5;
/// How far ahead a blocking tile makes the alien jump instead of walking into it.
const LOOKAHEAD: f32 = 8.0;
const VARIANT: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AlienState {
    Jump,
    Run,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HopFacts {
    pub(crate) on_floor: bool,
    pub(crate) on_wall: bool,
    pub(crate) blocked_ahead: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HopStep {
    pub(crate) next: AlienState,
    pub(crate) turn: bool,
}

pub(crate) fn hop_step(state: AlienState, facts: HopFacts) -> HopStep {
    match state {
        AlienState::Jump if facts.on_floor => HopStep {
            next: AlienState::Run,
            turn: false,
        },
        AlienState::Jump => HopStep {
            next: AlienState::Jump,
            turn: facts.on_wall,
        },
        AlienState::Run if !facts.on_floor || facts.blocked_ahead => HopStep {
            next: AlienState::Jump,
            turn: false,
        },
        AlienState::Run => HopStep {
            next: AlienState::Run,
            turn: facts.on_wall,
        },
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Alien {
    core: ActorCore,
    machine: StateMachine<AlienState>,
}

impl Alien {
    pub(crate) fn new(id: ActorId, center: Vec2, now_ms: u64) -> Self {
        let mut core = ActorCore::new(id, FRAME_WIDTH, FRAME_HEIGHT, center);
        core.variant = Some(VARIANT);
        core.set_custom_hitbox(Rect::new(6.0, 0.0, 15.0, 32.0));
        core.body.gravity_scale = GRAVITY_SCALE;
        core.turn(Facing::Left);
        let mut alien = Self {
            core,
            machine: StateMachine::new(AlienState::Jump, now_ms),
        };
        alien.leap();
        alien
    }

    pub(crate) fn state(&self) -> AlienState {
        self.machine.current()
    }

    pub(crate) fn update(&mut self, cx: &mut EnemyContext<'_>) -> Result<(), ActorError> {
        let bounds = self.core.bounds();
        let ahead = probe_ahead(&bounds, self.core.facing(), LOOKAHEAD, bounds.height * 0.5);
        let facts = HopFacts {
            on_floor: self.core.body.on_floor(),
            on_wall: self.core.body.on_wall(),
            blocked_ahead: cx.tiles.is_solid_at(ahead),
        };
        let step = hop_step(self.machine.current(), facts);
        if step.turn {
            self.core.turn(self.core.facing().opposite());
        }
        self.set_state(cx, step.next);
        self.core.body.velocity.x = WALKING_SPEED * self.core.facing().sign();
        Ok(())
    }

    fn leap(&mut self) {
        let vx = WALKING_SPEED * self.core.facing().sign();
        self.core.body.set_velocity(vx, JUMP_SPEED);
    }
}

impl HasHealth for Alien {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }
}

impl TargetsNearestPlayer for Alien {}
impl Hovering for Alien {}

impl<'a> Stateful<EnemyContext<'a>> for Alien {
    type State = AlienState;

    fn state_machine(&self) -> &StateMachine<AlienState> {
        &self.machine
    }

    fn state_machine_mut(&mut self) -> &mut StateMachine<AlienState> {
        &mut self.machine
    }

    fn on_begin_state(
        &mut self,
        _cx: &mut EnemyContext<'a>,
        _previous: AlienState,
        next: AlienState,
    ) {
        match next {
            AlienState::Jump => self.leap(),
            AlienState::Run => {
                let vx = WALKING_SPEED * self.core.facing().sign();
                self.core.body.set_velocity(vx, 0.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::common::fixtures::World;
    use super::*;

    fn facts(on_floor: bool, on_wall: bool, blocked_ahead: bool) -> HopFacts {
        HopFacts {
            on_floor,
            on_wall,
            blocked_ahead,
        }
    }

    #[test]
    fn transition_table() {
        assert_eq!(
            hop_step(AlienState::Jump, facts(true, false, false)).next,
            AlienState::Run
        );
        assert!(hop_step(AlienState::Jump, facts(false, true, false)).turn);
        assert_eq!(
            hop_step(AlienState::Run, facts(false, false, false)).next,
            AlienState::Jump
        );
        assert_eq!(
            hop_step(AlienState::Run, facts(true, false, true)).next,
            AlienState::Jump
        );
        let step = hop_step(AlienState::Run, facts(true, true, false));
        assert_eq!(step.next, AlienState::Run);
        assert!(step.turn);
    }

    #[test]
    fn spawns_mid_jump_with_floaty_gravity() {
        let alien = Alien::new(ActorId(3), Vec2::new(50.0, 50.0), 0);
        assert_eq!(alien.state(), AlienState::Jump);
        assert_eq!(alien.core.body.velocity, Vec2::new(-WALKING_SPEED, JUMP_SPEED));
        assert_eq!(alien.core.body.gravity_scale, 0.5);
        assert_eq!(alien.core.variant, Some(1));
    }

    #[test]
    fn landing_switches_to_run_and_leaving_floor_jumps_again() {
        let mut world = World::with_floor();
        let mut alien = Alien::new(ActorId(3), Vec2::new(100.0, 176.0), 0);
        alien.core.body.y = 192.0 - alien.core.body.height;
        alien.core.body.blocked.down = true;

        alien.update(&mut world.cx()).expect("update");
        assert_eq!(alien.state(), AlienState::Run);
        assert_eq!(alien.core.body.velocity.y, 0.0);

        alien.core.body.blocked.down = false;
        world.now_ms = 400;
        alien.update(&mut world.cx()).expect("update");
        assert_eq!(alien.state(), AlienState::Jump);
        assert_eq!(alien.core.body.velocity.y, JUMP_SPEED);
        assert_eq!(alien.elapsed_in_state(&world.cx()), 0);
    }
}
