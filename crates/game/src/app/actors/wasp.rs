use ninja_engine::{ActorCore, ActorId, Facing, Rect, StateMachine, Stateful, Vec2};

use super::common::{ActorError, EnemyContext, HasHealth, Hovering, TargetsNearestPlayer};

const FRAME_WIDTH: f32 = 31.0;
const FRAME_HEIGHT: f32 = 55.0;
const MAX_HOVER_X_SPEED: f32 = 160.0;
const MAX_HOVER_Y_SPEED: f32 = 64.0;
const X_ACCELERATION: f32 = 128.0;
const Y_ACCELERATION: f32 = 128.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaspState {
    Fly,
}

/// New acceleration along one axis. Only pushes when the current velocity is zero or
/// heading away from the target, otherwise keeps `current`.
pub(crate) fn chase_axis(target: f32, position: f32, velocity: f32, accel: f32, current: f32) -> f32 {
    if target < position {
        if velocity >= 0.0 {
            return -accel;
        }
    } else if velocity <= 0.0 {
        return accel;
    }
    current
}

/// Sprite flip for a change of horizontal velocity; only a sign crossing flips it.
pub(crate) fn flip_on_crossing(previous_vx: f32, vx: f32) -> Option<Facing> {
    if vx > 0.0 && previous_vx <= 0.0 {
        Some(Facing::Right)
    } else if vx < 0.0 && previous_vx >= 0.0 {
        Some(Facing::Left)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Wasp {
    core: ActorCore,
    machine: StateMachine<WaspState>,
    previous_vx: f32,
}

impl Wasp {
    pub(crate) fn new(id: ActorId, center: Vec2, now_ms: u64) -> Self {
        let mut core = ActorCore::new(id, FRAME_WIDTH, FRAME_HEIGHT, center);
        core.turn(Facing::Left);
        core.body.allow_gravity = false;
        core.body.max_velocity = Some(Vec2::new(MAX_HOVER_X_SPEED, MAX_HOVER_Y_SPEED));
        core.set_custom_hitbox(Rect::new(7.0, 18.0, 24.0, 37.0));
        Self {
            core,
            machine: StateMachine::new(WaspState::Fly, now_ms),
            previous_vx: 0.0,
        }
    }

    pub(crate) fn state(&self) -> WaspState {
        self.machine.current()
    }

    pub(crate) fn update(&mut self, cx: &mut EnemyContext<'_>) -> Result<(), ActorError> {
        match self.machine.current() {
            WaspState::Fly => self.chase(cx),
        }
        Ok(())
    }

    fn chase(&mut self, cx: &EnemyContext<'_>) {
        let velocity = self.core.body.velocity;
        if let Some(facing) = flip_on_crossing(self.previous_vx, velocity.x) {
            self.core.turn(facing);
        }
        if let Some(player) = self.nearest(cx.players) {
            let body = &mut self.core.body;
            let accel = body.acceleration;
            body.acceleration = Vec2::new(
                chase_axis(player.bounds.x, body.x, velocity.x, X_ACCELERATION, accel.x),
                chase_axis(player.bounds.y, body.y, velocity.y, Y_ACCELERATION, accel.y),
            );
        }
        self.previous_vx = velocity.x;
    }
}

impl HasHealth for Wasp {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }
}

impl TargetsNearestPlayer for Wasp {}

impl Hovering for Wasp {
    fn is_hovering(&self) -> bool {
        true
    }
}

impl<'a> Stateful<EnemyContext<'a>> for Wasp {
    type State = WaspState;

    fn state_machine(&self) -> &StateMachine<WaspState> {
        &self.machine
    }

    fn state_machine_mut(&mut self) -> &mut StateMachine<WaspState> {
        &mut self.machine
    }

    fn on_begin_state(&mut self, cx: &mut EnemyContext<'a>, _previous: WaspState, next: WaspState) {
        match next {
            WaspState::Fly => self.chase(cx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::common::fixtures::World;
    use super::*;

    #[test]
    fn accelerates_toward_player_only_when_not_already_closing_in() {
        assert_eq!(chase_axis(10.0, 100.0, 0.0, 128.0, 0.0), -128.0);
        assert_eq!(chase_axis(10.0, 100.0, 50.0, 128.0, 128.0), -128.0);
        assert_eq!(chase_axis(10.0, 100.0, -50.0, 128.0, -128.0), -128.0);
        assert_eq!(chase_axis(200.0, 100.0, -20.0, 128.0, -128.0), 128.0);
        assert_eq!(chase_axis(200.0, 100.0, 20.0, 128.0, -128.0), -128.0);
    }

    #[test]
    fn sprite_flips_only_on_sign_crossing() {
        assert_eq!(flip_on_crossing(0.0, 5.0), Some(Facing::Right));
        assert_eq!(flip_on_crossing(5.0, 8.0), None);
        assert_eq!(flip_on_crossing(8.0, 0.0), None);
        assert_eq!(flip_on_crossing(0.0, -1.0), Some(Facing::Left));
        assert_eq!(flip_on_crossing(-4.0, -1.0), None);
    }

    #[test]
    fn hovers_with_capped_velocity_and_no_gravity() {
        let wasp = Wasp::new(ActorId(5), Vec2::new(200.0, 60.0), 0);
        assert!(wasp.is_hovering());
        assert!(!wasp.core.body.allow_gravity);
        assert_eq!(wasp.core.body.max_velocity, Some(Vec2::new(160.0, 64.0)));
        assert_eq!(wasp.state(), WaspState::Fly);
    }

    #[test]
    fn chases_nearest_player_and_turns_when_overtaking() {
        let mut world = World::with_floor();
        world.player_at(0, Rect::new(300.0, 150.0, 20.0, 36.0));
        let mut wasp = Wasp::new(ActorId(5), Vec2::new(200.0, 60.0), 0);

        wasp.update(&mut world.cx()).expect("update");
        assert_eq!(wasp.core.body.acceleration, Vec2::new(128.0, 128.0));
        assert_eq!(wasp.core.facing(), Facing::Left);

        wasp.core.body.velocity.x = 10.0;
        wasp.update(&mut world.cx()).expect("update");
        assert_eq!(wasp.core.facing(), Facing::Right);
    }
}
