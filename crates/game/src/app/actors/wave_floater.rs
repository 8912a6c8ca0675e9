use ninja_engine::{ActorCore, ActorId, Facing, StateGate, StateMachine, Stateful, Vec2};

use super::common::{
    ActorError, EnemyContext, HasHealth, Hovering, PlayerView, TargetsNearestPlayer,
};

const FRAME_WIDTH: f32 = 24.0;
const FRAME_HEIGHT: f32 = 32.0;
const MAX_X_SPEED: f32 = 48.0;
const MAX_Y_SPEED: f32 = 128.0;
const WAVE_AMPLITUDE: f32 = 40.0;
/// Milliseconds per radian of the wave.
const WAVE_PERIOD_DIVISOR: f32 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaveFloaterState {
    Fly,
}

pub(crate) fn wave_offset(elapsed_ms: u64) -> f32 {
    WAVE_AMPLITUDE * (elapsed_ms as f32 / WAVE_PERIOD_DIVISOR).sin()
}

/// Drifts horizontally while its vertical position follows a sine wave around the
/// height locked at spawn: the nearest player's center when one is alive, otherwise the
/// placement height.
#[derive(Debug, Clone)]
pub(crate) struct WaveFloater {
    core: ActorCore,
    machine: StateMachine<WaveFloaterState>,
    locked_y: f32,
}

impl WaveFloater {
    pub(crate) fn new(id: ActorId, center: Vec2, now_ms: u64) -> Self {
        let mut core = ActorCore::new(id, FRAME_WIDTH, FRAME_HEIGHT, center);
        core.turn(Facing::Left);
        core.body.allow_gravity = false;
        core.body.max_velocity = Some(Vec2::new(MAX_X_SPEED, MAX_Y_SPEED));
        let mut floater = Self {
            locked_y: core.body.y,
            core,
            machine: StateMachine::new(WaveFloaterState::Fly, now_ms),
        };
        floater.drift();
        floater
    }

    /// Re-anchors the wave at the current height, after the floater was moved into place.
    pub(crate) fn lock_height(&mut self) {
        self.locked_y = self.core.body.y;
    }

    /// Moves the wave's center line to the nearest player's center. The anchor is never
    /// re-tracked afterwards.
    pub(crate) fn lock_to_nearest(&mut self, players: &[PlayerView]) {
        let Some(target) = self.nearest(players) else {
            return;
        };
        let center = Vec2::new(self.core.center().x, target.center.y);
        self.core.place_center(center);
        self.lock_height();
    }

    #[cfg(test)]
    pub(crate) fn wave_center_y(&self) -> f32 {
        self.locked_y
    }

    pub(crate) fn state(&self) -> WaveFloaterState {
        self.machine.current()
    }

    pub(crate) fn update(&mut self, cx: &mut EnemyContext<'_>) -> Result<(), ActorError> {
        match self.machine.current() {
            WaveFloaterState::Fly => {
                let elapsed = self.elapsed_in_state(&*cx);
                self.core.body.y = self.locked_y + wave_offset(elapsed);
                self.drift();
            }
        }
        Ok(())
    }

    fn drift(&mut self) {
        self.core.body.velocity.x = MAX_X_SPEED * self.core.facing().sign();
    }
}

impl HasHealth for WaveFloater {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }
}

impl TargetsNearestPlayer for WaveFloater {}

impl Hovering for WaveFloater {
    fn is_hovering(&self) -> bool {
        true
    }
}

impl<'a> Stateful<EnemyContext<'a>> for WaveFloater {
    type State = WaveFloaterState;

    fn state_machine(&self) -> &StateMachine<WaveFloaterState> {
        &self.machine
    }

    fn state_machine_mut(&mut self) -> &mut StateMachine<WaveFloaterState> {
        &mut self.machine
    }
}
