use ninja_engine::{
    ActorCore, ActorId, Facing, Rect, StateGate, StateMachine, Stateful, Vec2, SCREEN_HEIGHT,
};

use super::common::{
    facing_toward, ActorError, EnemyContext, HasHealth, Hovering, PlayerView,
    TargetsNearestPlayer,
};

const FRAME_WIDTH: f32 = 24.0;
const FRAME_HEIGHT: f32 = 27.0;
const CHASE_SPEED: f32 = 32.0;
const HOVER_TIME_MS: u64 = 1000;
const DETECTION_MARGIN_X: f32 = 16.0;
/// Chases a point this far below the player's top so the claw lines up with the head.
const CHASE_TARGET_DROP: f32 = 16.0;
/// Dead zone around the chase target on both axes.
const CHASE_TOLERANCE: f32 = 1.0;
pub(crate) const DEFAULT_STOP_Y: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChopperClawState {
    Wait,
    Descend,
    Hover,
    Chase,
}

/// Column below the claw that triggers its descent.
pub(crate) fn detection_zone(bounds: &Rect) -> Rect {
    Rect::new(
        bounds.x - DETECTION_MARGIN_X,
        bounds.y,
        bounds.width + DETECTION_MARGIN_X * 2.0,
        SCREEN_HEIGHT,
    )
}

/// `None` inside the dead zone.
fn chase_component(delta: f32) -> Option<f32> {
    if delta < -CHASE_TOLERANCE {
        Some(CHASE_SPEED)
    } else if delta > CHASE_TOLERANCE {
        Some(-CHASE_SPEED)
    } else {
        None
    }
}

/// Velocity that steers `body` toward the locked player's head. Inside the horizontal dead
/// zone the claw keeps its current x velocity; inside the vertical one it stops on y.
pub(crate) fn chase_velocity(body: &Rect, player: &Rect, current: Vec2) -> Vec2 {
    let dx = body.x - player.x;
    let dy = body.y - (player.y + CHASE_TARGET_DROP);
    Vec2::new(
        chase_component(dx).unwrap_or(current.x),
        chase_component(dy).unwrap_or(0.0),
    )
}

#[derive(Debug, Clone)]
pub(crate) struct ChopperClaw {
    core: ActorCore,
    machine: StateMachine<ChopperClawState>,
    stop_y: f32,
    locked_player: Option<usize>,
}

impl ChopperClaw {
    pub(crate) fn new(id: ActorId, center: Vec2, stop_y: Option<f32>, now_ms: u64) -> Self {
        let mut core = ActorCore::new(id, FRAME_WIDTH, FRAME_HEIGHT, center);
        core.turn(Facing::Left);
        let mut claw = Self {
            core,
            machine: StateMachine::new(ChopperClawState::Wait, now_ms),
            stop_y: stop_y.unwrap_or(DEFAULT_STOP_Y),
            locked_player: None,
        };
        claw.enter_wait();
        claw
    }

    pub(crate) fn state(&self) -> ChopperClawState {
        self.machine.current()
    }

    pub(crate) fn stop_y(&self) -> f32 {
        self.stop_y
    }

    pub(crate) fn locked_player(&self) -> Option<usize> {
        self.locked_player
    }

    pub(crate) fn update(&mut self, cx: &mut EnemyContext<'_>) -> Result<(), ActorError> {
        match self.machine.current() {
            ChopperClawState::Wait => {
                let zone = detection_zone(&self.core.bounds());
                if let Some(player) = cx.players.iter().find(|p| zone.intersects(&p.bounds)) {
                    self.locked_player = Some(player.slot);
                    self.set_state(cx, ChopperClawState::Descend);
                }
            }
            ChopperClawState::Descend => {
                if self.core.body.y >= self.stop_y {
                    self.set_state(cx, ChopperClawState::Hover);
                }
            }
            ChopperClawState::Hover => {
                if self.elapsed_in_state(&*cx) >= HOVER_TIME_MS {
                    self.set_state(cx, ChopperClawState::Chase);
                }
            }
            ChopperClawState::Chase => {
                if let Some(player) = self.target(cx) {
                    self.core.body.velocity =
                        chase_velocity(&self.core.bounds(), &player.bounds, self.core.body.velocity);
                }
            }
        }
        Ok(())
    }

    fn target<'p>(&self, cx: &'p EnemyContext<'_>) -> Option<&'p PlayerView> {
        self.locked_player.and_then(|slot| cx.player(slot))
    }

    fn enter_wait(&mut self) {
        self.core.body.halt();
        self.core.body.allow_gravity = false;
        self.core.set_custom_hitbox(Rect::new(5.0, 0.0, 14.0, 26.0));
    }
}

impl HasHealth for ChopperClaw {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }
}

impl TargetsNearestPlayer for ChopperClaw {}

impl Hovering for ChopperClaw {
    fn is_hovering(&self) -> bool {
        true
    }
}

impl<'a> Stateful<EnemyContext<'a>> for ChopperClaw {
    type State = ChopperClawState;

    fn state_machine(&self) -> &StateMachine<ChopperClawState> {
        &self.machine
    }

    fn state_machine_mut(&mut self) -> &mut StateMachine<ChopperClawState> {
        &mut self.machine
    }

    fn on_begin_state(
        &mut self,
        cx: &mut EnemyContext<'a>,
        _previous: ChopperClawState,
        next: ChopperClawState,
    ) {
        match next {
            ChopperClawState::Wait => self.enter_wait(),
            ChopperClawState::Descend => self.core.body.allow_gravity = true,
            ChopperClawState::Hover => {
                self.core.set_custom_hitbox(Rect::new(0.0, 11.0, 24.0, 16.0));
                self.core.body.halt();
                self.core.body.allow_gravity = false;
            }
            ChopperClawState::Chase => {
                if let Some(player) = self.target(cx).copied() {
                    let facing = facing_toward(&self.core.bounds(), &player.bounds);
                    self.core.turn(facing);
                }
                self.core.body.velocity.x = CHASE_SPEED * self.core.facing().sign();
            }
        }
    }
}
