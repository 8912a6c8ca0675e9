use ninja_engine::{ActorCore, ActorId, Facing, Rect, StateGate, StateMachine, Stateful, Vec2};
use rand::Rng;

use super::common::{ActorError, EnemyContext, HasHealth, Hovering, TargetsNearestPlayer};

const FRAME_WIDTH: f32 = 16.0;
const FRAME_HEIGHT: f32 = 16.0;
const MIN_BOUNCE_X_SPEED: i32 = 32;
const MAX_BOUNCE_X_SPEED: i32 = 64;
const MIN_BOUNCE_Y_SPEED: i32 = -300;
const MAX_BOUNCE_Y_SPEED: i32 = -150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DroidBallState {
    Wait,
    Bounce,
}

/// Area around the ball that wakes it up: 16px to either side and 32px above.
pub(crate) fn detection_zone(bounds: &Rect) -> Rect {
    Rect::new(
        bounds.x - 16.0,
        bounds.y - 32.0,
        bounds.width + 32.0,
        bounds.height + 32.0,
    )
}

/// Horizontal bounce direction relative to the player, compared on body left edges.
pub(crate) fn bounce_direction(ball_x: f32, player_x: f32, towards: bool) -> f32 {
    let player_is_right = ball_x < player_x;
    if player_is_right == towards {
        1.0
    } else {
        -1.0
    }
}

#[derive(Debug, Clone)]
pub(crate) struct DroidBall {
    core: ActorCore,
    machine: StateMachine<DroidBallState>,
    locked_player: Option<usize>,
    /// -1 left, 1 right, 0 while waiting.
    direction: f32,
    x_speed: f32,
}

impl DroidBall {
    pub(crate) fn new(id: ActorId, center: Vec2, now_ms: u64) -> Self {
        let mut core = ActorCore::new(id, FRAME_WIDTH, FRAME_HEIGHT, center);
        core.turn(Facing::Left);
        Self {
            core,
            machine: StateMachine::new(DroidBallState::Wait, now_ms),
            locked_player: None,
            direction: 0.0,
            x_speed: 0.0,
        }
    }

    pub(crate) fn state(&self) -> DroidBallState {
        self.machine.current()
    }

    pub(crate) fn update(&mut self, cx: &mut EnemyContext<'_>) -> Result<(), ActorError> {
        match self.machine.current() {
            DroidBallState::Wait => {
                let zone = detection_zone(&self.core.bounds());
                if let Some(player) = cx.players.iter().find(|p| zone.intersects(&p.bounds)) {
                    self.locked_player = Some(player.slot);
                    self.set_state(cx, DroidBallState::Bounce);
                }
            }
            DroidBallState::Bounce => {
                if self.core.body.on_floor() {
                    self.bounce(cx, true);
                } else if self.core.body.on_wall() {
                    self.direction = -self.direction;
                    self.core.body.velocity.x = self.direction * self.x_speed;
                }
            }
        }
        Ok(())
    }

    fn bounce(&mut self, cx: &mut EnemyContext<'_>, towards: bool) {
        let Some(player_x) = self
            .locked_player
            .and_then(|slot| cx.player(slot))
            .map(|player| player.bounds.x)
        else {
            return;
        };
        self.direction = bounce_direction(self.core.body.x, player_x, towards);
        self.x_speed = cx.rng.gen_range(MIN_BOUNCE_X_SPEED..=MAX_BOUNCE_X_SPEED) as f32;
        let y_speed = cx.rng.gen_range(MIN_BOUNCE_Y_SPEED..=MAX_BOUNCE_Y_SPEED) as f32;
        self.core
            .body
            .set_velocity(self.direction * self.x_speed, y_speed);
    }
}

impl HasHealth for DroidBall {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }
}

impl TargetsNearestPlayer for DroidBall {}
impl Hovering for DroidBall {}

impl<'a> Stateful<EnemyContext<'a>> for DroidBall {
    type State = DroidBallState;

    fn state_machine(&self) -> &StateMachine<DroidBallState> {
        &self.machine
    }

    fn state_machine_mut(&mut self) -> &mut StateMachine<DroidBallState> {
        &mut self.machine
    }

    fn on_begin_state(
        &mut self,
        cx: &mut EnemyContext<'a>,
        _previous: DroidBallState,
        next: DroidBallState,
    ) {
        if next == DroidBallState::Bounce {
            // first hop always goes away from the player
            self.bounce(cx, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::common::fixtures::World;
    use super::*;

    fn grounded_ball() -> DroidBall {
        let mut ball = DroidBall::new(ActorId(4), Vec2::new(100.0, 184.0), 0);
        ball.core.body.blocked.down = true;
        ball
    }

    #[test]
    fn direction_table() {
        assert_eq!(bounce_direction(10.0, 50.0, true), 1.0);
        assert_eq!(bounce_direction(10.0, 50.0, false), -1.0);
        assert_eq!(bounce_direction(90.0, 50.0, true), -1.0);
        assert_eq!(bounce_direction(90.0, 50.0, false), 1.0);
    }

    #[test]
    fn wakes_on_nearby_player_and_first_hops_away() {
        let mut world = World::with_floor();
        world.player_at(0, Rect::new(300.0, 156.0, 20.0, 36.0));
        let mut ball = DroidBall::new(ActorId(4), Vec2::new(100.0, 184.0), 0);

        ball.update(&mut world.cx()).expect("update");
        assert_eq!(ball.state(), DroidBallState::Wait);

        world.player_at(0, Rect::new(120.0, 156.0, 20.0, 36.0));
        ball.update(&mut world.cx()).expect("update");

        assert_eq!(ball.state(), DroidBallState::Bounce);
        let velocity = ball.core.body.velocity;
        assert!((-64.0..=-32.0).contains(&velocity.x), "vx {}", velocity.x);
        assert!((-300.0..=-150.0).contains(&velocity.y), "vy {}", velocity.y);
    }

    #[test]
    fn landing_bounces_toward_the_locked_player() {
        let mut world = World::with_floor();
        world.player_at(0, Rect::new(200.0, 156.0, 20.0, 36.0));
        let mut ball = grounded_ball();
        ball.locked_player = Some(0);
        ball.machine = StateMachine::new(DroidBallState::Bounce, 0);

        for _ in 0..20 {
            ball.update(&mut world.cx()).expect("update");
            let velocity = ball.core.body.velocity;
            assert!((32.0..=64.0).contains(&velocity.x), "vx {}", velocity.x);
            assert!((-300.0..=-150.0).contains(&velocity.y), "vy {}", velocity.y);
        }
    }

    #[test]
    fn wall_reverses_bounce_keeping_speed() {
        let mut world = World::with_floor();
        let mut ball = DroidBall::new(ActorId(4), Vec2::new(100.0, 100.0), 0);
        ball.machine = StateMachine::new(DroidBallState::Bounce, 0);
        ball.direction = 1.0;
        ball.x_speed = 40.0;
        ball.core.body.blocked.right = true;

        ball.update(&mut world.cx()).expect("update");

        assert_eq!(ball.direction, -1.0);
        assert_eq!(ball.core.body.velocity.x, -40.0);
    }
}
