use ninja_engine::{
    ActorCore, ActorId, AnchorX, AnchorY, Facing, ProximitySensor, SensorEvent, StateGate,
    StateMachine, Stateful, Vec2,
};

use super::bullet::{Bullet, BulletLaunch};
use super::common::{
    facing_toward, ActorError, EnemyContext, HasHealth, HasProximitySensor, Hovering, SpawnRequest,
    TargetsNearestPlayer,
};

const FRAME_SIZE: f32 = 16.0;
const BULLET_SPEED: f32 = 96.0;
const ROLLING_SPEED: f32 = 96.0;
const TIME_TO_PULSE_MS: u64 = 2500;
const TIME_TO_SHOOT_MS: u64 = 500;
const SENSOR_RADIUS: f32 = 64.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlobSpikeBallState {
    Wait,
    Pulse,
    Roll,
    Fall,
}

/// Which of the two forms a placed ball may take.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct BallForms {
    pub(crate) no_blob: bool,
    pub(crate) no_spike: bool,
}

/// Normalizes a map rotation in degrees to `0..360`.
pub(crate) fn orientation_from_rotation(rotation: f64) -> u16 {
    (rotation.round() as i64).rem_euclid(360) as u16
}

/// Bullet velocity for a shot pointing `orientation` degrees clockwise from straight up.
/// Off-axis orientations produce a motionless bullet.
pub(crate) fn bullet_velocity(orientation: u16) -> Vec2 {
    match orientation {
        0 => Vec2::new(0.0, -BULLET_SPEED),
        90 => Vec2::new(-BULLET_SPEED, 0.0),
        180 => Vec2::new(0.0, BULLET_SPEED),
        270 => Vec2::new(BULLET_SPEED, 0.0),
        _ => Vec2::ZERO,
    }
}

/// The three shots of a pulse: straight out, then both sides of the mounting surface.
pub(crate) fn burst_orientations(orientation: u16) -> [u16; 3] {
    [
        orientation,
        (orientation + 90) % 360,
        (orientation + 270) % 360,
    ]
}

/// Map object corner adjusted for the mounting rotation, before standard placement.
pub(crate) fn adjust_map_position(orientation: u16, x: f32, y: f32, width: f32, height: f32) -> (f32, f32) {
    let (half_w, half_h) = (width * 0.5, height * 0.5);
    match orientation {
        0 => (x + half_w, y),
        90 => (x, y + height + half_h),
        180 => (x - width - half_w, y + height),
        270 => (x - width, y - half_h),
        _ => (x, y),
    }
}

#[derive(Debug, Clone)]
pub(crate) struct BlobSpikeBall {
    core: ActorCore,
    machine: StateMachine<BlobSpikeBallState>,
    orientation: u16,
    sensor: Option<ProximitySensor>,
}

impl BlobSpikeBall {
    pub(crate) fn new(id: ActorId, center: Vec2, forms: BallForms, orientation: u16, now_ms: u64) -> Self {
        let mut core = ActorCore::new(id, FRAME_SIZE, FRAME_SIZE, center);
        core.turn(Facing::Left);
        let sensor = (!forms.no_blob && !forms.no_spike).then(|| {
            ProximitySensor::new(SENSOR_RADIUS, SENSOR_RADIUS, AnchorX::Center, AnchorY::Bottom)
        });
        let initial = if forms.no_blob {
            BlobSpikeBallState::Fall
        } else {
            BlobSpikeBallState::Wait
        };
        let mut ball = Self {
            core,
            machine: StateMachine::new(initial, now_ms),
            orientation,
            sensor,
        };
        if initial == BlobSpikeBallState::Wait {
            ball.settle();
        }
        ball
    }

    pub(crate) fn state(&self) -> BlobSpikeBallState {
        self.machine.current()
    }

    pub(crate) fn update(&mut self, cx: &mut EnemyContext<'_>) -> Result<(), ActorError> {
        self.update_sensor(cx);
        match self.machine.current() {
            BlobSpikeBallState::Fall => {
                if self.core.body.on_floor() {
                    self.set_state(cx, BlobSpikeBallState::Roll);
                }
            }
            BlobSpikeBallState::Pulse => {
                if self.elapsed_in_state(&*cx) >= TIME_TO_SHOOT_MS {
                    self.fire(cx);
                    self.set_state(cx, BlobSpikeBallState::Wait);
                }
            }
            BlobSpikeBallState::Roll => {
                if !self.core.body.on_floor() {
                    self.set_state(cx, BlobSpikeBallState::Fall);
                } else if self.core.body.on_wall() {
                    self.core.turn(self.core.facing().opposite());
                    self.core.body.velocity.x = ROLLING_SPEED * self.core.facing().sign();
                }
            }
            BlobSpikeBallState::Wait => {
                if self.elapsed_in_state(&*cx) >= TIME_TO_PULSE_MS {
                    self.set_state(cx, BlobSpikeBallState::Pulse);
                }
            }
        }
        Ok(())
    }

    fn update_sensor(&mut self, cx: &mut EnemyContext<'_>) {
        for event in self.sense_players(cx.players) {
            match event {
                SensorEvent::PlayerIn { .. } if self.machine.is(BlobSpikeBallState::Wait) => {
                    self.set_state(cx, BlobSpikeBallState::Roll);
                }
                SensorEvent::PlayerOut { num_in: 0, .. }
                    if self.machine.is(BlobSpikeBallState::Roll) =>
                {
                    self.set_state(cx, BlobSpikeBallState::Wait);
                }
                _ => {}
            }
        }
    }

    fn fire(&mut self, cx: &mut EnemyContext<'_>) {
        for orientation in burst_orientations(self.orientation) {
            let launch = BulletLaunch::blob(&self.core, bullet_velocity(orientation));
            let bullet = Bullet::fire(cx.ids.allocate(), &self.core, launch, cx.now_ms);
            cx.spawns.push(SpawnRequest::Bullet(bullet));
        }
    }

    fn settle(&mut self) {
        self.core.body.halt();
        self.core.body.allow_gravity = false;
    }
}

impl HasHealth for BlobSpikeBall {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }
}

impl TargetsNearestPlayer for BlobSpikeBall {}
impl Hovering for BlobSpikeBall {}

impl HasProximitySensor for BlobSpikeBall {
    fn sensor_mut(&mut self) -> Option<&mut ProximitySensor> {
        self.sensor.as_mut()
    }
}

impl<'a> Stateful<EnemyContext<'a>> for BlobSpikeBall {
    type State = BlobSpikeBallState;

    fn state_machine(&self) -> &StateMachine<BlobSpikeBallState> {
        &self.machine
    }

    fn state_machine_mut(&mut self) -> &mut StateMachine<BlobSpikeBallState> {
        &mut self.machine
    }

    fn on_begin_state(
        &mut self,
        cx: &mut EnemyContext<'a>,
        _previous: BlobSpikeBallState,
        next: BlobSpikeBallState,
    ) {
        match next {
            BlobSpikeBallState::Roll => {
                if let Some(player) = self.nearest(cx.players) {
                    let facing = facing_toward(&self.core.bounds(), &player.bounds);
                    self.core.turn(facing);
                }
                self.core.body.velocity.x = ROLLING_SPEED * self.core.facing().sign();
                self.core.body.allow_gravity = true;
            }
            BlobSpikeBallState::Wait => self.settle(),
            BlobSpikeBallState::Pulse | BlobSpikeBallState::Fall => {}
        }
    }
}
