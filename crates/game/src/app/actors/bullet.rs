use ninja_engine::{
    ActorCore, ActorId, AnimationClip, DamageOutcome, StateGate, StateMachine, Stateful, Vec2,
};

use super::common::{ActorError, EnemyContext, HasHealth, HitResult, Hovering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BulletState {
    /// Wind-up flash; no live hitbox yet.
    Spark,
    Armed,
}

/// Launch parameters handed to [`Bullet::fire`]. Velocity and acceleration x components are
/// given for a right-facing owner and mirrored by the bullet's facing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BulletLaunch {
    pub(crate) frame_width: f32,
    pub(crate) frame_height: f32,
    pub(crate) offset: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) acceleration: Option<Vec2>,
    pub(crate) max_velocity: Option<Vec2>,
    pub(crate) spark: AnimationClip,
    pub(crate) indestructible: bool,
}

impl BulletLaunch {
    pub(crate) const TURRET: BulletLaunch = BulletLaunch {
        frame_width: 9.0,
        frame_height: 12.0,
        offset: Vec2::new(0.0, 14.0),
        velocity: Vec2::new(96.0, 0.0),
        acceleration: None,
        max_velocity: None,
        spark: AnimationClip::new(2, 200),
        indestructible: true,
    };

    /// Blob bullets leave from the owner's body center without a wind-up.
    pub(crate) fn blob(owner: &ActorCore, velocity: Vec2) -> BulletLaunch {
        BulletLaunch {
            frame_width: 6.0,
            frame_height: 6.0,
            offset: Vec2::new(owner.body.width * 0.5, owner.body.height * 0.5),
            velocity,
            acceleration: None,
            max_velocity: None,
            spark: AnimationClip::new(1, 0),
            indestructible: false,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Bullet {
    core: ActorCore,
    machine: StateMachine<BulletState>,
    owner: ActorId,
    launch: BulletLaunch,
}

impl Bullet {
    /// Places a new bullet at the owner's body corner plus the launch offset (shifted past
    /// the body's width when the owner faces right) and starts the wind-up.
    pub(crate) fn fire(id: ActorId, owner: &ActorCore, launch: BulletLaunch, now_ms: u64) -> Self {
        let facing = owner.facing();
        let mut offset = launch.offset;
        if facing.sign() > 0.0 {
            offset.x += owner.body.width;
        }
        let position = Vec2::new(owner.body.x + offset.x, owner.body.y + offset.y);
        let mut core = ActorCore::new(id, launch.frame_width, launch.frame_height, position);
        core.turn(facing);
        core.body.allow_gravity = false;
        core.visible = true;
        Self {
            core,
            machine: StateMachine::new(BulletState::Spark, now_ms),
            owner: owner.id,
            launch,
        }
    }

    pub(crate) fn state(&self) -> BulletState {
        self.machine.current()
    }

    pub(crate) fn owner(&self) -> ActorId {
        self.owner
    }

    pub(crate) fn is_indestructible(&self) -> bool {
        self.launch.indestructible
    }

    pub(crate) fn update(&mut self, cx: &mut EnemyContext<'_>) -> Result<(), ActorError> {
        if self.machine.current() == BulletState::Spark
            && self.launch.spark.is_complete(self.elapsed_in_state(&*cx))
        {
            self.set_state(cx, BulletState::Armed);
        }
        Ok(())
    }

    /// Indestructible bullets reject every hit; the rest only while armed.
    pub(crate) fn accepts_hit(&self) -> bool {
        !self.launch.indestructible && self.machine.current() == BulletState::Armed
    }

    /// Applies the shared death rule. Bullets leave no explosion behind.
    pub(crate) fn got_hit(&mut self, strength: i32) -> HitResult {
        if !self.accepts_hit() {
            return HitResult::Ignored;
        }
        match self.core.apply_damage(strength) {
            DamageOutcome::Absorbed => HitResult::Ignored,
            DamageOutcome::Damaged { defeated: false } => HitResult::Hurt,
            DamageOutcome::Damaged { defeated: true } => {
                self.core.body.enabled = false;
                self.core.visible = false;
                HitResult::Defeated
            }
        }
    }

    fn arm(&mut self) {
        let sign = self.core.facing().sign();
        let velocity = self.launch.velocity;
        self.core.body.set_velocity(sign * velocity.x, velocity.y);
        if let Some(accel) = self.launch.acceleration {
            self.core.body.set_acceleration(sign * accel.x, accel.y);
        }
        if let Some(max) = self.launch.max_velocity {
            self.core.body.max_velocity = Some(max);
        }
    }
}

impl HasHealth for Bullet {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }
}

/// Projectiles never collide with tiles.
impl Hovering for Bullet {
    fn is_hovering(&self) -> bool {
        true
    }
}

impl<'a> Stateful<EnemyContext<'a>> for Bullet {
    type State = BulletState;

    fn state_machine(&self) -> &StateMachine<BulletState> {
        &self.machine
    }

    fn state_machine_mut(&mut self) -> &mut StateMachine<BulletState> {
        &mut self.machine
    }

    fn on_begin_state(
        &mut self,
        _cx: &mut EnemyContext<'a>,
        _previous: BulletState,
        next: BulletState,
    ) {
        if next == BulletState::Armed {
            self.arm();
        }
    }
}
