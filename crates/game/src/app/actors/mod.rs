pub(crate) mod alien;
pub(crate) mod armored_turret;
pub(crate) mod blob_spike_ball;
pub(crate) mod bullet;
pub(crate) mod chopper_claw;
pub(crate) mod common;
pub(crate) mod droid_ball;
pub(crate) mod enemy;
pub(crate) mod explosion;
pub(crate) mod ninja;
pub(crate) mod power_up;
pub(crate) mod soldier;
pub(crate) mod wasp;
pub(crate) mod wave_floater;

pub(crate) use bullet::Bullet;
pub(crate) use common::{
    ActorError, EnemyContext, HitResult, PlayerView, SegmentAction, SpawnRequest,
};
pub(crate) use enemy::Enemy;
pub(crate) use explosion::Explosion;
pub(crate) use ninja::{
    InvincibilitySource, LevelLimits, Ninja, NinjaStats, PlatformRef, PlayerContext, PlayerEvent,
};
pub(crate) use power_up::{PowerUp, PowerUpVariant};
