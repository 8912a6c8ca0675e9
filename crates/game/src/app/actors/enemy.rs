use ninja_engine::{ActorCore, DamageOutcome};

use super::alien::Alien;
use super::armored_turret::ArmoredTurret;
use super::blob_spike_ball::BlobSpikeBall;
use super::chopper_claw::ChopperClaw;
use super::common::{
    ActorError, EnemyContext, HasHealth, HitResult, Hovering, SegmentAction, SpawnRequest,
};
use super::droid_ball::DroidBall;
use super::soldier::Soldier;
use super::wasp::Wasp;
use super::wave_floater::WaveFloater;

/// Every map-placed hostile actor. The roster holds these by value.
#[derive(Debug, Clone)]
pub(crate) enum Enemy {
    Soldier(Soldier),
    Alien(Alien),
    Wasp(Wasp),
    WaveFloater(WaveFloater),
    ChopperClaw(ChopperClaw),
    DroidBall(DroidBall),
    BlobSpikeBall(BlobSpikeBall),
    ArmoredTurret(ArmoredTurret),
}

macro_rules! each_enemy {
    ($enemy:expr, $inner:ident => $body:expr) => {
        match $enemy {
            Enemy::Soldier($inner) => $body,
            Enemy::Alien($inner) => $body,
            Enemy::Wasp($inner) => $body,
            Enemy::WaveFloater($inner) => $body,
            Enemy::ChopperClaw($inner) => $body,
            Enemy::DroidBall($inner) => $body,
            Enemy::BlobSpikeBall($inner) => $body,
            Enemy::ArmoredTurret($inner) => $body,
        }
    };
}

impl Enemy {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Enemy::Soldier(_) => "soldier",
            Enemy::Alien(_) => "alien",
            Enemy::Wasp(_) => "wasp",
            Enemy::WaveFloater(_) => "wave_floater",
            Enemy::ChopperClaw(_) => "chopper_claw",
            Enemy::DroidBall(_) => "droid_ball",
            Enemy::BlobSpikeBall(_) => "blob_spike_ball",
            Enemy::ArmoredTurret(_) => "armored_turret",
        }
    }

    pub(crate) fn core(&self) -> &ActorCore {
        each_enemy!(self, inner => inner.core())
    }

    pub(crate) fn core_mut(&mut self) -> &mut ActorCore {
        each_enemy!(self, inner => inner.core_mut())
    }

    pub(crate) fn attack_strength(&self) -> i32 {
        each_enemy!(self, inner => inner.attack_strength())
    }

    pub(crate) fn is_hovering(&self) -> bool {
        each_enemy!(self, inner => inner.is_hovering())
    }

    pub(crate) fn is_defeated(&self) -> bool {
        each_enemy!(self, inner => inner.is_defeated())
    }

    pub(crate) fn update(&mut self, cx: &mut EnemyContext<'_>) -> Result<(), ActorError> {
        each_enemy!(self, inner => inner.update(cx))
    }

    /// Routes a due scheduled action to the enemy that queued it.
    pub(crate) fn on_scheduled(
        &mut self,
        cx: &mut EnemyContext<'_>,
        action: SegmentAction,
    ) -> Result<(), ActorError> {
        match self {
            Enemy::ArmoredTurret(turret) => turret.on_scheduled(cx, action),
            other => Err(ActorError::UnhandledAction {
                actor: other.kind(),
                state: String::from("any"),
                action,
            }),
        }
    }

    /// Player sword or contact hit. A defeat leaves an explosion at the sprite center and
    /// disables the body, which flags the enemy for removal.
    pub(crate) fn got_hit(&mut self, strength: i32, spawns: &mut Vec<SpawnRequest>) -> HitResult {
        if let Enemy::ArmoredTurret(turret) = self {
            if turret.is_shielded() {
                return HitResult::Ignored;
            }
        }
        let core = self.core_mut();
        if !core.body.enabled {
            return HitResult::Ignored;
        }
        match core.apply_damage(strength) {
            DamageOutcome::Absorbed => HitResult::Ignored,
            DamageOutcome::Damaged { defeated: false } => HitResult::Hurt,
            DamageOutcome::Damaged { defeated: true } => {
                spawns.push(SpawnRequest::Explosion(core.center()));
                core.body.enabled = false;
                core.visible = false;
                HitResult::Defeated
            }
        }
    }
}
