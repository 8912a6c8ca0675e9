use ninja_engine::{
    ActorCore, ActorId, ActorIdAllocator, Clock, Facing, ProximitySensor, Rect,
    ScheduledActions, SensorEvent, Tilemap, Vec2,
};
use rand::rngs::StdRng;
use thiserror::Error;

use super::bullet::Bullet;
use super::ninja::InvincibilitySource;

/// Damage an enemy deals on contact. Deliberately higher than the player's sword.
pub(crate) const ENEMY_ATTACK_STRENGTH: i32 = 3;
pub(crate) const PLAYER_ATTACK_STRENGTH: i32 = 1;

/// Read-only snapshot of one living player, rebuilt every frame for enemy queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PlayerView {
    pub(crate) slot: usize,
    pub(crate) bounds: Rect,
    pub(crate) center: Vec2,
}

/// Deferred one-shot actions, keyed by the owning actor's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentAction {
    TurretFire,
    TurretClose,
    EndInvincibility(InvincibilitySource),
}

/// Actors an enemy asks the level driver to add. Only the driver mutates rosters.
#[derive(Debug)]
pub(crate) enum SpawnRequest {
    Bullet(Bullet),
    Explosion(Vec2),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ActorError {
    #[error("{actor} in state {state} has no rule for {action:?}")]
    UnhandledAction {
        actor: &'static str,
        state: String,
        action: SegmentAction,
    },
}

/// Result of routing a hit into an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HitResult {
    /// Not in effect: invincible, shielded or already defeated.
    Ignored,
    Hurt,
    Defeated,
}

impl HitResult {
    pub(crate) fn in_effect(self) -> bool {
        self != HitResult::Ignored
    }
}

/// Everything an enemy may read or request during its update. Built by the level driver
/// once per frame; enemies never touch the rosters directly.
pub(crate) struct EnemyContext<'a> {
    pub(crate) now_ms: u64,
    pub(crate) players: &'a [PlayerView],
    pub(crate) tiles: &'a Tilemap,
    pub(crate) schedule: &'a mut ScheduledActions<SegmentAction>,
    pub(crate) spawns: &'a mut Vec<SpawnRequest>,
    pub(crate) ids: &'a mut ActorIdAllocator,
    pub(crate) rng: &'a mut StdRng,
}

impl Clock for EnemyContext<'_> {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}

impl EnemyContext<'_> {
    pub(crate) fn player(&self, slot: usize) -> Option<&PlayerView> {
        self.players.iter().find(|player| player.slot == slot)
    }

    pub(crate) fn schedule_in(&mut self, owner: ActorId, delay_ms: u64, action: SegmentAction) {
        let fire_at_ms = self.now_ms.saturating_add(delay_ms);
        self.schedule.schedule(owner, fire_at_ms, action);
    }
}

pub(crate) fn nearest_player(players: &[PlayerView], from: Vec2) -> Option<&PlayerView> {
    players.iter().min_by(|a, b| {
        from.distance_squared(a.center)
            .total_cmp(&from.distance_squared(b.center))
    })
}

/// Facing that points from `body` toward `target`, comparing body left edges.
pub(crate) fn facing_toward(body: &Rect, target: &Rect) -> Facing {
    if target.left() < body.left() {
        Facing::Left
    } else {
        Facing::Right
    }
}

pub(crate) trait HasHealth {
    fn core(&self) -> &ActorCore;
    fn core_mut(&mut self) -> &mut ActorCore;

    fn attack_strength(&self) -> i32 {
        ENEMY_ATTACK_STRENGTH
    }

    /// The shared death rule disables the body, so a disabled body means "remove me".
    fn is_defeated(&self) -> bool {
        !self.core().body.enabled
    }
}

pub(crate) trait TargetsNearestPlayer: HasHealth {
    fn nearest<'p>(&self, players: &'p [PlayerView]) -> Option<&'p PlayerView> {
        nearest_player(players, self.core().center())
    }
}

pub(crate) trait HasProximitySensor: HasHealth {
    fn sensor_mut(&mut self) -> Option<&mut ProximitySensor>;

    /// Feeds the living players through the sensor. Actors without one see no events.
    fn sense_players(&mut self, players: &[PlayerView]) -> Vec<SensorEvent> {
        let bounds = self.core().bounds();
        let facing = self.core().facing();
        match self.sensor_mut() {
            Some(sensor) => sensor.update(
                &bounds,
                facing,
                players.iter().map(|player| (player.slot, player.bounds)),
            ),
            None => Vec::new(),
        }
    }
}

/// Hovering actors skip platform collision.
pub(crate) trait Hovering {
    fn is_hovering(&self) -> bool {
        false
    }
}

/// Probe point one pixel past the leading edge at `height_from_bottom` above the feet.
pub(crate) fn probe_ahead(bounds: &Rect, facing: Facing, reach: f32, height_from_bottom: f32) -> Vec2 {
    let x = match facing {
        Facing::Right => bounds.right() + reach,
        Facing::Left => bounds.left() - reach,
    };
    Vec2::new(x, bounds.bottom() - height_from_bottom)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use ninja_engine::{ActorIdAllocator, ScheduledActions, Tilemap};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    /// Owns everything an [`EnemyContext`] borrows.
    pub(crate) struct World {
        pub(crate) now_ms: u64,
        pub(crate) players: Vec<PlayerView>,
        pub(crate) tiles: Tilemap,
        pub(crate) schedule: ScheduledActions<SegmentAction>,
        pub(crate) spawns: Vec<SpawnRequest>,
        pub(crate) ids: ActorIdAllocator,
        pub(crate) rng: StdRng,
    }

    impl World {
        /// 20x14 tiles of 16px with a solid floor row at y = 192.
        pub(crate) fn with_floor() -> Self {
            let (width, height) = (20u32, 14u32);
            let mut tiles = vec![0u32; (width * height) as usize];
            for x in 0..width {
                tiles[(12 * width + x) as usize] = 17;
            }
            Self::with_tiles(Tilemap::new(width, height, 16.0, 16.0, tiles).expect("tilemap"))
        }

        pub(crate) fn with_tiles(tiles: Tilemap) -> Self {
            Self {
                now_ms: 0,
                players: Vec::new(),
                tiles: tiles.with_collision_ranges(&[(17, 44)]),
                schedule: ScheduledActions::default(),
                spawns: Vec::new(),
                ids: ActorIdAllocator::default(),
                rng: StdRng::seed_from_u64(7),
            }
        }

        pub(crate) fn player_at(&mut self, slot: usize, bounds: Rect) {
            self.players.retain(|player| player.slot != slot);
            self.players.push(PlayerView {
                slot,
                bounds,
                center: bounds.center(),
            });
        }

        pub(crate) fn cx(&mut self) -> EnemyContext<'_> {
            EnemyContext {
                now_ms: self.now_ms,
                players: &self.players,
                tiles: &self.tiles,
                schedule: &mut self.schedule,
                spawns: &mut self.spawns,
                ids: &mut self.ids,
                rng: &mut self.rng,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_player_uses_euclidean_distance() {
        let players = [
            PlayerView {
                slot: 0,
                bounds: Rect::new(0.0, 0.0, 20.0, 36.0),
                center: Vec2::new(10.0, 18.0),
            },
            PlayerView {
                slot: 1,
                bounds: Rect::new(90.0, 90.0, 20.0, 36.0),
                center: Vec2::new(100.0, 108.0),
            },
        ];
        let found = nearest_player(&players, Vec2::new(80.0, 80.0)).expect("player");
        assert_eq!(found.slot, 1);
        assert!(nearest_player(&[], Vec2::ZERO).is_none());
    }

    #[test]
    fn probe_point_sits_past_the_leading_edge() {
        let bounds = Rect::new(10.0, 10.0, 16.0, 30.0);
        assert_eq!(
            probe_ahead(&bounds, Facing::Right, 1.0, -1.0),
            Vec2::new(27.0, 41.0)
        );
        assert_eq!(
            probe_ahead(&bounds, Facing::Left, 1.0, -1.0),
            Vec2::new(9.0, 41.0)
        );
    }
}
