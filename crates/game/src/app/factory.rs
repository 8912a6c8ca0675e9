use ninja_engine::{ActorCore, ActorIdAllocator, Facing, MapObject, Vec2};
use tracing::{debug, warn};

use super::actors::alien::Alien;
use super::actors::armored_turret::ArmoredTurret;
use super::actors::blob_spike_ball::{
    adjust_map_position, orientation_from_rotation, BallForms, BlobSpikeBall,
};
use super::actors::chopper_claw::ChopperClaw;
use super::actors::droid_ball::DroidBall;
use super::actors::soldier::Soldier;
use super::actors::wasp::Wasp;
use super::actors::wave_floater::WaveFloater;
use super::actors::{Enemy, PowerUp, PowerUpVariant};

/// Property that links an enemy record to a trigger rectangle. Consumed by the spawn
/// scheduler, never by a constructor.
pub(crate) const SPAWN_BOX_PROPERTY: &str = "spawnBox";
pub(crate) const POWER_UP_TILESET: &str = "PowerUp";

#[derive(Debug, Clone)]
pub(crate) enum Spawned {
    Enemy(Enemy),
    PowerUp(PowerUp),
}

impl Spawned {
    pub(crate) fn core(&self) -> &ActorCore {
        match self {
            Spawned::Enemy(enemy) => enemy.core(),
            Spawned::PowerUp(power_up) => power_up.core(),
        }
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        match self {
            Spawned::Enemy(enemy) => enemy.core_mut(),
            Spawned::PowerUp(power_up) => power_up.core_mut(),
        }
    }
}

/// Per-map data the factory needs besides the record itself.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FactoryContext {
    pub(crate) power_up_first_gid: Option<u32>,
}

/// Tag names the factory can build, with the properties each one reads.
fn known_properties(tag: &str) -> Option<&'static [&'static str]> {
    let known: &'static [&'static str] = match tag {
        "ChopperClaw" => &["stopY", SPAWN_BOX_PROPERTY],
        "BlobSpikeBall" => &["noBlobForm", "noSpikeForm", SPAWN_BOX_PROPERTY],
        "ArmoredTurret" | "DroidBall" | "EnemyAlien" | "EnemySoldier" | "WaspRobot"
        | "WaveFloater" => &[SPAWN_BOX_PROPERTY],
        "PowerUp" => &[],
        _ => return None,
    };
    Some(known)
}

fn bool_property(record: &MapObject, name: &str) -> bool {
    record
        .property(name)
        .and_then(|value| value.as_bool())
        .unwrap_or(false)
}

/// Center of an actor whose frame's bottom-left corner sits at the record position.
fn placement_center(core: &ActorCore, x: f32, y: f32) -> Vec2 {
    let (frame_width, frame_height) = core.frame_size();
    Vec2::new(x + frame_width * 0.5, y - frame_height * 0.5)
}

/// Builds the actor a map record describes. Unknown tags yield `None`; they are authoring
/// data this build has no actor for.
pub(crate) fn make_one(
    record: &MapObject,
    context: &FactoryContext,
    ids: &mut ActorIdAllocator,
    now_ms: u64,
) -> Option<Spawned> {
    let Some(known) = known_properties(&record.name) else {
        debug!(tag = %record.name, object = record.id, "factory_tag_ignored");
        return None;
    };
    for property in &record.properties {
        if !known.contains(&property.name.as_str()) {
            warn!(
                tag = %record.name,
                object = record.id,
                property = %property.name,
                "map_property_unknown"
            );
        }
    }

    // constructors place at the origin; the real center depends on the frame size
    let origin = Vec2::ZERO;
    let mut anchor = (record.x, record.y);
    let mut spawned = match record.name.as_str() {
        "ArmoredTurret" => Spawned::Enemy(Enemy::ArmoredTurret(ArmoredTurret::new(
            ids.allocate(),
            origin,
            now_ms,
        ))),
        "BlobSpikeBall" => {
            let forms = BallForms {
                no_blob: bool_property(record, "noBlobForm"),
                no_spike: bool_property(record, "noSpikeForm"),
            };
            let orientation = orientation_from_rotation(f64::from(record.rotation));
            anchor = adjust_map_position(
                orientation,
                record.x,
                record.y,
                record.width,
                record.height,
            );
            Spawned::Enemy(Enemy::BlobSpikeBall(BlobSpikeBall::new(
                ids.allocate(),
                origin,
                forms,
                orientation,
                now_ms,
            )))
        }
        "ChopperClaw" => {
            let stop_y = record
                .property("stopY")
                .and_then(|value| value.as_f64())
                .map(|value| value as f32);
            Spawned::Enemy(Enemy::ChopperClaw(ChopperClaw::new(
                ids.allocate(),
                origin,
                stop_y,
                now_ms,
            )))
        }
        "DroidBall" => Spawned::Enemy(Enemy::DroidBall(DroidBall::new(ids.allocate(), origin, now_ms))),
        "EnemyAlien" => Spawned::Enemy(Enemy::Alien(Alien::new(ids.allocate(), origin, now_ms))),
        "EnemySoldier" => Spawned::Enemy(Enemy::Soldier(Soldier::new(ids.allocate(), origin, now_ms))),
        "WaspRobot" => Spawned::Enemy(Enemy::Wasp(Wasp::new(ids.allocate(), origin, now_ms))),
        "WaveFloater" => Spawned::Enemy(Enemy::WaveFloater(WaveFloater::new(
            ids.allocate(),
            origin,
            now_ms,
        ))),
        "PowerUp" => {
            let variant = record
                .gid
                .zip(context.power_up_first_gid)
                .and_then(|(gid, first)| gid.checked_sub(first))
                .and_then(PowerUpVariant::from_index);
            let Some(variant) = variant else {
                warn!(object = record.id, gid = ?record.gid, "power_up_variant_unknown");
                return None;
            };
            Spawned::PowerUp(PowerUp::new(ids.allocate(), origin, variant, now_ms))
        }
        _ => return None,
    };

    let core = spawned.core_mut();
    let center = placement_center(core, anchor.0, anchor.1);
    core.place_center(center);
    if record.flipped_horizontal {
        core.turn(Facing::Right);
    }
    if let Spawned::Enemy(Enemy::WaveFloater(floater)) = &mut spawned {
        floater.lock_height();
    }
    debug!(tag = %record.name, object = record.id, x = center.x, y = center.y, "enemy_spawned");
    Some(spawned)
}

#[cfg(test)]
mod tests {
    use ninja_engine::{MapProperty, PropertyValue};

    use super::super::actors::chopper_claw::ChopperClawState;
    use super::super::actors::common::{HasHealth, HasProximitySensor};
    use super::super::actors::blob_spike_ball::BlobSpikeBallState;
    use super::*;

    fn record(name: &str, x: f32, y: f32) -> MapObject {
        MapObject {
            id: 1,
            name: name.to_string(),
            x,
            y,
            width: 16.0,
            height: 16.0,
            rotation: 0.0,
            gid: None,
            flipped_horizontal: false,
            flipped_vertical: false,
            properties: Vec::new(),
        }
    }

    fn build(record: &MapObject) -> Option<Spawned> {
        let mut ids = ActorIdAllocator::default();
        make_one(record, &FactoryContext::default(), &mut ids, 0)
    }

    #[test]
    fn record_bottom_left_maps_to_frame_center() {
        let spawned = build(&record("EnemySoldier", 100.0, 192.0)).expect("soldier");
        let core = spawned.core();
        let (width, height) = core.frame_size();
        assert_eq!(core.center(), Vec2::new(100.0 + width * 0.5, 192.0 - height * 0.5));
        assert_eq!(core.facing(), Facing::Left);
    }

    #[test]
    fn flip_flag_overrides_the_default_left_facing() {
        let mut flipped = record("WaspRobot", 40.0, 80.0);
        flipped.flipped_horizontal = true;

        let spawned = build(&flipped).expect("wasp");

        assert_eq!(spawned.core().facing(), Facing::Right);
    }

    #[test]
    fn unknown_tag_is_dropped() {
        assert!(build(&record("Dragon", 0.0, 0.0)).is_none());
    }

    #[test]
    fn power_up_variant_comes_from_the_tileset_offset() {
        let mut ids = ActorIdAllocator::default();
        let context = FactoryContext {
            power_up_first_gid: Some(200),
        };
        let mut pickup = record("PowerUp", 32.0, 64.0);
        pickup.gid = Some(209);

        let Some(Spawned::PowerUp(power_up)) = make_one(&pickup, &context, &mut ids, 0) else {
            panic!("expected a power-up");
        };
        assert_eq!(power_up.variant(), PowerUpVariant::HpUp);

        pickup.gid = Some(150);
        assert!(make_one(&pickup, &context, &mut ids, 0).is_none());
    }

    #[test]
    fn chopper_reads_stop_height() {
        let mut claw = record("ChopperClaw", 64.0, 40.0);
        claw.properties.push(MapProperty {
            name: "stopY".to_string(),
            value: PropertyValue::Int(150),
        });

        let Some(Spawned::Enemy(Enemy::ChopperClaw(claw))) = build(&claw) else {
            panic!("expected a chopper claw");
        };
        assert_eq!(claw.state(), ChopperClawState::Wait);
        assert_eq!(claw.stop_y(), 150.0);
    }

    #[test]
    fn blob_flags_pick_the_behavior_profile() {
        let mut ball = record("BlobSpikeBall", 64.0, 64.0);
        ball.properties.push(MapProperty {
            name: "noBlobForm".to_string(),
            value: PropertyValue::Bool(true),
        });

        let Some(Spawned::Enemy(Enemy::BlobSpikeBall(mut ball))) = build(&ball) else {
            panic!("expected a blob spike ball");
        };
        assert_eq!(ball.state(), BlobSpikeBallState::Fall);
        assert!(ball.sensor_mut().is_none());
        assert!(ball.core().body.allow_gravity);
    }

    #[test]
    fn ids_are_unique_across_builds() {
        let mut ids = ActorIdAllocator::default();
        let context = FactoryContext::default();
        let first = make_one(&record("DroidBall", 0.0, 16.0), &context, &mut ids, 0).expect("ball");
        let second = make_one(&record("DroidBall", 0.0, 16.0), &context, &mut ids, 0).expect("ball");
        assert_ne!(first.core().id, second.core().id);
    }
}
