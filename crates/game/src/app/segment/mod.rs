use ninja_engine::{
    contact_side, integrate_velocity, move_and_collide, physics::swept_bounds, ActorId,
    ActorIdAllocator, Body, Button, Camera2D, Color, ControlMethod, DrawList, Facing,
    InputDevices, MapDocument, MapObject, MapPipelineError, Rect, ScheduledActions, Side, Tilemap,
    TilemapError, Vec2, GRAVITY_Y, SCREEN_HEIGHT, SCREEN_WIDTH,
};
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::actors::common::HasHealth;
use super::actors::explosion;
use super::actors::ninja::{InvincibilitySource, MAX_NUM_PLAYERS};
use super::actors::{
    Bullet, Enemy, EnemyContext, Explosion, LevelLimits, Ninja, PlatformRef, PlayerContext,
    PlayerEvent, PlayerView, PowerUp, SegmentAction, SpawnRequest,
};
use super::config::SegmentConfig;
use super::factory::{self, FactoryContext, Spawned, POWER_UP_TILESET, SPAWN_BOX_PROPERTY};
use super::hud::{HudSnapshot, PlayerHud};

const PLATFORMS_LAYER: &str = "Platforms";
const ENEMIES_LAYER: &str = "Enemies";
const POWER_UPS_LAYER: &str = "PowerUps";
const WALLS_LAYER: &str = "Walls";
const QUICKSAND_LAYER: &str = "Quicksand";

/// Pixels the camera rectangle is grown by on every side when deciding enemy spawns.
const ENEMY_SPAWN_MARGIN: f32 = 0.0;
const CAM_MAX_MOVEMENT: f32 = 2.0;
const PLAYER1_SPAWN: Vec2 = Vec2::new(64.0, -32.0);
const PLAYER_SPAWN_SPACING: f32 = 20.0;
/// Delay between `stop` and the outcome being reported, covering the fade out.
const STOP_FADE_MS: u64 = 500;

const SEGMENT_FRAME_ORDER_TEXT: &str = "TimeLimit>DueActions>Physics>Players>Camera>Enemies>\
Contacts>Knockouts>SpawnEnemies>PowerUps>Cleanup>Hud";

const TILE_COLOR: Color = Color::rgb(0x8a, 0x6d, 0x3b);
const LEDGE_COLOR: Color = Color::rgb(0x6b, 0x55, 0x33);
const QUICKSAND_COLOR: Color = Color::rgb(0xc9, 0xa4, 0x5c);
const PLAYER_COLORS: [Color; MAX_NUM_PLAYERS] = [
    Color::rgb(0x30, 0x30, 0xd0),
    Color::rgb(0xd0, 0x30, 0x30),
    Color::rgb(0x30, 0xb0, 0x30),
    Color::rgb(0xd0, 0xb0, 0x30),
];
const SWORD_COLOR: Color = Color::rgb(0xe8, 0xe8, 0xf0);
const ENEMY_COLOR: Color = Color::rgb(0x90, 0x20, 0x80);
const BULLET_COLOR: Color = Color::rgb(0xff, 0x80, 0x20);
const POWER_UP_COLOR: Color = Color::rgb(0x20, 0xd0, 0xd0);
const EXPLOSION_COLOR: Color = Color::rgb(0xff, 0xe0, 0x60);

include!("types.rs");
include!("layout.rs");
include!("spawning.rs");
include!("collision.rs");
include!("frame.rs");
