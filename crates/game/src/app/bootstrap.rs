use std::env;

use ninja_engine::{resolve_app_paths, InputDevices, LoopConfig, Scene, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::actors::ninja::MAX_NUM_PLAYERS;
use super::config::{load_acts, ConfigError, ACTS_FILE_NAME};
use super::level::LevelScene;
use super::pause::PauseScene;

const PLAYERS_ENV_VAR: &str = "NINJA_PLAYERS";
const HEADLESS_FRAMES_ENV_VAR: &str = "NINJA_HEADLESS_FRAMES";
const RNG_SEED_ENV_VAR: &str = "NINJA_RNG_SEED";
const INVINCIBLE_ENV_VAR: &str = "NINJA_INVINCIBLE";
const DEFAULT_RNG_SEED: u64 = 0x5eed_2101;

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{var} must be {expected}, got '{value}'")]
    Env {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) level: Box<dyn Scene>,
    pub(crate) pause: Box<dyn Scene>,
    pub(crate) devices: InputDevices,
    pub(crate) headless_frames: Option<u64>,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Ninja Startup ===");

    let paths = resolve_app_paths()?;
    let acts_path = paths.config_dir.join(ACTS_FILE_NAME);
    let acts = load_acts(&acts_path)?;
    info!(
        path = %acts_path.display(),
        acts = acts.acts.len(),
        segments = acts.acts.iter().map(|act| act.segments.len()).sum::<usize>(),
        "acts_loaded"
    );

    let num_players = parse_players(env::var(PLAYERS_ENV_VAR).ok().as_deref())?;
    let headless_frames = parse_optional_u64(
        HEADLESS_FRAMES_ENV_VAR,
        env::var(HEADLESS_FRAMES_ENV_VAR).ok().as_deref(),
    )?;
    let seed = parse_optional_u64(RNG_SEED_ENV_VAR, env::var(RNG_SEED_ENV_VAR).ok().as_deref())?
        .unwrap_or(DEFAULT_RNG_SEED);
    let invincible = parse_flag(INVINCIBLE_ENV_VAR, env::var(INVINCIBLE_ENV_VAR).ok().as_deref())?;
    info!(
        root = %paths.root.display(),
        players = num_players,
        seed,
        headless = headless_frames.is_some(),
        invincible,
        "startup"
    );

    Ok(AppWiring {
        config: LoopConfig::default(),
        level: Box::new(
            LevelScene::new(paths, acts, num_players, seed).with_invincibility(invincible),
        ),
        pause: Box::new(PauseScene::default()),
        devices: InputDevices::default(),
        headless_frames,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_players(raw: Option<&str>) -> Result<usize, BootstrapError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(1);
    };
    raw.parse::<usize>()
        .ok()
        .filter(|count| (1..=MAX_NUM_PLAYERS).contains(count))
        .ok_or_else(|| BootstrapError::Env {
            var: PLAYERS_ENV_VAR,
            expected: "a player count from 1 to 4",
            value: raw.to_string(),
        })
}

fn parse_optional_u64(var: &'static str, raw: Option<&str>) -> Result<Option<u64>, BootstrapError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<u64>().map(Some).map_err(|_| BootstrapError::Env {
        var,
        expected: "an unsigned integer",
        value: raw.to_string(),
    })
}

fn parse_flag(var: &'static str, raw: Option<&str>) -> Result<bool, BootstrapError> {
    match raw.map(str::trim).unwrap_or_default() {
        "" | "0" | "false" => Ok(false),
        "1" | "true" => Ok(true),
        other => Err(BootstrapError::Env {
            var,
            expected: "one of 0, 1, true, false",
            value: other.to_string(),
        }),
    }
}
