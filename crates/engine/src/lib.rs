use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod actor;
pub mod animation;
pub mod app;
pub mod camera;
pub mod geometry;
pub mod map;
pub mod physics;
pub mod schedule;
pub mod sensor;
pub mod state;
pub mod tilemap;

pub use actor::{ActorCore, ActorId, ActorIdAllocator, DamageOutcome, Facing, HP_INVINCIBLE};
pub use animation::AnimationClip;
pub use app::{
    run_app, run_headless, AppError, Button, Color, ControlMethod, DrawList,
    FrameContext, GamepadSource, GamepadState, HeadlessReport, InputDevices, KeyboardControl,
    LoopConfig, NoGamepads, Scene, SceneCommand, SceneKey,
};
pub use camera::{Camera2D, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use geometry::{contact_side, ContactSides, Rect, Side, Vec2};
pub use map::{
    load_map_cached, LoadedMap, MapDocument, MapLoadError, MapObject, MapPipelineError,
    MapProperty, PropertyValue,
};
pub use physics::{integrate_velocity, move_and_collide, Body, Contact, GRAVITY_Y};
pub use schedule::{ScheduledAction, ScheduledActions};
pub use sensor::{AnchorX, AnchorY, ProximitySensor, SensorEvent};
pub use state::{Clock, FixedClock, StateGate, StateMachine, Stateful};
pub use tilemap::{Tilemap, TilemapError};

pub const ROOT_ENV_VAR: &str = "NINJA_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub maps_dir: PathBuf,
    pub config_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl AppPaths {
    pub fn from_root(root: PathBuf) -> Self {
        let assets = root.join("assets");
        Self {
            maps_dir: assets.join("maps"),
            config_dir: assets.join("config"),
            cache_dir: root.join("cache"),
            root,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create cache directory at {path}: {source}")]
    CreateCacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "{env_var} is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot {
        path: PathBuf,
        env_var: &'static str,
    },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example: export {env_var}=\"/path/to/ninja\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let paths = AppPaths::from_root(resolve_root()?);
    fs::create_dir_all(&paths.cache_dir).map_err(|source| StartupError::CreateCacheDir {
        path: paths.cache_dir.clone(),
        source,
    })?;
    Ok(paths)
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(Path::new(&value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot {
                    path: normalized,
                    env_var: ROOT_ENV_VAR,
                })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
            find_root_above(&exe_dir).ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn find_root_above(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| is_repo_marker(candidate))
        .map(normalize_path)
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();
    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn repo_marker_requires_cargo_toml_and_a_content_dir() {
        let temp = TempDir::new().expect("tempdir");
        assert!(!is_repo_marker(temp.path()));
        fs::write(temp.path().join("Cargo.toml"), "[workspace]").expect("write");
        assert!(!is_repo_marker(temp.path()));
        fs::create_dir(temp.path().join("assets")).expect("mkdir");
        assert!(is_repo_marker(temp.path()));
    }

    #[test]
    fn root_is_found_from_nested_directory() {
        let temp = TempDir::new().expect("tempdir");
        fs::write(temp.path().join("Cargo.toml"), "[workspace]").expect("write");
        fs::create_dir(temp.path().join("crates")).expect("mkdir");
        let nested = temp.path().join("target").join("debug");
        fs::create_dir_all(&nested).expect("mkdir nested");

        let root = find_root_above(&nested).expect("root");
        assert_eq!(root, normalize_path(temp.path()));

        let paths = AppPaths::from_root(root.clone());
        assert_eq!(paths.maps_dir, root.join("assets").join("maps"));
        assert_eq!(paths.cache_dir, root.join("cache"));
    }
}
