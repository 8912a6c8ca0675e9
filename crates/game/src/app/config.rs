use std::fs;
use std::path::{Path, PathBuf};

use ninja_engine::Vec2;
use serde::Deserialize;
use thiserror::Error;

pub(crate) const ACTS_FILE_NAME: &str = "acts.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ActsFile {
    pub(crate) acts: Vec<ActConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ActConfig {
    pub(crate) name: String,
    pub(crate) time_limit_seconds: u32,
    pub(crate) segments: Vec<SegmentConfig>,
}

/// One playable level of an act.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SegmentConfig {
    pub(crate) name: String,
    /// TMX file name, relative to the maps directory.
    pub(crate) map: String,
    #[serde(default)]
    pub(crate) checkpoint: bool,
    /// Overrides the map's pixel width as the playable width.
    #[serde(default)]
    pub(crate) level_width: Option<f32>,
    #[serde(default)]
    pub(crate) lower_bounds: Option<f32>,
    /// Inclusive gid ranges of the `Platforms` layer that collide.
    pub(crate) collision: Vec<[u32; 2]>,
    /// Player 1 spawn point; further players are spaced along x.
    #[serde(default)]
    pub(crate) player_spawn: Option<[f32; 2]>,
}

impl SegmentConfig {
    pub(crate) fn collision_ranges(&self) -> Vec<(u32, u32)> {
        self.collision.iter().map(|[lo, hi]| (*lo, *hi)).collect()
    }

    pub(crate) fn spawn_point(&self) -> Option<Vec2> {
        self.player_spawn.map(|[x, y]| Vec2::new(x, y))
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}{}: {source}", json_path_suffix(.json_path))]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config {path} at {field}: {message}")]
    Invalid {
        path: PathBuf,
        field: String,
        message: String,
    },
}

fn json_path_suffix(json_path: &str) -> String {
    if json_path.is_empty() || json_path == "." {
        String::new()
    } else {
        format!(" at {json_path}")
    }
}

pub(crate) fn load_acts(path: &Path) -> Result<ActsFile, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_acts(path, &raw)
}

pub(crate) fn parse_acts(path: &Path, raw: &str) -> Result<ActsFile, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let acts = serde_path_to_error::deserialize::<_, ActsFile>(&mut deserializer).map_err(
        |error| {
            let json_path = error.path().to_string();
            ConfigError::Parse {
                path: path.to_path_buf(),
                json_path,
                source: error.into_inner(),
            }
        },
    )?;
    validate_acts(path, &acts)?;
    Ok(acts)
}

fn invalid(path: &Path, field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        path: path.to_path_buf(),
        field: field.into(),
        message: message.into(),
    }
}

fn validate_acts(path: &Path, file: &ActsFile) -> Result<(), ConfigError> {
    if file.acts.is_empty() {
        return Err(invalid(path, "acts", "at least one act is required"));
    }
    for (act_index, act) in file.acts.iter().enumerate() {
        if act.time_limit_seconds == 0 {
            return Err(invalid(
                path,
                format!("acts[{act_index}].time_limit_seconds"),
                "must be positive",
            ));
        }
        if act.segments.is_empty() {
            return Err(invalid(
                path,
                format!("acts[{act_index}].segments"),
                "at least one segment is required",
            ));
        }
        for (segment_index, segment) in act.segments.iter().enumerate() {
            let field = format!("acts[{act_index}].segments[{segment_index}]");
            if segment.collision.is_empty() {
                return Err(invalid(
                    path,
                    format!("{field}.collision"),
                    "at least one gid range is required",
                ));
            }
            if let Some([lo, hi]) = segment.collision.iter().find(|[lo, hi]| lo > hi) {
                return Err(invalid(
                    path,
                    format!("{field}.collision"),
                    format!("range [{lo}, {hi}] is reversed"),
                ));
            }
            if segment.level_width.is_some_and(|width| width <= 0.0) {
                return Err(invalid(path, format!("{field}.level_width"), "must be positive"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const VALID: &str = r#"{
        "acts": [
            {
                "name": "Act I",
                "time_limit_seconds": 250,
                "segments": [
                    { "name": "Scene21Desert", "map": "Scene21Desert.tmx", "checkpoint": true,
                      "level_width": 3840, "collision": [[1, 2], [17, 17], [21, 21]] },
                    { "name": "Scene22B", "map": "Scene22B.tmx", "collision": [[17, 44]],
                      "player_spawn": [48, 100] }
                ]
            }
        ]
    }"#;

    fn parse(raw: &str) -> Result<ActsFile, ConfigError> {
        parse_acts(Path::new("acts.json"), raw)
    }

    #[test]
    fn valid_file_parses_with_defaults() {
        let file = parse(VALID).expect("valid acts");
        let act = &file.acts[0];
        assert_eq!(act.time_limit_seconds, 250);
        assert_eq!(act.segments[0].level_width, Some(3840.0));
        assert_eq!(act.segments[0].collision_ranges(), vec![(1, 2), (17, 17), (21, 21)]);
        assert!(!act.segments[1].checkpoint);
        assert_eq!(act.segments[1].lower_bounds, None);
        assert_eq!(act.segments[1].spawn_point(), Some(Vec2::new(48.0, 100.0)));
    }

    #[test]
    fn parse_error_reports_json_path() {
        let raw = r#"{ "acts": [ { "name": "Act I", "time_limit_seconds": "soon", "segments": [] } ] }"#;
        let err = parse(raw).expect_err("string time limit");
        let ConfigError::Parse { json_path, .. } = &err else {
            panic!("expected parse error, got {err:?}");
        };
        assert_eq!(json_path, "acts[0].time_limit_seconds");
        assert!(err.to_string().contains("at acts[0].time_limit_seconds"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let raw = r#"{ "acts": [], "cutscenes": [] }"#;
        assert!(matches!(parse(raw), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn validation_names_the_offending_field() {
        let cases = [
            (r#"{ "acts": [] }"#, "acts"),
            (
                r#"{ "acts": [ { "name": "A", "time_limit_seconds": 0, "segments": [] } ] }"#,
                "acts[0].time_limit_seconds",
            ),
            (
                r#"{ "acts": [ { "name": "A", "time_limit_seconds": 5, "segments": [] } ] }"#,
                "acts[0].segments",
            ),
            (
                r#"{ "acts": [ { "name": "A", "time_limit_seconds": 5, "segments": [
                    { "name": "S", "map": "s.tmx", "collision": [] } ] } ] }"#,
                "acts[0].segments[0].collision",
            ),
            (
                r#"{ "acts": [ { "name": "A", "time_limit_seconds": 5, "segments": [
                    { "name": "S", "map": "s.tmx", "collision": [[44, 17]] } ] } ] }"#,
                "acts[0].segments[0].collision",
            ),
        ];
        for (raw, expected_field) in cases {
            match parse(raw) {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected_field),
                other => panic!("expected invalid {expected_field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn load_reads_from_disk() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join(ACTS_FILE_NAME);
        fs::write(&path, VALID).expect("write acts");

        let file = load_acts(&path).expect("load acts");
        assert_eq!(file.acts[0].segments.len(), 2);

        let missing = load_acts(&temp.path().join("missing.json")).expect_err("missing file");
        assert!(matches!(missing, ConfigError::Read { .. }));
    }
}
