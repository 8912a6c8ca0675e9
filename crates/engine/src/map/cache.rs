use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::atomic_io::write_text_atomic;
use super::hashing::hash_map_source;
use super::loader::{parse_tmx, MapLoadError};
use super::types::MapDocument;

pub const COMPILED_MAP_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CompiledMapV1 {
    format_version: u32,
    source_file: String,
    source_hash_sha256_hex: String,
    document: MapDocument,
}

#[derive(Debug, Clone)]
pub struct LoadedMap {
    pub document: MapDocument,
    pub source_hash_sha256_hex: String,
    pub from_cache: bool,
}

#[derive(Debug, Error)]
pub enum MapPipelineError {
    #[error("failed to read map source {path}: {source}")]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Load(#[from] MapLoadError),
}

pub fn compiled_map_path(cache_dir: &Path, source_path: &Path) -> PathBuf {
    let stem = source_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "map".to_string());
    cache_dir.join("maps").join(format!("{stem}.map.json"))
}

/// Loads a TMX map, reusing the compiled JSON under `cache_dir` when its recorded source hash
/// still matches. A stale, unreadable or mismatched cache entry is recompiled in place.
pub fn load_map_cached(source_path: &Path, cache_dir: &Path) -> Result<LoadedMap, MapPipelineError> {
    let raw = fs::read_to_string(source_path).map_err(|source| MapPipelineError::ReadSource {
        path: source_path.to_path_buf(),
        source,
    })?;
    let hash = hash_map_source(raw.as_bytes());
    let compiled_path = compiled_map_path(cache_dir, source_path);

    if let Some(document) = read_compiled(&compiled_path, &hash) {
        info!(
            map = %source_path.display(),
            compiled = %compiled_path.display(),
            "map_cache_hit"
        );
        return Ok(LoadedMap {
            document,
            source_hash_sha256_hex: hash,
            from_cache: true,
        });
    }

    let document = parse_tmx(source_path, &raw)?;
    let record = CompiledMapV1 {
        format_version: COMPILED_MAP_FORMAT_VERSION,
        source_file: source_path.display().to_string(),
        source_hash_sha256_hex: hash.clone(),
        document,
    };
    match serde_json::to_string(&record) {
        Ok(text) => {
            if let Err(error) = write_text_atomic(&compiled_path, &text) {
                warn!(
                    path = %compiled_path.display(),
                    error = %error,
                    "map_cache_write_failed"
                );
            }
        }
        Err(error) => {
            warn!(path = %compiled_path.display(), error = %error, "map_cache_write_failed");
        }
    }
    info!(
        map = %source_path.display(),
        tile_layers = record.document.tile_layers.len(),
        object_layers = record.document.object_layers.len(),
        "map_compiled"
    );

    Ok(LoadedMap {
        document: record.document,
        source_hash_sha256_hex: hash,
        from_cache: false,
    })
}

fn read_compiled(path: &Path, expected_hash: &str) -> Option<MapDocument> {
    let text = fs::read_to_string(path).ok()?;
    let record = match serde_json::from_str::<CompiledMapV1>(&text) {
        Ok(record) => record,
        Err(error) => {
            warn!(path = %path.display(), error = %error, "map_cache_corrupt");
            return None;
        }
    };
    if record.format_version != COMPILED_MAP_FORMAT_VERSION
        || record.source_hash_sha256_hex != expected_hash
    {
        return None;
    }
    Some(record.document)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const MAP: &str = r#"<map width="2" height="1" tilewidth="16" tileheight="16">
 <layer name="Platforms" width="2" height="1"><data encoding="csv">17,0</data></layer>
</map>"#;

    #[test]
    fn second_load_hits_cache_and_edits_recompile() {
        let temp = TempDir::new().expect("tempdir");
        let source = temp.path().join("Scene22A.tmx");
        let cache = temp.path().join("cache");
        fs::write(&source, MAP).expect("write map");

        let first = load_map_cached(&source, &cache).expect("first load");
        assert!(!first.from_cache);
        assert!(compiled_map_path(&cache, &source).is_file());

        let second = load_map_cached(&source, &cache).expect("second load");
        assert!(second.from_cache);
        assert_eq!(second.document, first.document);

        fs::write(&source, MAP.replace("17,0", "18,0")).expect("edit map");
        let third = load_map_cached(&source, &cache).expect("third load");
        assert!(!third.from_cache);
        assert_ne!(third.source_hash_sha256_hex, first.source_hash_sha256_hex);
        assert_eq!(
            third.document.tile_layer("Platforms").expect("layer").data,
            vec![18, 0]
        );
    }

    #[test]
    fn corrupt_cache_entry_is_recompiled() {
        let temp = TempDir::new().expect("tempdir");
        let source = temp.path().join("Scene21Desert.tmx");
        let cache = temp.path().join("cache");
        fs::write(&source, MAP).expect("write map");
        let compiled = compiled_map_path(&cache, &source);
        fs::create_dir_all(compiled.parent().expect("parent")).expect("mkdir");
        fs::write(&compiled, "{not json").expect("write corrupt");

        let loaded = load_map_cached(&source, &cache).expect("load");
        assert!(!loaded.from_cache);
        assert!(load_map_cached(&source, &cache).expect("reload").from_cache);
    }

    #[test]
    fn missing_source_reports_read_error() {
        let temp = TempDir::new().expect("tempdir");
        let err = load_map_cached(&temp.path().join("nope.tmx"), temp.path()).expect_err("err");
        assert!(matches!(err, MapPipelineError::ReadSource { .. }));
    }
}
