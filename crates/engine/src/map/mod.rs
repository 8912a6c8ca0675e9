mod atomic_io;
mod cache;
mod hashing;
mod loader;
mod types;

pub use cache::{
    compiled_map_path, load_map_cached, LoadedMap, MapPipelineError, COMPILED_MAP_FORMAT_VERSION,
};
pub use loader::{load_tmx, parse_tmx, MapErrorCode, MapLoadError, SourceLocation};
pub use types::{
    MapDocument, MapObject, MapProperty, ObjectLayer, PropertyValue, TileLayer, TilesetRef,
};
