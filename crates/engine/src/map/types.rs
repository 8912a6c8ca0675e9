use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::tilemap::{Tilemap, TilemapError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDocument {
    pub width: u32,
    pub height: u32,
    pub tile_width: f32,
    pub tile_height: f32,
    pub tilesets: Vec<TilesetRef>,
    pub tile_layers: Vec<TileLayer>,
    pub object_layers: Vec<ObjectLayer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilesetRef {
    pub first_gid: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayer {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectLayer {
    pub name: String,
    pub objects: Vec<MapObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Object(u32),
}

impl PropertyValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(value) => Some(*value),
            PropertyValue::String(text) => text.parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Int(value) => Some(*value as f64),
            PropertyValue::Float(value) => Some(*value),
            PropertyValue::String(text) => text.parse().ok(),
            _ => None,
        }
    }

    pub fn as_object_id(&self) -> Option<u32> {
        match self {
            PropertyValue::Object(id) => Some(*id),
            PropertyValue::Int(value) => u32::try_from(*value).ok(),
            PropertyValue::String(text) => text.parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapProperty {
    pub name: String,
    pub value: PropertyValue,
}

/// One object from an object layer, as authored. Tile objects (`gid` set) are anchored at
/// their bottom-left corner; plain rectangles at their top-left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapObject {
    pub id: u32,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    pub gid: Option<u32>,
    pub flipped_horizontal: bool,
    pub flipped_vertical: bool,
    pub properties: Vec<MapProperty>,
}

impl MapObject {
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|property| property.name == name)
            .map(|property| &property.value)
    }

    /// Placement rectangle for a bottom-left anchored tile object.
    pub fn placement_rect(&self) -> Rect {
        Rect::new(self.x, self.y - self.height, self.width, self.height)
    }

    /// Rectangle for a top-left anchored shape object.
    pub fn shape_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

impl MapDocument {
    pub fn tile_layer(&self, name: &str) -> Option<&TileLayer> {
        self.tile_layers.iter().find(|layer| layer.name == name)
    }

    pub fn object_layer(&self, name: &str) -> Option<&ObjectLayer> {
        self.object_layers.iter().find(|layer| layer.name == name)
    }

    pub fn first_gid_of(&self, tileset_name: &str) -> Option<u32> {
        self.tilesets
            .iter()
            .find(|tileset| tileset.name == tileset_name)
            .map(|tileset| tileset.first_gid)
    }

    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * self.tile_width
    }

    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * self.tile_height
    }

    pub fn build_tilemap(
        &self,
        layer: &TileLayer,
        collision: &[(u32, u32)],
    ) -> Result<Tilemap, TilemapError> {
        Ok(Tilemap::new(
            layer.width,
            layer.height,
            self.tile_width,
            self.tile_height,
            layer.data.clone(),
        )?
        .with_collision_ranges(collision))
    }
}
