use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::warn;

use super::types::{
    MapDocument, MapObject, MapProperty, ObjectLayer, PropertyValue, TileLayer, TilesetRef,
};

const FLIPPED_HORIZONTALLY_FLAG: u32 = 0x8000_0000;
const FLIPPED_VERTICALLY_FLAG: u32 = 0x4000_0000;
const FLIPPED_DIAGONALLY_FLAG: u32 = 0x2000_0000;
const ROTATED_HEXAGONAL_FLAG: u32 = 0x1000_0000;
const GID_FLAG_MASK: u32 = FLIPPED_HORIZONTALLY_FLAG
    | FLIPPED_VERTICALLY_FLAG
    | FLIPPED_DIAGONALLY_FLAG
    | ROTATED_HEXAGONAL_FLAG;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    MissingField,
    InvalidValue,
    UnsupportedEncoding,
    LayerSizeMismatch,
    DuplicateLayer,
    DuplicateObjectId,
}

#[derive(Debug, Clone)]
pub struct MapLoadError {
    pub code: MapErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for MapLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for MapLoadError {}

pub fn load_tmx(path: &Path) -> Result<MapDocument, MapLoadError> {
    let raw = fs::read_to_string(path).map_err(|error| MapLoadError {
        code: MapErrorCode::ReadFile,
        message: format!("failed to read map: {error}"),
        file_path: path.to_path_buf(),
        location: None,
    })?;
    parse_tmx(path, &raw)
}

/// Parses an orthogonal Tiled map with CSV-encoded tile layers.
pub fn parse_tmx(file_path: &Path, raw: &str) -> Result<MapDocument, MapLoadError> {
    let doc = Document::parse(raw).map_err(|error| MapLoadError {
        code: MapErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let parser = TmxParser { file_path, doc: &doc };
    parser.parse_map()
}

struct TmxParser<'p, 'input> {
    file_path: &'p Path,
    doc: &'p Document<'input>,
}

impl<'p, 'input> TmxParser<'p, 'input> {
    fn parse_map(&self) -> Result<MapDocument, MapLoadError> {
        let root = self.doc.root_element();
        if root.tag_name().name() != "map" {
            return Err(self.error_at(
                MapErrorCode::InvalidRoot,
                "root element must be <map>".to_string(),
                root,
            ));
        }
        if let Some(orientation) = root.attribute("orientation") {
            if orientation != "orthogonal" {
                return Err(self.error_at(
                    MapErrorCode::InvalidValue,
                    format!("unsupported orientation '{orientation}'; only orthogonal maps load"),
                    root,
                ));
            }
        }

        let mut map = MapDocument {
            width: self.required_attr(root, "width")?,
            height: self.required_attr(root, "height")?,
            tile_width: self.required_attr(root, "tilewidth")?,
            tile_height: self.required_attr(root, "tileheight")?,
            tilesets: Vec::new(),
            tile_layers: Vec::new(),
            object_layers: Vec::new(),
        };
        let mut layer_names = HashSet::<String>::new();
        let mut object_ids = HashSet::<u32>::new();

        for child in root.children().filter(|node| node.is_element()) {
            match child.tag_name().name() {
                "tileset" => map.tilesets.push(self.parse_tileset(child)?),
                "layer" => {
                    let layer = self.parse_tile_layer(child)?;
                    self.claim_layer_name(&mut layer_names, &layer.name, child)?;
                    map.tile_layers.push(layer);
                }
                "objectgroup" => {
                    let layer = self.parse_object_layer(child, &mut object_ids)?;
                    self.claim_layer_name(&mut layer_names, &layer.name, child)?;
                    map.object_layers.push(layer);
                }
                "properties" | "editorsettings" => {}
                other => {
                    warn!(
                        element = other,
                        file = %self.file_path.display(),
                        "map_element_ignored"
                    );
                }
            }
        }

        Ok(map)
    }

    fn parse_tileset(&self, node: Node<'_, '_>) -> Result<TilesetRef, MapLoadError> {
        let first_gid = self.required_attr(node, "firstgid")?;
        let name = match (node.attribute("name"), node.attribute("source")) {
            (Some(name), _) => name.to_string(),
            (None, Some(source)) => Path::new(source)
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_default(),
            (None, None) => {
                return Err(self.error_at(
                    MapErrorCode::MissingField,
                    "tileset needs a name or a source".to_string(),
                    node,
                ))
            }
        };
        Ok(TilesetRef { first_gid, name })
    }

    fn parse_tile_layer(&self, node: Node<'_, '_>) -> Result<TileLayer, MapLoadError> {
        let name = self.required_text_attr(node, "name")?;
        let width: u32 = self.required_attr(node, "width")?;
        let height: u32 = self.required_attr(node, "height")?;
        let Some(data_node) = node
            .children()
            .find(|child| child.is_element() && child.tag_name().name() == "data")
        else {
            return Err(self.error_at(
                MapErrorCode::MissingField,
                format!("layer '{name}' has no <data>"),
                node,
            ));
        };
        let encoding = data_node.attribute("encoding").unwrap_or("xml");
        if encoding != "csv" || data_node.attribute("compression").is_some() {
            return Err(self.error_at(
                MapErrorCode::UnsupportedEncoding,
                format!("layer '{name}' uses encoding '{encoding}'; only uncompressed csv loads"),
                data_node,
            ));
        }

        let text = data_node.text().unwrap_or_default();
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for cell in text.split(',').map(str::trim).filter(|cell| !cell.is_empty()) {
            let gid = cell.parse::<u32>().map_err(|_| {
                self.error_at(
                    MapErrorCode::InvalidValue,
                    format!("layer '{name}' has a non-numeric tile '{cell}'"),
                    data_node,
                )
            })?;
            data.push(gid & !GID_FLAG_MASK);
        }
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(self.error_at(
                MapErrorCode::LayerSizeMismatch,
                format!(
                    "layer '{name}' has {} tiles, expected {expected}",
                    data.len()
                ),
                data_node,
            ));
        }

        Ok(TileLayer {
            name,
            width,
            height,
            data,
        })
    }

    fn parse_object_layer(
        &self,
        node: Node<'_, '_>,
        object_ids: &mut HashSet<u32>,
    ) -> Result<ObjectLayer, MapLoadError> {
        let name = self.required_text_attr(node, "name")?;
        let mut objects = Vec::new();
        for object in node
            .children()
            .filter(|child| child.is_element() && child.tag_name().name() == "object")
        {
            let parsed = self.parse_object(object)?;
            if !object_ids.insert(parsed.id) {
                return Err(self.error_at(
                    MapErrorCode::DuplicateObjectId,
                    format!("object id {} appears more than once", parsed.id),
                    object,
                ));
            }
            objects.push(parsed);
        }
        Ok(ObjectLayer { name, objects })
    }

    fn parse_object(&self, node: Node<'_, '_>) -> Result<MapObject, MapLoadError> {
        let raw_gid: Option<u32> = self.optional_attr(node, "gid")?;
        let mut properties = Vec::new();
        if let Some(group) = node
            .children()
            .find(|child| child.is_element() && child.tag_name().name() == "properties")
        {
            for property in group
                .children()
                .filter(|child| child.is_element() && child.tag_name().name() == "property")
            {
                properties.push(self.parse_property(property)?);
            }
        }

        Ok(MapObject {
            id: self.required_attr(node, "id")?,
            name: node.attribute("name").unwrap_or_default().to_string(),
            x: self.required_attr(node, "x")?,
            y: self.required_attr(node, "y")?,
            width: self.optional_attr(node, "width")?.unwrap_or(0.0),
            height: self.optional_attr(node, "height")?.unwrap_or(0.0),
            rotation: self.optional_attr(node, "rotation")?.unwrap_or(0.0),
            gid: raw_gid.map(|gid| gid & !GID_FLAG_MASK),
            flipped_horizontal: raw_gid.is_some_and(|gid| gid & FLIPPED_HORIZONTALLY_FLAG != 0),
            flipped_vertical: raw_gid.is_some_and(|gid| gid & FLIPPED_VERTICALLY_FLAG != 0),
            properties,
        })
    }

    fn parse_property(&self, node: Node<'_, '_>) -> Result<MapProperty, MapLoadError> {
        let name = self.required_text_attr(node, "name")?;
        let raw = node
            .attribute("value")
            .or_else(|| node.text())
            .unwrap_or_default()
            .trim()
            .to_string();
        let kind = node.attribute("type").unwrap_or("string");
        let invalid = |kind: &str| {
            self.error_at(
                MapErrorCode::InvalidValue,
                format!("property '{name}' value '{raw}' is not a valid {kind}"),
                node,
            )
        };
        let value = match kind {
            "bool" => match raw.as_str() {
                "true" => PropertyValue::Bool(true),
                "false" => PropertyValue::Bool(false),
                _ => return Err(invalid("bool")),
            },
            "int" => PropertyValue::Int(raw.parse().map_err(|_| invalid("int"))?),
            "float" => PropertyValue::Float(raw.parse().map_err(|_| invalid("float"))?),
            "object" => PropertyValue::Object(raw.parse().map_err(|_| invalid("object id"))?),
            _ => PropertyValue::String(raw.clone()),
        };
        Ok(MapProperty { name, value })
    }

    fn claim_layer_name(
        &self,
        seen: &mut HashSet<String>,
        name: &str,
        node: Node<'_, '_>,
    ) -> Result<(), MapLoadError> {
        if seen.insert(name.to_string()) {
            return Ok(());
        }
        Err(self.error_at(
            MapErrorCode::DuplicateLayer,
            format!("layer name '{name}' is used more than once"),
            node,
        ))
    }

    fn required_text_attr(&self, node: Node<'_, '_>, attr: &str) -> Result<String, MapLoadError> {
        match node.attribute(attr) {
            Some(value) if !value.trim().is_empty() => Ok(value.to_string()),
            _ => Err(self.error_at(
                MapErrorCode::MissingField,
                format!(
                    "<{}> is missing attribute '{attr}'",
                    node.tag_name().name()
                ),
                node,
            )),
        }
    }

    fn required_attr<T: std::str::FromStr>(
        &self,
        node: Node<'_, '_>,
        attr: &str,
    ) -> Result<T, MapLoadError> {
        let raw = self.required_text_attr(node, attr)?;
        self.parse_value(node, attr, &raw)
    }

    fn optional_attr<T: std::str::FromStr>(
        &self,
        node: Node<'_, '_>,
        attr: &str,
    ) -> Result<Option<T>, MapLoadError> {
        match node.attribute(attr) {
            Some(raw) => self.parse_value(node, attr, raw).map(Some),
            None => Ok(None),
        }
    }

    fn parse_value<T: std::str::FromStr>(
        &self,
        node: Node<'_, '_>,
        attr: &str,
        raw: &str,
    ) -> Result<T, MapLoadError> {
        raw.trim().parse::<T>().map_err(|_| {
            self.error_at(
                MapErrorCode::InvalidValue,
                format!(
                    "attribute '{attr}' of <{}> has invalid value '{raw}'",
                    node.tag_name().name()
                ),
                node,
            )
        })
    }

    fn error_at(&self, code: MapErrorCode, message: String, node: Node<'_, '_>) -> MapLoadError {
        let pos = self.doc.text_pos_at(node.range().start);
        MapLoadError {
            code,
            message,
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" width="4" height="2" tilewidth="16" tileheight="16">
 <tileset firstgid="1" name="Tileset2-1"/>
 <tileset firstgid="65" source="tilesets/PowerUp.tsx"/>
 <layer id="1" name="Platforms" width="4" height="2">
  <data encoding="csv">
0,0,0,0,
17,18,19,2147483665
</data>
 </layer>
 <objectgroup id="2" name="Enemies">
  <object id="3" name="ChopperClaw" gid="2147483650" x="96" y="64" width="24" height="27">
   <properties>
    <property name="stopY" type="int" value="80"/>
    <property name="spawnBox" type="object" value="4"/>
   </properties>
  </object>
  <object id="4" x="90" y="0" width="40" height="216"/>
 </objectgroup>
</map>"#;

    #[test]
    fn parses_layers_objects_and_flip_flags() {
        let map = parse_tmx(Path::new("sample.tmx"), SAMPLE).expect("parse");

        assert_eq!((map.width, map.height), (4, 2));
        assert_eq!(map.first_gid_of("PowerUp"), Some(65));
        let platforms = map.tile_layer("Platforms").expect("platforms");
        assert_eq!(platforms.data, vec![0, 0, 0, 0, 17, 18, 19, 17]);

        let enemies = map.object_layer("Enemies").expect("enemies");
        let claw = &enemies.objects[0];
        assert_eq!(claw.name, "ChopperClaw");
        assert_eq!(claw.gid, Some(2));
        assert!(claw.flipped_horizontal);
        assert!(!claw.flipped_vertical);
        assert_eq!(claw.property("stopY"), Some(&PropertyValue::Int(80)));
        assert_eq!(
            claw.property("spawnBox").and_then(PropertyValue::as_object_id),
            Some(4)
        );
        assert_eq!(enemies.objects[1].name, "");
        assert_eq!(enemies.objects[1].rotation, 0.0);
    }

    #[test]
    fn wrong_root_is_rejected_with_location() {
        let err = parse_tmx(Path::new("bad.tmx"), "<tileset/>").expect_err("err");
        assert_eq!(err.code, MapErrorCode::InvalidRoot);
        assert!(err.location.is_some());
    }

    #[test]
    fn malformed_xml_reports_location() {
        let err = parse_tmx(Path::new("bad.tmx"), "<map><layer></map>").expect_err("err");
        assert_eq!(err.code, MapErrorCode::XmlMalformed);
        assert!(err.location.is_some());
    }

    #[test]
    fn layer_tile_count_must_match_size() {
        let raw = r#"<map width="2" height="2" tilewidth="16" tileheight="16">
            <layer name="Platforms" width="2" height="2"><data encoding="csv">1,2,3</data></layer>
        </map>"#;
        let err = parse_tmx(Path::new("short.tmx"), raw).expect_err("err");
        assert_eq!(err.code, MapErrorCode::LayerSizeMismatch);
    }

    #[test]
    fn base64_layers_are_unsupported() {
        let raw = r#"<map width="1" height="1" tilewidth="16" tileheight="16">
            <layer name="Platforms" width="1" height="1"><data encoding="base64">AQAAAA==</data></layer>
        </map>"#;
        let err = parse_tmx(Path::new("b64.tmx"), raw).expect_err("err");
        assert_eq!(err.code, MapErrorCode::UnsupportedEncoding);
    }

    #[test]
    fn duplicate_object_ids_are_rejected() {
        let raw = r#"<map width="1" height="1" tilewidth="16" tileheight="16">
            <objectgroup name="Enemies"><object id="1" x="0" y="0"/></objectgroup>
            <objectgroup name="PowerUps"><object id="1" x="5" y="5"/></objectgroup>
        </map>"#;
        let err = parse_tmx(Path::new("dup.tmx"), raw).expect_err("err");
        assert_eq!(err.code, MapErrorCode::DuplicateObjectId);
        assert!(err.to_string().contains("file=dup.tmx"));
    }

    #[test]
    fn invalid_bool_property_names_the_property() {
        let raw = r#"<map width="1" height="1" tilewidth="16" tileheight="16">
            <objectgroup name="Enemies"><object id="1" name="BlobSpikeBall" x="0" y="0">
              <properties><property name="noSpikeForm" type="bool" value="maybe"/></properties>
            </object></objectgroup>
        </map>"#;
        let err = parse_tmx(Path::new("prop.tmx"), raw).expect_err("err");
        assert_eq!(err.code, MapErrorCode::InvalidValue);
        assert!(err.message.contains("noSpikeForm"));
    }
}
