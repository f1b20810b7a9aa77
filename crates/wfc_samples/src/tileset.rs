//! Simple tiled sets: named tiles with weights, colors and neighbor rules.
//!
//! Format:
//!
//! ```xml
//! <set>
//!   <tiles>
//!     <tile name="water" weight="2.0" color="2B5FAA"/>
//!   </tiles>
//!   <neighbors>
//!     <neighbor left="water" right="sand"/>
//!     <neighbor top="sand" bottom="water"/>
//!   </neighbors>
//! </set>
//! ```
//!
//! `left/right` allows `right` at +X of `left`; `top/bottom` allows `bottom`
//! at +Y of `top`. Each rule also allows the reverse direction.

use std::collections::HashMap;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use wfc_core::Propagator;

use crate::error::LoadError;
use crate::xml::{element_name, Attributes};

/// Colors handed out to tiles that do not declare one.
const FALLBACK_COLORS: [[u8; 4]; 8] = [
    [0x1D, 0x2B, 0x53, 0xFF],
    [0xFF, 0xA3, 0x00, 0xFF],
    [0x00, 0xE4, 0x36, 0xFF],
    [0x29, 0xAD, 0xFF, 0xFF],
    [0xFF, 0x00, 0x4D, 0xFF],
    [0xFF, 0xEC, 0x27, 0xFF],
    [0x83, 0x76, 0x9C, 0xFF],
    [0xFF, 0xF1, 0xE8, 0xFF],
];

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub name: String,
    pub weight: f64,
    pub color: [u8; 4],
}

/// Parsed tileset, with neighbor rules resolved to tile indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Tileset {
    pub tiles: Vec<Tile>,
    /// `(left, right)` pairs
    pub horizontal: Vec<(usize, usize)>,
    /// `(top, bottom)` pairs
    pub vertical: Vec<(usize, usize)>,
}

impl Tileset {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let xml = std::fs::read_to_string(path)
            .map_err(|e| LoadError::FileNotFound(format!("{}: {}", path.display(), e)))?;
        let tileset = Self::parse(&xml)?;
        if tileset.tiles.is_empty() {
            return Err(LoadError::EmptyTileset(path.display().to_string()));
        }
        tracing::debug!(
            path = %path.display(),
            tiles = tileset.tiles.len(),
            horizontal = tileset.horizontal.len(),
            vertical = tileset.vertical.len(),
            "tileset loaded"
        );
        Ok(tileset)
    }

    pub fn parse(xml: &str) -> Result<Self, LoadError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut tiles = Vec::new();
        let mut rules = Vec::new();
        let mut in_tiles = false;
        let mut in_neighbors = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => match element_name(e)?.as_str() {
                    "tiles" => in_tiles = true,
                    "neighbors" => in_neighbors = true,
                    "tile" if in_tiles => tiles.push(parse_tile_element(e, tiles.len())?),
                    "neighbor" if in_neighbors => rules.push(parse_neighbor_element(e)?),
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => match element_name(e)?.as_str() {
                    "tile" if in_tiles => tiles.push(parse_tile_element(e, tiles.len())?),
                    "neighbor" if in_neighbors => rules.push(parse_neighbor_element(e)?),
                    _ => {}
                },
                Ok(Event::End(ref e)) => {
                    match std::str::from_utf8(e.name().as_ref()).unwrap_or("") {
                        "tiles" => in_tiles = false,
                        "neighbors" => in_neighbors = false,
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(LoadError::XmlError(format!("{}", e))),
                _ => {}
            }
        }

        let index: HashMap<&str, usize> = tiles
            .iter()
            .enumerate()
            .map(|(i, t): (usize, &Tile)| (t.name.as_str(), i))
            .collect();
        let lookup = |name: &str| {
            index.get(name).copied().ok_or_else(|| LoadError::UnknownTile {
                name: name.to_string(),
                context: "neighbor rule".to_string(),
            })
        };

        let mut horizontal = Vec::new();
        let mut vertical = Vec::new();
        for rule in &rules {
            let pair = (lookup(rule.first.as_str())?, lookup(rule.second.as_str())?);
            match rule.dir {
                NeighborDir::Horizontal => horizontal.push(pair),
                NeighborDir::Vertical => vertical.push(pair),
            }
        }

        Ok(Self {
            tiles,
            horizontal,
            vertical,
        })
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.tiles.iter().map(|t| t.name.clone()).collect()
    }

    pub fn weights(&self) -> Vec<f64> {
        self.tiles.iter().map(|t| t.weight).collect()
    }

    pub fn colors(&self) -> Vec<[u8; 4]> {
        self.tiles.iter().map(|t| t.color).collect()
    }

    /// Symmetric propagator built from the neighbor rules.
    pub fn propagator(&self) -> Result<Propagator, LoadError> {
        Ok(Propagator::from_neighbor_pairs(
            self.tiles.len(),
            &self.horizontal,
            &self.vertical,
        )?)
    }
}

#[derive(Debug, Clone, Copy)]
enum NeighborDir {
    Horizontal,
    Vertical,
}

/// One neighbor rule before name resolution.
#[derive(Debug, Clone)]
struct NeighborRule {
    dir: NeighborDir,
    /// Left or top tile
    first: String,
    /// Right or bottom tile
    second: String,
}

fn parse_tile_element(e: &BytesStart, position: usize) -> Result<Tile, LoadError> {
    let attrs = Attributes::parse(e)?;
    let name = attrs.required("name")?.to_string();
    let weight: f64 = attrs.parse_or("weight", 1.0)?;
    let color = match attrs.get("color") {
        Some(hex) => parse_color(hex).ok_or_else(|| attrs.invalid("color", hex, "expected RRGGBB"))?,
        None => FALLBACK_COLORS[position % FALLBACK_COLORS.len()],
    };
    Ok(Tile {
        name,
        weight,
        color,
    })
}

fn parse_neighbor_element(e: &BytesStart) -> Result<NeighborRule, LoadError> {
    let attrs = Attributes::parse(e)?;

    let (dir, first, second) = match (
        attrs.get("left"),
        attrs.get("right"),
        attrs.get("top"),
        attrs.get("bottom"),
    ) {
        (Some(l), Some(r), _, _) => (NeighborDir::Horizontal, l, r),
        (_, _, Some(t), Some(b)) => (NeighborDir::Vertical, t, b),
        _ => {
            return Err(LoadError::MissingAttribute {
                element: "neighbor".to_string(),
                attribute: "left/right or top/bottom".to_string(),
            })
        }
    };

    Ok(NeighborRule {
        dir,
        first: first.to_string(),
        second: second.to_string(),
    })
}

/// `RRGGBB` or `#RRGGBB` to opaque RGBA.
pub fn parse_color(hex: &str) -> Option<[u8; 4]> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?, 0xFF])
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKERS: &str = r##"
        <set>
          <tiles>
            <tile name="black" color="000000"/>
            <tile name="white" weight="3" color="#FFFFFF"/>
          </tiles>
          <neighbors>
            <neighbor left="black" right="white"/>
            <neighbor left="white" right="black"/>
            <neighbor top="black" bottom="white"/>
            <neighbor top="white" bottom="black"/>
          </neighbors>
        </set>"##;

    #[test]
    fn test_parse_tiles() {
        let set = Tileset::parse(CHECKERS).unwrap();
        assert_eq!(set.names(), vec!["black", "white"]);
        assert_eq!(set.weights(), vec![1.0, 3.0]);
        assert_eq!(set.colors()[1], [255, 255, 255, 255]);
        assert_eq!(set.horizontal, vec![(0, 1), (1, 0)]);
        assert_eq!(set.vertical, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn test_open_and_close_elements() {
        let xml = r#"<set>
            <tiles><tile name="a" weight="2"></tile><tile name="b"/></tiles>
            <neighbors>
              <neighbor left="a" right="b"></neighbor>
              <neighbor top="b" bottom="a"/>
            </neighbors>
          </set>"#;
        let set = Tileset::parse(xml).unwrap();
        assert_eq!(set.names(), vec!["a", "b"]);
        assert_eq!(set.weights(), vec![2.0, 1.0]);
        assert_eq!(set.horizontal, vec![(0, 1)]);
        assert_eq!(set.vertical, vec![(1, 0)]);
    }

    #[test]
    fn test_vertical_rule_direction() {
        let xml = r#"<set><tiles><tile name="sky"/><tile name="ground"/></tiles>
            <neighbors><neighbor top="sky" bottom="ground"/></neighbors></set>"#;
        let prop = Tileset::parse(xml).unwrap().propagator().unwrap();
        // ground below sky (+Y), sky above ground (-Y)
        assert!(prop.allows(1, 0, 1));
        assert!(prop.allows(3, 1, 0));
        assert!(!prop.allows(1, 1, 0));
    }

    #[test]
    fn test_unknown_tile_in_rule() {
        let xml = r#"<set><tiles><tile name="a"/></tiles>
            <neighbors><neighbor left="a" right="b"/></neighbors></set>"#;
        assert_eq!(
            Tileset::parse(xml).unwrap_err(),
            LoadError::UnknownTile {
                name: "b".to_string(),
                context: "neighbor rule".to_string()
            }
        );
    }

    #[test]
    fn test_incomplete_neighbor_rule() {
        let xml = r#"<set><tiles><tile name="a"/></tiles>
            <neighbors><neighbor left="a" bottom="a"/></neighbors></set>"#;
        assert!(matches!(
            Tileset::parse(xml),
            Err(LoadError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_bad_weight_and_color() {
        let xml = r#"<set><tiles><tile name="a" weight="heavy"/></tiles></set>"#;
        assert!(matches!(
            Tileset::parse(xml),
            Err(LoadError::InvalidAttribute { .. })
        ));
        let xml = r#"<set><tiles><tile name="a" color="12345"/></tiles></set>"#;
        assert!(matches!(
            Tileset::parse(xml),
            Err(LoadError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn test_zero_weight_rejected_by_model() {
        let xml = r#"<set><tiles><tile name="a" weight="0"/></tiles></set>"#;
        let set = Tileset::parse(xml).unwrap();
        let err = wfc_core::WfcModel::new(
            wfc_core::ModelConfig::default(),
            set.weights(),
            set.propagator().unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, wfc_core::ModelError::InvalidWeight { .. }));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("2B5FAA"), Some([0x2B, 0x5F, 0xAA, 0xFF]));
        assert_eq!(parse_color("#000000"), Some([0, 0, 0, 255]));
        assert_eq!(parse_color("GG0000"), None);
        assert_eq!(parse_color("FFF"), None);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Tileset::load(&dir.path().join("nope.xml")),
            Err(LoadError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_load_empty_tileset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xml");
        std::fs::write(&path, "<set><tiles></tiles></set>").unwrap();
        assert!(matches!(
            Tileset::load(&path),
            Err(LoadError::EmptyTileset(_))
        ));
    }
}
