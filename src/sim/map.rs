//! Level map data
//!
//! Maps are JSON documents:
//!
//! ```json
//! {
//!   "birds":  [{"type": "red_bird"}],
//!   "pigs":   [{"type": "normal_pig", "x": 900, "y": 550}],
//!   "blocks": [{"material": "wood", "shape": "beam", "type": 3, "x": 850, "y": 550, "direction": 1}]
//! }
//! ```
//!
//! `x` is the sprite's left edge and `y` its bottom edge, in screen pixels.
//! `direction` is optional (0 horizontal, 1 vertical).

use serde::{Deserialize, Serialize};

use crate::error::SimError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirdEntry {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PigEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockEntry {
    pub material: String,
    pub shape: String,
    #[serde(rename = "type")]
    pub subtype: u32,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub direction: u32,
}

/// One level's starting layout
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LevelMap {
    #[serde(default)]
    pub birds: Vec<BirdEntry>,
    #[serde(default)]
    pub pigs: Vec<PigEntry>,
    #[serde(default)]
    pub blocks: Vec<BlockEntry>,
}

impl LevelMap {
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Supplies level maps by number (1-based)
pub trait MapSource {
    fn load(&self, level: u32) -> Result<LevelMap, SimError>;

    fn level_count(&self) -> u32;
}

const LEVEL_1: &str = r#"{
  "birds": [{"type": "red_bird"}, {"type": "red_bird"}, {"type": "blue_bird"}],
  "pigs": [{"type": "normal_pig", "x": 900, "y": 550}],
  "blocks": [
    {"material": "wood", "shape": "beam", "type": 3, "x": 840, "y": 550, "direction": 1},
    {"material": "wood", "shape": "beam", "type": 3, "x": 980, "y": 550, "direction": 1},
    {"material": "wood", "shape": "beam", "type": 3, "x": 840, "y": 390}
  ]
}"#;

const LEVEL_2: &str = r#"{
  "birds": [{"type": "yellow_bird"}, {"type": "black_bird"}, {"type": "white_bird"}],
  "pigs": [
    {"type": "normal_pig", "x": 760, "y": 550},
    {"type": "big_pig", "x": 950, "y": 550}
  ],
  "blocks": [
    {"material": "glass", "shape": "beam", "type": 2, "x": 720, "y": 550, "direction": 1},
    {"material": "glass", "shape": "beam", "type": 2, "x": 820, "y": 550, "direction": 1},
    {"material": "glass", "shape": "beam", "type": 3, "x": 700, "y": 470},
    {"material": "stone", "shape": "beam", "type": 6, "x": 900, "y": 550},
    {"material": "stone", "shape": "beam", "type": 6, "x": 1040, "y": 550},
    {"material": "wood", "shape": "circle", "type": 1, "x": 1060, "y": 512}
  ]
}"#;

const LEVEL_3: &str = r#"{
  "birds": [{"type": "big_red_bird"}, {"type": "blue_bird"}, {"type": "black_bird"}, {"type": "red_bird"}],
  "pigs": [
    {"type": "big_pig", "x": 820, "y": 550},
    {"type": "normal_pig", "x": 1000, "y": 432}
  ],
  "blocks": [
    {"material": "stone", "shape": "beam", "type": 4, "x": 780, "y": 550, "direction": 1},
    {"material": "wood", "shape": "beam", "type": 5, "x": 940, "y": 550, "direction": 1},
    {"material": "wood", "shape": "beam", "type": 5, "x": 1060, "y": 550, "direction": 1},
    {"material": "wood", "shape": "beam", "type": 3, "x": 940, "y": 470},
    {"material": "glass", "shape": "circle", "type": 2, "x": 1100, "y": 550}
  ]
}"#;

/// Built-in levels compiled into the crate
#[derive(Debug, Clone)]
pub struct StaticMaps {
    levels: Vec<&'static str>,
}

impl Default for StaticMaps {
    fn default() -> Self {
        Self {
            levels: vec![LEVEL_1, LEVEL_2, LEVEL_3],
        }
    }
}

impl StaticMaps {
    pub fn new(levels: Vec<&'static str>) -> Self {
        Self { levels }
    }
}

impl MapSource for StaticMaps {
    fn load(&self, level: u32) -> Result<LevelMap, SimError> {
        let index = level.checked_sub(1).ok_or(SimError::MissingLevel(level))? as usize;
        let json = self.levels.get(index).ok_or(SimError::MissingLevel(level))?;
        LevelMap::from_json(json)
    }

    fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_levels_parse() {
        let maps = StaticMaps::default();
        assert_eq!(maps.level_count(), 3);
        for level in 1..=maps.level_count() {
            let map = maps.load(level).unwrap();
            assert!(!map.birds.is_empty());
            assert!(!map.pigs.is_empty());
        }
    }

    #[test]
    fn missing_levels_are_errors() {
        let maps = StaticMaps::default();
        assert!(matches!(maps.load(0), Err(SimError::MissingLevel(0))));
        assert!(matches!(maps.load(4), Err(SimError::MissingLevel(4))));
    }

    #[test]
    fn direction_defaults_to_horizontal() {
        let map = LevelMap::from_json(
            r#"{"blocks": [{"material": "wood", "shape": "beam", "type": 1, "x": 10, "y": 20}]}"#,
        )
        .unwrap();
        assert_eq!(map.blocks[0].direction, 0);
        assert!(map.birds.is_empty());
    }

    #[test]
    fn bad_json_is_a_map_error() {
        assert!(matches!(
            LevelMap::from_json("{\"birds\": 3}"),
            Err(SimError::Map(_))
        ));
    }
}
