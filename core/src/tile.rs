//! Tile model - identity, layout and settings of one dashboard widget.

use crate::targets::{take_targets, OutputTargets, OUTPUT_TARGETS_KEY};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::fmt;

/// Opaque, stable identity of a tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(String);

impl TileId {
    /// Fresh random identity for a newly added tile.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TileId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TileId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TileId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&TileId> for TileId {
    fn from(id: &TileId) -> Self {
        id.clone()
    }
}

/// Grid placement in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TileLayout {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl TileLayout {
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }
}

impl Default for TileLayout {
    fn default() -> Self {
        Self { x: 0, y: 0, w: 4, h: 3 }
    }
}

/// One dashboard widget.
///
/// `output_targets` is pulled out of the raw config when the tile is built, so
/// the flow graph never has to look inside `settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTile", into = "RawTile")]
pub struct Tile {
    pub id: TileId,
    /// Type discriminator, e.g. "notes" or "weather". Opaque to the flow graph.
    pub kind: String,
    pub layout: TileLayout,
    pub visible: bool,
    pub output_targets: OutputTargets,
    /// Tile-specific settings, minus the target keys.
    pub settings: Map<String, Value>,
}

impl Tile {
    pub fn new(id: impl Into<TileId>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            layout: TileLayout::default(),
            visible: true,
            output_targets: OutputTargets::default(),
            settings: Map::new(),
        }
    }

    /// Build a tile from a raw, loosely typed config bag.
    pub fn from_config(id: impl Into<TileId>, kind: impl Into<String>, config: Value) -> Self {
        let id: TileId = id.into();
        Tile::from(RawTile {
            id: id.0,
            kind: kind.into(),
            config,
            ..RawTile::default()
        })
    }

    pub fn with_targets<I, T>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TileId>,
    {
        self.output_targets = OutputTargets::new(targets);
        self
    }

    pub fn with_layout(mut self, layout: TileLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Whether this tile's output is declared to reach `target`.
    pub fn targets(&self, target: &str) -> bool {
        self.output_targets.contains(target)
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, patch: TilePatch) {
        if let Some(layout) = patch.layout {
            self.layout = layout;
        }
        if let Some(visible) = patch.visible {
            self.visible = visible;
        }
        if let Some(mut settings) = patch.settings {
            if let Some(targets) = take_targets(&mut settings) {
                self.output_targets = targets;
            }
            for (key, value) in settings {
                if value.is_null() {
                    self.settings.remove(&key);
                } else {
                    self.settings.insert(key, value);
                }
            }
        }
        if let Some(targets) = patch.output_targets {
            self.output_targets = targets;
        }
    }
}

/// Partial update for a tile. `None` fields are left untouched.
///
/// Settings are merged key by key; a `null` value deletes the key. Target keys
/// found in `settings` go through the same normalization as a load.
#[derive(Debug, Clone, Default)]
pub struct TilePatch {
    pub layout: Option<TileLayout>,
    pub visible: Option<bool>,
    pub settings: Option<Map<String, Value>>,
    pub output_targets: Option<OutputTargets>,
}

impl TilePatch {
    pub fn layout(layout: TileLayout) -> Self {
        Self {
            layout: Some(layout),
            ..Self::default()
        }
    }

    pub fn visible(visible: bool) -> Self {
        Self {
            visible: Some(visible),
            ..Self::default()
        }
    }

    pub fn settings(settings: Map<String, Value>) -> Self {
        Self {
            settings: Some(settings),
            ..Self::default()
        }
    }

    pub fn targets(targets: OutputTargets) -> Self {
        Self {
            output_targets: Some(targets),
            ..Self::default()
        }
    }
}

/// Stored shape of a tile: targets live inside the open `config` map.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RawTile {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub visible: bool,
    pub config: Value,
}

impl Default for RawTile {
    fn default() -> Self {
        let layout = TileLayout::default();
        Self {
            id: String::new(),
            kind: String::new(),
            x: layout.x,
            y: layout.y,
            w: layout.w,
            h: layout.h,
            visible: true,
            config: Value::Object(Map::new()),
        }
    }
}

impl From<RawTile> for Tile {
    fn from(raw: RawTile) -> Self {
        let mut settings = match raw.config {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let output_targets = take_targets(&mut settings).unwrap_or_default();
        let id = if raw.id.trim().is_empty() {
            let fresh = TileId::generate();
            log::warn!("Tile of type '{}' had no id, assigned {}", raw.kind, fresh);
            fresh
        } else {
            TileId(raw.id)
        };
        Tile {
            id,
            kind: raw.kind,
            layout: TileLayout {
                x: raw.x,
                y: raw.y,
                w: raw.w,
                h: raw.h,
            },
            visible: raw.visible,
            output_targets,
            settings,
        }
    }
}

impl From<Tile> for RawTile {
    fn from(tile: Tile) -> Self {
        let mut config = tile.settings;
        if !tile.output_targets.is_empty() {
            config.insert(OUTPUT_TARGETS_KEY.to_string(), tile.output_targets.to_json());
        }
        RawTile {
            id: tile.id.0,
            kind: tile.kind,
            x: tile.layout.x,
            y: tile.layout.y,
            w: tile.layout.w,
            h: tile.layout.h,
            visible: tile.visible,
            config: Value::Object(config),
        }
    }
}
