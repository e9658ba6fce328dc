//! Registry snapshots - whole-state save/restore of the tile list.
//!
//! Written as pretty JSON. Older dashboards stored a bare array of tiles; that
//! shape is still accepted on load and upgraded on the next save. Tiles that
//! fail to decode are skipped one by one; the rest of the file still loads.

use crate::tile::{RawTile, Tile};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::Path;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RegistrySnapshot {
    pub version: u32,
    pub tiles: Vec<RawTile>,
}

/// Outer shape of a versioned file. Tiles stay raw until decoded one at a time.
#[derive(Deserialize)]
struct SnapshotEnvelope {
    #[serde(default = "current_version")]
    version: u32,
    tiles: Vec<Value>,
}

fn current_version() -> u32 {
    SNAPSHOT_VERSION
}

impl RegistrySnapshot {
    pub fn new(tiles: impl IntoIterator<Item = Tile>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            tiles: tiles.into_iter().map(RawTile::from).collect(),
        }
    }

    /// Decode the stored tiles, normalizing legacy target fields on the way.
    pub fn into_tiles(self) -> Vec<Tile> {
        self.tiles.into_iter().map(Tile::from).collect()
    }

    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let (version, entries) = match serde_json::from_str(text)? {
            Value::Array(entries) => {
                log::info!("Upgrading unversioned snapshot ({} tiles)", entries.len());
                (SNAPSHOT_VERSION, entries)
            }
            other => {
                let envelope: SnapshotEnvelope = serde_json::from_value(other)
                    .map_err(|e| SnapshotError::Malformed(e.to_string()))?;
                (envelope.version, envelope.tiles)
            }
        };
        if version > SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(version));
        }

        let tiles = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value::<RawTile>(entry) {
                Ok(tile) => Some(tile),
                Err(e) => {
                    log::warn!("Snapshot: skipping tile #{}: {}", index, e);
                    None
                }
            })
            .collect();
        Ok(Self { version, tiles })
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load_from(path: &Path) -> Result<Self, SnapshotError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Load `path`, or an empty snapshot if the file does not exist yet.
    pub fn load_or_default(path: &Path) -> Result<Self, SnapshotError> {
        match Self::load_from(path) {
            Err(SnapshotError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No snapshot at {}, starting empty", path.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        fs::write(path, self.to_json()?)?;
        log::info!("Saved {} tiles to {}", self.tiles.len(), path.display());
        Ok(())
    }
}

impl Default for RegistrySnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            tiles: Vec::new(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("snapshot is not valid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot has the wrong shape: {0}")]
    Malformed(String),

    #[error("snapshot version {0} is newer than this build supports")]
    UnsupportedVersion(u32),
}
