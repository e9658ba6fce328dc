use crate::resolve::connected_source_ids;
use crate::snapshot::RegistrySnapshot;
use crate::targets::OutputTargets;
use crate::tile::{Tile, TileId, TileLayout, TilePatch};

/// TileRegistry owns every tile on the dashboard.
///
/// Tiles keep their insertion order; connection resolution reports sources in
/// that order. No other component changes a tile's identity.
pub struct TileRegistry {
    tiles: Vec<Tile>,
    /// Width/height for tiles created by `add_tile`
    default_size: (u32, u32),
}

impl Default for TileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TileRegistry {
    pub fn new() -> Self {
        let layout = TileLayout::default();
        Self {
            tiles: Vec::new(),
            default_size: (layout.w, layout.h),
        }
    }

    pub fn with_default_size(mut self, w: u32, h: u32) -> Self {
        self.default_size = (w.max(1), h.max(1));
        self
    }

    /// Build a registry from already loaded tiles. Later duplicates of an id are dropped.
    pub fn from_tiles(tiles: impl IntoIterator<Item = Tile>) -> Self {
        let mut registry = Self::new();
        for tile in tiles {
            if let Err(e) = registry.insert(tile) {
                log::warn!("TileRegistry: skipping tile: {}", e);
            }
        }
        registry
    }

    /// Create a tile of `kind` with a fresh id, placed below the existing tiles.
    pub fn add_tile(&mut self, kind: impl Into<String>) -> TileId {
        let (w, h) = self.default_size;
        let y = self.tiles.iter().map(|t| t.layout.bottom()).max().unwrap_or(0);
        let tile = Tile::new(TileId::generate(), kind).with_layout(TileLayout { x: 0, y, w, h });
        let id = tile.id.clone();
        log::info!("TileRegistry: added '{}' tile {}", tile.kind, id);
        self.tiles.push(tile);
        id
    }

    /// Insert a fully built tile.
    pub fn insert(&mut self, tile: Tile) -> Result<(), RegistryError> {
        if self.contains(tile.id.as_str()) {
            return Err(RegistryError::DuplicateTile(tile.id.to_string()));
        }
        log::debug!("TileRegistry: inserted tile {}", tile.id);
        self.tiles.push(tile);
        Ok(())
    }

    /// Remove a tile. Other tiles may still list it as a target; such entries
    /// simply never match a source again.
    pub fn remove_tile(&mut self, id: &str) -> Option<Tile> {
        let idx = self.tiles.iter().position(|t| t.id.as_str() == id)?;
        let tile = self.tiles.remove(idx);
        log::info!("TileRegistry: removed tile {}", id);
        Some(tile)
    }

    pub fn get(&self, id: &str) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id.as_str() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Apply a partial update to one tile.
    pub fn update(&mut self, id: &str, patch: TilePatch) -> Result<&Tile, RegistryError> {
        let tile = self.get_mut(id)?;
        tile.apply(patch);
        Ok(&*tile)
    }

    /// Add `sink` to `source`'s output targets.
    ///
    /// A tile may target itself.
    pub fn connect(&mut self, source: &str, sink: &str) -> Result<(), RegistryError> {
        if !self.contains(sink) {
            return Err(RegistryError::TileNotFound(sink.to_string()));
        }
        let tile = self.get_mut(source)?;
        if !tile.output_targets.push(sink) {
            return Err(RegistryError::DuplicateTarget {
                producer: source.to_string(),
                consumer: sink.to_string(),
            });
        }
        log::info!("TileRegistry: connected {} -> {}", source, sink);
        Ok(())
    }

    /// Remove `sink` from `source`'s output targets. Returns whether it was there.
    pub fn disconnect(&mut self, source: &str, sink: &str) -> Result<bool, RegistryError> {
        let removed = self.get_mut(source)?.output_targets.remove(sink);
        if removed {
            log::info!("TileRegistry: disconnected {} -> {}", source, sink);
        }
        Ok(removed)
    }

    /// Targets declared by `id`.
    pub fn outgoing(&self, id: &str) -> Option<&OutputTargets> {
        self.get(id).map(|t| &t.output_targets)
    }

    /// Tiles that declare `id` as a target.
    pub fn incoming(&self, id: &str) -> Vec<&TileId> {
        connected_source_ids(&self.tiles, id)
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot::new(self.tiles.iter().cloned())
    }

    /// Replace every tile with the snapshot's contents.
    pub fn restore(&mut self, snapshot: RegistrySnapshot) {
        let default_size = self.default_size;
        *self = Self::from_tiles(snapshot.into_tiles());
        self.default_size = default_size;
        log::info!("TileRegistry: restored {} tiles", self.tiles.len());
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Tile, RegistryError> {
        self.tiles
            .iter_mut()
            .find(|t| t.id.as_str() == id)
            .ok_or_else(|| RegistryError::TileNotFound(id.to_string()))
    }
}

/// Errors that can occur during registry operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tile not found: {0}")]
    TileNotFound(String),

    #[error("tile already exists: {0}")]
    DuplicateTile(String),

    #[error("{producer} already targets {consumer}")]
    DuplicateTarget { producer: String, consumer: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_tile_stacks_below() {
        let mut registry = TileRegistry::new().with_default_size(6, 2);
        let first = registry.add_tile("notes");
        let second = registry.add_tile("weather");

        assert_ne!(first, second);
        let a = registry.get(first.as_str()).unwrap();
        let b = registry.get(second.as_str()).unwrap();
        assert_eq!(a.layout, TileLayout { x: 0, y: 0, w: 6, h: 2 });
        assert_eq!(b.layout, TileLayout { x: 0, y: 2, w: 6, h: 2 });
        assert!(b.visible);
        assert!(b.output_targets.is_empty());
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let mut registry = TileRegistry::new();
        registry.insert(Tile::new("a", "notes")).unwrap();
        let err = registry.insert(Tile::new("a", "clock")).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTile("a".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_connect_and_disconnect() {
        let mut registry = TileRegistry::from_tiles([Tile::new("a", "stt"), Tile::new("b", "tts")]);

        registry.connect("a", "b").unwrap();
        assert!(matches!(
            registry.connect("a", "b"),
            Err(RegistryError::DuplicateTarget { .. })
        ));
        assert_eq!(
            registry.connect("a", "ghost"),
            Err(RegistryError::TileNotFound("ghost".into()))
        );
        assert_eq!(
            registry.connect("ghost", "b"),
            Err(RegistryError::TileNotFound("ghost".into()))
        );

        let incoming: Vec<&str> = registry.incoming("b").into_iter().map(TileId::as_str).collect();
        assert_eq!(incoming, vec!["a"]);

        assert_eq!(registry.disconnect("a", "b"), Ok(true));
        assert_eq!(registry.disconnect("a", "b"), Ok(false));
        assert!(registry.incoming("b").is_empty());
    }

    #[test]
    fn test_self_connection_allowed() {
        let mut registry = TileRegistry::from_tiles([Tile::new("loop", "notes")]);
        registry.connect("loop", "loop").unwrap();
        assert!(registry.outgoing("loop").unwrap().contains("loop"));
    }

    #[test]
    fn test_update_patch() {
        let mut registry = TileRegistry::from_tiles([Tile::new("a", "weather")]);
        let patch = TilePatch {
            layout: Some(TileLayout { x: 1, y: 1, w: 2, h: 2 }),
            settings: json!({"city": "Lisbon", "outputTargets": ["b"]})
                .as_object()
                .cloned(),
            ..TilePatch::default()
        };
        let tile = registry.update("a", patch).unwrap();
        assert_eq!(tile.layout.w, 2);
        assert!(tile.targets("b"));
        assert_eq!(tile.settings.get("city"), Some(&json!("Lisbon")));

        assert!(matches!(
            registry.update("missing", TilePatch::visible(false)),
            Err(RegistryError::TileNotFound(_))
        ));
    }

    #[test]
    fn test_remove_leaves_dangling_targets() {
        let mut registry = TileRegistry::from_tiles([
            Tile::new("a", "notes").with_targets(["b"]),
            Tile::new("b", "tts"),
        ]);
        assert!(registry.remove_tile("b").is_some());
        assert!(registry.remove_tile("b").is_none());
        assert!(registry.outgoing("a").unwrap().contains("b"));
    }

    #[test]
    fn test_from_tiles_drops_duplicates() {
        let registry = TileRegistry::from_tiles([
            Tile::new("a", "notes"),
            Tile::new("a", "clock"),
            Tile::new("b", "clock"),
        ]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("a").unwrap().kind, "notes");
    }

    #[test]
    fn test_snapshot_restore() {
        let mut registry = TileRegistry::from_tiles([Tile::new("a", "notes").with_targets(["b"])]);
        let snapshot = registry.snapshot();
        registry.remove_tile("a");
        assert!(registry.is_empty());

        registry.restore(snapshot);
        assert!(registry.get("a").unwrap().targets("b"));
    }
}
