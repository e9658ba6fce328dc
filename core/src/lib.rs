pub mod tile;
pub use tile::{RawTile, Tile, TileId, TileLayout, TilePatch};

pub mod targets;
pub use targets::{normalize_targets, OutputTargets};

pub mod registry;
pub use registry::{RegistryError, TileRegistry};

pub mod flow;
pub use flow::{Clock, FlowStore, ManualClock, Outputs, SystemClock};

pub mod resolve;
pub use resolve::{
    connected_source_ids, latest_connected_payload, latest_connected_payload_of_type,
};

pub mod snapshot;
pub use snapshot::{RegistrySnapshot, SnapshotError};

pub mod dashboard;
pub use dashboard::Dashboard;

// Re-export payload types from signals
pub use mosaic_signals::{DataType, FlowPayload, Output, SignalError, Timestamp};

/// JSON Schema of the snapshot file, for tooling that edits saved dashboards.
pub fn snapshot_schema() -> serde_json::Value {
    let schema = schemars::schema_for!(RegistrySnapshot);
    serde_json::to_value(schema).unwrap_or(serde_json::Value::Null)
}
