//! Connection resolution - which payload a consumer tile should see right now.
//!
//! Pure queries over a tile list and a flow store snapshot. A tile is connected
//! to a consumer when the consumer's id is in the tile's own `output_targets`.
//! Resolution is a single pass over the tiles, so self-targeting tiles and
//! cycles need no special handling.

use crate::flow::Outputs;
use crate::tile::{Tile, TileId};
use mosaic_signals::{DataType, FlowPayload};

/// Ids of every tile whose targets include `target`, in tile order, each once.
pub fn connected_source_ids<'a>(tiles: &'a [Tile], target: &str) -> Vec<&'a TileId> {
    let mut sources: Vec<&TileId> = Vec::new();
    for tile in tiles {
        if tile.targets(target) && !sources.contains(&&tile.id) {
            sources.push(&tile.id);
        }
    }
    sources
}

/// Newest live payload among the tiles connected to `target`.
///
/// Sources without a published payload are skipped. Returns `None` when no
/// connected source has one.
pub fn latest_connected_payload<'a>(
    tiles: &[Tile],
    outputs: &'a Outputs,
    target: &str,
) -> Option<&'a FlowPayload> {
    newest(tiles, outputs, target, |_| true)
}

/// Like [`latest_connected_payload`], restricted to one payload kind.
pub fn latest_connected_payload_of_type<'a>(
    tiles: &[Tile],
    outputs: &'a Outputs,
    target: &str,
    data_type: DataType,
) -> Option<&'a FlowPayload> {
    newest(tiles, outputs, target, |p| p.data_type == data_type)
}

fn newest<'a>(
    tiles: &[Tile],
    outputs: &'a Outputs,
    target: &str,
    accept: impl Fn(&FlowPayload) -> bool,
) -> Option<&'a FlowPayload> {
    connected_source_ids(tiles, target)
        .into_iter()
        .filter_map(|id| outputs.get(id))
        .filter(|payload| accept(*payload))
        .max_by_key(|payload| payload.timestamp)
}
