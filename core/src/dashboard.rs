use crate::flow::{Clock, FlowStore, SystemClock};
use crate::registry::TileRegistry;
use crate::resolve::{
    connected_source_ids, latest_connected_payload, latest_connected_payload_of_type,
};
use crate::tile::{Tile, TileId};
use mosaic_signals::{DataType, FlowPayload, Output};

/// A tile registry paired with the flow store its tiles publish into.
///
/// Both halves stay public; this type only bundles the calls tiles make most.
pub struct Dashboard<C: Clock = SystemClock> {
    pub registry: TileRegistry,
    pub flow: FlowStore<C>,
}

impl Default for Dashboard<SystemClock> {
    fn default() -> Self {
        Self::new(TileRegistry::new())
    }
}

impl Dashboard<SystemClock> {
    pub fn new(registry: TileRegistry) -> Self {
        Self::with_store(registry, FlowStore::new())
    }
}

impl<C: Clock> Dashboard<C> {
    pub fn with_store(registry: TileRegistry, flow: FlowStore<C>) -> Self {
        Self { registry, flow }
    }

    pub fn publish(&mut self, producer: impl Into<TileId>, output: Output) -> &FlowPayload {
        self.flow.publish(producer, output)
    }

    pub fn clear(&mut self, producer: &str) -> Option<FlowPayload> {
        self.flow.clear(producer)
    }

    /// What `consumer` should display right now.
    pub fn latest_for(&self, consumer: &str) -> Option<&FlowPayload> {
        latest_connected_payload(self.registry.tiles(), self.flow.outputs(), consumer)
    }

    pub fn latest_of_type_for(&self, consumer: &str, data_type: DataType) -> Option<&FlowPayload> {
        latest_connected_payload_of_type(
            self.registry.tiles(),
            self.flow.outputs(),
            consumer,
            data_type,
        )
    }

    pub fn sources_for(&self, consumer: &str) -> Vec<&TileId> {
        connected_source_ids(self.registry.tiles(), consumer)
    }

    /// Remove a tile and whatever it last published.
    pub fn remove_tile(&mut self, id: &str) -> Option<Tile> {
        let tile = self.registry.remove_tile(id)?;
        self.flow.clear(id);
        Some(tile)
    }
}
