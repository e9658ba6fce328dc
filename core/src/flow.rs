use crate::tile::TileId;
use mosaic_signals::{FlowPayload, Output, Timestamp};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Snapshot type handed to the resolution helpers.
pub type Outputs = HashMap<TileId, FlowPayload>;

/// Time source for publish stamps.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall clock, microsecond resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);
        Timestamp(micros)
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self(Arc::new(AtomicU64::new(start)))
    }

    pub fn set(&self, micros: u64) {
        self.0.store(micros, Ordering::SeqCst);
    }

    pub fn advance(&self, micros: u64) {
        self.0.fetch_add(micros, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.0.load(Ordering::SeqCst))
    }
}

/// Latest payload per producer tile.
///
/// Last write wins, nothing expires, nothing is persisted. Any caller may write
/// any key; by convention only the keyed producer writes its own entry.
///
/// Stamps are strictly increasing within one store, so two publishes are never
/// tied even when the clock does not move between them.
pub struct FlowStore<C: Clock = SystemClock> {
    outputs: Outputs,
    clock: C,
    last_stamp: Option<Timestamp>,
    revision: u64,
}

impl Default for FlowStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> FlowStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            outputs: HashMap::new(),
            clock,
            last_stamp: None,
            revision: 0,
        }
    }

    /// Stamp `output` and store it as `producer`'s current payload.
    pub fn publish(&mut self, producer: impl Into<TileId>, output: Output) -> &FlowPayload {
        let producer = producer.into();
        let stamp = self.next_stamp();
        log::debug!(
            "FlowStore: '{}' published {} ({} bytes) at {}",
            producer,
            output.data_type,
            output.content.len(),
            stamp
        );
        let payload = output.stamp(stamp);
        self.revision += 1;

        match self.outputs.entry(producer) {
            Entry::Occupied(mut slot) => {
                slot.insert(payload);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(payload),
        }
    }

    /// Drop `producer`'s payload. Missing entries are not an error.
    pub fn clear(&mut self, producer: &str) -> Option<FlowPayload> {
        let removed = self.outputs.remove(producer);
        if removed.is_some() {
            self.revision += 1;
            log::debug!("FlowStore: cleared output of '{}'", producer);
        }
        removed
    }

    pub fn get(&self, producer: &str) -> Option<&FlowPayload> {
        self.outputs.get(producer)
    }

    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Bumped by every publish and by every clear that removed something.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn next_stamp(&mut self) -> Timestamp {
        let now = self.clock.now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => Timestamp(last.0.saturating_add(1)),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }
}
