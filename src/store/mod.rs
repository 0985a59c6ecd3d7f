//! Shared device state
//!
//! Latest value per device, process lifetime only. Every read and write goes
//! through one lock; no caller ever sees the map itself.

pub mod record;

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{HubError, HubResult};

pub use record::DeviceRecord;

/// Point-in-time copy of the whole store, ordered by device id.
pub type StateSnapshot = BTreeMap<String, DeviceRecord>;

#[derive(Debug, Default)]
pub struct StateStore {
    records: RwLock<HashMap<String, DeviceRecord>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the record for `device_id`, returning the one it displaced.
    ///
    /// The last write to take the lock wins.
    pub fn put(&self, device_id: &str, value: Value) -> HubResult<Option<DeviceRecord>> {
        if device_id.is_empty() {
            return Err(HubError::invalid("device_id must not be empty"));
        }

        let record = DeviceRecord::new(device_id, value);
        let previous = self.records.write().insert(device_id.to_string(), record);
        Ok(previous)
    }

    pub fn get(&self, device_id: &str) -> Option<DeviceRecord> {
        self.records.read().get(device_id).cloned()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let records = self.records.read();
        records
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.records.read().len()
    }
}
