//! Fan-out of events to every live subscriber
//!
//! A broadcast works on a registry snapshot taken at its start. Each delivery
//! only enqueues, so a broadcast never waits on a subscriber; handles whose
//! queue is full or whose writer is gone are evicted and pruned afterwards in
//! one batch. Subscribers that join mid-broadcast miss that event.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::registry::{ConnectionRegistry, Frame};
use crate::error::{HubError, HubResult};
use crate::event::{Event, Source};
use crate::store::StateStore;

/// Outcome of one broadcast, for logging and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Subscribers in the snapshot
    pub targeted: usize,
    pub delivered: usize,
    /// Failed subscribers actually removed from the registry
    pub pruned: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubStatus {
    pub devices_known: usize,
    pub subscribers_connected: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BroadcastHub {
    store: Arc<StateStore>,
    registry: Arc<ConnectionRegistry>,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(Arc::new(StateStore::new()), Arc::new(ConnectionRegistry::new()))
    }
}

impl BroadcastHub {
    pub fn new(store: Arc<StateStore>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Deliver `event` to every subscriber live at the time of the call.
    ///
    /// Per-subscriber failures never reach the caller; they only prune.
    pub fn broadcast(&self, event: &Event) -> BroadcastReport {
        let frame = match encode(event) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::error!(kind = event.kind(), error = %err, "failed to encode event");
                return BroadcastReport::default();
            }
        };

        let targets = self.registry.snapshot();
        let mut failed = Vec::new();
        for handle in &targets {
            if let Err(err) = handle.deliver(Frame::clone(&frame)) {
                tracing::debug!(error = %err, "dropping subscriber");
                handle.evict();
                failed.push(handle.id());
            }
        }

        let pruned = self.registry.remove_all(&failed);
        if !failed.is_empty() {
            tracing::info!(
                kind = event.kind(),
                failed = failed.len(),
                pruned,
                "pruned unreachable subscribers"
            );
        }

        let report = BroadcastReport {
            targeted: targets.len(),
            delivered: targets.len() - failed.len(),
            pruned,
        };
        tracing::debug!(
            kind = event.kind(),
            targeted = report.targeted,
            delivered = report.delivered,
            "broadcast complete"
        );
        report
    }

    /// Store a new value for `device_id` and tell every subscriber about it.
    pub fn submit_data(
        &self,
        device_id: &str,
        value: Value,
        source: Source,
    ) -> HubResult<Event> {
        self.store.put(device_id, value.clone())?;

        let event = Event::data_update(device_id, value, source);
        self.broadcast(&event);
        Ok(event)
    }

    /// Relay a command to every subscriber. No target or permission checks.
    pub fn submit_control(
        &self,
        target: Option<String>,
        command: Option<String>,
        args: Map<String, Value>,
        source: Source,
    ) -> Event {
        let event = Event::control(target, command, args, source);
        self.broadcast(&event);
        event
    }

    /// Greeting for a new subscriber, carrying the state it missed.
    pub fn hello(&self) -> Event {
        Event::hello(self.store.snapshot())
    }

    pub fn status(&self) -> HubStatus {
        HubStatus {
            devices_known: self.store.count(),
            subscribers_connected: self.registry.count(),
            timestamp: Utc::now(),
        }
    }
}

pub fn encode(event: &Event) -> Result<Frame, HubError> {
    Ok(Frame::from(serde_json::to_string(event)?))
}
