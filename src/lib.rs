//! # State Hub - Real-time Device State Synchronization
//!
//! Keeps the latest value reported by every device and pushes each change to
//! all live WebSocket subscribers.
//!
//! ## Features
//!
//! - **Shared state**: last-write-wins store, one record per device id
//! - **Fan-out**: every subscriber gets every update, including the sender
//! - **Failure isolation**: a dead subscriber is pruned without stalling the rest
//! - **Two ingestion paths**: stream telemetry and REST updates end up on the same path
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use state_hub::{config::HubConfig, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     server::start(HubConfig::from_env()?).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod server;
pub mod store;
pub mod sync;

// Re-export main types for library consumers
pub use error::{ErrorCategory, HubError, HubResult};
pub use event::{Event, Source};
pub use store::{DeviceRecord, StateSnapshot, StateStore};
pub use sync::{BroadcastHub, ConnectionHandle, ConnectionRegistry, HubClient, Session};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
