//! Seam to the external block device engine.
//!
//! The engine owns the data path: registration of pass-through devices over
//! their base devices, enforcement of the admitted access mode, and
//! statistics accounting. The control plane drives it through
//! [`BlockDeviceEngine`] and never touches the data path itself.

mod inmem;

pub use inmem::InMemoryEngine;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Opaque handle to a device registration inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(pub u64);

/// Failure reported by the engine; code and message are surfaced to the
/// caller verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct EngineError {
    pub code: i32,
    pub message: String,
}

impl EngineError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Point-in-time view of the engine's per-device I/O counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub read_request_count: u32,
    pub write_request_count: u32,
    pub blocked_request_count: u32,
    pub bytes_read: u64,
    pub bytes_written: u64,
}

/// The block device engine as seen by the control plane.
#[async_trait]
pub trait BlockDeviceEngine: Send + Sync {
    /// Register a pass-through device over `base_device_name`.
    ///
    /// Fails when the base device does not resolve or cannot be claimed;
    /// the failure is reported to the caller unmodified.
    async fn register(
        &self,
        base_device_name: &str,
        name: &str,
        identifier: Uuid,
    ) -> Result<HandleId, EngineError>;

    /// Tear down a registration.
    ///
    /// Runs on the engine's own schedule; the device must be treated as
    /// gone only after this resolves successfully.
    async fn unregister(&self, handle: HandleId) -> Result<(), EngineError>;

    /// Read the current counters for a registration without disturbing the
    /// data path.
    async fn read_statistics(&self, handle: HandleId) -> Result<StatsSnapshot, EngineError>;
}
