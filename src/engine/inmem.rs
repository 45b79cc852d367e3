//! In-process engine implementation.
//!
//! Backs the shim binary and the test suite: base devices are entries in a
//! set, registrations are per-handle atomic counter blocks, and teardown can
//! be gated or made to fail so callers can exercise the asynchronous delete
//! window.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify, RwLock};
use tracing::debug;
use uuid::Uuid;

use super::{BlockDeviceEngine, EngineError, HandleId, StatsSnapshot};

const ENODEV: i32 = -19;
const EBUSY: i32 = -16;

#[derive(Default)]
struct DeviceCounters {
    read_request_count: AtomicU32,
    write_request_count: AtomicU32,
    blocked_request_count: AtomicU32,
    bytes_read: AtomicU64,
    bytes_written: AtomicU64,
}

impl DeviceCounters {
    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            read_request_count: self.read_request_count.load(Ordering::SeqCst),
            write_request_count: self.write_request_count.load(Ordering::SeqCst),
            blocked_request_count: self.blocked_request_count.load(Ordering::SeqCst),
            bytes_read: self.bytes_read.load(Ordering::SeqCst),
            bytes_written: self.bytes_written.load(Ordering::SeqCst),
        }
    }
}

struct Registration {
    base_device_name: String,
    counters: Arc<DeviceCounters>,
}

/// Engine implementation over in-process state.
#[derive(Default)]
pub struct InMemoryEngine {
    bases: RwLock<HashSet<String>>,
    /// Base devices currently claimed by a registration; one claim each.
    claims: Mutex<HashSet<String>>,
    devices: RwLock<HashMap<HandleId, Registration>>,
    next_handle: AtomicU64,
    /// When set, the next unregister reports this failure and leaves the
    /// registration in place.
    unregister_failure: Mutex<Option<EngineError>>,
    /// When set, unregister waits for one permit per call before acting.
    unregister_gate: Mutex<Option<Arc<Notify>>>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a base device available for registration.
    pub async fn add_base_device(&self, name: impl Into<String>) {
        self.bases.write().await.insert(name.into());
    }

    /// Arrange for the next unregister call to fail with `code`/`message`.
    pub async fn fail_next_unregister(&self, code: i32, message: impl Into<String>) {
        *self.unregister_failure.lock().await = Some(EngineError::new(code, message));
    }

    /// Hold unregister calls open until the returned gate is notified.
    /// Each `notify_one` lets one call through.
    pub async fn hold_unregister(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.unregister_gate.lock().await = Some(Arc::clone(&gate));
        gate
    }

    /// Account a read served by the data path.
    pub async fn record_read(&self, handle: HandleId, bytes: u64) -> Result<(), EngineError> {
        let counters = self.counters_for(handle).await?;
        counters.read_request_count.fetch_add(1, Ordering::SeqCst);
        counters.bytes_read.fetch_add(bytes, Ordering::SeqCst);
        Ok(())
    }

    /// Account a write served by the data path.
    pub async fn record_write(&self, handle: HandleId, bytes: u64) -> Result<(), EngineError> {
        let counters = self.counters_for(handle).await?;
        counters.write_request_count.fetch_add(1, Ordering::SeqCst);
        counters.bytes_written.fetch_add(bytes, Ordering::SeqCst);
        Ok(())
    }

    /// Account a request rejected by the admission policy.
    pub async fn record_blocked(&self, handle: HandleId) -> Result<(), EngineError> {
        let counters = self.counters_for(handle).await?;
        counters.blocked_request_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn counters_for(&self, handle: HandleId) -> Result<Arc<DeviceCounters>, EngineError> {
        let devices = self.devices.read().await;
        devices
            .get(&handle)
            .map(|r| Arc::clone(&r.counters))
            .ok_or_else(|| EngineError::new(ENODEV, "unknown registration handle"))
    }
}

#[async_trait]
impl BlockDeviceEngine for InMemoryEngine {
    async fn register(
        &self,
        base_device_name: &str,
        name: &str,
        identifier: Uuid,
    ) -> Result<HandleId, EngineError> {
        if !self.bases.read().await.contains(base_device_name) {
            return Err(EngineError::new(
                ENODEV,
                format!("base device {} not found", base_device_name),
            ));
        }

        {
            let mut claims = self.claims.lock().await;
            if !claims.insert(base_device_name.to_string()) {
                return Err(EngineError::new(
                    EBUSY,
                    format!("base device {} busy", base_device_name),
                ));
            }
        }

        let handle = HandleId(self.next_handle.fetch_add(1, Ordering::SeqCst) + 1);
        self.devices.write().await.insert(
            handle,
            Registration {
                base_device_name: base_device_name.to_string(),
                counters: Arc::new(DeviceCounters::default()),
            },
        );

        debug!(
            "engine: registered {} ({}) over {}",
            name, identifier, base_device_name
        );
        Ok(handle)
    }

    async fn unregister(&self, handle: HandleId) -> Result<(), EngineError> {
        let gate = self.unregister_gate.lock().await.as_ref().map(Arc::clone);
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(err) = self.unregister_failure.lock().await.take() {
            return Err(err);
        }

        let mut devices = self.devices.write().await;
        match devices.remove(&handle) {
            Some(registration) => {
                self.claims
                    .lock()
                    .await
                    .remove(&registration.base_device_name);
                debug!("engine: unregistered {:?}", handle);
                Ok(())
            }
            None => Err(EngineError::new(ENODEV, "unknown registration handle")),
        }
    }

    async fn read_statistics(&self, handle: HandleId) -> Result<StatsSnapshot, EngineError> {
        let counters = self.counters_for(handle).await?;
        Ok(counters.snapshot())
    }
}
