//! Device registry - the single source of truth for lifecycle and mode.
//!
//! Records live in one name-keyed map. A record is either active or in
//! teardown; a record in teardown is invisible to every command except
//! duplicate-delete detection, and only the teardown completion path may
//! remove it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::engine::HandleId;
use crate::error::{codes, ControlError};

/// Access policy enforced by the engine for a pass-through device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessMode {
    Full = 0,
    ReadOnly = 1,
    Blocked = 2,
}

impl AccessMode {
    /// Total mapping from the wire string; anything unmapped is rejected by
    /// the caller as an invalid argument.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "full" => Some(Self::Full),
            "read-only" => Some(Self::ReadOnly),
            "blocked" => Some(Self::Blocked),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::ReadOnly => "read-only",
            Self::Blocked => "blocked",
        }
    }
}

/// Lock-free cell holding the current access mode.
///
/// Stores and loads are single atomic operations, so the data path's
/// admission check observes either the old or the new mode, never a torn
/// value.
#[derive(Debug)]
struct ModeCell(AtomicU8);

impl ModeCell {
    fn new(mode: AccessMode) -> Self {
        Self(AtomicU8::new(mode as u8))
    }

    fn load(&self) -> AccessMode {
        match self.0.load(Ordering::Acquire) {
            0 => AccessMode::Full,
            1 => AccessMode::ReadOnly,
            _ => AccessMode::Blocked,
        }
    }

    fn store(&self, mode: AccessMode) {
        self.0.store(mode as u8, Ordering::Release);
    }
}

/// A pass-through device record.
#[derive(Debug)]
pub struct DeviceEntry {
    pub name: String,
    pub base_device_name: String,
    /// Immutable once assigned.
    pub identifier: Uuid,
    /// Engine registration handle for unregister/statistics calls.
    pub handle: HandleId,
    mode: ModeCell,
}

impl DeviceEntry {
    /// New devices start with full access.
    pub fn new(name: String, base_device_name: String, identifier: Uuid, handle: HandleId) -> Self {
        Self {
            name,
            base_device_name,
            identifier,
            handle,
            mode: ModeCell::new(AccessMode::Full),
        }
    }

    /// Current access mode.
    pub fn mode(&self) -> AccessMode {
        self.mode.load()
    }

    pub(crate) fn set_mode(&self, mode: AccessMode) {
        self.mode.store(mode);
    }
}

type TeardownResult = Result<(), ControlError>;

enum SlotState {
    Active,
    Deleting(broadcast::Sender<TeardownResult>),
}

struct DeviceSlot {
    entry: Arc<DeviceEntry>,
    state: SlotState,
}

/// Completion handle for an asynchronous delete.
///
/// Resolves exactly once, after the teardown task has finalized the
/// registry. Every delete issued against the same in-flight teardown gets a
/// ticket on the same channel.
pub struct DeleteTicket {
    rx: broadcast::Receiver<TeardownResult>,
}

impl DeleteTicket {
    /// Wait for the teardown outcome.
    pub async fn wait(mut self) -> TeardownResult {
        match self.rx.recv().await {
            Ok(outcome) => outcome,
            // The teardown task died without reporting. Should not happen;
            // surface it rather than hang the caller.
            Err(_) => Err(ControlError::EngineFailure {
                code: codes::INTERNAL_ERROR,
                message: "teardown completion channel closed".into(),
            }),
        }
    }
}

/// Result of initiating a teardown.
pub enum Teardown {
    /// This call started the teardown; the caller must drive the engine
    /// unregister and finish with [`DeviceRegistry::finish_teardown`].
    Started {
        entry: Arc<DeviceEntry>,
        ticket: DeleteTicket,
    },
    /// A previous delete is already in flight; the ticket resolves with it.
    InFlight(DeleteTicket),
    NotFound,
}

/// Name-keyed registry of pass-through devices.
#[derive(Default)]
pub struct DeviceRegistry {
    devices: RwLock<HashMap<String, DeviceSlot>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the name is taken, by an active or a deleting record.
    pub async fn contains(&self, name: &str) -> bool {
        self.devices.read().await.contains_key(name)
    }

    /// Insert a new record. Rejects duplicates without touching the
    /// existing record's state.
    pub async fn insert(&self, entry: DeviceEntry) -> Result<(), ControlError> {
        let mut devices = self.devices.write().await;
        if devices.contains_key(&entry.name) {
            return Err(ControlError::AlreadyExists);
        }
        devices.insert(
            entry.name.clone(),
            DeviceSlot {
                entry: Arc::new(entry),
                state: SlotState::Active,
            },
        );
        Ok(())
    }

    /// Look up an active record. Records in teardown are not returned.
    pub async fn find(&self, name: &str) -> Option<Arc<DeviceEntry>> {
        let devices = self.devices.read().await;
        devices.get(name).and_then(|slot| match &slot.state {
            SlotState::Active => Some(Arc::clone(&slot.entry)),
            SlotState::Deleting(_) => None,
        })
    }

    /// Atomically switch the mode of an active record.
    pub async fn update_mode(&self, name: &str, mode: AccessMode) -> Result<(), ControlError> {
        match self.find(name).await {
            Some(entry) => {
                entry.set_mode(mode);
                Ok(())
            }
            None => Err(ControlError::NotFound),
        }
    }

    /// Move a record into teardown. Exactly one caller gets `Started`;
    /// concurrent duplicates subscribe to the same completion.
    pub async fn begin_teardown(&self, name: &str) -> Teardown {
        let mut devices = self.devices.write().await;
        match devices.get_mut(name) {
            None => Teardown::NotFound,
            Some(slot) => match &slot.state {
                SlotState::Deleting(tx) => Teardown::InFlight(DeleteTicket {
                    rx: tx.subscribe(),
                }),
                SlotState::Active => {
                    let (tx, rx) = broadcast::channel(1);
                    slot.state = SlotState::Deleting(tx);
                    Teardown::Started {
                        entry: Arc::clone(&slot.entry),
                        ticket: DeleteTicket { rx },
                    }
                }
            },
        }
    }

    /// Finalize a teardown: remove the record on success, return it to
    /// active on failure, then resolve every ticket. This is the only path
    /// that removes a record.
    pub async fn finish_teardown(&self, name: &str, outcome: TeardownResult) {
        let mut devices = self.devices.write().await;
        let notifier = match devices.get_mut(name) {
            Some(slot) => {
                let tx = match &slot.state {
                    SlotState::Deleting(tx) => tx.clone(),
                    SlotState::Active => return,
                };
                if outcome.is_err() {
                    slot.state = SlotState::Active;
                }
                tx
            }
            None => return,
        };
        if outcome.is_ok() {
            devices.remove(name);
        }
        drop(devices);

        // Tickets may all have been dropped; that is fine.
        let _ = notifier.send(outcome);
    }

    /// Snapshot of all active records.
    pub async fn active_entries(&self) -> Vec<Arc<DeviceEntry>> {
        self.devices
            .read()
            .await
            .values()
            .filter_map(|slot| match &slot.state {
                SlotState::Active => Some(Arc::clone(&slot.entry)),
                SlotState::Deleting(_) => None,
            })
            .collect()
    }
}
