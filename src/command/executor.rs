//! Command executor - applies control commands to the device registry.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::engine::{BlockDeviceEngine, EngineError};
use crate::error::ControlError;
use crate::protocol::{CreateParams, DeviceInfo, StatisticsReport};
use crate::registry::{AccessMode, DeleteTicket, DeviceEntry, DeviceRegistry, Teardown};

impl From<EngineError> for ControlError {
    fn from(e: EngineError) -> Self {
        ControlError::EngineFailure {
            code: e.code,
            message: e.message,
        }
    }
}

/// Executes the control commands against the device registry and the
/// engine. All mutating commands for a device funnel through one executor,
/// which is the sequencing point the registry's atomicity relies on.
pub struct CommandExecutor {
    registry: Arc<DeviceRegistry>,
    engine: Arc<dyn BlockDeviceEngine>,
}

impl CommandExecutor {
    pub fn new(engine: Arc<dyn BlockDeviceEngine>) -> Self {
        Self {
            registry: Arc::new(DeviceRegistry::new()),
            engine,
        }
    }

    /// Create a pass-through device over a base device.
    ///
    /// The engine registration must succeed before the record becomes
    /// visible. Any failure after a successful registration rolls the
    /// registration back, so no partial record ever remains.
    pub async fn create(&self, params: CreateParams) -> Result<String, ControlError> {
        if self.registry.contains(&params.name).await {
            error!("passthru device {} already exists", params.name);
            return Err(ControlError::AlreadyExists);
        }

        let identifier = params.identifier.unwrap_or_else(Uuid::new_v4);
        let handle = self
            .engine
            .register(&params.base_device_name, &params.name, identifier)
            .await?;

        let entry = DeviceEntry::new(
            params.name.clone(),
            params.base_device_name.clone(),
            identifier,
            handle,
        );
        if let Err(e) = self.registry.insert(entry).await {
            // Lost the name while registering; undo the engine side before
            // surfacing the error.
            if let Err(undo) = self.engine.unregister(handle).await {
                error!(
                    "rollback unregister of {} failed: {}",
                    params.name, undo
                );
            }
            return Err(e);
        }

        info!(
            "created passthru device {} over {}",
            params.name, params.base_device_name
        );
        Ok(params.name)
    }

    /// Initiate teardown of a device.
    ///
    /// Returns a ticket immediately; the engine unregister runs on a
    /// separate task, and that task is the only path that removes the
    /// record and resolves tickets. A delete issued while a teardown is
    /// already in flight gets a ticket on the same completion.
    pub async fn delete(&self, name: &str) -> Result<DeleteTicket, ControlError> {
        match self.registry.begin_teardown(name).await {
            Teardown::NotFound => {
                error!("passthru device {} does not exist", name);
                Err(ControlError::NotFound)
            }
            Teardown::InFlight(ticket) => Ok(ticket),
            Teardown::Started { entry, ticket } => {
                let registry = Arc::clone(&self.registry);
                let engine = Arc::clone(&self.engine);
                tokio::spawn(async move {
                    let outcome = engine
                        .unregister(entry.handle)
                        .await
                        .map_err(ControlError::from);
                    match &outcome {
                        Ok(()) => info!("passthru device {} deleted", entry.name),
                        Err(e) => error!("teardown of {} failed: {}", entry.name, e),
                    }
                    registry.finish_teardown(&entry.name, outcome).await;
                });
                Ok(ticket)
            }
        }
    }

    /// Switch the access mode of a device.
    ///
    /// The mode string is mapped through a total table before any lookup;
    /// the store itself is atomic, so concurrent admission checks observe
    /// either the old or the new mode. Setting the current mode again is an
    /// idempotent success.
    pub async fn set_mode(&self, name: &str, mode: &str) -> Result<(), ControlError> {
        let mode = match AccessMode::parse(mode) {
            Some(mode) => mode,
            None => {
                error!("invalid mode {:?} for passthru device {}", mode, name);
                return Err(ControlError::InvalidArgument);
            }
        };
        self.registry.update_mode(name, mode).await?;
        info!("passthru device {} mode set to {}", name, mode.as_str());
        Ok(())
    }

    /// Read a device's statistics snapshot. Pure read; no state changes.
    pub async fn get_statistics(&self, name: &str) -> Result<StatisticsReport, ControlError> {
        let entry = self
            .registry
            .find(name)
            .await
            .ok_or(ControlError::NotFound)?;
        let statistics = self.engine.read_statistics(entry.handle).await?;
        Ok(StatisticsReport {
            name: entry.name.clone(),
            base_device_name: entry.base_device_name.clone(),
            identifier: entry.identifier,
            mode: entry.mode(),
            statistics,
        })
    }

    /// Enumerate the active devices.
    pub async fn list_devices(&self) -> Vec<DeviceInfo> {
        self.registry
            .active_entries()
            .await
            .into_iter()
            .map(|entry| DeviceInfo {
                name: entry.name.clone(),
                base_device_name: entry.base_device_name.clone(),
                identifier: entry.identifier,
                mode: entry.mode(),
            })
            .collect()
    }
}
