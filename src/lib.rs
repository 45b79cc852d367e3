//! Control plane for a pass-through virtual block device.
//!
//! A pass-through device relays I/O to an underlying base device while
//! enforcing a runtime-selectable access mode (full, read-only, blocked).
//! This crate implements the management side: the command protocol that
//! creates and deletes devices, switches their mode, and reports their
//! statistics. The data path itself lives behind the
//! [`engine::BlockDeviceEngine`] seam.
//!
//! Commands flow through [`command::CommandDispatcher`]: the handler for a
//! named command decodes its params, runs the
//! [`command::CommandExecutor`] against the [`registry::DeviceRegistry`],
//! and encodes a [`protocol::Response`]. Deletes complete asynchronously:
//! the executor returns a ticket immediately and a background task
//! finalizes the registry once the engine reports teardown done.

pub mod command;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod registry;

pub use command::{CommandDispatcher, CommandExecutor, HandlerContext};
pub use error::ControlError;
