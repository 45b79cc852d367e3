//! Command execution infrastructure for the control plane.
//!
//! This module handles:
//! - Decoding and validating incoming commands
//! - Executing them against the device registry
//! - Encoding success and error responses
//! - Dispatching named commands to their handlers

mod dispatcher;
mod executor;
pub mod handlers;

pub use dispatcher::CommandDispatcher;
pub use executor::CommandExecutor;
pub use handlers::HandlerContext;
