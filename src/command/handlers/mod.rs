//! Command handlers, one per command.
//!
//! Each handler runs the full pipeline for its command: decode the params
//! object, execute against the registry, encode the response.

mod create;
mod delete;
mod list;
mod set_mode;
mod statistics;

pub use create::handle_create;
pub use delete::handle_delete;
pub use list::handle_list_devices;
pub use set_mode::handle_set_mode;
pub use statistics::handle_get_statistics;

use std::sync::Arc;

use crate::command::CommandExecutor;

/// Context passed to command handlers.
#[derive(Clone)]
pub struct HandlerContext {
    pub executor: Arc<CommandExecutor>,
}
