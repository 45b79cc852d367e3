//! List-devices command handler.

use serde_json::Value;

use super::HandlerContext;
use crate::error::ControlError;
use crate::protocol::Response;

/// Handle `list-devices`: enumerate the active pass-through devices.
/// Takes no parameters; an empty object (or none) is expected.
pub async fn handle_list_devices(ctx: &HandlerContext, params: Value) -> Response {
    if !params.is_null() && params.as_object().map_or(true, |o| !o.is_empty()) {
        return Response::from_error(&ControlError::MalformedRequest);
    }

    Response::success(ctx.executor.list_devices().await)
}
