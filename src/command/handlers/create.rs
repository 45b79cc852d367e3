//! Create command handler.

use serde_json::Value;

use super::HandlerContext;
use crate::protocol::{decode_params, CreateParams, Response};

/// Handle `create`: construct a pass-through device over a base device.
/// Success carries the created device's name.
pub async fn handle_create(ctx: &HandlerContext, params: Value) -> Response {
    let params: CreateParams = match decode_params(params) {
        Ok(p) => p,
        Err(e) => return Response::from_error(&e),
    };

    match ctx.executor.create(params).await {
        Ok(name) => Response::success(name),
        Err(e) => Response::from_error(&e),
    }
}
