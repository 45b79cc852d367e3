//! Set-mode command handler.

use serde_json::Value;

use super::HandlerContext;
use crate::protocol::{decode_params, Response, SetModeParams};

/// Handle `set-mode`: switch a device's access policy.
pub async fn handle_set_mode(ctx: &HandlerContext, params: Value) -> Response {
    let params: SetModeParams = match decode_params(params) {
        Ok(p) => p,
        Err(e) => return Response::from_error(&e),
    };

    match ctx.executor.set_mode(&params.name, &params.mode).await {
        Ok(()) => Response::success(true),
        Err(e) => Response::from_error(&e),
    }
}
