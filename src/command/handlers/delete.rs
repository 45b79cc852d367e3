//! Delete command handler.

use serde_json::Value;

use super::HandlerContext;
use crate::protocol::{decode_params, DeleteParams, Response};

/// Handle `delete`: initiate teardown and hold the response open until the
/// engine's completion arrives.
pub async fn handle_delete(ctx: &HandlerContext, params: Value) -> Response {
    let params: DeleteParams = match decode_params(params) {
        Ok(p) => p,
        Err(e) => return Response::from_error(&e),
    };

    let ticket = match ctx.executor.delete(&params.name).await {
        Ok(ticket) => ticket,
        Err(e) => return Response::from_error(&e),
    };

    match ticket.wait().await {
        Ok(()) => Response::success(true),
        Err(e) => Response::from_error(&e),
    }
}
