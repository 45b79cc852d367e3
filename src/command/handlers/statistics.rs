//! Statistics command handler.

use serde_json::Value;

use super::HandlerContext;
use crate::protocol::{decode_params, GetStatisticsParams, Response};

/// Handle `get-statistics`: read-only snapshot of a device's counters.
pub async fn handle_get_statistics(ctx: &HandlerContext, params: Value) -> Response {
    let params: GetStatisticsParams = match decode_params(params) {
        Ok(p) => p,
        Err(e) => return Response::from_error(&e),
    };

    match ctx.executor.get_statistics(&params.name).await {
        Ok(report) => Response::success(report),
        Err(e) => Response::from_error(&e),
    }
}
