//! Command dispatcher - binds named commands to their handler pipelines.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::warn;

use super::handlers::{self, HandlerContext};
use crate::error::{codes, message_for};
use crate::protocol::Response;

type HandlerFn = Box<dyn Fn(Arc<HandlerContext>, Value) -> BoxFuture<'static, Response> + Send + Sync>;

macro_rules! handler {
    ($f:path) => {{
        let handler: HandlerFn = Box::new(|ctx: Arc<HandlerContext>, params: Value| {
            Box::pin(async move { $f(&ctx, params).await })
        });
        handler
    }};
}

/// Routes named commands to their decode -> execute -> encode pipelines.
///
/// The table is built once at startup and read-only afterwards; dispatch is
/// a single map lookup.
pub struct CommandDispatcher {
    ctx: Arc<HandlerContext>,
    table: HashMap<&'static str, HandlerFn>,
}

impl CommandDispatcher {
    pub fn new(ctx: HandlerContext) -> Self {
        let mut table: HashMap<&'static str, HandlerFn> = HashMap::new();
        table.insert("create", handler!(handlers::handle_create));
        table.insert("delete", handler!(handlers::handle_delete));
        table.insert("set-mode", handler!(handlers::handle_set_mode));
        table.insert("get-statistics", handler!(handlers::handle_get_statistics));
        table.insert("list-devices", handler!(handlers::handle_list_devices));

        Self {
            ctx: Arc::new(ctx),
            table,
        }
    }

    /// Dispatch a command by name.
    ///
    /// An unknown name is a boundary error; it never enters the executor's
    /// error taxonomy.
    pub async fn dispatch(&self, method: &str, params: Value) -> Response {
        match self.table.get(method) {
            Some(handler) => handler(Arc::clone(&self.ctx), params).await,
            None => {
                warn!("unknown command: {}", method);
                Response::error(codes::METHOD_NOT_FOUND, message_for(codes::METHOD_NOT_FOUND))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandExecutor;
    use crate::engine::InMemoryEngine;
    use serde_json::json;

    async fn dispatcher() -> CommandDispatcher {
        let engine = Arc::new(InMemoryEngine::new());
        engine.add_base_device("base0").await;
        let executor = Arc::new(CommandExecutor::new(engine));
        CommandDispatcher::new(HandlerContext { executor })
    }

    fn error_code(response: &Response) -> i32 {
        response.error.as_ref().expect("expected error body").code
    }

    #[tokio::test]
    async fn test_unknown_command_is_boundary_error() {
        let dispatcher = dispatcher().await;
        let response = dispatcher.dispatch("explode", json!({})).await;
        assert_eq!(error_code(&response), codes::METHOD_NOT_FOUND);
        assert_eq!(
            response.error.unwrap().message,
            message_for(codes::METHOD_NOT_FOUND)
        );
    }

    #[tokio::test]
    async fn test_malformed_params_rejected_without_state_change() {
        let dispatcher = dispatcher().await;
        let response = dispatcher
            .dispatch("create", json!({ "name": "pt0" }))
            .await;
        assert_eq!(error_code(&response), codes::MALFORMED_REQUEST);

        // Nothing was created on the way.
        let response = dispatcher.dispatch("list-devices", json!({})).await;
        assert_eq!(response.result, Some(json!([])));
    }

    #[tokio::test]
    async fn test_full_lifecycle_scenario() {
        let dispatcher = dispatcher().await;

        let response = dispatcher
            .dispatch(
                "create",
                json!({ "base_device_name": "base0", "name": "pt0" }),
            )
            .await;
        assert_eq!(response.result, Some(json!("pt0")));

        let response = dispatcher
            .dispatch("set-mode", json!({ "name": "pt0", "mode": "read-only" }))
            .await;
        assert_eq!(response.result, Some(json!(true)));

        let response = dispatcher
            .dispatch("get-statistics", json!({ "name": "pt0" }))
            .await;
        let stats = response.result.expect("expected statistics");
        assert_eq!(stats["name"], json!("pt0"));
        assert_eq!(stats["mode"], json!("read-only"));
        assert_eq!(stats["read_request_count"], json!(0));

        let response = dispatcher.dispatch("delete", json!({ "name": "pt0" })).await;
        assert_eq!(response.result, Some(json!(true)));

        let response = dispatcher
            .dispatch("get-statistics", json!({ "name": "pt0" }))
            .await;
        assert_eq!(error_code(&response), codes::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_set_mode_rejects_unrecognized_mode() {
        let dispatcher = dispatcher().await;
        dispatcher
            .dispatch(
                "create",
                json!({ "base_device_name": "base0", "name": "pt0" }),
            )
            .await;

        let response = dispatcher
            .dispatch("set-mode", json!({ "name": "pt0", "mode": "invisible" }))
            .await;
        assert_eq!(error_code(&response), codes::INVALID_ARGUMENT);
        assert_eq!(
            response.error.unwrap().message,
            message_for(codes::INVALID_ARGUMENT)
        );
    }

    #[tokio::test]
    async fn test_list_devices_reports_active_records() {
        let dispatcher = dispatcher().await;
        dispatcher
            .dispatch(
                "create",
                json!({
                    "base_device_name": "base0",
                    "name": "pt0",
                    "identifier": "7e25812e-c8c0-4d3f-8599-16d790555b85",
                }),
            )
            .await;

        let response = dispatcher.dispatch("list-devices", json!({})).await;
        let devices = response.result.expect("expected device list");
        assert_eq!(
            devices,
            json!([{
                "name": "pt0",
                "base_device_name": "base0",
                "identifier": "7e25812e-c8c0-4d3f-8599-16d790555b85",
                "mode": "full",
            }])
        );
    }

    #[tokio::test]
    async fn test_create_error_uses_engine_message_verbatim() {
        let dispatcher = dispatcher().await;
        let response = dispatcher
            .dispatch(
                "create",
                json!({ "base_device_name": "ghost", "name": "pt0" }),
            )
            .await;
        let error = response.error.expect("expected error body");
        assert_eq!(error.code, -19);
        assert_eq!(error.message, "base device ghost not found");
    }
}
