//! Stdio control shim.
//!
//! Reads one JSON request per line (`{"method": ..., "params": {...}}`),
//! dispatches it, and writes one JSON response per line. Every CLI argument
//! names a base device to expose through the in-memory engine. Log output
//! goes to stderr so stdout stays a clean response stream.

use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use passthru_control::engine::InMemoryEngine;
use passthru_control::error::{codes, message_for};
use passthru_control::protocol::Response;
use passthru_control::{CommandDispatcher, CommandExecutor, HandlerContext};

#[derive(Debug, Deserialize)]
struct Request {
    method: String,
    #[serde(default)]
    params: Value,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let engine = Arc::new(InMemoryEngine::new());
    for base in std::env::args().skip(1) {
        engine.add_base_device(base.as_str()).await;
        info!("base device available: {}", base);
    }

    let executor = Arc::new(CommandExecutor::new(engine));
    let dispatcher = CommandDispatcher::new(HandlerContext { executor });
    info!("passthru control plane ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => dispatcher.dispatch(&request.method, request.params).await,
            Err(e) => {
                error!("unparseable request: {}", e);
                Response::error(codes::PARSE_ERROR, message_for(codes::PARSE_ERROR))
            }
        };

        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        stdout.write_all(&encoded).await?;
        stdout.flush().await?;
    }

    Ok(())
}
