// This is the entry point of the docs tool server.
//
// **Architecture Overview:**
// - `core/` = Business logic (range resolution, request building, pipeline)
// - `infra/` = Implementations of core traits (the Google Docs REST client)
// - `server/` = Tool schemas and call dispatch
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Serve newline-delimited JSON tool calls over stdin/stdout

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "server/server_layer.rs"]
mod server;

use anyhow::Context;
use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::core::docs::DocsService;
use crate::infra::google::{GoogleDocsApiClient, ServiceAccountAuth};
use crate::server::handler::{DocsToolHandler, ToolHandler};
use crate::server::tools::docs_tool_catalog;

/// One incoming tool call, one JSON object per line.
#[derive(Debug, Deserialize)]
struct ToolCall {
    tool: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Stdout carries protocol traffic, so all diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let auth = ServiceAccountAuth::from_env()
        .await
        .context("Failed to load service account credentials")?;
    let client = GoogleDocsApiClient::new(auth);
    let service = DocsService::new(client);
    let handler = DocsToolHandler::new(service);

    tracing::info!(
        tools = docs_tool_catalog().len(),
        "Docs tool server ready, reading calls from stdin"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<ToolCall>(line) {
            Ok(call) => match handler.handle_tool_call(&call.tool, &call.arguments).await {
                Ok(result) => json!({"ok": true, "result": result}),
                Err(error) => json!({"ok": false, "error": error}),
            },
            Err(e) => json!({"ok": false, "error": format!("Malformed tool call: {e}")}),
        };

        let mut payload = serde_json::to_string(&response)?;
        payload.push('\n');
        stdout.write_all(payload.as_bytes()).await?;
        stdout.flush().await?;
    }

    tracing::info!("Stdin closed, shutting down");
    Ok(())
}
