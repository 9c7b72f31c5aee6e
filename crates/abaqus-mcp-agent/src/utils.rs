use anyhow::Result;
use rmcp::{schemars, schemars::JsonSchema};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use abaqus_automation::GuiAutomator;

/// Shared server state. The automator is behind a mutex because the GUI is a
/// single shared resource: two interleaved submissions would fight over the
/// same dialog.
#[derive(Clone)]
pub struct AbaqusWrapper {
    pub automator: Arc<Mutex<GuiAutomator>>,
    pub tool_router: rmcp::handler::server::tool::ToolRouter<Self>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteScriptArgs {
    #[schemars(
        description = "Complete Python script to run inside the Abaqus/CAE session. Must be valid Abaqus Scripting Interface code; it is written to a temporary .py file and submitted through the GUI."
    )]
    pub python_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct EmptyArgs {}

pub fn init_logging() -> Result<()> {
    use tracing_appender::rolling;

    let log_level = env::var("LOG_LEVEL")
        .map(|level| match level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            _ => Level::INFO,
        })
        .unwrap_or(Level::INFO);

    let log_dir = if let Ok(custom_dir) = env::var("ABAQUS_MCP_LOG_DIR") {
        std::path::PathBuf::from(custom_dir)
    } else {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("abaqus-mcp-agent")
            .join("logs")
    };
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        warn!("Failed to create log directory: {}", e);
    }
    let file_appender = rolling::daily(&log_dir, "abaqus-mcp-agent.log");

    // stdout carries the JSON-RPC stream, so logs go to stderr and a file
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env().add_directive(log_level.into())),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env().add_directive(log_level.into())),
        )
        .try_init()?;
    Ok(())
}
