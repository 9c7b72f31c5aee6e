use anyhow::Result;
use clap::{Parser, ValueEnum};
use rmcp::{transport::sse_server::SseServer, transport::stdio, ServiceExt};
use std::net::SocketAddr;
use tracing::info;

use abaqus_automation::GuiConfig;
use abaqus_mcp_agent::server::AbaqusWrapper;
use abaqus_mcp_agent::utils::init_logging;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Abaqus MCP Server - drives a running Abaqus/CAE GUI session via Model Context Protocol"
)]
struct Args {
    /// Transport mode to use
    #[arg(short, long, value_enum, default_value = "stdio")]
    transport: TransportMode,

    /// Port to listen on (SSE transport only)
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Host to bind to (SSE transport only)
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Path to a JSON file overriding the built-in Abaqus GUI identifiers
    /// and delays (can also use ABAQUS_MCP_CONFIG env var)
    #[arg(long, env = "ABAQUS_MCP_CONFIG")]
    config: Option<std::path::PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum TransportMode {
    /// Standard I/O transport (default)
    Stdio,
    /// Server-Sent Events transport for web integrations
    Sse,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // never write to stdout during a panic, it corrupts the JSON-RPC stream
    std::panic::set_hook(Box::new(|panic_info| {
        if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            eprintln!("MCP Server Panic: {s}");
        } else {
            eprintln!("MCP Server Panic occurred");
        }
        if let Some(location) = panic_info.location() {
            eprintln!("Panic location: {}:{}", location.file(), location.line());
        }
    }));

    init_logging()?;

    info!("Abaqus MCP Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Transport mode: {:?}", args.transport);

    let gui_config = match &args.config {
        Some(path) => {
            info!("Loading GUI configuration from {}", path.display());
            GuiConfig::from_file(path)?
        }
        None => GuiConfig::default(),
    };

    match args.transport {
        TransportMode::Stdio => {
            info!("Starting stdio transport...");
            let wrapper = match AbaqusWrapper::with_config(gui_config) {
                Ok(w) => w,
                Err(e) => {
                    tracing::error!("Failed to initialize Abaqus wrapper: {}", e);
                    eprintln!("Fatal: Failed to initialize MCP server: {e}");
                    std::process::exit(1);
                }
            };

            let service = wrapper.serve(stdio()).await.inspect_err(|e| {
                tracing::error!("Serving error: {:?}", e);
                eprintln!("Fatal: stdio communication error: {e}");
                std::process::exit(1);
            })?;
            service.waiting().await?;
        }
        TransportMode::Sse => {
            let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
            info!("Starting SSE server on http://{}", addr);

            let wrapper = AbaqusWrapper::with_config(gui_config)
                .map_err(|e| anyhow::anyhow!("failed to initialize Abaqus wrapper: {e}"))?;
            let ct = SseServer::serve(addr)
                .await?
                .with_service(move || wrapper.clone());

            info!("SSE server running on http://{addr}");
            info!("  SSE endpoint: http://{addr}/sse");
            info!("  Message endpoint: http://{addr}/message");
            info!("Press Ctrl+C to stop");

            tokio::signal::ctrl_c().await?;
            ct.cancel();
            info!("Shutting down SSE server");
        }
    }

    Ok(())
}
