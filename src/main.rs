//! Figma MCP Server - Rust Implementation
//!
//! A Model Context Protocol (MCP) server for Figma integration.
//! Exposes file nodes, components, styles, page hierarchy and exports as tools.

use std::sync::Arc;

use clap::Parser;

use figma_mcp_server_rust::config::{env, Config};
use figma_mcp_server_rust::error::{ConfigError, FigmaMcpError, Result};
use figma_mcp_server_rust::figma::client::FigmaClient;
use figma_mcp_server_rust::mcp::server::McpServer;
use figma_mcp_server_rust::mcp::tools::ToolHandler;

/// Figma MCP Server
#[derive(Parser)]
#[command(name = "figma-mcp-server")]
#[command(author, version, about = "Figma MCP Server - A Model Context Protocol server for Figma")]
struct Cli {
    /// File key used when a tool call omits `file_key` (overrides FIGMA_FILE_KEY)
    #[arg(long)]
    file_key: Option<String>,

    /// Figma API base URL (overrides FIGMA_API_BASE_URL)
    #[arg(long)]
    api_base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(FigmaMcpError::Config(ConfigError::MissingEnvVar { var })) if var == env::API_KEY => {
            eprintln!("Error: {} environment variable is not set", env::API_KEY);
            std::process::exit(1);
        }
        Err(e) => return Err(e),
    };

    if let Some(file_key) = cli.file_key {
        config = config.with_default_file_key(file_key);
    }
    if let Some(api_base_url) = cli.api_base_url {
        config = config.with_api_base_url(api_base_url);
    }

    run_server(config).await
}

async fn run_server(config: Config) -> Result<()> {
    let figma_client = Arc::new(FigmaClient::new(&config)?);
    let tool_handler = ToolHandler::new(figma_client, config.default_file_key.clone());

    if config.default_file_key.is_none() {
        tracing::info!("No default file key set; tool calls must pass file_key");
    }

    let mut server = McpServer::new(tool_handler);
    tracing::info!("Figma MCP Server running on stdio");
    server.run_stdio().await?;

    Ok(())
}
