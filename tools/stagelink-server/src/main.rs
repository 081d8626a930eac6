//! Stagelink Server
//!
//! Standalone server wiring the board hub to its collaborators: the static
//! device table, the HTTP data sources, and a WebSocket fan-out for
//! supervisory panels.

mod http_source;
mod panel_ws;

use anyhow::{Context, Result};
use clap::Parser;
use stagelink_core::DeviceTable;
use stagelink_hub::{Hub, HubConfig};
use stagelink_transport::WebSocketServer;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use http_source::HttpDataSource;
use panel_ws::PanelBroadcaster;

#[derive(Parser)]
#[command(name = "stagelink-server")]
#[command(about = "Stagelink board hub and panel server")]
#[command(version)]
struct Cli {
    /// Board listen address
    #[arg(short, long, default_value = "0.0.0.0:8082")]
    listen: String,

    /// Supervisory panel listen address
    #[arg(short, long, default_value = "0.0.0.0:8083")]
    panel_listen: String,

    /// Device table JSON file
    #[arg(short, long, default_value = "devices.json")]
    table: PathBuf,

    /// Base URL of the lighting/fiber data API
    #[arg(short, long, default_value = "http://127.0.0.1:4000/api")]
    data_api: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting Stagelink Server");

    let raw = std::fs::read(&cli.table)
        .with_context(|| format!("reading device table {}", cli.table.display()))?;
    let table = Arc::new(DeviceTable::from_json(&raw).context("parsing device table")?);
    tracing::info!("Loaded {} boards from {}", table.len(), cli.table.display());

    let sources = Arc::new(HttpDataSource::new(cli.data_api.clone()));
    let panel = PanelBroadcaster::new(table.clone());

    let hub = Hub::new(HubConfig::default(), table, sources, panel.clone());

    let panel_server = WebSocketServer::bind(&cli.panel_listen).await?;
    tracing::info!("Boards on {}, panels on {}", cli.listen, cli.panel_listen);

    tokio::try_join!(
        async {
            hub.serve_websocket(&cli.listen)
                .await
                .map_err(anyhow::Error::from)
        },
        panel.serve(panel_server),
    )?;

    Ok(())
}
