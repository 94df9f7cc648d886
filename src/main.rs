//! Service Graph - Binary Entry Point
//!
//! Serves rendered graphs over HTTP and streams snapshots over WebSocket.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use service_graph::api::{create_router, AppState};
use service_graph::{PrometheusSource, ServiceGraphConfig};

#[derive(Parser, Debug)]
#[command(name = "servicegraph")]
#[command(about = "Service graph rendering and live streaming")]
struct Args {
    /// Address to bind to for serving
    #[arg(long, env = "SERVICEGRAPH_BIND_ADDR", default_value = "0.0.0.0:8088")]
    bind_addr: String,

    /// Address of the Prometheus instance for graph generation
    #[arg(long, env = "SERVICEGRAPH_PROMETHEUS_ADDR", default_value = "http://localhost:9090")]
    prometheus_addr: String,

    /// JSON configuration file; flags below override its values
    #[arg(long, env = "SERVICEGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Multiplier applied to raw metric values
    #[arg(long)]
    scale_factor: Option<f64>,

    /// Node treated as the traffic entry point
    #[arg(long)]
    ingress_node: Option<String>,

    /// Name of the regional node in the nested schema
    #[arg(long)]
    region_name: Option<String>,

    /// Streaming interval in milliseconds
    #[arg(long)]
    publish_interval_ms: Option<u64>,
}

impl Args {
    fn load_config(&self) -> anyhow::Result<ServiceGraphConfig> {
        let mut config = match &self.config {
            Some(path) => ServiceGraphConfig::from_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => ServiceGraphConfig::default(),
        };
        if let Some(scale) = self.scale_factor {
            config.scale_factor = scale;
        }
        if let Some(node) = &self.ingress_node {
            config.ingress_node = node.clone();
        }
        if let Some(region) = &self.region_name {
            config.region_name = region.clone();
        }
        if let Some(ms) = self.publish_interval_ms {
            config.publish_interval = Duration::from_millis(ms);
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("service_graph=info,servicegraph=info")),
        )
        .init();

    let args = Args::parse();
    let config = args.load_config()?;

    let source = PrometheusSource::new(args.prometheus_addr.as_str())?;
    let state = Arc::new(AppState::new(Arc::new(source), config));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&args.bind_addr)
        .await
        .with_context(|| format!("binding {}", args.bind_addr))?;
    info!(addr = %args.bind_addr, prometheus = %args.prometheus_addr, "starting servicegraph service");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
