use anyhow::Context;
use clap::Parser;
use floodguard::{
    api::{build_router, AppState},
    config::Config,
    logging::init_tracing,
    ml::ModelHandle,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "floodguard", version)]
#[command(about = "Flood-risk scoring server", long_about = None)]
struct Args {
    /// Override the bind host
    #[arg(long, env = "FLOODGUARD_HOST")]
    host: Option<String>,

    /// Override the bind port
    #[arg(short, long, env = "FLOODGUARD_PORT")]
    port: Option<u16>,

    /// Override the model artifact path
    #[arg(short, long)]
    model: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(model) = args.model {
        config.paths.model = model;
    }

    init_tracing(&config.observability)?;
    tracing::info!("Starting FloodGuard v{}", env!("CARGO_PKG_VERSION"));

    // Serve without a model until one is trained and reloaded
    let handle = Arc::new(ModelHandle::open(config.paths.model.clone())?);
    if handle.is_loaded() {
        tracing::info!("✅ Model loaded from {}", config.paths.model.display());
    } else {
        tracing::warn!(
            "⚠️  No model at {}; prediction endpoints return 503 until POST /v1/model/reload",
            config.paths.model.display()
        );
    }

    let state = AppState::new(handle).with_alert_threshold(config.server.alert_threshold);
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("🚀 HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
