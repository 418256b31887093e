use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use case_admin::config::{AppConfig, CliArgs, LogFormat};
use case_admin::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so CASE_ADMIN_* overrides apply to local runs
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse();
    let (config, config_path) = AppConfig::load(&args)?;
    init_tracing(&config);
    info!("Loaded configuration ({})", config_path.display());

    let bind_addr = config.bind_addr();
    let state = AppState::init(config).await?;
    let db = state.db.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Case admin API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    info!("Shut down cleanly");
    Ok(())
}

/// `RUST_LOG` wins over `log.level`.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
