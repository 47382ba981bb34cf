//! rentdesk admin feed entry point.

mod alerts;
mod app;
mod commands;
mod config;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting rentdesk admin feed"
    );

    let config = config::Config::load()?;
    tracing::info!(base_url = %config.realtime.base_url, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(config))?;

    tracing::info!("admin feed shut down cleanly");
    Ok(())
}
