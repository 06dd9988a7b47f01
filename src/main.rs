use std::sync::Arc;

use stylebooth::{
    api::{self, AppState},
    config::AppConfig,
    errors::Result,
    orchestrator::Booth,
    util::{UploadStore, format_local, now_local},
};
use tracing::info;
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    let config = AppConfig::load()?;
    let booth = Booth::from_config(&config)?;
    let uploads = Arc::new(UploadStore::new(config.uploads.dir.clone()).await?);

    info!(
        target: "booth",
        uploads = %config.uploads.dir.display(),
        prefix = %config.uploads.prefix,
        "upload store ready"
    );

    let state = AppState::new(booth, uploads, &config.uploads);
    api::run_server(config.server.bind_addr, state).await?;

    info!(target: "booth", "stopped");
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_timer(LocalTimer)
        .init();

    info!("tracing initialized");
}

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = now_local();
        write!(w, "{}", format_local(&now, "%Y-%m-%d %H:%M:%S%:z"))
    }
}
