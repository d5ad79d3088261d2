use docverify::config::{Config, LogFormat};
use docverify::infrastructure::{FsContentStore, SqliteLedger};
use docverify::{server, AppState, IntegrityService, UploadPolicy};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    tracing::info!(
        db_path = %config.db_path.display(),
        blob_dir = %config.blob_dir.display(),
        environment = ?config.environment,
        "starting document verification service"
    );

    let ledger = Arc::new(SqliteLedger::new(&config.db_path)?);
    let content = Arc::new(FsContentStore::new(&config.blob_dir)?);
    let service = Arc::new(IntegrityService::new(ledger, content, UploadPolicy::default()));

    tracing::info!(
        "ledger initialized with {} documents",
        service.document_count()?
    );

    let state = AppState::new(service, config.environment);
    let (addr, server) = server::bind(config.bind_addr, state, server::shutdown_signal())?;

    tracing::info!(%addr, "server listening");
    server.await?;
    tracing::info!("server stopped");

    Ok(())
}
