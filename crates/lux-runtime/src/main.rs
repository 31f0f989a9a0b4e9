//! Lux runtime: voice-driven cue playback host.

use std::sync::Arc;

use lux_core::clock::SystemClock;
use lux_core::store::KeyValueStore;
use lux_core::voice::VoiceSource;
use lux_runtime::config::{RuntimeConfig, StoreBackend, VoiceInput};
use lux_runtime::context::LuxContext;
use lux_runtime::error::AppError;
use lux_store::file_store::FileKeyValueStore;
use lux_store::pg_store::PgKeyValueStore;
use lux_voice::source::LineVoiceSource;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    info!("Starting Lux runtime");

    // Read configuration from environment.
    let config = RuntimeConfig::from_env()?;

    // Build application context.
    let store = build_store(&config.store).await?;
    let context = LuxContext::init(store, Arc::new(SystemClock), &config.storage_key).await?;

    // Start voice input.
    let source: Option<Arc<dyn VoiceSource>> = match config.voice {
        VoiceInput::Stdin => Some(Arc::new(LineVoiceSource::stdin())),
        VoiceInput::Off => None,
    };
    let mut listener = context.listen(source).await;
    info!(
        voice_active = listener.is_active(),
        "Lux runtime ready; press Ctrl-C to stop"
    );

    // Running sequences outlive the end of voice input, so only a signal stops the host.
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    context.shutdown(&mut listener).await?;
    Ok(())
}

async fn build_store(backend: &StoreBackend) -> Result<Arc<dyn KeyValueStore>, AppError> {
    match backend {
        StoreBackend::File(path) => {
            info!(path = %path.display(), "Using file store");
            Ok(Arc::new(FileKeyValueStore::new(path.clone())))
        }
        StoreBackend::Postgres { database_url } => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            info!("Connected to database");
            let store = PgKeyValueStore::new(pool);
            store.ensure_schema().await?;
            Ok(Arc::new(store))
        }
    }
}
