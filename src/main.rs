//! Thread Relay server binary.

use std::sync::Arc;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use thread_relay::adapters::archive::FileArchiveStore;
use thread_relay::adapters::http::{relay_router, RelayAppState};
use thread_relay::adapters::websocket::SessionGateway;
use thread_relay::application::Archivist;
use thread_relay::config::{AppConfig, ServerConfig};
use thread_relay::domain::thread::{ThreadIdAllocator, ThreadRegistry};
use thread_relay::ports::ArchiveStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_telemetry(&config.server);

    let archive: Arc<dyn ArchiveStore> = Arc::new(FileArchiveStore::new(&config.archive.path));
    let (archivist, archive_worker) = Archivist::spawn(archive.clone());

    let registry = ThreadRegistry::new(ThreadIdAllocator::random(
        config.relay.id_allocation_attempts,
    ));
    let gateway = Arc::new(SessionGateway::new(
        registry,
        archivist.clone(),
        config.relay.instructor_display_name.clone(),
    ));

    let app = relay_router(RelayAppState { gateway, archive }, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        address = %addr,
        environment = ?config.server.environment,
        archive = %config.archive.path.display(),
        "Thread relay listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down, flushing archive");
    archivist.flush().await;
    drop(archivist);
    // Live sockets may still hold gateway handles; don't wait on them.
    archive_worker.abort();

    Ok(())
}

fn init_telemetry(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    if server.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_ansi(true))
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
