mod cli;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use burrow_core::LinkStore;
use burrow_gateway::{App, AppState};
use burrow_shortener::{ShortenerService, ShortenerSettings};
use burrow_storage::{InMemoryLinkStore, PostgresLinkStore, StorageError};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{LogFormatArg, StorageBackendArg, CLI};

const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.log_format);

    info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        storage_backend = %config.storage,
        "starting gateway server"
    );

    let settings = ShortenerSettings::builder()
        .max_attempts(config.max_attempts)
        .max_rounds(config.max_rounds)
        .operation_timeout(config.operation_timeout())
        .build();

    match config.storage {
        StorageBackendArg::InMemory => {
            info!("using in-memory link store, links are lost on shutdown");
            serve(&config, InMemoryLinkStore::new(), settings).await?;
        }
        StorageBackendArg::Postgres => {
            let dsn = config
                .postgres_dsn
                .as_deref()
                .context("postgres dsn is required when storage backend is postgres")?;
            let store = connect_with_retry(&config, dsn).await?;
            store.migrate().await.context("failed to apply migrations")?;
            info!("connected to postgres");

            close_after(serve(&config, store.clone(), settings), store.close()).await?;
        }
    }

    info!("gateway stopped");
    Ok(())
}

fn init_tracing(format: LogFormatArg) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormatArg::Text => builder.init(),
        LogFormatArg::Json => builder.json().init(),
    }
}

async fn connect_with_retry(config: &CLI, dsn: &str) -> Result<PostgresLinkStore, StorageError> {
    let attempts = config.postgres_connect_attempts.max(1);
    let mut attempt = 1;

    loop {
        let options = PgPoolOptions::new()
            .max_connections(config.postgres_max_connections)
            .acquire_timeout(config.operation_timeout());

        match PostgresLinkStore::connect_with(options, dsn).await {
            Ok(store) => return Ok(store),
            Err(err) if attempt < attempts => {
                warn!(attempt, attempts, error = %err, "postgres not reachable, retrying");
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn serve<S: LinkStore>(
    config: &CLI,
    store: S,
    settings: ShortenerSettings,
) -> anyhow::Result<()> {
    let shortener = ShortenerService::with_settings(store, settings);
    let router = App::router(AppState::new(Arc::new(shortener), config.base_url.clone()));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    let local_addr: SocketAddr = listener.local_addr()?;
    info!(listen_addr = %local_addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")
}

/// Awaits `work`, then `cleanup`, whatever `work` returned.
async fn close_after<T, E>(
    work: impl Future<Output = Result<T, E>>,
    cleanup: impl Future<Output = ()>,
) -> Result<T, E> {
    let result = work.await;
    cleanup.await;
    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
