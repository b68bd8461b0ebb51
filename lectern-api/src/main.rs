use crate::{config::Config, server::ServerState};
use lectern_db::client::{DbClient, DbError};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod server;

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Error preparing the database: {0}")]
    Database(#[from] DbError),
    #[error("Error installing signal handler: {0}")]
    Signal(std::io::Error),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "lectern_api=debug,\
                lectern_common=debug,\
                lectern_db=debug,\
                tower_http=debug,axum::rejection=trace,sqlx=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_config() -> Result<Config, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    Config::from_env().map_err(InitError::from)
}

/// Cancels `shutdown` on Ctrl-C or SIGTERM.
#[cfg(unix)]
fn spawn_shutdown_listener(shutdown: CancellationToken) -> Result<(), InitError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate()).map_err(InitError::Signal)?;
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Received Ctrl-C"),
            _ = terminate.recv() => info!("Received SIGTERM"),
        }
        shutdown.cancel();
    });

    Ok(())
}

#[cfg(not(unix))]
fn spawn_shutdown_listener(shutdown: CancellationToken) -> Result<(), InitError> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C");
        }
        shutdown.cancel();
    });

    Ok(())
}

/// Flushes the page cache on every SIGHUP until shutdown.
#[cfg(unix)]
fn spawn_cache_flusher(state: &ServerState, shutdown: CancellationToken) -> Result<(), InitError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup()).map_err(InitError::Signal)?;
    let page_cache = state.page_cache.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                received = hangup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    info!("Received SIGHUP");
                    page_cache.invalidate_all();
                }
            }
        }
    });

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let config = get_config()?;

    let db_client = DbClient::connect(&config.database_url).await?;
    db_client.migrate().await?;

    let state = ServerState::new(db_client, config.site_settings());

    let shutdown = CancellationToken::new();
    spawn_shutdown_listener(shutdown.clone())?;
    #[cfg(unix)]
    spawn_cache_flusher(&state, shutdown.clone())?;

    let tracing_layer = TraceLayer::new_for_http();
    let app = server::routes().layer(tracing_layer).with_state(state);

    let server_address = config.socket_address();
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(InitError::TcpServe)?;

    info!("Server shut down");
    Ok(())
}
