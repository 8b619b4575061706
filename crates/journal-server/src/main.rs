//! Journal server - authenticated journal entries over HTTP

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{Config, LogFormat, LoggingConfig};
use journal_api::{AppState, create_router, with_request_timeout};
use journal_auth::{
    Argon2Verifier, Authenticator, AuthenticatorSettings, JwtManager, TOKEN_EXPIRY_HOURS,
};
use journal_db::{Database, JournalStore};

/// Journal server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Env file read at start-up and on SIGHUP
    #[arg(short, long, default_value = ".env")]
    env_file: PathBuf,

    /// Bind address (overrides BIND_ADDRESS)
    #[arg(long)]
    bind: Option<String>,

    /// Port (overrides SERVER_PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.env_file)?;

    init_logging(&config.logging);

    info!("Starting journal server v{}", env!("CARGO_PKG_VERSION"));

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let db = Database::connect(&config.database).await?;
    let store: Arc<dyn JournalStore> = Arc::new(db);

    let jwt = Arc::new(JwtManager::new(&config.auth.jwt_secret, TOKEN_EXPIRY_HOURS));

    let auth = Authenticator::new(
        store.clone(),
        jwt.clone(),
        Arc::new(Argon2Verifier::new()),
        AuthenticatorSettings {
            admin_password: config.auth.admin_password.clone(),
            legacy_plaintext_upgrade: config.auth.legacy_plaintext_upgrade,
        },
    )?;
    if config.auth.legacy_plaintext_upgrade {
        info!("Legacy plaintext passwords will be upgraded on login");
    }

    #[cfg(unix)]
    spawn_reload_handler(args.env_file.clone(), jwt.clone())?;

    let state = AppState::new(store, jwt, Arc::new(auth), config.auth.cookie_secure);

    let app = with_request_timeout(
        create_router(state, Some(Arc::new(metrics_handle))),
        config.server.request_timeout,
    )
    .layer(TraceLayer::new_for_http());

    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", bind_addr, port))?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

/// Rotate the JWT signing secret whenever SIGHUP arrives
#[cfg(unix)]
fn spawn_reload_handler(env_file: PathBuf, jwt: Arc<JwtManager>) -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup()).context("Failed to install SIGHUP handler")?;

    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            let path = env_file.clone();
            match tokio::task::spawn_blocking(move || Config::load(&path)).await {
                Ok(Ok(config)) => {
                    jwt.rotate_secret(&config.auth.jwt_secret);
                    info!("Reloaded configuration from {}", env_file.display());
                }
                Ok(Err(e)) => error!("Configuration reload failed, keeping current secret: {:#}", e),
                Err(e) => error!("Configuration reload task failed: {}", e),
            }
        }
    });

    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for CTRL+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
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

    info!("Shutdown signal received");
}
