use anyhow::Context;
use backend_lib::{
    config::{Settings, StorageBackend, DEFAULT_CONFIG_FILE},
    create_router,
    storage::{InMemoryDirectory, PgDirectory, UserDirectory},
    AppState,
};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::time::{interval, Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// User-management REST service
#[derive(Debug, Parser)]
#[command(name = "usergate", version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Override the configured listen address
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let mut settings = Settings::load_from(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;
    if let Some(bind) = args.bind {
        settings.bind_addr = bind;
    }

    init_tracing(&settings);

    match settings.storage.backend {
        StorageBackend::Postgres => {
            let directory = PgDirectory::connect(&settings.storage)
                .await
                .context("connecting to postgres")?;
            serve(directory, settings).await
        }
        StorageBackend::Memory => {
            tracing::warn!("using the in-memory directory; users are lost on restart");
            serve(InMemoryDirectory::new(), settings).await
        }
    }
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.as_str()));

    tracing_subscriber::registry()
        .with(filter)
        .with(settings.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!settings.log_json).then(tracing_subscriber::fmt::layer))
        .init();
}

async fn serve<D: UserDirectory>(directory: D, settings: Settings) -> anyhow::Result<()> {
    let addr = settings.bind_addr;
    let cleanup_every = Duration::from_secs(settings.rate_limit.cleanup_interval_secs.max(1));

    let state = Arc::new(AppState::new(directory, &settings)?);

    // Drop rate-limit windows that have already expired
    let limiter = state.rate_limiter.clone();
    let clock = state.clock.clone();
    tokio::spawn(async move {
        let mut interval = interval(cleanup_every);
        loop {
            interval.tick().await;
            let removed = limiter.cleanup(clock.now());
            tracing::debug!(removed, "rate limiter cleanup");
        }
    });

    let app = create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
