use anhl_filesystem::{Environment, FilesystemFacade};
use anhl_server::{AppState, ServerConfig, router};
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "anhl.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    info!("starting anhl server");
    let config_path =
        std::env::var("ANHL_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    info!(path = %config_path, "loading server config");
    let config = ServerConfig::load_or_default(&config_path)
        .with_context(|| format!("failed to load server config from {config_path}"))?;

    let fs = FilesystemFacade::detect(Environment::host(config.allowed_roots.clone()));
    let report = fs.check_file_system_support();
    info!(
        backend = %fs.backend(),
        supported = report.supported,
        roots = config.allowed_roots.len(),
        "filesystem ready"
    );

    let app = router(AppState::new(fs, config.search.clone()));
    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    let addr = listener
        .local_addr()
        .context("failed to read bound address")?;
    info!(%addr, "server is ready, press Ctrl+C to shut down");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;

    info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received, stopping server");
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}
