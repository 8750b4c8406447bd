//! Document ingestion and query HTTP server.
//!
//! Assembles the vector-store client, embedder client, and source-status
//! broker once at startup into [`docaudit_server::AppState`], then serves
//! the `/api` surface (`routes::router`) over axum until ctrl-c.

use anyhow::Result;

use docaudit_server::{AppState, Cli, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    let config = Config::load(&cli)?;

    let state = AppState::new(&config).await?;
    let router = docaudit_server::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "docaudit-server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.unwrap();
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}

/// Builds the default log level from `--verbose`, but an explicit `RUST_LOG`
/// always wins.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
