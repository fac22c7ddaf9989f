//! The `zeroshot serve` command: run the web interface.

use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use tokio::net::TcpListener;
use zeroshot_core::Config;

use crate::web::{self, AppState};

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Interface to bind (defaults to server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (defaults to server.port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Debug mode: debug logging and error details in responses
    #[arg(long)]
    pub debug: bool,
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.server.debug |= args.debug;

    // Load once up front; every request shares the same read-only model.
    let classifier = super::load_classifier(&config)?;
    let state = Arc::new(AppState::new(classifier, &config)?);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Serving {} on http://{}", config.interface.title, addr);
    web::serve(listener, state).await?;
    tracing::info!("Server shut down");

    Ok(())
}
