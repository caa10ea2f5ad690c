//! Main entry point for the ryt-api server

use anyhow::Context;
use clap::Parser;
use ryt_api::api;
use ryt_api::cli::{Args, VerbosityLevel};
use ryt_api::core::Service;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbosity_level());

    info!("Starting ryt-api with args: {:?}", args);

    let service = Arc::new(
        Service::from_options(args.service_options()).context("failed to build service")?,
    );
    let sweeper = service.spawn_sweeper();

    let addr = args.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(
        "Listening on {} ({:?} transfers, up to {} at once)",
        addr,
        args.transfer,
        service.options().max_concurrent
    );

    axum::serve(listener, api::router(Arc::clone(&service)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shutting down");
    service.shutdown().await;
    sweeper.await.context("retention sweeper panicked")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn init_logging(verbosity: VerbosityLevel) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(verbosity.log_directive()));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}
