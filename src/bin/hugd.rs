//! hugd: Huginn daemon.
//!
//! Serves cached upstream responses on the client listener and the
//! maintenance API on the admin listener.

use std::future::IntoFuture;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use huginn::server::config::Config;
use huginn::server::{admin_router, build_proxy, client_router};

/// Huginn daemon: SLA-bounded caching proxy.
#[derive(Parser)]
#[command(name = "hugd")]
#[command(version = huginn::PKG_VERSION)]
#[command(about = "Huginn caching proxy daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load(args.config.as_deref())?;

    let default_level = if config.server.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    info!(
        version = huginn::version_string(),
        address = %config.server.address,
        control_address = %config.server.control_address,
        "hugd starting"
    );

    let proxy = Arc::new(build_proxy(&config)?);

    let client = client_router(Arc::clone(&proxy), &config.upstream.url)?;
    let admin = admin_router(Arc::clone(&proxy));

    let client_listener = TcpListener::bind(&config.server.address).await?;
    let admin_listener = TcpListener::bind(&config.server.control_address).await?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let client_server = axum::serve(client_listener, client)
        .with_graceful_shutdown(wait_for(shutdown_rx.clone()));
    let admin_server =
        axum::serve(admin_listener, admin).with_graceful_shutdown(wait_for(shutdown_rx));

    tokio::try_join!(client_server.into_future(), admin_server.into_future())?;

    info!("hugd stopped");
    Ok(())
}

async fn wait_for(mut shutdown: tokio::sync::watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
