//! Spot Termination Exporter entry point

use clap::Parser;
use spot_termination_exporter::config::{Cli, ExporterConfig};
use spot_termination_exporter::handler::{create_router, AppState};
use spot_termination_exporter::{telemetry, ExporterError, ExporterRegistry, TerminationCollector};
use std::future::IntoFuture;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ExporterConfig::try_from(Cli::parse())?;
    telemetry::init(&config.log)?;

    tracing::info!("Starting spot-termination-exporter");

    tracing::debug!(
        metadata_endpoint = %config.collector.metadata_endpoint,
        "registering term exporter"
    );
    let collector = TerminationCollector::new(config.collector.clone())?;
    let registry = ExporterRegistry::new(collector)?;

    let state = Arc::new(AppState::new(registry, config.metrics_path.clone()));
    let router = create_router(state);

    tracing::info!("Starting metric http endpoint on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|source| ExporterError::Bind {
            addr: config.bind_addr.clone(),
            source,
        })?;

    tokio::select! {
        served = axum::serve(listener, router).into_future() => {
            served.map_err(ExporterError::Serve)?;
        }
        signal = shutdown_signal() => {
            tracing::info!(signal, "Caught {} signal, exiting", signal);
        }
    }

    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let streams = (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
        signal(SignalKind::quit()),
    );

    match streams {
        (Ok(mut interrupt), Ok(mut terminate), Ok(mut quit)) => tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
            _ = quit.recv() => "SIGQUIT",
        },
        _ => {
            tracing::warn!("Failed to install signal handlers, falling back to Ctrl-C");
            ctrl_c().await
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    "interrupt"
}
