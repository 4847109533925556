//! Local fake metadata service
//!
//! Run the exporter with
//! `--metadata-endpoint http://localhost:9092/latest/meta-data/`.

use clap::Parser;
use spot_termination_exporter::stub::{create_router, StubMetadata};
use std::net::SocketAddr;

#[derive(Parser)]
#[command(name = "metadata-stub")]
#[command(about = "Fake EC2 metadata service announcing a spot interruption")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value = "9092", env = "PORT")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Seconds until the announced interruption
    #[arg(long, default_value = "120")]
    lead_time: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;

    let metadata = StubMetadata {
        lead_time: chrono::Duration::seconds(cli.lead_time),
        ..StubMetadata::default()
    };

    tracing::info!("Starting metadata stub on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, create_router(metadata)).await?;

    Ok(())
}
