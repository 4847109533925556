//! Spot Termination Exporter
//!
//! Prometheus exporter answering, on every scrape, whether this EC2 instance
//! is scheduled to be reclaimed and how soon. Spot interruption and rebalance
//! notices are read live from the instance metadata service.
//!
//! # Design Principles
//! - Stateless: every scrape re-probes the metadata service
//! - Bounded: one GET per endpoint, 1 second timeout, no retries
//! - Absence is the signal: probe failures drop samples, never the process

pub mod collector;
pub mod config;
pub mod error;
pub mod handler;
pub mod prober;
pub mod spotinst;
pub mod stub;
pub mod telemetry;

// Re-export contracts
#[path = "../contracts/mod.rs"]
pub mod contracts;

pub use contracts::*;

pub use collector::{ExporterRegistry, TerminationCollector};
pub use config::{CollectorConfig, ExporterConfig, IdentityPolicy};
pub use error::{ExporterError, Result};
pub use prober::{MetadataProber, ProbeOutcome};
