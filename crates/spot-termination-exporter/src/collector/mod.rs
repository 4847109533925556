//! Termination collector
//!
//! Runs the probe sequence once per scrape and turns the result into the
//! fixed gauge vocabulary in [`descriptors`].

mod descriptors;
mod registry;

pub use descriptors::*;
pub use registry::ExporterRegistry;

use chrono::Utc;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use tokio::runtime::{Handle, RuntimeFlavor};

use crate::config::{CollectorConfig, IdentityPolicy};
use crate::contracts::*;
use crate::error::Result;
use crate::prober::{MetadataProber, ProbeOutcome};
use crate::spotinst::SpotinstClient;

/// Collector for spot interruption and rebalance notices
///
/// Holds configuration and HTTP clients only; every scrape starts from
/// scratch.
pub struct TerminationCollector {
    prober: MetadataProber,
    spotinst: Option<SpotinstClient>,
    instance_type_label: bool,
    identity_policy: IdentityPolicy,
    descriptors: MetricDescriptors,
}

impl TerminationCollector {
    pub fn new(config: CollectorConfig) -> Result<Self> {
        let prober = MetadataProber::with_timeout(&config.metadata_endpoint, config.probe_timeout)?;
        let spotinst = config
            .spotinst
            .map(|spotinst| SpotinstClient::with_timeout(spotinst, config.probe_timeout))
            .transpose()?;
        let descriptors = MetricDescriptors::new(config.instance_type_label, spotinst.is_some())?;

        Ok(Self {
            prober,
            spotinst,
            instance_type_label: config.instance_type_label,
            identity_policy: config.identity_policy,
            descriptors,
        })
    }

    /// Probe the metadata service and render the samples for this scrape
    pub async fn scrape(&self) -> Vec<MetricFamily> {
        tracing::info!("Fetching termination data from metadata-service");

        let Some(outcome) = self.probe().await else {
            return Vec::new();
        };

        match self.descriptors.render(&outcome, Utc::now()) {
            Ok(families) => families,
            Err(e) => {
                tracing::error!(error = %e, "Failed to render termination metrics");
                Vec::new()
            }
        }
    }

    /// Run the probe sequence
    ///
    /// Returns `None` when the identity could not be fetched under the abort
    /// policy. Stops before the Spotinst lookup and the rebalance probe when
    /// the action probe hit a transport failure.
    pub async fn probe(&self) -> Option<ScrapeOutcome> {
        let instance_id = self.identity_field(MetadataPath::InstanceId).await?;
        let instance_type = if self.instance_type_label {
            self.identity_field(MetadataPath::InstanceType).await?
        } else {
            String::new()
        };

        let mut outcome = ScrapeOutcome::new(InstanceIdentity::new(instance_id, instance_type))
            .with_action(self.action_state().await);
        if !outcome.action.is_reachable() {
            return Some(outcome);
        }

        if let Some(spotinst) = &self.spotinst {
            let state = if outcome.identity.instance_id.is_empty() {
                LIFECYCLE_NOT_AVAILABLE.to_string()
            } else {
                spotinst.lifecycle_state(&outcome.identity.instance_id).await
            };
            outcome = outcome.with_lifecycle_state(state);
        }

        Some(outcome.with_rebalance(self.rebalance_state().await))
    }

    async fn identity_field(&self, path: MetadataPath) -> Option<String> {
        let reason = match self.prober.fetch_text(path).await {
            ProbeOutcome::Found(value) => return Some(value),
            ProbeOutcome::NotFound => "endpoint not found".to_string(),
            ProbeOutcome::Unavailable(e) | ProbeOutcome::Malformed(e) => e,
        };

        tracing::error!(path = %path, error = %reason, "couldn't parse {} from metadata", path);

        match self.identity_policy {
            IdentityPolicy::Abort => None,
            IdentityPolicy::EmptyLabel => Some(String::new()),
        }
    }

    async fn action_state(&self) -> ActionState {
        match self.prober.instance_action().await {
            ProbeOutcome::Found(action) => {
                tracing::info!(
                    action = %action.action,
                    time = ?action.time,
                    "instance-action endpoint available"
                );
                ActionState::Scheduled(action)
            }
            ProbeOutcome::NotFound => {
                tracing::debug!("instance-action endpoint not found");
                ActionState::NoNotice
            }
            ProbeOutcome::Malformed(e) => {
                tracing::error!(error = %e, "Couldn't parse instance-action metadata");
                ActionState::Unparsable
            }
            ProbeOutcome::Unavailable(e) => {
                tracing::error!(error = %e, "Failed to fetch data from metadata service");
                ActionState::Unreachable
            }
        }
    }

    async fn rebalance_state(&self) -> RebalanceState {
        match self.prober.rebalance_notice().await {
            ProbeOutcome::Found(notice) => {
                tracing::info!(
                    notice_time = %notice.notice_time,
                    "rebalance recommendation event endpoint available"
                );
                RebalanceState::Recommended(notice)
            }
            ProbeOutcome::NotFound => {
                tracing::debug!("rebalance endpoint not found");
                RebalanceState::NoNotice
            }
            ProbeOutcome::Malformed(e) => {
                tracing::error!(error = %e, "Couldn't parse rebalance recommendation event metadata");
                RebalanceState::Unparsable
            }
            ProbeOutcome::Unavailable(e) => {
                tracing::error!(error = %e, "Failed to fetch events data from metadata service");
                RebalanceState::Unreachable
            }
        }
    }
}

impl Collector for TerminationCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.descriptors.descs()
    }

    /// Blocks on the async scrape. Needs a multi-thread tokio runtime; on a
    /// current-thread runtime the scrape is skipped.
    fn collect(&self) -> Vec<MetricFamily> {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(error = %e, "No async runtime available for scrape");
                return Vec::new();
            }
        };

        match handle.runtime_flavor() {
            RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(self.scrape()))
            }
            flavor => {
                tracing::error!(?flavor, "Scrape needs a multi-thread runtime, skipping");
                Vec::new()
            }
        }
    }
}
