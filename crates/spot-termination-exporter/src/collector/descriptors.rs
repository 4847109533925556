//! Metric vocabulary and the mapping from a scrape outcome to samples
//!
//! Every render builds fresh gauges, so concurrent scrapes never share values.

use chrono::{DateTime, Utc};
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{GaugeVec, Opts};
use std::collections::HashMap;

use crate::contracts::*;

/// Prefix shared by every exported metric
pub const NAMESPACE: &str = "aws_instance";

pub const METADATA_SERVICE_AVAILABLE: &str = "aws_instance_metadata_service_available";
pub const METADATA_SERVICE_EVENTS_AVAILABLE: &str =
    "aws_instance_metadata_service_events_available";
pub const TERMINATION_IMMINENT: &str = "aws_instance_termination_imminent";
pub const TERMINATION_IN: &str = "aws_instance_termination_in";
pub const REBALANCE_RECOMMENDED: &str = "aws_instance_rebalance_recommended";
pub const SPOTINST_LIFECYCLE_STATE: &str = "aws_instance_spotinst_lifecycle_state";

/// One gauge: its options, label names and registry descriptor
struct GaugeSpec {
    name: &'static str,
    help: &'static str,
    labels: Vec<&'static str>,
    desc: Desc,
}

impl GaugeSpec {
    fn new(name: &'static str, help: &'static str, labels: Vec<&'static str>) -> prometheus::Result<Self> {
        let desc = Desc::new(
            format!("{}_{}", NAMESPACE, name),
            help.to_string(),
            labels.iter().map(|l| l.to_string()).collect(),
            HashMap::new(),
        )?;

        Ok(Self {
            name,
            help,
            labels,
            desc,
        })
    }

    fn sample(&self, value: f64, label_values: &[&str]) -> prometheus::Result<Vec<MetricFamily>> {
        let gauge = GaugeVec::new(Opts::new(self.name, self.help).namespace(NAMESPACE), &self.labels)?;
        gauge.get_metric_with_label_values(label_values)?.set(value);
        Ok(gauge.collect())
    }
}

/// Descriptors for the configured label sets
pub struct MetricDescriptors {
    with_instance_type: bool,
    service_available: GaugeSpec,
    events_available: GaugeSpec,
    termination_imminent: GaugeSpec,
    termination_in: GaugeSpec,
    rebalance_recommended: GaugeSpec,
    lifecycle_state: Option<GaugeSpec>,
}

impl MetricDescriptors {
    /// Build the vocabulary; `instance_type` labels are added when enabled
    pub fn new(with_instance_type: bool, with_lifecycle_state: bool) -> prometheus::Result<Self> {
        let labelled = |mut labels: Vec<&'static str>| {
            if with_instance_type {
                labels.push("instance_type");
            }
            labels
        };

        let lifecycle_state = if with_lifecycle_state {
            Some(GaugeSpec::new(
                "spotinst_lifecycle_state",
                "Spotinst lifecycle state of the instance",
                vec!["instance_id", "lifecycle_state"],
            )?)
        } else {
            None
        };

        Ok(Self {
            with_instance_type,
            service_available: GaugeSpec::new(
                "metadata_service_available",
                "Metadata service available",
                vec!["instance_id"],
            )?,
            events_available: GaugeSpec::new(
                "metadata_service_events_available",
                "Metadata service events endpoint available",
                vec!["instance_id"],
            )?,
            termination_imminent: GaugeSpec::new(
                "termination_imminent",
                "Instance is about to be terminated",
                labelled(vec!["instance_action", "instance_id"]),
            )?,
            termination_in: GaugeSpec::new(
                "termination_in",
                "Instance will be terminated in",
                labelled(vec!["instance_id"]),
            )?,
            rebalance_recommended: GaugeSpec::new(
                "rebalance_recommended",
                "Instance rebalance is recommended",
                labelled(vec!["instance_id"]),
            )?,
            lifecycle_state,
        })
    }

    /// Registry descriptors, one per metric
    pub fn descs(&self) -> Vec<&Desc> {
        let mut descs = vec![
            &self.rebalance_recommended.desc,
            &self.events_available.desc,
            &self.service_available.desc,
            &self.termination_imminent.desc,
            &self.termination_in.desc,
        ];
        if let Some(spec) = &self.lifecycle_state {
            descs.push(&spec.desc);
        }
        descs
    }

    /// Map a scrape outcome to metric families, evaluated at `now`
    pub fn render(
        &self,
        outcome: &ScrapeOutcome,
        now: DateTime<Utc>,
    ) -> prometheus::Result<Vec<MetricFamily>> {
        let identity = &outcome.identity;
        let id = identity.instance_id.as_str();
        let mut families = Vec::new();

        if !outcome.action.is_reachable() {
            families.extend(self.service_available.sample(0.0, &[id])?);
            return Ok(families);
        }
        families.extend(self.service_available.sample(1.0, &[id])?);

        if let (Some(spec), Some(state)) = (&self.lifecycle_state, &outcome.lifecycle_state) {
            families.extend(spec.sample(1.0, &[id, state.as_str()])?);
        }

        match &outcome.action {
            ActionState::Scheduled(action) => {
                families.extend(
                    self.termination_imminent
                        .sample(1.0, &self.labels(&[action.action.as_str(), id], identity))?,
                );
                if let Some(remaining) = action.seconds_remaining(now) {
                    families.extend(
                        self.termination_in
                            .sample(remaining, &self.labels(&[id], identity))?,
                    );
                }
            }
            _ => {
                families.extend(
                    self.termination_imminent
                        .sample(0.0, &self.labels(&["", id], identity))?,
                );
            }
        }

        if let Some(rebalance) = &outcome.rebalance {
            if !rebalance.is_reachable() {
                families.extend(self.events_available.sample(0.0, &[id])?);
                return Ok(families);
            }

            families.extend(self.events_available.sample(1.0, &[id])?);
            let value = if rebalance.is_recommended() { 1.0 } else { 0.0 };
            families.extend(
                self.rebalance_recommended
                    .sample(value, &self.labels(&[id], identity))?,
            );
        }

        Ok(families)
    }

    fn labels<'a>(&self, base: &[&'a str], identity: &'a InstanceIdentity) -> Vec<&'a str> {
        let mut values = base.to_vec();
        if self.with_instance_type {
            values.push(identity.instance_type.as_str());
        }
        values
    }
}
