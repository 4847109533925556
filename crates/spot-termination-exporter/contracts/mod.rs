//! Spot Termination Exporter Contracts
//!
//! Typed facts decoded from the instance metadata service and the transient
//! per-scrape outcome the collector turns into samples.

mod metadata;
mod spotinst;

pub use metadata::*;
pub use spotinst::*;

use serde::{Deserialize, Serialize};

/// Interpreted state of the `spot/instance-action` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "notice", rename_all = "snake_case")]
pub enum ActionState {
    /// Transport failure: the metadata service could not be reached
    Unreachable,
    /// Endpoint answered 404, nothing scheduled
    NoNotice,
    /// Endpoint answered but the body was not a valid notice
    Unparsable,
    /// A reclamation notice is present
    Scheduled(InstanceAction),
}

impl ActionState {
    /// Whether the metadata service answered at all
    pub fn is_reachable(&self) -> bool {
        !matches!(self, ActionState::Unreachable)
    }
}

/// Interpreted state of the `events/recommendations/rebalance` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "notice", rename_all = "snake_case")]
pub enum RebalanceState {
    Unreachable,
    NoNotice,
    Unparsable,
    Recommended(RebalanceNotice),
}

impl RebalanceState {
    pub fn is_reachable(&self) -> bool {
        !matches!(self, RebalanceState::Unreachable)
    }

    pub fn is_recommended(&self) -> bool {
        matches!(self, RebalanceState::Recommended(_))
    }
}

/// Everything learned during one scrape
///
/// Built fresh by every collect call and dropped once the samples are
/// produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeOutcome {
    /// Labels for every sample of this scrape
    pub identity: InstanceIdentity,

    /// Spotinst lifecycle state, present only when the lookup is configured
    #[serde(default)]
    pub lifecycle_state: Option<String>,

    /// Result of the instance-action probe
    pub action: ActionState,

    /// Result of the rebalance probe, absent when the sequence stopped early
    #[serde(default)]
    pub rebalance: Option<RebalanceState>,
}

impl ScrapeOutcome {
    /// Outcome for a scrape whose action probe has not run yet
    pub fn new(identity: InstanceIdentity) -> Self {
        Self {
            identity,
            lifecycle_state: None,
            action: ActionState::Unreachable,
            rebalance: None,
        }
    }

    pub fn with_lifecycle_state(mut self, state: impl Into<String>) -> Self {
        self.lifecycle_state = Some(state.into());
        self
    }

    pub fn with_action(mut self, action: ActionState) -> Self {
        self.action = action;
        self
    }

    pub fn with_rebalance(mut self, rebalance: RebalanceState) -> Self {
        self.rebalance = Some(rebalance);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_builder() {
        let outcome = ScrapeOutcome::new(InstanceIdentity::new("i-123", "m5.large"))
            .with_action(ActionState::NoNotice)
            .with_rebalance(RebalanceState::Unparsable);

        assert!(outcome.action.is_reachable());
        assert_eq!(outcome.rebalance, Some(RebalanceState::Unparsable));
        assert!(outcome.lifecycle_state.is_none());
    }

    #[test]
    fn test_fresh_outcome_is_unreachable() {
        let outcome = ScrapeOutcome::new(InstanceIdentity::default());
        assert!(!outcome.action.is_reachable());
        assert!(outcome.rebalance.is_none());
    }

    #[test]
    fn test_rebalance_state_flags() {
        assert!(!RebalanceState::Unreachable.is_reachable());
        assert!(RebalanceState::NoNotice.is_reachable());
        assert!(!RebalanceState::NoNotice.is_recommended());
    }
}
