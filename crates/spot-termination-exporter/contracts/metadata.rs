//! Instance metadata service payloads
//!
//! The provider documents that notice fields "may be present but invalid",
//! so timestamps are decoded leniently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Default base URL of the EC2 instance metadata service
pub const DEFAULT_METADATA_ENDPOINT: &str = "http://169.254.169.254/latest/meta-data/";

/// Relative paths probed below the metadata base URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataPath {
    InstanceId,
    InstanceType,
    InstanceAction,
    RebalanceRecommendation,
}

impl MetadataPath {
    /// Path relative to the base URL
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataPath::InstanceId => "instance-id",
            MetadataPath::InstanceType => "instance-type",
            MetadataPath::InstanceAction => "spot/instance-action",
            MetadataPath::RebalanceRecommendation => "events/recommendations/rebalance",
        }
    }
}

impl fmt::Display for MetadataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the instance being scraped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceIdentity {
    /// Empty when the probe failed under the empty-label policy
    pub instance_id: String,

    /// Empty when the probe failed or instance-type labelling is disabled
    pub instance_type: String,
}

impl InstanceIdentity {
    pub fn new(instance_id: impl Into<String>, instance_type: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            instance_type: instance_type.into(),
        }
    }
}

/// Body of `spot/instance-action`
///
/// ```json
/// {"action": "terminate", "time": "2017-09-18T08:22:00Z"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceAction {
    /// `hibernate`, `stop` or `terminate`
    pub action: String,

    /// Scheduled time; `None` when missing or not RFC 3339
    #[serde(default, deserialize_with = "lenient_rfc3339")]
    pub time: Option<DateTime<Utc>>,
}

impl InstanceAction {
    pub fn new(action: impl Into<String>, time: Option<DateTime<Utc>>) -> Self {
        Self {
            action: action.into(),
            time,
        }
    }

    /// Seconds until the scheduled time, `None` once it has passed
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> Option<f64> {
        self.time.and_then(|time| seconds_until(time, now))
    }
}

/// Body of `events/recommendations/rebalance`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceNotice {
    #[serde(rename = "noticeTime")]
    pub notice_time: DateTime<Utc>,
}

/// Strictly positive number of seconds from `now` until `deadline`
pub fn seconds_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Option<f64> {
    let millis = (deadline - now).num_milliseconds();
    if millis > 0 {
        Some(millis as f64 / 1000.0)
    } else {
        None
    }
}

fn lenient_rfc3339<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(|value| value.as_str())
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|time| time.with_timezone(&Utc)))
}
