//! Spotinst fleet-management API payloads

use serde::{Deserialize, Serialize};

/// Reported whenever the lifecycle state cannot be determined
pub const LIFECYCLE_NOT_AVAILABLE: &str = "not_available";

/// Envelope returned by `GET /aws/ec2/instance/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpotinstResponse {
    #[serde(default)]
    pub response: SpotinstResponseBody,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpotinstResponseBody {
    #[serde(default)]
    pub status: SpotinstStatus,

    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub items: Vec<SpotinstInstance>,

    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpotinstStatus {
    #[serde(default)]
    pub code: u16,

    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotinstInstance {
    #[serde(default)]
    pub instance_id: String,

    #[serde(default)]
    pub life_cycle_state: String,

    #[serde(default)]
    pub private_ip: String,

    #[serde(default)]
    pub group_id: String,
}

impl SpotinstResponse {
    /// Lifecycle state of the first returned instance, if any
    pub fn lifecycle_state(&self) -> Option<&str> {
        self.response
            .items
            .first()
            .map(|item| item.life_cycle_state.as_str())
            .filter(|state| !state.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_state_from_first_item() {
        let body = r#"{
            "response": {
                "status": {"code": 200, "message": "OK"},
                "kind": "spotinst:aws:ec2:instance",
                "items": [{"instanceId": "i-1", "lifeCycleState": "ACTIVE", "privateIp": "10.0.0.1", "groupId": "sig-1"}],
                "count": 1
            }
        }"#;

        let parsed: SpotinstResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.lifecycle_state(), Some("ACTIVE"));
        assert_eq!(parsed.response.items[0].group_id, "sig-1");
    }

    #[test]
    fn test_zero_items_has_no_state() {
        let parsed: SpotinstResponse =
            serde_json::from_str(r#"{"response": {"items": [], "count": 0}}"#).unwrap();
        assert_eq!(parsed.lifecycle_state(), None);
    }

    #[test]
    fn test_empty_state_is_ignored() {
        let parsed: SpotinstResponse =
            serde_json::from_str(r#"{"response": {"items": [{"lifeCycleState": ""}], "count": 1}}"#)
                .unwrap();
        assert_eq!(parsed.lifecycle_state(), None);
    }
}
