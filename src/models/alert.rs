use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Payload for `POST alerts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAlertPayload {
    /// Alert subject
    pub message: String,

    /// Correlation key (local event id)
    pub alias: String,

    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    pub source: String,

    /// Links back to the monitoring front-end
    pub details: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub responders: Option<Vec<Responder>>,

    pub tags: Vec<String>,
}

/// A team the remote system should notify
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Responder {
    #[serde(rename = "type")]
    pub responder_type: String,
    pub name: String,
}

impl Responder {
    pub fn team(name: impl Into<String>) -> Self {
        Self {
            responder_type: "team".to_string(),
            name: name.into(),
        }
    }
}

/// Payload for `POST {alias}/{action}?identifierType=alias`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertActionPayload {
    /// Acting operator; empty for recovery events
    pub user: String,
    pub note: String,
    pub source: String,
}

/// Body of a `202 Accepted` answer
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedResponse {
    pub request_id: Option<String>,
}

impl AcceptedResponse {
    /// Accept any object carrying a `result`, whatever its shape
    pub fn from_object(object: &Map<String, Value>) -> Option<Self> {
        if !object.contains_key("result") {
            return None;
        }

        let request_id = match object.get("requestId") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        };

        Some(Self { request_id })
    }
}

/// `data` object of the request-status endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestStatus {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,
    #[serde(default, rename = "alertId")]
    pub alert_id: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Remote status messages that mean the target state is already reached
pub const IDEMPOTENT_STATUS_MARKERS: [&str; 2] = ["There is no open alert", "Alert is already"];

impl RequestStatus {
    /// `success: false` that still leaves the alert where we wanted it
    pub fn is_idempotent(&self) -> bool {
        IDEMPOTENT_STATUS_MARKERS
            .iter()
            .any(|marker| self.status.contains(marker))
    }

    /// Terminal state for the poller
    pub fn is_settled(&self) -> bool {
        self.success || self.is_idempotent()
    }
}

/// Local alias plus the durable remote id once polling resolves it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteAlertRef {
    pub alias: String,
    pub alert_id: Option<String>,
}

impl RemoteAlertRef {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            alert_id: None,
        }
    }

    pub fn with_alert_id(mut self, alert_id: Option<String>) -> Self {
        self.alert_id = alert_id;
        self
    }
}

/// Value handed back to the monitoring platform
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OperationResult {
    /// Correlation tags to persist on the local event
    pub tags: BTreeMap<String, String>,

    #[serde(skip)]
    pub alert: Option<RemoteAlertRef>,
}

impl OperationResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn for_alert(alert: RemoteAlertRef) -> Self {
        Self {
            tags: BTreeMap::new(),
            alert: Some(alert),
        }
    }
}
