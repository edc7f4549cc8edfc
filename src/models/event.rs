use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{AsRefStr, Display};

/// Keys that must be present and non-blank in every inbound payload
pub const REQUIRED_PARAMS: [&str; 9] = [
    "alert_subject",
    "alert_message",
    "event_id",
    "event_source",
    "event_value",
    "event_update_status",
    "jsmops_api",
    "jsmops_web",
    "jsmops_token",
];

/// Origin of a monitoring event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum EventSource {
    Trigger,
    Discovery,
    Autoregistration,
    Internal,
}

impl EventSource {
    pub fn from_code(code: &str) -> Result<Self> {
        match code.trim().parse::<u8>() {
            Ok(0) => Ok(EventSource::Trigger),
            Ok(1) => Ok(EventSource::Discovery),
            Ok(2) => Ok(EventSource::Autoregistration),
            Ok(3) => Ok(EventSource::Internal),
            _ => Err(AppError::validation(
                "event_source",
                format!("\"{}\" given, must be 0-3", code),
            )),
        }
    }

    /// Sources with a problem/recovery lifecycle
    pub fn has_recovery(&self) -> bool {
        matches!(self, EventSource::Trigger | EventSource::Internal)
    }
}

/// State carried by a trigger-based event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum EventValue {
    Resolved,
    Problem,
}

/// What an operator did in an update operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateAction {
    Acknowledged,
    Unacknowledged,
    Other(String),
}

impl UpdateAction {
    /// Parse the free-text action list; `None` when blank
    ///
    /// The monitoring platform joins several actions ("acknowledged, commented"),
    /// so matching is by substring.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            None
        } else if raw.contains("unacknowledged") {
            Some(UpdateAction::Unacknowledged)
        } else if raw.contains("acknowledged") {
            Some(UpdateAction::Acknowledged)
        } else {
            Some(UpdateAction::Other(raw.to_string()))
        }
    }
}

/// Severity as numbered by the monitoring platform, plus two adapter sentinels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    NotClassified,
    Information,
    Warning,
    Average,
    High,
    Disaster,
    Resolved,
    Default,
}

impl Severity {
    /// Levels outside 0..=5 fall back to `Default`
    pub fn from_level(raw: Option<&str>) -> Self {
        match raw.and_then(|r| r.trim().parse::<u8>().ok()) {
            Some(0) => Severity::NotClassified,
            Some(1) => Severity::Information,
            Some(2) => Severity::Warning,
            Some(3) => Severity::Average,
            Some(4) => Severity::High,
            Some(5) => Severity::Disaster,
            _ => Severity::Default,
        }
    }

    /// Inbound key holding the remote priority for this severity
    pub fn priority_param(&self) -> String {
        format!("severity_{}", self.as_ref())
    }
}

/// Connection settings for the remote incident API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEndpoint {
    /// API base, always ending in `/`
    pub api_url: String,
    /// Web UI base, always ending in `/`
    pub web_url: String,
    pub token: String,
    pub proxy: Option<String>,
}

/// Validated inbound event; read-only after construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventContext {
    pub event_id: u64,
    pub source: EventSource,
    pub value: EventValue,
    pub is_update: bool,
    pub update_action: Option<UpdateAction>,
    pub severity: Severity,

    /// Remote priority picked through `severity_<name>`
    pub priority: Option<String>,

    pub subject: String,
    pub message: String,
    pub trigger_id: Option<String>,

    /// Operator identity for update operations
    pub user: Option<String>,

    /// Raw `event_tags_json`, handed to the tag collector untouched
    pub tags_json: Option<String>,
    pub teams: Option<Vec<String>>,
    pub extra_tags: Option<Vec<String>>,

    /// Monitoring front-end base, ending in `/`
    pub frontend_url: Option<String>,
    pub endpoint: RemoteEndpoint,

    /// Per-event override of the poll attempt budget
    pub status_counter: Option<u32>,
}

impl EventContext {
    /// Validate a flat parameter map and build the event context
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        for key in REQUIRED_PARAMS {
            match params.get(key) {
                Some(value) if !value.trim().is_empty() => {}
                _ => return Err(AppError::validation(key, "cannot be empty")),
            }
        }

        let get = |key: &str| params.get(key).map(|v| v.as_str()).unwrap_or_default();
        let optional = |key: &str| {
            params
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(|v| v.to_string())
        };

        let source = EventSource::from_code(get("event_source"))?;

        let raw_value = get("event_value").trim();
        let value = match (source, raw_value) {
            (_, "1") => EventValue::Problem,
            (EventSource::Discovery | EventSource::Autoregistration, "0") => {
                return Err(AppError::validation(
                    "event_value",
                    "recovery operations are supported only for Trigger and Internal actions",
                ))
            }
            (_, "0") => EventValue::Resolved,
            (EventSource::Trigger | EventSource::Internal, other) => {
                return Err(AppError::validation(
                    "event_value",
                    format!("\"{}\" given, must be 0 or 1", other),
                ))
            }
            // Discovery and autoregistration only ever report problems
            _ => EventValue::Problem,
        };

        let raw_update = get("event_update_status").trim();
        let is_update = match (source, raw_update) {
            (_, "1") => true,
            (_, "0") => false,
            (EventSource::Trigger, other) => {
                return Err(AppError::validation(
                    "event_update_status",
                    format!("\"{}\" given, must be 0 or 1", other),
                ))
            }
            _ => false,
        };

        let raw_id = get("event_id").trim();
        let event_id = match raw_id.parse::<u64>() {
            Ok(id) if id >= 1 => id,
            _ => {
                return Err(AppError::validation(
                    "event_id",
                    format!("\"{}\" given, must be a positive number", raw_id),
                ))
            }
        };

        let severity = if value == EventValue::Resolved {
            Severity::Resolved
        } else {
            Severity::from_level(params.get("event_nseverity").map(|s| s.as_str()))
        };
        let priority = optional(&severity.priority_param());

        let endpoint = RemoteEndpoint {
            api_url: with_trailing_slash(get("jsmops_api").trim()),
            web_url: with_trailing_slash(get("jsmops_web").trim()),
            token: get("jsmops_token").trim().to_string(),
            proxy: optional("HTTPProxy"),
        };

        Ok(Self {
            event_id,
            source,
            value,
            is_update,
            update_action: params
                .get("event_update_action")
                .and_then(|a| UpdateAction::parse(a)),
            severity,
            priority,
            subject: get("alert_subject").to_string(),
            message: get("alert_message").to_string(),
            trigger_id: optional("trigger_id"),
            user: optional("zbxuser"),
            tags_json: params.get("event_tags_json").cloned(),
            teams: params.get("jsmops_teams").map(|t| split_list(t)),
            extra_tags: params.get("jsmops_tags").map(|t| split_list(t)),
            frontend_url: optional("zbxurl").map(|u| with_trailing_slash(&u)),
            endpoint,
            status_counter: params
                .get("status_counter")
                .and_then(|c| c.trim().parse::<u32>().ok())
                .filter(|c| *c > 0),
        })
    }

    /// Correlation key addressing the remote alert
    pub fn alias(&self) -> String {
        self.event_id.to_string()
    }

    /// A trigger entering the problem state for the first time
    pub fn is_fresh_problem(&self) -> bool {
        self.source == EventSource::Trigger && self.value == EventValue::Problem && !self.is_update
    }
}

/// Parse the raw JSON object delivered by the caller into flat string params
///
/// Non-string scalars are kept in their JSON text form.
pub fn parse_params(raw: &str) -> Result<HashMap<String, String>> {
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)?;

    Ok(object
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| match v {
            serde_json::Value::String(s) => (k, s),
            other => (k, other.to_string()),
        })
        .collect())
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect()
}
