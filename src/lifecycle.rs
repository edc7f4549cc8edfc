use crate::classifier::{classify, Operation};
use crate::config::AdapterConfig;
use crate::error::{AppError, Result};
use crate::models::{
    AcceptedResponse, AlertActionPayload, CreateAlertPayload, EventContext, EventSource, EventValue,
    OperationResult, RemoteAlertRef, RequestStatus, Responder,
};
use crate::poller::{ResolutionPoller, RetryPolicy};
use crate::tags;
use crate::transport::{ApiResponse, HttpMethod, JsmOpsClient};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// The remote call an event resolves to, before anything is sent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub operation: Operation,
    /// `None` for skipped events
    pub path: Option<String>,
    pub payload: Option<serde_json::Value>,
}

/// Drives one event through classification, the remote call and polling
pub struct AlertLifecycle {
    client: JsmOpsClient,
    config: AdapterConfig,
}

impl AlertLifecycle {
    /// Create a lifecycle driver for the event's endpoint
    pub fn new(ctx: &EventContext, config: AdapterConfig) -> Result<Self> {
        let client = JsmOpsClient::new(&ctx.endpoint, &config.http, &config.alert)?;
        Ok(Self { client, config })
    }

    /// Decide what would be sent for this event
    pub fn plan(ctx: &EventContext, config: &AdapterConfig) -> Result<Plan> {
        let operation = classify(ctx);

        let (path, payload) = match operation {
            Operation::Skip => (None, None),
            Operation::Create => {
                let payload = build_create_payload(ctx, config);
                (
                    Some(config.alert.create_path.clone()),
                    Some(serde_json::to_value(payload)?),
                )
            }
            Operation::Close | Operation::Acknowledge | Operation::Unacknowledge | Operation::Annotate => {
                let action = operation.remote_action().unwrap_or_default();
                let payload = build_action_payload(ctx, config);
                (
                    Some(format!("{}/{}?identifierType=alias", ctx.alias(), action)),
                    Some(serde_json::to_value(payload)?),
                )
            }
        };

        Ok(Plan {
            operation,
            path,
            payload,
        })
    }

    /// Execute the event end to end
    pub async fn dispatch(&self, ctx: &EventContext) -> Result<OperationResult> {
        let plan = Self::plan(ctx, &self.config)?;

        info!(
            event_id = ctx.event_id,
            source = %ctx.source,
            value = %ctx.value,
            is_update = ctx.is_update,
            operation = %plan.operation,
            "Event classified"
        );

        let (path, payload) = match (plan.path, plan.payload) {
            (Some(path), Some(payload)) => (path, payload),
            _ => {
                info!(event_id = ctx.event_id, "Recovery already sent, skipping update");
                return Ok(OperationResult::empty());
            }
        };

        let response = self
            .client
            .request(HttpMethod::Post, &path, Some(&payload), false)
            .await?;

        let name = &self.config.alert.name;
        let accepted = accepted_response(&response).ok_or_else(|| match plan.operation {
            Operation::Create => AppError::CreateFailed(name.clone()),
            _ => AppError::UpdateFailed(name.clone()),
        })?;

        if response.status != 202 {
            return Err(AppError::UnexpectedStatus(response.status));
        }

        let request_id = accepted
            .request_id
            .ok_or_else(|| AppError::AlertIdUnresolved(name.clone()))?;

        let status = self.poller(ctx).resolve(&request_id).await?;
        let alert = RemoteAlertRef::new(ctx.alias()).with_alert_id(non_empty(status.alert_id.clone()));

        let mut result = OperationResult::for_alert(alert);
        if plan.operation == Operation::Create && ctx.is_fresh_problem() {
            result.tags = self.correlation_tags(ctx, &status);
        }

        Ok(result)
    }

    fn poller(&self, ctx: &EventContext) -> ResolutionPoller<'_> {
        let mut policy = RetryPolicy::from_config(&self.config.poll);
        if let Some(counter) = ctx.status_counter {
            policy = policy.with_max_attempts(counter);
        }
        ResolutionPoller::new(&self.client, policy, self.config.alert.name.clone())
    }

    fn correlation_tags(&self, ctx: &EventContext, status: &RequestStatus) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::new();

        match non_empty(status.alert_id.clone()) {
            Some(alert_id) => {
                let alert = &self.config.alert;
                tags.insert(
                    alert.issue_link_tag.clone(),
                    format!("{}{}{}", ctx.endpoint.web_url, alert.link_path, alert_id),
                );
                tags.insert(alert.issue_key_tag.clone(), alert_id);
            }
            None => warn!(
                event_id = ctx.event_id,
                status = %status.status,
                "Request resolved without an alert id, correlation tags not set"
            ),
        }

        tags
    }
}

/// Run one event with a fresh client, the library entry point
pub async fn process_event(ctx: &EventContext, config: AdapterConfig) -> Result<OperationResult> {
    AlertLifecycle::new(ctx, config)?.dispatch(ctx).await
}

fn accepted_response(response: &ApiResponse) -> Option<AcceptedResponse> {
    AcceptedResponse::from_object(response.object()?)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn build_create_payload(ctx: &EventContext, config: &AdapterConfig) -> CreateAlertPayload {
    let mut details = BTreeMap::new();
    if let Some(frontend) = &ctx.frontend_url {
        details.insert("Zabbix server".to_string(), frontend.clone());

        if ctx.source == EventSource::Trigger {
            details.insert(
                "Problem".to_string(),
                format!(
                    "{}tr_events.php?triggerid={}&eventid={}",
                    frontend,
                    ctx.trigger_id.as_deref().unwrap_or_default(),
                    ctx.event_id
                ),
            );
        }
    }

    let mut labels = tags::collect(ctx.tags_json.as_deref());
    for extra in ctx.extra_tags.iter().flatten() {
        tags::push_unique(&mut labels, extra.clone());
    }

    CreateAlertPayload {
        message: ctx.subject.clone(),
        alias: ctx.alias(),
        description: ctx.message.clone(),
        priority: ctx.priority.clone(),
        source: config.alert.source.clone(),
        details,
        responders: ctx
            .teams
            .as_ref()
            .map(|teams| teams.iter().map(Responder::team).collect()),
        tags: labels,
    }
}

fn build_action_payload(ctx: &EventContext, config: &AdapterConfig) -> AlertActionPayload {
    let user = match ctx.value {
        EventValue::Resolved => String::new(),
        EventValue::Problem => ctx.user.clone().unwrap_or_default(),
    };

    AlertActionPayload {
        user,
        note: ctx.message.clone(),
        source: config.alert.source.clone(),
    }
}
