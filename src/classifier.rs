use crate::models::{EventContext, EventSource, EventValue, UpdateAction};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Remote operation chosen for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    Create,
    Close,
    Skip,
    Acknowledge,
    Unacknowledge,
    Annotate,
}

impl Operation {
    /// Action segment of `{alias}/{action}` for lifecycle calls
    pub fn remote_action(&self) -> Option<&'static str> {
        match self {
            Operation::Close => Some("close"),
            Operation::Acknowledge => Some("acknowledge"),
            Operation::Unacknowledge => Some("unacknowledge"),
            Operation::Annotate => Some("notes"),
            Operation::Create | Operation::Skip => None,
        }
    }
}

/// Map a validated event to exactly one operation
pub fn classify(ctx: &EventContext) -> Operation {
    match (ctx.source, ctx.value, ctx.is_update) {
        (EventSource::Discovery | EventSource::Autoregistration, _, _) => Operation::Create,
        (_, EventValue::Problem, false) => Operation::Create,
        // The recovery event already closed the alert
        (_, EventValue::Resolved, true) => Operation::Skip,
        (_, EventValue::Resolved, false) => Operation::Close,
        (EventSource::Internal, EventValue::Problem, true) => Operation::Annotate,
        (EventSource::Trigger, EventValue::Problem, true) => match ctx.update_action {
            Some(UpdateAction::Unacknowledged) => Operation::Unacknowledge,
            Some(UpdateAction::Acknowledged) => Operation::Acknowledge,
            Some(UpdateAction::Other(_)) | None => Operation::Annotate,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::tests::base_params;
    use crate::models::EventContext;

    fn classify_params(overrides: &[(&str, &str)]) -> Operation {
        let mut params = base_params();
        for (k, v) in overrides {
            params.insert(k.to_string(), v.to_string());
        }
        classify(&EventContext::from_params(&params).unwrap())
    }

    #[test]
    fn test_decision_table() {
        let trigger_update = [("event_source", "0"), ("event_value", "1"), ("event_update_status", "1")];
        let with_action = |action: &'static str| {
            let mut overrides = trigger_update.to_vec();
            overrides.push(("event_update_action", action));
            classify_params(&overrides)
        };

        assert_eq!(
            classify_params(&[("event_source", "0"), ("event_value", "1"), ("event_update_status", "0")]),
            Operation::Create
        );
        assert_eq!(
            classify_params(&[("event_source", "3"), ("event_value", "1"), ("event_update_status", "0")]),
            Operation::Create
        );
        assert_eq!(
            classify_params(&[("event_source", "3"), ("event_value", "1"), ("event_update_status", "1")]),
            Operation::Annotate
        );
        assert_eq!(classify_params(&[("event_source", "1"), ("event_value", "1")]), Operation::Create);
        assert_eq!(
            classify_params(&[("event_source", "2"), ("event_update_status", "1")]),
            Operation::Create
        );
        assert_eq!(
            classify_params(&[("event_source", "0"), ("event_value", "0"), ("event_update_status", "0")]),
            Operation::Close
        );
        assert_eq!(
            classify_params(&[("event_source", "3"), ("event_value", "0"), ("event_update_status", "0")]),
            Operation::Close
        );
        assert_eq!(
            classify_params(&[("event_source", "0"), ("event_value", "0"), ("event_update_status", "1")]),
            Operation::Skip
        );
        assert_eq!(
            classify_params(&[("event_source", "3"), ("event_value", "0"), ("event_update_status", "1")]),
            Operation::Skip
        );

        assert_eq!(with_action("unacknowledged"), Operation::Unacknowledge);
        assert_eq!(with_action("acknowledged, commented"), Operation::Acknowledge);
        assert_eq!(with_action("commented"), Operation::Annotate);
        assert_eq!(classify_params(&trigger_update), Operation::Annotate);
    }

    /// Decision table written out over the raw parameter values
    fn expected(source: &str, value: &str, update: &str, action: &str) -> Option<Operation> {
        let op = match (source, value, update) {
            ("1" | "2", "0", _) => return None,
            ("1" | "2", _, _) => Operation::Create,
            (_, "1", "0") => Operation::Create,
            (_, "0", "1") => Operation::Skip,
            (_, "0", _) => Operation::Close,
            ("3", _, _) => Operation::Annotate,
            _ => match action {
                "unacknowledged" => Operation::Unacknowledge,
                "acknowledged" => Operation::Acknowledge,
                _ => Operation::Annotate,
            },
        };
        Some(op)
    }

    #[test]
    fn test_every_combination_matches_table() {
        for source in ["0", "1", "2", "3"] {
            for value in ["0", "1"] {
                for update in ["0", "1"] {
                    for action in ["", "acknowledged", "unacknowledged", "commented"] {
                        let mut params = base_params();
                        params.insert("event_source".to_string(), source.to_string());
                        params.insert("event_value".to_string(), value.to_string());
                        params.insert("event_update_status".to_string(), update.to_string());
                        params.insert("event_update_action".to_string(), action.to_string());

                        let actual = EventContext::from_params(&params).ok().map(|ctx| classify(&ctx));
                        assert_eq!(
                            actual,
                            expected(source, value, update, action),
                            "source={} value={} update={} action={:?}",
                            source,
                            value,
                            update,
                            action
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_remote_actions() {
        assert_eq!(Operation::Annotate.remote_action(), Some("notes"));
        assert_eq!(Operation::Close.remote_action(), Some("close"));
        assert_eq!(Operation::Annotate.to_string(), "annotate");
    }
}
