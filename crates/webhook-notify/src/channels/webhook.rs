//! Generic JSON webhook.

use serde_json::json;

use super::{AllowedHeaders, NotifierPolicy};
use crate::config::{NotificationSpec, NotifierKind};
use crate::scenario::ScenarioSnapshot;

/// Posts a JSON object summarising the scenario; accepts custom headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookPolicy;

impl NotifierPolicy for WebhookPolicy {
    fn kind(&self) -> NotifierKind {
        NotifierKind::Webhook
    }

    fn default_body(&self, spec: &NotificationSpec, snapshot: &ScenarioSnapshot) -> String {
        json!({
            "notification": spec.name,
            "scenario": snapshot.name,
            "description": snapshot.description,
            "status": snapshot.status_label(),
            "overall_status": snapshot.overall_status,
            "passed_tasks": snapshot.passed_tasks,
            "failed_tasks": snapshot.failed_tasks,
        })
        .to_string()
    }

    fn allowed_header_keys(&self) -> AllowedHeaders {
        AllowedHeaders::Any
    }
}
