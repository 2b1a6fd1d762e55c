//! Google Chat incoming webhook.

use serde::Serialize;

use super::{task_list, AllowedHeaders, NotifierPolicy, CHAT_HEADERS};
use crate::config::{NotificationSpec, NotifierKind};
use crate::scenario::{RunStage, ScenarioSnapshot};

/// Posts `{"text": ...}` using Google Chat's simple text formatting.
#[derive(Debug, Clone, Copy, Default)]
pub struct GchatPolicy;

impl GchatPolicy {
    fn format_text(spec: &NotificationSpec, snapshot: &ScenarioSnapshot) -> String {
        let mut lines = vec![format!(
            "*{}*: scenario `{}` {}",
            spec.name,
            snapshot.name,
            snapshot.status_label().to_uppercase()
        )];

        if let Some(description) = spec.description.as_deref().or(snapshot.description.as_deref()) {
            lines.push(description.to_string());
        }

        if snapshot.stage == RunStage::Finished {
            lines.push(format!("• Passed: {}", task_list(&snapshot.passed_tasks)));
            lines.push(format!("• Failed: {}", task_list(&snapshot.failed_tasks)));
            if !snapshot.succeeded() {
                lines.push(format!("• Exit status: {}", snapshot.overall_status));
            }
        }

        lines.join("\n")
    }
}

impl NotifierPolicy for GchatPolicy {
    fn kind(&self) -> NotifierKind {
        NotifierKind::Gchat
    }

    fn default_body(&self, spec: &NotificationSpec, snapshot: &ScenarioSnapshot) -> String {
        let payload = GchatPayload {
            text: Self::format_text(spec, snapshot),
        };
        serde_json::to_string(&payload).unwrap_or_default()
    }

    fn allowed_header_keys(&self) -> AllowedHeaders {
        CHAT_HEADERS
    }
}

#[derive(Debug, Serialize)]
struct GchatPayload {
    text: String,
}
