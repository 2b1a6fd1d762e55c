//! Slack incoming webhook.

use serde::Serialize;

use super::{task_list, AllowedHeaders, NotifierPolicy, CHAT_HEADERS};
use crate::config::{NotificationSpec, NotifierKind};
use crate::scenario::{RunStage, ScenarioSnapshot};

/// Posts `{"text": ...}` formatted with Slack mrkdwn.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlackPolicy;

impl SlackPolicy {
    fn format_text(spec: &NotificationSpec, snapshot: &ScenarioSnapshot) -> String {
        let icon = match (snapshot.stage, snapshot.succeeded()) {
            (RunStage::Started, _) => ":rocket:",
            (RunStage::Finished, true) => ":white_check_mark:",
            (RunStage::Finished, false) => ":x:",
        };

        let mut text = format!(
            "{icon} Scenario *{}* {}",
            snapshot.name,
            snapshot.status_label()
        );

        if let Some(description) = spec.description.as_deref().or(snapshot.description.as_deref()) {
            text.push_str(&format!("\n_{description}_"));
        }

        if snapshot.stage == RunStage::Finished {
            text.push_str(&format!(
                "\n*Passed tasks:* {}\n*Failed tasks:* {}\n*Overall status:* {}",
                task_list(&snapshot.passed_tasks),
                task_list(&snapshot.failed_tasks),
                snapshot.overall_status
            ));
        }

        text
    }
}

impl NotifierPolicy for SlackPolicy {
    fn kind(&self) -> NotifierKind {
        NotifierKind::Slack
    }

    fn default_body(&self, spec: &NotificationSpec, snapshot: &ScenarioSnapshot) -> String {
        let payload = SlackPayload {
            text: Self::format_text(spec, snapshot),
        };
        serde_json::to_string(&payload).unwrap_or_default()
    }

    fn allowed_header_keys(&self) -> AllowedHeaders {
        CHAT_HEADERS
    }
}

// =============================================================================
// Slack API types
// =============================================================================

#[derive(Debug, Serialize)]
struct SlackPayload {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn text_of(body: &str) -> String {
        let value: Value = serde_json::from_str(body).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 1);
        value["text"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_finished_summary() {
        let spec = NotificationSpec::new("slack1", NotifierKind::Slack);
        let mut snapshot = ScenarioSnapshot::new("test_scenario");
        snapshot.passed_tasks = vec!["provision".to_string()];

        let text = text_of(&SlackPolicy.default_body(&spec, &snapshot));
        assert_eq!(
            text,
            ":white_check_mark: Scenario *test_scenario* passed\n\
             *Passed tasks:* provision\n*Failed tasks:* none\n*Overall status:* 0"
        );
    }

    #[test]
    fn test_started_summary_with_description() {
        let mut spec = NotificationSpec::new("slack1", NotifierKind::Slack);
        spec.description = Some("nightly \"smoke\" run".to_string());
        let mut snapshot = ScenarioSnapshot::new("test_scenario");
        snapshot.stage = RunStage::Started;

        let body = SlackPolicy.default_body(&spec, &snapshot);
        assert_eq!(
            text_of(&body),
            ":rocket: Scenario *test_scenario* started\n_nightly \"smoke\" run_"
        );
    }
}
