//! Per-platform message policies (generic webhook, Slack, Google Chat).

pub mod gchat;
pub mod slack;
pub mod webhook;

pub use gchat::GchatPolicy;
pub use slack::SlackPolicy;
pub use webhook::WebhookPolicy;

use crate::config::{NotificationSpec, NotifierKind};
use crate::headers::{AUTHORIZATION, CONTENT_TYPE};
use crate::scenario::ScenarioSnapshot;

/// Headers chat integrations accept; they take no custom headers.
pub(crate) const CHAT_HEADERS: AllowedHeaders = AllowedHeaders::Only(&[CONTENT_TYPE, AUTHORIZATION]);

/// Header names a policy lets through to the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowedHeaders {
    /// Any header, including user-supplied custom headers
    Any,
    /// Only these names (compared case-insensitively)
    Only(&'static [&'static str]),
}

impl AllowedHeaders {
    #[must_use]
    pub fn permits(&self, name: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Only(names) => names.iter().any(|n| n.eq_ignore_ascii_case(name)),
        }
    }

    /// Whether user-supplied `message_headers` can reach the request at all.
    #[must_use]
    pub const fn accepts_custom(&self) -> bool {
        matches!(self, Self::Any)
    }
}

/// What distinguishes one webhook flavour from another.
pub trait NotifierPolicy: Send + Sync {
    fn kind(&self) -> NotifierKind;

    /// Body sent when the notification has no `message_template`.
    fn default_body(&self, spec: &NotificationSpec, snapshot: &ScenarioSnapshot) -> String;

    fn allowed_header_keys(&self) -> AllowedHeaders;
}

/// Join task names for human-readable summaries.
pub(crate) fn task_list(tasks: &[String]) -> String {
    if tasks.is_empty() {
        "none".to_string()
    } else {
        tasks.join(", ")
    }
}
