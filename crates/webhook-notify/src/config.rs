//! Notification definitions and resolved credentials supplied by the host.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::channels::{GchatPolicy, NotifierPolicy, SlackPolicy, WebhookPolicy};
use crate::error::NotifierError;

/// Which webhook flavour a notification uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotifierKind {
    /// Generic JSON webhook
    #[serde(rename = "webhook-notifier", alias = "webhook")]
    Webhook,
    /// Slack incoming webhook
    #[serde(rename = "slack-notifier", alias = "slack")]
    Slack,
    /// Google Chat incoming webhook
    #[serde(rename = "gchat-notifier", alias = "gchat")]
    Gchat,
}

impl NotifierKind {
    /// Plugin name as written in scenario descriptors.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Webhook => "webhook-notifier",
            Self::Slack => "slack-notifier",
            Self::Gchat => "gchat-notifier",
        }
    }

    /// The body/header policy for this kind.
    #[must_use]
    pub fn policy(self) -> &'static dyn NotifierPolicy {
        match self {
            Self::Webhook => &WebhookPolicy,
            Self::Slack => &SlackPolicy,
            Self::Gchat => &GchatPolicy,
        }
    }
}

impl fmt::Display for NotifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One notification as declared in a scenario descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSpec {
    pub name: String,
    pub notifier: NotifierKind,
    #[serde(default)]
    pub description: Option<String>,
    /// Name of the credential the host resolves into a [`Credential`]
    #[serde(default)]
    pub credential: Option<String>,
    #[serde(default)]
    pub on_start: bool,
    #[serde(default)]
    pub on_success: Option<bool>,
    #[serde(default)]
    pub on_failure: Option<bool>,
    /// Restricts triggering to these tasks; `None` means every task
    #[serde(default)]
    pub on_tasks: Option<Vec<String>>,
    /// Only sent when the host explicitly asks for it
    #[serde(default)]
    pub on_demand: bool,
    #[serde(default)]
    pub message_template: Option<PathBuf>,
    /// Extra headers in `key1=val1,key2=val2` form
    #[serde(default)]
    pub message_headers: Option<String>,
}

impl NotificationSpec {
    /// Minimal spec with every trigger flag at its default.
    #[must_use]
    pub fn new(name: impl Into<String>, notifier: NotifierKind) -> Self {
        Self {
            name: name.into(),
            notifier,
            description: None,
            credential: None,
            on_start: false,
            on_success: None,
            on_failure: None,
            on_tasks: None,
            on_demand: false,
            message_template: None,
            message_headers: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NotificationDocument {
    Wrapped { notifications: Vec<NotificationSpec> },
    List(Vec<NotificationSpec>),
}

/// Parse notification definitions from YAML.
///
/// Accepts either a bare list or a mapping with a `notifications` key, which
/// is how they appear inside a scenario descriptor.
///
/// # Errors
/// Returns [`NotifierError::Parse`] if the document does not match either shape.
pub fn load_notifications(yaml: &str) -> Result<Vec<NotificationSpec>, NotifierError> {
    let doc: NotificationDocument =
        serde_yaml::from_str(yaml).map_err(|e| NotifierError::Parse {
            what: "notification definitions",
            source: Box::new(e),
        })?;

    Ok(match doc {
        NotificationDocument::Wrapped { notifications } => notifications,
        NotificationDocument::List(list) => list,
    })
}

/// Endpoint and auth material resolved by the host for one notification.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(alias = "webhook_url")]
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

impl Credential {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credential")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("token", &redact(&self.token))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_wrapped_notifications() {
        let yaml = r"
notifications:
  - name: notify1
    notifier: webhook-notifier
    credential: webhook_generic
    message_headers: tenant=qe,team=infra
  - name: slack1
    notifier: slack-notifier
    on_start: true
    credential: webhook
  - name: gchat1
    notifier: gchat-notifier
    on_tasks: [provision, execute]
    message_template: user_temp.jinja
";
        let specs = load_notifications(yaml).unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].notifier, NotifierKind::Webhook);
        assert_eq!(specs[0].message_headers.as_deref(), Some("tenant=qe,team=infra"));
        assert!(specs[1].on_start);
        assert_eq!(specs[1].on_success, None);
        assert_eq!(
            specs[2].on_tasks,
            Some(vec!["provision".to_string(), "execute".to_string()])
        );
        assert_eq!(
            specs[2].message_template,
            Some(PathBuf::from("user_temp.jinja"))
        );
    }

    #[test]
    fn test_load_bare_list() {
        let yaml = "- name: n\n  notifier: slack\n";
        let specs = load_notifications(yaml).unwrap();
        assert_eq!(specs[0].notifier, NotifierKind::Slack);
        assert!(!specs[0].on_demand);
    }

    #[test]
    fn test_unknown_notifier_rejected() {
        let err = load_notifications("- name: n\n  notifier: email-notifier\n").unwrap_err();
        assert!(matches!(err, NotifierError::Parse { .. }));
    }

    #[test]
    fn test_credential_debug_redacts_secrets() {
        let cred = Credential::new("https://hooks.example.com/x")
            .with_basic_auth("bot", "hunter2")
            .with_token("abc123");
        let dbg = format!("{cred:?}");
        assert!(dbg.contains("bot"));
        assert!(!dbg.contains("hunter2"));
        assert!(!dbg.contains("abc123"));
    }

    #[test]
    fn test_credential_accepts_webhook_url_key() {
        let cred: Credential = toml::from_str("webhook_url = \"https://x\"\ntoken = \"t\"").unwrap();
        assert_eq!(cred.url, "https://x");
        assert_eq!(cred.token.as_deref(), Some("t"));
    }
}
