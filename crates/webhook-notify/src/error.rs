//! Error types for the notification dispatcher.

use std::path::PathBuf;

use thiserror::Error;

/// Remediation text returned when `message_headers` is malformed.
pub const MESSAGE_HEADERS_FORMAT_HINT: &str = "The value for message headers need to be in a comma \
separated string with keys and values separated by '=' e.g. message_headers=key1=val1,key2=val2";

/// Coarse classification of a [`NotifierError`], for hosts that branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The notification or plugin configuration is invalid
    Configuration,
    /// The endpoint answered with a non-200 status
    Delivery,
    /// The request never produced a response
    Transport,
    /// The message body could not be rendered
    Render,
}

/// Errors that can occur while building or sending a notification.
#[derive(Debug, Error)]
pub enum NotifierError {
    /// Invalid configuration value
    #[error("{message}")]
    Config { message: String },

    /// The webhook answered with something other than 200
    #[error("Webhook returned {status}: {body}")]
    Delivery { status: u16, body: String },

    /// HTTP client failure before a response was received
    #[error("Failed to send notification to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    /// Template file could not be located
    #[error("Message template '{template}' not found (searched: {})", display_paths(.searched))]
    TemplateNotFound {
        template: String,
        searched: Vec<PathBuf>,
    },

    /// Template could not be read or rendered
    #[error("Failed to render message template '{template}': {source}")]
    Render {
        template: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The dispatcher already made its one attempt
    #[error("Notification '{notification}' was already dispatched ({state})")]
    AlreadyDispatched {
        notification: String,
        state: &'static str,
    },

    /// Malformed YAML or TOML input
    #[error("Failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl NotifierError {
    /// Error for a malformed `message_headers` value.
    #[must_use]
    pub fn malformed_headers() -> Self {
        Self::Config {
            message: MESSAGE_HEADERS_FORMAT_HINT.to_string(),
        }
    }

    /// Which part of the taxonomy this error belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Config { .. } | Self::Parse { .. } | Self::AlreadyDispatched { .. } => {
                ErrorCategory::Configuration
            }
            Self::Delivery { .. } => ErrorCategory::Delivery,
            Self::Transport { .. } => ErrorCategory::Transport,
            Self::TemplateNotFound { .. } | Self::Render { .. } => ErrorCategory::Render,
        }
    }
}

/// Failure reported by a [`WebhookTransport`](crate::transport::WebhookTransport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Header name or value rejected by the client
    #[error("Invalid header '{name}'")]
    InvalidHeader { name: String },

    /// Other error
    #[error("{0}")]
    Other(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
