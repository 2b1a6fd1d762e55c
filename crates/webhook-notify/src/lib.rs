//! Webhook notifications for scenario orchestration runs.
//!
//! This crate sends a single HTTP POST to a generic webhook, a Slack incoming
//! webhook or a Google Chat webhook when a scenario run reaches a trigger
//! point (run start, run end, task failure). The host framework owns
//! scenario execution and credential storage; it hands this crate a
//! [`NotificationSpec`], a resolved [`Credential`] and a [`ScenarioSnapshot`].
//!
//! # Usage
//!
//! ```no_run
//! use webhook_notify::{
//!     Credential, Dispatcher, LifecycleEvent, NotificationSpec, NotifierKind,
//!     NotifierSettings, ScenarioSnapshot,
//! };
//!
//! # async fn run() -> Result<(), webhook_notify::NotifierError> {
//! let mut spec = NotificationSpec::new("slack1", NotifierKind::Slack);
//! spec.on_start = true;
//!
//! let credential = Credential::new("https://hooks.slack.com/services/T000/B000/XXXX");
//! let snapshot = ScenarioSnapshot::new("test_scenario");
//! let settings = NotifierSettings::from_env()?;
//!
//! let mut dispatcher = Dispatcher::new(spec, credential, snapshot, &settings)?;
//! dispatcher
//!     .notify_on(&LifecycleEvent::RunStarted {
//!         tasks: vec!["provision".to_string()],
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`NotifierPolicy`] captures what differs between webhook flavours: the
//!   default body and which headers are allowed
//! - [`WebhookTransport`] sends the request ([`HttpTransport`] uses `reqwest`)
//! - [`TemplateRenderer`] renders `message_template` files
//!   ([`HandlebarsRenderer`] uses `handlebars`)
//! - [`Dispatcher`] ties them together and reports a [`DispatchRecord`]

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod headers;
pub mod scenario;
pub mod settings;
pub mod template;
pub mod transport;

pub use channels::{AllowedHeaders, GchatPolicy, NotifierPolicy, SlackPolicy, WebhookPolicy};
pub use config::{load_notifications, Credential, NotificationSpec, NotifierKind};
pub use dispatcher::{DeliveryState, DispatchRecord, Dispatcher, RenderedMessage};
pub use error::{ErrorCategory, NotifierError, TransportError, MESSAGE_HEADERS_FORMAT_HINT};
pub use events::{LifecycleEvent, TriggerPolicy};
pub use headers::{build_headers, Headers};
pub use scenario::{RunStage, ScenarioSnapshot};
pub use settings::NotifierSettings;
pub use template::{HandlebarsRenderer, TemplateRenderer, TemplateResolver};
pub use transport::{HttpTransport, WebhookRequest, WebhookResponse, WebhookTransport};
