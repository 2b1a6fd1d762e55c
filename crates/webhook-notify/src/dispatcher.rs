//! The notification dispatcher: renders one message and POSTs it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::channels::NotifierPolicy;
use crate::config::{Credential, NotificationSpec, NotifierKind};
use crate::error::NotifierError;
use crate::events::{LifecycleEvent, TriggerPolicy};
use crate::headers::{build_headers, Headers};
use crate::scenario::ScenarioSnapshot;
use crate::settings::NotifierSettings;
use crate::template::{template_context, HandlebarsRenderer, TemplateRenderer, TemplateResolver};
use crate::transport::{HttpTransport, WebhookRequest, WebhookTransport};

/// Progress of a dispatcher's single attempt. `Sent` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryState {
    Unsent,
    Sending,
    Sent,
    Failed,
}

impl DeliveryState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unsent => "unsent",
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Sent | Self::Failed)
    }
}

/// Body and headers computed for a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMessage {
    pub body: String,
    pub headers: Headers,
}

/// Outcome of a single `notify()` call.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchRecord {
    pub notification: String,
    pub kind: NotifierKind,
    pub url: String,
    /// `None` if rendering failed before a request was built
    pub message: Option<RenderedMessage>,
    pub state: DeliveryState,
    /// HTTP status, if a response was received
    pub status: Option<u16>,
    pub error: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

/// Sends one configured notification for one scenario.
///
/// Built by the host from a [`NotificationSpec`], the resolved
/// [`Credential`] and a [`ScenarioSnapshot`]. The body is rendered on first
/// use and reused by later calls on the same instance.
pub struct Dispatcher {
    spec: NotificationSpec,
    credential: Credential,
    snapshot: ScenarioSnapshot,
    policy: &'static dyn NotifierPolicy,
    trigger: TriggerPolicy,
    transport: Arc<dyn WebhookTransport>,
    renderer: Arc<dyn TemplateRenderer>,
    resolver: TemplateResolver,
    body: Option<String>,
    last_record: Option<DispatchRecord>,
}

impl Dispatcher {
    /// Create a dispatcher using the HTTP and Handlebars implementations.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(
        spec: NotificationSpec,
        credential: Credential,
        snapshot: ScenarioSnapshot,
        settings: &NotifierSettings,
    ) -> Result<Self, NotifierError> {
        let transport = Arc::new(HttpTransport::new(settings)?);
        Ok(Self::with_parts(
            spec,
            credential,
            snapshot,
            transport,
            Arc::new(HandlebarsRenderer::new()),
            TemplateResolver::from_settings(settings),
        ))
    }

    /// Create a dispatcher with explicit transport, renderer and resolver.
    #[must_use]
    pub fn with_parts(
        spec: NotificationSpec,
        credential: Credential,
        snapshot: ScenarioSnapshot,
        transport: Arc<dyn WebhookTransport>,
        renderer: Arc<dyn TemplateRenderer>,
        resolver: TemplateResolver,
    ) -> Self {
        let policy = spec.notifier.policy();
        let trigger = TriggerPolicy::from_spec(&spec);

        if spec.message_headers.is_some() && !policy.allowed_header_keys().accepts_custom() {
            warn!(
                notification = %spec.name,
                kind = %spec.notifier,
                "message_headers is not supported for this notifier and will be ignored"
            );
        }

        Self {
            spec,
            credential,
            snapshot,
            policy,
            trigger,
            transport,
            renderer,
            resolver,
            body: None,
            last_record: None,
        }
    }

    /// Use `body` instead of rendering one.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn spec(&self) -> &NotificationSpec {
        &self.spec
    }

    #[must_use]
    pub fn kind(&self) -> NotifierKind {
        self.policy.kind()
    }

    /// The cached body, if it has been rendered.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// The record of the most recent `notify()` call, including failures.
    #[must_use]
    pub fn last_record(&self) -> Option<&DispatchRecord> {
        self.last_record.as_ref()
    }

    /// Whether this notification fires for `event`.
    #[must_use]
    pub fn should_fire(&self, event: &LifecycleEvent) -> bool {
        self.trigger.should_fire(event)
    }

    /// Headers for the outbound request.
    ///
    /// # Errors
    /// Returns [`NotifierError::Config`] if `message_headers` is malformed.
    pub fn message_headers(&self) -> Result<Headers, NotifierError> {
        let allowed = self.policy.allowed_header_keys();
        let custom = self
            .spec
            .message_headers
            .as_deref()
            .filter(|_| allowed.accepts_custom());
        build_headers(custom, &self.credential, allowed)
    }

    /// Render the body, or return the one already rendered.
    ///
    /// # Errors
    /// Returns a render error if the template is missing or fails to render.
    pub fn render_body(&mut self) -> Result<&str, NotifierError> {
        let body = match self.body.take() {
            Some(body) => body,
            None => self.build_body()?,
        };
        Ok(self.body.insert(body).as_str())
    }

    /// Headers and body for this notification.
    ///
    /// # Errors
    /// Returns a configuration or render error.
    pub fn render(&mut self) -> Result<RenderedMessage, NotifierError> {
        let headers = self.message_headers()?;
        let body = self.render_body()?.to_string();
        Ok(RenderedMessage { body, headers })
    }

    fn build_body(&self) -> Result<String, NotifierError> {
        match &self.spec.message_template {
            Some(template) => {
                let path = self.resolver.resolve(template)?;
                let context = template_context(&self.spec, &self.snapshot);
                debug!(
                    notification = %self.spec.name,
                    template = %path.display(),
                    "Rendering message template"
                );
                self.renderer.render(&path, &context)
            }
            None => Ok(self.policy.default_body(&self.spec, &self.snapshot)),
        }
    }

    /// Send the notification. Each dispatcher makes at most one attempt.
    ///
    /// Succeeds only on HTTP 200. The outcome is also kept for
    /// [`last_record`](Self::last_record).
    ///
    /// # Errors
    /// Returns [`NotifierError::Delivery`] for any other status,
    /// [`NotifierError::Transport`] if the request fails, configuration or
    /// render errors if the message cannot be built, and
    /// [`NotifierError::AlreadyDispatched`] on any call after the first attempt.
    pub async fn notify(&mut self) -> Result<DispatchRecord, NotifierError> {
        if let Some(previous) = self.last_record.as_ref().filter(|r| r.state.is_terminal()) {
            warn!(
                notification = %self.spec.name,
                state = previous.state.as_str(),
                "Notification already dispatched, not sending again"
            );
            return Err(NotifierError::AlreadyDispatched {
                notification: self.spec.name.clone(),
                state: previous.state.as_str(),
            });
        }

        let mut record = DispatchRecord {
            notification: self.spec.name.clone(),
            kind: self.kind(),
            url: self.credential.url.clone(),
            message: None,
            state: DeliveryState::Unsent,
            status: None,
            error: None,
            attempted_at: Utc::now(),
        };

        let result = self.deliver(&mut record).await;

        match &result {
            Ok(()) => record.state = DeliveryState::Sent,
            Err(e) => {
                record.state = DeliveryState::Failed;
                record.error = Some(e.to_string());
            }
        }
        self.last_record = Some(record.clone());

        result.map(|()| record)
    }

    /// Send the notification if it is configured to fire for `event`.
    ///
    /// Returns `Ok(None)` when the event does not match.
    ///
    /// # Errors
    /// Same as [`notify`](Self::notify).
    pub async fn notify_on(
        &mut self,
        event: &LifecycleEvent,
    ) -> Result<Option<DispatchRecord>, NotifierError> {
        if !self.should_fire(event) {
            debug!(
                notification = %self.spec.name,
                event = event.label(),
                "Trigger not matched, skipping"
            );
            return Ok(None);
        }

        self.notify().await.map(Some)
    }

    async fn deliver(&mut self, record: &mut DispatchRecord) -> Result<(), NotifierError> {
        let message = self.render()?;
        record.message = Some(message.clone());

        let request = WebhookRequest {
            url: self.credential.url.clone(),
            headers: message.headers,
            body: message.body,
        };

        record.state = DeliveryState::Sending;
        debug!(
            notification = %self.spec.name,
            kind = %self.spec.notifier,
            "Sending notification"
        );

        let response = self.transport.post(&request).await.map_err(|source| {
            error!(
                notification = %self.spec.name,
                error = %source,
                "Failed to send notification"
            );
            NotifierError::Transport {
                url: request.url.clone(),
                source,
            }
        })?;

        record.status = Some(response.status);

        if response.status == 200 {
            info!(notification = %self.spec.name, "Notification sent");
            Ok(())
        } else {
            warn!(
                notification = %self.spec.name,
                status = response.status,
                body = %response.body,
                "Webhook request failed"
            );
            Err(NotifierError::Delivery {
                status: response.status,
                body: response.body,
            })
        }
    }
}
