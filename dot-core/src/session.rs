//! Generation orchestrator.
//!
//! A [`DotSession`] owns one conversation: its history, the current spec, the
//! registered field descriptions and the panel error. Each call to
//! [`DotSession::generate`] snapshots host data, builds the prompt, and tries
//! the backend up to [`MAX_ATTEMPTS`] times.
//!
//! ## State machine
//!
//! ```text
//! Idle ──generate──▶ Generating ──valid spec──▶ Success
//!                        │
//!                        └──attempts exhausted──▶ Failed
//! ```
//!
//! `generate` borrows the session mutably, so generations on one session never
//! overlap. A generation whose future is dropped mid-flight leaves the session
//! in `Generating`; the next call supersedes it.

use crate::error::{Error, Result};
use crate::host::{HostValue, Selector};
use crate::llm::{Constraints, GenerationRequest, ModelClient};
use crate::prompt::{build_messages, conversation_fingerprint};
use crate::sanitize::sanitize_data;
use crate::size_guard::{
    size_guard, SizeGuardOptions, SizeGuardResult, DEFAULT_MAX_BYTES, DEFAULT_MAX_ROWS,
};
use crate::spec::{dashboard_schema, parse_spec, DashboardSpec};
use crate::types::ConversationMessage;
use indexmap::IndexSet;
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Backend calls per generation before giving up.
pub const MAX_ATTEMPTS: usize = 2;

pub const DEFAULT_MAX_WIDGETS: usize = 6;

/// Payload and output budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DotOptions {
    pub max_bytes: usize,
    pub max_rows: usize,
    pub max_widgets: usize,
}

impl Default for DotOptions {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            max_rows: DEFAULT_MAX_ROWS,
            max_widgets: DEFAULT_MAX_WIDGETS,
        }
    }
}

impl DotOptions {
    pub fn size_guard(&self) -> SizeGuardOptions {
        SizeGuardOptions {
            max_bytes: self.max_bytes,
            max_rows: self.max_rows,
        }
    }
}

/// Configuration shared by every session of a host application.
pub struct DotContext {
    pub app_description: String,
    pub client: Option<Arc<dyn ModelClient>>,
    pub options: DotOptions,
}

impl DotContext {
    pub fn new(app_description: impl Into<String>) -> Self {
        Self {
            app_description: app_description.into(),
            client: None,
            options: DotOptions::default(),
        }
    }

    pub fn with_client(mut self, client: Arc<dyn ModelClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_options(mut self, options: DotOptions) -> Self {
        self.options = options;
        self
    }
}

impl fmt::Debug for DotContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DotContext")
            .field("app_description", &self.app_description)
            .field("has_client", &self.client.is_some())
            .field("options", &self.options)
            .finish()
    }
}

/// Free-text field descriptions, de-duplicated, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptions(IndexSet<String>);

impl Descriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the description was already registered.
    pub fn add(&mut self, description: impl Into<String>) -> bool {
        self.0.insert(description.into())
    }

    pub fn remove(&mut self, description: &str) -> bool {
        self.0.shift_remove(description)
    }

    pub fn contains(&self, description: &str) -> bool {
        self.0.contains(description)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    Generating,
    Success,
    Failed,
}

/// One conversation with the backend about one host's data.
pub struct DotSession {
    id: Uuid,
    context: Arc<DotContext>,
    selector: Selector,
    descriptions: Descriptions,
    history: Vec<ConversationMessage>,
    spec: Option<DashboardSpec>,
    error: Option<String>,
    state: GenerationState,
}

impl DotSession {
    pub fn new<F>(context: Arc<DotContext>, selector: F) -> Self
    where
        F: Fn() -> HostValue + Send + Sync + 'static,
    {
        Self::with_selector(context, Arc::new(selector))
    }

    pub fn with_selector(context: Arc<DotContext>, selector: Selector) -> Self {
        Self {
            id: Uuid::new_v4(),
            context,
            selector,
            descriptions: Descriptions::new(),
            history: Vec::new(),
            spec: None,
            error: None,
            state: GenerationState::Idle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn context(&self) -> &DotContext {
        &self.context
    }

    pub fn history(&self) -> &[ConversationMessage] {
        &self.history
    }

    /// The last accepted spec. Kept across failed generations.
    pub fn spec(&self) -> Option<&DashboardSpec> {
        self.spec.as_ref()
    }

    /// Error text for the panel, cleared when a generation starts.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn state(&self) -> GenerationState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == GenerationState::Generating
    }

    pub fn descriptions(&self) -> &Descriptions {
        &self.descriptions
    }

    pub fn descriptions_mut(&mut self) -> &mut Descriptions {
        &mut self.descriptions
    }

    /// Pull, sanitize and guard the current host data.
    pub fn snapshot(&self) -> SizeGuardResult {
        let data = sanitize_data(&(self.selector)());
        size_guard(&data, self.context.options.size_guard())
    }

    /// The messages the next `generate(user_message)` would send, built
    /// from a fresh snapshot. Nothing is recorded.
    pub fn preview(&self, user_message: &str) -> Vec<ConversationMessage> {
        let snapshot = self.snapshot();
        let mut history = self.history.clone();
        history.push(ConversationMessage::user(user_message));
        self.messages_for(&snapshot, &history)
    }

    fn messages_for(
        &self,
        snapshot: &SizeGuardResult,
        history: &[ConversationMessage],
    ) -> Vec<ConversationMessage> {
        build_messages(
            &self.context.app_description,
            self.descriptions.iter(),
            &snapshot.data,
            snapshot.data_profile.as_ref(),
            history,
        )
    }

    /// Ask the backend for a dashboard answering `user_message`.
    ///
    /// On success the spec replaces the current one and a copy is returned.
    /// On failure the current spec is left alone and the last attempt's error
    /// is returned.
    pub async fn generate(&mut self, user_message: impl Into<String>) -> Result<DashboardSpec> {
        let span = tracing::info_span!("generate", session_id = %self.id);
        self.run(user_message.into()).instrument(span).await
    }

    async fn run(&mut self, user_message: String) -> Result<DashboardSpec> {
        let Some(client) = self.context.client.clone() else {
            tracing::warn!("Generation requested without a model client");
            self.error = Some(Error::MissingClient.to_string());
            self.state = GenerationState::Failed;
            return Err(Error::MissingClient);
        };

        if self.state == GenerationState::Generating {
            tracing::warn!("Previous generation was abandoned, superseding it");
        }
        self.state = GenerationState::Generating;
        self.error = None;

        let snapshot = self.snapshot();
        self.history.push(ConversationMessage::user(user_message));
        let messages = self.messages_for(&snapshot, &self.history);
        let options = self.context.options;
        let constraints = Constraints::new(options.max_widgets, options.max_rows);

        tracing::info!(
            messages = messages.len(),
            was_sampled = snapshot.was_sampled,
            prompt_hash = %conversation_fingerprint(&messages),
            "Generating dashboard"
        );

        let mut last_error = None;
        for attempt in 1..=MAX_ATTEMPTS {
            let request = GenerationRequest {
                messages: messages.clone(),
                dashboard_schema: dashboard_schema(),
                constraints,
            };
            match attempt_once(client.as_ref(), request).await {
                Ok(spec) => return Ok(self.accept(spec)),
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = MAX_ATTEMPTS,
                        error = %e,
                        "Generation attempt failed"
                    );
                    let retryable = e.is_retryable();
                    last_error = Some(e);
                    if !retryable {
                        break;
                    }
                }
            }
        }

        let err = last_error.unwrap_or_else(|| Error::Llm("Unknown error".to_string()));
        self.fail(&err);
        Err(err)
    }

    fn accept(&mut self, mut spec: DashboardSpec) -> DashboardSpec {
        let max_widgets = self.context.options.max_widgets;
        if spec.truncate_widgets(max_widgets) {
            tracing::debug!(max_widgets, "Truncated widgets");
        }
        tracing::info!(
            title = spec.display_title(),
            widgets = spec.widgets.len(),
            "Dashboard generated"
        );
        self.history.push(ConversationMessage::assistant(format!(
            "Dashboard generated: {}",
            spec.display_title()
        )));
        self.spec = Some(spec.clone());
        self.state = GenerationState::Success;
        spec
    }

    fn fail(&mut self, err: &Error) {
        tracing::error!(error = %err, "Dashboard generation failed");
        self.error = Some(format!("Failed to generate dashboard: {err}"));
        self.history.push(ConversationMessage::assistant(format!(
            "Sorry, I couldn't generate a valid dashboard. {err}"
        )));
        self.state = GenerationState::Failed;
    }
}

impl fmt::Debug for DotSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DotSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("history", &self.history.len())
            .field("has_spec", &self.spec.is_some())
            .finish_non_exhaustive()
    }
}

async fn attempt_once(
    client: &dyn ModelClient,
    request: GenerationRequest,
) -> Result<DashboardSpec> {
    let response = client.generate_dashboard(request).await?;
    parse_spec(&response.text).map_err(|e| {
        tracing::debug!(error = %e, "Rejected backend output");
        Error::InvalidSpecification(e)
    })
}
