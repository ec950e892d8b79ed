//! Model client contract and backend adapters.
//!
//! A [`ModelClient`] takes the assembled conversation plus advisory context
//! (the schema document and the generation constraints) and returns raw
//! text. Clients never validate; that is [`crate::spec::parse_spec`]'s job.

mod custom;
mod http;

pub use custom::CustomClient;
pub use http::HttpModelClient;

use crate::config::LlmConfig;
use crate::error::Result;
use crate::types::ConversationMessage;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Text-generation backend used by the orchestrator.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// One request/response round-trip.
    async fn generate_dashboard(&self, request: GenerationRequest) -> Result<GenerationResponse>;
}

/// Everything a backend receives for one attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub messages: Vec<ConversationMessage>,
    pub dashboard_schema: &'static Value,
    pub constraints: Constraints,
}

/// Advisory limits passed along with every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    pub max_widgets: usize,
    pub max_rows: usize,
    pub json_only: bool,
}

impl Constraints {
    pub fn new(max_widgets: usize, max_rows: usize) -> Self {
        Self {
            max_widgets,
            max_rows,
            json_only: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResponse {
    pub text: String,
}

/// Create the default HTTP-backed client for a configured provider.
pub fn create_client(llm: &LlmConfig) -> Result<Arc<dyn ModelClient>> {
    Ok(Arc::new(HttpModelClient::new(llm)?))
}
