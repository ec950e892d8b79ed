use super::{GenerationRequest, GenerationResponse, ModelClient};
use crate::error::Result;
use crate::types::ConversationMessage;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;

type GenerateFn = dyn Fn(Vec<ConversationMessage>) -> BoxFuture<'static, Result<String>> + Send + Sync;

/// Adapts any async callback into a [`ModelClient`].
///
/// The callback sees only the messages; schema and constraints are dropped.
/// Its errors propagate unchanged.
pub struct CustomClient {
    generate: Box<GenerateFn>,
}

impl CustomClient {
    pub fn new<F, Fut>(generate: F) -> Self
    where
        F: Fn(Vec<ConversationMessage>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        Self {
            generate: Box::new(move |messages| generate(messages).boxed()),
        }
    }
}

impl std::fmt::Debug for CustomClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomClient").finish_non_exhaustive()
    }
}

#[async_trait]
impl ModelClient for CustomClient {
    async fn generate_dashboard(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let text = (self.generate)(request.messages).await?;
        Ok(GenerationResponse { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::llm::Constraints;
    use crate::spec::dashboard_schema;
    use std::sync::{Arc, Mutex};

    fn request(messages: Vec<ConversationMessage>) -> GenerationRequest {
        GenerationRequest {
            messages,
            dashboard_schema: dashboard_schema(),
            constraints: Constraints::new(6, 200),
        }
    }

    #[tokio::test]
    async fn test_passes_messages_and_returns_text() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let client = CustomClient::new(move |messages| {
            let sink = Arc::clone(&sink);
            async move {
                *sink.lock().unwrap() = messages;
                Ok("{\"version\":\"0.1\"}".to_string())
            }
        });

        let messages = vec![
            ConversationMessage::system("You are a dashboard generator."),
            ConversationMessage::user("Show me a dashboard."),
        ];
        let response = client
            .generate_dashboard(request(messages.clone()))
            .await
            .unwrap();

        assert_eq!(response.text, "{\"version\":\"0.1\"}");
        assert_eq!(*seen.lock().unwrap(), messages);
    }

    #[tokio::test]
    async fn test_propagates_callback_errors() {
        let client = CustomClient::new(|_| async { Err(Error::Llm("API error".to_string())) });
        let err = client
            .generate_dashboard(request(vec![ConversationMessage::user("x")]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "API error");
    }
}
