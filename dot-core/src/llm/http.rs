//! HTTP adapters for hosted and local chat backends.

use super::{GenerationRequest, GenerationResponse, ModelClient};
use crate::config::{LlmConfig, LlmProvider};
use crate::error::{Error, Result};
use crate::types::{ConversationMessage, Role};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};
use std::time::Duration;

const CLAUDE_MAX_TOKENS: u32 = 4096;

/// [`ModelClient`] speaking the native chat API of one provider.
#[derive(Debug)]
pub struct HttpModelClient {
    model: String,
    provider: LlmProvider,
    endpoint: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl HttpModelClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| config.provider.default_endpoint().to_string());
        let api_key = match config.provider.api_key_env() {
            None => None,
            Some(var) => config
                .api_key
                .clone()
                .or_else(|| std::env::var(var).ok()),
        };

        if let Some(var) = config.provider.api_key_env() {
            if api_key.is_none() {
                return Err(Error::Config(format!(
                    "llm.api_key (or {var}) is required"
                )));
            }
        }

        let timeout_secs = config.timeout_secs.max(1);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Llm(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            model: config.model.clone(),
            provider: config.provider,
            endpoint,
            api_key,
            http,
        })
    }

    fn url(&self) -> String {
        let base = self.endpoint.trim_end_matches('/');
        match self.provider {
            LlmProvider::Ollama => format!("{base}/api/chat"),
            LlmProvider::Claude => format!("{base}/v1/messages"),
            LlmProvider::OpenAI => format!("{base}/v1/chat/completions"),
            LlmProvider::Gemini => {
                format!("{base}/v1beta/models/{}:generateContent", self.model)
            }
        }
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let key = self.api_key.as_deref().unwrap_or_default();
        match self.provider {
            LlmProvider::Ollama => {}
            LlmProvider::Claude => {
                headers.insert(
                    "x-api-key",
                    HeaderValue::from_str(key)
                        .map_err(|e| Error::Llm(format!("invalid claude api key header: {e}")))?,
                );
                headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
            }
            LlmProvider::OpenAI => {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {key}"))
                        .map_err(|e| Error::Llm(format!("invalid auth header: {e}")))?,
                );
            }
            LlmProvider::Gemini => {
                headers.insert(
                    "x-goog-api-key",
                    HeaderValue::from_str(key)
                        .map_err(|e| Error::Llm(format!("invalid gemini api key header: {e}")))?,
                );
            }
        }
        Ok(headers)
    }

    fn label(&self) -> &'static str {
        match self.provider {
            LlmProvider::Ollama => "ollama",
            LlmProvider::Claude => "claude",
            LlmProvider::OpenAI => "openai",
            LlmProvider::Gemini => "gemini",
        }
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn generate_dashboard(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let label = self.label();
        let body = request_body(self.provider, &self.model, &request);

        let resp = self
            .http
            .post(self.url())
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("{label} request failed: {e}")))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::Llm(format!("{label} read body failed: {e}")))?;
        if !status.is_success() {
            return Err(Error::Llm(format!(
                "{label} returned {}: {}",
                status.as_u16(),
                text
            )));
        }

        let json: Value = serde_json::from_str(&text)
            .map_err(|e| Error::Llm(format!("{label} returned malformed JSON: {e}")))?;
        let text = response_text(self.provider, &json)?;
        tracing::debug!(provider = label, chars = text.len(), "Backend responded");
        Ok(GenerationResponse { text })
    }
}

/// Split system messages out of the conversation. Several system messages
/// are joined with blank lines.
fn split_system(messages: &[ConversationMessage]) -> (Option<String>, Vec<&ConversationMessage>) {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    let chat = messages.iter().filter(|m| m.role != Role::System).collect();
    let system = (!system.is_empty()).then(|| system.join("\n\n"));
    (system, chat)
}

fn chat_messages(messages: &[ConversationMessage]) -> Vec<Value> {
    messages
        .iter()
        .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
        .collect()
}

fn request_body(provider: LlmProvider, model: &str, request: &GenerationRequest) -> Value {
    let json_only = request.constraints.json_only;
    match provider {
        LlmProvider::Ollama => {
            let mut body = json!({
                "model": model,
                "messages": chat_messages(&request.messages),
                "stream": false,
            });
            if json_only {
                body["format"] = json!("json");
            }
            body
        }
        LlmProvider::Claude => {
            let (system, chat) = split_system(&request.messages);
            let mut body = json!({
                "model": model,
                "max_tokens": CLAUDE_MAX_TOKENS,
                "temperature": 0,
                "messages": chat
                    .iter()
                    .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
                    .collect::<Vec<_>>(),
            });
            if let Some(system) = system {
                body["system"] = json!(system);
            }
            body
        }
        LlmProvider::OpenAI => {
            let mut body = json!({
                "model": model,
                "temperature": 0,
                "messages": chat_messages(&request.messages),
            });
            if json_only {
                body["response_format"] = json!({ "type": "json_object" });
            }
            body
        }
        LlmProvider::Gemini => {
            let (system, chat) = split_system(&request.messages);
            let contents: Vec<Value> = chat
                .iter()
                .map(|m| {
                    let role = if m.role == Role::Assistant { "model" } else { "user" };
                    json!({ "role": role, "parts": [{ "text": m.content }] })
                })
                .collect();
            let mut body = json!({ "contents": contents });
            if let Some(system) = system {
                body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
            }
            if json_only {
                body["generationConfig"] = json!({ "responseMimeType": "application/json" });
            }
            body
        }
    }
}

fn response_text(provider: LlmProvider, json: &Value) -> Result<String> {
    match provider {
        LlmProvider::Ollama => json
            .get("message")
            .and_then(|v| v.get("content"))
            .and_then(|v| v.as_str())
            .map(ToString::to_string)
            .ok_or_else(|| Error::Llm("ollama response missing message.content".to_string())),
        LlmProvider::Claude => json
            .get("content")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|v| v.get("text"))
            .and_then(|v| v.as_str())
            .map(ToString::to_string)
            .ok_or_else(|| Error::Llm("claude response missing content[0].text".to_string())),
        LlmProvider::OpenAI => json
            .get("choices")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|v| v.get("message"))
            .and_then(|v| v.get("content"))
            .and_then(|v| v.as_str())
            .map(ToString::to_string)
            .ok_or_else(|| {
                Error::Llm("openai response missing choices[0].message.content".to_string())
            }),
        LlmProvider::Gemini => json
            .get("candidates")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|v| v.get("content"))
            .and_then(|v| v.get("parts"))
            .and_then(|v| v.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                Error::Llm("gemini response missing candidates[0].content.parts".to_string())
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Constraints;
    use crate::spec::dashboard_schema;

    fn request() -> GenerationRequest {
        GenerationRequest {
            messages: vec![
                ConversationMessage::system("Be a dashboard generator."),
                ConversationMessage::user("show revenue"),
                ConversationMessage::assistant("Dashboard generated: Revenue"),
                ConversationMessage::user("Current visible data: {}"),
            ],
            dashboard_schema: dashboard_schema(),
            constraints: Constraints::new(6, 200),
        }
    }

    fn llm_config(provider: LlmProvider) -> LlmConfig {
        LlmConfig {
            provider,
            model: "test-model".to_string(),
            endpoint: Some("http://localhost:9999/".to_string()),
            api_key: Some("secret".to_string()),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_urls_per_provider() {
        let url = |p| HttpModelClient::new(&llm_config(p)).unwrap().url();
        assert_eq!(url(LlmProvider::Ollama), "http://localhost:9999/api/chat");
        assert_eq!(url(LlmProvider::Claude), "http://localhost:9999/v1/messages");
        assert_eq!(
            url(LlmProvider::OpenAI),
            "http://localhost:9999/v1/chat/completions"
        );
        assert_eq!(
            url(LlmProvider::Gemini),
            "http://localhost:9999/v1beta/models/test-model:generateContent"
        );
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let config = LlmConfig {
            api_key: None,
            ..llm_config(LlmProvider::Ollama)
        };
        let client = HttpModelClient::new(&config).unwrap();
        assert!(client.headers().unwrap().get("x-api-key").is_none());
    }

    #[test]
    fn test_claude_body_lifts_system() {
        let body = request_body(LlmProvider::Claude, "claude-x", &request());
        assert_eq!(body["system"], "Be a dashboard generator.");
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["role"], "assistant");
    }

    #[test]
    fn test_openai_and_ollama_keep_system_inline() {
        let body = request_body(LlmProvider::OpenAI, "gpt", &request());
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["response_format"]["type"], "json_object");

        let body = request_body(LlmProvider::Ollama, "llama", &request());
        assert_eq!(body["messages"].as_array().unwrap().len(), 4);
        assert_eq!(body["format"], "json");
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn test_gemini_body_renames_assistant_role() {
        let body = request_body(LlmProvider::Gemini, "gemini", &request());
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "Be a dashboard generator."
        );
        let roles: Vec<&str> = body["contents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["user", "model", "user"]);
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_response_text_extraction() {
        assert_eq!(
            response_text(
                LlmProvider::Ollama,
                &json!({"message": {"role": "assistant", "content": "a"}})
            )
            .unwrap(),
            "a"
        );
        assert_eq!(
            response_text(LlmProvider::Claude, &json!({"content": [{"text": "b"}]})).unwrap(),
            "b"
        );
        assert_eq!(
            response_text(
                LlmProvider::OpenAI,
                &json!({"choices": [{"message": {"content": "c"}}]})
            )
            .unwrap(),
            "c"
        );
        assert_eq!(
            response_text(
                LlmProvider::Gemini,
                &json!({"candidates": [{"content": {"parts": [{"text": "d"}, {"text": "e"}]}}]})
            )
            .unwrap(),
            "de"
        );
    }

    #[test]
    fn test_missing_text_is_llm_error() {
        let err = response_text(LlmProvider::Claude, &json!({"content": []})).unwrap_err();
        assert!(matches!(err, Error::Llm(_)));
        let err = response_text(LlmProvider::Gemini, &json!({"candidates": []})).unwrap_err();
        assert!(matches!(err, Error::Llm(_)));
    }
}
