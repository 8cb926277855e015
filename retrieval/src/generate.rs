//! Answer generation providers.
//!
//! The engine depends on text completion only through the
//! [`GenerationProvider`] contract; the shipped implementation talks to
//! a local Ollama server. Single-shot completion, no streaming.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{QueryError, Result};

/// Request for a single-shot completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The full prompt.
    pub prompt: String,

    /// Model to use; `None` means the provider default.
    pub model: Option<String>,
}

impl GenerationRequest {
    /// Create a new generation request.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
        }
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Response from a completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// The generated text.
    pub text: String,

    /// Model that produced it.
    pub model: String,
}

/// Trait for generation providers.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Name of this provider.
    fn name(&self) -> &str;

    /// Default model for this provider.
    fn default_model(&self) -> &str;

    /// Produce a completion for the given prompt.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse>;
}

/// Generation provider backed by a local Ollama server.
pub struct OllamaGenerator {
    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Default model.
    default_model: String,
}

impl OllamaGenerator {
    /// Create a provider against the default local endpoint.
    pub fn new() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            client: reqwest::Client::new(),
            default_model: "llama3.2:3b".to_string(),
        }
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }
}

impl Default for OllamaGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationProvider for OllamaGenerator {
    fn name(&self) -> &str {
        "ollama"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let model = request.model.unwrap_or_else(|| self.default_model.clone());

        debug!("Generating completion with model: {model}");

        let body = serde_json::json!({
            "model": model,
            "prompt": request.prompt,
            "stream": false,
        });

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| QueryError::Generation(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(QueryError::Generation(format!(
                "generation API error: {error_text}"
            )));
        }

        let result: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| QueryError::Generation(e.to_string()))?;

        info!("Generated {} characters", result.response.len());

        Ok(GenerationResponse {
            text: result.response,
            model,
        })
    }
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// Assemble the synthesis prompt from query, retrieved context, and any
/// prior conversation turns.
pub fn build_prompt(query: &str, context: &str, history: Option<&str>) -> String {
    let mut prompt = String::from(
        "You are an assistant reading pull-request notification records.\n\n",
    );

    if let Some(history) = history {
        if !history.is_empty() {
            prompt.push_str("Conversation so far:\n");
            prompt.push_str(history);
            prompt.push_str("\n\n");
        }
    }

    prompt.push_str("User query:\n");
    prompt.push_str(query);
    prompt.push_str("\n\nRelevant records:\n");
    prompt.push_str(context);
    prompt.push_str(
        "\n\nAnswer the user's question concisely by analyzing these records. \
         Extract important details such as what changed, which commits and files \
         were involved, and any actions requested. Return a clean explanation.\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_ollama_generate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(
                serde_json::json!({"model": "llama3.2:3b", "stream": false}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "PR 8040 fixed the session expiry crash."
            })))
            .mount(&server)
            .await;

        let provider = OllamaGenerator::new().with_base_url(server.uri());
        let response = provider
            .generate(GenerationRequest::new("What did PR 8040 do?"))
            .await
            .unwrap();

        assert_eq!(response.text, "PR 8040 fixed the session expiry crash.");
    }

    #[tokio::test]
    async fn test_ollama_generate_failure_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let provider = OllamaGenerator::new().with_base_url(server.uri());
        let result = provider
            .generate(GenerationRequest::new("anything"))
            .await;

        assert!(matches!(result, Err(QueryError::Generation(_))));
    }

    #[test]
    fn test_build_prompt_includes_sections() {
        let prompt = build_prompt("what changed?", "--- RESULT 1 ---", Some("USER: hi"));

        assert!(prompt.contains("Conversation so far:"));
        assert!(prompt.contains("USER: hi"));
        assert!(prompt.contains("User query:\nwhat changed?"));
        assert!(prompt.contains("--- RESULT 1 ---"));
    }

    #[test]
    fn test_build_prompt_without_history() {
        let prompt = build_prompt("q", "ctx", None);
        assert!(!prompt.contains("Conversation so far:"));
    }
}
