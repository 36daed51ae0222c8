use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::config::{PlannerConfig, Provider};
use crate::error::{CompletionError, ConfigError};

/// A hosted text-generation service: prompt in, generated text out.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

/// Builds the client for the configured provider. Fails when the credential is missing.
pub fn create_client(config: &PlannerConfig) -> Result<Arc<dyn CompletionClient>, ConfigError> {
    let http = config.http_client()?;
    let client: Arc<dyn CompletionClient> = match config.provider {
        Provider::Gemini => {
            // credential() only yields None for providers that need no key
            let api_key = config.credential()?.unwrap_or_default().to_string();
            Arc::new(GeminiClient::new(http, &config.completion_url, &config.model, api_key))
        }
        Provider::Ollama => Arc::new(OllamaClient::new(http, &config.completion_url, &config.model)),
    };
    debug!(provider = ?config.provider, model = %config.model, "Created completion client");
    Ok(client)
}

async fn read_error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string())
}

// Structures matching Gemini's generateContent endpoint
#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize, Debug)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize, Debug)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize, Debug)]
struct GeminiResponsePart {
    text: Option<String>,
}

pub struct GeminiClient {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(http: Client, base_url: &str, model: &str, api_key: String) -> Self {
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            model
        );
        Self { http, endpoint, api_key }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let payload = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|source| CompletionError::Transport {
                url: self.endpoint.clone(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = read_error_body(response).await;
            error!(%status, %body, "Gemini API request failed");
            return Err(CompletionError::Status { status, body });
        }

        let parsed = response
            .json::<GeminiResponse>()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(CompletionError::EmptyResponse);
        }
        debug!(response_len = text.len(), "Received Gemini response");
        Ok(text)
    }
}

// Structures matching Ollama's /api/generate endpoint
#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool, // We want the full response, not a stream
    options: Option<serde_json::Value>,
}

#[derive(Deserialize, Debug)]
struct OllamaResponse {
    response: String,
}

pub struct OllamaClient {
    http: Client,
    endpoint: String,
    model: String,
}

impl OllamaClient {
    pub fn new(http: Client, base_url: &str, model: &str) -> Self {
        Self {
            http,
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let payload = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: None,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|source| CompletionError::Transport {
                url: self.endpoint.clone(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = read_error_body(response).await;
            error!(%status, %body, "Ollama API request failed");
            return Err(CompletionError::Status { status, body });
        }

        let parsed = response
            .json::<OllamaResponse>()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        if parsed.response.is_empty() {
            return Err(CompletionError::EmptyResponse);
        }
        debug!(response_len = parsed.response.len(), "Received Ollama response");
        Ok(parsed.response)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_endpoint_includes_model() {
        let client = GeminiClient::new(Client::new(), "http://host/", "gemini-2.0-flash", "k".into());
        assert_eq!(
            client.endpoint(),
            "http://host/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn missing_gemini_key_blocks_client_creation() {
        let config = PlannerConfig::new(Provider::Gemini);
        assert!(matches!(
            create_client(&config),
            Err(ConfigError::MissingCredential { .. })
        ));
    }

    #[test]
    fn ollama_client_needs_no_key() {
        let config = PlannerConfig::new(Provider::Ollama);
        assert!(create_client(&config).is_ok());
    }
}
