//! Minimal Google Gemini API client.
//!
//! This crate provides a focused client for the Gemini REST API with:
//! - Non-streaming content generation with system instructions
//! - JSON response mode for structured output
//! - Text embeddings via the embedding models

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

/// Output dimension of the default embedding model.
pub const EMBEDDING_DIM: usize = 768;

/// Errors that can occur when using the Gemini client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Prompt blocked: {0}")]
    Blocked(String),
}

/// Gemini API client.
#[derive(Clone)]
pub struct Gemini {
    client: reqwest::Client,
    api_key: String,
    model: String,
    embedding_model: String,
}

impl Gemini {
    /// Create a new Gemini client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .connect_timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }

    /// Create a Gemini client from the GEMINI_API_KEY environment variable.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| Error::NoApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Set the default generation model for this client.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the embedding model for this client.
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Send a generation request and return the full response.
    pub async fn generate(&self, request: Request) -> Result<Response, Error> {
        let model = request.model.clone().unwrap_or_else(|| self.model.clone());
        let api_request = build_api_request(&request);
        let headers = self.build_headers()?;

        let response = self
            .client
            .post(format!("{API_BASE}/models/{model}:generateContent"))
            .headers(headers)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let api_response: ApiGenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        parse_response(api_response)
    }

    /// Embed a piece of text and return its vector.
    pub async fn embed(&self, text: impl Into<String>) -> Result<Vec<f32>, Error> {
        let model = &self.embedding_model;
        let api_request = ApiEmbedRequest {
            model: format!("models/{model}"),
            content: ApiContent {
                role: None,
                parts: vec![ApiPart { text: text.into() }],
            },
        };
        let headers = self.build_headers()?;

        let response = self
            .client
            .post(format!("{API_BASE}/models/{model}:embedContent"))
            .headers(headers)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let api_response: ApiEmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        Ok(api_response.embedding.values)
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );
        Ok(headers)
    }
}

// ============================================================================
// Public types
// ============================================================================

/// A generation request to send to Gemini.
#[derive(Debug, Clone)]
pub struct Request {
    pub model: Option<String>,
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<usize>,
    pub json_response: bool,
}

impl Request {
    /// Create a new request with the given user prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            model: None,
            system: None,
            prompt: prompt.into(),
            temperature: None,
            max_output_tokens: None,
            json_response: false,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: usize) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Request `application/json` output from the model.
    pub fn with_json_response(mut self) -> Self {
        self.json_response = true;
        self
    }
}

/// A generation response from Gemini.
#[derive(Debug, Clone)]
pub struct Response {
    pub text: String,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Other,
}

/// Token usage information.
#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

// ============================================================================
// Internal API types
// ============================================================================

fn build_api_request(request: &Request) -> ApiGenerateRequest {
    let generation_config = if request.temperature.is_some()
        || request.max_output_tokens.is_some()
        || request.json_response
    {
        Some(ApiGenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
            response_mime_type: request
                .json_response
                .then(|| "application/json".to_string()),
        })
    } else {
        None
    };

    ApiGenerateRequest {
        contents: vec![ApiContent {
            role: Some("user".to_string()),
            parts: vec![ApiPart {
                text: request.prompt.clone(),
            }],
        }],
        system_instruction: request.system.as_ref().map(|s| ApiContent {
            role: None,
            parts: vec![ApiPart { text: s.clone() }],
        }),
        generation_config,
    }
}

fn parse_response(api_response: ApiGenerateResponse) -> Result<Response, Error> {
    if let Some(feedback) = &api_response.prompt_feedback {
        if let Some(reason) = &feedback.block_reason {
            return Err(Error::Blocked(reason.clone()));
        }
    }

    let candidate = api_response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::Parse("response contained no candidates".to_string()))?;

    let text = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let finish_reason = match candidate.finish_reason.as_deref() {
        Some("STOP") | None => FinishReason::Stop,
        Some("MAX_TOKENS") => FinishReason::MaxTokens,
        Some("SAFETY") => FinishReason::Safety,
        Some("RECITATION") => FinishReason::Recitation,
        Some(_) => FinishReason::Other,
    };

    let usage = api_response
        .usage_metadata
        .map(|u| Usage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
        })
        .unwrap_or_default();

    Ok(Response {
        text,
        finish_reason,
        usage,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerateRequest {
    contents: Vec<ApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<ApiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerateResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<ApiPromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<ApiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
}

#[derive(Debug, Serialize)]
struct ApiEmbedRequest {
    model: String,
    content: ApiContent,
}

#[derive(Debug, Deserialize)]
struct ApiEmbedResponse {
    embedding: ApiEmbedding,
}

#[derive(Debug, Deserialize)]
struct ApiEmbedding {
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = Gemini::new("test-key");
        assert_eq!(client.model, DEFAULT_MODEL);
        assert_eq!(client.embedding_model, DEFAULT_EMBEDDING_MODEL);
    }

    #[test]
    fn test_client_with_model() {
        let client = Gemini::new("test-key").with_model("gemini-1.5-pro");
        assert_eq!(client.model, "gemini-1.5-pro");
    }

    #[test]
    fn test_request_builder() {
        let request = Request::new("Hello")
            .with_system("You are a storyteller")
            .with_temperature(0.7)
            .with_max_output_tokens(1000)
            .with_json_response();

        assert_eq!(request.prompt, "Hello");
        assert!(request.system.is_some());
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_output_tokens, Some(1000));
        assert!(request.json_response);
    }

    #[test]
    fn test_api_request_serialization() {
        let request = Request::new("Hello")
            .with_system("Be brief")
            .with_json_response();
        let api_request = build_api_request(&request);
        let value = serde_json::to_value(&api_request).unwrap();

        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "Hello");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "Be brief");
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_api_request_omits_empty_config() {
        let api_request = build_api_request(&Request::new("Hello"));
        let value = serde_json::to_value(&api_request).unwrap();

        assert!(value.get("systemInstruction").is_none());
        assert!(value.get("generationConfig").is_none());
    }

    #[test]
    fn test_parse_generate_response() {
        let raw = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Once upon a time"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 5}
        }"#;
        let api_response: ApiGenerateResponse = serde_json::from_str(raw).unwrap();
        let response = parse_response(api_response).unwrap();

        assert_eq!(response.text, "Once upon a time");
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.usage.input_tokens, 12);
        assert_eq!(response.usage.output_tokens, 5);
    }

    #[test]
    fn test_parse_blocked_response() {
        let raw = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let api_response: ApiGenerateResponse = serde_json::from_str(raw).unwrap();
        let err = parse_response(api_response).unwrap_err();

        assert!(matches!(err, Error::Blocked(reason) if reason == "SAFETY"));
    }

    #[test]
    fn test_parse_empty_response() {
        let raw = r#"{"candidates": []}"#;
        let api_response: ApiGenerateResponse = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            parse_response(api_response),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_parse_embed_response() {
        let raw = r#"{"embedding": {"values": [0.1, -0.2, 0.3]}}"#;
        let api_response: ApiEmbedResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(api_response.embedding.values, vec![0.1, -0.2, 0.3]);
    }
}
