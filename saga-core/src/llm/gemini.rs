//! Gemini-backed generation and embedding.

use async_trait::async_trait;
use gemini::Gemini;

use super::{GenerationRequest, LlmError, TextEmbedder, TextGenerator};

impl From<gemini::Error> for LlmError {
    fn from(error: gemini::Error) -> Self {
        match error {
            gemini::Error::NoApiKey => {
                LlmError::Configuration("API key not configured".to_string())
            }
            gemini::Error::Network(message) => LlmError::Network(message),
            gemini::Error::Api { status, message } => LlmError::Api { status, message },
            gemini::Error::Parse(message) => LlmError::Parse(message),
            gemini::Error::Config(message) => LlmError::Configuration(message),
            gemini::Error::Blocked(reason) => LlmError::Blocked(reason),
        }
    }
}

#[async_trait]
impl TextGenerator for Gemini {
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError> {
        let mut api_request = gemini::Request::new(request.prompt);
        if let Some(system) = request.system {
            api_request = api_request.with_system(system);
        }
        if let Some(model) = request.model {
            api_request = api_request.with_model(model);
        }
        if let Some(temperature) = request.temperature {
            api_request = api_request.with_temperature(temperature);
        }
        if let Some(max_output_tokens) = request.max_output_tokens {
            api_request = api_request.with_max_output_tokens(max_output_tokens);
        }
        if request.json_response {
            api_request = api_request.with_json_response();
        }

        let response = Gemini::generate(self, api_request).await?;
        Ok(response.text)
    }
}

#[async_trait]
impl TextEmbedder for Gemini {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        Ok(Gemini::embed(self, text).await?)
    }
}
