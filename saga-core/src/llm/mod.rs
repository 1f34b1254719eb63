//! Model provider abstractions.
//!
//! The engine never talks to a model API directly; it goes through the
//! [`TextGenerator`] and [`TextEmbedder`] traits so providers and test
//! stubs are interchangeable.

pub mod gemini;

use async_trait::async_trait;

/// Errors from model providers.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// API error from the provider
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Network/connection error
    #[error("Network error: {0}")]
    Network(String),

    /// Response parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The provider refused the prompt
    #[error("Prompt blocked: {0}")]
    Blocked(String),
}

/// Request for text generation.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// User prompt.
    pub prompt: String,
    /// System instruction.
    pub system: Option<String>,
    /// Model override; the provider's default applies when unset.
    pub model: Option<String>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Output token ceiling.
    pub max_output_tokens: Option<usize>,
    /// Whether the model must answer with a JSON document.
    pub json_response: bool,
}

impl GenerationRequest {
    /// Create a request with the given user prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            model: None,
            temperature: None,
            max_output_tokens: None,
            json_response: false,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
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

    /// Ask the provider for JSON output.
    pub fn with_json_response(mut self) -> Self {
        self.json_response = true;
        self
    }
}

/// Generates text from a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one generation request and return the raw response text.
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError>;
}

/// Embeds text into a fixed-dimension vector.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed one piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_request_builder() {
        let request = GenerationRequest::new("Continue the story")
            .with_system("You are a storyteller")
            .with_temperature(0.9)
            .with_json_response();

        assert_eq!(request.prompt, "Continue the story");
        assert!(request.system.is_some());
        assert_eq!(request.temperature, Some(0.9));
        assert!(request.model.is_none());
        assert!(request.json_response);
    }
}
