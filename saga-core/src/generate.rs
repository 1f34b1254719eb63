//! Structured narrative generation.
//!
//! One generation request per turn, in JSON response mode. The response
//! must carry the narrative text and may carry a state delta; anything
//! else is a malformed response and fails the turn.

use std::sync::Arc;

use serde::Deserialize;
use tracing::error;

use crate::error::{Error, Result};
use crate::llm::{GenerationRequest, TextGenerator};
use crate::segment::{null_to_default, StateUpdate};

/// Response document the model is instructed to return.
#[derive(Debug, Deserialize)]
struct GeneratedPayload {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    state_updates: StateUpdate,
}

/// A parsed narrative continuation.
#[derive(Debug, Clone)]
pub struct GeneratedSegment {
    pub text: String,
    pub state_updates: StateUpdate,
}

/// Generates the next narrative segment for a turn.
pub struct NarrativeGenerator {
    generator: Arc<dyn TextGenerator>,
    model: Option<String>,
    temperature: Option<f32>,
    max_output_tokens: Option<usize>,
}

impl NarrativeGenerator {
    /// Create a narrative generator on top of the given generator.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            model: None,
            temperature: None,
            max_output_tokens: None,
        }
    }

    /// Use a specific model for narrative requests.
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

    /// Generate a narrative continuation under the given system
    /// instruction.
    ///
    /// Upstream failure maps to the generation category; a response
    /// that parses but lacks narrative text maps to the
    /// malformed-response category. Both fail the turn.
    pub async fn generate(&self, system: &str, user_prompt: &str) -> Result<GeneratedSegment> {
        let mut request = GenerationRequest::new(user_prompt)
            .with_system(system)
            .with_json_response();
        if let Some(model) = &self.model {
            request = request.with_model(model);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_output_tokens) = self.max_output_tokens {
            request = request.with_max_output_tokens(max_output_tokens);
        }

        let raw = self.generator.generate(request).await.map_err(|e| {
            error!(error = %e, "narrative generation failed");
            Error::Generation(e.to_string())
        })?;

        parse_generated(&raw)
    }
}

fn parse_generated(raw: &str) -> Result<GeneratedSegment> {
    let json_str = extract_json(raw);

    let payload: GeneratedPayload = serde_json::from_str(json_str).map_err(|e| {
        error!(error = %e, "narrative response was not valid JSON");
        Error::MalformedResponse(format!("{e}: {json_str}"))
    })?;

    let text = payload.text.unwrap_or_default();
    if text.trim().is_empty() {
        error!("narrative response carried no text");
        return Err(Error::MalformedResponse(
            "response missing narrative text".to_string(),
        ));
    }

    Ok(GeneratedSegment {
        text,
        state_updates: payload.state_updates,
    })
}

/// Extract JSON from a response that might have markdown code blocks.
fn extract_json(text: &str) -> &str {
    let text = text.trim();

    // Handle ```json ... ``` blocks
    if let Some(start) = text.find("```json") {
        let content_start = start + 7;
        if let Some(end) = text[content_start..].find("```") {
            return text[content_start..content_start + end].trim();
        }
    }

    // Handle ``` ... ``` blocks (without json specifier)
    if let Some(start) = text.find("```") {
        let content_start = start + 3;
        if let Some(end) = text[content_start..].find("```") {
            return text[content_start..content_start + end].trim();
        }
    }

    // Just return the text as-is
    text
}
