//! Entity extraction from user input.
//!
//! A single cheap generation request pulls out the names the retrieval
//! query should emphasize. Extraction is strictly best-effort: a turn
//! must never fail because this step did.

use std::sync::Arc;

use tracing::warn;

use crate::llm::{GenerationRequest, TextGenerator};

/// Extracts key entity names from free-form text.
pub struct EntityExtractor {
    generator: Arc<dyn TextGenerator>,
    model: Option<String>,
}

impl EntityExtractor {
    /// Create an extractor on top of the given generator.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            model: None,
        }
    }

    /// Use a specific model for extraction requests.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Extract entity names from the given text.
    ///
    /// Blank input short-circuits to an empty list without an upstream
    /// call. Upstream failures are logged and also yield an empty list.
    pub async fn extract(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let prompt = format!(
            "Extract key entities (characters, locations, items, events) \
             from the following text. Return them as a comma-separated list. \
             If none, return \"none\": \"{text}\""
        );

        let mut request = GenerationRequest::new(prompt);
        if let Some(model) = &self.model {
            request = request.with_model(model);
        }

        match self.generator.generate(request).await {
            Ok(response) => parse_entities(&response),
            Err(e) => {
                warn!(error = %e, "entity extraction failed, continuing without entities");
                Vec::new()
            }
        }
    }
}

/// Parse a comma-separated entity list: trim each name, drop empties,
/// and keep the first occurrence of each duplicate.
fn parse_entities(response: &str) -> Vec<String> {
    let trimmed = response.trim();
    if trimmed.eq_ignore_ascii_case("none") {
        return Vec::new();
    }

    let mut entities: Vec<String> = Vec::new();
    for token in trimmed.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if !entities.iter().any(|existing| existing == token) {
            entities.push(token.to_string());
        }
    }
    entities
}
