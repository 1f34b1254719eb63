//! Error types for the story engine.
//!
//! Uses thiserror for ergonomic error definition. Display strings are
//! stable per category so callers can show them directly; upstream detail
//! is carried in the variant payload and written to the logs at the
//! failure site, never rendered to the caller.

/// Main error type for story engine operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required caller input was missing or blank. Raised before any
    /// external call is made.
    #[error("missing required field: {0}")]
    Validation(&'static str),

    /// The embedding backend failed or returned an unusable vector.
    #[error("embedding request failed")]
    Embedding(String),

    /// The generative backend failed outright.
    #[error("narrative generation failed")]
    Generation(String),

    /// The generative backend answered, but not with the required
    /// structure.
    #[error("narrative response did not match the expected structure")]
    MalformedResponse(String),

    /// A knowledge item could not be indexed.
    #[error("failed to index knowledge item")]
    Indexing(String),

    /// A story segment could not be durably recorded.
    #[error("failed to persist story segment")]
    Persistence(String),
}

impl Error {
    /// Upstream detail for diagnostics. Not part of the caller-facing
    /// message.
    pub fn detail(&self) -> &str {
        match self {
            Error::Validation(field) => field,
            Error::Embedding(detail)
            | Error::Generation(detail)
            | Error::MalformedResponse(detail)
            | Error::Indexing(detail)
            | Error::Persistence(detail) => detail,
        }
    }
}

/// Result type alias for story engine operations.
pub type Result<T> = std::result::Result<T, Error>;
