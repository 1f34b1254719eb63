//! Minimal Pinecone vector index client.
//!
//! This crate provides a focused client for the Pinecone data plane with:
//! - Namespace-scoped vector upsert and similarity query
//! - JSON metadata attached to vectors and returned with matches
//!
//! The client talks to a single index host (the per-index endpoint shown in
//! the Pinecone console), not the control plane.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when using the Pinecone client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Index host not configured")]
    NoHost,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Pinecone index client, bound to one index host.
#[derive(Clone)]
pub struct Pinecone {
    client: reqwest::Client,
    api_key: String,
    host: String,
}

impl Pinecone {
    /// Create a new client for the given API key and index host.
    ///
    /// The host may be given with or without a scheme; a missing scheme
    /// defaults to `https://`.
    pub fn new(api_key: impl Into<String>, host: impl Into<String>) -> Self {
        let host = host.into();
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{host}")
        };
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .connect_timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_key: api_key.into(),
            host: host.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client from the PINECONE_API_KEY and PINECONE_INDEX_HOST
    /// environment variables.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("PINECONE_API_KEY").map_err(|_| Error::NoApiKey)?;
        let host = std::env::var("PINECONE_INDEX_HOST").map_err(|_| Error::NoHost)?;
        Ok(Self::new(api_key, host))
    }

    /// Upsert vectors into a namespace, returning the upserted count.
    pub async fn upsert(&self, namespace: &str, vectors: Vec<Vector>) -> Result<usize, Error> {
        let api_request = ApiUpsertRequest {
            vectors,
            namespace: namespace.to_string(),
        };
        let headers = self.build_headers()?;

        let response = self
            .client
            .post(format!("{}/vectors/upsert", self.host))
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

        let api_response: ApiUpsertResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        Ok(api_response.upserted_count)
    }

    /// Query a namespace for the nearest neighbors of a vector.
    pub async fn query(&self, namespace: &str, request: QueryRequest) -> Result<Vec<Match>, Error> {
        let api_request = ApiQueryRequest {
            namespace: namespace.to_string(),
            vector: request.vector,
            top_k: request.top_k,
            include_metadata: request.include_metadata,
            include_values: request.include_values,
        };
        let headers = self.build_headers()?;

        let response = self
            .client
            .post(format!("{}/query", self.host))
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

        let api_response: ApiQueryResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        Ok(api_response.matches)
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "Api-Key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );
        Ok(headers)
    }
}

// ============================================================================
// Public types
// ============================================================================

/// A vector to upsert, with optional JSON metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vector {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub metadata: Option<serde_json::Value>,
}

impl Vector {
    pub fn new(id: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            values,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A similarity query against one namespace.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub vector: Vec<f32>,
    pub top_k: usize,
    pub include_metadata: bool,
    pub include_values: bool,
}

impl QueryRequest {
    /// Create a new query for the given vector with the Pinecone default
    /// of ten results.
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            top_k: 10,
            include_metadata: false,
            include_values: false,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Return stored metadata with each match.
    pub fn with_metadata(mut self) -> Self {
        self.include_metadata = true;
        self
    }

    /// Return stored vector values with each match.
    pub fn with_values(mut self) -> Self {
        self.include_values = true;
        self
    }
}

/// A single query match, in descending similarity order.
#[derive(Debug, Clone, Deserialize)]
pub struct Match {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub values: Vec<f32>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiUpsertRequest {
    vectors: Vec<Vector>,
    namespace: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiQueryRequest {
    namespace: String,
    vector: Vec<f32>,
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct ApiQueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}
