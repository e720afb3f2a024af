pub mod config;

use serde::{Deserialize, Serialize};

/// Inbound body for `POST /api/generate`.
#[derive(Deserialize, Debug)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default)]
    pub stream: bool,
}

/// Reshaped generate result: the three fields the gateway contract guarantees,
/// regardless of whatever extra timing/context fields upstream attaches.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct GenerateResponse {
    pub model: String,
    pub response: String,
    pub done: bool,
}

/// One NDJSON line of a streaming generate, reshaped to the same contract.
#[derive(Serialize, Deserialize, Debug)]
pub struct StreamChunk {
    pub model: String,
    pub response: String,
    pub done: bool,
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub upstream_connected: bool,
    pub upstream_url: String,
}

#[derive(Serialize, Debug)]
pub struct ConnectivityResponse {
    pub connected: bool,
    pub upstream_url: String,
    pub response_time_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// One entry of the reshaped tag listing. Upstream's `modified_at` becomes
/// `modified`; a numeric `size` is normalized to its decimal string form.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ModelInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub count: usize,
}
