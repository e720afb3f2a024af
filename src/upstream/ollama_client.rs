use crate::models::{GenerateRequest, GenerateResponse, ModelInfo, ModelsResponse, StreamChunk};
use crate::upstream::{ChunkStream, GatewayError};
use axum::http::StatusCode;
use bytes::Bytes;
use futures::StreamExt;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const GENERATE_TIMEOUT: Duration = Duration::from_secs(60);
pub const TAGS_TIMEOUT: Duration = Duration::from_secs(10);
pub const VERSION_TIMEOUT: Duration = Duration::from_secs(5);
pub const DELETE_TIMEOUT: Duration = Duration::from_secs(30);
pub const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const CONNECTIVITY_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a tag-listing probe, kept structured so the health and
/// connectivity endpoints can render it as data instead of an HTTP error.
#[derive(Debug)]
pub enum ProbeFailure {
    Status { status: u16, body: String },
    Transport(String),
    Other(String),
}

/// All outbound calls to the Ollama daemon. One shared reqwest client,
/// per-call total timeouts fixed by endpoint.
#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Non-streaming generate: forward the prompt, then require `model`,
    /// `response` and `done` in the 200 payload before passing them through.
    pub async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse, GatewayError> {
        let url = self.endpoint("/api/generate");
        debug!("forwarding generate for model '{}' to {}", req.model, url);
        let body = json!({ "model": req.model, "prompt": req.prompt, "stream": false });
        let response = self
            .client
            .post(&url)
            .timeout(GENERATE_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::ModelNotFound {
                model: req.model.clone(),
            });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamRejected {
                status: status.as_u16(),
                body: text,
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Internal(format!("failed to decode upstream body: {}", e)))?;
        reshape_generate(&payload)
    }

    /// Streaming generate: same status handling up front, then the upstream
    /// NDJSON byte stream is line-buffered, reshaped chunk by chunk, and
    /// re-emitted as NDJSON.
    pub async fn generate_stream(&self, req: &GenerateRequest) -> Result<ChunkStream, GatewayError> {
        let url = self.endpoint("/api/generate");
        debug!("forwarding streaming generate for model '{}' to {}", req.model, url);
        let body = json!({ "model": req.model, "prompt": req.prompt, "stream": true });
        let response = self
            .client
            .post(&url)
            .timeout(GENERATE_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::ModelNotFound {
                model: req.model.clone(),
            });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamRejected {
                status: status.as_u16(),
                body: text,
            });
        }

        let fallback_model = req.model.clone();
        let stream = async_stream::stream! {
            let mut upstream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = upstream.next().await {
                let chunk = match chunk_result {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(GatewayError::Unreachable(e.to_string()));
                        return;
                    }
                };

                let chunk_str = match std::str::from_utf8(&chunk) {
                    Ok(s) => s,
                    Err(e) => {
                        yield Err(GatewayError::Internal(format!("UTF-8 decode error: {}", e)));
                        return;
                    }
                };

                buffer.push_str(chunk_str);

                // Process complete lines
                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim().to_string();
                    buffer.drain(..=line_end);

                    if line.is_empty() {
                        continue;
                    }

                    let value: Value = match serde_json::from_str(&line) {
                        Ok(value) => value,
                        Err(e) => {
                            yield Err(GatewayError::Internal(format!("JSON parse error: {}", e)));
                            return;
                        }
                    };

                    let done = value.get("done").and_then(Value::as_bool).unwrap_or(false);
                    let reshaped = StreamChunk {
                        model: value
                            .get("model")
                            .and_then(Value::as_str)
                            .unwrap_or(&fallback_model)
                            .to_string(),
                        response: value
                            .get("response")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        done,
                    };

                    let mut out = match serde_json::to_string(&reshaped) {
                        Ok(out) => out,
                        Err(e) => {
                            yield Err(GatewayError::Internal(e.to_string()));
                            return;
                        }
                    };
                    out.push('\n');
                    yield Ok(Bytes::from(out));

                    if done {
                        return;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    /// Tag listing, reshaped: `modified_at` becomes `modified`, missing names
    /// default to "unknown", upstream ordering is preserved.
    pub async fn list_models(&self) -> Result<ModelsResponse, GatewayError> {
        let url = self.endpoint("/api/tags");
        let response = self
            .client
            .get(&url)
            .timeout(TAGS_TIMEOUT)
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamRejected {
                status: status.as_u16(),
                body: text,
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Internal(format!("failed to decode upstream body: {}", e)))?;
        let models: Vec<ModelInfo> = payload
            .get("models")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().map(model_info_from).collect())
            .unwrap_or_default();

        Ok(ModelsResponse {
            count: models.len(),
            models,
        })
    }

    /// Version info, passed through verbatim.
    pub async fn version(&self) -> Result<Value, GatewayError> {
        let url = self.endpoint("/api/version");
        let response = self
            .client
            .get(&url)
            .timeout(VERSION_TIMEOUT)
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamRejected {
                status: status.as_u16(),
                body: text,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Internal(format!("failed to decode upstream body: {}", e)))
    }

    /// Forwarded delete. Upstream delete responses carry no payload contract,
    /// so only the status is inspected.
    pub async fn delete_model(&self, name: &str) -> Result<(), GatewayError> {
        let url = self.endpoint("/api/delete");
        debug!("forwarding delete for model '{}' to {}", name, url);
        let response = self
            .client
            .delete(&url)
            .timeout(DELETE_TIMEOUT)
            .json(&json!({ "name": name }))
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::ModelNotFound {
                model: name.to_string(),
            });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamRejected {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(())
    }

    /// Connectivity probe against the tag listing. Succeeds only on HTTP 200;
    /// every failure comes back classified instead of raised.
    pub async fn probe_tags(&self, timeout: Duration) -> Result<(), ProbeFailure> {
        let url = self.endpoint("/api/tags");
        match self.client.get(&url).timeout(timeout).send().await {
            Ok(response) if response.status() == StatusCode::OK => Ok(()),
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                Err(ProbeFailure::Status { status, body })
            }
            Err(e) if e.is_builder() => Err(ProbeFailure::Other(e.to_string())),
            Err(e) => Err(ProbeFailure::Transport(e.to_string())),
        }
    }
}

// Errors out of send() are transport failures (refused, DNS, timeout) unless
// the request itself never left the builder.
fn send_error(e: reqwest::Error) -> GatewayError {
    if e.is_builder() {
        GatewayError::Internal(e.to_string())
    } else {
        GatewayError::Unreachable(e.to_string())
    }
}

fn reshape_generate(payload: &Value) -> Result<GenerateResponse, GatewayError> {
    let model = payload
        .get("model")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed_field("model"))?;
    let response = payload
        .get("response")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed_field("response"))?;
    let done = payload
        .get("done")
        .and_then(Value::as_bool)
        .ok_or_else(|| malformed_field("done"))?;
    Ok(GenerateResponse {
        model: model.to_string(),
        response: response.to_string(),
        done,
    })
}

fn malformed_field(field: &str) -> GatewayError {
    GatewayError::MalformedResponse(format!("missing or invalid '{}' field", field))
}

fn model_info_from(entry: &Value) -> ModelInfo {
    ModelInfo {
        name: entry
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        size: entry.get("size").and_then(size_as_string),
        modified: entry
            .get("modified_at")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

// Ollama reports size as a byte count; older builds have been seen returning
// strings, so both are accepted.
fn size_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
