use crate::models::{ConnectivityResponse, GenerateRequest, HealthResponse, ModelsResponse};
use crate::upstream::GatewayError;
use crate::upstream::ollama_client::{
    CONNECTIVITY_PROBE_TIMEOUT, HEALTH_PROBE_TIMEOUT, OllamaClient, ProbeFailure,
};
use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::{Value, json};
use std::time::Instant;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub client: OllamaClient,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/generate", post(generate))
        .route("/health", get(health))
        .route("/api/connectivity", get(connectivity))
        .route("/api/models", get(list_models))
        .route("/api/version", get(version))
        .route("/api/model/{name}", delete(delete_model))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "welcome to the ollama gateway" }))
}

async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Response, GatewayError> {
    if req.model.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "model must not be empty".to_string(),
        ));
    }
    if req.prompt.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "prompt must not be empty".to_string(),
        ));
    }

    info!("generate request for model '{}' (stream={})", req.model, req.stream);

    if req.stream {
        let chunks = state.client.generate_stream(&req).await?;
        Ok((
            [(header::CONTENT_TYPE, "application/x-ndjson")],
            Body::from_stream(chunks),
        )
            .into_response())
    } else {
        let response = state.client.generate(&req).await?;
        Ok(Json(response).into_response())
    }
}

// Always 200: upstream trouble is reported as a field, never as a failure.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let upstream_connected = state.client.probe_tags(HEALTH_PROBE_TIMEOUT).await.is_ok();
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        upstream_connected,
        upstream_url: state.client.base_url().to_string(),
    })
}

// Always 200; elapsed time is measured around the probe on every path.
async fn connectivity(State(state): State<AppState>) -> Json<ConnectivityResponse> {
    let started = Instant::now();
    let outcome = state.client.probe_tags(CONNECTIVITY_PROBE_TIMEOUT).await;
    let response_time_ms = round_ms(started.elapsed().as_secs_f64() * 1000.0);

    let (connected, error_message) = match outcome {
        Ok(()) => (true, None),
        Err(ProbeFailure::Status { status, body }) => {
            (false, Some(format!("HTTP {}: {}", status, body)))
        }
        Err(ProbeFailure::Transport(e)) => (false, Some(format!("connection error: {}", e))),
        Err(ProbeFailure::Other(e)) => (false, Some(format!("unexpected error: {}", e))),
    };

    Json(ConnectivityResponse {
        connected,
        upstream_url: state.client.base_url().to_string(),
        response_time_ms,
        error_message,
    })
}

async fn list_models(State(state): State<AppState>) -> Result<Json<ModelsResponse>, GatewayError> {
    let models = state.client.list_models().await?;
    info!("listed {} models", models.count);
    Ok(Json(models))
}

async fn version(State(state): State<AppState>) -> Result<Json<Value>, GatewayError> {
    Ok(Json(state.client.version().await?))
}

async fn delete_model(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, GatewayError> {
    state.client.delete_model(&name).await?;
    info!("model '{}' deleted", name);
    Ok(Json(json!({
        "message": format!("model '{}' deleted successfully", name)
    })))
}

fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}
