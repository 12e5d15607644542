//! Gateway HTTP server - Axum routes in front of the assistant

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use meteo_core::{Assistant, ChatRequest, ChatResponse, IntentResult, WeatherSnapshot};

use crate::auth;
use crate::protocol::{
    ApiError, BatchError, BatchRequest, BatchResponse, HealthResponse, MAX_BATCH_CITIES,
    WeatherQuery,
};

/// Shared state for all requests
#[derive(Clone)]
pub struct GatewayState {
    pub assistant: Arc<Assistant>,
    pub auth_token: String,
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(assistant: Arc<Assistant>, auth_token: String) -> Self {
        Self {
            assistant,
            auth_token,
            start_time: Instant::now(),
        }
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        if auth::is_authorized(&self.auth_token, headers) {
            Ok(())
        } else {
            Err(ApiError::unauthorized())
        }
    }
}

/// The gateway server
pub struct GatewayServer {
    state: GatewayState,
    bind: SocketAddr,
}

impl GatewayServer {
    /// Create a new gateway server
    pub fn new(bind: SocketAddr, assistant: Arc<Assistant>, auth_token: String) -> Self {
        Self {
            state: GatewayState::new(assistant, auth_token),
            bind,
        }
    }

    /// Build the Axum router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/chat", post(chat_handler))
            .route("/intent", post(intent_handler))
            .route("/weather", get(weather_handler))
            .route("/weather/batch", post(batch_handler))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Serve until `cancel` fires, then finish in-flight requests and return
    pub async fn run_until(self, cancel: CancellationToken) -> anyhow::Result<()> {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(self.bind)
            .await
            .with_context(|| format!("Failed to bind gateway to {}", self.bind))?;
        info!("Gateway listening on {}", self.bind);

        axum::serve(listener, router)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await?;

        info!("Gateway stopped");
        Ok(())
    }

    /// Start the server in the background, returning a handle
    pub fn spawn(self, cancel: CancellationToken) -> tokio::task::JoinHandle<anyhow::Result<()>> {
        tokio::spawn(async move { self.run_until(cancel).await })
    }
}

// ── Handlers ──

async fn health_handler(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

async fn chat_handler(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    state.authorize(&headers)?;
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("Missing or empty 'message'"));
    }

    let response = state.assistant.handle_message(message).await;
    debug!(
        "Chat {} answered with intent {}",
        response.request_id, response.intent.intent
    );
    Ok(Json(response))
}

async fn intent_handler(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<Json<IntentResult>, ApiError> {
    state.authorize(&headers)?;
    Ok(Json(state.assistant.classify(&req.message).await))
}

async fn weather_handler(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherSnapshot>, ApiError> {
    state.authorize(&headers)?;
    let city = query.city.trim();
    if city.is_empty() {
        return Err(ApiError::bad_request("Missing 'city' query parameter"));
    }

    let snapshot = state.assistant.weather().current(city).await?;
    Ok(Json(snapshot))
}

async fn batch_handler(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    state.authorize(&headers)?;
    if req.cities.len() > MAX_BATCH_CITIES {
        return Err(ApiError::bad_request(format!(
            "At most {} cities per batch",
            MAX_BATCH_CITIES
        )));
    }

    let mut response = BatchResponse::default();
    for city in req.cities.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
        match state.assistant.weather().current(city).await {
            Ok(snapshot) => response.results.push(snapshot),
            Err(e) => response.errors.push(BatchError {
                city: city.to_string(),
                error: e.to_string(),
            }),
        }
    }
    Ok(Json(response))
}
