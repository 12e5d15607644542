//! Gateway HTTP protocol - JSON bodies exchanged with clients

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use meteo_core::{WeatherError, WeatherSnapshot};

/// Most cities accepted by one batch request
pub const MAX_BATCH_CITIES: usize = 10;

/// `GET /weather` query string
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherQuery {
    #[serde(default)]
    pub city: String,
}

/// `POST /weather/batch` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub cities: Vec<String>,
}

/// `POST /weather/batch` response: successes and per-city failures
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<WeatherSnapshot>,
    pub errors: Vec<BatchError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    pub city: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

/// Error body returned with any non-2xx status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Handler error: an HTTP status plus a message for the JSON body
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Missing or invalid bearer token")
    }
}

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        let status = match &err {
            WeatherError::NotFound(_) => StatusCode::NOT_FOUND,
            WeatherError::MissingApiKey => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}
