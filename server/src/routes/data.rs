use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::{info, warn};

use crate::state::AppState;

/// Serve the pre-serialized standings; no re-serialization per request.
pub async fn get_data(State(state): State<AppState>) -> Response {
    info!("serving /data");
    let json: Arc<Bytes> = Arc::clone(&state.standings.read().await.data_json);
    json_bytes_response((*json).clone(), "no-store")
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let standings = state.standings.read().await;
    Json(serde_json::json!({
        "status": "ok",
        "entries": standings.response.len(),
        "last_refresh": standings.refreshed_at.map(|at| at.to_rfc3339()),
        "last_error": standings.response.error,
    }))
}

pub async fn not_found() -> Response {
    warn!("404 - page not found");
    (StatusCode::NOT_FOUND, "404 - Page Not Found").into_response()
}

fn json_bytes_response(body: Bytes, cache_control: &'static str) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    response
}
