use std::path::Path;

use axum::{
    Router,
    extract::Request,
    handler::HandlerWithoutStateExt,
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::routes;
use crate::state::AppState;

pub(crate) fn build_app(state: AppState, static_dir: &str) -> Router {
    let static_assets = Router::new()
        .fallback_service(
            ServeDir::new(static_dir)
                .precompressed_br()
                .precompressed_gzip()
                .not_found_service(routes::data::not_found.into_service()),
        )
        .layer(middleware::from_fn(set_static_cache_control));

    let app = Router::new()
        .route("/data", axum::routing::get(routes::data::get_data))
        .route("/api/health", axum::routing::get(routes::data::health));

    app.layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .fallback_service(static_assets)
        .with_state(state)
}

async fn set_static_cache_control(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    if response.status().is_success()
        && let Some(cache_control) = cache_control_for_path(&path)
    {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(cache_control),
        );
    }

    response
}

fn cache_control_for_path(path: &str) -> Option<&'static str> {
    if is_hashed_bundle_asset(path) {
        return Some("public, max-age=31536000, immutable");
    }

    None
}

/// Trunk emits `name-<hash>.js` / `name-<hash>_bg.wasm`; those never change in place.
fn is_hashed_bundle_asset(path: &str) -> bool {
    let Some(ext) = Path::new(path).extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    if !matches!(ext, "wasm" | "js" | "css") {
        return false;
    }

    let Some(filename) = Path::new(path).file_name().and_then(|name| name.to_str()) else {
        return false;
    };

    filename
        .split(['-', '_', '.'])
        .any(|segment| segment.len() >= 8 && segment.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use tower::ServiceExt;
    use wager_race_shared::{LeaderboardEntry, LeaderboardResponse, Wager};

    use super::*;
    use crate::state::StandingsSnapshot;

    const MISSING_STATIC_DIR: &str = "/nonexistent/wager-race-static";

    async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        (status, headers, body.to_vec())
    }

    #[test]
    fn immutable_cache_for_hashed_bundle_assets() {
        assert_eq!(
            cache_control_for_path("/wager-race-client-71578f6b278221f3_bg.wasm"),
            Some("public, max-age=31536000, immutable")
        );
        assert_eq!(
            cache_control_for_path("/wager-race-client-a93762ff3bf6d63a.js"),
            Some("public, max-age=31536000, immutable")
        );
    }

    #[test]
    fn no_cache_header_override_for_html() {
        assert_eq!(cache_control_for_path("/"), None);
        assert_eq!(cache_control_for_path("/index.html"), None);
        assert_eq!(cache_control_for_path("/styles.css"), None);
    }

    #[tokio::test]
    async fn data_serves_empty_object_before_first_refresh() {
        let app = build_app(AppState::new(), MISSING_STATIC_DIR);
        let (status, headers, body) = get(app, "/data").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers.get(header::CONTENT_TYPE).map(|v| v.as_bytes()),
            Some(&b"application/json"[..])
        );
        assert_eq!(
            headers.get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
        assert_eq!(body, b"{}".to_vec());
    }

    #[tokio::test]
    async fn data_serves_published_standings() {
        let state = AppState::new();
        let response = LeaderboardResponse::from_ranked([LeaderboardEntry {
            username: "champion".to_string(),
            wager: Wager::Text("$42,000.00".to_string()),
        }]);
        let snapshot = StandingsSnapshot::new(response.clone(), Utc::now()).expect("snapshot");
        state.publish(snapshot).await;

        let (status, _, body) = get(build_app(state, MISSING_STATIC_DIR), "/data").await;

        assert_eq!(status, StatusCode::OK);
        let served: LeaderboardResponse = serde_json::from_slice(&body).expect("served payload");
        assert_eq!(served, response);
    }

    #[tokio::test]
    async fn health_reports_last_error() {
        let state = AppState::new();
        let failed = LeaderboardResponse::failed("Fetch failed");
        let snapshot = StandingsSnapshot::new(failed, Utc::now()).expect("snapshot");
        state.publish(snapshot).await;

        let (status, _, body) = get(build_app(state, MISSING_STATIC_DIR), "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        let health: serde_json::Value = serde_json::from_slice(&body).expect("health json");
        assert_eq!(health["status"], "ok");
        assert_eq!(health["entries"], 0);
        assert_eq!(health["last_error"], "Fetch failed");
        assert!(health["last_refresh"].is_string());
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found() {
        let app = build_app(AppState::new(), MISSING_STATIC_DIR);
        let (status, _, body) = get(app, "/does-not-exist").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(String::from_utf8_lossy(&body), "404 - Page Not Found");
    }
}
