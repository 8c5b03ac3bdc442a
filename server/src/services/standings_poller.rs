use std::fmt;

use bytes::Bytes;
use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};
use wager_race_shared::{LeaderboardEntry, LeaderboardResponse, MAX_RANK, Wager};

use crate::config::UpstreamConfig;
use crate::state::{AppState, StandingsSnapshot};

const UNKNOWN_USERNAME: &str = "Unknown";
const INVALID_DATE_MARKER: &str = "INVALID_DATE";

/// One row of the affiliate stats API. Rows missing fields are kept and
/// defaulted when ranked.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsRow {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    wager_amount: Option<f64>,
    #[serde(default)]
    campaign_code: Option<String>,
}

#[derive(Debug)]
pub enum UpstreamError {
    Request(reqwest::Error),
    Status(StatusCode),
    Decode(serde_json::Error),
    InvalidFormat,
}

impl UpstreamError {
    /// Message placed in the `error` field served to widgets.
    fn payload_message(&self) -> String {
        match self {
            Self::Status(_) => "Fetch failed".to_string(),
            Self::InvalidFormat => "Invalid API format".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(e) => write!(f, "request error: {e}"),
            Self::Status(status) => write!(f, "fetch failed: {}", status.as_u16()),
            Self::Decode(e) => write!(f, "decode error: {e}"),
            Self::InvalidFormat => f.write_str("unexpected API response format"),
        }
    }
}

impl std::error::Error for UpstreamError {}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e)
    }
}

pub async fn run(state: AppState, config: UpstreamConfig) {
    let mut interval = tokio::time::interval(config.poll_interval);

    // First tick fires immediately
    loop {
        interval.tick().await;
        refresh(&state, &config).await;
        debug!(
            "next standings fetch in {} seconds",
            config.poll_interval.as_secs()
        );
    }
}

/// Fetch once and publish either the new standings or an error payload.
pub async fn refresh(state: &AppState, config: &UpstreamConfig) {
    info!("fetching standings from affiliate stats API");
    let response = match fetch_standings(&state.http_client, config).await {
        Ok(response) => {
            info!(entries = response.len(), "standings updated");
            response
        }
        Err(e) => {
            warn!(error = %e, "failed to fetch standings");
            LeaderboardResponse::failed(e.payload_message())
        }
    };

    if let Some(snapshot) = StandingsSnapshot::new(response, Utc::now()) {
        state.publish(snapshot).await;
    }
}

async fn fetch_standings(
    client: &reqwest::Client,
    config: &UpstreamConfig,
) -> Result<LeaderboardResponse, UpstreamError> {
    let (mut status, mut body) = get(client, &config.range_url()).await?;
    debug!(status = status.as_u16(), "stats range response");

    if needs_lifetime_fallback(status, &body) {
        warn!("invalid date range; fetching lifetime stats");
        (status, body) = get(client, &config.lifetime_url()).await?;
        debug!(status = status.as_u16(), "lifetime stats response");
    }

    if status != StatusCode::OK {
        return Err(UpstreamError::Status(status));
    }

    let rows = parse_stats_payload(&body)?;
    info!(count = rows.len(), "affiliate API returned entries");
    Ok(rank_standings(rows, &config.campaign_code, config.leaderboard_size))
}

async fn get(client: &reqwest::Client, url: &str) -> Result<(StatusCode, Bytes), UpstreamError> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    let body = resp.bytes().await?;
    Ok((status, body))
}

fn needs_lifetime_fallback(status: StatusCode, body: &[u8]) -> bool {
    status == StatusCode::BAD_REQUEST
        && String::from_utf8_lossy(body).contains(INVALID_DATE_MARKER)
}

fn parse_stats_payload(body: &[u8]) -> Result<Vec<StatsRow>, UpstreamError> {
    let value: serde_json::Value = serde_json::from_slice(body).map_err(UpstreamError::Decode)?;
    if !value.is_array() {
        return Err(UpstreamError::InvalidFormat);
    }
    serde_json::from_value(value).map_err(UpstreamError::Decode)
}

fn rank_standings(rows: Vec<StatsRow>, campaign_code: &str, size: usize) -> LeaderboardResponse {
    let mut filtered: Vec<StatsRow> = rows
        .into_iter()
        .filter(|row| row.campaign_code.as_deref() == Some(campaign_code))
        .collect();
    info!(
        count = filtered.len(),
        campaign = campaign_code,
        "filtered entries by campaign"
    );

    // Stable sort keeps upstream order between equal wagers
    filtered.sort_by(|a, b| {
        let a = a.wager_amount.unwrap_or(0.0);
        let b = b.wager_amount.unwrap_or(0.0);
        b.total_cmp(&a)
    });

    let limit = size.min(MAX_RANK as usize);
    let entries = filtered
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, row)| {
            let username = row
                .username
                .unwrap_or_else(|| UNKNOWN_USERNAME.to_string());
            let wager = format_wager(row.wager_amount.unwrap_or(0.0));
            debug!(rank = i + 1, %username, %wager, "ranked entry");
            LeaderboardEntry {
                username,
                wager: Wager::Text(wager),
            }
        })
        .collect::<Vec<_>>();

    LeaderboardResponse::from_ranked(entries)
}

/// Dollar amount with thousands separators and two decimals, e.g. `$1,234.50`.
fn format_wager(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("${sign}{grouped}.{fraction}")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::Router;
    use axum::extract::{Query, State};
    use axum::http::StatusCode as HttpStatus;
    use axum::response::IntoResponse;
    use axum::routing::get;

    use super::*;

    fn row(username: Option<&str>, wager: Option<f64>, campaign: Option<&str>) -> StatsRow {
        StatsRow {
            username: username.map(str::to_string),
            wager_amount: wager,
            campaign_code: campaign.map(str::to_string),
        }
    }

    fn wager_text(response: &LeaderboardResponse, rank: u32) -> Option<String> {
        response.entry(rank).map(|entry| entry.wager.to_string())
    }

    #[test]
    fn formats_wagers_like_currency() {
        assert_eq!(format_wager(0.0), "$0.00");
        assert_eq!(format_wager(12.5), "$12.50");
        assert_eq!(format_wager(999.999), "$1,000.00");
        assert_eq!(format_wager(1234.56), "$1,234.56");
        assert_eq!(format_wager(1_234_567.891), "$1,234,567.89");
        assert_eq!(format_wager(-1500.0), "$-1,500.00");
    }

    #[test]
    fn ranks_filter_sort_and_truncate() {
        let rows = vec![
            row(Some("low"), Some(10.0), Some("Red")),
            row(Some("other-campaign"), Some(99_999.0), Some("Blue")),
            row(Some("high"), Some(5_000.0), Some("Red")),
            row(None, Some(700.0), Some("Red")),
            row(Some("no-wager"), None, Some("Red")),
            row(Some("no-campaign"), Some(50_000.0), None),
        ];

        let response = rank_standings(rows, "Red", 3);

        assert_eq!(response.len(), 3);
        assert_eq!(
            response.entry(1).map(|e| e.username.as_str()),
            Some("high")
        );
        assert_eq!(wager_text(&response, 1).as_deref(), Some("$5,000.00"));
        assert_eq!(
            response.entry(2).map(|e| e.username.as_str()),
            Some("Unknown")
        );
        assert_eq!(response.entry(3).map(|e| e.username.as_str()), Some("low"));
        assert!(response.entry(4).is_none());
    }

    #[test]
    fn ranking_never_exceeds_ten_slots() {
        let rows = (0..25)
            .map(|i| row(Some("player"), Some(i as f64), Some("Red")))
            .collect();
        let response = rank_standings(rows, "Red", 50);
        assert_eq!(response.len(), 10);
        assert_eq!(wager_text(&response, 1).as_deref(), Some("$24.00"));
    }

    #[test]
    fn equal_wagers_keep_upstream_order() {
        let rows = vec![
            row(Some("first"), Some(100.0), Some("Red")),
            row(Some("second"), Some(100.0), Some("Red")),
        ];
        let response = rank_standings(rows, "Red", 10);
        assert_eq!(
            response.entry(1).map(|e| e.username.as_str()),
            Some("first")
        );
        assert_eq!(
            response.entry(2).map(|e| e.username.as_str()),
            Some("second")
        );
    }

    #[test]
    fn non_array_payload_is_invalid_format() {
        let err = parse_stats_payload(br#"{"message":"nope"}"#).expect_err("object payload");
        assert!(matches!(err, UpstreamError::InvalidFormat));
        assert_eq!(err.payload_message(), "Invalid API format");
    }

    #[test]
    fn malformed_payload_is_decode_error() {
        let err = parse_stats_payload(b"<html>").expect_err("html payload");
        assert!(matches!(err, UpstreamError::Decode(_)));
        assert!(err.payload_message().starts_with("decode error"));
    }

    #[test]
    fn lifetime_fallback_only_on_invalid_date_bad_request() {
        assert!(needs_lifetime_fallback(
            StatusCode::BAD_REQUEST,
            br#"{"errorCode":"INVALID_DATE"}"#
        ));
        assert!(!needs_lifetime_fallback(
            StatusCode::BAD_REQUEST,
            b"missing api key"
        ));
        assert!(!needs_lifetime_fallback(
            StatusCode::INTERNAL_SERVER_ERROR,
            b"INVALID_DATE"
        ));
    }

    #[derive(Clone, Default)]
    struct StubUpstream {
        range_hits: Arc<AtomicUsize>,
        lifetime_hits: Arc<AtomicUsize>,
        reject_range: bool,
        status: Option<u16>,
    }

    async fn stub_stats(
        State(stub): State<StubUpstream>,
        Query(params): Query<HashMap<String, String>>,
    ) -> axum::response::Response {
        if let Some(code) = stub.status {
            let status = HttpStatus::from_u16(code).unwrap_or(HttpStatus::INTERNAL_SERVER_ERROR);
            return (status, "upstream unavailable").into_response();
        }
        if params.contains_key("startTime") {
            stub.range_hits.fetch_add(1, Ordering::SeqCst);
            if stub.reject_range {
                return (
                    HttpStatus::BAD_REQUEST,
                    r#"{"errorCode":"INVALID_DATE"}"#,
                )
                    .into_response();
            }
        } else {
            stub.lifetime_hits.fetch_add(1, Ordering::SeqCst);
        }
        axum::Json(serde_json::json!([
            {"username": "silver", "wagerAmount": 2500.0, "campaignCode": "Red"},
            {"username": "gold", "wagerAmount": 12000.25, "campaignCode": "Red"},
            {"username": "ignored", "wagerAmount": 90000.0, "campaignCode": "Green"}
        ]))
        .into_response()
    }

    async fn spawn_stub(stub: StubUpstream) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let app = Router::new()
            .route("/stats/{key}", get(stub_stats))
            .with_state(stub);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve stub upstream");
        });
        (addr, handle)
    }

    fn config_for(addr: SocketAddr) -> UpstreamConfig {
        UpstreamConfig {
            stats_url: format!("http://{addr}/stats"),
            api_key: "test-key".to_string(),
            start_time: 1_753_239_600,
            end_time: 1_754_449_200,
            campaign_code: "Red".to_string(),
            leaderboard_size: 10,
            poll_interval: Duration::from_secs(75),
        }
    }

    #[tokio::test]
    async fn refresh_publishes_ranked_standings() {
        let stub = StubUpstream::default();
        let (addr, handle) = spawn_stub(stub.clone()).await;
        let state = AppState::new();

        refresh(&state, &config_for(addr)).await;

        let snapshot = state.standings.read().await.clone();
        assert!(snapshot.refreshed_at.is_some());
        assert!(snapshot.response.error.is_none());
        assert_eq!(snapshot.response.len(), 2);
        assert_eq!(
            snapshot.response.entry(1).map(|e| e.username.as_str()),
            Some("gold")
        );
        assert_eq!(
            wager_text(&snapshot.response, 1).as_deref(),
            Some("$12,000.25")
        );
        let served: serde_json::Value =
            serde_json::from_slice(&snapshot.data_json).expect("served json");
        assert_eq!(served["top2"]["username"], "silver");
        assert_eq!(stub.range_hits.load(Ordering::SeqCst), 1);
        assert_eq!(stub.lifetime_hits.load(Ordering::SeqCst), 0);

        handle.abort();
    }

    #[tokio::test]
    async fn invalid_date_retries_lifetime_stats_once() {
        let stub = StubUpstream {
            reject_range: true,
            ..StubUpstream::default()
        };
        let (addr, handle) = spawn_stub(stub.clone()).await;
        let state = AppState::new();

        refresh(&state, &config_for(addr)).await;

        assert_eq!(stub.range_hits.load(Ordering::SeqCst), 1);
        assert_eq!(stub.lifetime_hits.load(Ordering::SeqCst), 1);
        assert_eq!(state.standings.read().await.response.len(), 2);

        handle.abort();
    }

    #[tokio::test]
    async fn upstream_failure_serves_error_payload() {
        let stub = StubUpstream {
            status: Some(503),
            ..StubUpstream::default()
        };
        let (addr, handle) = spawn_stub(stub).await;
        let state = AppState::new();

        refresh(&state, &config_for(addr)).await;

        let snapshot = state.standings.read().await.clone();
        assert_eq!(snapshot.response.error.as_deref(), Some("Fetch failed"));
        assert!(snapshot.response.is_empty());
        assert_eq!(
            snapshot.data_json.to_vec(),
            br#"{"error":"Fetch failed"}"#.to_vec()
        );

        handle.abort();
    }

    #[tokio::test]
    async fn unreachable_upstream_serves_request_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind throwaway listener");
        let addr = listener.local_addr().expect("throwaway address");
        drop(listener);
        let state = AppState::new();

        refresh(&state, &config_for(addr)).await;

        let error = state.standings.read().await.response.error.clone();
        assert!(
            error.as_deref().is_some_and(|e| e.starts_with("request error")),
            "unexpected error payload: {error:?}"
        );
    }
}
