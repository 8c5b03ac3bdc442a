use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::warn;
use wager_race_shared::LeaderboardResponse;

use crate::config::{upstream_connect_timeout, upstream_http_timeout};

/// Latest standings, serialized once by the poller and shared by every `/data` request.
#[derive(Debug, Clone)]
pub struct StandingsSnapshot {
    pub response: LeaderboardResponse,
    pub data_json: Arc<Bytes>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Default for StandingsSnapshot {
    fn default() -> Self {
        Self {
            response: LeaderboardResponse::default(),
            data_json: Arc::new(Bytes::from_static(b"{}")),
            refreshed_at: None,
        }
    }
}

impl StandingsSnapshot {
    /// Pre-serialize `response`. `None` if it cannot be encoded.
    pub fn new(response: LeaderboardResponse, refreshed_at: DateTime<Utc>) -> Option<Self> {
        match serde_json::to_vec(&response) {
            Ok(json) => Some(Self {
                response,
                data_json: Arc::new(Bytes::from(json)),
                refreshed_at: Some(refreshed_at),
            }),
            Err(e) => {
                warn!(error = %e, "failed to serialize standings payload");
                None
            }
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub standings: Arc<RwLock<StandingsSnapshot>>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new() -> Self {
        let request_timeout = upstream_http_timeout();
        let connect_timeout = upstream_connect_timeout();
        let http_client = reqwest::Client::builder()
            .user_agent("wager-race/0.1")
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .or_else(|e| {
                warn!(
                    error = %e,
                    "failed to build configured HTTP client, retrying without custom user-agent"
                );
                reqwest::Client::builder()
                    .timeout(request_timeout)
                    .connect_timeout(connect_timeout)
                    .build()
            })
            .unwrap_or_else(|e| {
                panic!("failed to build timeout-configured HTTP client: {e}");
            });
        Self {
            standings: Arc::new(RwLock::new(StandingsSnapshot::default())),
            http_client,
        }
    }

    /// Replace the served standings.
    pub async fn publish(&self, snapshot: StandingsSnapshot) {
        *self.standings.write().await = snapshot;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
