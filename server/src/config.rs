use std::time::Duration;

pub const DEFAULT_AFFILIATE_STATS_URL: &str = "https://affiliate.shuffle.com/stats";
pub const DEFAULT_RACE_START_TIME: i64 = 1_753_239_600; // July 22
pub const DEFAULT_RACE_END_TIME: i64 = 1_754_449_200; // August 5
pub const DEFAULT_CAMPAIGN_CODE: &str = "Red";
pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 75;
pub const DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_STATIC_DIR: &str = "client/dist";

/// Everything the standings poller needs to query the affiliate stats API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    pub stats_url: String,
    pub api_key: String,
    pub start_time: i64,
    pub end_time: i64,
    pub campaign_code: String,
    pub leaderboard_size: usize,
    pub poll_interval: Duration,
}

impl UpstreamConfig {
    /// `None` when no API key is configured.
    pub fn from_env() -> Option<Self> {
        let api_key = non_empty_env("AFFILIATE_API_KEY")?;
        Some(Self {
            stats_url: affiliate_stats_url(),
            api_key,
            start_time: race_start_time(),
            end_time: race_end_time(),
            campaign_code: campaign_code(),
            leaderboard_size: leaderboard_size(),
            poll_interval: poll_interval(),
        })
    }

    pub fn range_url(&self) -> String {
        format!(
            "{}?startTime={}&endTime={}",
            self.lifetime_url(),
            self.start_time,
            self.end_time
        )
    }

    pub fn lifetime_url(&self) -> String {
        format!("{}/{}", self.stats_url.trim_end_matches('/'), self.api_key)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn server_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

pub fn static_dir() -> String {
    non_empty_env("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string())
}

pub fn affiliate_stats_url() -> String {
    non_empty_env("AFFILIATE_STATS_URL").unwrap_or_else(|| DEFAULT_AFFILIATE_STATS_URL.to_string())
}

pub fn race_start_time() -> i64 {
    std::env::var("RACE_START_TIME")
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(DEFAULT_RACE_START_TIME)
}

pub fn race_end_time() -> i64 {
    std::env::var("RACE_END_TIME")
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(DEFAULT_RACE_END_TIME)
}

pub fn campaign_code() -> String {
    non_empty_env("CAMPAIGN_CODE").unwrap_or_else(|| DEFAULT_CAMPAIGN_CODE.to_string())
}

pub fn leaderboard_size() -> usize {
    std::env::var("LEADERBOARD_SIZE")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_LEADERBOARD_SIZE)
}

pub fn poll_interval() -> Duration {
    std::env::var("POLL_INTERVAL_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS))
}

pub fn upstream_http_timeout() -> Duration {
    std::env::var("UPSTREAM_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS))
}

pub fn upstream_connect_timeout() -> Duration {
    std::env::var("UPSTREAM_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS))
}
