use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use wager_race_shared::{
    LIST_RANKS, LeaderboardEntry, LeaderboardResponse, mask_username, prize_for_rank,
};

use crate::console;

pub const DATA_URL: &str = "/data";
pub const POLL_INTERVAL_MS: i32 = 75_000;

const PODIUM_PLACEHOLDER: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Transport(String),
    Status(u16),
    Parse(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "fetch error: {e}"),
            Self::Status(status) => write!(f, "HTTP {status}"),
            Self::Parse(e) => write!(f, "parse error: {e}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Text shown in one podium seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodiumSeat {
    pub username: String,
    pub wager: String,
}

impl Default for PodiumSeat {
    fn default() -> Self {
        Self {
            username: PODIUM_PLACEHOLDER.to_string(),
            wager: PODIUM_PLACEHOLDER.to_string(),
        }
    }
}

impl From<&LeaderboardEntry> for PodiumSeat {
    fn from(entry: &LeaderboardEntry) -> Self {
        Self {
            username: mask_username(&entry.username),
            wager: entry.wager.to_string(),
        }
    }
}

/// Seats in rank order: first, second, third.
pub type PodiumState = [PodiumSeat; 3];

/// CSS position class for each podium seat, indexed by rank - 1.
pub const PODIUM_POSITIONS: [&str; 3] = ["first", "second", "third"];

/// One row of the ranks 4-10 list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub rank: u32,
    pub username: String,
    pub wager: String,
    pub prize: Option<&'static str>,
}

/// New seat contents for ranks 1-3; `None` leaves a seat as it was.
pub fn podium_updates(response: &LeaderboardResponse) -> [Option<PodiumSeat>; 3] {
    [1, 2, 3].map(|rank| response.entry(rank).map(PodiumSeat::from))
}

/// Overwrite the seats that have an entry. Returns how many changed.
pub fn apply_podium(seats: &mut PodiumState, response: &LeaderboardResponse) -> usize {
    let mut updated = 0;
    for (seat, update) in seats.iter_mut().zip(podium_updates(response)) {
        if let Some(update) = update {
            *seat = update;
            updated += 1;
        }
    }
    updated
}

/// Rows for ranks 4-10 in ascending order, skipping absent ranks.
pub fn list_rows(response: &LeaderboardResponse) -> Vec<ListRow> {
    LIST_RANKS
        .filter_map(|rank| {
            response.entry(rank).map(|entry| ListRow {
                rank,
                username: mask_username(&entry.username),
                wager: entry.wager.to_string(),
                prize: prize_for_rank(rank),
            })
        })
        .collect()
}

/// Orders overlapping poll cycles: a response is applied only when no newer
/// request has been applied already.
#[derive(Debug, Default)]
pub struct FetchSequencer {
    issued: u64,
    applied: Option<u64>,
}

impl FetchSequencer {
    pub fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn try_apply(&mut self, request: u64) -> bool {
        if self.applied.is_some_and(|applied| applied >= request) {
            return false;
        }
        self.applied = Some(request);
        true
    }
}

/// Any well-formed object is a response; an `error` field is only diagnostic.
pub fn decode_leaderboard(body: &str) -> Result<LeaderboardResponse, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))
}

/// What a finished poll cycle did to the rendered state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Applied,
    /// A newer response was already rendered.
    Stale,
    Failed(FetchError),
}

/// Settle one poll cycle against the rendered podium and list. Only
/// `Applied` writes to them.
pub fn apply_outcome(
    sequencer: &mut FetchSequencer,
    request: u64,
    result: Result<LeaderboardResponse, FetchError>,
    podium: &mut PodiumState,
    rows: &mut Vec<ListRow>,
) -> CycleOutcome {
    let data = match result {
        Ok(data) => data,
        Err(e) => return CycleOutcome::Failed(e),
    };
    if !sequencer.try_apply(request) {
        return CycleOutcome::Stale;
    }
    apply_podium(podium, &data);
    *rows = list_rows(&data);
    CycleOutcome::Applied
}

pub async fn fetch_leaderboard() -> Result<LeaderboardResponse, FetchError> {
    let response = gloo_net::http::Request::get(DATA_URL)
        .send()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    if !response.ok() {
        return Err(FetchError::Status(response.status()));
    }

    let body = response
        .text()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;
    decode_leaderboard(&body)
}

/// Signals the renderer writes into.
#[derive(Clone, Copy)]
pub struct LeaderboardView {
    pub podium: RwSignal<PodiumState>,
    pub rows: RwSignal<Vec<ListRow>>,
}

impl LeaderboardView {
    pub fn new() -> Self {
        Self {
            podium: RwSignal::new(PodiumState::default()),
            rows: RwSignal::new(Vec::new()),
        }
    }
}

impl Default for LeaderboardView {
    fn default() -> Self {
        Self::new()
    }
}

/// One poll cycle. Errors are logged and swallowed; nothing rendered changes.
pub fn fetch_and_render(board: LeaderboardView, sequencer: Rc<RefCell<FetchSequencer>>) {
    let request = sequencer.borrow_mut().begin();
    console::info(&format!(
        "[Fetch] Requesting new data at {}",
        console::local_time()
    ));

    spawn_local(async move {
        let result = fetch_leaderboard().await;
        if let Ok(data) = &result {
            let payload = serde_json::to_string(data).unwrap_or_default();
            console::info(&format!("[Fetch] Data received: {payload}"));
            if let Some(message) = &data.error {
                console::warn(&format!("[Fetch] Server reported: {message}"));
            }
        }

        let mut podium = board.podium.get_untracked();
        let mut rows = board.rows.get_untracked();
        let outcome = apply_outcome(
            &mut sequencer.borrow_mut(),
            request,
            result,
            &mut podium,
            &mut rows,
        );

        match outcome {
            CycleOutcome::Applied => {
                board.podium.set(podium);
                board.rows.set(rows);
                console::info(&format!(
                    "[Update] Leaderboard updated at {}",
                    console::local_time()
                ));
            }
            CycleOutcome::Stale => console::warn(&format!(
                "[Fetch] Dropping response #{request}; a newer one is already shown"
            )),
            CycleOutcome::Failed(e) => {
                console::error(&format!("[Error] Leaderboard refresh failed: {e}"));
            }
        }
    });
}
