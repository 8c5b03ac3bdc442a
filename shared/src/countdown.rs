/// End of the wager race: 2025-08-05 23:59 EDT (UTC-4), in Unix milliseconds.
pub const WAGER_RACE_END_MS: i64 = 1_754_452_740_000;

pub const ENDED_TEXT: &str = "Wager Race Ended";

const DAY_MS: i64 = 86_400_000;
const HOUR_MS: i64 = 3_600_000;
const MINUTE_MS: i64 = 60_000;
const SECOND_MS: i64 = 1_000;

/// Time left before a deadline, truncated to whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Remaining {
    /// Break down `target - now`. Returns `None` once the deadline is reached.
    pub fn until(target_ms: i64, now_ms: i64) -> Option<Self> {
        let diff = target_ms.saturating_sub(now_ms);
        if diff <= 0 {
            return None;
        }
        Some(Self {
            days: diff / DAY_MS,
            hours: (diff % DAY_MS) / HOUR_MS,
            minutes: (diff % HOUR_MS) / MINUTE_MS,
            seconds: (diff % MINUTE_MS) / SECOND_MS,
        })
    }

    pub fn as_millis(&self) -> i64 {
        self.days * DAY_MS
            + self.hours * HOUR_MS
            + self.minutes * MINUTE_MS
            + self.seconds * SECOND_MS
    }
}

/// Text shown in the countdown element for the given instant.
pub fn countdown_text(target_ms: i64, now_ms: i64) -> String {
    match Remaining::until(target_ms, now_ms) {
        Some(r) => format!(
            "Time Remaining: {}d {}h {}m {}s",
            r.days, r.hours, r.minutes, r.seconds
        ),
        None => ENDED_TEXT.to_string(),
    }
}
