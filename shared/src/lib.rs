pub mod countdown;
pub mod leaderboard;
pub mod prizes;

pub use countdown::{Remaining, WAGER_RACE_END_MS, countdown_text};
pub use leaderboard::*;
pub use prizes::prize_for_rank;
