use std::fmt;

use serde::{Deserialize, Serialize};

/// Highest rank the widget knows how to place.
pub const MAX_RANK: u32 = 10;

/// Ranks shown in fixed podium seats rather than the list.
pub const PODIUM_RANKS: std::ops::RangeInclusive<u32> = 1..=3;

/// Ranks rendered as list rows under the podium.
pub const LIST_RANKS: std::ops::RangeInclusive<u32> = 4..=MAX_RANK;

const MASK_SUFFIX: &str = "*****";

/// Wager as the backend chose to display it. Strings are shown verbatim,
/// numbers in their shortest decimal form, anything else as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Wager {
    Text(String),
    Amount(f64),
    Other(serde_json::Value),
}

impl fmt::Display for Wager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Amount(amount) => write_amount(f, *amount),
            Self::Other(value) => write!(f, "{value}"),
        }
    }
}

/// Plain decimals in `[1e-6, 1e21)`, exponent form with an explicit sign outside it.
fn write_amount(f: &mut fmt::Formatter<'_>, amount: f64) -> fmt::Result {
    let magnitude = amount.abs();
    if amount == 0.0 || (1e-6..1e21).contains(&magnitude) {
        return write!(f, "{amount}");
    }
    let exp = format!("{amount:e}");
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => write!(f, "{mantissa}e+{power}"),
        _ => f.write_str(&exp),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub wager: Wager,
}

/// Body of `GET /data`: one optional entry per `topN` key.
///
/// The backend replies with only an `error` field when its upstream fetch
/// failed; such a response carries no standings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top1: Option<LeaderboardEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top2: Option<LeaderboardEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top3: Option<LeaderboardEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top4: Option<LeaderboardEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top5: Option<LeaderboardEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top6: Option<LeaderboardEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top7: Option<LeaderboardEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top8: Option<LeaderboardEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top9: Option<LeaderboardEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top10: Option<LeaderboardEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LeaderboardResponse {
    /// Error payload served when standings could not be refreshed.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Build a response from entries already sorted best-first. Entries past
    /// [`MAX_RANK`] are dropped.
    pub fn from_ranked<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = LeaderboardEntry>,
    {
        let mut response = Self::default();
        for (rank, entry) in (1..=MAX_RANK).zip(entries) {
            if let Some(slot) = response.slot_mut(rank) {
                *slot = Some(entry);
            }
        }
        response
    }

    pub fn entry(&self, rank: u32) -> Option<&LeaderboardEntry> {
        match rank {
            1 => self.top1.as_ref(),
            2 => self.top2.as_ref(),
            3 => self.top3.as_ref(),
            4 => self.top4.as_ref(),
            5 => self.top5.as_ref(),
            6 => self.top6.as_ref(),
            7 => self.top7.as_ref(),
            8 => self.top8.as_ref(),
            9 => self.top9.as_ref(),
            10 => self.top10.as_ref(),
            _ => None,
        }
    }

    fn slot_mut(&mut self, rank: u32) -> Option<&mut Option<LeaderboardEntry>> {
        match rank {
            1 => Some(&mut self.top1),
            2 => Some(&mut self.top2),
            3 => Some(&mut self.top3),
            4 => Some(&mut self.top4),
            5 => Some(&mut self.top5),
            6 => Some(&mut self.top6),
            7 => Some(&mut self.top7),
            8 => Some(&mut self.top8),
            9 => Some(&mut self.top9),
            10 => Some(&mut self.top10),
            _ => None,
        }
    }

    /// Present entries in ascending rank order, paired with their rank.
    pub fn ranked(&self) -> impl Iterator<Item = (u32, &LeaderboardEntry)> + '_ {
        (1..=MAX_RANK).filter_map(|rank| self.entry(rank).map(|entry| (rank, entry)))
    }

    pub fn len(&self) -> usize {
        self.ranked().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keep the first two characters of a username and hide the rest.
pub fn mask_username(name: &str) -> String {
    let mut masked: String = name.chars().take(2).collect();
    masked.push_str(MASK_SUFFIX);
    masked
}
