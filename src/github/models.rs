use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Raw pull requests per username, in the order the usernames were given.
pub type ContributionsByUser = IndexMap<String, Vec<PullRequest>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrState {
    Open,
    Closed,
    Merged,
    #[default]
    #[serde(other)]
    Unknown,
}

impl PrState {
    /// Case-insensitive parse; REST reports merged PRs as `closed` with a merge time.
    pub fn from_rest(state: &str, merged: bool) -> Self {
        match state.to_ascii_lowercase().as_str() {
            "open" => PrState::Open,
            "closed" if merged => PrState::Merged,
            "closed" => PrState::Closed,
            "merged" => PrState::Merged,
            _ => PrState::Unknown,
        }
    }
}

/// One pull request observed for one user in one query context.
///
/// `reviews_given` belongs to the querying user rather than the PR: every
/// record produced for a user in a batch carries the same value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub additions: u64,
    pub deletions: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub state: PrState,
    pub reviews_given: u32,
}

impl PullRequest {
    pub fn changes(&self) -> u64 {
        self.additions + self.deletions
    }
}

/// Aggregate statistics for one user over the query window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContributionMetrics {
    pub total_prs: usize,
    pub median_changes: f64,
    pub total_additions: u64,
    pub total_deletions: u64,
    pub reviews_given: u32,
}

impl ContributionMetrics {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Impact score: median change size times PR count.
    pub fn multiplied_changes(&self) -> f64 {
        self.median_changes * self.total_prs as f64
    }

    pub fn total_changes(&self) -> u64 {
        self.total_additions + self.total_deletions
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub login: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Rate limit headers from a REST response.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RateLimit {
    pub remaining: u32,
    pub limit: u32,
    pub reset_at: Option<DateTime<Utc>>,
}

impl RateLimit {
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Option<Self> {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<i64>().ok())
        };

        let remaining = read("x-ratelimit-remaining")?;
        Some(RateLimit {
            remaining: remaining.max(0) as u32,
            limit: read("x-ratelimit-limit").unwrap_or(0).max(0) as u32,
            reset_at: read("x-ratelimit-reset").and_then(|ts| DateTime::from_timestamp(ts, 0)),
        })
    }

    pub fn is_below(&self, floor: u32) -> bool {
        self.remaining < floor
    }
}
