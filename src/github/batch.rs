use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::models::{ContributionsByUser, PrState, PullRequest};
use super::queries::{AUTHORED_SEARCH_FRAGMENT, REVIEWED_SEARCH_FRAGMENT, SEARCH_NODE_LIMIT};

/// Usernames per combined query; keeps query complexity under GitHub's limits.
pub const DEFAULT_BATCH_SIZE: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    /// Position within the batch, used to name the query aliases.
    pub index: usize,
    pub username: String,
}

/// A group of users fetched with a single GraphQL document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserBatch {
    entries: Vec<BatchEntry>,
}

/// Split `usernames` into batches of at most `batch_size`, preserving order.
pub fn partition(usernames: &[String], batch_size: usize) -> Vec<UserBatch> {
    usernames
        .chunks(batch_size.max(1))
        .map(|chunk| UserBatch::new(chunk.iter().cloned()))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Alias {
    Authored(usize),
    Reviewed(usize),
}

impl Alias {
    fn name(self) -> String {
        match self {
            Alias::Authored(i) => format!("user_{i}"),
            Alias::Reviewed(i) => format!("reviews_{i}"),
        }
    }

    fn parse(key: &str) -> Option<Self> {
        if let Some(i) = key.strip_prefix("user_") {
            return i.parse().ok().map(Alias::Authored);
        }
        if let Some(i) = key.strip_prefix("reviews_") {
            return i.parse().ok().map(Alias::Reviewed);
        }
        None
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    #[serde(default, deserialize_with = "null_as_default")]
    issue_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    nodes: Vec<Value>,
}

/// GitHub sends `null` for connection fields it could not resolve.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestNode {
    number: u64,
    additions: u64,
    deletions: u64,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    state: PrState,
}

impl UserBatch {
    pub fn new(usernames: impl IntoIterator<Item = String>) -> Self {
        let entries = usernames
            .into_iter()
            .enumerate()
            .map(|(index, username)| BatchEntry { index, username })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One document with an authored and a reviewed search per user.
    pub fn build_query(&self, org: &str, since_date: &str) -> String {
        let mut body = String::new();
        for entry in &self.entries {
            let user = escape(&entry.username);
            let org = escape(org);

            let authored = format!("org:{org} author:{user} created:>={since_date} type:pr");
            body.push_str(
                &AUTHORED_SEARCH_FRAGMENT
                    .replace("{alias}", &Alias::Authored(entry.index).name())
                    .replace("{search}", &authored),
            );

            let reviewed = format!("org:{org} reviewed-by:{user} updated:>={since_date} type:pr");
            body.push_str(
                &REVIEWED_SEARCH_FRAGMENT
                    .replace("{alias}", &Alias::Reviewed(entry.index).name())
                    .replace("{search}", &reviewed),
            );
        }
        format!("query {{{body}}}")
    }

    /// Demultiplex the `data` object of a batch response back to usernames.
    ///
    /// Every user of the batch gets an entry, empty when the response has
    /// nothing for them. Malformed PR nodes are skipped with a warning.
    pub fn parse_response(&self, data: &Map<String, Value>) -> ContributionsByUser {
        let mut authored: HashMap<usize, SearchResult> = HashMap::new();
        let mut reviewed: HashMap<usize, SearchResult> = HashMap::new();

        for (key, value) in data {
            let Some(alias) = Alias::parse(key) else {
                debug!(alias = %key, "Ignoring unknown response field");
                continue;
            };
            let result = match serde_json::from_value::<Option<SearchResult>>(value.clone()) {
                Ok(Some(result)) => result,
                Ok(None) => continue,
                Err(e) => {
                    warn!(alias = %key, error = %e, "Unreadable search result");
                    continue;
                }
            };
            match alias {
                Alias::Authored(i) => authored.insert(i, result),
                Alias::Reviewed(i) => reviewed.insert(i, result),
            };
        }

        let mut results = ContributionsByUser::new();
        for entry in &self.entries {
            let reviews_given = reviewed
                .get(&entry.index)
                .map(|r| {
                    warn_if_truncated(&entry.username, "reviewed", r);
                    count_reviews(&r.nodes)
                })
                .unwrap_or(0);

            let prs = authored
                .get(&entry.index)
                .map(|r| {
                    warn_if_truncated(&entry.username, "authored", r);
                    parse_pull_requests(&entry.username, &r.nodes, reviews_given)
                })
                .unwrap_or_default();

            results.insert(entry.username.clone(), prs);
        }
        results
    }
}

/// Reviews whose PR author is hidden (null) do not count.
fn count_reviews(nodes: &[Value]) -> u32 {
    nodes
        .iter()
        .filter(|node| node.get("author").is_some_and(|a| !a.is_null()))
        .count() as u32
}

fn parse_pull_requests(username: &str, nodes: &[Value], reviews_given: u32) -> Vec<PullRequest> {
    let mut prs = Vec::with_capacity(nodes.len());
    for node in nodes {
        // Non-PR search hits come back as empty objects.
        if node.is_null() || node.as_object().is_some_and(|o| o.is_empty()) {
            continue;
        }
        match serde_json::from_value::<PullRequestNode>(node.clone()) {
            Ok(n) => prs.push(PullRequest {
                number: n.number,
                additions: n.additions,
                deletions: n.deletions,
                created_at: n.created_at,
                merged_at: n.merged_at,
                state: n.state,
                reviews_given,
            }),
            Err(e) => {
                warn!(user = username, error = %e, "Skipping malformed pull request node");
            }
        }
    }
    prs
}

fn warn_if_truncated(username: &str, kind: &str, result: &SearchResult) {
    if result.issue_count as usize > result.nodes.len() && result.nodes.len() >= SEARCH_NODE_LIMIT {
        warn!(
            user = username,
            kind = kind,
            total = result.issue_count,
            returned = result.nodes.len(),
            "Search results truncated"
        );
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
