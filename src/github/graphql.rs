use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::batch::{DEFAULT_BATCH_SIZE, UserBatch, partition};
use super::error::{GithubError, Result};
use super::models::*;
use super::queries;
use super::retry::RetryPolicy;
use crate::cache::{CacheStats, ResultCache};
use crate::util::time::since_date;

/// Knobs for batching, retry and caching.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub retry: RetryPolicy,
    pub batch_size: usize,
    /// Pause between consecutive batch requests.
    pub batch_delay: Duration,
    pub cache_capacity: usize,
    /// REST pagination stops once `X-RateLimit-Remaining` drops below this.
    pub rate_limit_floor: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: Duration::from_secs(1),
            cache_capacity: 32,
            rate_limit_floor: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ContributionsKey {
    usernames: Vec<String>,
    org: String,
    since_days: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MembersConnection {
    page_info: PageInfo,
    #[serde(default)]
    nodes: Vec<Option<Member>>,
}

/// GitHub API gateway. Clones share the same caches.
#[derive(Clone)]
pub struct GithubClient {
    pub(super) client: Client,
    graphql_url: String,
    pub(super) rest_url: String,
    pub(super) token: String,
    pub(super) options: ClientOptions,
    contributions: Arc<ResultCache<ContributionsKey, Arc<ContributionsByUser>>>,
    members: Arc<ResultCache<String, Arc<Vec<Member>>>>,
}

impl GithubClient {
    pub fn new(
        token: &str,
        graphql_url: &str,
        rest_url: &str,
        options: ClientOptions,
    ) -> Result<Self> {
        validate_endpoint(graphql_url)?;
        validate_endpoint(rest_url)?;

        let client = Client::builder()
            .user_agent("ghcontrib")
            .build()
            .map_err(|e| GithubError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            graphql_url: graphql_url.to_string(),
            rest_url: rest_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            contributions: Arc::new(ResultCache::new(options.cache_capacity)),
            members: Arc::new(ResultCache::new(options.cache_capacity)),
            options,
        })
    }

    /// A single GraphQL POST, no retry.
    async fn send_graphql(&self, query: &str, variables: Value) -> Result<Value> {
        let body = json!({
            "query": query,
            "variables": variables,
        });

        let resp = self
            .client
            .post(&self.graphql_url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(GithubError::api(Some(status.as_u16()), text));
        }

        resp.json::<Value>()
            .await
            .map_err(|e| GithubError::Decode(e.to_string()))
    }

    /// GraphQL POST under the client's retry policy.
    pub async fn post_graphql(&self, query: &str, variables: Value) -> Result<Value> {
        self.options
            .retry
            .run("post_graphql", || self.send_graphql(query, variables.clone()))
            .await
    }

    /// All members of `org`, following the membership cursor to the end.
    pub async fn get_org_members(&self, org: &str) -> Result<Arc<Vec<Member>>> {
        self.members
            .get_or_try_insert_with(org.to_string(), || self.fetch_org_members(org))
            .await
    }

    async fn fetch_org_members(&self, org: &str) -> Result<Arc<Vec<Member>>> {
        let started = Instant::now();
        let mut members = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0;

        loop {
            let variables = json!({
                "org": org,
                "cursor": cursor,
            });

            let data = self
                .post_graphql(queries::ORG_MEMBERS_QUERY, variables)
                .await?;
            let connection = &data["data"]["organization"]["membersWithRole"];
            if connection.is_null() {
                if pages == 0 {
                    error!(org = org, "Organization not found or no access");
                    return Err(GithubError::OrgNotFound {
                        org: org.to_string(),
                    });
                }
                return Err(GithubError::api(None, "membership page missing from response"));
            }

            let page: MembersConnection = serde_json::from_value(connection.clone())
                .map_err(|e| GithubError::Decode(e.to_string()))?;
            pages += 1;
            members.extend(page.nodes.into_iter().flatten());

            if !page.page_info.has_next_page {
                break;
            }
            match page.page_info.end_cursor {
                Some(next) => cursor = Some(next),
                None => {
                    warn!(org = org, "Next page reported without a cursor, stopping");
                    break;
                }
            }
        }

        info!(
            org = org,
            pages = pages,
            count = members.len(),
            "get_org_members took {:.2} seconds",
            started.elapsed().as_secs_f64()
        );
        Ok(Arc::new(members))
    }

    /// Authored PRs and review counts for every user, fetched in batches.
    ///
    /// Results are cached per `(usernames, org, since_days)`.
    pub async fn get_users_contributed_prs(
        &self,
        usernames: &[String],
        org: &str,
        since_days: u32,
    ) -> Result<Arc<ContributionsByUser>> {
        let key = ContributionsKey {
            usernames: usernames.to_vec(),
            org: org.to_string(),
            since_days,
        };
        self.contributions
            .get_or_try_insert_with(key, || {
                self.fetch_contributions(usernames, org, since_days)
            })
            .await
    }

    async fn fetch_contributions(
        &self,
        usernames: &[String],
        org: &str,
        since_days: u32,
    ) -> Result<Arc<ContributionsByUser>> {
        let started = Instant::now();
        let since = since_date(chrono::Utc::now(), since_days);
        let batches = partition(usernames, self.options.batch_size);
        let mut results = ContributionsByUser::with_capacity(usernames.len());
        let mut offset = 0;

        for (i, batch) in batches.iter().enumerate() {
            if i > 0 && !self.options.batch_delay.is_zero() {
                tokio::time::sleep(self.options.batch_delay).await;
            }

            info!(
                org = org,
                "Processing batch of {} users ({}-{} of {})",
                batch.len(),
                offset + 1,
                offset + batch.len(),
                usernames.len()
            );
            let batch_results = self.fetch_batch(batch, org, &since).await?;
            results.extend(batch_results);
            offset += batch.len();
        }

        info!(
            org = org,
            users = usernames.len(),
            batches = batches.len(),
            "get_users_contributed_prs took {:.2} seconds",
            started.elapsed().as_secs_f64()
        );
        Ok(Arc::new(results))
    }

    async fn fetch_batch(
        &self,
        batch: &UserBatch,
        org: &str,
        since: &str,
    ) -> Result<ContributionsByUser> {
        let query = batch.build_query(org, since);
        let query = query.as_str();

        self.options
            .retry
            .run("user_batch", move || async move {
                let response = self.send_graphql(query, json!({})).await?;
                let data = take_data(response)?;
                Ok::<_, GithubError>(batch.parse_response(&data))
            })
            .await
    }

    pub fn clear_cache(&self) {
        self.contributions.clear();
        self.members.clear();
    }

    pub fn contributions_cache_stats(&self) -> CacheStats {
        self.contributions.stats()
    }
}

/// Pull the `data` object out of a GraphQL response.
///
/// Partial errors next to data are logged and tolerated.
fn take_data(mut response: Value) -> Result<Map<String, Value>> {
    let data = response.get_mut("data").map(Value::take);
    let errors = response.get("errors").and_then(Value::as_array);

    match data {
        Some(Value::Object(map)) => {
            if let Some(errors) = errors {
                warn!(count = errors.len(), "GraphQL response carried partial errors");
            }
            Ok(map)
        }
        _ => {
            let message = errors
                .and_then(|arr| arr.first())
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("Invalid response from GitHub API: missing data");
            error!(message = message, "GraphQL response without data");
            Err(GithubError::api(None, message))
        }
    }
}

/// HTTPS only, except loopback hosts.
fn validate_endpoint(url: &str) -> Result<()> {
    let parsed = Url::parse(url)
        .map_err(|e| GithubError::config(format!("Invalid GitHub API URL {url}: {e}")))?;
    let loopback = matches!(
        parsed.host_str(),
        Some("localhost" | "127.0.0.1" | "[::1]")
    );
    match parsed.scheme() {
        "https" => Ok(()),
        "http" if loopback => {
            debug!(url = url, "Using plain HTTP endpoint on loopback");
            Ok(())
        }
        _ => Err(GithubError::config(format!(
            "GitHub API URL must use HTTPS: {url}"
        ))),
    }
}
