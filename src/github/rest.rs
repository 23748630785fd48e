use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use super::error::{GithubError, Result};
use super::graphql::GithubClient;
use super::models::{PrState, PullRequest, RateLimit};
use crate::util::time::{since_date, window_start};

const PER_PAGE: usize = 100;

pub(crate) struct RestPage<T> {
    pub body: T,
    pub rate_limit: Option<RateLimit>,
}

#[derive(Debug, Deserialize)]
struct SearchIssuesPage {
    #[serde(default)]
    items: Vec<SearchIssueItem>,
}

#[derive(Debug, Deserialize)]
struct SearchIssueItem {
    repository_url: String,
}

#[derive(Debug, Deserialize)]
struct RestUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RestPullSummary {
    number: u64,
    created_at: DateTime<Utc>,
    user: Option<RestUser>,
}

#[derive(Debug, Deserialize)]
struct RestPullDetail {
    number: u64,
    additions: u64,
    deletions: u64,
    created_at: Option<DateTime<Utc>>,
    merged_at: Option<DateTime<Utc>>,
    state: String,
}

impl GithubClient {
    async fn send_get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<RestPage<T>> {
        let url = format!("{}{}", self.rest_url, endpoint);
        let resp = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(ACCEPT, "application/vnd.github.v3+json")
            .query(params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(GithubError::api(Some(status.as_u16()), text));
        }

        let rate_limit = RateLimit::from_headers(resp.headers());
        let body = resp
            .json::<T>()
            .await
            .map_err(|e| GithubError::Decode(e.to_string()))?;
        Ok(RestPage { body, rate_limit })
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<RestPage<T>> {
        self.options
            .retry
            .run("rest_get", || self.send_get(endpoint, params))
            .await
    }

    /// Same as [`get_json`](Self::get_json), but a 404 is returned at once.
    async fn get_json_or_missing<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<RestPage<T>> {
        self.options
            .retry
            .run_if(
                "rest_get",
                |e| e.is_retryable() && e.status() != Some(404),
                || self.send_get(endpoint, params),
            )
            .await
    }

    /// True once the quota left is under the configured floor.
    fn near_rate_limit(&self, rate_limit: Option<&RateLimit>) -> bool {
        match rate_limit {
            Some(rl) if rl.is_below(self.options.rate_limit_floor) => {
                warn!(remaining = rl.remaining, "Approaching GitHub API rate limit");
                true
            }
            _ => false,
        }
    }

    /// Repositories (`owner/name`, sorted) where `username` opened PRs in the window.
    pub async fn get_user_contributed_repos(
        &self,
        username: &str,
        org: &str,
        since_days: u32,
    ) -> Result<Vec<String>> {
        let since = since_date(Utc::now(), since_days);
        let query = format!("org:{org} author:{username} created:>={since} type:pr");
        let mut repos = BTreeSet::new();
        let mut page = 1u32;

        loop {
            let params = [
                ("q", query.clone()),
                ("page", page.to_string()),
                ("per_page", PER_PAGE.to_string()),
                ("sort", "created".to_string()),
                ("order", "desc".to_string()),
            ];
            let resp: RestPage<SearchIssuesPage> = self.get_json("/search/issues", &params).await?;
            let items = resp.body.items;
            if items.is_empty() {
                break;
            }

            repos.extend(
                items
                    .iter()
                    .filter_map(|item| repo_full_name(&item.repository_url)),
            );

            if items.len() < PER_PAGE || self.near_rate_limit(resp.rate_limit.as_ref()) {
                break;
            }
            page += 1;
        }

        debug!(user = username, org = org, count = repos.len(), "Fetched contributed repos");
        Ok(repos.into_iter().collect())
    }

    /// PRs opened by `username` in `repo` during the window, with change sizes.
    ///
    /// A repository that is missing or hidden yields an empty list.
    pub async fn get_pull_requests(
        &self,
        username: &str,
        repo: &str,
        since_days: u32,
    ) -> Result<Vec<PullRequest>> {
        let cutoff = window_start(Utc::now(), since_days);
        let endpoint = format!("/repos/{repo}/pulls");
        let mut prs = Vec::new();
        let mut page = 1u32;

        loop {
            let params = [
                ("state", "all".to_string()),
                ("sort", "created".to_string()),
                ("direction", "desc".to_string()),
                ("page", page.to_string()),
                ("per_page", PER_PAGE.to_string()),
            ];
            let resp: RestPage<Vec<RestPullSummary>> =
                match self.get_json_or_missing(&endpoint, &params).await {
                    Ok(resp) => resp,
                    Err(e) if e.status() == Some(404) => {
                        warn!(repo = repo, "Repository not found or no access");
                        return Ok(Vec::new());
                    }
                    Err(e) => return Err(e),
                };
            if resp.body.is_empty() {
                break;
            }

            let recent: Vec<RestPullSummary> = resp
                .body
                .into_iter()
                .filter(|pr| pr.created_at > cutoff)
                .collect();
            if recent.is_empty() {
                break;
            }

            for summary in recent.iter().filter(|pr| {
                pr.user
                    .as_ref()
                    .is_some_and(|u| u.login.eq_ignore_ascii_case(username))
            }) {
                let detail: RestPage<RestPullDetail> = self
                    .get_json(&format!("{endpoint}/{}", summary.number), &[])
                    .await?;
                let d = detail.body;
                prs.push(PullRequest {
                    number: d.number,
                    additions: d.additions,
                    deletions: d.deletions,
                    created_at: d.created_at,
                    state: PrState::from_rest(&d.state, d.merged_at.is_some()),
                    merged_at: d.merged_at,
                    reviews_given: 0,
                });
            }

            if recent.len() < PER_PAGE || self.near_rate_limit(resp.rate_limit.as_ref()) {
                break;
            }
            page += 1;
        }

        debug!(user = username, repo = repo, count = prs.len(), "Fetched pull requests");
        Ok(prs)
    }
}

/// `https://api.github.com/repos/owner/name` -> `owner/name`
fn repo_full_name(repository_url: &str) -> Option<String> {
    let mut parts = repository_url.trim_end_matches('/').rsplit('/');
    let name = parts.next()?;
    let owner = parts.next()?;
    (!name.is_empty() && !owner.is_empty()).then(|| format!("{owner}/{name}"))
}
