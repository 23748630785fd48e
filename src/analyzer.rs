use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::github::error::Result;
use crate::github::{ContributionMetrics, GithubClient, GithubError, Member, auth};
use crate::metrics::aggregate;
use crate::util::config::AppConfig;

/// Contribution metrics per username, in the order usernames were given.
pub type MetricsByUser = IndexMap<String, ContributionMetrics>;

/// Entry point for callers: fetch activity and turn it into metrics.
///
/// Assumes one caller driving it at a time. Concurrent identical requests are
/// still collapsed into one network round trip by the client cache.
#[derive(Clone)]
pub struct ContributionAnalyzer {
    client: GithubClient,
}

impl ContributionAnalyzer {
    /// Fails with a config error when no token can be resolved.
    pub fn new(token: Option<&str>, config: &AppConfig) -> Result<Self> {
        let token = auth::resolve_token(token)?;
        let client = GithubClient::new(
            &token,
            &config.github.graphql_url,
            &config.github.rest_url,
            config.fetch.client_options(),
        )?;
        Ok(Self { client })
    }

    pub fn with_client(client: GithubClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GithubClient {
        &self.client
    }

    pub async fn analyze_users(
        &self,
        usernames: &[String],
        org: &str,
        days: u32,
    ) -> Result<MetricsByUser> {
        if usernames.is_empty() {
            return Err(GithubError::config("at least one username is required"));
        }
        if days == 0 {
            return Err(GithubError::config("the day window must be positive"));
        }

        info!(org = org, users = usernames.len(), days = days, "Fetching contributions");
        let all_prs = self
            .client
            .get_users_contributed_prs(usernames, org, days)
            .await?;

        let mut results = MetricsByUser::with_capacity(usernames.len());
        for username in usernames {
            let metrics = match all_prs.get(username) {
                Some(prs) => {
                    debug!(user = %username, prs = prs.len(), "Processing metrics");
                    aggregate(prs)
                }
                None => ContributionMetrics::empty(),
            };
            results.insert(username.clone(), metrics);
        }
        Ok(results)
    }

    pub async fn list_org_members(&self, org: &str) -> Result<Arc<Vec<Member>>> {
        self.client.get_org_members(org).await
    }

    /// Analyze every member of `org`, keeping those with at least `min_prs` PRs.
    pub async fn analyze_org(&self, org: &str, days: u32, min_prs: usize) -> Result<MetricsByUser> {
        let members = self.list_org_members(org).await?;
        let usernames: Vec<String> = members.iter().map(|m| m.login.clone()).collect();
        if usernames.is_empty() {
            return Ok(MetricsByUser::new());
        }

        let mut results = self.analyze_users(&usernames, org, days).await?;
        results.retain(|_, metrics| metrics.total_prs >= min_prs);
        info!(
            org = org,
            members = usernames.len(),
            kept = results.len(),
            min_prs = min_prs,
            "Org analysis complete"
        );
        Ok(results)
    }

    /// Repositories the user opened PRs in, with their PRs when `with_prs` is set.
    pub async fn user_repositories(
        &self,
        username: &str,
        org: &str,
        days: u32,
        with_prs: bool,
    ) -> Result<Vec<(String, Option<ContributionMetrics>)>> {
        let repos = self
            .client
            .get_user_contributed_repos(username, org, days)
            .await?;

        let mut out = Vec::with_capacity(repos.len());
        for repo in repos {
            let metrics = if with_prs {
                let prs = self.client.get_pull_requests(username, &repo, days).await?;
                Some(aggregate(&prs))
            } else {
                None
            };
            out.push((repo, metrics));
        }
        Ok(out)
    }

    pub fn clear_cache(&self) {
        self.client.clear_cache();
    }
}
