use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::github::{ClientOptions, RetryPolicy};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_true")]
    pub jitter: bool,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_rate_limit_floor")]
    pub rate_limit_floor: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_days")]
    pub default_days: u32,
    #[serde(default = "default_min_prs")]
    pub min_prs: usize,
}

fn default_graphql_url() -> String {
    "https://api.github.com/graphql".to_string()
}
fn default_rest_url() -> String {
    "https://api.github.com".to_string()
}
fn default_batch_size() -> usize {
    25
}
fn default_batch_delay_ms() -> u64 {
    1000
}
fn default_max_retries() -> u32 {
    3
}
fn default_backoff_base_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}
fn default_cache_capacity() -> usize {
    32
}
fn default_rate_limit_floor() -> u32 {
    10
}
fn default_days() -> u32 {
    7
}
fn default_min_prs() -> usize {
    1
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            graphql_url: default_graphql_url(),
            rest_url: default_rest_url(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            jitter: true,
            cache_capacity: default_cache_capacity(),
            rate_limit_floor: default_rate_limit_floor(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_days: default_days(),
            min_prs: default_min_prs(),
        }
    }
}

impl FetchConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.backoff_base_ms),
            self.jitter,
        )
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            retry: self.retry_policy(),
            batch_size: self.batch_size,
            batch_delay: self.batch_delay(),
            cache_capacity: self.cache_capacity,
            rate_limit_floor: self.rate_limit_floor,
        }
    }
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: AppConfig =
                toml::from_str(&content).with_context(|| "Failed to parse config file")?;
            return Ok(config);
        }

        let mut candidates = Vec::new();

        // 1. ~/.config/ghcontrib/config.toml
        if let Some(home) = std::env::var_os("HOME") {
            candidates.push(PathBuf::from(home).join(".config/ghcontrib/config.toml"));
        }

        // 2. Platform-specific path (macOS: ~/Library/Application Support/ghcontrib/)
        if let Some(proj_dirs) = ProjectDirs::from("", "", "ghcontrib") {
            candidates.push(proj_dirs.config_dir().join("config.toml"));
        }

        for config_path in &candidates {
            if config_path.exists() {
                let content = std::fs::read_to_string(config_path).with_context(|| {
                    format!("Failed to read config file: {}", config_path.display())
                })?;
                let config: AppConfig =
                    toml::from_str(&content).with_context(|| "Failed to parse config file")?;
                return Ok(config);
            }
        }

        Ok(AppConfig::default())
    }

    pub fn log_dir(&self) -> PathBuf {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "ghcontrib") {
            return proj_dirs.data_dir().join("logs");
        }
        PathBuf::from(".local/share/ghcontrib/logs")
    }
}
