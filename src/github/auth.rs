use std::process::Command;
use tracing::debug;

use super::error::{GithubError, Result};

/// Resolve a GitHub token, first match wins:
/// 1. the explicit argument
/// 2. `GITHUB_TOKEN` environment variable
/// 3. `GH_TOKEN` environment variable
/// 4. `gh auth token` subprocess
pub fn resolve_token(explicit: Option<&str>) -> Result<String> {
    resolve_token_with(explicit, |name| std::env::var(name).ok(), gh_cli_token)
}

pub(crate) fn resolve_token_with<E, G>(explicit: Option<&str>, env: E, gh_cli: G) -> Result<String>
where
    E: Fn(&str) -> Option<String>,
    G: FnOnce() -> Option<String>,
{
    if let Some(token) = explicit.map(str::trim)
        && !token.is_empty()
    {
        debug!("Token passed explicitly");
        return Ok(token.to_string());
    }

    for var in ["GITHUB_TOKEN", "GH_TOKEN"] {
        if let Some(token) = env(var)
            && !token.trim().is_empty()
        {
            debug!(var = var, "Token resolved via env var");
            return Ok(token.trim().to_string());
        }
    }

    if let Some(token) = gh_cli() {
        debug!("Token resolved via gh CLI");
        return Ok(token);
    }

    Err(GithubError::config(
        "GitHub token is required. Either:\n\
         - pass --token\n\
         - set the GITHUB_TOKEN or GH_TOKEN environment variable\n\
         - run `gh auth login` to authenticate with the GitHub CLI",
    ))
}

fn gh_cli_token() -> Option<String> {
    debug!("Attempting to resolve token via `gh auth token`");
    let output = Command::new("gh").args(["auth", "token"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!token.is_empty()).then_some(token)
}
