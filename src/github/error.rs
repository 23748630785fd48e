use thiserror::Error;

/// Errors surfaced while resolving credentials or talking to GitHub.
#[derive(Debug, Error)]
pub enum GithubError {
    /// Missing credential or unusable local settings. Never retried.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Connection, timeout or other network-level failure.
    #[error("network error talking to GitHub: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx status, or a GraphQL response without usable `data`.
    #[error("GitHub API error{}: {message}", fmt_status(.status))]
    Api {
        status: Option<u16>,
        message: String,
    },

    /// The organization lookup came back empty.
    #[error("organization not found or no access: {org}")]
    OrgNotFound { org: String },

    /// The response body was not the JSON shape we asked for.
    #[error("failed to decode GitHub response: {0}")]
    Decode(String),
}

impl GithubError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether the retry policy may try the failed call again. Any failed
    /// request is retried; local configuration and a missing org are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Api { .. } | Self::Decode(_) => true,
            Self::Config { .. } | Self::OrgNotFound { .. } => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, GithubError>;
