pub mod auth;
pub mod batch;
pub mod error;
pub mod graphql;
pub mod models;
pub mod queries;
pub mod rest;
pub mod retry;

pub use error::GithubError;
pub use graphql::{ClientOptions, GithubClient};
pub use models::*;
pub use retry::RetryPolicy;
