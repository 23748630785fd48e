pub mod analyzer;
pub mod cache;
pub mod github;
pub mod metrics;
pub mod report;
pub mod util;

pub use analyzer::{ContributionAnalyzer, MetricsByUser};
