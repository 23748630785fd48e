use ghcontrib::github::models::{ContributionMetrics, Member, PrState, PullRequest, RateLimit};
use reqwest::header::{HeaderMap, HeaderValue};

#[test]
fn test_pr_changes() {
    let pr = PullRequest {
        number: 1,
        additions: 120,
        deletions: 30,
        created_at: Some(chrono::Utc::now()),
        merged_at: None,
        state: PrState::Open,
        reviews_given: 0,
    };
    assert_eq!(pr.changes(), 150);
}

#[test]
fn test_pr_state_from_graphql() {
    let states: Vec<PrState> =
        serde_json::from_str(r#"["OPEN", "CLOSED", "MERGED", "DRAFT"]"#).unwrap();
    assert_eq!(
        states,
        vec![
            PrState::Open,
            PrState::Closed,
            PrState::Merged,
            PrState::Unknown
        ]
    );
    assert_eq!(PrState::default(), PrState::Unknown);
}

#[test]
fn test_empty_metrics() {
    let m = ContributionMetrics::empty();
    assert_eq!(m.total_prs, 0);
    assert_eq!(m.median_changes, 0.0);
    assert_eq!(m.total_additions, 0);
    assert_eq!(m.total_deletions, 0);
    assert_eq!(m.reviews_given, 0);
    assert_eq!(m.multiplied_changes(), 0.0);
}

#[test]
fn test_impact_score_tracks_fields() {
    let m = ContributionMetrics {
        total_prs: 3,
        median_changes: 12.5,
        total_additions: 30,
        total_deletions: 10,
        reviews_given: 2,
    };
    assert_eq!(m.multiplied_changes(), 37.5);
    assert_eq!(m.total_changes(), 40);
}

#[test]
fn test_member_type_field() {
    let member: Member = serde_json::from_str(
        r#"{"login": "octocat", "url": "https://github.com/octocat", "type": "User"}"#,
    )
    .unwrap();
    assert_eq!(member.login, "octocat");
    assert_eq!(member.kind, "User");
}

#[test]
fn test_rate_limit_from_headers() {
    let mut headers = HeaderMap::new();
    headers.insert("x-ratelimit-remaining", HeaderValue::from_static("9"));
    headers.insert("x-ratelimit-limit", HeaderValue::from_static("5000"));
    headers.insert("x-ratelimit-reset", HeaderValue::from_static("1700000000"));

    let rl = RateLimit::from_headers(&headers).unwrap();
    assert_eq!(rl.remaining, 9);
    assert_eq!(rl.limit, 5000);
    assert_eq!(rl.reset_at.unwrap().timestamp(), 1_700_000_000);
    assert!(rl.is_below(10));
    assert!(!rl.is_below(9));
}

#[test]
fn test_rate_limit_absent_without_remaining_header() {
    let headers = HeaderMap::new();
    assert!(RateLimit::from_headers(&headers).is_none());
}

#[test]
fn test_rate_limit_default() {
    let rl = RateLimit::default();
    assert_eq!(rl.remaining, 0);
    assert_eq!(rl.limit, 0);
    assert!(rl.reset_at.is_none());
}
