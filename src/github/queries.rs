pub const ORG_MEMBERS_QUERY: &str = r#"
query($org: String!, $cursor: String) {
  organization(login: $org) {
    membersWithRole(first: 100, after: $cursor) {
      pageInfo {
        hasNextPage
        endCursor
      }
      nodes {
        login
        url
        type: __typename
      }
    }
  }
}
"#;

/// Authored PRs for one batch member. `{alias}` and `{search}` are filled per user.
pub const AUTHORED_SEARCH_FRAGMENT: &str = r#"
  {alias}: search(query: "{search}", type: ISSUE, first: 100) {
    issueCount
    nodes {
      ... on PullRequest {
        number
        additions
        deletions
        createdAt
        mergedAt
        state
      }
    }
  }
"#;

/// PRs reviewed by one batch member.
pub const REVIEWED_SEARCH_FRAGMENT: &str = r#"
  {alias}: search(query: "{search}", type: ISSUE, first: 100) {
    issueCount
    nodes {
      ... on PullRequest {
        number
        author { login }
      }
    }
  }
"#;

/// Per-alias node cap imposed by the search API.
pub const SEARCH_NODE_LIMIT: usize = 100;
