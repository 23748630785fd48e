use crate::github::models::{ContributionMetrics, PullRequest};

/// Median of a list of values; `0.0` for an empty list.
pub fn median(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    } else {
        sorted[mid] as f64
    }
}

/// Contribution metrics for one user's pull requests.
///
/// PR state is not considered: open, closed and merged PRs weigh the same.
pub fn aggregate(prs: &[PullRequest]) -> ContributionMetrics {
    let Some(first) = prs.first() else {
        return ContributionMetrics::empty();
    };

    let changes: Vec<u64> = prs.iter().map(PullRequest::changes).collect();

    ContributionMetrics {
        total_prs: prs.len(),
        median_changes: median(&changes),
        total_additions: prs.iter().map(|pr| pr.additions).sum(),
        total_deletions: prs.iter().map(|pr| pr.deletions).sum(),
        // Same on every PR of the user by construction.
        reviews_given: first.reviews_given,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::models::PrState;

    fn pr(additions: u64, deletions: u64) -> PullRequest {
        PullRequest {
            number: additions * 1000 + deletions,
            additions,
            deletions,
            created_at: None,
            merged_at: None,
            state: PrState::Open,
            reviews_given: 4,
        }
    }

    #[test]
    fn empty_list_gives_zero_metrics() {
        let metrics = aggregate(&[]);
        assert_eq!(metrics, ContributionMetrics::empty());
        assert_eq!(metrics.total_prs, 0);
        assert_eq!(metrics.median_changes, 0.0);
        assert_eq!(metrics.reviews_given, 0);
        assert_eq!(metrics.multiplied_changes(), 0.0);
    }

    #[test]
    fn odd_count_median_is_middle_value() {
        let metrics = aggregate(&[pr(30, 0), pr(10, 0), pr(15, 5)]);
        assert_eq!(metrics.median_changes, 20.0);
    }

    #[test]
    fn even_count_median_averages_middle_pair() {
        let metrics = aggregate(&[pr(10, 0), pr(20, 0), pr(30, 0), pr(40, 0)]);
        assert_eq!(metrics.median_changes, 25.0);
    }

    #[test]
    fn totals_are_sums() {
        let metrics = aggregate(&[pr(5, 2), pr(3, 1)]);
        assert_eq!(metrics.total_additions, 8);
        assert_eq!(metrics.total_deletions, 3);
        assert_eq!(metrics.total_changes(), 11);
        assert_eq!(metrics.total_prs, 2);
    }

    #[test]
    fn reviews_given_is_copied_not_summed() {
        let metrics = aggregate(&[pr(1, 1), pr(2, 2), pr(3, 3)]);
        assert_eq!(metrics.reviews_given, 4);
    }

    #[test]
    fn impact_score_is_median_times_count() {
        let lists = [
            vec![pr(7, 3)],
            vec![pr(10, 0), pr(21, 0)],
            vec![pr(1, 0), pr(2, 0), pr(100, 50), pr(9, 9), pr(0, 3)],
        ];
        for prs in &lists {
            let metrics = aggregate(prs);
            assert_eq!(
                metrics.multiplied_changes(),
                metrics.median_changes * metrics.total_prs as f64
            );
        }
        assert_eq!(aggregate(&lists[1]).multiplied_changes(), 31.0);
    }

    #[test]
    fn all_states_are_counted() {
        let mut closed = pr(4, 0);
        closed.state = PrState::Closed;
        let mut merged = pr(6, 0);
        merged.state = PrState::Merged;

        let metrics = aggregate(&[pr(2, 0), closed, merged]);
        assert_eq!(metrics.total_prs, 3);
        assert_eq!(metrics.median_changes, 4.0);
    }
}
