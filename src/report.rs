use crate::analyzer::MetricsByUser;
use crate::github::{ContributionMetrics, Member};

const METRIC_HEADERS: [&str; 8] = [
    "Username",
    "Total PRs",
    "Median Changes",
    "Additions",
    "Deletions",
    "Reviews Given",
    "Total Changes",
    "Impact Score",
];

/// `1234567` -> `1,234,567`
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn rounded(value: f64) -> String {
    thousands(value.round().max(0.0) as u64)
}

fn metric_row(username: &str, m: &ContributionMetrics) -> Vec<String> {
    vec![
        username.to_string(),
        m.total_prs.to_string(),
        rounded(m.median_changes),
        thousands(m.total_additions),
        thousands(m.total_deletions),
        m.reviews_given.to_string(),
        thousands(m.total_changes()),
        rounded(m.multiplied_changes()),
    ]
}

/// Metrics table, busiest users (by total changes) first.
pub fn render_metrics_table(org: &str, days: u32, results: &MetricsByUser) -> String {
    let mut sorted: Vec<(&String, &ContributionMetrics)> = results.iter().collect();
    sorted.sort_by(|a, b| b.1.total_changes().cmp(&a.1.total_changes()));

    let rows: Vec<Vec<String>> = sorted.iter().map(|(u, m)| metric_row(u, m)).collect();
    let title = format!("Contribution Metrics in {org} (Last {days} days)");
    render(&title, &METRIC_HEADERS, &rows, &[0])
}

pub fn render_members_table(org: &str, members: &[Member]) -> String {
    let rows: Vec<Vec<String>> = members
        .iter()
        .map(|m| vec![m.login.clone(), m.kind.clone(), m.url.clone()])
        .collect();
    let title = format!("Members of {org} ({})", members.len());
    render(&title, &["Login", "Type", "URL"], &rows, &[0, 1, 2])
}

pub fn render_repos_table(
    username: &str,
    repos: &[(String, Option<ContributionMetrics>)],
) -> String {
    let with_metrics = repos.iter().any(|(_, m)| m.is_some());
    let rows: Vec<Vec<String>> = repos
        .iter()
        .map(|(repo, m)| match m {
            Some(m) if with_metrics => vec![
                repo.clone(),
                m.total_prs.to_string(),
                thousands(m.total_additions),
                thousands(m.total_deletions),
            ],
            _ => vec![repo.clone()],
        })
        .collect();
    let title = format!("Repositories with PRs by {username} ({})", repos.len());
    if with_metrics {
        render(
            &title,
            &["Repository", "PRs", "Additions", "Deletions"],
            &rows,
            &[0],
        )
    } else {
        render(&title, &["Repository"], &rows, &[0])
    }
}

/// Plain box table. Columns listed in `left` are left aligned, the rest right.
fn render(title: &str, headers: &[&str], rows: &[Vec<String>], left: &[usize]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let separator = {
        let parts: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
        format!("+{}+", parts.join("+"))
    };
    let line = |cells: &[String]| {
        let parts: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                if left.contains(&i) {
                    format!(" {cell:<w$} ")
                } else {
                    format!(" {cell:>w$} ")
                }
            })
            .collect();
        format!("|{}|", parts.join("|"))
    };

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    out.push_str(&separator);
    out.push('\n');
    out.push_str(&line(&header_cells));
    out.push('\n');
    out.push_str(&separator);
    out.push('\n');
    for row in rows {
        out.push_str(&line(row));
        out.push('\n');
    }
    out.push_str(&separator);
    out.push('\n');
    out
}
