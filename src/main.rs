use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use ghcontrib::ContributionAnalyzer;
use ghcontrib::report;
use ghcontrib::util::config::AppConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "ghcontrib",
    version,
    about = "GitHub contribution metrics for organization members"
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging to file
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze contributions for specific users in an organization
    Analyze {
        /// GitHub username (repeat for several)
        #[arg(short = 'u', long = "username", required = true)]
        usernames: Vec<String>,

        /// GitHub organization name
        #[arg(short, long)]
        org: String,

        /// Number of days to analyze
        #[arg(short, long)]
        days: Option<u32>,

        /// GitHub API token (falls back to GITHUB_TOKEN, GH_TOKEN, then `gh auth token`)
        #[arg(short, long)]
        token: Option<String>,
    },

    /// List organization members
    Members {
        #[arg(short, long)]
        org: String,

        #[arg(short, long)]
        token: Option<String>,
    },

    /// Analyze every member of an organization
    AnalyzeAll {
        #[arg(short, long)]
        org: String,

        #[arg(short, long)]
        days: Option<u32>,

        /// Minimum number of PRs for a user to be listed
        #[arg(long)]
        min_prs: Option<usize>,

        #[arg(short, long)]
        token: Option<String>,
    },

    /// List repositories a user opened pull requests in
    Repos {
        #[arg(short = 'u', long = "username")]
        username: String,

        #[arg(short, long)]
        org: String,

        #[arg(short, long)]
        days: Option<u32>,

        /// Also fetch per-repository PR totals
        #[arg(long)]
        details: bool,

        #[arg(short, long)]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    let _guard = setup_logging(&config, cli.debug)?;

    info!("ghcontrib starting");

    match cli.command {
        Command::Analyze {
            usernames,
            org,
            days,
            token,
        } => {
            let days = days.unwrap_or(config.analysis.default_days);
            let analyzer = ContributionAnalyzer::new(token.as_deref(), &config)?;
            let results = analyzer
                .analyze_users(&usernames, &org, days)
                .await
                .with_context(|| format!("Failed to analyze contributions in {org}"))?;
            if results.is_empty() {
                bail!("No data found for any users in {org}");
            }
            println!("\n{}", report::render_metrics_table(&org, days, &results));
        }
        Command::Members { org, token } => {
            let analyzer = ContributionAnalyzer::new(token.as_deref(), &config)?;
            let members = analyzer
                .list_org_members(&org)
                .await
                .with_context(|| format!("Failed to list members of {org}"))?;
            println!("\n{}", report::render_members_table(&org, &members));
        }
        Command::AnalyzeAll {
            org,
            days,
            min_prs,
            token,
        } => {
            let days = days.unwrap_or(config.analysis.default_days);
            let min_prs = min_prs.unwrap_or(config.analysis.min_prs);
            let analyzer = ContributionAnalyzer::new(token.as_deref(), &config)?;
            let results = analyzer
                .analyze_org(&org, days, min_prs)
                .await
                .with_context(|| format!("Failed to analyze members of {org}"))?;
            if results.is_empty() {
                bail!("No members of {org} have at least {min_prs} PRs in the last {days} days");
            }
            println!("\n{}", report::render_metrics_table(&org, days, &results));
        }
        Command::Repos {
            username,
            org,
            days,
            details,
            token,
        } => {
            let days = days.unwrap_or(config.analysis.default_days);
            let analyzer = ContributionAnalyzer::new(token.as_deref(), &config)?;
            let repos = analyzer
                .user_repositories(&username, &org, days, details)
                .await
                .with_context(|| format!("Failed to list repositories for {username}"))?;
            println!("\n{}", report::render_repos_table(&username, &repos));
        }
    }

    Ok(())
}

fn setup_logging(
    config: &AppConfig,
    debug: bool,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    if !debug {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("ghcontrib=info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    }

    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "ghcontrib.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter("ghcontrib=debug")
        .with_ansi(false)
        .init();

    Ok(Some(guard))
}
