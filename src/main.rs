mod config;
mod github;
mod pr;
mod report;

use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

/// pr-digest — lists the pull requests you opened on GitHub within a recent
/// lookback window.
#[derive(Parser, Debug)]
#[command(name = "pr-digest", version, about)]
struct Cli {
    /// Lookback window in days (default 100, or `query.days` from .pr-digest.toml)
    #[arg(short, long, allow_negative_numbers = true)]
    days: Option<i64>,

    /// Optional output file path for markdown report
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum number of search result pages to fetch
    #[arg(long)]
    max_pages: Option<u32>,

    /// Skip the token scope and private repository diagnostics
    #[arg(long)]
    no_probe: bool,
}

#[derive(Debug, thiserror::Error)]
#[error("GitHub token not found: set GITHUB_TOKEN or github.token in .pr-digest.toml")]
struct MissingToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let config = config::Config::load()?;
    let token = config.github_token().ok_or(MissingToken)?;

    let mut options = config.search_options();
    if let Some(max_pages) = cli.max_pages {
        options.max_pages = max_pages.max(1);
    }
    if cli.no_probe {
        options.probe = false;
    }
    let days = cli.days.unwrap_or(config.query.days);
    debug!(days, ?options, api = %config.api_base_url(), "resolved settings");

    let client = github::HttpGitHubClient::new(token.as_str(), config.api_base_url())?;
    let service = pr::PullRequestService::new(client, &token, options);

    info!("searching pull requests");
    let digest = service
        .get_user_pull_requests_by_days(Some(days))
        .instrument(info_span!("pr_digest", days))
        .await?;

    info!("generating report");
    let built_report = report::build(digest);
    report::output(&built_report, cli.output.as_deref())?;
    info!(total = built_report.total(), "done");

    Ok(())
}
