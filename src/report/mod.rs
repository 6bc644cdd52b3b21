pub mod types;

pub use types::{Report, StateCount};

use crate::pr::{Digest, PrState};
use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Build a Report from a finished search, tallying pull requests by state.
pub fn build(digest: Digest) -> Report {
    let counts = PrState::ALL
        .iter()
        .map(|&state| StateCount {
            state,
            count: digest
                .pull_requests
                .iter()
                .filter(|pr| pr.state == state)
                .count(),
        })
        .filter(|c| c.count > 0)
        .collect();

    Report {
        login: digest.login.to_string(),
        range: digest.range.to_string(),
        query: digest.query,
        pull_requests: digest.pull_requests,
        counts,
    }
}

/// Output the report to terminal (default) or to a markdown file.
#[instrument(skip(report), fields(login = %report.login, total = report.total()))]
pub fn output(report: &Report, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing report to terminal");
            print_terminal_report(report);
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing report to file");
            write_markdown_report(report, path)
        }
    }
}

/// Print the report to the terminal with colors:
///
/// @alice: 2 pull requests created 2025-01-01..2025-04-11
///
/// ═══ Pull Requests ═══
///   • #42 [OPEN] Add OAuth2 login flow (created 2025-03-01T10:00:00Z)
///     https://api.github.com/repos/org/repo/issues/42
///
/// ═══ open: 1 | closed: 1 ═══
fn print_terminal_report(report: &Report) {
    println!();
    println!(
        "@{}: {} pull requests created {}",
        report.login.bold(),
        report.total(),
        report.range
    );
    println!("Query: {}", report.query.dimmed());
    println!();

    println!("═══ Pull Requests ═══");
    if report.pull_requests.is_empty() {
        println!("  No pull requests in this window.");
    } else {
        for pr in &report.pull_requests {
            println!(
                "  • #{} [{}] {} (created {})",
                pr.number,
                colorize_state(pr.state),
                pr.title,
                pr.created_at
            );
            println!("    {}", pr.url.dimmed());
        }
    }
    println!();

    println!("═══ {} ═══", summary_line(report));
    println!();
}

/// Write the report as a markdown file.
fn write_markdown_report(report: &Report, path: &Path) -> Result<(), ReportError> {
    let mut md = String::new();
    md.push_str(&format!("# Pull requests by @{}\n\n", report.login));
    md.push_str(&format!(
        "**Created:** {} | **Total:** {}\n\n",
        report.range,
        report.total()
    ));
    md.push_str(&format!("Query: `{}`\n\n", report.query));

    if report.pull_requests.is_empty() {
        md.push_str("No pull requests in this window.\n\n");
    } else {
        md.push_str("| # | State | Title | Created | Updated |\n");
        md.push_str("|---|-------|-------|---------|---------|\n");
        for pr in &report.pull_requests {
            md.push_str(&format!(
                "| [{}]({}) | {} | {} | {} | {} |\n",
                pr.number,
                pr.url,
                pr.state,
                pr.title.replace('|', "\\|"),
                pr.created_at,
                pr.updated_at
            ));
        }
        md.push('\n');
    }

    md.push_str(&format!("## {}\n", summary_line(report)));

    std::fs::write(path, md)?;
    Ok(())
}

fn summary_line(report: &Report) -> String {
    if report.counts.is_empty() {
        return "Total: 0".to_string();
    }
    report
        .counts
        .iter()
        .map(|c| format!("{}: {}", c.state, c.count))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Helper to colorize a PR state for terminal output.
fn colorize_state(state: PrState) -> colored::ColoredString {
    let label = state.to_string().to_uppercase();
    match state {
        PrState::Open => label.green().bold(),
        PrState::Draft => label.dimmed(),
        PrState::Merged => label.magenta().bold(),
        PrState::Closed => label.red(),
    }
}
