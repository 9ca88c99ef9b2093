//! analyze - record ESLint findings for the HEAD commit of a repository

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use codequality::config;
use codequality::finding::Severity;
use codequality::output::is_quiet;
use codequality::pipeline::{self, RunRequest, RunSummary};
use codequality::ui::{self, Icons};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit status for any failed run
const EXIT_RUN_FAILED: u8 = 2;

#[derive(Parser)]
#[command(name = "analyze")]
#[command(version)]
#[command(about = "Clone a GitHub repository, lint it with ESLint and record the findings in SQLite")]
#[command(long_about = r#"
Clones https://github.com/<owner>/<repo>, runs ESLint over its JavaScript and
TypeScript sources and stores the HEAD commit plus one row per finding in the
SQLite database at <db_path>.

Tool locations and other settings are read from codequality.toml (or the file
named by CODEQUALITY_CONFIG); set RUST_LOG to change log verbosity.

Example usage:
  analyze facebook react ./code_quality.db
"#)]
struct Cli {
    /// Repository owner (user or organization)
    owner: String,

    /// Repository name
    repo: String,

    /// Path to the SQLite database file
    db_path: PathBuf,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(_) => {
            eprintln!("{}", Cli::command().render_usage());
            return ExitCode::from(1);
        }
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let category = err
                .downcast_ref::<codequality::Error>()
                .map(codequality::Error::category)
                .unwrap_or("config");
            tracing::error!(
                category,
                owner = %cli.owner,
                repo = %cli.repo,
                db = %cli.db_path.display(),
                "run failed: {:#}",
                err
            );
            ui::error(&format!("[{}] {:#}", category, err));
            ExitCode::from(EXIT_RUN_FAILED)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = config::resolve_config(None)?;
    config::ensure_db_dir(&cli.db_path)?;

    ui::header(&format!("Analyzing repository: {}/{}", cli.owner, cli.repo));
    ui::info(Icons::DATABASE, "Database", &cli.db_path.display().to_string());

    let request = RunRequest::github(&cli.owner, &cli.repo, &cli.db_path);
    let summary = pipeline::run(&request, &config)?;

    print_summary(cli, &summary);
    Ok(())
}

fn print_summary(cli: &Cli, summary: &RunSummary) {
    ui::section("Summary");
    ui::summary_row(
        "Commit:",
        &format!("{} {}", summary.commit.short_hash(), summary.commit.summary()),
    );
    ui::summary_row("Author:", &summary.commit.author);
    ui::summary_row(
        "Files analyzed:",
        &format!("{} ({} source files found)", summary.files_reported, summary.source_files),
    );

    let high = summary
        .severity_counts
        .iter()
        .find(|(severity, _)| *severity == Severity::High)
        .map(|(_, count)| *count)
        .unwrap_or(0);
    ui::summary_row(
        "Issues:",
        &format!(
            "{} ({} high)",
            summary.issue_count(),
            high.style(ui::theme().severity(Severity::High))
        ),
    );
    if summary.record.replaced > 0 {
        ui::summary_row(
            "Replaced:",
            &ui::dim(&format!("{} findings from an earlier run", summary.record.replaced)),
        );
    }
    if let Some(count) = summary.history_commits {
        ui::summary_row("History:", &format!("{} commits recorded", count));
    }

    if !is_quiet() {
        let table = ui::severity_table(&summary.severity_counts);
        if !table.is_empty() {
            println!();
            println!("{}", table);
        }
    }

    ui::success(&format!(
        "Analyzed {} files in {}; results saved to {}",
        summary.files_reported,
        cli.repo,
        cli.db_path.display()
    ));
}
