//! Sessionlytics - Claude Code Session Token Analysis
//!
//! A fast CLI tool for analyzing Claude Code session efficiency. Parses JSONL
//! session logs from ~/.claude/projects/ and reports token usage, cache
//! performance, context growth, compaction events, and estimated cost per
//! session, with cross-session comparison and efficiency recommendations.

// Module declarations
mod config;
mod display;
mod export;
mod insights;
mod metrics;
mod models;
mod parser;
mod pricing;

// Core dependencies
use anyhow::Result;
use clap::Parser;
use config::Config;
use display::{print_info, print_warning};
use insights::Finding;
use metrics::aggregate_session;
use models::SessionMetrics;
use parser::{SessionParser, parse_session_file};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sessionlytics")]
#[command(
    about = "Claude Code session token analysis - context growth, cache efficiency, and cost per session"
)]
#[command(version)]
#[command(
    long_about = "Sessionlytics analyzes Claude Code session logs for token usage efficiency by parsing JSONL files from ~/.claude/projects/.

EXAMPLES:
  sessionlytics                   # Analyze the 5 most recent sessions
  sessionlytics -n 10             # Analyze the 10 most recent sessions
  sessionlytics -f session.jsonl  # Analyze one specific session file
  sessionlytics --json            # Full batch metrics as JSON
  sessionlytics --export out.csv  # Write the comparison as CSV"
)]
struct Cli {
    #[arg(
        short = 'n',
        long,
        value_name = "COUNT",
        help = "Number of most recent sessions to analyze (default: 5)",
        long_help = "Analyze the N most recently modified session files\nSessions are discovered under <claude_dir>/projects and ordered by file modification time\nExample: sessionlytics -n 10"
    )]
    sessions: Option<usize>,

    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Analyze a specific JSONL session file instead of auto-discovering",
        long_help = "Analyze exactly one session file instead of discovering recent ones\nThe path must exist; a missing file is a hard error\nExample: sessionlytics -f ~/.claude/projects/-home-user-app/abc123.jsonl"
    )]
    file: Option<PathBuf>,

    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "Path to Claude directory",
        long_help = "Custom path to the Claude directory holding projects/ (default: ~/.claude)\nOverrides the claude_path config setting\nExample: sessionlytics --path /custom/claude"
    )]
    path: Option<PathBuf>,

    #[arg(
        short,
        long,
        help = "Output in JSON format",
        long_help = "Output the full batch (per-session metrics, findings, most-efficient ranking)\nas one JSON document instead of the human-readable report\nExample: sessionlytics --json | jq '.sessions[0].cache_hit_rate'"
    )]
    json: bool,

    #[arg(
        long,
        value_name = "FILE",
        help = "Export per-session metrics to CSV",
        long_help = "Write one CSV row per analyzed session\nRelative paths resolve against the configured export directory\nExample: sessionlytics --export sessions.csv"
    )]
    export: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        display::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load().unwrap_or_else(|e| {
        print_warning(&format!("Failed to load config, using defaults: {}", e));
        Config::default()
    });

    let claude_dir = match &cli.path {
        Some(path) => path.clone(),
        None => config.get_claude_path()?,
    };
    let session_count = cli.sessions.unwrap_or(config.default_session_count);

    let session_files = if let Some(file) = &cli.file {
        if !file.exists() {
            anyhow::bail!("File not found: {}", file.display());
        }
        vec![file.clone()]
    } else {
        SessionParser::new(claude_dir).find_recent_sessions(session_count)?
    };

    if !cli.json {
        display::print_analysis_header(session_files.len());
    }

    let mut sessions: Vec<SessionMetrics> = Vec::new();
    for path in &session_files {
        let records = parse_session_file(path)?;
        if records.is_empty() {
            print_warning(&format!("No messages found in {}, skipping", path.display()));
            continue;
        }
        sessions.push(aggregate_session(path, &records));
    }

    if sessions.is_empty() {
        anyhow::bail!("No valid session data found");
    }

    let findings: Vec<Vec<Finding>> = sessions.iter().map(insights::session_findings).collect();
    let ranking = insights::most_efficient(&sessions);

    if cli.json {
        display::display_batch_json(&sessions, &findings, ranking.as_ref())?;
    } else {
        for (index, metrics) in sessions.iter().enumerate() {
            display::print_session_report(index, metrics);
        }
        if sessions.len() > 1 {
            display::print_comparison_table(&sessions);
        }
        display::print_recommendations(&sessions, &findings, ranking.as_ref());
        display::print_batch_summary(&sessions);
    }

    if let Some(export_path) = &cli.export {
        let resolved = if export_path.is_relative() {
            config.get_export_directory().join(export_path)
        } else {
            export_path.clone()
        };
        export::export_sessions_to_csv(&sessions, &resolved)?;
        print_info(&format!(
            "Exported session metrics to {}",
            resolved.display()
        ));
    }

    Ok(())
}
