//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - loads billing records and derives the dashboard view
//! - prints summaries, writes exports, or starts the TUI

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::cli::{Command, ExportArgs, SummaryArgs, TuiArgs};
use crate::error::AppError;
use crate::session::LocalSession;

pub mod pipeline;

/// Entry point for the `dairy` binary.
pub fn run() -> Result<(), AppError> {
    // `dairy` and `dairy --year 2024` behave like `dairy tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let level = if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let is_tui = matches!(cli.command, Command::Tui(_));
    init_logger(level, cli.log_file.as_deref(), is_tui)?;

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Summary(args) => handle_summary(args),
        Command::Export(args) => handle_export(args),
    }
}

fn handle_summary(args: SummaryArgs) -> Result<(), AppError> {
    let run = pipeline::load_view(&args.source, &args.filter)?;

    if args.json {
        let json = serde_json::to_string_pretty(&run)
            .map_err(|e| AppError::new(4, format!("Failed to serialize summary: {e}")))?;
        println!("{json}");
        return Ok(());
    }

    println!("{}", crate::report::format_summary(&run.view, &run.source));

    if !args.no_plot {
        println!(
            "{}",
            crate::plot::render_column_chart("Revenue Trends", &run.view.revenue_by_period, args.width, args.height)
        );
        println!(
            "{}",
            crate::plot::render_bar_chart("Milk Distribution", &run.view.quantity_by_period, args.width, "L")
        );
    }

    println!("{}", crate::report::format_table(&run.table_rows(), args.top));
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    let run = pipeline::load_view(&args.source, &args.filter)?;
    let rows = run.table_rows();
    crate::io::write_records_csv(&args.out, &rows)?;
    println!("Wrote {} rows ({}) to {}", rows.len(), run.view.label, args.out.display());
    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    let mut session = LocalSession::from_env();
    crate::tui::run(args, &mut session)
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise only this crate logs at `level`.
/// One-shot commands log to stderr. The TUI owns the terminal, so it logs to
/// `--log-file` or nowhere.
fn init_logger(level: LevelFilter, log_file: Option<&Path>, is_tui: bool) -> Result<(), AppError> {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level)),
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| AppError::new(2, format!("Failed to open log file '{}': {e}", path.display())))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None if is_tui => builder.with_writer(std::io::sink).init(),
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

/// Rewrite argv so `dairy` defaults to `dairy tui`.
///
/// Rules:
/// - `dairy`                      -> `dairy tui`
/// - `dairy --year 2024 ...`      -> `dairy tui --year 2024 ...`
/// - `dairy --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "summary" | "export");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_tui() {
        assert_eq!(rewrite_args(argv(&["dairy"])), argv(&["dairy", "tui"]));
    }

    #[test]
    fn leading_flags_go_to_tui() {
        assert_eq!(
            rewrite_args(argv(&["dairy", "--year", "2024"])),
            argv(&["dairy", "tui", "--year", "2024"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        for args in [
            argv(&["dairy", "summary", "--json"]),
            argv(&["dairy", "export", "-o", "x.csv"]),
            argv(&["dairy", "--help"]),
            argv(&["dairy", "-V"]),
        ] {
            assert_eq!(rewrite_args(args.clone()), args);
        }
    }

    #[test]
    fn rewritten_args_parse() {
        let cli = crate::cli::Cli::try_parse_from(rewrite_args(argv(&["dairy", "-f", "bills.csv"]))).unwrap();
        assert!(matches!(cli.command, Command::Tui(_)));
    }
}
