//! Command-line parsing for the billing dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from ingestion/aggregation code. Resolution of flags into domain
//! values (`SourceSpec`, `PeriodSelection`) also lives here so it can be tested
//! without a terminal.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Month;
use clap::{Args, Parser, Subcommand};

use crate::data::SourceSpec;
use crate::data::sheets::DEFAULT_TIMEOUT_SECS;
use crate::domain::{PeriodMatch, YearMonth};
use crate::select::PeriodSelection;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "dairy", version, about = "Dairy billing dashboard (published Google Sheet)")]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Append logs to this file. The TUI only logs when this is set.
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard.
    Tui(TuiArgs),
    /// Print metrics, charts and the customer table once.
    Summary(SummaryArgs),
    /// Write the filtered records to a CSV file.
    Export(ExportArgs),
}

/// Where to read records from.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// CSV export URL (defaults to DAIRY_SHEET_URL, then the built-in sheet).
    #[arg(long, conflicts_with = "file")]
    pub url: Option<String>,

    /// Read a local CSV export instead of fetching the sheet.
    #[arg(short = 'f', long, value_name = "CSV")]
    pub file: Option<PathBuf>,

    /// HTTP timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

/// Which records to include.
#[derive(Debug, Args, Clone)]
pub struct FilterArgs {
    /// Year to show (defaults to the current year).
    #[arg(short = 'y', long)]
    pub year: Option<i32>,

    /// Month within the year: 1-12 or a name (`mar`, `March`).
    #[arg(short = 'm', long, value_parser = parse_month)]
    pub month: Option<Month>,

    /// Show all records regardless of period.
    #[arg(long, conflicts_with_all = ["year", "month"])]
    pub lifetime: bool,

    /// Match periods by parsed month/year instead of label substrings.
    #[arg(long)]
    pub strict_periods: bool,

    /// Only table rows whose name/period (case-insensitive) or phone contain this.
    #[arg(short = 's', long, default_value = "")]
    pub search: String,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Print the derived view as JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Skip the ASCII charts.
    #[arg(long)]
    pub no_plot: bool,

    /// Chart width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Revenue chart height (rows).
    #[arg(long, default_value_t = 10)]
    pub height: usize,

    /// Maximum table rows to print.
    #[arg(long, default_value_t = 50)]
    pub top: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Destination CSV file.
    #[arg(short, long, value_name = "CSV")]
    pub out: PathBuf,
}

impl SourceArgs {
    pub fn to_spec(&self) -> SourceSpec {
        match &self.file {
            Some(path) => SourceSpec::File(path.clone()),
            None => SourceSpec::Sheet {
                url: self.url.clone(),
                timeout: Duration::from_secs(self.timeout_secs.max(1)),
            },
        }
    }
}

impl FilterArgs {
    /// Resolve flags into a selection. `current_year` fills a missing `--year`.
    pub fn selection(&self, current_year: i32) -> PeriodSelection {
        if self.lifetime {
            return PeriodSelection::lifetime();
        }
        let year = self.year.unwrap_or(current_year);
        match self.month {
            Some(month) => YearMonth::new(year, month.number_from_month())
                .map(PeriodSelection::month)
                .unwrap_or_else(|| PeriodSelection::year(year)),
            None => PeriodSelection::year(year),
        }
    }

    pub fn period_match(&self) -> PeriodMatch {
        if self.strict_periods {
            PeriodMatch::Structured
        } else {
            PeriodMatch::Substring
        }
    }
}

/// Accept `3`, `03`, `mar`, `March` (any case).
pub fn parse_month(s: &str) -> Result<Month, String> {
    let s = s.trim();
    if let Ok(n) = s.parse::<u8>() {
        return Month::try_from(n).map_err(|_| format!("month must be 1-12, got {n}"));
    }
    s.parse::<Month>()
        .map_err(|_| format!("unknown month '{s}' (use 1-12 or a month name)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn month_values() {
        assert_eq!(parse_month("3"), Ok(Month::March));
        assert_eq!(parse_month("mar"), Ok(Month::March));
        assert_eq!(parse_month("MARCH"), Ok(Month::March));
        assert!(parse_month("13").is_err());
        assert!(parse_month("Smarch").is_err());
    }

    #[test]
    fn default_selection_is_current_year() {
        let cli = parse(&["dairy", "summary"]);
        let Command::Summary(args) = cli.command else {
            panic!("expected summary");
        };
        assert_eq!(args.filter.selection(2025), PeriodSelection::year(2025));
        assert_eq!(args.filter.period_match(), PeriodMatch::Substring);
    }

    #[test]
    fn month_and_year_resolve_to_month_selection() {
        let cli = parse(&["dairy", "export", "--out", "x.csv", "--year", "2024", "--month", "mar"]);
        let Command::Export(args) = cli.command else {
            panic!("expected export");
        };
        let march = YearMonth::new(2024, 3).unwrap();
        assert_eq!(args.filter.selection(2025), PeriodSelection::month(march));
    }

    #[test]
    fn lifetime_conflicts_with_year() {
        assert!(Cli::try_parse_from(["dairy", "summary", "--lifetime", "--year", "2024"]).is_err());
        let cli = parse(&["dairy", "summary", "--lifetime"]);
        let Command::Summary(args) = cli.command else {
            panic!("expected summary");
        };
        assert_eq!(args.filter.selection(2025), PeriodSelection::lifetime());
    }

    #[test]
    fn file_source_wins_over_sheet() {
        let cli = parse(&["dairy", "tui", "-f", "bills.csv"]);
        let Command::Tui(args) = cli.command else {
            panic!("expected tui");
        };
        assert_eq!(args.source.to_spec(), SourceSpec::File(PathBuf::from("bills.csv")));
        assert!(Cli::try_parse_from(["dairy", "tui", "-f", "a.csv", "--url", "http://x"]).is_err());
    }
}
