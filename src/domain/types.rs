//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory while filtering and aggregating
//! - exported to CSV/JSON
//! - re-ingested later from an exported CSV

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Month names in calendar order, used for selector and filter labels.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// One normalized billing row.
///
/// Every field is always present: numeric columns that fail to parse are
/// coerced to `0.0` during ingest, and rows without a customer name never
/// become a `Record`.
///
/// The serde names double as the export header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Customer Name")]
    pub customer_name: String,
    #[serde(rename = "Mobile Number")]
    pub mobile_number: String,
    #[serde(rename = "Billing Period")]
    pub billing_period: String,
    #[serde(rename = "Milk Quantity")]
    pub milk_quantity: f64,
    #[serde(rename = "Price Per Liter")]
    pub price_per_liter: f64,
    #[serde(rename = "Total Amount")]
    pub total_amount: f64,
}

/// A calendar month in a specific year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    /// 1-based month number.
    month: u32,
}

impl YearMonth {
    /// Build from a 1-based month number (`1..=12`).
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Build from a 0-based month index (`0` = January, `2` = March).
    pub fn from_zero_based(year: i32, index: u32) -> Option<Self> {
        Self::new(year, index + 1)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    /// 1-based month number.
    pub fn month(self) -> u32 {
        self.month
    }

    /// 0-based month index.
    pub fn month0(self) -> u32 {
        self.month - 1
    }

    pub fn month_name(self) -> &'static str {
        MONTH_NAMES[self.month0() as usize]
    }

    /// Full label, e.g. `March 2024`.
    pub fn full_label(self) -> String {
        format!("{} {}", self.month_name(), self.year)
    }

    /// Three-letter label, e.g. `Mar 2024`.
    pub fn short_label(self) -> String {
        format!("{} {}", &self.month_name()[..3], self.year)
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { month: self.month + 1, ..self }
        }
    }

    pub fn prev(self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { month: self.month - 1, ..self }
        }
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_label())
    }
}

/// How billing-period labels are compared against the selected year/month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodMatch {
    /// Case-insensitive substring match on the free-text label.
    ///
    /// `"2024 Archive"` matches year 2024.
    #[default]
    Substring,
    /// Parse the label into a [`YearMonth`] and compare by equality.
    ///
    /// Labels that do not parse never match a year or month filter.
    Structured,
}

/// Interpret a free-text billing-period label as a calendar date.
///
/// Month-only labels resolve to the first day of the month. Accepted shapes:
/// `January 2024`, `Jan 2024`, `2024-01`, `01/2024`, `2024-01-15`,
/// `15/01/2024`, `January 15, 2024`, `15 January 2024`.
pub fn parse_period_date(label: &str) -> Option<NaiveDate> {
    let s = label.trim();
    if s.is_empty() {
        return None;
    }

    const FULL_DATE_FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%B %d, %Y", "%d %B %Y"];
    for fmt in FULL_DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    // Month-only labels: pin the day so chrono has a complete date.
    let candidates = [
        (format!("1 {s}"), "%d %B %Y"),
        (format!("{s}-01"), "%Y-%m-%d"),
        (format!("01/{s}"), "%d/%m/%Y"),
    ];
    candidates
        .iter()
        .find_map(|(text, fmt)| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Interpret a billing-period label as a [`YearMonth`].
pub fn parse_period_month(label: &str) -> Option<YearMonth> {
    parse_period_date(label).map(YearMonth::from_date)
}
