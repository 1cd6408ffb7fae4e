//! Period selection, record filtering and table search.
//!
//! Filtering policy (first match wins):
//!
//! 1. no year selected → every record (the "lifetime" view), whatever the month
//! 2. year but no month → labels containing the year
//! 3. month selected → labels containing `March 2024` or `Mar 2024`
//!
//! Matching is case-insensitive substring matching unless the structured mode
//! is requested, in which case labels are parsed into a `YearMonth`.

use serde::{Deserialize, Serialize};

use crate::domain::{PeriodMatch, Record, YearMonth, parse_period_month};

/// The active year/month filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSelection {
    pub year: Option<i32>,
    pub month: Option<YearMonth>,
}

impl PeriodSelection {
    pub fn lifetime() -> Self {
        Self::default()
    }

    pub fn year(year: i32) -> Self {
        Self {
            year: Some(year),
            month: None,
        }
    }

    pub fn month(month: YearMonth) -> Self {
        Self {
            year: Some(month.year()),
            month: Some(month),
        }
    }

    /// Label shown on the selector button.
    pub fn label(&self) -> String {
        match (self.month, self.year) {
            (Some(month), _) => month.full_label(),
            (None, Some(year)) => format!("All of {year}"),
            (None, None) => "Lifetime Data".to_string(),
        }
    }
}

/// Selector state: the year being browsed plus the applied selection.
///
/// Mirrors the popover month picker: year arrows browse *and* apply the year,
/// picking a month applies it in the browsed year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodSelector {
    browse_year: i32,
    selection: PeriodSelection,
}

impl PeriodSelector {
    /// Start on the given (usually current) year with no month.
    pub fn new(current_year: i32) -> Self {
        Self {
            browse_year: current_year,
            selection: PeriodSelection::year(current_year),
        }
    }

    pub fn with_selection(browse_year: i32, selection: PeriodSelection) -> Self {
        Self {
            browse_year,
            selection,
        }
    }

    pub fn selection(&self) -> PeriodSelection {
        self.selection
    }

    pub fn browse_year(&self) -> i32 {
        self.browse_year
    }

    pub fn label(&self) -> String {
        match (self.selection.month, self.selection.year) {
            (Some(month), _) => month.full_label(),
            (None, Some(_)) => format!("All of {}", self.browse_year),
            (None, None) => "Lifetime Data".to_string(),
        }
    }

    /// Step the browsed year by `delta` and apply it. A selected month is kept.
    pub fn shift_year(&mut self, delta: i32) {
        self.browse_year += delta;
        self.selection.year = Some(self.browse_year);
    }

    /// Select a month (0-based index) in the browsed year.
    pub fn select_month(&mut self, index: u32) {
        if let Some(month) = YearMonth::from_zero_based(self.browse_year, index) {
            self.selection.month = Some(month);
            self.selection.year.get_or_insert(self.browse_year);
        }
    }

    /// Step the selected month forward/backward, crossing year boundaries.
    ///
    /// With no month selected, stepping forward picks January and stepping
    /// back picks December of the browsed year.
    pub fn step_month(&mut self, forward: bool) {
        let next = match self.selection.month {
            Some(month) if forward => month.next(),
            Some(month) => month.prev(),
            None => {
                let index = if forward { 0 } else { 11 };
                match YearMonth::from_zero_based(self.browse_year, index) {
                    Some(m) => m,
                    None => return,
                }
            }
        };
        self.browse_year = next.year();
        self.selection = PeriodSelection::month(next);
    }

    /// Drop the month and reset to the current year.
    pub fn clear_month(&mut self, current_year: i32) {
        self.browse_year = current_year;
        self.selection = PeriodSelection::year(current_year);
    }

    /// Clear every filter.
    pub fn lifetime(&mut self) {
        self.selection = PeriodSelection::lifetime();
    }
}

/// Apply the period filter. Returns a new list; the input is never mutated.
pub fn filter_records(records: &[Record], selection: &PeriodSelection, mode: PeriodMatch) -> Vec<Record> {
    let Some(year) = selection.year else {
        return records.to_vec();
    };

    records
        .iter()
        .filter(|r| match selection.month {
            None => matches_year(&r.billing_period, year, mode),
            Some(month) => matches_month(&r.billing_period, month, mode),
        })
        .cloned()
        .collect()
}

fn matches_year(label: &str, year: i32, mode: PeriodMatch) -> bool {
    match mode {
        PeriodMatch::Substring => label.to_lowercase().contains(&year.to_string()),
        PeriodMatch::Structured => parse_period_month(label).is_some_and(|m| m.year() == year),
    }
}

fn matches_month(label: &str, month: YearMonth, mode: PeriodMatch) -> bool {
    match mode {
        PeriodMatch::Substring => {
            let label = label.to_lowercase();
            label.contains(&month.full_label().to_lowercase())
                || label.contains(&month.short_label().to_lowercase())
        }
        PeriodMatch::Structured => parse_period_month(label) == Some(month),
    }
}

/// Table search: name and period case-insensitively, phone verbatim.
pub fn search_records<'a>(records: &'a [Record], term: &str) -> Vec<&'a Record> {
    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|r| {
            r.customer_name.to_lowercase().contains(&needle)
                || r.mobile_number.contains(term)
                || r.billing_period.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, period: &str) -> Record {
        Record {
            customer_name: name.to_string(),
            mobile_number: "9990001111".to_string(),
            billing_period: period.to_string(),
            milk_quantity: 1.0,
            price_per_liter: 50.0,
            total_amount: 50.0,
        }
    }

    fn sample() -> Vec<Record> {
        vec![
            rec("Alice", "January 2024"),
            rec("Bob", "march 2024"),
            rec("Carol", "Mar 2024"),
            rec("Dan", "March 2023"),
            rec("Eve", "2024 Archive"),
            rec("Fay", "2024-03"),
        ]
    }

    fn names(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.customer_name.as_str()).collect()
    }

    #[test]
    fn no_year_returns_everything_even_with_month() {
        let records = sample();
        let selection = PeriodSelection {
            year: None,
            month: YearMonth::from_zero_based(2024, 2),
        };
        assert_eq!(filter_records(&records, &selection, PeriodMatch::Substring), records);
    }

    #[test]
    fn year_filter_is_substring_based() {
        let out = filter_records(&sample(), &PeriodSelection::year(2024), PeriodMatch::Substring);
        assert_eq!(names(&out), ["Alice", "Bob", "Carol", "Eve", "Fay"]);
    }

    #[test]
    fn month_filter_matches_full_and_short_labels() {
        let march = YearMonth::from_zero_based(2024, 2).unwrap();
        let out = filter_records(&sample(), &PeriodSelection::month(march), PeriodMatch::Substring);
        assert_eq!(names(&out), ["Bob", "Carol"]);
    }

    #[test]
    fn structured_mode_rejects_free_text_labels() {
        let out = filter_records(&sample(), &PeriodSelection::year(2024), PeriodMatch::Structured);
        assert_eq!(names(&out), ["Alice", "Bob", "Carol", "Fay"]);

        let march = YearMonth::new(2024, 3).unwrap();
        let out = filter_records(&sample(), &PeriodSelection::month(march), PeriodMatch::Structured);
        assert_eq!(names(&out), ["Bob", "Carol", "Fay"]);
    }

    #[test]
    fn selection_labels() {
        assert_eq!(PeriodSelection::lifetime().label(), "Lifetime Data");
        assert_eq!(PeriodSelection::year(2024).label(), "All of 2024");
        let march = YearMonth::new(2024, 3).unwrap();
        assert_eq!(PeriodSelection::month(march).label(), "March 2024");

        // A month without a year still labels as the month.
        let orphan = PeriodSelection {
            year: None,
            month: Some(march),
        };
        assert_eq!(orphan.label(), "March 2024");
    }

    #[test]
    fn selector_follows_month_picker_rules() {
        let mut selector = PeriodSelector::new(2025);
        assert_eq!(selector.label(), "All of 2025");

        selector.shift_year(-1);
        assert_eq!(selector.selection(), PeriodSelection::year(2024));

        selector.select_month(2);
        assert_eq!(selector.label(), "March 2024");

        // Year arrows keep the chosen month.
        selector.shift_year(1);
        assert_eq!(selector.selection().year, Some(2025));
        assert_eq!(selector.selection().month, YearMonth::new(2024, 3));

        selector.clear_month(2025);
        assert_eq!(selector.selection(), PeriodSelection::year(2025));

        selector.lifetime();
        assert_eq!(selector.label(), "Lifetime Data");
    }

    #[test]
    fn selector_steps_across_year_boundary() {
        let mut selector = PeriodSelector::new(2024);
        selector.step_month(false);
        assert_eq!(selector.label(), "December 2024");
        selector.step_month(true);
        assert_eq!(selector.label(), "January 2025");
        assert_eq!(selector.browse_year(), 2025);
    }

    #[test]
    fn search_matches_name_phone_and_period() {
        let mut records = sample();
        records[1].mobile_number = "5551234".to_string();

        assert_eq!(search_records(&records, "").len(), records.len());
        assert_eq!(search_records(&records, "ALI").len(), 1);
        assert_eq!(search_records(&records, "555").len(), 1);
        assert_eq!(search_records(&records, "archive").len(), 1);
    }
}
