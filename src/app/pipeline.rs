//! Shared "load and derive" logic used by the one-shot commands.
//!
//! The workflow is: open source -> fetch records -> filter by period ->
//! metrics + per-period groupings. The TUI runs the same steps, but through
//! `RecordFeed` so fetching does not block the event loop.

use chrono::{Datelike, Local};
use serde::Serialize;

use crate::cli::{FilterArgs, SourceArgs};
use crate::data::open_source;
use crate::domain::Record;
use crate::error::AppError;
use crate::report::DashboardView;
use crate::select::search_records;

/// All computed outputs of a single `summary`/`export` run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub source: String,
    /// Records before period filtering.
    pub total_records: usize,
    pub view: DashboardView,
    pub search: String,
}

impl RunOutput {
    /// Table rows: the period-filtered records narrowed by the search term.
    pub fn table_rows(&self) -> Vec<&Record> {
        search_records(&self.view.records, &self.search)
    }
}

/// Fetch records synchronously and derive the view for the requested period.
pub fn load_view(source: &SourceArgs, filter: &FilterArgs) -> Result<RunOutput, AppError> {
    let source = open_source(&source.to_spec())?;
    let records = source.fetch_records()?;
    Ok(derive_view(source.describe(), records, filter, Local::now().year()))
}

/// Filter and aggregate an already-fetched record list.
pub fn derive_view(source: String, records: Vec<Record>, filter: &FilterArgs, current_year: i32) -> RunOutput {
    let selection = filter.selection(current_year);
    let view = DashboardView::build(&records, selection, filter.period_match());
    tracing::debug!(
        total = records.len(),
        in_view = view.records.len(),
        period = %view.label,
        "derived dashboard view"
    );

    RunOutput {
        source,
        total_records: records.len(),
        view,
        search: filter.search.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::PeriodSelection;

    fn rec(name: &str, period: &str, total: f64) -> Record {
        Record {
            customer_name: name.to_string(),
            mobile_number: "9990001111".to_string(),
            billing_period: period.to_string(),
            milk_quantity: 10.0,
            price_per_liter: total / 10.0,
            total_amount: total,
        }
    }

    fn filter(year: Option<i32>, search: &str) -> FilterArgs {
        FilterArgs {
            year,
            month: None,
            lifetime: false,
            strict_periods: false,
            search: search.to_string(),
        }
    }

    #[test]
    fn view_uses_current_year_by_default() {
        let records = vec![rec("Alice", "Jan 2024", 500.0), rec("Bob", "Jan 2023", 300.0)];
        let out = derive_view("test".to_string(), records, &filter(None, ""), 2024);

        assert_eq!(out.total_records, 2);
        assert_eq!(out.view.selection, PeriodSelection::year(2024));
        assert_eq!(out.view.metrics.total_revenue, 500.0);
    }

    #[test]
    fn search_narrows_rows_but_not_metrics() {
        let records = vec![rec("Alice", "Jan 2024", 500.0), rec("Bob", "Feb 2024", 300.0)];
        let out = derive_view("test".to_string(), records, &filter(Some(2024), "ALI"), 2030);

        assert_eq!(out.view.metrics.customer_count, 2);
        let rows = out.table_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].customer_name, "Alice");
    }
}
