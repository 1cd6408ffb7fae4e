//! Reporting utilities: dashboard metrics, per-period groupings, and
//! formatted terminal output.
//!
//! Everything here is a pure function of the filtered record list, so the
//! TUI and the one-shot commands share the exact same numbers.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::domain::{PeriodMatch, Record, parse_period_date};
use crate::select::{PeriodSelection, filter_records};

pub mod format;

pub use format::*;

/// Headline numbers for the metric cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub total_revenue: f64,
    /// Number of billing rows in view (one row per customer per period).
    pub customer_count: usize,
    pub total_quantity: f64,
    /// `total_revenue / customer_count`, `0` when there are no rows.
    pub average_order_value: f64,
    /// `total_revenue / total_quantity`, `0` when no quantity was sold.
    pub average_price_per_liter: f64,
    /// Number of distinct billing-period labels.
    pub billing_period_count: usize,
}

/// One chart point: a billing-period label and its aggregated value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodValue {
    pub period: String,
    pub value: f64,
}

/// Everything the dashboard derives from `(records, selection)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub selection: PeriodSelection,
    pub label: String,
    pub records: Vec<Record>,
    pub metrics: Metrics,
    /// Revenue per period, chronological.
    pub revenue_by_period: Vec<PeriodValue>,
    /// Quantity per period, in encounter order.
    pub quantity_by_period: Vec<PeriodValue>,
}

impl DashboardView {
    pub fn build(records: &[Record], selection: PeriodSelection, mode: PeriodMatch) -> Self {
        let filtered = filter_records(records, &selection, mode);
        let metrics = compute_metrics(&filtered);
        let revenue_by_period = revenue_by_period(&filtered);
        let quantity_by_period = quantity_by_period(&filtered);

        Self {
            selection,
            label: selection.label(),
            records: filtered,
            metrics,
            revenue_by_period,
            quantity_by_period,
        }
    }
}

/// Compute the metric cards over an already-filtered list.
pub fn compute_metrics(records: &[Record]) -> Metrics {
    let total_revenue: f64 = records.iter().map(|r| r.total_amount).sum();
    let total_quantity: f64 = records.iter().map(|r| r.milk_quantity).sum();
    let customer_count = records.len();

    let average_order_value = if customer_count > 0 {
        total_revenue / customer_count as f64
    } else {
        0.0
    };
    let average_price_per_liter = if total_quantity > 0.0 {
        total_revenue / total_quantity
    } else {
        0.0
    };

    let billing_period_count = records
        .iter()
        .map(|r| r.billing_period.as_str())
        .collect::<HashSet<_>>()
        .len();

    Metrics {
        total_revenue,
        customer_count,
        total_quantity,
        average_order_value,
        average_price_per_liter,
        billing_period_count,
    }
}

/// Sum `total_amount` per period, sorted chronologically.
///
/// Labels are interpreted as dates (`January 2024` → 2024-01-01). Labels that
/// cannot be interpreted sort after every dated label, in encounter order.
pub fn revenue_by_period(records: &[Record]) -> Vec<PeriodValue> {
    let mut out = group_by_period(records, |r| r.total_amount);
    // Stable sort keeps encounter order for ties and undated labels.
    out.sort_by_key(|p| match parse_period_date(&p.period) {
        Some(date) => (0, Some(date)),
        None => (1, None),
    });
    out
}

/// Sum `milk_quantity` per period, in the order periods are first seen.
pub fn quantity_by_period(records: &[Record]) -> Vec<PeriodValue> {
    group_by_period(records, |r| r.milk_quantity)
}

fn group_by_period(records: &[Record], value: impl Fn(&Record) -> f64) -> Vec<PeriodValue> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<PeriodValue> = Vec::new();

    for r in records {
        let slot = *index.entry(r.billing_period.as_str()).or_insert_with(|| {
            out.push(PeriodValue {
                period: r.billing_period.clone(),
                value: 0.0,
            });
            out.len() - 1
        });
        out[slot].value += value(r);
    }

    out
}
