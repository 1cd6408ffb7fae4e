//! Formatted terminal output for the one-shot commands.
//!
//! We keep formatting code in one place so:
//! - the aggregation code stays clean and testable
//! - the TUI metric cards and the text report print numbers the same way

use crate::domain::Record;
use crate::report::{DashboardView, Metrics};

pub const CURRENCY: &str = "₹";

/// One metric card: title plus its display value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricCard {
    pub title: &'static str,
    pub value: String,
}

/// The six dashboard cards, in display order.
pub fn metric_cards(m: &Metrics) -> [MetricCard; 6] {
    [
        MetricCard {
            title: "Total Revenue",
            value: fmt_currency(m.total_revenue),
        },
        MetricCard {
            title: "Active Customers",
            value: fmt_grouped(m.customer_count as f64),
        },
        MetricCard {
            title: "Milk Distributed",
            value: fmt_liters(m.total_quantity),
        },
        MetricCard {
            title: "Avg Order Value",
            value: format!("{CURRENCY}{:.0}", m.average_order_value),
        },
        MetricCard {
            title: "Avg Price/Liter",
            value: format!("{CURRENCY}{:.2}", m.average_price_per_liter),
        },
        MetricCard {
            title: "Billing Periods",
            value: m.billing_period_count.to_string(),
        },
    ]
}

/// Format the full summary: header, metric cards, and period totals.
pub fn format_summary(view: &DashboardView, source: &str) -> String {
    let mut out = String::new();

    out.push_str("=== Dairy Analytics Hub ===\n");
    out.push_str(&format!("Source: {source}\n"));
    out.push_str(&format!("Period: {}\n", view.label));
    out.push('\n');

    for card in metric_cards(&view.metrics) {
        out.push_str(&format!("{:<18} {:>16}\n", card.title, card.value));
    }

    out
}

/// Format the customer table, limited to `limit` rows.
pub fn format_table(rows: &[&Record], limit: usize) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<24} {:<14} {:<16} {:>10} {:>10} {:>12}",
            "customer", "contact", "period", "quantity", "rate", "total"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<24} {:-<14} {:-<16} {:->10} {:->10} {:->12}",
            "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    if rows.is_empty() {
        out.push_str("No customers found matching your search.\n");
        return out;
    }

    for r in rows.iter().take(limit) {
        out.push_str(
            format!(
                "{:<24} {:<14} {:<16} {:>10} {:>10} {:>12}",
                truncate(&r.customer_name, 24),
                truncate(&r.mobile_number, 14),
                truncate(&r.billing_period, 16),
                fmt_liters(r.milk_quantity),
                format!("{CURRENCY}{:.2}", r.price_per_liter),
                fmt_currency(r.total_amount),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    if rows.len() > limit {
        out.push_str(&format!("… {} more row(s)\n", rows.len() - limit));
    }

    out
}

pub fn fmt_currency(v: f64) -> String {
    format!("{CURRENCY}{}", fmt_grouped(v))
}

pub fn fmt_liters(v: f64) -> String {
    format!("{}L", fmt_grouped(v))
}

/// Thousands-grouped number with up to three fraction digits, trailing zeros trimmed.
///
/// `1234567.5` → `1,234,567.5`, `12.0` → `12`, `0.12345` → `0.123`.
pub fn fmt_grouped(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }

    let fixed = format!("{:.3}", v.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = v < 0.0 && (int_part != "0" || !frac_part.is_empty());
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouped_numbers() {
        assert_eq!(fmt_grouped(0.0), "0");
        assert_eq!(fmt_grouped(800.0), "800");
        assert_eq!(fmt_grouped(1234.0), "1,234");
        assert_eq!(fmt_grouped(1234567.5), "1,234,567.5");
        assert_eq!(fmt_grouped(0.12345), "0.123");
        assert_eq!(fmt_grouped(-1500.25), "-1,500.25");
        assert_eq!(fmt_grouped(-0.0001), "0");
    }

    #[test]
    fn cards_use_dashboard_precision() {
        let m = Metrics {
            total_revenue: 12500.0,
            customer_count: 3,
            total_quantity: 250.5,
            average_order_value: 4166.666,
            average_price_per_liter: 49.9001,
            billing_period_count: 2,
        };
        let cards = metric_cards(&m);
        let values: Vec<&str> = cards.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, ["₹12,500", "3", "250.5L", "₹4167", "₹49.90", "2"]);
    }

    #[test]
    fn empty_table_says_so() {
        let table = format_table(&[], 10);
        assert!(table.contains("No customers found"));
    }

    #[test]
    fn table_is_limited() {
        let r = Record {
            customer_name: "Alice".to_string(),
            mobile_number: "9990001111".to_string(),
            billing_period: "January 2024".to_string(),
            milk_quantity: 10.0,
            price_per_liter: 50.0,
            total_amount: 500.0,
        };
        let rows = vec![&r, &r, &r];
        let table = format_table(&rows, 2);
        assert_eq!(table.matches("Alice").count(), 2);
        assert!(table.contains("1 more row(s)"));
        assert!(table.contains("₹500"));
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long customer name", 8), "a very .");
    }
}
