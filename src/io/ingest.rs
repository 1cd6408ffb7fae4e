//! CSV ingest and normalization.
//!
//! This module is responsible for turning the published billing export into
//! a clean list of `Record`s.
//!
//! Design goals:
//! - **Positional schema**: columns 0..=5 are name, phone, period, quantity,
//!   price/liter, total. The header line is read but never validated.
//! - **Lenient rows**: unparsable numbers become `0.0`, rows without a
//!   customer name are dropped silently (counted, not reported).
//! - **Real CSV parsing**: quoted fields may contain commas. Rows are read
//!   line by line, so an unclosed quote never swallows the rows after it.
//! - **Separation of concerns**: no filtering or aggregation here

use crate::domain::Record;

/// Ingest output: normalized records plus counters for logging/diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestedData {
    pub records: Vec<Record>,
    pub header: Vec<String>,
    pub rows_read: usize,
    pub rows_dropped: usize,
}

/// Parse CSV text into records, in original row order.
///
/// Each line is read on its own, so a broken quote can only damage its own
/// row.
pub fn parse_records(text: &str) -> IngestedData {
    let mut lines = text.lines();

    let header = lines.next().map(split_line).unwrap_or_default();
    tracing::debug!(?header, "read CSV header");

    let mut out = IngestedData {
        header,
        ..IngestedData::default()
    };

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        out.rows_read += 1;

        match parse_row(&split_line(line)) {
            Some(row) => out.records.push(row),
            None => out.rows_dropped += 1,
        }
    }

    if out.rows_dropped > 0 {
        tracing::debug!(
            rows_read = out.rows_read,
            rows_dropped = out.rows_dropped,
            "dropped rows without a customer name"
        );
    }

    out
}

/// Split one line into cleaned fields.
///
/// Balanced quotes go through the CSV reader. A line with an odd number of
/// quotes is split on every comma instead.
fn split_line(line: &str) -> Vec<String> {
    if line.matches('"').count() % 2 == 1 {
        tracing::debug!(line, "unbalanced quotes, splitting on commas");
        return line.split(',').map(clean_field).collect();
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => record.iter().map(clean_field).collect(),
        Some(Err(e)) => {
            tracing::warn!(line, "unreadable CSV row, splitting on commas: {e}");
            line.split(',').map(clean_field).collect()
        }
        None => Vec::new(),
    }
}

/// Map one row's fields onto a `Record`. Returns `None` when the name is empty.
fn parse_row(fields: &[String]) -> Option<Record> {
    let field = |idx: usize| fields.get(idx).cloned().unwrap_or_default();

    let customer_name = field(0);
    if customer_name.is_empty() {
        return None;
    }

    Some(Record {
        customer_name,
        mobile_number: field(1),
        billing_period: field(2),
        milk_quantity: parse_number(&field(3)),
        price_per_liter: parse_number(&field(4)),
        total_amount: parse_number(&field(5)),
    })
}

/// Trim whitespace and strip every quote character.
fn clean_field(raw: &str) -> String {
    raw.trim().replace('"', "").trim().to_string()
}

/// Lenient number parsing: the longest leading decimal prefix wins.
///
/// Grouping commas are removed first, so `"1,200"` is 1200 and `"10 L"` is 10.
/// Anything without a numeric prefix (or non-finite) is `0.0`.
pub fn parse_number(raw: &str) -> f64 {
    let cleaned: String = raw.trim().chars().filter(|&c| c != ',').collect();
    let prefix = numeric_prefix(&cleaned);
    match prefix.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

fn numeric_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return "";
    }

    // Optional exponent, only taken when it is complete.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Name,Phone,Period,Qty,Price,Total\n\
        Alice,9990001111,January 2024,10,50,500\n\
        ,9991112222,February 2024,5,50,250\n";

    #[test]
    fn header_only_yields_no_records() {
        let out = parse_records("Name,Phone,Period,Qty,Price,Total\n");
        assert!(out.records.is_empty());
        assert_eq!(out.rows_read, 0);
        assert_eq!(out.header.len(), 6);
    }

    #[test]
    fn empty_document_yields_no_records() {
        assert!(parse_records("").records.is_empty());
    }

    #[test]
    fn rows_without_name_are_dropped() {
        let out = parse_records(SAMPLE);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.rows_dropped, 1);

        let alice = &out.records[0];
        assert_eq!(alice.customer_name, "Alice");
        assert_eq!(alice.mobile_number, "9990001111");
        assert_eq!(alice.billing_period, "January 2024");
        assert_eq!(alice.milk_quantity, 10.0);
        assert_eq!(alice.price_per_liter, 50.0);
        assert_eq!(alice.total_amount, 500.0);
    }

    #[test]
    fn whitespace_only_name_is_dropped() {
        let out = parse_records("h1,h2,h3,h4,h5,h6\n   ,1,March 2024,1,1,1\n\"  \",1,March 2024,1,1,1\n");
        assert!(out.records.is_empty());
    }

    #[test]
    fn non_numeric_fields_become_zero_and_row_is_kept() {
        let out = parse_records("h1,h2,h3,h4,h5,h6\nBob,123,May 2024,lots,n/a,\n");
        assert_eq!(out.records.len(), 1);
        let bob = &out.records[0];
        assert_eq!(bob.milk_quantity, 0.0);
        assert_eq!(bob.price_per_liter, 0.0);
        assert_eq!(bob.total_amount, 0.0);
    }

    #[test]
    fn short_rows_fill_missing_fields() {
        let out = parse_records("h1,h2,h3,h4,h5,h6\nCarol,555\n");
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].billing_period, "");
        assert_eq!(out.records[0].total_amount, 0.0);
    }

    #[test]
    fn quoted_commas_keep_columns_aligned() {
        let out = parse_records(
            "h1,h2,h3,h4,h5,h6\n\"Dairy, Ltd\",555,\"June 2024\",12.5,48,\"1,200\"\n",
        );
        let row = &out.records[0];
        assert_eq!(row.customer_name, "Dairy, Ltd");
        assert_eq!(row.billing_period, "June 2024");
        assert_eq!(row.milk_quantity, 12.5);
        assert_eq!(row.total_amount, 1200.0);
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let out = parse_records("h1,h2,h3,h4,h5,h6\r\nDan,1,July 2024,2,3,6\r\n");
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].total_amount, 6.0);
    }

    #[test]
    fn unclosed_quote_keeps_following_rows() {
        let out = parse_records(
            "h1,h2,h3,h4,h5,h6\n\
             \"Alice,1,January 2024,1,1,100\n\
             Bob,2,January 2024,1,1,200\n\
             Carol,3,January 2024,1,1,300\n",
        );

        let names: Vec<&str> = out.records.iter().map(|r| r.customer_name.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob", "Carol"]);
        assert_eq!(out.records[0].billing_period, "January 2024");
        assert_eq!(out.records[0].total_amount, 100.0);
        assert_eq!(out.records[2].total_amount, 300.0);
        assert_eq!(out.rows_dropped, 0);
    }

    #[test]
    fn parsing_is_idempotent() {
        assert_eq!(parse_records(SAMPLE), parse_records(SAMPLE));
    }

    #[test]
    fn number_prefix_parsing() {
        assert_eq!(parse_number("42"), 42.0);
        assert_eq!(parse_number(" 10L "), 10.0);
        assert_eq!(parse_number("-3.5x"), -3.5);
        assert_eq!(parse_number(".5"), 0.5);
        assert_eq!(parse_number("1e3"), 1000.0);
        assert_eq!(parse_number("2e"), 2.0);
        assert_eq!(parse_number("₹500"), 0.0);
        assert_eq!(parse_number("."), 0.0);
        assert_eq!(parse_number(""), 0.0);
    }
}
