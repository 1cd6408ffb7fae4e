//! Export filtered records to CSV.
//!
//! The export uses the same column order as the published sheet, so it can be
//! opened in a spreadsheet or fed back in with `--file`.

use std::path::Path;

use crate::domain::Record;
use crate::error::AppError;

/// Write records (header + one row each) to a CSV file.
pub fn write_records_csv(path: &Path, records: &[&Record]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(4, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    for record in records {
        writer
            .serialize(record)
            .map_err(|e| AppError::new(4, format!("Failed to write export CSV row: {e}")))?;
    }

    // An empty export still gets a header so re-ingest sees a valid document.
    if records.is_empty() {
        writer
            .write_record(EXPORT_HEADER)
            .map_err(|e| AppError::new(4, format!("Failed to write export CSV header: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush export CSV: {e}")))?;

    tracing::info!(path = %path.display(), rows = records.len(), "wrote export");
    Ok(())
}

const EXPORT_HEADER: [&str; 6] = [
    "Customer Name",
    "Mobile Number",
    "Billing Period",
    "Milk Quantity",
    "Price Per Liter",
    "Total Amount",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ingest::parse_records;

    fn rec(name: &str, period: &str, total: f64) -> Record {
        Record {
            customer_name: name.to_string(),
            mobile_number: "9990001111".to_string(),
            billing_period: period.to_string(),
            milk_quantity: 12.5,
            price_per_liter: 48.0,
            total_amount: total,
        }
    }

    #[test]
    fn export_reingests_to_same_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let records = vec![rec("Dairy, Ltd", "January 2024", 600.0), rec("Bob", "Feb 2024", 1200.5)];
        let refs: Vec<&Record> = records.iter().collect();
        write_records_csv(&path, &refs).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Customer Name,Mobile Number,Billing Period"));
        assert_eq!(parse_records(&text).records, records);
    }

    #[test]
    fn empty_export_has_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_records_csv(&path, &[]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(parse_records(&text).records.is_empty());
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let err = write_records_csv(&path, &[]).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
