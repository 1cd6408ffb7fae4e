//! Record sources and loading.
//!
//! - published sheet over HTTP (`sheets::SheetClient`)
//! - local CSV export (`sheets::CsvFileSource`)
//! - background loading with stale-response protection (`feed::RecordFeed`)

use std::sync::Arc;
use std::time::Duration;

use crate::domain::Record;
use crate::error::{AppError, FetchError};

pub mod feed;
pub mod sheets;

pub use feed::RecordFeed;
pub use sheets::{CsvFileSource, SheetClient};

/// Anything that can produce the full record list on demand.
///
/// Implementations must be shareable with the feed's worker threads.
pub trait RecordSource: Send + Sync {
    /// Human-readable location, used in logs and the dashboard footer.
    fn describe(&self) -> String;

    /// Retrieve and normalize every record. The result replaces any prior list.
    fn fetch_records(&self) -> Result<Vec<Record>, FetchError>;
}

/// Where to load records from, as resolved from CLI flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// Published sheet; `None` means `.env`/environment or the default URL.
    Sheet { url: Option<String>, timeout: Duration },
    File(std::path::PathBuf),
}

/// Build the concrete source for a `SourceSpec`.
pub fn open_source(spec: &SourceSpec) -> Result<Arc<dyn RecordSource>, AppError> {
    match spec {
        SourceSpec::Sheet { url: Some(url), timeout } => Ok(Arc::new(SheetClient::new(url.clone(), *timeout)?)),
        SourceSpec::Sheet { url: None, timeout } => Ok(Arc::new(SheetClient::from_env(*timeout)?)),
        SourceSpec::File(path) => {
            if !path.is_file() {
                return Err(AppError::new(
                    2,
                    format!("CSV file not found: {}", path.display()),
                ));
            }
            Ok(Arc::new(CsvFileSource::new(path.clone())))
        }
    }
}
