use chrono::{DateTime, Utc};
use serde::Serialize;

/// Envelope written around every check result.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport<T> {
    /// Name of the check that produced `result`
    pub check: &'static str,
    /// Timestamp when the check finished (ISO 8601 format)
    pub generated_at: DateTime<Utc>,
    pub result: T,
}

impl<T> CheckReport<T> {
    pub fn new(check: &'static str, result: T) -> Self {
        Self {
            check,
            generated_at: Utc::now(),
            result,
        }
    }
}
