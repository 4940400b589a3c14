//! JSON output formatter

use super::{OutputError, OutputFormatter};
use crate::report::{Report, Status};
use serde::Serialize;

/// JSON formatter for machine-readable output
#[derive(Default)]
pub struct JsonFormatter {
    /// Pretty print with indentation
    pub pretty: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    report: &'a Report,
    totals: JsonTotals,
}

#[derive(Serialize)]
struct JsonTotals {
    checkers: usize,
    completed: usize,
    skipped: usize,
    failed: usize,
    errors: usize,
    warnings: usize,
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &Report) -> Result<String, OutputError> {
        let output = JsonOutput {
            report,
            totals: JsonTotals {
                checkers: report.checkers.len(),
                completed: report.count_status(Status::Completed),
                skipped: report.count_status(Status::Skipped),
                failed: report.count_status(Status::Error),
                errors: report.error_count(),
                warnings: report.warning_count(),
            },
        };

        let json = if self.pretty {
            serde_json::to_string_pretty(&output)?
        } else {
            serde_json::to_string(&output)?
        };
        Ok(json)
    }
}
