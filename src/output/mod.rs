//! Output formatters for checker bundle results

mod json;
mod markdown;
mod xml;

pub use json::JsonFormatter;
pub use markdown::MarkdownFormatter;
pub use xml::XmlFormatter;

use crate::report::Report;
use std::path::Path;
use thiserror::Error;

/// File name of the generated checker documentation
pub const MARKDOWN_FILE_NAME: &str = "generated_checker_bundle_doc.md";

/// Serialization error
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("XML serialization error: {0}")]
    Xml(#[from] quick_xml::se::SeError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output formatter trait
pub trait OutputFormatter {
    /// Format a whole checker bundle report
    fn format(&self, report: &Report) -> Result<String, OutputError>;
}

/// Pick the result formatter for a result file by its extension
///
/// `.json` gets JSON, everything else the checker-bundle XML layout.
pub fn formatter_for(path: &Path) -> Box<dyn OutputFormatter> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        Box::new(JsonFormatter::new().pretty())
    } else {
        Box::new(XmlFormatter::new())
    }
}
