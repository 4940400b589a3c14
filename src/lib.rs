//! otx-checker - OTX Document Validator
//!
//! Checks OTX (Open Test sequence eXchange) documents against the document
//! and semantic rules of the OTX standard and records the results in a
//! checker bundle report.
//!
//! # Architecture
//!
//! ```text
//! CLI -> Config -> OtxDocument -> Engine -> Rule -> Reporter -> OutputFormatter
//! ```
//!
//! The engine runs every built-in rule, in a fixed order, against one parsed
//! document. Each rule is gated on its preconditions and on the document's
//! schema version, and a failing rule never stops the others.
//!
//! # Example
//!
//! ```no_run
//! use otx_checker::{Engine, Report};
//! use std::path::Path;
//!
//! let mut report = Report::new("otxBundle", "0.1.0", "OTX checker bundle");
//! Engine::new().check_file(Path::new("Example.otx"), &mut report)?;
//! report.generate_summary();
//! println!("{}", report.summary);
//! # Ok::<(), otx_checker::engine::RunError>(())
//! ```

pub mod config;
pub mod document;
pub mod engine;
pub mod extract;
pub mod issue;
pub mod output;
pub mod paths;
pub mod report;
pub mod rule;
pub mod rules;
pub mod state_machine;
pub mod version;

// Re-export main types
pub use config::{Config, ConfigError};
pub use document::{OtxDocument, ParseError};
pub use engine::{CheckContext, Engine, RunError};
pub use issue::{Issue, Location, Severity};
pub use output::{JsonFormatter, MarkdownFormatter, OutputFormatter, XmlFormatter};
pub use paths::PathResolver;
pub use report::{CheckerResult, IssueRecord, Report, Reporter, Status};
pub use rule::{CheckError, Rule, RuleGroup};
pub use rules::builtin_rules;
