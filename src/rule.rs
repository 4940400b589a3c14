//! Rule descriptors

use crate::document::ParseError;
use crate::engine::CheckContext;
use crate::issue::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Organisation issuing the rules
pub const EMANATING_ENTITY: &str = "asam.net";

/// Standard the rules belong to
pub const STANDARD: &str = "otx";

/// Default definition setting (first standard version a rule applies to)
pub const DEFAULT_DEFINITION_SETTING: &str = "1.0.0";

/// Rule group, one per checker family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleGroup {
    /// Core document integrity
    Core,
    /// Data type reference integrity
    DataType,
    /// Archive action type safety
    ZipFile,
    /// State machine well-formedness
    StateMachine,
}

impl RuleGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleGroup::Core => "core",
            RuleGroup::DataType => "data_type",
            RuleGroup::ZipFile => "zip_file",
            RuleGroup::StateMachine => "state_machine",
        }
    }
}

impl fmt::Display for RuleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure inside a rule body
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Message(String),
}

/// Rule body signature
pub type CheckFn = fn(&mut CheckContext<'_, '_>) -> Result<(), CheckError>;

/// A rule descriptor
#[derive(Clone)]
pub struct Rule {
    /// Rule group
    pub group: RuleGroup,

    /// Rule number within its group
    pub number: u16,

    /// Snake-case rule name (e.g., "public_main_procedure")
    pub name: &'static str,

    /// Criterion text
    pub description: &'static str,

    /// Severity of the issues the rule reports
    pub severity: Severity,

    /// First standard version the rule applies to
    pub definition_setting: &'static str,

    /// Checker ids that must complete without issues before this rule runs
    pub preconditions: Vec<String>,

    /// Rule body
    pub check: CheckFn,
}

impl Rule {
    /// Create a new rule
    pub fn new(
        group: RuleGroup,
        number: u16,
        name: &'static str,
        description: &'static str,
        check: CheckFn,
    ) -> Self {
        Self {
            group,
            number,
            name,
            description,
            severity: Severity::Error,
            definition_setting: DEFAULT_DEFINITION_SETTING,
            preconditions: Vec::new(),
            check,
        }
    }

    /// Set severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Set definition setting
    pub fn with_definition_setting(mut self, setting: &'static str) -> Self {
        self.definition_setting = setting;
        self
    }

    /// Add a precondition checker id
    pub fn with_precondition(mut self, checker_id: impl Into<String>) -> Self {
        self.preconditions.push(checker_id.into());
        self
    }

    /// `<group>.chk_<nnn>.<name>`
    pub fn full_name(&self) -> String {
        format!("{}.chk_{:03}.{}", self.group, self.number, self.name)
    }

    /// Checker id, e.g. `check_asam_otx_core_chk_008_public_main_procedure`
    pub fn checker_id(&self) -> String {
        format!(
            "check_asam_{}_{}_chk_{:03}_{}",
            STANDARD, self.group, self.number, self.name
        )
    }

    /// Rule UID, e.g. `asam.net:otx:1.0.0:core.chk_008.public_main_procedure`
    pub fn rule_uid(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            EMANATING_ENTITY,
            STANDARD,
            self.definition_setting,
            self.full_name()
        )
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("checker_id", &self.checker_id())
            .field("severity", &self.severity)
            .field("definition_setting", &self.definition_setting)
            .field("preconditions", &self.preconditions)
            .finish()
    }
}
