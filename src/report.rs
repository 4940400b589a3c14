//! Checker result collection

use crate::issue::{Location, Severity};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a registered issue, unique within a report
pub type IssueId = usize;

/// Lifecycle status of a checker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    NotRun,
    Skipped,
    Completed,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::NotRun => write!(f, "NOT_RUN"),
            Status::Skipped => write!(f, "SKIPPED"),
            Status::Completed => write!(f, "COMPLETED"),
            Status::Error => write!(f, "ERROR"),
        }
    }
}

/// Sink for checker registrations, issues and statuses
pub trait Reporter {
    /// Register a checker; registering the same id again is a no-op
    fn register_checker(&mut self, checker_id: &str, description: &str);

    /// Attach a rule UID to a checker
    fn register_rule(&mut self, checker_id: &str, rule_uid: &str);

    /// Record an issue and return its id
    fn register_issue(
        &mut self,
        checker_id: &str,
        rule_uid: &str,
        severity: Severity,
        description: &str,
    ) -> IssueId;

    /// Add an XML location to a registered issue
    fn add_location(&mut self, checker_id: &str, issue_id: IssueId, location: Location);

    /// Move a checker out of `NOT_RUN`; later changes are ignored
    fn set_status(&mut self, checker_id: &str, status: Status);

    /// Append a summary line to a checker
    fn add_summary(&mut self, checker_id: &str, summary: &str);

    /// Current status of a checker, if registered
    fn status(&self, checker_id: &str) -> Option<Status>;

    /// Number of issues registered for a checker
    fn issue_count(&self, checker_id: &str) -> usize;

    /// True when every listed checker completed and reported nothing
    fn all_completed_without_issues(&self, checker_ids: &[&str]) -> bool {
        checker_ids.iter().all(|id| {
            self.status(id) == Some(Status::Completed) && self.issue_count(id) == 0
        })
    }
}

/// A registered issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub issue_id: IssueId,
    pub rule_uid: String,
    pub level: Severity,
    pub description: String,
    #[serde(default)]
    pub locations: Vec<Location>,
}

/// Results of one checker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerResult {
    pub checker_id: String,
    pub description: String,
    pub status: Status,
    #[serde(default)]
    pub summary: Vec<String>,
    #[serde(default)]
    pub rule_uids: Vec<String>,
    #[serde(default)]
    pub issues: Vec<IssueRecord>,
}

impl CheckerResult {
    fn new(checker_id: &str, description: &str) -> Self {
        Self {
            checker_id: checker_id.to_string(),
            description: description.to_string(),
            status: Status::NotRun,
            summary: Vec::new(),
            rule_uids: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.level == Severity::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.level == Severity::Warning)
            .count()
    }
}

/// Checker bundle report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub name: String,
    pub version: String,
    pub description: String,
    pub summary: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default)]
    pub checkers: Vec<CheckerResult>,
    #[serde(skip)]
    next_issue_id: IssueId,
}

impl Report {
    /// Create an empty report for a checker bundle
    pub fn new(name: &str, version: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            description: description.to_string(),
            summary: String::new(),
            params: BTreeMap::new(),
            checkers: Vec::new(),
            next_issue_id: 0,
        }
    }

    /// Copy run parameters into the report
    pub fn copy_params(&mut self, params: &BTreeMap<String, String>) {
        self.params
            .extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Get a checker by id
    pub fn checker(&self, checker_id: &str) -> Option<&CheckerResult> {
        self.checkers.iter().find(|c| c.checker_id == checker_id)
    }

    fn checker_mut(&mut self, checker_id: &str) -> Option<&mut CheckerResult> {
        self.checkers.iter_mut().find(|c| c.checker_id == checker_id)
    }

    fn checker_entry(&mut self, checker_id: &str) -> &mut CheckerResult {
        let index = match self.checkers.iter().position(|c| c.checker_id == checker_id) {
            Some(index) => index,
            None => {
                self.checkers.push(CheckerResult::new(checker_id, ""));
                self.checkers.len() - 1
            }
        };
        &mut self.checkers[index]
    }

    /// All issues across checkers
    pub fn issues(&self) -> impl Iterator<Item = &IssueRecord> {
        self.checkers.iter().flat_map(|c| c.issues.iter())
    }

    pub fn error_count(&self) -> usize {
        self.checkers.iter().map(CheckerResult::error_count).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.checkers.iter().map(CheckerResult::warning_count).sum()
    }

    /// Number of checkers with a given status
    pub fn count_status(&self, status: Status) -> usize {
        self.checkers.iter().filter(|c| c.status == status).count()
    }

    /// Fill the bundle summary from the checker results
    pub fn generate_summary(&mut self) {
        self.summary = format!(
            "{} checkers registered: {} completed, {} skipped, {} failed. {} issues found ({} errors, {} warnings).",
            self.checkers.len(),
            self.count_status(Status::Completed),
            self.count_status(Status::Skipped),
            self.count_status(Status::Error),
            self.issues().count(),
            self.error_count(),
            self.warning_count()
        );
    }
}

impl Reporter for Report {
    fn register_checker(&mut self, checker_id: &str, description: &str) {
        let checker = self.checker_entry(checker_id);
        if checker.description.is_empty() {
            checker.description = description.to_string();
        }
    }

    fn register_rule(&mut self, checker_id: &str, rule_uid: &str) {
        let checker = self.checker_entry(checker_id);
        if !checker.rule_uids.iter().any(|uid| uid == rule_uid) {
            checker.rule_uids.push(rule_uid.to_string());
        }
    }

    fn register_issue(
        &mut self,
        checker_id: &str,
        rule_uid: &str,
        severity: Severity,
        description: &str,
    ) -> IssueId {
        let issue_id = self.next_issue_id;
        self.next_issue_id += 1;

        self.checker_entry(checker_id).issues.push(IssueRecord {
            issue_id,
            rule_uid: rule_uid.to_string(),
            level: severity,
            description: description.to_string(),
            locations: Vec::new(),
        });
        issue_id
    }

    fn add_location(&mut self, checker_id: &str, issue_id: IssueId, location: Location) {
        let issue = self
            .checker_mut(checker_id)
            .and_then(|c| c.issues.iter_mut().find(|i| i.issue_id == issue_id));
        match issue {
            Some(issue) => issue.locations.push(location),
            None => warn!(
                "Cannot add location to unknown issue {} of {}",
                issue_id, checker_id
            ),
        }
    }

    fn set_status(&mut self, checker_id: &str, status: Status) {
        let checker = self.checker_entry(checker_id);
        if checker.status == Status::NotRun {
            checker.status = status;
        } else {
            debug!(
                "Ignoring status change of {} from {} to {}",
                checker_id, checker.status, status
            );
        }
    }

    fn add_summary(&mut self, checker_id: &str, summary: &str) {
        self.checker_entry(checker_id)
            .summary
            .push(summary.to_string());
    }

    fn status(&self, checker_id: &str) -> Option<Status> {
        self.checker(checker_id).map(|c| c.status)
    }

    fn issue_count(&self, checker_id: &str) -> usize {
        self.checker(checker_id).map_or(0, |c| c.issues.len())
    }
}
