//! Rule execution engine

use crate::document::{OtxDocument, ParseError};
use crate::issue::{Issue, Severity};
use crate::paths::PathResolver;
use crate::report::{IssueId, Reporter, Status};
use crate::rule::{CheckError, Rule};
use crate::rules::builtin_rules;
use crate::version::{compare_versions, RuleUid};
use log::{error, info};
use std::cmp::Ordering;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use thiserror::Error;

/// Fatal errors that abort a run
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// State handed to a rule body
pub struct CheckContext<'a, 'input> {
    document: &'a OtxDocument<'input>,
    paths: &'a PathResolver,
    reporter: &'a mut dyn Reporter,
    checker_id: String,
    rule_uid: String,
    severity: Severity,
    skipped: Vec<String>,
}

impl<'a, 'input> CheckContext<'a, 'input> {
    pub fn new(
        document: &'a OtxDocument<'input>,
        paths: &'a PathResolver,
        reporter: &'a mut dyn Reporter,
        rule: &Rule,
    ) -> Self {
        Self {
            document,
            paths,
            reporter,
            checker_id: rule.checker_id(),
            rule_uid: rule.rule_uid(),
            severity: rule.severity,
            skipped: Vec::new(),
        }
    }

    /// The document under check
    pub fn document(&self) -> &'a OtxDocument<'input> {
        self.document
    }

    /// Resolver for references relative to the input file
    pub fn paths(&self) -> &'a PathResolver {
        self.paths
    }

    pub fn checker_id(&self) -> &str {
        &self.checker_id
    }

    /// Start an issue at the rule's severity
    pub fn issue(&self, description: impl Into<String>) -> Issue {
        Issue::new(self.severity, description)
    }

    /// Register an issue with all of its locations
    pub fn report(&mut self, issue: Issue) -> IssueId {
        let issue_id = self.reporter.register_issue(
            &self.checker_id,
            &self.rule_uid,
            issue.severity,
            &issue.description,
        );
        for location in issue.locations {
            self.reporter
                .add_location(&self.checker_id, issue_id, location);
        }
        issue_id
    }

    /// Mark the rule as not applicable to this document
    ///
    /// The skip only takes effect if the rule body then returns `Ok`.
    pub fn skip(&mut self, summary: &str) {
        self.skipped.push(summary.to_string());
    }
}

/// Executes rules against a document
pub struct Engine {
    rules: Vec<Rule>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine with the built-in rules
    pub fn new() -> Self {
        Self {
            rules: builtin_rules(),
        }
    }

    /// Create an engine with a custom rule list
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Registered rules in execution order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Parse a file and run every rule against it
    pub fn check_file(&self, path: &Path, reporter: &mut dyn Reporter) -> Result<(), RunError> {
        let source = OtxDocument::read(path)?;
        let document = OtxDocument::parse(&source, path)?;
        self.run(&document, reporter);
        Ok(())
    }

    /// Run every rule, in order, against a parsed document
    pub fn run(&self, document: &OtxDocument<'_>, reporter: &mut dyn Reporter) {
        let paths = PathResolver::for_file(document.file());
        for rule in &self.rules {
            self.execute(rule, document, &paths, reporter);
        }
    }

    /// Run one rule, recording its status
    pub fn execute(
        &self,
        rule: &Rule,
        document: &OtxDocument<'_>,
        paths: &PathResolver,
        reporter: &mut dyn Reporter,
    ) {
        let checker_id = rule.checker_id();
        let rule_uid = rule.rule_uid();

        reporter.register_checker(&checker_id, rule.description);
        reporter.register_rule(&checker_id, &rule_uid);

        let preconditions: Vec<&str> = rule.preconditions.iter().map(String::as_str).collect();
        if !reporter.all_completed_without_issues(&preconditions) {
            reporter.set_status(&checker_id, Status::Skipped);
            reporter.add_summary(
                &checker_id,
                "Preconditions are not satisfied. Skip the check.",
            );
            return;
        }

        let definition_setting = match RuleUid::parse(&rule_uid) {
            Ok(uid) => uid.definition_setting,
            Err(e) => {
                error!("{}", e);
                reporter.set_status(&checker_id, Status::Error);
                reporter.add_summary(&checker_id, &format!("Error: {}.", e));
                return;
            }
        };

        if let Some(summary) = version_gate(document.schema_version(), definition_setting) {
            reporter.set_status(&checker_id, Status::Skipped);
            reporter.add_summary(&checker_id, &summary);
            return;
        }

        info!("Executing {} check", rule.name);

        let (outcome, skipped) = {
            let mut ctx = CheckContext::new(document, paths, reporter, rule);
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (rule.check)(&mut ctx)));
            (outcome, ctx.skipped)
        };

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(payload) => Some(CheckError::Message(panic_message(payload.as_ref()))),
        };

        match failure {
            None if skipped.is_empty() => {
                reporter.set_status(&checker_id, Status::Completed);
            }
            None => {
                reporter.set_status(&checker_id, Status::Skipped);
                for summary in &skipped {
                    reporter.add_summary(&checker_id, summary);
                }
            }
            Some(e) => {
                error!("An error occurred in {}: {}", checker_id, e);
                reporter.set_status(&checker_id, Status::Error);
                reporter.add_summary(&checker_id, &format!("Error: {}.", e));
            }
        }
    }
}

/// Skip summary when the document version does not reach the definition setting
fn version_gate(schema_version: Option<&str>, definition_setting: &str) -> Option<String> {
    let Some(version) = schema_version else {
        return Some(format!(
            "Version None is lower than definition setting {}. Skip the check.",
            definition_setting
        ));
    };

    match compare_versions(version, definition_setting) {
        Ok(Ordering::Less) => Some(format!(
            "Version {} is lower than definition setting {}. Skip the check.",
            version, definition_setting
        )),
        Ok(_) => None,
        Err(e) => Some(format!(
            "Version {} cannot be compared with definition setting {}: {}. Skip the check.",
            version, definition_setting, e
        )),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "rule panicked".to_string()
    }
}
