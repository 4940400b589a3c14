//! Checker-bundle XML result formatter

use super::{OutputError, OutputFormatter};
use crate::issue::Severity;
use crate::report::{CheckerResult, IssueRecord, Report, Status};
use quick_xml::se::Serializer;
use serde::Serialize;

/// Writes the report as an indented `CheckerResults` document
#[derive(Default)]
pub struct XmlFormatter;

impl XmlFormatter {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Serialize)]
struct XmlResults<'a> {
    #[serde(rename = "@version")]
    version: &'static str,
    #[serde(rename = "CheckerBundle")]
    bundle: XmlBundle<'a>,
}

#[derive(Serialize)]
struct XmlBundle<'a> {
    #[serde(rename = "@name")]
    name: &'a str,
    #[serde(rename = "@version")]
    version: &'a str,
    #[serde(rename = "@description")]
    description: &'a str,
    #[serde(rename = "@summary")]
    summary: &'a str,
    #[serde(rename = "Param")]
    params: Vec<XmlParam<'a>>,
    #[serde(rename = "Checker")]
    checkers: Vec<XmlChecker<'a>>,
}

#[derive(Serialize)]
struct XmlParam<'a> {
    #[serde(rename = "@name")]
    name: &'a str,
    #[serde(rename = "@value")]
    value: &'a str,
}

#[derive(Serialize)]
struct XmlChecker<'a> {
    #[serde(rename = "@checkerId")]
    checker_id: &'a str,
    #[serde(rename = "@description")]
    description: &'a str,
    #[serde(rename = "@status")]
    status: &'static str,
    #[serde(rename = "@summary")]
    summary: String,
    #[serde(rename = "AddressedRule")]
    rules: Vec<XmlRule<'a>>,
    #[serde(rename = "Issue")]
    issues: Vec<XmlIssue<'a>>,
}

#[derive(Serialize)]
struct XmlRule<'a> {
    #[serde(rename = "@ruleUID")]
    rule_uid: &'a str,
}

#[derive(Serialize)]
struct XmlIssue<'a> {
    #[serde(rename = "@issueId")]
    issue_id: usize,
    #[serde(rename = "@description")]
    description: &'a str,
    #[serde(rename = "@level")]
    level: u8,
    #[serde(rename = "@ruleUID")]
    rule_uid: &'a str,
    #[serde(rename = "Locations")]
    locations: Vec<XmlLocations<'a>>,
}

#[derive(Serialize)]
struct XmlLocations<'a> {
    #[serde(rename = "@description")]
    description: &'a str,
    #[serde(rename = "XMLLocation")]
    location: XmlLocation<'a>,
}

#[derive(Serialize)]
struct XmlLocation<'a> {
    #[serde(rename = "@xpath")]
    xpath: &'a str,
}

/// Numeric issue level of the result file format
fn level(severity: Severity) -> u8 {
    match severity {
        Severity::Error => 1,
        Severity::Warning => 2,
    }
}

fn status(status: Status) -> &'static str {
    match status {
        Status::NotRun => "not_run",
        Status::Skipped => "skipped",
        Status::Completed => "completed",
        Status::Error => "error",
    }
}

impl<'a> From<&'a IssueRecord> for XmlIssue<'a> {
    fn from(issue: &'a IssueRecord) -> Self {
        Self {
            issue_id: issue.issue_id,
            description: &issue.description,
            level: level(issue.level),
            rule_uid: &issue.rule_uid,
            locations: issue
                .locations
                .iter()
                .map(|l| XmlLocations {
                    description: &l.description,
                    location: XmlLocation { xpath: &l.xpath },
                })
                .collect(),
        }
    }
}

impl<'a> From<&'a CheckerResult> for XmlChecker<'a> {
    fn from(checker: &'a CheckerResult) -> Self {
        Self {
            checker_id: &checker.checker_id,
            description: &checker.description,
            status: status(checker.status),
            summary: checker.summary.join(" "),
            rules: checker
                .rule_uids
                .iter()
                .map(|uid| XmlRule { rule_uid: uid })
                .collect(),
            issues: checker.issues.iter().map(XmlIssue::from).collect(),
        }
    }
}

impl OutputFormatter for XmlFormatter {
    fn format(&self, report: &Report) -> Result<String, OutputError> {
        let results = XmlResults {
            version: "1.0.0",
            bundle: XmlBundle {
                name: &report.name,
                version: &report.version,
                description: &report.description,
                summary: &report.summary,
                params: report
                    .params
                    .iter()
                    .map(|(name, value)| XmlParam { name, value })
                    .collect(),
                checkers: report.checkers.iter().map(XmlChecker::from).collect(),
            },
        };

        let mut buffer = String::with_capacity(4096);
        buffer.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        buffer.push('\n');

        {
            let mut serializer = Serializer::with_root(&mut buffer, Some("CheckerResults"))?;
            serializer.indent(' ', 2);
            results.serialize(serializer)?;
        }

        Ok(buffer)
    }
}
