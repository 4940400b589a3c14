//! Issue types for checker results

use serde::{Deserialize, Serialize};

/// Severity level for issues
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Warning - the document is valid but questionable
    #[default]
    Warning,
    /// Error - the document violates the standard
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// XML location of an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// XPath-like address of the offending element or attribute
    pub xpath: String,
    /// What is wrong at this location
    pub description: String,
}

impl Location {
    pub fn new(xpath: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            xpath: xpath.into(),
            description: description.into(),
        }
    }
}

/// A finding produced by a rule body, before it is registered with a reporter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Severity level
    pub severity: Severity,
    /// Human-readable description
    pub description: String,
    /// Locations inside the document
    pub locations: Vec<Location>,
}

impl Issue {
    /// Create a new issue
    pub fn new(severity: Severity, description: impl Into<String>) -> Self {
        Self {
            severity,
            description: description.into(),
            locations: Vec::new(),
        }
    }

    /// Add a location
    pub fn at(mut self, xpath: impl Into<String>, description: impl Into<String>) -> Self {
        self.locations.push(Location::new(xpath, description));
        self
    }
}
