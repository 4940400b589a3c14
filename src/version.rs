//! Version comparison and rule UID parsing

use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Error while interpreting a version string or rule UID
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("invalid version component '{component}' in '{version}'")]
    InvalidComponent { version: String, component: String },

    #[error("Invalid rule uid: {0}")]
    InvalidRuleUid(String),
}

/// Split a dotted version into numeric components
pub fn parse_version(version: &str) -> Result<Vec<u64>, VersionError> {
    version
        .split('.')
        .map(|component| {
            component
                .trim()
                .parse::<u64>()
                .map_err(|_| VersionError::InvalidComponent {
                    version: version.to_string(),
                    component: component.to_string(),
                })
        })
        .collect()
}

/// Compare two dotted versions numerically
///
/// The shorter version is padded with zero components, so `1.0` equals
/// `1.0.0` and `1.10.0` is greater than `1.2.0`.
pub fn compare_versions(left: &str, right: &str) -> Result<Ordering, VersionError> {
    let mut left = parse_version(left)?;
    let mut right = parse_version(right)?;

    let len = left.len().max(right.len());
    left.resize(len, 0);
    right.resize(len, 0);

    Ok(left.cmp(&right))
}

/// A rule UID of the form `<entity>:<standard>:<definition-setting>:<rule-name>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleUid<'a> {
    pub emanating_entity: &'a str,
    pub standard: &'a str,
    pub definition_setting: &'a str,
    pub rule_full_name: &'a str,
}

impl<'a> RuleUid<'a> {
    /// Parse a rule UID; exactly four colon-separated parts are required
    pub fn parse(uid: &'a str) -> Result<Self, VersionError> {
        let parts: Vec<&str> = uid.split(':').collect();
        match *parts.as_slice() {
            [entity, standard, setting, name] if parts.iter().all(|p| !p.is_empty()) => Ok(Self {
                emanating_entity: entity,
                standard,
                definition_setting: setting,
                rule_full_name: name,
            }),
            _ => Err(VersionError::InvalidRuleUid(uid.to_string())),
        }
    }
}

impl fmt::Display for RuleUid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.emanating_entity, self.standard, self.definition_setting, self.rule_full_name
        )
    }
}
