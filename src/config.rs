//! Checker bundle configuration
//!
//! Reads configuration from:
//! - the checker-bundle XML layout (`.xml`)
//! - `.yaml` / `.yml`
//! - `.json`
//!
//! The XML layout looks like:
//!
//! ```xml
//! <Config>
//!   <Param name="InputFile" value="Example.otx"/>
//!   <CheckerBundle application="otxBundle">
//!     <Param name="resultFile" value="otx_bundle_report.xqar"/>
//!   </CheckerBundle>
//! </Config>
//! ```
//!
//! YAML and JSON carry the same data as two maps, `params` and `bundles`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Global parameter naming the document to check
pub const INPUT_FILE_PARAM: &str = "InputFile";

/// Bundle parameter naming the result file
pub const RESULT_FILE_PARAM: &str = "resultFile";

/// Bundle name used when the caller does not pick one
pub const DEFAULT_BUNDLE_NAME: &str = "otxBundle";

/// Result file used when the bundle does not name one
pub const DEFAULT_RESULT_FILE: &str = "otx_bundle_report.xqar";

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required parameter: {0}")]
    MissingParam(String),

    #[error("Unknown config file format: {0}")]
    UnsupportedFormat(String),
}

/// Resolved configuration for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Document to check
    pub input_file: PathBuf,

    /// Where the result record is written
    pub result_file: PathBuf,

    /// Name of the checker bundle
    pub bundle_name: String,

    /// Every global parameter, copied into the report
    pub params: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from a file, picking the format by extension
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "xml" => Self::from_xml_str(&content),
            "yaml" | "yml" => Self::from_yaml_str(&content),
            "json" => Self::from_json_str(&content),
            _ => Err(ConfigError::UnsupportedFormat(ext)),
        }
    }

    /// Parse the checker-bundle XML layout
    pub fn from_xml_str(content: &str) -> Result<Self, ConfigError> {
        let xml: XmlConfig = quick_xml::de::from_str(content)?;
        xml.into_raw().resolve()
    }

    /// Parse YAML configuration
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(content)?;
        raw.resolve()
    }

    /// Parse JSON configuration
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(content)?;
        raw.resolve()
    }
}

/// Format-neutral configuration before defaults are applied
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    params: BTreeMap<String, String>,
    bundles: BTreeMap<String, BTreeMap<String, String>>,
    bundle_name: Option<String>,
}

impl RawConfig {
    fn resolve(self) -> Result<Config, ConfigError> {
        let input_file = self
            .params
            .get(INPUT_FILE_PARAM)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::MissingParam(INPUT_FILE_PARAM.to_string()))?;

        let bundle_name = self
            .bundle_name
            .unwrap_or_else(|| DEFAULT_BUNDLE_NAME.to_string());

        // prefer the bundle named after us, else whatever bundle is there
        let bundle = self
            .bundles
            .get(&bundle_name)
            .or_else(|| self.bundles.values().next());

        let result_file = bundle
            .and_then(|params| params.get(RESULT_FILE_PARAM))
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULT_FILE));

        Ok(Config {
            input_file,
            result_file,
            bundle_name,
            params: self.params,
        })
    }
}

#[derive(Debug, Deserialize)]
struct XmlConfig {
    #[serde(rename = "Param", default)]
    params: Vec<XmlParam>,

    #[serde(rename = "CheckerBundle", default)]
    bundles: Vec<XmlBundle>,
}

#[derive(Debug, Deserialize)]
struct XmlParam {
    #[serde(rename = "@name")]
    name: String,

    #[serde(rename = "@value", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct XmlBundle {
    #[serde(rename = "@application")]
    application: String,

    #[serde(rename = "Param", default)]
    params: Vec<XmlParam>,
}

impl XmlConfig {
    fn into_raw(self) -> RawConfig {
        let collect = |params: Vec<XmlParam>| {
            params
                .into_iter()
                .map(|p| (p.name, p.value))
                .collect::<BTreeMap<_, _>>()
        };

        let params = collect(self.params);
        let bundles = self
            .bundles
            .into_iter()
            .map(|b| (b.application, collect(b.params)))
            .collect();

        RawConfig {
            params,
            bundles,
            bundle_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Config>
  <Param name="InputFile" value="tests/fixtures/Example.otx"/>
  <Param name="Verbose" value="yes"/>
  <CheckerBundle application="otxBundle">
    <Param name="resultFile" value="out.xqar"/>
  </CheckerBundle>
  <ReportModule application="TextReport">
    <Param name="strInputFile" value="Result.xqar"/>
  </ReportModule>
</Config>"#;

    #[test]
    fn test_from_xml() {
        let config = Config::from_xml_str(XML).unwrap();
        assert_eq!(config.input_file, PathBuf::from("tests/fixtures/Example.otx"));
        assert_eq!(config.result_file, PathBuf::from("out.xqar"));
        assert_eq!(config.bundle_name, "otxBundle");
        assert_eq!(config.params.get("Verbose").map(String::as_str), Some("yes"));
        assert_eq!(config.params.len(), 2);
    }

    #[test]
    fn test_default_result_file() {
        let xml = r#"<Config><Param name="InputFile" value="a.otx"/></Config>"#;
        let config = Config::from_xml_str(xml).unwrap();
        assert_eq!(config.result_file, PathBuf::from(DEFAULT_RESULT_FILE));
    }

    #[test]
    fn test_foreign_bundle_is_used_as_fallback() {
        let xml = r#"<Config>
  <Param name="InputFile" value="a.otx"/>
  <CheckerBundle application="other"><Param name="resultFile" value="other.xqar"/></CheckerBundle>
</Config>"#;
        let config = Config::from_xml_str(xml).unwrap();
        assert_eq!(config.result_file, PathBuf::from("other.xqar"));
    }

    #[test]
    fn test_missing_input_file() {
        let xml = r#"<Config><CheckerBundle application="otxBundle"/></Config>"#;
        let err = Config::from_xml_str(xml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingParam(ref p) if p == "InputFile"));
        assert_eq!(err.to_string(), "Missing required parameter: InputFile");
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
params:
  InputFile: Example.otx
bundles:
  otxBundle:
    resultFile: report.json
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.input_file, PathBuf::from("Example.otx"));
        assert_eq!(config.result_file, PathBuf::from("report.json"));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{"params": {"InputFile": "Example.otx"}, "bundle_name": "custom"}"#;
        let config = Config::from_json_str(json).unwrap();
        assert_eq!(config.bundle_name, "custom");
        assert_eq!(config.result_file, PathBuf::from(DEFAULT_RESULT_FILE));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = TempDir::new().unwrap();

        let xml_path = dir.path().join("config.xml");
        fs::write(&xml_path, XML).unwrap();
        assert!(Config::load(&xml_path).is_ok());

        let yml_path = dir.path().join("config.yml");
        fs::write(&yml_path, "params:\n  InputFile: a.otx\n").unwrap();
        assert!(Config::load(&yml_path).is_ok());

        let ini_path = dir.path().join("config.ini");
        fs::write(&ini_path, "InputFile=a.otx").unwrap();
        assert!(matches!(
            Config::load(&ini_path),
            Err(ConfigError::UnsupportedFormat(_))
        ));

        assert!(matches!(
            Config::load(&dir.path().join("missing.xml")),
            Err(ConfigError::Io(_))
        ));
    }
}
