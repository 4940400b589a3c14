//! Checker bundle documentation in Markdown

use super::{OutputError, OutputFormatter};
use crate::report::Report;

/// Documents every registered checker and the rules it addresses
#[derive(Default)]
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format(&self, report: &Report) -> Result<String, OutputError> {
        let mut out = String::new();

        out.push_str(&format!("# Checker bundle: {}\n", report.name));
        out.push('\n');
        out.push_str(&format!("* Build version:  {}\n", report.version));
        out.push_str(&format!("* Description:    {}\n", report.description));
        out.push('\n');

        out.push_str("## Parameters\n");
        out.push('\n');
        if report.params.is_empty() {
            out.push_str("* None\n");
        }
        for name in report.params.keys() {
            out.push_str(&format!("* {}\n", name));
        }
        out.push('\n');

        out.push_str("## Checkers\n");
        for checker in &report.checkers {
            out.push('\n');
            out.push_str(&format!("### {}\n", checker.checker_id));
            out.push('\n');
            out.push_str(&format!("* Description: {}\n", checker.description));
            out.push_str("* Addressed rules:\n");
            for uid in &checker.rule_uids {
                out.push_str(&format!("  * {}\n", uid));
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::sample_report;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_markdown_doc() {
        let output = MarkdownFormatter::new().format(&sample_report()).unwrap();
        let expected = "\
# Checker bundle: otxBundle

* Build version:  0.1.0
* Description:    OTX checker bundle

## Parameters

* None

## Checkers

### check_asam_otx_core_chk_002_document_name_package_uniqueness

* Description: Document name & package <unique>
* Addressed rules:
  * asam.net:otx:1.0.0:core.chk_002.document_name_package_uniqueness

### check_asam_otx_state_machine_chk_001_no_procedure_realization

* Description: No realisation for state machine procedures
* Addressed rules:
";
        assert_eq!(output, expected);
    }
}
