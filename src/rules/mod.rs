//! Built-in OTX rules
//!
//! Rules run in the order returned by [`builtin_rules`]: core, data type,
//! zip file, then state machine checks.

pub mod core;
pub mod data_type;
pub mod state_machine;
pub mod zip_file;

use crate::rule::Rule;

/// Get all built-in rules in execution order
pub fn builtin_rules() -> Vec<Rule> {
    let mut rules = self::core::rules();
    rules.extend(data_type::rules());
    rules.extend(zip_file::rules());
    rules.extend(state_machine::rules());
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_order() {
        let ids: Vec<String> = builtin_rules().iter().map(|r| r.checker_id()).collect();
        assert_eq!(ids.len(), 20);
        assert_eq!(
            ids.first().map(String::as_str),
            Some("check_asam_otx_core_chk_001_document_name_matches_filename")
        );
        assert_eq!(
            ids[10],
            "check_asam_otx_data_type_chk_001_accessing_structure_elements"
        );
        assert_eq!(ids[12], "check_asam_otx_zip_file_chk_002_type_safe_zip_file");
        assert_eq!(ids[13], "check_asam_otx_zip_file_chk_001_type_safe_unzip_file");
        assert_eq!(
            ids.last().map(String::as_str),
            Some("check_asam_otx_state_machine_chk_006_distinguished_initial_and_completed_state")
        );
    }

    #[test]
    fn test_checker_ids_unique() {
        let rules = builtin_rules();
        let ids: HashSet<String> = rules.iter().map(|r| r.checker_id()).collect();
        assert_eq!(ids.len(), rules.len());
    }

    #[test]
    fn test_rule_uids_well_formed() {
        for rule in builtin_rules() {
            let uid = rule.rule_uid();
            let parsed = crate::version::RuleUid::parse(&uid).unwrap();
            assert_eq!(parsed.emanating_entity, "asam.net");
            assert_eq!(parsed.standard, "otx");
            assert_eq!(parsed.definition_setting, "1.0.0");
            assert!(rule.preconditions.is_empty());
        }
    }
}
