//! Archive action type safety rules

use crate::document::NodeExt;
use crate::engine::CheckContext;
use crate::rule::{CheckError, Rule, RuleGroup};
use log::debug;

/// Get the zip file rules
pub fn rules() -> Vec<Rule> {
    vec![
        Rule::new(
            RuleGroup::ZipFile,
            2,
            "type_safe_zip_file",
            "In a ZipFile action, the list described by ListTerm <extensions> shall have a data type of <String>.",
            type_safe_zip_file,
        ),
        Rule::new(
            RuleGroup::ZipFile,
            1,
            "type_safe_unzip_file",
            "In an UnZipFile action, the list described by ListTerm <extensions> shall have a data type of <String>.",
            type_safe_unzip_file,
        ),
    ]
}

fn type_safe_zip_file(ctx: &mut CheckContext<'_, '_>) -> Result<(), CheckError> {
    check_string_lists(
        ctx,
        "zip:ZipFile",
        "ZipFile action specifies a List not String typed",
        "Zip action does not contain any String type",
    )
}

fn type_safe_unzip_file(ctx: &mut CheckContext<'_, '_>) -> Result<(), CheckError> {
    check_string_lists(
        ctx,
        "zip:UnZipFile",
        "UnZipFile action specifies a List not String typed",
        "Unzip action does not contain any String type",
    )
}

/// Flag every `ListLiteral` below an action of `action_type` with no `String` member
fn check_string_lists(
    ctx: &mut CheckContext<'_, '_>,
    action_type: &str,
    issue_description: &str,
    location_description: &str,
) -> Result<(), CheckError> {
    let doc = ctx.document();
    if !doc.has_prefix("xsi") || !doc.has_prefix("zip") {
        ctx.skip("xsi is not in nsmap or zip is not in nsmap. Skip the check.");
        return Ok(());
    }

    for action in doc.typed_elements(action_type) {
        let lists = action
            .descendant_elements()
            .filter(|n| doc.xsi_type(*n) == Some("ListLiteral"));

        for list in lists {
            let string_members = list
                .descendant_elements()
                .filter(|n| doc.xsi_type(*n) == Some("String"))
                .count();
            debug!(
                "{} at {} has {} String members",
                action_type,
                doc.path_of(list),
                string_members
            );

            if string_members == 0 {
                let issue = ctx
                    .issue(issue_description)
                    .at(doc.path_of(list), location_description);
                ctx.report(issue);
            }
        }
    }
    Ok(())
}
