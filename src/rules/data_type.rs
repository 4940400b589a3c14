//! Data type reference rules

use crate::document::NodeExt;
use crate::engine::CheckContext;
use crate::extract::{signature_map, variable_structure_types};
use crate::rule::{CheckError, Rule, RuleGroup};
use log::debug;

/// Get the data type rules
pub fn rules() -> Vec<Rule> {
    vec![
        Rule::new(
            RuleGroup::DataType,
            1,
            "accessing_structure_elements",
            "Accessing structure elements is only allowed via StepByName using matching string literals.",
            accessing_structure_elements,
        ),
        Rule::new(
            RuleGroup::DataType,
            8,
            "correct_target_for_structure_element",
            "When referring to a structure element, an existing <element> name of the referenced StructureSignature shall be used.",
            correct_target_for_structure_element,
        ),
    ]
}

fn accessing_structure_elements(ctx: &mut CheckContext<'_, '_>) -> Result<(), CheckError> {
    let doc = ctx.document();
    let signatures = signature_map(doc);
    let variable_types = variable_structure_types(doc);

    for step in doc.elements_named("stepByName") {
        let value = step.attribute("value");

        // the accessed variable sits two levels up
        let Some(variable) = step
            .parent_element()
            .and_then(|path| path.parent_element())
            .and_then(|owner| owner.attribute("name"))
        else {
            continue;
        };
        let Some(structure_type) = variable_types.get(variable) else {
            continue;
        };
        let Some(fields) = signatures.get(structure_type) else {
            debug!("no signature for structure type {}", structure_type);
            continue;
        };

        let known = value.is_some_and(|v| fields.iter().any(|f| f == v));
        if !known {
            let issue = ctx.issue("StepByName node accessing invalid fields").at(
                doc.path_of(step),
                format!(
                    "Accessing {} for variable {} of type {} is not present in type definition",
                    value.unwrap_or("None"),
                    variable,
                    structure_type
                ),
            );
            ctx.report(issue);
        }
    }
    Ok(())
}

fn correct_target_for_structure_element(
    ctx: &mut CheckContext<'_, '_>,
) -> Result<(), CheckError> {
    let doc = ctx.document();
    let signatures = signature_map(doc);
    let variable_types = variable_structure_types(doc);

    for (variable, structure_type) in &variable_types {
        let Some(fields) = signatures.get(structure_type) else {
            debug!(
                "no signature for structure type {} of {}",
                structure_type, variable
            );
            continue;
        };

        let instances = doc
            .elements()
            .filter(|n| n.attribute("name") == Some(variable.as_str()));

        for instance in instances {
            for access in instance.descendant_elements() {
                let Some(value) = access.attribute("value") else {
                    continue;
                };
                if fields.iter().any(|f| f == value) {
                    continue;
                }

                let issue = ctx
                    .issue("Invalid names used while accessing structure element")
                    .at(
                        doc.path_of(instance),
                        format!(
                            "Accessing {} for variable {} of type {} is not present in type definition",
                            value, variable, structure_type
                        ),
                    );
                ctx.report(issue);
            }
        }
    }
    Ok(())
}
