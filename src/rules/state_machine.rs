//! State machine procedure rules
//!
//! Every rule here skips itself when the document does not declare the `smp`
//! prefix or contains no `smp:StateMachineProcedure` typed element.

use crate::document::NodeExt;
use crate::engine::CheckContext;
use crate::issue::Severity;
use crate::rule::{CheckError, Rule, RuleGroup};
use crate::state_machine::{state_machine_procedures, state_machines, StateMachine};
use log::{debug, warn};
use roxmltree::Node;

/// Get the state machine rules
pub fn rules() -> Vec<Rule> {
    vec![
        Rule::new(
            RuleGroup::StateMachine,
            1,
            "no_procedure_realization",
            "A StateMachineProcedure shall not have a ProcedureRealisation.",
            no_procedure_realization,
        ),
        Rule::new(
            RuleGroup::StateMachine,
            2,
            "mandatory_target_state",
            "Each state except the completed state shall have a target state.",
            mandatory_target_state,
        ),
        Rule::new(
            RuleGroup::StateMachine,
            3,
            "no_target_state_for_completed_state",
            "After finishing the completed state the procedure is finished and shall return to the caller. Therefore the completed state shall not have a target state.",
            no_target_state_for_completed_state,
        )
        .with_severity(Severity::Warning),
        Rule::new(
            RuleGroup::StateMachine,
            5,
            "mandatory_transition",
            "Each state except the completed state shall have at least one transition.",
            mandatory_transition,
        ),
        Rule::new(
            RuleGroup::StateMachine,
            4,
            "mandatory_trigger",
            "Each state except the completed state shall have at least one trigger.",
            mandatory_trigger,
        ),
        Rule::new(
            RuleGroup::StateMachine,
            6,
            "distinguished_initial_and_completed_state",
            "The values of the mandatory initialState and optional completedState attributes shall be distinguished.",
            distinguished_initial_and_completed_state,
        ),
    ]
}

/// The `smp` namespace and the state machine procedures, or a skip
fn procedures<'a, 'input>(
    ctx: &mut CheckContext<'a, 'input>,
) -> Option<(&'a str, Vec<Node<'a, 'input>>)> {
    let doc = ctx.document();

    let Some(smp) = doc.namespace("smp") else {
        warn!("No state machine procedure prefix \"smp\" found in document namespaces");
        ctx.skip("No state machine procedure prefix 'smp' found in document namespaces. Skip the check.");
        return None;
    };

    let procedures = state_machine_procedures(doc);
    if procedures.is_empty() {
        ctx.skip("State machine procedures not found. Skip the check.");
        return None;
    }
    debug!("{} state machine procedures", procedures.len());
    Some((smp, procedures))
}

/// Extracted state machines, or a skip
fn machines<'a, 'input>(ctx: &mut CheckContext<'a, 'input>) -> Option<Vec<StateMachine<'a, 'input>>> {
    let (smp, _) = procedures(ctx)?;
    Some(state_machines(ctx.document(), smp))
}

fn no_procedure_realization(ctx: &mut CheckContext<'_, '_>) -> Result<(), CheckError> {
    let Some((_, nodes)) = procedures(ctx) else {
        return Ok(());
    };
    let doc = ctx.document();
    let core = doc.core_namespace();

    for procedure in nodes {
        let realisation = procedure
            .children()
            .find(|c| c.is_named("realisation") && c.tag_name().namespace() == core);

        if let Some(realisation) = realisation {
            let issue = ctx
                .issue("StateMachineProcedure has a ProcedureRealisation")
                .at(
                    doc.path_of(procedure),
                    format!(
                        "State machine {} has a ProcedureRealisation at {}",
                        procedure.attribute("id").unwrap_or("None"),
                        doc.path_of(realisation)
                    ),
                );
            ctx.report(issue);
        }
    }
    Ok(())
}

fn mandatory_target_state(ctx: &mut CheckContext<'_, '_>) -> Result<(), CheckError> {
    let Some(machines) = machines(ctx) else {
        return Ok(());
    };
    let doc = ctx.document();

    for state in machines.iter().flat_map(|m| &m.states) {
        if !state.is_completed && state.target_state_ids.is_empty() {
            let issue = ctx.issue("Non-completed state has no target state").at(
                doc.path_of(state.node),
                format!("{} does not have any target state", state.label()),
            );
            ctx.report(issue);
        }
    }
    Ok(())
}

fn no_target_state_for_completed_state(ctx: &mut CheckContext<'_, '_>) -> Result<(), CheckError> {
    let Some(machines) = machines(ctx) else {
        return Ok(());
    };
    let doc = ctx.document();

    for completed in machines.iter().filter_map(StateMachine::completed) {
        if !completed.target_state_ids.is_empty() {
            let issue = ctx.issue("completed state has a target state").at(
                doc.path_of(completed.node),
                format!(
                    "Completed state {} with id {} has a target state but it should not",
                    completed.name.unwrap_or("None"),
                    completed.id.unwrap_or("None")
                ),
            );
            ctx.report(issue);
        }
    }
    Ok(())
}

fn mandatory_transition(ctx: &mut CheckContext<'_, '_>) -> Result<(), CheckError> {
    let Some(machines) = machines(ctx) else {
        return Ok(());
    };
    let doc = ctx.document();

    for state in machines.iter().flat_map(|m| &m.states) {
        if !state.is_completed && state.transitions.is_empty() {
            let issue = ctx.issue("Non-completed state has no transition").at(
                doc.path_of(state.node),
                format!("{} does not have any transition", state.label()),
            );
            ctx.report(issue);
        }
    }
    Ok(())
}

fn mandatory_trigger(ctx: &mut CheckContext<'_, '_>) -> Result<(), CheckError> {
    let Some(machines) = machines(ctx) else {
        return Ok(());
    };
    let doc = ctx.document();

    for state in machines.iter().flat_map(|m| &m.states) {
        if !state.is_completed && state.triggers.is_empty() {
            let issue = ctx.issue("Non-completed state has no trigger").at(
                doc.path_of(state.node),
                format!("{} does not have any trigger", state.label()),
            );
            ctx.report(issue);
        }
    }
    Ok(())
}

fn distinguished_initial_and_completed_state(
    ctx: &mut CheckContext<'_, '_>,
) -> Result<(), CheckError> {
    let Some(machines) = machines(ctx) else {
        return Ok(());
    };
    let doc = ctx.document();

    for machine in &machines {
        // two missing attributes cannot be told apart either
        if machine.initial_state == machine.completed_state {
            let issue = ctx
                .issue("initialState and completedState cannot be distinguished")
                .at(
                    doc.path_of(machine.realisation),
                    "State machine realisation cannot distinguish between initial and completed state",
                );
            ctx.report(issue);
        }
    }
    Ok(())
}
