//! State machine procedure extraction
//!
//! Turns an element typed `smp:StateMachineProcedure` into a graph of states,
//! transitions and triggers. States are flagged initial/completed by comparing
//! their `name` against the realisation's `initialState`/`completedState`.

use crate::document::{NodeExt, OtxDocument};
use log::{debug, error};
use roxmltree::Node;
use thiserror::Error;

/// `xsi:type` value marking state machine procedures
pub const STATE_MACHINE_PROCEDURE_TYPE: &str = "smp:StateMachineProcedure";

/// Extraction failure for a single procedure
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(
        "Invalid realisation found in current state machine procedure named {name} with id {id} ({count} realisations)"
    )]
    InvalidRealisation {
        name: String,
        id: String,
        count: usize,
    },
}

#[derive(Debug, Clone)]
pub struct Trigger<'a, 'input> {
    pub id: Option<&'a str>,
    pub name: Option<&'a str>,
    pub node: Node<'a, 'input>,
}

#[derive(Debug, Clone)]
pub struct Transition<'a, 'input> {
    pub id: Option<&'a str>,
    pub name: Option<&'a str>,
    pub target: Option<&'a str>,
    pub node: Node<'a, 'input>,
}

impl Transition<'_, '_> {
    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct State<'a, 'input> {
    pub id: Option<&'a str>,
    pub name: Option<&'a str>,
    pub is_initial: bool,
    pub is_completed: bool,
    pub transitions: Vec<Transition<'a, 'input>>,
    /// Ids of this state's own transitions that carry a target
    ///
    /// These are transition ids, not the ids of the target states. Only the
    /// count is meaningful to the rules.
    pub target_state_ids: Vec<&'a str>,
    pub triggers: Vec<Trigger<'a, 'input>>,
    pub node: Node<'a, 'input>,
}

impl State<'_, '_> {
    /// Display label used in issue descriptions
    pub fn label(&self) -> String {
        format!(
            "State {} with id {}",
            self.name.unwrap_or("None"),
            self.id.unwrap_or("None")
        )
    }
}

#[derive(Debug, Clone)]
pub struct StateMachine<'a, 'input> {
    pub id: Option<&'a str>,
    pub name: Option<&'a str>,
    pub initial_state: Option<&'a str>,
    pub completed_state: Option<&'a str>,
    pub realisation: Node<'a, 'input>,
    pub states: Vec<State<'a, 'input>>,
    pub node: Node<'a, 'input>,
}

impl<'a, 'input> StateMachine<'a, 'input> {
    /// The first state flagged as completed
    pub fn completed(&self) -> Option<&State<'a, 'input>> {
        self.states.iter().find(|s| s.is_completed)
    }
}

/// All elements typed as state machine procedures, in document order
pub fn state_machine_procedures<'a, 'input>(doc: &'a OtxDocument<'input>) -> Vec<Node<'a, 'input>> {
    doc.typed_elements(STATE_MACHINE_PROCEDURE_TYPE)
}

/// Extract the state machine of one procedure
///
/// `smp` is the namespace URI bound to the `smp` prefix. The procedure must
/// have exactly one `smp:realisation` child.
pub fn extract<'a, 'input>(
    procedure: Node<'a, 'input>,
    smp: &str,
) -> Result<StateMachine<'a, 'input>, ExtractError> {
    let id = procedure.attribute("id");
    let name = procedure.attribute("name");

    let realisations = procedure.children_named_in(smp, "realisation");
    let &[realisation] = realisations.as_slice() else {
        return Err(ExtractError::InvalidRealisation {
            name: name.unwrap_or("None").to_string(),
            id: id.unwrap_or("None").to_string(),
            count: realisations.len(),
        });
    };

    let initial_state = realisation.attribute("initialState");
    let completed_state = realisation.attribute("completedState");
    debug!(
        "state machine {:?}: initial {:?}, completed {:?}",
        name, initial_state, completed_state
    );

    let states = realisation
        .children_named_in(smp, "states")
        .into_iter()
        .flat_map(|states| states.children_named_in(smp, "state"))
        .map(|node| extract_state(node, smp, initial_state, completed_state))
        .collect();

    Ok(StateMachine {
        id,
        name,
        initial_state,
        completed_state,
        realisation,
        states,
        node: procedure,
    })
}

fn extract_state<'a, 'input>(
    node: Node<'a, 'input>,
    smp: &str,
    initial_state: Option<&str>,
    completed_state: Option<&str>,
) -> State<'a, 'input> {
    let name = node.attribute("name");

    let transitions: Vec<Transition> = node
        .children_named_in(smp, "transitions")
        .into_iter()
        .flat_map(|t| t.children_named_in(smp, "transition"))
        .map(|t| Transition {
            id: t.attribute("id"),
            name: t.attribute("name"),
            target: t.attribute("target"),
            node: t,
        })
        .collect();

    // transitions without an id still count, as an empty id
    let target_state_ids = transitions
        .iter()
        .filter(|t| t.has_target())
        .map(|t| t.id.unwrap_or_default())
        .collect();

    let triggers = node
        .children_named_in(smp, "triggers")
        .into_iter()
        .flat_map(|t| t.children_named_in(smp, "trigger"))
        .map(|t| Trigger {
            id: t.attribute("id"),
            name: t.attribute("name"),
            node: t,
        })
        .collect();

    State {
        id: node.attribute("id"),
        name,
        is_initial: name == initial_state,
        is_completed: name == completed_state,
        transitions,
        target_state_ids,
        triggers,
        node,
    }
}

/// Extract every state machine in the document, logging and dropping failures
pub fn state_machines<'a, 'input>(
    doc: &'a OtxDocument<'input>,
    smp: &str,
) -> Vec<StateMachine<'a, 'input>> {
    state_machine_procedures(doc)
        .into_iter()
        .filter_map(|procedure| match extract(procedure, smp) {
            Ok(machine) => Some(machine),
            Err(e) => {
                error!("{}", e);
                None
            }
        })
        .collect()
}
