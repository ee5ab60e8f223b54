//! Interactive parameter building.
//!
//! An action under construction exposes an explicit, serializable sequence
//! of typed parameter requests; each answer set is folded in by the
//! action's pure `supply` reducer and the next request is recomputed from
//! the chain so far. Repeated application eventually yields `Ready`. No
//! closures over mutable captured state are involved: a request is plain
//! data a UI can render and an AI can enumerate.

use super::{GameAction, Session};
use crate::env::Battle;
use crate::error::ActionError;
use crate::types::{EntityId, Position};

/// Which entities a target-selection step accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetFilter {
    Enemies,
    Allies,
    SelfTarget,
}

/// One typed parameter request.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamSpec {
    /// Pick `num` target entities within `range` feet.
    SelectTarget {
        num: u8,
        range: Option<u32>,
        filters: Vec<TargetFilter>,
    },
    /// Pick a weapon from the source's equipment.
    SelectWeapon,
    /// Pick a spell (and the slot level to cast it at).
    SelectSpell,
    /// Pick a usable item from inventory.
    SelectItem,
    /// Supply a number in the inclusive range.
    NumberInput { min: i64, max: i64 },
    /// Supply a movement path.
    SelectPath,
}

/// A batch of parameter specs requested together.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParamRequest {
    pub specs: Vec<ParamSpec>,
}

impl ParamRequest {
    #[must_use]
    pub fn single(spec: ParamSpec) -> Self {
        Self { specs: vec![spec] }
    }
}

/// A typed answer to one parameter spec.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamAnswer {
    Target(EntityId),
    Targets(Vec<EntityId>),
    Weapon(String),
    Spell { name: String, at_level: u8 },
    Item(String),
    Number(i64),
    Path(Vec<Position>),
}

/// Driver-visible state of the wizard.
#[derive(Clone, Debug, PartialEq)]
pub enum BuildState {
    /// The action needs these parameters next.
    NeedsParams(ParamRequest),
    /// Fully parameterized; resolve may run.
    Ready,
}

/// One wizard step: ask the action what it needs next.
#[must_use]
pub fn build_map(
    action: &dyn GameAction,
    session: &Session<'_>,
    battle: &dyn Battle,
) -> BuildState {
    match action.next_request(session, battle) {
        Some(request) => BuildState::NeedsParams(request),
        None => BuildState::Ready,
    }
}

/// Drive the wizard to completion with a fixed list of answer batches.
///
/// Convenience for AIs and tests that know every answer up front. Errors
/// if the answers run out before the action is ready.
pub fn drive(
    action: &mut dyn GameAction,
    session: &Session<'_>,
    battle: &dyn Battle,
    answer_batches: Vec<Vec<ParamAnswer>>,
) -> Result<(), ActionError> {
    let mut batches = answer_batches.into_iter();
    while let BuildState::NeedsParams(_) = build_map(action, session, battle) {
        let batch = batches
            .next()
            .ok_or(ActionError::MissingParameter("answer batch"))?;
        action.supply(session, batch)?;
    }
    Ok(())
}
