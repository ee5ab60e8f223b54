//! Positioning and support actions: move, dodge, disengage, help.

use super::build::{ParamAnswer, ParamRequest, ParamSpec, TargetFilter};
use super::reaction::Resolution;
use super::{ActionKind, ActionPhase, ActionState, GameAction, Session};
use crate::env::Battle;
use crate::error::ActionError;
use crate::item::ResolvedItem;
use crate::types::{ActionResource, EntityId, Position};

/// Feet of movement one path step costs on the standard grid.
const FEET_PER_SQUARE: u32 = 5;

/// Budget-checked displacement along a path of squares.
#[derive(Clone, Debug)]
pub struct MoveAction {
    source: EntityId,
    pub path: Vec<Position>,
    state: ActionState,
}

impl MoveAction {
    #[must_use]
    pub fn new(source: EntityId) -> Self {
        Self {
            source,
            path: Vec::new(),
            state: ActionState::default(),
        }
    }

    /// Movement eligibility: any budget left.
    #[must_use]
    pub fn can(battle: &dyn Battle, entity: EntityId) -> bool {
        battle
            .entity_state_for(entity)
            .is_some_and(|s| s.movement >= FEET_PER_SQUARE)
    }
}

impl GameAction for MoveAction {
    fn source(&self) -> EntityId {
        self.source
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Move
    }

    fn next_request(&self, _session: &Session<'_>, _battle: &dyn Battle) -> Option<ParamRequest> {
        if self.path.is_empty() {
            return Some(ParamRequest::single(ParamSpec::SelectPath));
        }
        None
    }

    fn supply(
        &mut self,
        _session: &Session<'_>,
        answers: Vec<ParamAnswer>,
    ) -> Result<(), ActionError> {
        for answer in answers {
            match answer {
                ParamAnswer::Path(path) => self.path = path,
                _ => return Err(ActionError::ParameterType { expected: "path" }),
            }
        }
        self.state.phase = ActionPhase::Ready;
        Ok(())
    }

    fn validate(&mut self, _session: &Session<'_>, battle: &dyn Battle) {
        self.state.errors.clear();
        if self.path.is_empty() {
            self.state.errors.push("a movement path is required".into());
            return;
        }
        let cost = self.path.len() as u32 * FEET_PER_SQUARE;
        let budget = battle
            .entity_state_for(self.source)
            .map_or(0, |s| s.movement);
        if cost > budget {
            self.state
                .errors
                .push(format!("path costs {cost} ft but only {budget} ft remain"));
        }
    }

    fn errors(&self) -> &[String] {
        &self.state.errors
    }

    fn resolve(
        &mut self,
        _session: &Session<'_>,
        _battle: &mut dyn Battle,
    ) -> Result<Resolution, ActionError> {
        if self.path.is_empty() {
            return Err(ActionError::MissingParameter("path"));
        }
        let items = vec![ResolvedItem::Move {
            source: self.source,
            path: self.path.clone(),
        }];
        Ok(Resolution::Complete(self.state.resolved(items)))
    }

    fn result(&self) -> &[ResolvedItem] {
        &self.state.result
    }

    fn phase(&self) -> ActionPhase {
        self.state.phase
    }

    fn mark_applied(&mut self) {
        self.state.phase = ActionPhase::Applied;
    }
}

macro_rules! simple_action {
    ($(#[$doc:meta])* $name:ident, $kind:expr, $item:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug)]
        pub struct $name {
            source: EntityId,
            state: ActionState,
        }

        impl $name {
            #[must_use]
            pub fn new(source: EntityId) -> Self {
                let state = ActionState {
                    phase: ActionPhase::Ready,
                    ..ActionState::default()
                };
                Self { source, state }
            }

            /// Eligibility: an action remains this turn.
            #[must_use]
            pub fn can(battle: &dyn Battle, entity: EntityId) -> bool {
                battle.resource_remaining(entity, ActionResource::Action) > 0
            }
        }

        impl GameAction for $name {
            fn source(&self) -> EntityId {
                self.source
            }

            fn kind(&self) -> ActionKind {
                $kind
            }

            fn next_request(
                &self,
                _session: &Session<'_>,
                _battle: &dyn Battle,
            ) -> Option<ParamRequest> {
                None
            }

            fn supply(
                &mut self,
                _session: &Session<'_>,
                _answers: Vec<ParamAnswer>,
            ) -> Result<(), ActionError> {
                Ok(())
            }

            fn validate(&mut self, _session: &Session<'_>, battle: &dyn Battle) {
                self.state.errors.clear();
                if battle.resource_remaining(self.source, ActionResource::Action) == 0 {
                    self.state.errors.push("no action remaining".into());
                }
            }

            fn errors(&self) -> &[String] {
                &self.state.errors
            }

            fn resolve(
                &mut self,
                _session: &Session<'_>,
                _battle: &mut dyn Battle,
            ) -> Result<Resolution, ActionError> {
                let items = vec![ResolvedItem::$item {
                    source: self.source,
                }];
                Ok(Resolution::Complete(self.state.resolved(items)))
            }

            fn result(&self) -> &[ResolvedItem] {
                &self.state.result
            }

            fn phase(&self) -> ActionPhase {
                self.state.phase
            }

            fn mark_applied(&mut self) {
                self.state.phase = ActionPhase::Applied;
            }
        }
    };
}

simple_action!(
    /// Weave and dodge: attacks against the entity roll at disadvantage
    /// until its next turn.
    DodgeAction,
    ActionKind::Dodge,
    Dodge
);

simple_action!(
    /// Movement stops provoking opportunity attacks this turn.
    DisengageAction,
    ActionKind::Disengage,
    Disengage
);

/// Help an ally: attacks against the chosen target gain advantage.
#[derive(Clone, Debug)]
pub struct HelpAction {
    source: EntityId,
    pub target: Option<EntityId>,
    state: ActionState,
}

impl HelpAction {
    #[must_use]
    pub fn new(source: EntityId) -> Self {
        Self {
            source,
            target: None,
            state: ActionState::default(),
        }
    }

    /// Eligibility: an action remains this turn.
    #[must_use]
    pub fn can(battle: &dyn Battle, entity: EntityId) -> bool {
        battle.resource_remaining(entity, ActionResource::Action) > 0
    }
}

impl GameAction for HelpAction {
    fn source(&self) -> EntityId {
        self.source
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Help
    }

    fn next_request(&self, _session: &Session<'_>, _battle: &dyn Battle) -> Option<ParamRequest> {
        if self.target.is_none() {
            return Some(ParamRequest::single(ParamSpec::SelectTarget {
                num: 1,
                range: Some(5),
                filters: vec![TargetFilter::Enemies],
            }));
        }
        None
    }

    fn supply(
        &mut self,
        _session: &Session<'_>,
        answers: Vec<ParamAnswer>,
    ) -> Result<(), ActionError> {
        for answer in answers {
            match answer {
                ParamAnswer::Target(target) => self.target = Some(target),
                _ => return Err(ActionError::ParameterType { expected: "target" }),
            }
        }
        self.state.phase = ActionPhase::Ready;
        Ok(())
    }

    fn validate(&mut self, _session: &Session<'_>, battle: &dyn Battle) {
        self.state.errors.clear();
        if self.target.is_none() {
            self.state.errors.push("a target is required".into());
        }
        if battle.resource_remaining(self.source, ActionResource::Action) == 0 {
            self.state.errors.push("no action remaining".into());
        }
    }

    fn errors(&self) -> &[String] {
        &self.state.errors
    }

    fn resolve(
        &mut self,
        _session: &Session<'_>,
        _battle: &mut dyn Battle,
    ) -> Result<Resolution, ActionError> {
        let target = self.target.ok_or(ActionError::MissingParameter("target"))?;
        let items = vec![ResolvedItem::Help {
            source: self.source,
            target,
        }];
        Ok(Resolution::Complete(self.state.resolved(items)))
    }

    fn result(&self) -> &[ResolvedItem] {
        &self.state.result
    }

    fn phase(&self) -> ActionPhase {
        self.state.phase
    }

    fn mark_applied(&mut self) {
        self.state.phase = ActionPhase::Applied;
    }
}
