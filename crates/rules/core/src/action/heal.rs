//! Pool- and charge-limited healing features: lay on hands, second wind.

use super::build::{ParamAnswer, ParamRequest, ParamSpec, TargetFilter};
use super::reaction::Resolution;
use super::{ActionKind, ActionPhase, ActionState, GameAction, Session};
use crate::dice::Roller;
use crate::env::{Battle, Entity};
use crate::error::ActionError;
use crate::item::{HealCost, ResolvedItem};
use crate::types::{ActionResource, ClassFeature, EntityId};

/// Paladin healing from a shared pool: pick a target, then how much of the
/// pool to spend.
#[derive(Clone, Debug)]
pub struct LayOnHandsAction {
    source: EntityId,
    pub target: Option<EntityId>,
    pub amount: Option<i64>,
    state: ActionState,
}

impl LayOnHandsAction {
    #[must_use]
    pub fn new(source: EntityId) -> Self {
        Self {
            source,
            target: None,
            amount: None,
            state: ActionState::default(),
        }
    }

    /// Eligibility: the feature, pool points, and an action.
    #[must_use]
    pub fn can(battle: &dyn Battle, entity: EntityId) -> bool {
        battle.entity(entity).is_some_and(|e| {
            e.class_feature(ClassFeature::LayOnHands)
                && e.feature_pool(ClassFeature::LayOnHands) > 0
        }) && battle.resource_remaining(entity, ActionResource::Action) > 0
    }
}

impl GameAction for LayOnHandsAction {
    fn source(&self) -> EntityId {
        self.source
    }

    fn kind(&self) -> ActionKind {
        ActionKind::LayOnHands
    }

    fn next_request(&self, _session: &Session<'_>, battle: &dyn Battle) -> Option<ParamRequest> {
        if self.target.is_none() {
            return Some(ParamRequest::single(ParamSpec::SelectTarget {
                num: 1,
                range: Some(5),
                filters: vec![TargetFilter::SelfTarget, TargetFilter::Allies],
            }));
        }
        if self.amount.is_none() {
            let pool = battle
                .entity(self.source)
                .map_or(0, |e| e.feature_pool(ClassFeature::LayOnHands));
            return Some(ParamRequest::single(ParamSpec::NumberInput {
                min: 1,
                max: pool,
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
                ParamAnswer::Number(amount) => self.amount = Some(amount),
                _ => {
                    return Err(ActionError::ParameterType {
                        expected: "target or number",
                    });
                }
            }
        }
        self.state.phase = match (self.target, self.amount) {
            (Some(_), Some(_)) => ActionPhase::Ready,
            (Some(_), None) => ActionPhase::AwaitingParam(1),
            _ => ActionPhase::AwaitingParam(0),
        };
        Ok(())
    }

    fn validate(&mut self, _session: &Session<'_>, battle: &dyn Battle) {
        self.state.errors.clear();
        if self.target.is_none() {
            self.state.errors.push("a target is required".into());
        }
        let pool = battle
            .entity(self.source)
            .map_or(0, |e| e.feature_pool(ClassFeature::LayOnHands));
        match self.amount {
            None => self.state.errors.push("an amount is required".into()),
            Some(amount) if amount < 1 => {
                self.state.errors.push("amount must be at least 1".into());
            }
            Some(amount) if amount > pool => {
                self.state
                    .errors
                    .push(format!("only {pool} points remain in the pool"));
            }
            Some(_) => {}
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
        let amount = self.amount.ok_or(ActionError::MissingParameter("amount"))?;
        let items = vec![ResolvedItem::LayOnHands {
            source: self.source,
            target,
            amount,
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

/// Fighter self-heal: `1d10 + level`, once per rest, as a bonus action.
#[derive(Clone, Debug)]
pub struct SecondWindAction {
    source: EntityId,
    state: ActionState,
}

impl SecondWindAction {
    #[must_use]
    pub fn new(source: EntityId) -> Self {
        let state = ActionState {
            phase: ActionPhase::Ready,
            ..ActionState::default()
        };
        Self { source, state }
    }

    /// Eligibility: the feature, an unspent charge, and a bonus action.
    #[must_use]
    pub fn can(battle: &dyn Battle, entity: EntityId) -> bool {
        battle.entity(entity).is_some_and(|e| {
            e.class_feature(ClassFeature::SecondWind)
                && e.feature_pool(ClassFeature::SecondWind) > 0
        }) && battle.resource_remaining(entity, ActionResource::BonusAction) > 0
    }
}

impl GameAction for SecondWindAction {
    fn source(&self) -> EntityId {
        self.source
    }

    fn kind(&self) -> ActionKind {
        ActionKind::SecondWind
    }

    fn next_request(&self, _session: &Session<'_>, _battle: &dyn Battle) -> Option<ParamRequest> {
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
        let eligible = battle.entity(self.source).is_some_and(|e| {
            e.class_feature(ClassFeature::SecondWind)
                && e.feature_pool(ClassFeature::SecondWind) > 0
        });
        if !eligible {
            self.state.errors.push("second wind is not available".into());
        }
        if battle.resource_remaining(self.source, ActionResource::BonusAction) == 0 {
            self.state.errors.push("no bonus action remaining".into());
        }
    }

    fn errors(&self) -> &[String] {
        &self.state.errors
    }

    fn resolve(
        &mut self,
        _session: &Session<'_>,
        battle: &mut dyn Battle,
    ) -> Result<Resolution, ActionError> {
        let level = battle
            .entity(self.source)
            .ok_or(ActionError::UnknownEntity(self.source))?
            .level();
        let healing = Roller::new(&format!("1d10+{level}"))
            .description("second wind")
            .roll(battle.dice());
        let items = vec![ResolvedItem::Heal {
            source: self.source,
            target: self.source,
            healing,
            cost: HealCost::FeatureCharge,
            economy: ActionResource::BonusAction,
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
