//! Consumable item use (healing potions and kin).

use super::build::{ParamAnswer, ParamRequest, ParamSpec, TargetFilter};
use super::reaction::Resolution;
use super::{ActionKind, ActionPhase, ActionState, GameAction, Session};
use crate::dice::Roller;
use crate::env::{Battle, Entity};
use crate::error::ActionError;
use crate::item::{HealCost, ResolvedItem};
use crate::types::{ActionResource, EntityId};

/// Use a consumable from inventory on self or an adjacent ally.
#[derive(Clone, Debug)]
pub struct UseItemAction {
    source: EntityId,
    /// Catalog key of the item being used.
    pub item: Option<String>,
    pub target: Option<EntityId>,
    state: ActionState,
}

impl UseItemAction {
    #[must_use]
    pub fn new(source: EntityId) -> Self {
        Self {
            source,
            item: None,
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

impl GameAction for UseItemAction {
    fn source(&self) -> EntityId {
        self.source
    }

    fn kind(&self) -> ActionKind {
        ActionKind::UseItem
    }

    fn next_request(&self, _session: &Session<'_>, _battle: &dyn Battle) -> Option<ParamRequest> {
        if self.item.is_none() {
            return Some(ParamRequest::single(ParamSpec::SelectItem));
        }
        if self.target.is_none() {
            return Some(ParamRequest::single(ParamSpec::SelectTarget {
                num: 1,
                range: Some(5),
                filters: vec![TargetFilter::SelfTarget, TargetFilter::Allies],
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
                ParamAnswer::Item(item) => self.item = Some(item),
                ParamAnswer::Target(target) => self.target = Some(target),
                _ => {
                    return Err(ActionError::ParameterType {
                        expected: "item or target",
                    });
                }
            }
        }
        self.state.phase = match (&self.item, self.target) {
            (Some(_), Some(_)) => ActionPhase::Ready,
            (Some(_), None) => ActionPhase::AwaitingParam(1),
            _ => ActionPhase::AwaitingParam(0),
        };
        Ok(())
    }

    fn validate(&mut self, session: &Session<'_>, battle: &dyn Battle) {
        self.state.errors.clear();
        let Some(item) = &self.item else {
            self.state.errors.push("an item is required".into());
            return;
        };
        if self.target.is_none() {
            self.state.errors.push("a target is required".into());
        }
        if battle
            .entity(self.source)
            .is_none_or(|e| e.item_count(item) == 0)
        {
            self.state.errors.push(format!("no {item} in inventory"));
        }
        if let Ok(details) = session.catalog.load_item(item) {
            if !details.consumable || details.healing.is_none() {
                self.state.errors.push(format!("{item} cannot be used"));
            }
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
        session: &Session<'_>,
        battle: &mut dyn Battle,
    ) -> Result<Resolution, ActionError> {
        let item = self
            .item
            .clone()
            .ok_or(ActionError::MissingParameter("item"))?;
        let target = self.target.ok_or(ActionError::MissingParameter("target"))?;
        let details = session.catalog.load_item(&item)?;

        let Some(healing_expr) = details.healing else {
            return Err(ActionError::Catalog(
                crate::error::CatalogError::MalformedEntry {
                    name: item,
                    reason: "usable item has no healing dice".into(),
                },
            ));
        };
        let healing = Roller::new(&healing_expr)
            .description("healing potion")
            .roll(battle.dice());

        let items = vec![ResolvedItem::Heal {
            source: self.source,
            target,
            healing,
            cost: HealCost::Consumable { item },
            economy: ActionResource::Action,
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
