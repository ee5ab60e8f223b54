//! Battle scheduler contract.
//!
//! The battle is the single game-state object of the resource model: it
//! owns the entities, the per-turn action economy, the dice state, and the
//! clock. Turn ordering and budget replenishment happen on the host side;
//! the engine only consumes resources and asks questions.

use crate::dice::{DiceState, RollEntry, Roller};
use crate::types::{ActionResource, EntityId, GameTime};

use super::controller::Controller;
use super::entity::Entity;
use super::map::BattleMap;

/// Per-entity, per-turn state tracked by the battle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityState {
    /// Remaining actions this turn.
    pub action: u8,
    /// Remaining bonus actions this turn.
    pub bonus_action: u8,
    /// Remaining reactions this round.
    pub reaction: u8,
    /// Remaining movement in feet.
    pub movement: u32,
    /// Weaving until the next turn: attackers roll at disadvantage.
    pub dodge: bool,
    /// Movement does not provoke opportunity attacks this turn.
    pub disengage: bool,
    /// Entities that used Help to aid attacks against this entity's next
    /// target, or to aid attacks against this entity.
    pub helped_by: Vec<EntityId>,
    /// First-hand light weapon used this turn, enabling an off-hand attack.
    pub two_weapon: Option<String>,
}

impl EntityState {
    /// Fresh budget at the start of a turn.
    #[must_use]
    pub fn fresh_turn(movement: u32) -> Self {
        Self {
            action: 1,
            bonus_action: 1,
            reaction: 1,
            movement,
            dodge: false,
            disengage: false,
            helped_by: Vec::new(),
            two_weapon: None,
        }
    }

    /// Remaining budget for a resource.
    #[must_use]
    pub fn remaining(&self, resource: ActionResource) -> u8 {
        match resource {
            ActionResource::Action => self.action,
            ActionResource::BonusAction => self.bonus_action,
            ActionResource::Reaction => self.reaction,
        }
    }

    /// Spend one unit of a resource, saturating at zero.
    pub fn spend(&mut self, resource: ActionResource) {
        let slot = match resource {
            ActionResource::Action => &mut self.action,
            ActionResource::BonusAction => &mut self.bonus_action,
            ActionResource::Reaction => &mut self.reaction,
        };
        *slot = slot.saturating_sub(1);
    }
}

/// The turn-order/resource-budget scheduler contract.
pub trait Battle {
    // ------------------------------------------------------------------
    // Ownership
    // ------------------------------------------------------------------

    /// Entity lookup. Entities are exclusively owned by the battle.
    fn entity(&self, id: EntityId) -> Option<&dyn Entity>;

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut dyn Entity>;

    /// Session-scoped dice state used for every roll in this battle.
    fn dice(&mut self) -> &mut DiceState;

    /// Current simulation clock.
    fn game_time(&self) -> GameTime;

    // ------------------------------------------------------------------
    // Dice
    // ------------------------------------------------------------------

    /// Roll dice on an entity's behalf, recording them in this battle's
    /// history. Returns the per-die entries for the host's audit trail.
    fn roll_for(
        &mut self,
        _entity: EntityId,
        sides: u32,
        count: u32,
        description: &str,
        advantage: bool,
        disadvantage: bool,
    ) -> Vec<RollEntry> {
        let roll = Roller::new(&format!("{count}d{sides}"))
            .advantage(advantage)
            .disadvantage(disadvantage)
            .description(description)
            .roll(self.dice());
        roll.entries().to_vec()
    }

    /// Roll a saving throw for an entity: d20 + save modifier, then
    /// `saving_throw_override` effects transform the total. Returns the
    /// roll and the final total, or `None` for an unknown entity.
    fn save_throw_for(
        &mut self,
        entity: EntityId,
        ability: crate::types::Ability,
    ) -> Option<(crate::dice::DieRoll, i64)> {
        let now = self.game_time();
        let modifier = {
            let e = self.entity(entity)?;
            let mut modifier = e.ability_modifier(ability);
            if e.proficient_in_save(ability) {
                modifier += e.proficiency_bonus();
            }
            modifier
        };
        let roll = Roller::d20(modifier)
            .description(format!("save.{ability}"))
            .roll(self.dice());
        let total = self
            .entity(entity)?
            .effects()
            .saving_throw_override(entity, ability, roll.result(), now);
        Some((roll, total))
    }

    /// Displace an entity to a new square. Geometry storage is host-owned,
    /// so the battle mediates the mutation.
    fn move_entity(&mut self, entity: EntityId, to: crate::types::Position);

    // ------------------------------------------------------------------
    // Action economy
    // ------------------------------------------------------------------

    /// Battle-tracked per-turn state for an entity, when it participates.
    fn entity_state_for(&self, entity: EntityId) -> Option<&EntityState>;

    fn entity_state_mut(&mut self, entity: EntityId) -> Option<&mut EntityState>;

    /// Spend one unit of an economy resource.
    fn consume(&mut self, entity: EntityId, resource: ActionResource) {
        if let Some(state) = self.entity_state_mut(entity) {
            state.spend(resource);
        }
    }

    /// Remaining budget for a resource; zero when the entity is not
    /// tracked.
    fn resource_remaining(&self, entity: EntityId, resource: ActionResource) -> u8 {
        self.entity_state_for(entity)
            .map_or(0, |s| s.remaining(resource))
    }

    // ------------------------------------------------------------------
    // Turn order and control
    // ------------------------------------------------------------------

    /// Entity whose turn it currently is.
    fn current_turn(&self) -> Option<EntityId>;

    /// Controller for an entity; `None` degrades reaction opportunities to
    /// "no reaction taken".
    fn controller_for(&self, entity: EntityId) -> Option<&dyn Controller>;

    /// Map the entity is placed on, when geometry is in play.
    fn map_for(&self, entity: EntityId) -> Option<&dyn BattleMap>;

    // ------------------------------------------------------------------
    // Relationship queries used by the advantage predicates
    // ------------------------------------------------------------------

    /// True when the two entities are in opposing groups.
    fn opposing(&self, a: EntityId, b: EntityId) -> bool;

    /// Entities in the same group as `entity`, excluding itself.
    fn allies_of(&self, entity: EntityId) -> Vec<EntityId>;

    /// True when someone is helping attacks against `target`.
    fn help_with(&self, target: EntityId) -> bool;

    /// Clear help flags once an aided attack lands.
    fn dismiss_help_for(&mut self, target: EntityId);

    /// True when an enemy of `entity` (other than those excluded) is
    /// within melee reach of it.
    fn enemy_in_melee_range(&self, entity: EntityId, exclude: &[EntityId]) -> bool;

    /// True when an ally of `source` is within melee reach of `target`
    /// (pack tactics).
    fn ally_within_enemy_melee_range(&self, source: EntityId, target: EntityId) -> bool;

    /// Sight between entities, accounting for lighting and invisibility.
    fn can_see(&self, from: EntityId, to: EntityId) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_state_spends_and_saturates() {
        let mut state = EntityState::fresh_turn(30);
        assert_eq!(state.remaining(ActionResource::Action), 1);

        state.spend(ActionResource::Action);
        assert_eq!(state.remaining(ActionResource::Action), 0);

        state.spend(ActionResource::Action);
        assert_eq!(state.remaining(ActionResource::Action), 0);

        assert_eq!(state.remaining(ActionResource::Reaction), 1);
    }
}
