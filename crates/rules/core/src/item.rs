//! Resolved items: the only channel from `resolve()` to `apply()`.
//!
//! Resolution never mutates the world; it emits a list of tagged
//! [`ResolvedItem`]s describing the mutations it intends. The apply registry
//! (`action::apply`) routes each item to exactly one handler keyed by
//! [`ItemKind`]. An item is applied exactly once; an item whose kind has no
//! registered handler is logged and dropped.

use crate::dice::DieRoll;
use crate::types::{
    ActionResource, AdvantageTags, Ability, DamageType, EntityId, Position,
};

/// A saving throw made against a DC, with its outcome derivable.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SaveOutcome {
    pub ability: Ability,
    pub roll: DieRoll,
    /// Roll result after `saving_throw_override` effects.
    pub total: i64,
    pub dc: i64,
}

impl SaveOutcome {
    /// True when the save meets or beats the DC.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.total >= self.dc
    }
}

/// Shared bookkeeping for weapon attack outcomes (hit or miss).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackRecord {
    pub source: EntityId,
    pub target: EntityId,
    /// Display name of the attack used.
    pub attack_name: String,
    /// Catalog key of the weapon, when one was used.
    pub weapon: Option<String>,
    /// The d20 roll; `None` for force-hit attacks.
    pub attack_roll: Option<DieRoll>,
    /// Extra dice added to the attack total (bless and similar).
    pub bonus_rolls: Vec<DieRoll>,
    pub advantage: AdvantageTags,
    pub target_ac: i64,
    pub cover_ac: i64,
    /// Which economy resource the attack consumes on apply.
    pub economy: ActionResource,
    pub thrown: bool,
    pub second_hand: bool,
    /// Ammunition item deducted on apply, when the weapon uses any.
    pub ammo: Option<String>,
}

impl AttackRecord {
    /// Attack total: d20 result plus every bonus die.
    #[must_use]
    pub fn attack_total(&self) -> i64 {
        let base = self.attack_roll.as_ref().map_or(0, DieRoll::result);
        base + self.bonus_rolls.iter().map(DieRoll::result).sum::<i64>()
    }
}

/// Shared bookkeeping for spell outcomes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellRecord {
    pub source: EntityId,
    pub target: EntityId,
    /// Catalog key of the spell.
    pub spell: String,
    /// Spell attack roll for attack-roll spells; `None` for save spells.
    pub attack_roll: Option<DieRoll>,
    /// Saving throw for save spells; `None` for attack-roll spells.
    pub save: Option<SaveOutcome>,
    pub advantage: AdvantageTags,
    pub cover_ac: i64,
    /// Slot level the cast consumes; `0` for cantrips.
    pub at_level: u8,
    pub economy: ActionResource,
}

/// How a heal was paid for, so apply can consume the right resource.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HealCost {
    /// Leveled spell slot.
    SpellSlot { level: u8 },
    /// A consumable deducted from inventory.
    Consumable { item: String },
    /// A class feature charge (second wind and similar).
    FeatureCharge,
}

/// Tagged outcome of action resolution.
///
/// The [`ItemKind`] discriminant is the apply-registry key.
#[derive(Clone, Debug, PartialEq, strum::EnumDiscriminants)]
#[strum_discriminants(name(ItemKind))]
#[strum_discriminants(derive(Hash, strum::Display, strum::AsRefStr))]
#[strum_discriminants(strum(serialize_all = "snake_case"))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResolvedItem {
    /// A weapon attack connected: damage the target.
    Damage {
        attack: AttackRecord,
        damage: DieRoll,
        sneak_attack: Option<DieRoll>,
        damage_type: DamageType,
    },

    /// A weapon attack missed: still consumes resources and ammunition.
    Miss { attack: AttackRecord },

    /// A spell dealt damage (attack hit or save failed).
    SpellDamage {
        spell: SpellRecord,
        damage: DieRoll,
        damage_type: DamageType,
    },

    /// A spell failed to land (attack missed or save succeeded).
    SpellMiss { spell: SpellRecord },

    /// Shield reaction: +5 AC on the caster until their next turn starts.
    Shield { source: EntityId },

    /// Bless concentration effect on up to three allies.
    Bless {
        source: EntityId,
        targets: Vec<EntityId>,
        at_level: u8,
    },

    /// Hit points restored to a target.
    Heal {
        source: EntityId,
        target: EntityId,
        healing: DieRoll,
        cost: HealCost,
        economy: ActionResource,
    },

    /// Pool-limited lay-on-hands healing.
    LayOnHands {
        source: EntityId,
        target: EntityId,
        amount: i64,
    },

    /// The entity weaves until its next turn; attackers roll at
    /// disadvantage.
    Dodge { source: EntityId },

    /// Movement no longer provokes opportunity attacks this turn.
    Disengage { source: EntityId },

    /// Grant an ally advantage against a target.
    Help { source: EntityId, target: EntityId },

    /// Budget-checked displacement along a path.
    Move {
        source: EntityId,
        path: Vec<Position>,
    },
}

impl ResolvedItem {
    /// Discriminant used as the apply-registry key.
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        ItemKind::from(self)
    }

    /// Entity that produced this item.
    #[must_use]
    pub fn source(&self) -> EntityId {
        match self {
            ResolvedItem::Damage { attack, .. } | ResolvedItem::Miss { attack } => attack.source,
            ResolvedItem::SpellDamage { spell, .. } | ResolvedItem::SpellMiss { spell } => {
                spell.source
            }
            ResolvedItem::Shield { source }
            | ResolvedItem::Bless { source, .. }
            | ResolvedItem::Heal { source, .. }
            | ResolvedItem::LayOnHands { source, .. }
            | ResolvedItem::Dodge { source }
            | ResolvedItem::Disengage { source }
            | ResolvedItem::Help { source, .. }
            | ResolvedItem::Move { source, .. } => *source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::{DiceState, Roller};

    #[test]
    fn kind_discriminants_render_snake_case() {
        let item = ResolvedItem::Dodge {
            source: EntityId(1),
        };
        assert_eq!(item.kind().to_string(), "dodge");
        assert_eq!(item.kind(), ItemKind::Dodge);
    }

    #[test]
    fn save_outcome_compares_against_dc() {
        let mut dice = DiceState::from_seed(0);
        dice.fudge(12, 20);
        let roll = Roller::new("1d20+2").roll(&mut dice);
        let total = roll.result();
        let save = SaveOutcome {
            ability: Ability::Dexterity,
            roll,
            total,
            dc: 14,
        };
        assert!(save.succeeded());

        let mut dice = DiceState::from_seed(0);
        dice.fudge(5, 20);
        let roll = Roller::new("1d20+2").roll(&mut dice);
        let total = roll.result();
        let failed = SaveOutcome {
            ability: Ability::Dexterity,
            roll,
            total,
            dc: 14,
        };
        assert!(!failed.succeeded());
    }

    #[test]
    fn attack_total_includes_bonus_dice() {
        let mut dice = DiceState::from_seed(0);
        dice.fudge(10, 20);
        let d20 = Roller::new("1d20+4").roll(&mut dice);
        dice.fudge(3, 4);
        let bless = Roller::new("1d4").roll(&mut dice);

        let record = AttackRecord {
            source: EntityId(1),
            target: EntityId(2),
            attack_name: "longsword".into(),
            weapon: Some("longsword".into()),
            attack_roll: Some(d20),
            bonus_rolls: vec![bless],
            advantage: AdvantageTags::new(),
            target_ac: 15,
            cover_ac: 0,
            economy: ActionResource::Action,
            thrown: false,
            second_hand: false,
            ammo: None,
        };
        assert_eq!(record.attack_total(), 14 + 3);
    }
}
