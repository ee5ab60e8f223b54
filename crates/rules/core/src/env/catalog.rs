//! Declarative catalog contract: spells, weapons, items.
//!
//! The catalog is data authored outside the engine; the loading mechanism
//! (files, databases, embedded assets) is a host concern. Lookups by
//! unknown name are fatal data defects, not recoverable conditions.

use crate::error::CatalogError;
use crate::types::{ActionResource, DamageType};

bitflags::bitflags! {
    /// Weapon properties the combat rules test for.
    ///
    /// Serialization comes from the `bitflags/serde` feature rather than a
    /// derive, so the flags render as their names.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct WeaponProperties: u16 {
        const LIGHT      = 1 << 0;
        const HEAVY      = 1 << 1;
        const FINESSE    = 1 << 2;
        const TWO_HANDED = 1 << 3;
        const VERSATILE  = 1 << 4;
        const THROWN     = 1 << 5;
        const REACH      = 1 << 6;
        const AMMUNITION = 1 << 7;
        const UNARMED    = 1 << 8;
    }
}

/// Whether a weapon attacks in melee or at range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum WeaponKind {
    MeleeAttack,
    RangedAttack,
}

/// Declarative weapon entry.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeaponDetails {
    pub name: String,
    pub kind: WeaponKind,
    /// One-handed damage dice, e.g. `1d8`.
    pub damage: String,
    /// Two-handed damage dice for versatile weapons.
    pub damage_2: Option<String>,
    pub damage_type: DamageType,
    /// Normal range in feet.
    pub range: u32,
    /// Long range in feet; attacks past `range` roll at disadvantage up to
    /// this limit.
    pub range_max: Option<u32>,
    /// Normal/long range in feet when thrown.
    pub thrown_range: Option<(u32, u32)>,
    pub properties: WeaponProperties,
    /// Catalog key of the ammunition this weapon consumes.
    pub ammo: Option<String>,
}

impl WeaponDetails {
    /// Longest distance this weapon can reach at all, in feet.
    #[must_use]
    pub fn max_range(&self, thrown: bool) -> u32 {
        if thrown {
            self.thrown_range.map_or(self.range, |(_, max)| max)
        } else {
            self.range_max.unwrap_or(self.range)
        }
    }
}

/// Casting time split into an amount of an economy resource, the
/// `amount:resource` form catalog data uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastingTime {
    pub amount: u8,
    pub resource: ActionResource,
}

/// Declarative spell entry.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellDetails {
    pub name: String,
    /// Slot level; `0` for cantrips.
    pub level: u8,
    pub casting_time: CastingTime,
    /// Range in feet; `0` means self.
    pub range: u32,
    pub damage_type: Option<DamageType>,
    /// Classes whose spell lists include this spell.
    pub spell_list_classes: Vec<String>,
    /// Cone length in feet for cone-shaped spells.
    pub range_cone: Option<u32>,
    /// Whether the caster must sustain the spell with concentration.
    pub concentration: bool,
}

/// Declarative item entry (consumables).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemDetails {
    pub name: String,
    pub consumable: bool,
    /// Healing dice granted on use, e.g. `2d4+2`.
    pub healing: Option<String>,
}

/// Catalog lookup contract.
///
/// Every method is total over known names and fails with a
/// [`CatalogError`] otherwise; an unknown name indicates a data/config
/// defect and is never silently defaulted.
pub trait Catalog {
    fn load_spell(&self, name: &str) -> Result<SpellDetails, CatalogError>;

    fn load_weapon(&self, name: &str) -> Result<WeaponDetails, CatalogError>;

    fn load_item(&self, name: &str) -> Result<ItemDetails, CatalogError>;

    /// Names of every spell in the catalog, for spell-selection parameter
    /// steps.
    fn spell_names(&self) -> Vec<String>;
}
