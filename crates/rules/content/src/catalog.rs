//! RON-backed catalog.
//!
//! Data files deserialize into spec structs (human-friendly strings), which
//! convert into the core's catalog types. Conversion failures carry enough
//! context to point at the offending entry. The built-in SRD-flavored
//! subset ships embedded; hosts can also load their own files.

use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use serde::Deserialize;

use rules_core::{
    ActionResource, Catalog, CatalogError, CastingTime, DamageType, ItemDetails, SpellDetails,
    WeaponDetails, WeaponKind, WeaponProperties,
};

const WEAPONS_RON: &str = include_str!("../data/weapons.ron");
const SPELLS_RON: &str = include_str!("../data/spells.ron");
const ITEMS_RON: &str = include_str!("../data/items.ron");

/// On-disk weapon entry.
#[derive(Debug, Deserialize)]
struct WeaponSpec {
    name: String,
    kind: String,
    damage: String,
    #[serde(default)]
    damage_2: Option<String>,
    damage_type: String,
    range: u32,
    #[serde(default)]
    range_max: Option<u32>,
    #[serde(default)]
    thrown_range: Option<(u32, u32)>,
    #[serde(default)]
    properties: Vec<String>,
    #[serde(default)]
    ammo: Option<String>,
}

impl WeaponSpec {
    fn into_details(self) -> anyhow::Result<WeaponDetails> {
        let mut properties = WeaponProperties::empty();
        for prop in &self.properties {
            let flag = match prop.as_str() {
                "light" => WeaponProperties::LIGHT,
                "heavy" => WeaponProperties::HEAVY,
                "finesse" => WeaponProperties::FINESSE,
                "two_handed" => WeaponProperties::TWO_HANDED,
                "versatile" => WeaponProperties::VERSATILE,
                "thrown" => WeaponProperties::THROWN,
                "reach" => WeaponProperties::REACH,
                "ammunition" => WeaponProperties::AMMUNITION,
                "unarmed" => WeaponProperties::UNARMED,
                other => return Err(anyhow!("unknown weapon property '{other}'")),
            };
            properties |= flag;
        }

        Ok(WeaponDetails {
            kind: WeaponKind::from_str(&self.kind)
                .with_context(|| format!("weapon '{}' has bad kind '{}'", self.name, self.kind))?,
            damage_type: DamageType::from_str(&self.damage_type).with_context(|| {
                format!(
                    "weapon '{}' has bad damage type '{}'",
                    self.name, self.damage_type
                )
            })?,
            name: self.name,
            damage: self.damage,
            damage_2: self.damage_2,
            range: self.range,
            range_max: self.range_max,
            thrown_range: self.thrown_range,
            properties,
            ammo: self.ammo,
        })
    }
}

/// On-disk spell entry.
#[derive(Debug, Deserialize)]
struct SpellSpec {
    name: String,
    level: u8,
    casting_time: String,
    range: u32,
    #[serde(default)]
    damage_type: Option<String>,
    #[serde(default)]
    spell_list_classes: Vec<String>,
    #[serde(default)]
    range_cone: Option<u32>,
    #[serde(default)]
    concentration: bool,
}

impl SpellSpec {
    fn into_details(self) -> anyhow::Result<SpellDetails> {
        let (amount, resource) = self
            .casting_time
            .split_once(':')
            .with_context(|| format!("spell '{}': casting_time must be amount:resource", self.name))?;
        let casting_time = CastingTime {
            amount: amount
                .parse()
                .with_context(|| format!("spell '{}': bad casting amount", self.name))?,
            resource: ActionResource::from_str(resource)
                .with_context(|| format!("spell '{}': bad casting resource", self.name))?,
        };
        let damage_type = self
            .damage_type
            .as_deref()
            .map(DamageType::from_str)
            .transpose()
            .with_context(|| format!("spell '{}': bad damage type", self.name))?;

        Ok(SpellDetails {
            name: self.name,
            level: self.level,
            casting_time,
            range: self.range,
            damage_type,
            spell_list_classes: self.spell_list_classes,
            range_cone: self.range_cone,
            concentration: self.concentration,
        })
    }
}

/// On-disk item entry.
#[derive(Debug, Deserialize)]
struct ItemSpec {
    name: String,
    #[serde(default)]
    consumable: bool,
    #[serde(default)]
    healing: Option<String>,
}

impl From<ItemSpec> for ItemDetails {
    fn from(spec: ItemSpec) -> Self {
        Self {
            name: spec.name,
            consumable: spec.consumable,
            healing: spec.healing,
        }
    }
}

/// Catalog over parsed RON data, indexed by name.
pub struct RonCatalog {
    weapons: HashMap<String, WeaponDetails>,
    spells: HashMap<String, SpellDetails>,
    items: HashMap<String, ItemDetails>,
}

impl RonCatalog {
    /// Parse catalogs from RON strings.
    pub fn from_ron(weapons: &str, spells: &str, items: &str) -> anyhow::Result<Self> {
        let weapon_specs: Vec<WeaponSpec> =
            ron::from_str(weapons).context("parsing weapon catalog")?;
        let spell_specs: Vec<SpellSpec> = ron::from_str(spells).context("parsing spell catalog")?;
        let item_specs: Vec<ItemSpec> = ron::from_str(items).context("parsing item catalog")?;

        let mut catalog = Self {
            weapons: HashMap::new(),
            spells: HashMap::new(),
            items: HashMap::new(),
        };
        for spec in weapon_specs {
            let details = spec.into_details()?;
            catalog.weapons.insert(details.name.clone(), details);
        }
        for spec in spell_specs {
            let details = spec.into_details()?;
            catalog.spells.insert(details.name.clone(), details);
        }
        for spec in item_specs {
            let details: ItemDetails = spec.into();
            catalog.items.insert(details.name.clone(), details);
        }
        Ok(catalog)
    }

    /// The embedded SRD-flavored subset.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_ron(WEAPONS_RON, SPELLS_RON, ITEMS_RON)
    }
}

impl Catalog for RonCatalog {
    fn load_spell(&self, name: &str) -> Result<SpellDetails, CatalogError> {
        self.spells
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownSpell(name.to_owned()))
    }

    fn load_weapon(&self, name: &str) -> Result<WeaponDetails, CatalogError> {
        self.weapons
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownWeapon(name.to_owned()))
    }

    fn load_item(&self, name: &str) -> Result<ItemDetails, CatalogError> {
        self.items
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownItem(name.to_owned()))
    }

    fn spell_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.spells.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_parses() {
        let catalog = RonCatalog::builtin().expect("embedded data must parse");

        let longsword = catalog.load_weapon("longsword").unwrap();
        assert_eq!(longsword.kind, WeaponKind::MeleeAttack);
        assert_eq!(longsword.damage, "1d8");
        assert_eq!(longsword.damage_2.as_deref(), Some("1d10"));
        assert!(longsword.properties.contains(WeaponProperties::VERSATILE));

        let shield = catalog.load_spell("shield").unwrap();
        assert_eq!(shield.level, 1);
        assert_eq!(shield.casting_time.resource, ActionResource::Reaction);

        let bless = catalog.load_spell("bless").unwrap();
        assert!(bless.concentration);

        let potion = catalog.load_item("healing_potion").unwrap();
        assert_eq!(potion.healing.as_deref(), Some("2d4+2"));
    }

    #[test]
    fn unknown_names_are_fatal() {
        let catalog = RonCatalog::builtin().unwrap();
        assert!(matches!(
            catalog.load_spell("mystic_blast"),
            Err(CatalogError::UnknownSpell(_))
        ));
        assert!(matches!(
            catalog.load_weapon("chair_leg"),
            Err(CatalogError::UnknownWeapon(_))
        ));
    }

    #[test]
    fn bad_casting_time_is_rejected() {
        let spells = r#"[(name: "broken", level: 1, casting_time: "whenever", range: 5)]"#;
        let result = RonCatalog::from_ron("[]", spells, "[]");
        assert!(result.is_err());
    }
}
