//! Damage finalization.

use crate::env::Entity;
use crate::types::{DamageType, GameTime};

/// Resistance/vulnerability-adjusted damage.
///
/// Resistance halves (integer floor), vulnerability doubles. Both never
/// apply together through the same list; when an effect overrides the
/// resistance list, the override decides.
#[must_use]
pub fn adjusted_damage(
    target: &dyn Entity,
    amount: i64,
    damage_type: DamageType,
    now: GameTime,
) -> i64 {
    if target.resistant_to(damage_type, now) {
        amount / 2
    } else if target.vulnerable_to(damage_type) {
        amount * 2
    } else {
        amount
    }
}
