//! Cover geometry and effective armor class.

use crate::env::{Battle, BattleMap, Entity};
use crate::types::{CoverType, EntityId};

/// Armor class bonus the target gains from cover against this attacker.
///
/// Enumerates occupied square pairs of source × target and settles on the
/// **first** pair with a valid line of sight: the maximum cover degree along
/// that line (melee-adjacent squares excluded; point-blank obstacles give
/// no cover) and of any hideable object at the target square. Remaining
/// pairs are not searched for better cover; this early return is preserved
/// behavior, flagged for a product decision.
#[must_use]
pub fn cover_bonus(map: &dyn BattleMap, source: EntityId, target: EntityId) -> i64 {
    let source_squares = map.entity_squares(source);
    let target_squares = map.entity_squares(target);
    let melee_squares = map.melee_squares(source);

    for &source_pos in &source_squares {
        for &target_pos in &target_squares {
            let Some(segments) = map.line_of_sight(source_pos, target_pos) else {
                continue;
            };

            let mut max_ac = 0;

            for object in map.objects_at(target_pos) {
                if object.can_hide() {
                    max_ac = max_ac.max(object.cover_ac());
                }
            }

            for (cover, pos) in segments {
                if cover == CoverType::None {
                    continue;
                }
                if melee_squares.contains(&pos) {
                    continue;
                }
                max_ac = max_ac.max(i64::from(cover.ac_bonus()));
            }

            return max_ac;
        }
    }

    0
}

/// Target's armor class as seen by this attacker: effect-adjusted AC plus
/// the cover bonus. Returns `(effective_ac, cover_ac)`.
#[must_use]
pub fn effective_ac(battle: &dyn Battle, source: EntityId, target: EntityId) -> (i64, i64) {
    let now = battle.game_time();
    let base = battle
        .entity(target)
        .map_or(10, |t| t.armor_class(now));

    match battle.map_for(source) {
        Some(map) => {
            let cover = cover_bonus(map, source, target);
            (base + cover, cover)
        }
        None => (base, 0),
    }
}
