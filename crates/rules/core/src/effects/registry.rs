//! Per-entity effect registry.

use std::sync::Arc;

use tracing::debug;

use super::effect::{
    AttackRollInfo, Effect, EffectId, EffectLifecycle, ReactionResponse,
};
use super::hook::HookKind;
use crate::types::{Ability, AdvantageTags, DamageType, EntityId, GameTime};

/// Non-owning reference from a caster to an effect it attached elsewhere.
///
/// Used for concentration breaking and mass dismissal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastedRef {
    pub effect: EffectId,
    pub target: EntityId,
}

#[derive(Clone, Debug)]
struct ActiveEffect {
    id: EffectId,
    effect: Arc<dyn Effect>,
    /// Entity that attached this effect, when it was not self-applied.
    source: Option<EntityId>,
    /// Lazy expiry: the effect is absent from any query at or past this
    /// time.
    expires_at: Option<GameTime>,
}

/// Ordered hook registration: one effect listed under one hook kind.
#[derive(Clone, Copy, Debug)]
struct HookEntry {
    kind: HookKind,
    effect: EffectId,
}

/// Active-hooks table, active-effects set, casted-effects list and
/// concentration slot for a single entity.
///
/// All query methods take the current [`GameTime`] so expired effects are
/// treated as absent without any background sweeping.
#[derive(Clone, Debug, Default)]
pub struct EffectRegistry {
    active: Vec<ActiveEffect>,
    hooks: Vec<HookEntry>,
    casted: Vec<CastedRef>,
    concentration: Option<EffectId>,
}

impl EffectRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Attach an effect without hook registrations yet.
    pub fn attach(
        &mut self,
        effect: Arc<dyn Effect>,
        source: Option<EntityId>,
        expires_at: Option<GameTime>,
    ) -> EffectId {
        let id = EffectId::fresh();
        self.attach_as(id, effect, source, expires_at);
        id
    }

    /// Attach an effect under a caller-chosen identifier.
    ///
    /// One cast that buffs several entities attaches the same id to each
    /// target, so the caster's concentration slot and casted references
    /// name the whole cast at once.
    pub fn attach_as(
        &mut self,
        id: EffectId,
        effect: Arc<dyn Effect>,
        source: Option<EntityId>,
        expires_at: Option<GameTime>,
    ) {
        debug!(effect = effect.name(), %id, "effect attached");
        self.active.push(ActiveEffect {
            id,
            effect,
            source,
            expires_at,
        });
    }

    /// Register an already-attached effect under a hook kind.
    ///
    /// Appending is idempotent in the sense that repeated registrations are
    /// simply kept in order and all fire.
    pub fn register_hook(&mut self, kind: HookKind, effect: EffectId) {
        self.hooks.push(HookEntry { kind, effect });
    }

    /// Attach an effect and register it under `kind` in one step.
    pub fn register_effect(
        &mut self,
        kind: HookKind,
        effect: Arc<dyn Effect>,
        source: Option<EntityId>,
        expires_at: Option<GameTime>,
    ) -> EffectId {
        let id = self.attach(effect, source, expires_at);
        self.register_hook(kind, id);
        id
    }

    /// Record that this entity attached `effect` onto `target`.
    pub fn add_casted(&mut self, effect: EffectId, target: EntityId) {
        self.casted.push(CastedRef { effect, target });
    }

    /// Non-owning references to effects this entity has cast elsewhere.
    #[must_use]
    pub fn casted_refs(&self) -> &[CastedRef] {
        &self.casted
    }

    /// Remove and return every casted reference for `effect`.
    pub fn take_casted(&mut self, effect: EffectId) -> Vec<CastedRef> {
        let (taken, kept) = self
            .casted
            .iter()
            .copied()
            .partition(|r| r.effect == effect);
        self.casted = kept;
        taken
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Remove an effect from the active set, its hook registrations, and
    /// any casted references. Idempotent.
    pub fn dismiss(&mut self, effect: EffectId) {
        self.active.retain(|e| e.id != effect);
        self.hooks.retain(|h| h.effect != effect);
        self.casted.retain(|r| r.effect != effect);
        if self.concentration == Some(effect) {
            self.concentration = None;
        }
    }

    /// Prune effects whose expiry has passed.
    ///
    /// Queries already treat them as absent; this reclaims the storage.
    pub fn tick_expiration(&mut self, now: GameTime) {
        let expired: Vec<EffectId> = self
            .active
            .iter()
            .filter(|e| e.expires_at.is_some_and(|t| t <= now))
            .map(|e| e.id)
            .collect();
        for id in expired {
            self.dismiss(id);
        }
    }

    /// Assign the concentration slot, returning the previously sustained
    /// effect when a different one was held.
    ///
    /// At most one concentration effect is sustained at a time; the caller
    /// dismisses the returned effect wherever it is attached (see
    /// [`Self::take_casted`]).
    pub fn concentration_on(&mut self, effect: EffectId) -> Option<EffectId> {
        let previous = self.concentration.filter(|&prev| prev != effect);
        self.concentration = Some(effect);
        previous
    }

    /// Effect currently sustained by concentration, if any.
    #[must_use]
    pub fn concentration(&self) -> Option<EffectId> {
        self.concentration
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    fn live(&self, now: GameTime) -> impl Iterator<Item = &ActiveEffect> {
        self.active
            .iter()
            .filter(move |e| !e.expires_at.is_some_and(|t| t <= now))
    }

    fn hook_effects(
        &self,
        kind: HookKind,
        now: GameTime,
    ) -> impl Iterator<Item = &ActiveEffect> {
        self.hooks
            .iter()
            .filter(move |h| h.kind == kind)
            .filter_map(move |h| {
                self.live(now).find(|e| e.id == h.effect)
            })
    }

    /// True when a live effect with this name is attached.
    #[must_use]
    pub fn has_effect(&self, name: &str, now: GameTime) -> bool {
        self.live(now).any(|e| e.effect.name() == name)
    }

    /// Identifiers of all live effects, in attachment order.
    #[must_use]
    pub fn active_effects(&self, now: GameTime) -> Vec<EffectId> {
        self.live(now).map(|e| e.id).collect()
    }

    /// Entity that attached `effect`, when recorded.
    #[must_use]
    pub fn source_of(&self, effect: EffectId) -> Option<EntityId> {
        self.active
            .iter()
            .find(|e| e.id == effect)
            .and_then(|e| e.source)
    }

    /// Additive armor class contribution. Combinator: sum.
    #[must_use]
    pub fn ac_bonus(&self, owner: EntityId, now: GameTime) -> i64 {
        self.hook_effects(HookKind::AcBonus, now)
            .map(|e| e.effect.ac_bonus(owner))
            .sum()
    }

    /// Armor class replacement. Combinator: last override wins.
    #[must_use]
    pub fn ac_override(&self, owner: EntityId, now: GameTime) -> Option<i64> {
        self.hook_effects(HookKind::AcOverride, now)
            .filter_map(|e| e.effect.ac_override(owner))
            .last()
    }

    /// Speed replacement. Combinator: last override wins.
    #[must_use]
    pub fn speed_override(&self, owner: EntityId, base: u32, now: GameTime) -> Option<u32> {
        self.hook_effects(HookKind::SpeedOverride, now)
            .filter_map(|e| e.effect.speed_override(owner, base))
            .last()
    }

    /// Resistance list replacement. Combinator: last override wins.
    #[must_use]
    pub fn resistance_override(
        &self,
        owner: EntityId,
        now: GameTime,
    ) -> Option<Vec<DamageType>> {
        self.hook_effects(HookKind::ResistanceOverride, now)
            .filter_map(|e| e.effect.resistance_override(owner))
            .last()
    }

    /// Saving throw transform applied to `roll`. Combinator: last override
    /// wins; every handler sees the original roll.
    #[must_use]
    pub fn saving_throw_override(
        &self,
        owner: EntityId,
        ability: Ability,
        roll: i64,
        now: GameTime,
    ) -> i64 {
        self.hook_effects(HookKind::SavingThrowOverride, now)
            .filter_map(|e| e.effect.saving_throw_override(owner, ability, roll))
            .last()
            .unwrap_or(roll)
    }

    /// Hit point maximum replacement. Combinator: last override wins.
    #[must_use]
    pub fn hit_point_max_override(&self, owner: EntityId, base: i64, now: GameTime) -> i64 {
        self.hook_effects(HookKind::HitPointMaxOverride, now)
            .filter_map(|e| e.effect.hit_point_max_override(owner, base))
            .last()
            .unwrap_or(base)
    }

    /// Advantage tags for the owner's own attacks. Combinator: union.
    #[must_use]
    pub fn attack_advantage(
        &self,
        owner: EntityId,
        target: EntityId,
        now: GameTime,
    ) -> AdvantageTags {
        let mut tags = AdvantageTags::new();
        for e in self.hook_effects(HookKind::AttackAdvantageModifier, now) {
            tags.extend(e.effect.attack_advantage(owner, target));
        }
        tags
    }

    /// Advantage tags for attacks made against the owner. Combinator: union.
    #[must_use]
    pub fn targeted_advantage(
        &self,
        owner: EntityId,
        attacker: EntityId,
        now: GameTime,
    ) -> AdvantageTags {
        let mut tags = AdvantageTags::new();
        for e in self.hook_effects(HookKind::TargetedAdvantageOverride, now) {
            tags.extend(e.effect.targeted_advantage(owner, attacker));
        }
        tags
    }

    /// Consult attack-roll listeners of the given kind. Responses merge.
    #[must_use]
    pub fn after_attack_roll(
        &self,
        kind: HookKind,
        owner: EntityId,
        info: &AttackRollInfo,
        now: GameTime,
    ) -> ReactionResponse {
        let mut merged = ReactionResponse::default();
        for e in self.hook_effects(kind, now) {
            merged.merge(e.effect.after_attack_roll(owner, info));
        }
        merged
    }

    /// Fire a turn or rest boundary hook on every registered handler, in
    /// registration order. Handlers may self-remove by returning
    /// [`EffectLifecycle::Dismiss`].
    pub fn fire_lifecycle(&mut self, kind: HookKind, owner: EntityId, now: GameTime) {
        let handlers: Vec<(EffectId, Arc<dyn Effect>)> = self
            .hook_effects(kind, now)
            .map(|e| (e.id, Arc::clone(&e.effect)))
            .collect();

        for (id, effect) in handlers {
            let outcome = match kind {
                HookKind::StartOfTurn => effect.start_of_turn(owner, now),
                HookKind::EndOfTurn => effect.end_of_turn(owner, now),
                HookKind::ShortRest => effect.short_rest(owner, now),
                HookKind::LongRest => effect.long_rest(owner, now),
                _ => EffectLifecycle::Retain,
            };
            if outcome == EffectLifecycle::Dismiss {
                debug!(effect = effect.name(), %id, hook = %kind, "effect self-dismissed");
                self.dismiss(id);
            }
        }
    }

    /// Fire a rest boundary on **all** live effects regardless of hook
    /// registrations, per the rest-boundary contract.
    pub fn fire_rest(&mut self, kind: HookKind, owner: EntityId, now: GameTime) {
        debug_assert!(matches!(kind, HookKind::ShortRest | HookKind::LongRest));
        let handlers: Vec<(EffectId, Arc<dyn Effect>)> = self
            .live(now)
            .map(|e| (e.id, Arc::clone(&e.effect)))
            .collect();

        for (id, effect) in handlers {
            let outcome = match kind {
                HookKind::ShortRest => effect.short_rest(owner, now),
                HookKind::LongRest => effect.long_rest(owner, now),
                _ => EffectLifecycle::Retain,
            };
            if outcome == EffectLifecycle::Dismiss {
                self.dismiss(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: EntityId = EntityId(1);
    const NOW: GameTime = GameTime(0);

    #[derive(Debug)]
    struct FlatAcBonus(i64);

    impl Effect for FlatAcBonus {
        fn name(&self) -> &str {
            "flat_ac_bonus"
        }

        fn ac_bonus(&self, _owner: EntityId) -> i64 {
            self.0
        }
    }

    #[derive(Debug)]
    struct AcReplace(i64);

    impl Effect for AcReplace {
        fn name(&self) -> &str {
            "ac_replace"
        }

        fn ac_override(&self, _owner: EntityId) -> Option<i64> {
            Some(self.0)
        }
    }

    #[derive(Debug)]
    struct FadesAtDawn;

    impl Effect for FadesAtDawn {
        fn name(&self) -> &str {
            "fades_at_dawn"
        }

        fn long_rest(&self, _owner: EntityId, _time: GameTime) -> EffectLifecycle {
            EffectLifecycle::Dismiss
        }
    }

    #[test]
    fn bonus_hooks_sum_contributions() {
        let mut reg = EffectRegistry::new();
        reg.register_effect(HookKind::AcBonus, Arc::new(FlatAcBonus(2)), None, None);
        reg.register_effect(HookKind::AcBonus, Arc::new(FlatAcBonus(1)), None, None);
        assert_eq!(reg.ac_bonus(OWNER, NOW), 3);
    }

    #[test]
    fn override_hooks_last_wins() {
        let mut reg = EffectRegistry::new();
        reg.register_effect(HookKind::AcOverride, Arc::new(AcReplace(13)), None, None);
        reg.register_effect(HookKind::AcOverride, Arc::new(AcReplace(17)), None, None);
        assert_eq!(reg.ac_override(OWNER, NOW), Some(17));
    }

    #[test]
    fn expired_effects_are_absent_from_queries() {
        let mut reg = EffectRegistry::new();
        reg.register_effect(
            HookKind::AcBonus,
            Arc::new(FlatAcBonus(5)),
            None,
            Some(GameTime(60)),
        );
        assert_eq!(reg.ac_bonus(OWNER, GameTime(59)), 5);
        // Expiry is inclusive and lazy: no sweep has run, the query alone
        // treats the effect as absent.
        assert_eq!(reg.ac_bonus(OWNER, GameTime(60)), 0);
        assert!(reg.has_effect("flat_ac_bonus", GameTime(59)));
        assert!(!reg.has_effect("flat_ac_bonus", GameTime(61)));
    }

    #[test]
    fn tick_expiration_prunes_storage() {
        let mut reg = EffectRegistry::new();
        let id = reg.register_effect(
            HookKind::AcBonus,
            Arc::new(FlatAcBonus(5)),
            None,
            Some(GameTime(10)),
        );
        reg.tick_expiration(GameTime(10));
        assert!(reg.active_effects(GameTime(0)).is_empty());
        // Dismissing again is a no-op.
        reg.dismiss(id);
    }

    #[test]
    fn dismiss_is_idempotent_and_clears_hooks() {
        let mut reg = EffectRegistry::new();
        let id = reg.register_effect(HookKind::AcBonus, Arc::new(FlatAcBonus(2)), None, None);
        reg.dismiss(id);
        reg.dismiss(id);
        assert_eq!(reg.ac_bonus(OWNER, NOW), 0);
        assert!(!reg.has_effect("flat_ac_bonus", NOW));
    }

    #[test]
    fn concentration_holds_at_most_one() {
        let mut reg = EffectRegistry::new();
        let first = EffectId::fresh();
        let second = EffectId::fresh();

        assert_eq!(reg.concentration_on(first), None);
        // Re-asserting the same effect is not a break.
        assert_eq!(reg.concentration_on(first), None);
        assert_eq!(reg.concentration_on(second), Some(first));
        assert_eq!(reg.concentration(), Some(second));
    }

    #[test]
    fn casted_refs_track_and_drain() {
        let mut reg = EffectRegistry::new();
        let id = EffectId::fresh();
        reg.add_casted(id, EntityId(7));
        reg.add_casted(id, EntityId(8));

        let taken = reg.take_casted(id);
        assert_eq!(taken.len(), 2);
        assert!(reg.casted_refs().is_empty());
        assert!(reg.take_casted(id).is_empty());
    }

    #[test]
    fn rest_boundary_fires_on_all_live_effects() {
        let mut reg = EffectRegistry::new();
        // No hook registration: rest boundaries reach every live effect.
        reg.attach(Arc::new(FadesAtDawn), None, None);
        reg.attach(Arc::new(FlatAcBonus(1)), None, None);

        reg.fire_rest(HookKind::LongRest, OWNER, NOW);
        assert!(!reg.has_effect("fades_at_dawn", NOW));
        assert!(reg.has_effect("flat_ac_bonus", NOW));
    }

    #[test]
    fn saving_throw_override_transforms_roll() {
        #[derive(Debug)]
        struct Guarded;

        impl Effect for Guarded {
            fn name(&self) -> &str {
                "guarded"
            }

            fn saving_throw_override(
                &self,
                _owner: EntityId,
                _ability: Ability,
                roll: i64,
            ) -> Option<i64> {
                Some(roll + 1)
            }
        }

        let mut reg = EffectRegistry::new();
        reg.register_effect(HookKind::SavingThrowOverride, Arc::new(Guarded), None, None);
        assert_eq!(
            reg.saving_throw_override(OWNER, Ability::Wisdom, 11, NOW),
            12
        );
    }
}
