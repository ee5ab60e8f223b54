//! Named extension points effects can register against.

/// Hook kinds, each with a fixed evaluation combinator.
///
/// - `*Override` hooks: every registered handler is consulted in
///   registration order and the **last** returned value wins.
/// - `*Bonus`/`*Modifier` hooks: contributions are **summed** (numeric) or
///   **unioned** (advantage tag lists).
/// - Turn/rest hooks: handlers fire in registration order and may request
///   their own removal.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum HookKind {
    /// Replace the entity's armor class outright. Last override wins.
    AcOverride,
    /// Add to the entity's armor class. Contributions sum.
    AcBonus,
    /// Replace the entity's movement speed. Last override wins.
    SpeedOverride,
    /// Replace the entity's resistance list. Last override wins.
    ResistanceOverride,
    /// Advantage/disadvantage tags granted when this entity is targeted.
    /// Tag lists union.
    TargetedAdvantageOverride,
    /// Advantage/disadvantage tags granted when this entity attacks.
    /// Tag lists union.
    AttackAdvantageModifier,
    /// Transform the entity's saving throw total. Last override wins.
    SavingThrowOverride,
    /// Replace the entity's hit point maximum. Last override wins.
    HitPointMaxOverride,
    /// Fires when the entity's turn starts.
    StartOfTurn,
    /// Fires when the entity's turn ends.
    EndOfTurn,
    /// Fires on the attacker's effects after an attack roll against someone
    /// else is made. Responses merge (items concatenate, any force-miss
    /// wins).
    AfterAttackRoll,
    /// Fires on the target's effects after an attack roll against it is
    /// made. Responses merge.
    AfterAttackRollTarget,
    /// Rest boundary: fires on all active effects at a short rest.
    ShortRest,
    /// Rest boundary: fires on all active effects at a long rest.
    LongRest,
}
