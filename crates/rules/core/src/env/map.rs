//! Map geometry contract.
//!
//! Geometry storage, pathing, and line-of-sight math belong to the host;
//! the engine only asks questions. Distances are in feet (one grid square
//! is 5 ft); positions are grid squares.

use crate::types::{CoverType, EntityId, Position};

/// An object occupying a square that can grant cover.
pub trait CoverObject {
    /// True when a creature can hide behind this object; such objects also
    /// contribute their [`Self::cover_ac`] to attacks through their square.
    fn can_hide(&self) -> bool;

    /// Armor class bonus this object grants as cover.
    fn cover_ac(&self) -> i64;
}

/// Read-only geometry queries over one battle map.
pub trait BattleMap {
    /// Square an entity currently occupies (its anchor square).
    fn position_of(&self, entity: EntityId) -> Option<Position>;

    /// Distance between two entities in feet.
    fn distance(&self, a: EntityId, b: EntityId) -> u32;

    /// Cover characteristics along the sight line between two squares.
    ///
    /// `None` when no line of sight exists at all; otherwise each element
    /// is the cover degree contributed at one intervening square.
    fn line_of_sight(&self, from: Position, to: Position) -> Option<Vec<(CoverType, Position)>>;

    /// Entities whose distance from `entity` is at most `feet`.
    fn entities_in_range(&self, entity: EntityId, feet: u32) -> Vec<EntityId>;

    /// True when `entity` can see the given square.
    fn can_see_square(&self, entity: EntityId, pos: Position) -> bool;

    /// Squares inside a cone from `origin` toward `target`.
    fn squares_in_cone(&self, origin: Position, target: Position, range_feet: u32)
    -> Vec<Position>;

    /// All squares occupied by an entity (large creatures span several).
    fn entity_squares(&self, entity: EntityId) -> Vec<Position>;

    /// Squares adjacent to an entity's occupied squares (its melee reach).
    fn melee_squares(&self, entity: EntityId) -> Vec<Position>;

    /// Cover-capable objects at a square.
    fn objects_at(&self, pos: Position) -> Vec<&dyn CoverObject>;
}
