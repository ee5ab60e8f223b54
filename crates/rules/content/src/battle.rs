//! Reference battle scheduler and grid map.
//!
//! Minimal but honest implementations of the collaborator contracts,
//! enough to run whole combats in integration tests and downstream demos.
//! Turn order is initiative-sorted; geometry is a flat square grid with
//! optional cover blocks.

use std::collections::{BTreeMap, HashMap};

use tracing::info;

use rules_core::{
    Battle, BattleMap, Controller, CoverObject, CoverType, DiceState, Entity, EntityId,
    EntityState, GameTime, HookKind, Position, ReactionDecision, ReactionPrompt, Roller,
};

use crate::combatant::Combatant;

/// A map object granting cover (a crate, a low wall, an arrow slit).
#[derive(Clone, Copy, Debug)]
pub struct CoverBlock {
    pub kind: CoverType,
    pub hideable: bool,
}

impl CoverObject for CoverBlock {
    fn can_hide(&self) -> bool {
        self.hideable
    }

    fn cover_ac(&self) -> i64 {
        i64::from(self.kind.ac_bonus())
    }
}

/// Flat square grid, 5 ft per square, Chebyshev distance.
#[derive(Clone, Debug, Default)]
pub struct GridMap {
    positions: HashMap<EntityId, Position>,
    covers: HashMap<Position, CoverBlock>,
}

impl GridMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(&mut self, entity: EntityId, pos: Position) {
        self.positions.insert(entity, pos);
    }

    pub fn add_cover(&mut self, pos: Position, kind: CoverType, hideable: bool) {
        self.covers.insert(pos, CoverBlock { kind, hideable });
    }

    fn chebyshev(a: Position, b: Position) -> u32 {
        (a.x - b.x).unsigned_abs().max((a.y - b.y).unsigned_abs())
    }

    /// Squares strictly between two endpoints along a stepped line.
    fn between(from: Position, to: Position) -> Vec<Position> {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let steps = dx.abs().max(dy.abs());
        (1..steps)
            .map(|i| {
                let t = f64::from(i) / f64::from(steps);
                Position::new(
                    from.x + (f64::from(dx) * t).round() as i32,
                    from.y + (f64::from(dy) * t).round() as i32,
                )
            })
            .collect()
    }
}

impl BattleMap for GridMap {
    fn position_of(&self, entity: EntityId) -> Option<Position> {
        self.positions.get(&entity).copied()
    }

    fn distance(&self, a: EntityId, b: EntityId) -> u32 {
        match (self.position_of(a), self.position_of(b)) {
            (Some(pa), Some(pb)) => Self::chebyshev(pa, pb) * 5,
            _ => u32::MAX,
        }
    }

    fn line_of_sight(&self, from: Position, to: Position) -> Option<Vec<(CoverType, Position)>> {
        let mut segments = Vec::new();
        for pos in Self::between(from, to) {
            match self.covers.get(&pos) {
                Some(block) if block.kind == CoverType::Total => return None,
                Some(block) => segments.push((block.kind, pos)),
                None => segments.push((CoverType::None, pos)),
            }
        }
        Some(segments)
    }

    fn entities_in_range(&self, entity: EntityId, feet: u32) -> Vec<EntityId> {
        let Some(origin) = self.position_of(entity) else {
            return Vec::new();
        };
        self.positions
            .iter()
            .filter(|&(&id, &pos)| id != entity && Self::chebyshev(origin, pos) * 5 <= feet)
            .map(|(&id, _)| id)
            .collect()
    }

    fn can_see_square(&self, entity: EntityId, pos: Position) -> bool {
        let Some(origin) = self.position_of(entity) else {
            return false;
        };
        self.line_of_sight(origin, pos).is_some()
    }

    fn squares_in_cone(
        &self,
        origin: Position,
        target: Position,
        range_feet: u32,
    ) -> Vec<Position> {
        let dir_x = i64::from(target.x - origin.x);
        let dir_y = i64::from(target.y - origin.y);
        let range_squares = i64::from(range_feet / 5);

        let mut squares = Vec::new();
        for dx in -range_squares..=range_squares {
            for dy in -range_squares..=range_squares {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if dx.abs().max(dy.abs()) > range_squares {
                    continue;
                }
                // Inside the cone when roughly aligned with the aim
                // direction.
                if dx * dir_x + dy * dir_y > 0 {
                    squares.push(Position::new(
                        origin.x + dx as i32,
                        origin.y + dy as i32,
                    ));
                }
            }
        }
        squares
    }

    fn entity_squares(&self, entity: EntityId) -> Vec<Position> {
        self.position_of(entity).into_iter().collect()
    }

    fn melee_squares(&self, entity: EntityId) -> Vec<Position> {
        let Some(origin) = self.position_of(entity) else {
            return Vec::new();
        };
        let mut squares = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                squares.push(Position::new(origin.x + dx, origin.y + dy));
            }
        }
        squares
    }

    fn objects_at(&self, pos: Position) -> Vec<&dyn CoverObject> {
        self.covers
            .get(&pos)
            .map(|block| vec![block as &dyn CoverObject])
            .unwrap_or_default()
    }
}

/// Controller that always defers, driving the suspend/resume protocol.
#[derive(Clone, Copy, Debug)]
pub struct DeferController;

impl Controller for DeferController {
    fn decide_reaction(&self, _prompt: &ReactionPrompt) -> Option<ReactionDecision> {
        None
    }
}

/// Controller with a fixed answer, for AIs and tests.
#[derive(Clone, Copy, Debug)]
pub struct ScriptedController(pub ReactionDecision);

impl Controller for ScriptedController {
    fn decide_reaction(&self, _prompt: &ReactionPrompt) -> Option<ReactionDecision> {
        Some(self.0)
    }
}

/// Reference battle: owns the combatants, their per-turn state, the grid,
/// the clock, and the session dice.
pub struct SimpleBattle {
    entities: BTreeMap<EntityId, Combatant>,
    groups: HashMap<EntityId, String>,
    states: HashMap<EntityId, EntityState>,
    controllers: HashMap<EntityId, Box<dyn Controller>>,
    map: Option<GridMap>,
    dice: DiceState,
    time: GameTime,
    current: Option<EntityId>,
    order: Vec<EntityId>,
}

impl SimpleBattle {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            entities: BTreeMap::new(),
            groups: HashMap::new(),
            states: HashMap::new(),
            controllers: HashMap::new(),
            map: None,
            dice: DiceState::from_seed(seed),
            time: GameTime(0),
            current: None,
            order: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_map(mut self, map: GridMap) -> Self {
        self.map = Some(map);
        self
    }

    /// Add a combatant to a group, optionally placed on the grid.
    pub fn add(&mut self, combatant: Combatant, group: &str, position: Option<Position>) {
        let id = combatant.id();
        let movement = combatant.base_speed();
        self.groups.insert(id, group.to_owned());
        self.states.insert(id, EntityState::fresh_turn(movement));
        self.order.push(id);
        if let (Some(map), Some(pos)) = (self.map.as_mut(), position) {
            map.place(id, pos);
        }
        self.entities.insert(id, combatant);
    }

    pub fn set_controller(&mut self, entity: EntityId, controller: Box<dyn Controller>) {
        self.controllers.insert(entity, controller);
    }

    /// Sort the turn order by initiative: d20 + dexterity modifier.
    pub fn roll_initiative(&mut self) {
        let mut rolled: Vec<(EntityId, i64)> = Vec::new();
        let ids: Vec<EntityId> = self.order.clone();
        for id in ids {
            let dex_mod = self
                .entities
                .get(&id)
                .map_or(0, |e| e.ability_modifier(rules_core::Ability::Dexterity));
            let roll = Roller::d20(dex_mod)
                .description("initiative")
                .roll(&mut self.dice);
            rolled.push((id, roll.result()));
        }
        rolled.sort_by(|a, b| b.1.cmp(&a.1));
        self.order = rolled.into_iter().map(|(id, _)| id).collect();
        info!(order = ?self.order, "initiative rolled");
    }

    /// Begin an entity's turn: refresh its budget and fire start-of-turn
    /// hooks.
    pub fn start_turn(&mut self, entity: EntityId) {
        self.current = Some(entity);
        let now = self.time;
        if let Some(combatant) = self.entities.get_mut(&entity) {
            let movement = combatant.speed(now);
            self.states.insert(entity, EntityState::fresh_turn(movement));
            combatant
                .effects_mut()
                .fire_lifecycle(HookKind::StartOfTurn, entity, now);
        }
    }

    /// End an entity's turn: fire end-of-turn hooks and advance the clock.
    pub fn end_turn(&mut self, entity: EntityId) {
        let now = self.time;
        if let Some(combatant) = self.entities.get_mut(&entity) {
            combatant
                .effects_mut()
                .fire_lifecycle(HookKind::EndOfTurn, entity, now);
        }
        self.time = self.time.advanced_by(GameTime::from_rounds(1));
        self.current = None;
    }

    /// Advance the clock without a turn change.
    pub fn advance_time(&mut self, seconds: u64) {
        self.time = self.time.advanced_by(GameTime(seconds));
    }

    /// Fire a rest boundary on every combatant's effects.
    pub fn rest(&mut self, kind: HookKind) {
        let now = self.time;
        for (&id, combatant) in &mut self.entities {
            combatant.effects_mut().fire_rest(kind, id, now);
        }
    }

    /// Direct access for test assertions.
    #[must_use]
    pub fn combatant(&self, id: EntityId) -> Option<&Combatant> {
        self.entities.get(&id)
    }

    #[must_use]
    pub fn combatant_mut(&mut self, id: EntityId) -> Option<&mut Combatant> {
        self.entities.get_mut(&id)
    }

    #[must_use]
    pub fn turn_order(&self) -> &[EntityId] {
        &self.order
    }
}

impl Battle for SimpleBattle {
    fn entity(&self, id: EntityId) -> Option<&dyn Entity> {
        self.entities.get(&id).map(|c| c as &dyn Entity)
    }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut dyn Entity> {
        self.entities.get_mut(&id).map(|c| c as &mut dyn Entity)
    }

    fn dice(&mut self) -> &mut DiceState {
        &mut self.dice
    }

    fn game_time(&self) -> GameTime {
        self.time
    }

    fn move_entity(&mut self, entity: EntityId, to: Position) {
        if let Some(map) = self.map.as_mut() {
            map.place(entity, to);
        }
    }

    fn entity_state_for(&self, entity: EntityId) -> Option<&EntityState> {
        self.states.get(&entity)
    }

    fn entity_state_mut(&mut self, entity: EntityId) -> Option<&mut EntityState> {
        self.states.get_mut(&entity)
    }

    fn current_turn(&self) -> Option<EntityId> {
        self.current
    }

    fn controller_for(&self, entity: EntityId) -> Option<&dyn Controller> {
        self.controllers.get(&entity).map(Box::as_ref)
    }

    fn map_for(&self, _entity: EntityId) -> Option<&dyn BattleMap> {
        self.map.as_ref().map(|m| m as &dyn BattleMap)
    }

    fn opposing(&self, a: EntityId, b: EntityId) -> bool {
        match (self.groups.get(&a), self.groups.get(&b)) {
            (Some(ga), Some(gb)) => ga != gb,
            _ => false,
        }
    }

    fn allies_of(&self, entity: EntityId) -> Vec<EntityId> {
        let Some(group) = self.groups.get(&entity) else {
            return Vec::new();
        };
        self.groups
            .iter()
            .filter(|&(&id, g)| id != entity && g == group)
            .map(|(&id, _)| id)
            .collect()
    }

    fn help_with(&self, target: EntityId) -> bool {
        self.states
            .get(&target)
            .is_some_and(|s| !s.helped_by.is_empty())
    }

    fn dismiss_help_for(&mut self, target: EntityId) {
        if let Some(state) = self.states.get_mut(&target) {
            state.helped_by.clear();
        }
    }

    fn enemy_in_melee_range(&self, entity: EntityId, exclude: &[EntityId]) -> bool {
        let Some(map) = self.map.as_ref() else {
            return false;
        };
        self.entities.keys().any(|&other| {
            other != entity
                && !exclude.contains(&other)
                && self.opposing(entity, other)
                && !self.entities[&other].dead()
                && map.distance(entity, other) <= 5
        })
    }

    fn ally_within_enemy_melee_range(&self, source: EntityId, target: EntityId) -> bool {
        let Some(map) = self.map.as_ref() else {
            return false;
        };
        self.allies_of(source)
            .into_iter()
            .any(|ally| !self.entities[&ally].dead() && map.distance(ally, target) <= 5)
    }

    fn can_see(&self, from: EntityId, to: EntityId) -> bool {
        let Some(map) = self.map.as_ref() else {
            return true;
        };
        if self.entities.get(&to).is_some_and(|e| e.stealthy()) {
            return false;
        }
        match map.position_of(to) {
            Some(pos) => map.can_see_square(from, pos),
            None => true,
        }
    }
}
