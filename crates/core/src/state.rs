use slotmap::SlotMap;

use crate::ai::astar::PathTuning;
use crate::ai::monster::MonsterState;
use crate::ai::{fov, los, monster};
use crate::content::{Breed, ContentPack};
use crate::types::*;

/// The tile grid plus the hero's visibility knowledge of it.
/// Visibility flags are from the hero's point of view; monsters compute their
/// own sight lines per query instead of caching a field of view.
#[derive(Clone)]
pub struct Stage {
    pub width: usize,
    pub height: usize,
    tiles: Vec<TileKind>,
    visible: Vec<bool>,
    explored: Vec<bool>,
}

impl Stage {
    /// A stage with a floor interior and a one-tile wall border.
    pub fn new(width: usize, height: usize) -> Self {
        let mut tiles = vec![TileKind::Floor; width * height];
        for x in 0..width {
            tiles[x] = TileKind::Wall;
            tiles[(height - 1) * width + x] = TileKind::Wall;
        }
        for y in 0..height {
            tiles[y * width] = TileKind::Wall;
            tiles[y * width + (width - 1)] = TileKind::Wall;
        }
        Self {
            width,
            height,
            tiles,
            visible: vec![false; width * height],
            explored: vec![false; width * height],
        }
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    /// Out-of-bounds reads as solid wall so callers never need a bounds check first.
    pub fn tile_at(&self, pos: Pos) -> TileKind {
        if !self.in_bounds(pos) {
            return TileKind::Wall;
        }
        self.tiles[self.index(pos)]
    }

    pub fn set_tile(&mut self, pos: Pos, tile: TileKind) {
        if !self.in_bounds(pos) {
            return;
        }
        let idx = self.index(pos);
        self.tiles[idx] = tile;
    }

    pub fn is_passable(&self, pos: Pos) -> bool {
        self.tile_at(pos).is_passable()
    }

    pub fn is_transparent(&self, pos: Pos) -> bool {
        self.tile_at(pos).is_transparent()
    }

    pub fn is_traversable(&self, pos: Pos) -> bool {
        self.tile_at(pos).is_traversable()
    }

    /// Resolves a door-opening step chosen by pathfinding. Returns false when
    /// the tile is not something that opens.
    pub fn open_door(&mut self, pos: Pos) -> bool {
        match self.tile_at(pos).opens_to() {
            Some(open) => {
                self.set_tile(pos, open);
                true
            }
            None => false,
        }
    }

    pub fn is_visible(&self, pos: Pos) -> bool {
        self.in_bounds(pos) && self.visible[self.index(pos)]
    }

    pub fn is_explored(&self, pos: Pos) -> bool {
        self.in_bounds(pos) && self.explored[self.index(pos)]
    }

    pub fn set_visible(&mut self, pos: Pos, visible: bool) {
        if !self.in_bounds(pos) {
            return;
        }
        let idx = self.index(pos);
        self.visible[idx] = visible;
        if visible {
            self.explored[idx] = true;
        }
    }

    pub(crate) fn clear_visible(&mut self) {
        self.visible.fill(false);
    }

    /// Marks a tile visible and returns whether it was explored for the first time.
    pub(crate) fn mark_visible(&mut self, pos: Pos) -> bool {
        if !self.in_bounds(pos) {
            return false;
        }
        let idx = self.index(pos);
        self.visible[idx] = true;
        let newly = !self.explored[idx];
        self.explored[idx] = true;
        newly
    }

    fn index(&self, pos: Pos) -> usize {
        (pos.y as usize) * self.width + (pos.x as usize)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Hero {
    pub pos: Pos,
    /// Loudness of the hero's most recent action, reported by the host each
    /// turn. Drives the sleeping monsters' hearing check.
    pub last_noise: u32,
}

impl Hero {
    pub fn new(pos: Pos) -> Self {
        Self { pos, last_noise: 0 }
    }

    pub fn make_noise(&mut self, amount: u32) {
        self.last_noise = amount;
    }
}

#[derive(Clone, Debug)]
pub struct Monster {
    pub id: EntityId,
    pub breed: BreedId,
    pub pos: Pos,
    pub hp: i32,
    /// Mood, 0-100. Mutated by the host (damage, allies dying); persists
    /// across state transitions.
    pub fear: i32,
    pub state: MonsterState,
    /// Turns until each breed move is usable again, parallel to `Breed::moves`.
    pub recharges: Vec<u32>,
    /// Spawn-lineage counter: each successful spawn in the lineage raises it,
    /// throttling runaway breeding.
    pub generation: u32,
    pub haste: u32,
    pub dazzle: u32,
    /// Whether the last awake decision favored keeping distance. Teleport's
    /// usability check reads this.
    pub(crate) prefers_ranged: bool,
}

impl Monster {
    pub fn is_asleep(&self) -> bool {
        matches!(self.state, MonsterState::Asleep { .. })
    }

    pub fn is_afraid(&self) -> bool {
        matches!(self.state, MonsterState::Afraid)
    }

    pub fn can_occupy(&self, stage: &Stage, pos: Pos) -> bool {
        stage.is_passable(pos)
    }

    pub fn frighten(&mut self, amount: i32) {
        self.fear = (self.fear + amount).clamp(0, 100);
    }

    pub fn become_afraid(&mut self) {
        self.state = MonsterState::Afraid;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Occupant {
    Hero,
    Monster(EntityId),
}

pub struct World {
    pub stage: Stage,
    pub hero: Hero,
    pub monsters: SlotMap<EntityId, Monster>,
    pub breeds: Vec<Breed>,
    pub log: Vec<LogEvent>,
    pub path_tuning: PathTuning,
}

impl World {
    pub fn new(stage: Stage, hero: Hero, content: ContentPack) -> Self {
        Self {
            stage,
            hero,
            monsters: SlotMap::with_key(),
            breeds: content.breeds,
            log: Vec::new(),
            path_tuning: PathTuning::default(),
        }
    }

    /// New monsters start asleep: out-of-sight spawns should not beeline for
    /// the hero until something rouses them.
    pub fn spawn_monster(&mut self, breed: BreedId, pos: Pos) -> EntityId {
        let stats = &self.breeds[breed];
        let monster = Monster {
            id: EntityId::default(),
            breed,
            pos,
            hp: stats.max_hp,
            fear: 0,
            state: MonsterState::asleep(),
            recharges: vec![0; stats.moves.len()],
            generation: 1,
            haste: 0,
            dazzle: 0,
            prefers_ranged: false,
        };
        let id = self.monsters.insert(monster);
        self.monsters[id].id = id;
        id
    }

    pub fn breed_of(&self, monster: &Monster) -> &Breed {
        &self.breeds[monster.breed]
    }

    pub fn monster_at(&self, pos: Pos) -> Option<EntityId> {
        self.monsters.iter().find(|(_, m)| m.pos == pos).map(|(id, _)| id)
    }

    pub fn actor_at(&self, pos: Pos) -> Option<Occupant> {
        if self.hero.pos == pos {
            return Some(Occupant::Hero);
        }
        self.monster_at(pos).map(Occupant::Monster)
    }

    /// Whether an unobstructed sight line connects two cells. Endpoints do not
    /// block themselves; only intermediate opaque tiles do.
    pub fn can_view(&self, from: Pos, to: Pos) -> bool {
        let cells = los::line(from, to);
        let interior = &cells[1..cells.len().saturating_sub(1).max(1)];
        interior.iter().all(|pos| self.stage.is_transparent(*pos))
    }

    /// Recomputes the hero's field of view and returns how many tiles were
    /// explored for the first time.
    pub fn refresh_hero_fov(&mut self, max_distance: u32) -> u32 {
        fov::refresh(&mut self.stage, self.hero.pos, max_distance)
    }

    /// Defend hook: a monster that takes a hit wakes unconditionally.
    pub fn wake_monster(&mut self, id: EntityId) {
        monster::wake(self, id, WakeReason::Hit);
    }

    /// Digest of all decision-relevant state, for replay verification.
    pub fn snapshot_hash(&self) -> u64 {
        use std::hash::Hasher;
        use xxhash_rust::xxh3::Xxh3;

        let mut hasher = Xxh3::new();
        hasher.write_i32(self.hero.pos.y);
        hasher.write_i32(self.hero.pos.x);
        hasher.write_u32(self.hero.last_noise);
        for (_, monster) in &self.monsters {
            hasher.write_i32(monster.pos.y);
            hasher.write_i32(monster.pos.x);
            hasher.write_i32(monster.hp);
            hasher.write_i32(monster.fear);
            let (tag, counter) = match monster.state {
                MonsterState::Asleep { turns_slept } => (0u8, turns_slept),
                MonsterState::Awake { boredom_countdown } => (1, boredom_countdown),
                MonsterState::Afraid => (2, 0),
            };
            hasher.write_u8(tag);
            hasher.write_u32(counter);
            hasher.write_u32(monster.generation);
            hasher.write_u32(monster.haste);
            hasher.write_u32(monster.dazzle);
            for recharge in &monster.recharges {
                hasher.write_u32(*recharge);
            }
        }
        hasher.finish()
    }
}
