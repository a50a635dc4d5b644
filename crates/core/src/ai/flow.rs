//! Lazy breadth-first flow field radiating from a single origin.
//! This module exists so "nearest cell matching a predicate" queries stop
//! expanding as soon as an answer is known. It does not own what callers
//! search for.

use std::collections::{BTreeSet, VecDeque};

use rand_chacha::rand_core::RngCore;

use crate::ai::dice;
use crate::state::World;
use crate::types::{Direction, Pos};

const UNKNOWN: i32 = -2;
const UNREACHABLE: i32 = -1;

/// Incremental uniform-cost distance map over the stage, expanded one cell at
/// a time on demand. Borrows the world immutably for its whole life, so
/// callers compute their query first and mutate afterwards.
pub struct Flow<'a> {
    world: &'a World,
    origin: Pos,
    can_open_doors: bool,
    /// When set, other actors do not block expansion. Used for queries about
    /// reachability rather than walkability this turn.
    ignore_actors: bool,
    min: Pos,
    width: i32,
    height: i32,
    distances: Vec<i32>,
    frontier: VecDeque<Pos>,
    /// Every reached cell in discovery order; a cursor into this list drives
    /// the nearest-match queries.
    found: Vec<Pos>,
}

impl<'a> Flow<'a> {
    pub fn new(world: &'a World, origin: Pos, can_open_doors: bool, ignore_actors: bool) -> Self {
        let min = Pos { y: 0, x: 0 };
        let width = world.stage.width as i32;
        let height = world.stage.height as i32;
        Self::with_frame(world, origin, can_open_doors, ignore_actors, min, width, height)
    }

    /// A flow clipped to a square window of `radius` around the origin.
    /// Distances outside the window are reported unreachable.
    pub fn with_radius(
        world: &'a World,
        origin: Pos,
        can_open_doors: bool,
        ignore_actors: bool,
        radius: i32,
    ) -> Self {
        let min = Pos { y: (origin.y - radius).max(0), x: (origin.x - radius).max(0) };
        let max_y = (origin.y + radius + 1).min(world.stage.height as i32);
        let max_x = (origin.x + radius + 1).min(world.stage.width as i32);
        Self::with_frame(world, origin, can_open_doors, ignore_actors, min, max_x - min.x, max_y - min.y)
    }

    fn with_frame(
        world: &'a World,
        origin: Pos,
        can_open_doors: bool,
        ignore_actors: bool,
        min: Pos,
        width: i32,
        height: i32,
    ) -> Self {
        let mut flow = Self {
            world,
            origin,
            can_open_doors,
            ignore_actors,
            min,
            width,
            height,
            distances: vec![UNKNOWN; (width * height).max(0) as usize],
            frontier: VecDeque::new(),
            found: Vec::new(),
        };
        if flow.in_frame(origin) {
            flow.set_distance(origin, 0);
            flow.frontier.push_back(origin);
            flow.found.push(origin);
        }
        flow
    }

    pub fn origin(&self) -> Pos {
        self.origin
    }

    pub fn has_more(&self) -> bool {
        !self.frontier.is_empty()
    }

    /// Expands the frontier by one cell and returns it, or None when the
    /// whole reachable area has been mapped.
    pub fn step(&mut self) -> Option<Pos> {
        let pos = self.frontier.pop_front()?;
        let distance = self.raw_distance(pos);
        for direction in Direction::ALL {
            let neighbor = direction.apply(pos);
            if !self.in_frame(neighbor) || self.raw_distance(neighbor) != UNKNOWN {
                continue;
            }
            if !self.enterable(neighbor) {
                self.set_distance(neighbor, UNREACHABLE);
                continue;
            }
            self.set_distance(neighbor, distance + 1);
            self.frontier.push_back(neighbor);
            self.found.push(neighbor);
        }
        Some(pos)
    }

    /// Distance from the origin to `pos`, expanding as far as needed.
    /// None when `pos` is unreachable or outside the frame.
    pub fn get_distance(&mut self, pos: Pos) -> Option<u32> {
        if !self.in_frame(pos) {
            return None;
        }
        while self.raw_distance(pos) == UNKNOWN && self.has_more() {
            self.step();
        }
        match self.raw_distance(pos) {
            d if d >= 0 => Some(d as u32),
            _ => None,
        }
    }

    /// All cells matching `predicate` tied at the smallest reachable
    /// distance, in discovery order. Empty when nothing matches.
    pub fn find_all_nearest_where(&mut self, mut predicate: impl FnMut(Pos) -> bool) -> Vec<Pos> {
        let mut matches = Vec::new();
        let mut best = UNKNOWN;
        let mut cursor = 0;
        loop {
            while cursor >= self.found.len() {
                if self.step().is_none() {
                    return matches;
                }
            }
            let pos = self.found[cursor];
            cursor += 1;
            let distance = self.raw_distance(pos);
            // Discovery order is distance order, so the first match past the
            // matched ring ends the search.
            if best >= 0 && distance > best {
                return matches;
            }
            if predicate(pos) {
                best = distance;
                matches.push(pos);
            }
        }
    }

    /// One uniformly chosen first step toward the nearest matching cell.
    pub fn direction_to_nearest_where(
        &mut self,
        rng: &mut impl RngCore,
        predicate: impl FnMut(Pos) -> bool,
    ) -> Option<Direction> {
        let targets = self.find_all_nearest_where(predicate);
        let directions = self.directions_to(&targets);
        dice::pick(rng, &directions)
    }

    /// Every first step that begins some shortest path to any of `targets`,
    /// deduplicated and in a fixed order.
    pub fn directions_to(&mut self, targets: &[Pos]) -> Vec<Direction> {
        let mut directions = BTreeSet::new();
        for &target in targets {
            if self.get_distance(target).is_none() {
                continue;
            }
            let mut walk = vec![target];
            let mut seen = BTreeSet::new();
            while let Some(pos) = walk.pop() {
                if !seen.insert(pos) {
                    continue;
                }
                let here = self.raw_distance(pos);
                if here == 1 {
                    directions.insert(Direction::from_delta(pos.y - self.origin.y, pos.x - self.origin.x));
                    continue;
                }
                for direction in Direction::ALL {
                    let neighbor = direction.apply(pos);
                    if !self.in_frame(neighbor) {
                        continue;
                    }
                    let d = self.raw_distance(neighbor);
                    if d >= 0 && d < here {
                        walk.push(neighbor);
                    }
                }
            }
        }
        directions.into_iter().collect()
    }

    fn enterable(&self, pos: Pos) -> bool {
        let tile = self.world.stage.tile_at(pos);
        let walkable = tile.is_passable() || (self.can_open_doors && tile.is_traversable());
        if !walkable {
            return false;
        }
        self.ignore_actors || self.world.actor_at(pos).is_none()
    }

    fn in_frame(&self, pos: Pos) -> bool {
        pos.y >= self.min.y
            && pos.x >= self.min.x
            && pos.y < self.min.y + self.height
            && pos.x < self.min.x + self.width
    }

    fn index(&self, pos: Pos) -> usize {
        ((pos.y - self.min.y) * self.width + (pos.x - self.min.x)) as usize
    }

    fn raw_distance(&self, pos: Pos) -> i32 {
        self.distances[self.index(pos)]
    }

    fn set_distance(&mut self, pos: Pos, distance: i32) {
        let index = self.index(pos);
        self.distances[index] = distance;
    }
}
