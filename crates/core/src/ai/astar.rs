//! Goal-directed A* search with a hard per-turn expansion budget.
//! This module exists so chase decisions cost bounded work each turn.
//! It does not own flee logic or the monster's choice of goal.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::state::World;
use crate::types::{Direction, Pos};

/// Step costs and the expansion cap. Empirically tuned; kept configurable
/// rather than baked in as literals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathTuning {
    /// Cost of stepping onto open floor.
    pub floor_cost: u32,
    /// Cost of routing through a closed door the agent cannot open. Finite:
    /// another actor may open it before the path is walked.
    pub door_cost: u32,
    /// Cost of routing through a cell another actor currently occupies.
    /// Finite: the occupant may move before the path is walked.
    pub occupied_cost: u32,
    /// Heuristic cost of a straight step, slightly under `floor_cost` so
    /// straight-looking paths beat equal-length zig-zags.
    pub straight_cost: u32,
    /// Node pops allowed before the search gives up. Bounds worst-case work
    /// at the price of occasionally missing a long path that exists.
    pub expansion_budget: u32,
}

impl Default for PathTuning {
    fn default() -> Self {
        Self {
            floor_cost: 10,
            door_cost: 80,
            occupied_cost: 60,
            straight_cost: 9,
            expansion_budget: 50,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathResult {
    pub direction: Direction,
    pub length: u32,
}

impl PathResult {
    pub const NONE: PathResult = PathResult { direction: Direction::None, length: 0 };

    pub fn found(&self) -> bool {
        self.direction != Direction::None
    }
}

struct PathNode {
    pos: Pos,
    parent: Option<usize>,
    /// Direction taken from the parent to reach this node.
    direction: Direction,
    cost: u32,
    /// cost + heuristic; the open list is ordered on this.
    guess: u32,
    length: u32,
}

/// Searches for a path from `start` to `end`, giving up once the accumulated
/// cost would exceed a path of `max_length` floor steps. Returns the first
/// step to take and the path length, or `PathResult::NONE` when no acceptable
/// path was found within the expansion budget.
pub fn find_path(
    world: &World,
    start: Pos,
    end: Pos,
    max_length: u32,
    can_open_doors: bool,
) -> PathResult {
    find_path_with(&world.path_tuning, world, start, end, max_length, can_open_doors)
}

pub fn find_path_with(
    tuning: &PathTuning,
    world: &World,
    start: Pos,
    end: Pos,
    max_length: u32,
    can_open_doors: bool,
) -> PathResult {
    let mut nodes: Vec<PathNode> = vec![PathNode {
        pos: start,
        parent: None,
        direction: Direction::None,
        cost: 0,
        guess: heuristic(tuning, start, end),
        length: 0,
    }];
    // Sorted by guess descending; the best candidate is popped from the end.
    // Ties keep insertion order, so results are deterministic.
    let mut open: Vec<usize> = vec![0];
    let mut closed: BTreeSet<Pos> = BTreeSet::new();
    let mut pops = 0u32;

    while let Some(index) = open.pop() {
        let pos = nodes[index].pos;
        if pos == end {
            return backtrack(&nodes, index);
        }
        // Past the cost ceiling the path is "close enough": commit to its
        // first step instead of searching further.
        if nodes[index].cost > tuning.floor_cost * max_length {
            return backtrack(&nodes, index);
        }
        if !closed.insert(pos) {
            continue;
        }
        pops += 1;
        if pops > tuning.expansion_budget {
            return PathResult::NONE;
        }

        for direction in Direction::ALL {
            let neighbor = direction.apply(pos);
            if closed.contains(&neighbor) {
                continue;
            }
            let Some(step) = step_cost(tuning, world, neighbor, end, can_open_doors) else {
                continue;
            };
            let cost = nodes[index].cost + step;
            let guess = cost + heuristic(tuning, neighbor, end);
            let length = nodes[index].length + 1;
            nodes.push(PathNode { pos: neighbor, parent: Some(index), direction, cost, guess, length });
            let node = nodes.len() - 1;
            let at = open.partition_point(|&other| nodes[other].guess > guess);
            open.insert(at, node);
        }
    }

    PathResult::NONE
}

/// Octile estimate: diagonal steps at floor cost, remaining straight steps at
/// the slightly cheaper straight cost.
fn heuristic(tuning: &PathTuning, from: Pos, to: Pos) -> u32 {
    let dy = from.y.abs_diff(to.y);
    let dx = from.x.abs_diff(to.x);
    let diagonal = dy.min(dx);
    let straight = dy.max(dx) - diagonal;
    diagonal * tuning.floor_cost + straight * tuning.straight_cost
}

/// Cost of entering `pos`, or None when the tile can never be entered.
fn step_cost(
    tuning: &PathTuning,
    world: &World,
    pos: Pos,
    end: Pos,
    can_open_doors: bool,
) -> Option<u32> {
    let tile = world.stage.tile_at(pos);
    if tile.is_passable() {
        if pos != end && world.actor_at(pos).is_some() {
            return Some(tuning.occupied_cost);
        }
        return Some(tuning.floor_cost);
    }
    if tile.opens_to().is_some() {
        // Open-and-enter when this agent can work the door; otherwise transit
        // is merely discouraged, since someone else may open it first.
        return Some(if can_open_doors { tuning.floor_cost * 2 } else { tuning.door_cost });
    }
    None
}

fn backtrack(nodes: &[PathNode], index: usize) -> PathResult {
    let length = nodes[index].length;
    let mut current = index;
    let mut direction = Direction::None;
    while let Some(parent) = nodes[current].parent {
        direction = nodes[current].direction;
        current = parent;
    }
    PathResult { direction, length }
}
