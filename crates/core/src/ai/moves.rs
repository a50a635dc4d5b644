//! The breed move catalog: usability checks, activation, and the two
//! multi-turn effects. Activation applies a move's own side effects (position,
//! hp, mood, new monsters) before handing the action to the host; damage and
//! walking stay with the host.

use std::collections::BTreeSet;
use std::f64::consts::PI;

use rand_chacha::rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::ai::monster::{self, POINT_BLANK_DISTANCE};
use crate::ai::{dice, flow::Flow, los};
use crate::state::World;
use crate::types::{Action, Direction, Element, EntityId, LogEvent, Pos, WakeReason};

const TAUNTS: [&str; 4] = [
    "jeers at you",
    "mocks your footwork",
    "laughs at your armor",
    "taunts you cruelly",
];

/// How many candidate destinations a teleport samples before settling.
const TELEPORT_TRIES: u32 = 10;

/// One entry in a breed's move list. `rate` is the recharge in turns after a
/// use; ranges are in tiles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum MoveDef {
    Bolt { rate: u32, range: u32, element: Element, damage: i32 },
    Cone { rate: u32, range: u32, element: Element, damage: i32 },
    Heal { rate: u32, amount: i32 },
    Teleport { rate: u32, range: u32 },
    Spawn { rate: u32 },
    Howl { rate: u32, range: u32 },
    Haste { rate: u32, turns: u32, boost: u32 },
    Insult { rate: u32 },
}

impl MoveDef {
    pub fn rate(&self) -> u32 {
        match *self {
            MoveDef::Bolt { rate, .. }
            | MoveDef::Cone { rate, .. }
            | MoveDef::Heal { rate, .. }
            | MoveDef::Teleport { rate, .. }
            | MoveDef::Spawn { rate }
            | MoveDef::Howl { rate, .. }
            | MoveDef::Haste { rate, .. }
            | MoveDef::Insult { rate } => rate,
        }
    }

    pub fn range(&self) -> u32 {
        match *self {
            MoveDef::Bolt { range, .. }
            | MoveDef::Cone { range, .. }
            | MoveDef::Teleport { range, .. }
            | MoveDef::Howl { range, .. } => range,
            _ => 0,
        }
    }

    /// Whether this move would accomplish anything right now.
    pub(crate) fn should_use(&self, world: &World, id: EntityId, rng: &mut impl RngCore) -> bool {
        let monster = &world.monsters[id];
        let hero = world.hero.pos;
        match *self {
            MoveDef::Bolt { range, .. } => {
                let d2 = monster.pos.distance_squared(hero);
                d2 <= (range as i64 * range as i64)
                    && d2 > POINT_BLANK_DISTANCE
                    && bolt_target(world, monster.pos, hero, range) == hero
            }
            MoveDef::Cone { range, .. } => {
                monster.pos.distance_squared(hero) <= (range as i64 * range as i64)
                    && world.can_view(monster.pos, hero)
            }
            MoveDef::Heal { amount, .. } => {
                let max_hp = world.breed_of(monster).max_hp;
                monster.hp < max_hp && (max_hp - monster.hp >= amount || monster.hp < max_hp / 4)
            }
            MoveDef::Teleport { .. } => monster.is_afraid() || monster.prefers_ranged,
            MoveDef::Spawn { .. } => {
                world.stage.is_visible(monster.pos)
                    && !open_cells_adjacent(world, monster.pos).is_empty()
                    && dice::one_in(rng, monster.generation.max(1))
            }
            MoveDef::Howl { range, .. } => {
                // Pointless unless it would actually rouse someone.
                dice::one_in(rng, 2) && sleeping_ally_in_earshot(world, monster.pos, range)
            }
            MoveDef::Haste { .. } => monster.haste == 0,
            MoveDef::Insult { .. } => {
                monster.pos.king_distance(hero) > 1 && world.can_view(monster.pos, hero)
            }
        }
    }

    /// Activates the move, applying its immediate side effects to the world.
    pub(crate) fn start(&self, world: &mut World, id: EntityId, rng: &mut impl RngCore) -> Action {
        match *self {
            MoveDef::Bolt { range, element, damage, .. } => {
                let from = world.monsters[id].pos;
                let target = bolt_target(world, from, world.hero.pos, range);
                Action::Bolt { element, damage, target }
            }
            MoveDef::Cone { range, element, damage, .. } => {
                let from = world.monsters[id].pos;
                Action::Cone(ConeEffect::new(from, world.hero.pos, element, damage, range))
            }
            MoveDef::Heal { amount, .. } => {
                let max_hp = world.breed_of(&world.monsters[id]).max_hp;
                let monster = &mut world.monsters[id];
                let healed = amount.min(max_hp - monster.hp);
                monster.hp += healed;
                world.log.push(LogEvent::Healed { monster: id, amount: healed });
                Action::Heal { amount: healed }
            }
            MoveDef::Teleport { range, .. } => {
                let from = world.monsters[id].pos;
                let hero = world.hero.pos;
                let mut best: Option<(i64, Pos)> = None;
                for _ in 0..TELEPORT_TRIES {
                    let dy = dice::offset(rng, range as i32);
                    let dx = dice::offset(rng, range as i32);
                    let candidate = from.step(dy, dx);
                    if candidate == from
                        || !world.stage.is_passable(candidate)
                        || world.actor_at(candidate).is_some()
                    {
                        continue;
                    }
                    let gain = candidate.distance_squared(hero);
                    if best.is_none_or(|(best_gain, _)| gain > best_gain) {
                        best = Some((gain, candidate));
                    }
                }
                match best {
                    Some((_, to)) => {
                        world.monsters[id].pos = to;
                        world.log.push(LogEvent::Teleported { monster: id, from, to });
                        Action::Teleport { to }
                    }
                    None => Action::Rest,
                }
            }
            MoveDef::Spawn { .. } => {
                let parent = &world.monsters[id];
                let breed = parent.breed;
                let pos = parent.pos;
                let generation = parent.generation;
                let cells = open_cells_adjacent(world, pos);
                match dice::pick(rng, &cells) {
                    Some(cell) => {
                        let child = world.spawn_monster(breed, cell);
                        world.monsters[id].generation = generation + 1;
                        world.monsters[child].generation = generation + 1;
                        world.monsters[child].state = monster::MonsterState::awake(rng);
                        world.log.push(LogEvent::Spawned {
                            parent: id,
                            child,
                            generation: generation + 1,
                        });
                        Action::Spawn { child, pos: cell }
                    }
                    None => Action::Rest,
                }
            }
            MoveDef::Howl { range, .. } => {
                let origin = world.monsters[id].pos;
                Action::Howl(HowlEffect::new(id, origin, range))
            }
            MoveDef::Haste { turns, boost, .. } => {
                world.monsters[id].haste = turns;
                Action::Haste { turns, boost }
            }
            MoveDef::Insult { .. } => {
                let taunt = dice::pick(rng, &TAUNTS).unwrap_or(TAUNTS[0]);
                world.log.push(LogEvent::Taunt { monster: id, taunt });
                Action::Insult { taunt }
            }
        }
    }
}

/// Where a bolt fired from `from` toward `to` actually lands: the first actor
/// on the line, or the last clear cell before an opaque tile or max range.
fn bolt_target(world: &World, from: Pos, to: Pos, range: u32) -> Pos {
    let range2 = range as i64 * range as i64;
    let mut target = from;
    for &cell in los::line(from, to).iter().skip(1) {
        if from.distance_squared(cell) > range2 || !world.stage.is_transparent(cell) {
            break;
        }
        target = cell;
        if world.actor_at(cell).is_some() {
            break;
        }
    }
    target
}

fn open_cells_adjacent(world: &World, pos: Pos) -> Vec<Pos> {
    Direction::ALL
        .iter()
        .map(|direction| direction.apply(pos))
        .filter(|&cell| world.stage.is_passable(cell) && world.actor_at(cell).is_none())
        .collect()
}

fn sleeping_ally_in_earshot(world: &World, origin: Pos, range: u32) -> bool {
    let mut flow = Flow::with_radius(world, origin, true, true, range as i32);
    for (_, other) in &world.monsters {
        if other.pos != origin
            && other.is_asleep()
            && flow.get_distance(other.pos).is_some_and(|d| d <= range)
        {
            return true;
        }
    }
    false
}

/// A cone of elemental breath expanding one ring per turn. The host calls
/// `advance` once per turn and applies damage to actors on the returned cells.
#[derive(Clone, Debug)]
pub struct ConeEffect {
    origin: Pos,
    element: Element,
    damage: i32,
    range: u32,
    radius: u32,
    rays: Vec<Ray>,
}

#[derive(Clone, Debug)]
struct Ray {
    angle: f64,
    alive: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConeProgress {
    /// Cells reached by this ring of the expansion, deduplicated.
    Burning { cells: Vec<Pos> },
    Done,
}

impl ConeEffect {
    pub fn new(origin: Pos, toward: Pos, element: Element, damage: i32, range: u32) -> Self {
        let center = ((toward.y - origin.y) as f64).atan2((toward.x - origin.x) as f64);
        let half_arc = PI / 8.0;
        // Enough rays that the outermost ring has no gaps.
        let count = ((range as f64 * 2.0 * PI / 8.0).ceil() as usize * 2).max(3);
        let rays = (0..count)
            .map(|i| {
                let t = i as f64 / (count - 1) as f64;
                Ray { angle: center - half_arc + t * 2.0 * half_arc, alive: true }
            })
            .collect();
        Self { origin, element, damage, range, radius: 0, rays }
    }

    pub fn element(&self) -> Element {
        self.element
    }

    pub fn damage(&self) -> i32 {
        self.damage
    }

    pub fn origin(&self) -> Pos {
        self.origin
    }

    /// Expands the cone by one ring. Rays die where the stage blocks them;
    /// the effect is done when every ray is dead or the range is spent.
    pub fn advance(&mut self, world: &World) -> ConeProgress {
        self.radius += 1;
        if self.radius > self.range {
            return ConeProgress::Done;
        }
        let range2 = self.range as i64 * self.range as i64;
        let mut cells = BTreeSet::new();
        for ray in &mut self.rays {
            if !ray.alive {
                continue;
            }
            let r = self.radius as f64;
            let cell = self.origin.step(
                (r * ray.angle.sin()).round() as i32,
                (r * ray.angle.cos()).round() as i32,
            );
            if !world.stage.in_bounds(cell)
                || !world.stage.is_transparent(cell)
                || self.origin.distance_squared(cell) > range2
            {
                ray.alive = false;
                continue;
            }
            cells.insert(cell);
        }
        if cells.is_empty() {
            return ConeProgress::Done;
        }
        ConeProgress::Burning { cells: cells.into_iter().collect() }
    }
}

/// A howl rolling outward one ring of flow distance per turn, waking sleeping
/// monsters as it reaches them. Walls muffle it: it spreads by connectivity,
/// not by straight-line distance.
#[derive(Clone, Debug)]
pub struct HowlEffect {
    howler: EntityId,
    origin: Pos,
    range: u32,
    radius: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HowlProgress {
    /// Monsters woken by this ring.
    Rolling { woken: Vec<EntityId> },
    Done,
}

impl HowlEffect {
    pub fn new(howler: EntityId, origin: Pos, range: u32) -> Self {
        Self { howler, origin, range, radius: 0 }
    }

    pub fn howler(&self) -> EntityId {
        self.howler
    }

    pub fn advance(&mut self, world: &mut World) -> HowlProgress {
        self.radius += 1;
        if self.radius > self.range {
            return HowlProgress::Done;
        }
        let reached: Vec<EntityId> = {
            let mut flow = Flow::with_radius(world, self.origin, true, true, self.range as i32);
            world
                .monsters
                .iter()
                .filter(|(_, m)| m.is_asleep() && flow.get_distance(m.pos) == Some(self.radius))
                .map(|(id, _)| id)
                .collect()
        };
        let mut woken = Vec::with_capacity(reached.len());
        for id in reached {
            monster::wake(world, id, WakeReason::Howl);
            woken.push(id);
        }
        HowlProgress::Rolling { woken }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::test_support::*;
    use crate::types::{Direction, TileKind};

    #[test]
    fn bolt_wants_a_clear_shot_at_medium_range() {
        let (mut world, id) = world_with_monster(open_stage(12, 12), p(5, 9), drake_breed(), p(5, 3));
        let mut rng = rng(1);
        let bolt = MoveDef::Bolt { rate: 5, range: 8, element: Element::Fire, damage: 8 };
        assert!(bolt.should_use(&world, id, &mut rng));

        // Point blank: melee is the better option.
        world.hero.pos = p(5, 4);
        assert!(!bolt.should_use(&world, id, &mut rng));

        // A wall between them spoils the shot.
        world.hero.pos = p(5, 9);
        world.stage.set_tile(p(5, 6), TileKind::Wall);
        assert!(!bolt.should_use(&world, id, &mut rng));
    }

    #[test]
    fn bolt_stops_at_the_first_actor_on_the_line() {
        let (mut world, _) = world_with_monster(open_stage(12, 12), p(5, 9), drake_breed(), p(5, 3));
        let blocker = world.spawn_monster(0, p(5, 6));
        assert_eq!(bolt_target(&world, p(5, 3), p(5, 9), 8), p(5, 6));
        world.monsters.remove(blocker);
        assert_eq!(bolt_target(&world, p(5, 3), p(5, 9), 8), p(5, 9));
    }

    #[test]
    fn heal_triggers_only_when_hurt_enough() {
        let (mut world, id) = world_with_monster(open_stage(9, 9), p(1, 1), drake_breed(), p(5, 5));
        let mut rng = rng(2);
        let heal = MoveDef::Heal { rate: 8, amount: 8 };
        assert!(!heal.should_use(&world, id, &mut rng), "full hp needs no heal");
        world.monsters[id].hp -= 10;
        assert!(heal.should_use(&world, id, &mut rng));

        let action = heal.start(&mut world, id, &mut rng);
        assert!(matches!(action, Action::Heal { amount: 8 }));
        let max = world.breed_of(&world.monsters[id]).max_hp;
        assert_eq!(world.monsters[id].hp, max - 2);
        assert!(world.log.iter().any(|e| matches!(e, LogEvent::Healed { amount: 8, .. })));
    }

    #[test]
    fn heal_never_overshoots_max_hp() {
        let (mut world, id) = world_with_monster(open_stage(9, 9), p(1, 1), drake_breed(), p(5, 5));
        let mut rng = rng(3);
        world.monsters[id].hp -= 3;
        let heal = MoveDef::Heal { rate: 8, amount: 8 };
        // Missing only 3 hp: usable only once critically low, so force it.
        world.monsters[id].hp = 1;
        assert!(heal.should_use(&world, id, &mut rng));
        heal.start(&mut world, id, &mut rng);
        let max = world.breed_of(&world.monsters[id]).max_hp;
        assert!(world.monsters[id].hp <= max);
    }

    #[test]
    fn teleport_moves_away_from_the_hero() {
        let (mut world, id) = world_with_monster(open_stage(15, 15), p(7, 5), drake_breed(), p(7, 7));
        let mut rng = rng(4);
        world.monsters[id].become_afraid();
        let teleport = MoveDef::Teleport { rate: 6, range: 6 };
        assert!(teleport.should_use(&world, id, &mut rng));
        let before = world.monsters[id].pos.distance_squared(world.hero.pos);
        match teleport.start(&mut world, id, &mut rng) {
            Action::Teleport { to } => {
                assert_eq!(world.monsters[id].pos, to);
                assert!(to.distance_squared(world.hero.pos) >= before);
                assert!(world.log.iter().any(|e| matches!(e, LogEvent::Teleported { .. })));
            }
            other => panic!("expected a teleport, got {other:?}"),
        }
    }

    #[test]
    fn spawn_places_an_awake_child_and_raises_the_generation() {
        let (mut world, id) = world_with_monster(open_stage(9, 9), p(1, 1), drake_breed(), p(5, 5));
        let mut rng = rng(5);
        for y in 0..9 {
            for x in 0..9 {
                world.stage.set_visible(p(y, x), true);
            }
        }
        let spawn = MoveDef::Spawn { rate: 10 };
        match spawn.start(&mut world, id, &mut rng) {
            Action::Spawn { child, pos } => {
                assert_eq!(pos.king_distance(p(5, 5)), 1);
                assert_eq!(world.monsters[child].pos, pos);
                assert!(!world.monsters[child].is_asleep());
                assert_eq!(world.monsters[child].generation, 2);
                assert_eq!(world.monsters[id].generation, 2);
                assert!(world.log.iter().any(|e| matches!(e, LogEvent::Spawned { generation: 2, .. })));
            }
            other => panic!("expected a spawn, got {other:?}"),
        }
    }

    #[test]
    fn haste_is_usable_only_while_not_already_hasted() {
        let (mut world, id) = world_with_monster(open_stage(9, 9), p(1, 1), drake_breed(), p(5, 5));
        let mut rng = rng(6);
        let haste = MoveDef::Haste { rate: 15, turns: 6, boost: 4 };
        assert!(haste.should_use(&world, id, &mut rng));
        let action = haste.start(&mut world, id, &mut rng);
        assert!(matches!(action, Action::Haste { turns: 6, boost: 4 }));
        assert_eq!(world.monsters[id].haste, 6);
        assert!(!haste.should_use(&world, id, &mut rng));
    }

    #[test]
    fn insult_needs_distance_and_a_sight_line() {
        let (mut world, id) = world_with_monster(open_stage(9, 9), p(5, 7), drake_breed(), p(5, 3));
        let mut rng = rng(7);
        let insult = MoveDef::Insult { rate: 4 };
        assert!(insult.should_use(&world, id, &mut rng));
        world.hero.pos = p(5, 4);
        assert!(!insult.should_use(&world, id, &mut rng), "adjacent foes get bitten, not insulted");
        world.hero.pos = p(5, 7);
        world.stage.set_tile(p(5, 5), TileKind::Wall);
        assert!(!insult.should_use(&world, id, &mut rng));
    }

    #[test]
    fn cone_expands_ring_by_ring_and_dies_on_walls() {
        let (world, _) = world_with_monster(open_stage(15, 15), p(7, 13), drake_breed(), p(7, 3));
        let mut cone = ConeEffect::new(p(7, 3), p(7, 13), Element::Fire, 6, 5);
        let mut rings = 0;
        let mut farthest = 0i64;
        while let ConeProgress::Burning { cells } = cone.advance(&world) {
            rings += 1;
            assert!(!cells.is_empty());
            for cell in &cells {
                assert!(cell.x > 3, "the cone points east");
                farthest = farthest.max(p(7, 3).distance_squared(*cell));
            }
            assert!(rings <= 5, "a range-5 cone burns at most five rings");
        }
        assert!(rings >= 4);
        assert!(farthest <= 25);
    }

    #[test]
    fn cone_against_a_wall_finishes_early() {
        let mut stage = open_stage(15, 15);
        for y in 1..14 {
            stage.set_tile(p(y, 5), TileKind::Wall);
        }
        let (world, _) = world_with_monster(stage, p(7, 13), drake_breed(), p(7, 3));
        let mut cone = ConeEffect::new(p(7, 3), p(7, 13), Element::Fire, 6, 5);
        let mut rings = 0;
        while let ConeProgress::Burning { .. } = cone.advance(&world) {
            rings += 1;
            assert!(rings < 3, "all rays hit the wall one cell out");
        }
    }

    #[test]
    fn howl_wakes_sleepers_ring_by_ring_but_not_through_walls() {
        let mut stage = open_stage(13, 13);
        for y in 1..12 {
            stage.set_tile(p(y, 9), TileKind::Wall);
        }
        let (mut world, _howler) = world_with_monster(stage, p(11, 1), drake_breed(), p(6, 2));
        let near = world.spawn_monster(0, p(6, 5));
        let sealed = world.spawn_monster(0, p(6, 11));
        assert!(world.monsters[near].is_asleep());

        let mut howl = HowlEffect::new(_howler, p(6, 2), 6);
        let mut woken = Vec::new();
        loop {
            match howl.advance(&mut world) {
                HowlProgress::Rolling { woken: ring } => woken.extend(ring),
                HowlProgress::Done => break,
            }
        }
        assert!(woken.contains(&near));
        assert!(!woken.contains(&sealed), "walls stop the howl");
        assert!(!world.monsters[near].is_asleep());
        assert!(world.monsters[sealed].is_asleep());
        assert!(world.log.iter().any(|e| matches!(
            e,
            LogEvent::MonsterWoke { reason: WakeReason::Howl, .. }
        )));
    }

    #[test]
    fn howl_usability_needs_a_reachable_sleeper() {
        let (mut world, id) = world_with_monster(open_stage(13, 13), p(11, 11), drake_breed(), p(6, 6));
        let howl = MoveDef::Howl { rate: 12, range: 10 };
        let mut any = false;
        for seed in 0..20 {
            let mut rng = rng(seed);
            if howl.should_use(&world, id, &mut rng) {
                any = true;
            }
        }
        assert!(!any, "no sleeping ally in range means no howl");

        let ally = world.spawn_monster(0, p(6, 9));
        assert!(world.monsters[ally].is_asleep());
        let mut any = false;
        for seed in 0..20 {
            let mut rng = rng(seed);
            if howl.should_use(&world, id, &mut rng) {
                any = true;
            }
        }
        assert!(any, "a sleeping ally within range makes the howl worthwhile");
    }

    #[test]
    fn spawn_skipped_without_an_open_cell() {
        let mut stage = open_stage(9, 9);
        for dir in Direction::ALL {
            stage.set_tile(dir.apply(p(4, 4)), TileKind::Wall);
        }
        let (mut world, id) = world_with_monster(stage, p(1, 1), drake_breed(), p(4, 4));
        world.stage.set_visible(p(4, 4), true);
        let spawn = MoveDef::Spawn { rate: 10 };
        let mut rng = rng(9);
        assert!(!spawn.should_use(&world, id, &mut rng));

        // Forcing the activation anyway wastes the turn without a child.
        let count = world.monsters.len();
        assert!(matches!(spawn.start(&mut world, id, &mut rng), Action::Rest));
        assert_eq!(world.monsters.len(), count);
    }

    #[test]
    fn boxed_in_teleport_falls_back_to_rest() {
        // Seal the stage so every candidate is a wall or the hero's cell.
        let mut stage = open_stage(9, 9);
        for y in 1..8 {
            for x in 1..8 {
                if !(y == 4 && x == 4) && !(y == 1 && x == 1) {
                    stage.set_tile(p(y, x), TileKind::Wall);
                }
            }
        }
        let (mut world, id) = world_with_monster(stage, p(1, 1), drake_breed(), p(4, 4));
        world.monsters[id].become_afraid();
        let teleport = MoveDef::Teleport { rate: 6, range: 6 };
        let mut rng = rng(8);
        assert!(teleport.should_use(&world, id, &mut rng));
        assert!(matches!(teleport.start(&mut world, id, &mut rng), Action::Rest));
        assert_eq!(world.monsters[id].pos, p(4, 4), "a failed teleport goes nowhere");
    }
}
