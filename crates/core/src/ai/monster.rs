//! Per-monster decision core: the sleep and wake cycle, move selection, chase
//! and flee steering, and meander noise. One call produces one action; all
//! multi-turn behavior lives in the state the monster carries between calls.

use rand_chacha::rand_core::RngCore;

use crate::ai::flow::Flow;
use crate::ai::{astar, dice};
use crate::state::World;
use crate::types::{Action, AiError, Direction, EntityId, LogEvent, Pos, WakeReason};

const BOREDOM_MIN: u32 = 10;
const BOREDOM_MAX: u32 = 20;
/// Beyond this many king moves a drowsy monster cannot spot the hero.
const WAKE_VIEW_DISTANCE: u32 = 30;
const WAKE_HEAR_DISTANCE: u32 = 20;
/// Upper bound of the hearing roll; larger means sounder sleepers.
const WAKE_NOISE_CHECK: u32 = 500;
/// Squared distance at or under which ranged attacks give way to melee.
pub(crate) const POINT_BLANK_DISTANCE: i64 = 2;
/// A firing position must stand more than this many king moves from the hero.
const RANGED_STANDOFF_DISTANCE: u32 = 2;
const CAUTION_THRESHOLD_ADJACENT: i32 = 60;
const CAUTION_THRESHOLD_APART: i32 = 30;
/// Extra meander percent while dazzled.
const DAZZLE_MEANDER_BONUS: u32 = 50;

/// The whole state is replaced on every transition, so counters belonging to
/// one state cannot leak into another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonsterState {
    Asleep { turns_slept: u32 },
    Awake { boredom_countdown: u32 },
    Afraid,
}

impl MonsterState {
    pub(crate) fn asleep() -> MonsterState {
        MonsterState::Asleep { turns_slept: 0 }
    }

    pub(crate) fn awake(rng: &mut impl RngCore) -> MonsterState {
        MonsterState::Awake {
            boredom_countdown: dice::range_inclusive(rng, BOREDOM_MIN, BOREDOM_MAX),
        }
    }
}

/// Rouses a sleeping monster. Does nothing when it is already up.
pub(crate) fn wake(world: &mut World, id: EntityId, reason: WakeReason) {
    let Some(monster) = world.monsters.get_mut(id) else {
        return;
    };
    let MonsterState::Asleep { turns_slept } = monster.state else {
        return;
    };
    monster.state = MonsterState::Awake { boredom_countdown: BOREDOM_MAX };
    world.log.push(LogEvent::MonsterWoke { monster: id, reason, after_turns: turns_slept });
}

/// Decides one turn for one monster. Walks and attacks come back as actions
/// for the host to resolve; everything else has already been applied.
pub fn take_turn(
    world: &mut World,
    id: EntityId,
    rng: &mut impl RngCore,
) -> Result<Action, AiError> {
    if !world.monsters.contains_key(id) {
        return Err(AiError::UnknownMonster);
    }
    tick_conditions(world, id);
    let action = match world.monsters[id].state {
        MonsterState::Asleep { .. } => asleep_action(world, id, rng),
        MonsterState::Awake { .. } => awake_action(world, id, rng),
        MonsterState::Afraid => afraid_action(world, id, rng),
    };
    Ok(action)
}

fn tick_conditions(world: &mut World, id: EntityId) {
    let monster = &mut world.monsters[id];
    monster.haste = monster.haste.saturating_sub(1);
    monster.dazzle = monster.dazzle.saturating_sub(1);
    for recharge in &mut monster.recharges {
        *recharge = recharge.saturating_sub(1);
    }
}

fn asleep_action(world: &mut World, id: EntityId, rng: &mut impl RngCore) -> Action {
    let pos = world.monsters[id].pos;
    let hero = world.hero.pos;
    let distance = pos.king_distance(hero);

    // A nearby hero in plain sight is spotted eventually; the closer, the
    // sooner.
    let sees = distance <= WAKE_VIEW_DISTANCE && world.can_view(pos, hero);
    if sees && dice::one_in(rng, distance + 1) {
        wake(world, id, WakeReason::SawHero);
        return awake_action(world, id, rng);
    }
    if !sees && distance <= WAKE_HEAR_DISTANCE && hears_hero(world, pos, rng) {
        wake(world, id, WakeReason::HeardHero);
        return awake_action(world, id, rng);
    }

    if let MonsterState::Asleep { turns_slept } = world.monsters[id].state {
        world.monsters[id].state = MonsterState::Asleep { turns_slept: turns_slept + 1 };
    }
    // Undisturbed sleep out of the hero's sight knits wounds.
    if !world.stage.is_visible(pos) {
        let max_hp = world.breed_of(&world.monsters[id]).max_hp;
        let monster = &mut world.monsters[id];
        monster.hp = (monster.hp + 1).min(max_hp);
    }
    Action::Rest
}

/// Sound spreads by connectivity, so a wall muffles what a corridor carries.
fn hears_hero(world: &World, pos: Pos, rng: &mut impl RngCore) -> bool {
    let mut flow = Flow::with_radius(world, pos, true, true, WAKE_HEAR_DISTANCE as i32);
    let Some(distance) = flow.get_distance(world.hero.pos) else {
        return false;
    };
    let loudness = world.hero.last_noise / (distance * distance).max(1);
    loudness > dice::range(rng, WAKE_NOISE_CHECK)
}

fn awake_action(world: &mut World, id: EntityId, rng: &mut impl RngCore) -> Action {
    let pos = world.monsters[id].pos;
    let hero = world.hero.pos;
    let sees_hero = world.can_view(pos, hero);

    if let MonsterState::Awake { boredom_countdown } = world.monsters[id].state {
        if sees_hero {
            world.monsters[id].state = MonsterState::Awake { boredom_countdown: BOREDOM_MAX };
        } else if boredom_countdown == 0 {
            world.monsters[id].state = MonsterState::asleep();
            world.log.push(LogEvent::MonsterBored { monster: id });
            return Action::Rest;
        } else {
            world.monsters[id].state =
                MonsterState::Awake { boredom_countdown: boredom_countdown - 1 };
        }
    }

    // A recharged move that would accomplish something trumps walking.
    let eligible: Vec<usize> = {
        let monster = &world.monsters[id];
        let breed = world.breed_of(monster);
        let mut eligible = Vec::new();
        for (index, def) in breed.moves.iter().enumerate() {
            if monster.recharges[index] == 0 && def.should_use(world, id, rng) {
                eligible.push(index);
            }
        }
        eligible
    };
    if let Some(choice) = dice::pick(rng, &eligible) {
        let def = world.breeds[world.monsters[id].breed].moves[choice];
        world.monsters[id].recharges[choice] = def.rate();
        return def.start(world, id, rng);
    }

    let (immobile, max_range, tracking, can_open_doors, meander, ranged_share, max_hp) = {
        let breed = world.breed_of(&world.monsters[id]);
        (
            breed.immobile,
            breed.max_range(),
            breed.tracking,
            breed.can_open_doors,
            breed.meander,
            breed.ranged_damage_share(),
            breed.max_hp,
        )
    };

    if immobile {
        if pos.king_distance(hero) == 1 {
            return Action::Walk(Direction::from_delta(hero.y - pos.y, hero.x - pos.x));
        }
        return Action::Rest;
    }

    // Caution climbs with reliance on ranged damage, with fear, and with
    // missing hp. Melee range demands much more nerve than standing apart.
    let monster = &world.monsters[id];
    let caution = ranged_share + monster.fear + 100 - monster.hp * 100 / max_hp.max(1);
    let threshold = if pos.king_distance(hero) <= 1 {
        CAUTION_THRESHOLD_ADJACENT
    } else {
        CAUTION_THRESHOLD_APART
    };
    let prefers_ranged = max_range > 0 && caution > threshold;
    world.monsters[id].prefers_ranged = prefers_ranged;

    let direction = if prefers_ranged {
        ranged_position_direction(world, id, max_range, can_open_doors, rng)
    } else {
        let path = astar::find_path(world, pos, hero, tracking, can_open_doors);
        path.found().then_some(path.direction)
    };
    let Some(direction) = direction else {
        return Action::Rest;
    };
    if direction == Direction::None {
        // Already standing where it wants to be.
        return Action::Rest;
    }

    // A step into the hero is an attack; meander never fumbles those.
    let direction = if direction.apply(pos) == hero {
        direction
    } else {
        meander_direction(world, id, direction, meander, rng)
    };
    let dest = direction.apply(pos);
    if dest == hero
        || (world.monsters[id].can_occupy(&world.stage, dest) && world.monster_at(dest).is_none())
    {
        return Action::Walk(direction);
    }
    if can_open_doors && world.stage.tile_at(dest).opens_to().is_some() {
        // Opening the door is the whole turn.
        world.stage.open_door(dest);
        return Action::Rest;
    }
    Action::Rest
}

/// Picks a step for a monster that wants to shoot rather than brawl: hold or
/// hill-climb away from the hero among cells that can still hit them, else
/// drift toward the nearest such cell.
fn ranged_position_direction(
    world: &World,
    id: EntityId,
    max_range: u32,
    can_open_doors: bool,
    rng: &mut impl RngCore,
) -> Option<Direction> {
    let pos = world.monsters[id].pos;
    let hero = world.hero.pos;
    let range2 = max_range as i64 * max_range as i64;
    let qualifies = |cell: Pos| {
        cell.distance_squared(hero) <= range2
            && cell.king_distance(hero) > RANGED_STANDOFF_DISTANCE
            && world.can_view(cell, hero)
    };

    let mut best: Option<(i64, Direction)> = None;
    if qualifies(pos) {
        best = Some((pos.distance_squared(hero), Direction::None));
    }
    for direction in Direction::ALL {
        let cell = direction.apply(pos);
        if !world.stage.is_passable(cell) || world.actor_at(cell).is_some() || !qualifies(cell) {
            continue;
        }
        let d2 = cell.distance_squared(hero);
        if best.is_none_or(|(best_d2, _)| d2 > best_d2) {
            best = Some((d2, direction));
        }
    }
    if let Some((_, direction)) = best {
        return Some(direction);
    }

    let mut flow = Flow::new(world, pos, can_open_doors, false);
    flow.direction_to_nearest_where(rng, qualifies)
}

/// Rolls the breed's meander chance and, on a hit, swaps the chosen direction
/// for a nearby open one. Dazzle makes the stagger much more likely.
fn meander_direction(
    world: &World,
    id: EntityId,
    direction: Direction,
    meander: u32,
    rng: &mut impl RngCore,
) -> Direction {
    let monster = &world.monsters[id];
    let bonus = if monster.dazzle > 0 { DAZZLE_MEANDER_BONUS } else { 0 };
    let chance = (meander + bonus).min(100);
    if chance == 0 || dice::range(rng, 100) >= chance {
        return direction;
    }

    let pos = monster.pos;
    let hero = world.hero.pos;
    // The chosen direction twice, so a stagger still usually goes forward.
    let pool = [
        direction,
        direction,
        direction.rotate_left45(),
        direction.rotate_right45(),
        direction.rotate_left90(),
        direction.rotate_right90(),
    ];
    let open: Vec<Direction> = pool
        .iter()
        .copied()
        .filter(|d| {
            let dest = d.apply(pos);
            dest == hero || (world.stage.is_passable(dest) && world.monster_at(dest).is_none())
        })
        .collect();
    dice::pick(rng, &open).unwrap_or(direction)
}

fn afraid_action(world: &mut World, id: EntityId, rng: &mut impl RngCore) -> Action {
    let pos = world.monsters[id].pos;
    let hero = world.hero.pos;
    let can_open_doors = world.breed_of(&world.monsters[id]).can_open_doors;

    // Already out of the hero's sight: cower and recover there.
    if !world.stage.is_visible(pos) {
        return Action::Rest;
    }

    // Best escape is the nearest cell the hero cannot see.
    let hidden = {
        let w: &World = world;
        let mut flow = Flow::new(w, pos, can_open_doors, false);
        flow.direction_to_nearest_where(rng, |cell| !w.stage.is_visible(cell))
    };
    if let Some(direction) = hidden
        && direction != Direction::None
    {
        return Action::Walk(direction);
    }

    // Failing that, any step that strictly opens the gap.
    let here = pos.distance_squared(hero);
    let retreats: Vec<Direction> = Direction::ALL
        .iter()
        .copied()
        .filter(|d| {
            let dest = d.apply(pos);
            dest.distance_squared(hero) > here
                && world.stage.is_passable(dest)
                && world.actor_at(dest).is_none()
        })
        .collect();
    if let Some(direction) = dice::pick(rng, &retreats) {
        return Action::Walk(direction);
    }

    // Cornered: turn and fight.
    world.monsters[id].state = MonsterState::awake(rng);
    world.log.push(LogEvent::MonsterCornered { monster: id });
    awake_action(world, id, rng)
}
