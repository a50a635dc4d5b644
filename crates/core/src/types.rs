use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::ai::moves::{ConeEffect, HowlEffect};

new_key_type! {
    pub struct EntityId;
}

/// Index into the breed table shared by every monster of that breed.
pub type BreedId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

impl Pos {
    pub fn step(self, dy: i32, dx: i32) -> Pos {
        Pos { y: self.y + dy, x: self.x + dx }
    }

    /// Chebyshev distance: the number of king moves between two cells.
    pub fn king_distance(self, other: Pos) -> u32 {
        self.y.abs_diff(other.y).max(self.x.abs_diff(other.x))
    }

    pub fn distance_squared(self, other: Pos) -> i64 {
        let dy = (self.y - other.y) as i64;
        let dx = (self.x - other.x) as i64;
        dy * dy + dx * dx
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TileKind {
    Wall,
    Floor,
    ClosedDoor,
    OpenDoor,
}

impl TileKind {
    pub fn is_passable(self) -> bool {
        matches!(self, TileKind::Floor | TileKind::OpenDoor)
    }

    pub fn is_transparent(self) -> bool {
        matches!(self, TileKind::Floor | TileKind::OpenDoor)
    }

    /// What this tile becomes when an actor opens it, if anything.
    pub fn opens_to(self) -> Option<TileKind> {
        match self {
            TileKind::ClosedDoor => Some(TileKind::OpenDoor),
            _ => None,
        }
    }

    /// Passable now, or passable after being opened by someone.
    pub fn is_traversable(self) -> bool {
        self.is_passable() || self.opens_to().is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    None,
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    /// (dy, dx) offset of one step in this direction.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::None => (0, 0),
            Direction::N => (-1, 0),
            Direction::NE => (-1, 1),
            Direction::E => (0, 1),
            Direction::SE => (1, 1),
            Direction::S => (1, 0),
            Direction::SW => (1, -1),
            Direction::W => (0, -1),
            Direction::NW => (-1, -1),
        }
    }

    pub fn apply(self, pos: Pos) -> Pos {
        let (dy, dx) = self.offset();
        pos.step(dy, dx)
    }

    /// Direction whose offset matches the signs of the given delta.
    pub fn from_delta(dy: i32, dx: i32) -> Direction {
        match (dy.signum(), dx.signum()) {
            (0, 0) => Direction::None,
            (-1, 0) => Direction::N,
            (-1, 1) => Direction::NE,
            (0, 1) => Direction::E,
            (1, 1) => Direction::SE,
            (1, 0) => Direction::S,
            (1, -1) => Direction::SW,
            (0, -1) => Direction::W,
            _ => Direction::NW,
        }
    }

    pub fn rotate_right45(self) -> Direction {
        match self {
            Direction::None => Direction::None,
            Direction::N => Direction::NE,
            Direction::NE => Direction::E,
            Direction::E => Direction::SE,
            Direction::SE => Direction::S,
            Direction::S => Direction::SW,
            Direction::SW => Direction::W,
            Direction::W => Direction::NW,
            Direction::NW => Direction::N,
        }
    }

    pub fn rotate_left45(self) -> Direction {
        match self {
            Direction::None => Direction::None,
            Direction::N => Direction::NW,
            Direction::NW => Direction::W,
            Direction::W => Direction::SW,
            Direction::SW => Direction::S,
            Direction::S => Direction::SE,
            Direction::SE => Direction::E,
            Direction::E => Direction::NE,
            Direction::NE => Direction::N,
        }
    }

    pub fn rotate_right90(self) -> Direction {
        self.rotate_right45().rotate_right45()
    }

    pub fn rotate_left90(self) -> Direction {
        self.rotate_left45().rotate_left45()
    }

    pub fn rotate180(self) -> Direction {
        self.rotate_right90().rotate_right90()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Element {
    Fire,
    Cold,
    Lightning,
    Poison,
}

/// One turn's worth of monster behavior, handed to the turn scheduler.
/// Walks and hits are applied by the host; mood and position side effects of
/// special moves have already been applied when the action is returned.
#[derive(Clone, Debug)]
pub enum Action {
    Rest,
    Walk(Direction),
    Heal { amount: i32 },
    Bolt { element: Element, damage: i32, target: Pos },
    Teleport { to: Pos },
    Spawn { child: EntityId, pos: Pos },
    Haste { turns: u32, boost: u32 },
    Insult { taunt: &'static str },
    Cone(ConeEffect),
    Howl(HowlEffect),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WakeReason {
    Hit,
    SawHero,
    HeardHero,
    Howl,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogEvent {
    MonsterWoke { monster: EntityId, reason: WakeReason, after_turns: u32 },
    MonsterBored { monster: EntityId },
    MonsterCornered { monster: EntityId },
    Taunt { monster: EntityId, taunt: &'static str },
    Spawned { parent: EntityId, child: EntityId, generation: u32 },
    Teleported { monster: EntityId, from: Pos, to: Pos },
    Healed { monster: EntityId, amount: i32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AiError {
    UnknownMonster,
}
