//! Tactical core for a tile-based dungeon crawler: line of sight, budgeted
//! pathfinding, lazy flow fields, shadow-casting field of view, a data-driven
//! move catalog, and the per-monster decision state machine.
//!
//! The host owns the turn loop, combat resolution, and rendering. This crate
//! answers one question per call: what does this monster do right now?

pub mod ai;
pub mod content;
pub mod state;
pub mod types;

pub use ai::astar::{PathResult, PathTuning, find_path};
pub use ai::flow::Flow;
pub use ai::fov::refresh as refresh_fov;
pub use ai::los::line as los_line;
pub use ai::monster::{MonsterState, take_turn};
pub use ai::moves::{ConeEffect, ConeProgress, HowlEffect, HowlProgress, MoveDef};
pub use content::{Attack, Breed, ContentPack};
pub use state::{Hero, Monster, Occupant, Stage, World};
pub use types::{
    Action, AiError, BreedId, Direction, Element, EntityId, LogEvent, Pos, TileKind, WakeReason,
};
