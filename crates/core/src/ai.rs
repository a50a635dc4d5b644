//! Tactical monster AI: spatial search primitives and the per-turn decision core.
//! This subsystem exists to turn locally available stage information into one
//! plausible action per monster turn, without multi-turn planning.
//! It does not own combat resolution, scheduling, or content definitions.

pub mod astar;
pub mod dice;
pub mod flow;
pub mod fov;
pub mod los;
pub mod monster;
pub mod moves;

#[cfg(test)]
pub(crate) mod test_support;

pub use monster::{MonsterState, take_turn};
