//! Shared fixtures for the unit tests in this subsystem.

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;

use crate::content::{Attack, Breed, ContentPack};
use crate::state::{Hero, Stage, World};
use crate::types::{Element, EntityId, Pos};

pub(crate) fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

pub(crate) fn p(y: i32, x: i32) -> Pos {
    Pos { y, x }
}

/// A walled rectangle with an open floor interior.
pub(crate) fn open_stage(width: usize, height: usize) -> Stage {
    Stage::new(width, height)
}

pub(crate) fn melee_breed() -> Breed {
    Breed {
        name: "test brute".into(),
        max_hp: 10,
        speed: 10,
        tracking: 20,
        meander: 30,
        immobile: false,
        can_open_doors: false,
        attacks: vec![Attack { verb: "hits".into(), damage: 3, range: 0 }],
        moves: vec![],
    }
}

pub(crate) fn drake_breed() -> Breed {
    Breed {
        name: "test drake".into(),
        max_hp: 30,
        speed: 10,
        tracking: 20,
        meander: 10,
        immobile: false,
        can_open_doors: false,
        attacks: vec![Attack { verb: "claws".into(), damage: 6, range: 0 }],
        moves: vec![
            crate::ai::moves::MoveDef::Bolt { rate: 5, range: 8, element: Element::Fire, damage: 8 },
            crate::ai::moves::MoveDef::Cone { rate: 9, range: 5, element: Element::Fire, damage: 6 },
        ],
    }
}

/// A world holding one monster of the given breed, which lands breed id 0.
pub(crate) fn world_with_monster(
    stage: Stage,
    hero: Pos,
    breed: Breed,
    monster: Pos,
) -> (World, EntityId) {
    let pack = ContentPack { breeds: vec![breed] };
    let mut world = World::new(stage, Hero::new(hero), pack);
    let id = world.spawn_monster(0, monster);
    (world, id)
}
