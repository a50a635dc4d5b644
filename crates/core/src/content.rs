//! Breed tables consumed by the decision core.
//! This module exists so hosts can ship monster content as plain data.
//! It does not own per-monster runtime state such as cooldowns or mood.

use serde::{Deserialize, Serialize};

use crate::ai::moves::MoveDef;
use crate::types::{BreedId, Element};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attack {
    pub verb: String,
    pub damage: i32,
    /// 0 means melee.
    pub range: u32,
}

/// Immutable definition shared read-only across every monster of the breed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Breed {
    pub name: String,
    pub max_hp: i32,
    pub speed: u32,
    /// How long a path, in steps, this breed will chase the hero along.
    pub tracking: u32,
    /// Percent chance per step to wander off the chosen direction.
    pub meander: u32,
    pub immobile: bool,
    pub can_open_doors: bool,
    pub attacks: Vec<Attack>,
    pub moves: Vec<MoveDef>,
}

impl Breed {
    /// Longest reach of any ranged attack or move; 0 for pure melee breeds.
    pub fn max_range(&self) -> u32 {
        let attacks = self.attacks.iter().map(|attack| attack.range);
        let moves = self.moves.iter().map(|def| def.range());
        attacks.chain(moves).max().unwrap_or(0)
    }

    /// Share of the breed's damage output that comes from range, 0-100.
    /// Feeds the caution score when deciding between melee and positioning.
    pub fn ranged_damage_share(&self) -> i32 {
        let mut ranged = 0i64;
        let mut total = 0i64;
        for attack in &self.attacks {
            total += attack.damage as i64;
            if attack.range > 0 {
                ranged += attack.damage as i64;
            }
        }
        for def in &self.moves {
            let damage = match def {
                MoveDef::Bolt { damage, .. } | MoveDef::Cone { damage, .. } => *damage as i64,
                _ => 0,
            };
            total += damage;
            ranged += damage;
        }
        if total == 0 {
            return 0;
        }
        (ranged * 100 / total) as i32
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentPack {
    pub breeds: Vec<Breed>,
}

impl ContentPack {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn breed_named(&self, name: &str) -> Option<BreedId> {
        self.breeds.iter().position(|breed| breed.name == name)
    }

    pub fn build_default() -> Self {
        Self {
            breeds: vec![
                Breed {
                    name: "cave rat".into(),
                    max_hp: 8,
                    speed: 12,
                    tracking: 10,
                    meander: 30,
                    immobile: false,
                    can_open_doors: false,
                    attacks: vec![Attack { verb: "bites".into(), damage: 3, range: 0 }],
                    moves: vec![],
                },
                Breed {
                    name: "ash drake".into(),
                    max_hp: 30,
                    speed: 10,
                    tracking: 20,
                    meander: 10,
                    immobile: false,
                    can_open_doors: false,
                    attacks: vec![Attack { verb: "claws".into(), damage: 6, range: 0 }],
                    moves: vec![
                        MoveDef::Bolt { rate: 5, range: 8, element: Element::Fire, damage: 8 },
                        MoveDef::Cone { rate: 9, range: 5, element: Element::Fire, damage: 6 },
                    ],
                },
                Breed {
                    name: "moss witch".into(),
                    max_hp: 16,
                    speed: 9,
                    tracking: 16,
                    meander: 20,
                    immobile: false,
                    can_open_doors: true,
                    attacks: vec![Attack { verb: "curses".into(), damage: 4, range: 7 }],
                    moves: vec![
                        MoveDef::Heal { rate: 8, amount: 8 },
                        MoveDef::Teleport { rate: 6, range: 6 },
                        MoveDef::Insult { rate: 4 },
                    ],
                },
                Breed {
                    name: "green slime".into(),
                    max_hp: 12,
                    speed: 6,
                    tracking: 8,
                    meander: 60,
                    immobile: false,
                    can_open_doors: false,
                    attacks: vec![Attack { verb: "engulfs".into(), damage: 2, range: 0 }],
                    moves: vec![MoveDef::Spawn { rate: 10 }],
                },
                Breed {
                    name: "dire wolf".into(),
                    max_hp: 18,
                    speed: 13,
                    tracking: 25,
                    meander: 15,
                    immobile: false,
                    can_open_doors: false,
                    attacks: vec![Attack { verb: "rends".into(), damage: 5, range: 0 }],
                    moves: vec![
                        MoveDef::Howl { rate: 12, range: 10 },
                        MoveDef::Haste { rate: 15, turns: 6, boost: 4 },
                    ],
                },
                Breed {
                    name: "sentry spore".into(),
                    max_hp: 20,
                    speed: 5,
                    tracking: 0,
                    meander: 0,
                    immobile: true,
                    can_open_doors: false,
                    attacks: vec![Attack { verb: "jabs".into(), damage: 4, range: 0 }],
                    moves: vec![MoveDef::Bolt {
                        rate: 4,
                        range: 6,
                        element: Element::Poison,
                        damage: 5,
                    }],
                },
            ],
        }
    }
}
