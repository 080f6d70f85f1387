use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::GRID_SIZE;
use crate::error::{LevelError, LoadError};
use crate::types::{Coord, PowerupKind, Team};

pub const CHAR_BLANK: char = '.';
pub const CHAR_TEAM_A: char = '1';
pub const CHAR_TEAM_B: char = '2';
pub const CHAR_ROCK: char = '#';
pub const CHAR_GRAVEL: char = '%';

// Visibility item from the original campaign; the simulation never spawns it.
const LEGACY_TORCH: &str = "torch";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
    Blank,
    Rock,
    Gravel,
    Spawn(Team),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LevelDef {
    pub name: String,
    #[serde(default)]
    pub remark: String,
    pub powerups: Vec<String>,
    #[serde(rename = "aiDumbness", alias = "ai_dumbness")]
    pub ai_dumbness: u32,
    pub world: String,
    #[serde(default)]
    pub fov: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    pub name: String,
    pub remark: String,
    pub powerups: Vec<PowerupKind>,
    pub ai_dumbness: u32,
    pub fov: bool,
    tiles: Vec<Tile>,
}

impl Level {
    pub fn parse(def: &LevelDef) -> Result<Self, LevelError> {
        let rows: Vec<&str> = def
            .world
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if rows.len() != GRID_SIZE as usize {
            return Err(LevelError::RowCount {
                level: def.name.clone(),
                rows: rows.len(),
            });
        }

        let mut tiles = Vec::with_capacity((GRID_SIZE * GRID_SIZE) as usize);
        for (y, row) in rows.iter().enumerate() {
            let width = row.chars().count();
            if width != GRID_SIZE as usize {
                return Err(LevelError::RowWidth {
                    level: def.name.clone(),
                    row: y,
                    width,
                });
            }
            for (x, symbol) in row.chars().enumerate() {
                let tile = match symbol {
                    CHAR_BLANK => Tile::Blank,
                    CHAR_ROCK => Tile::Rock,
                    CHAR_GRAVEL => Tile::Gravel,
                    CHAR_TEAM_A => Tile::Spawn(Team::TeamA),
                    CHAR_TEAM_B => Tile::Spawn(Team::TeamB),
                    _ => {
                        return Err(LevelError::UnknownTile {
                            level: def.name.clone(),
                            x,
                            y,
                            symbol,
                        })
                    }
                };
                tiles.push(tile);
            }
        }

        for (team, symbol) in [(Team::TeamA, CHAR_TEAM_A), (Team::TeamB, CHAR_TEAM_B)] {
            if !tiles.contains(&Tile::Spawn(team)) {
                return Err(LevelError::MissingSpawn {
                    level: def.name.clone(),
                    symbol,
                });
            }
        }

        let mut powerups = Vec::new();
        for name in &def.powerups {
            let normalized = name.trim().to_ascii_lowercase();
            if normalized == LEGACY_TORCH {
                continue;
            }
            let Some(kind) = PowerupKind::parse(&normalized) else {
                return Err(LevelError::UnknownPowerup {
                    level: def.name.clone(),
                    name: name.clone(),
                });
            };
            if !powerups.contains(&kind) {
                powerups.push(kind);
            }
        }
        if powerups.is_empty() {
            return Err(LevelError::NoPowerups {
                level: def.name.clone(),
            });
        }

        Ok(Self {
            name: def.name.clone(),
            remark: def.remark.clone(),
            powerups,
            ai_dumbness: def.ai_dumbness,
            fov: def.fov,
            tiles,
        })
    }

    #[cfg(test)]
    fn tile(&self, coord: Coord) -> Option<Tile> {
        let (x, y) = coord;
        if x < 0 || y < 0 || x >= GRID_SIZE || y >= GRID_SIZE {
            return None;
        }
        self.tiles.get((y * GRID_SIZE + x) as usize).copied()
    }

    pub fn cells(&self) -> impl Iterator<Item = (Coord, Tile)> + '_ {
        self.tiles.iter().enumerate().map(|(idx, tile)| {
            let idx = idx as i32;
            ((idx % GRID_SIZE, idx / GRID_SIZE), *tile)
        })
    }

    pub fn spawns(&self, team: Team) -> Vec<Coord> {
        self.cells()
            .filter(|(_, tile)| *tile == Tile::Spawn(team))
            .map(|(coord, _)| coord)
            .collect()
    }
}

pub fn load_levels(path: &Path) -> Result<Vec<Level>, LoadError> {
    let text = fs::read_to_string(path)?;
    let defs: Vec<LevelDef> = serde_json::from_str(&text)?;
    let levels = defs
        .iter()
        .map(Level::parse)
        .collect::<Result<Vec<_>, _>>()?;
    if levels.is_empty() {
        return Err(LevelError::EmptyCampaign.into());
    }
    Ok(levels)
}

struct BuiltinLevel {
    name: &'static str,
    remark: &'static str,
    powerups: &'static [&'static str],
    ai_dumbness: u32,
    world: &'static str,
    fov: bool,
}

impl BuiltinLevel {
    fn to_def(&self) -> LevelDef {
        LevelDef {
            name: self.name.to_string(),
            remark: self.remark.to_string(),
            powerups: self.powerups.iter().map(|p| p.to_string()).collect(),
            ai_dumbness: self.ai_dumbness,
            world: self.world.to_string(),
            fov: self.fov,
        }
    }
}

const TUTORIAL: BuiltinLevel = BuiltinLevel {
    name: "tutorial",
    remark: "Move:\n WASD\nPause:\n e",
    powerups: &["speedup"],
    ai_dumbness: 25,
    world: "
1.......
......%.
....#%%.
........
.#......
...#.%..
.%......
..#....2
",
    fov: false,
};

const TUTORIAL_GUN: BuiltinLevel = BuiltinLevel {
    name: "tutorial_gun",
    remark: "Shoot:\nq\n",
    powerups: &["gun"],
    ai_dumbness: 20,
    world: "
1.......
..#...#.
#.......
..#.#%..
...#%#..
.......#
.#...#%%
......%2
",
    fov: false,
};

const TUTORIAL_GASCAN: BuiltinLevel = BuiltinLevel {
    name: "tutorial_gascan",
    remark: "Use a\nGAS CAN\nand run.\nBOOM!",
    powerups: &["gas_can"],
    ai_dumbness: 10,
    world: "
1.......
........
........
........
........
........
........
.......2
",
    fov: false,
};

const TWO_OPPONENT: BuiltinLevel = BuiltinLevel {
    name: "two_opponent",
    remark: "One guy...\nToo easy.",
    powerups: &["gun", "gas_can", "speedup"],
    ai_dumbness: 40,
    world: "
2.......
#...###.
........
.#.#1...
##.###.#
....#...
.#.....#
.#.....2
",
    fov: false,
};

const DUEL: BuiltinLevel = BuiltinLevel {
    name: "duel",
    remark: "Unless...\nit's THIS\nguy!",
    powerups: &["gun", "speedup"],
    ai_dumbness: 5,
    world: "
1.......
.##..##.
.#....#.
...##...
...##...
.#....#.
.##..##.
.......2
",
    fov: false,
};

const DARK: BuiltinLevel = BuiltinLevel {
    name: "dark",
    remark: "Night\nFalls...",
    powerups: &["torch", "barbwire", "gun"],
    ai_dumbness: 10,
    world: "
1.......
#.#.#.#.
........
.#.#.#.#
........
#.#.#.#.
........
.#.#.#2#
",
    fov: true,
};

const BOMBERMAN: BuiltinLevel = BuiltinLevel {
    name: "bomberman",
    remark: "Only\nBOMBS\nremain...",
    powerups: &["gas_can"],
    ai_dumbness: 0,
    world: "
1%.%.%.%
%.%.%.%.
.%.%.%.%
%.%.%.%.
.%.%.%.%
%.%.%.%.
.%.%.%.%
%.%.%.%2
",
    fov: true,
};

const TIME_TRIALS: BuiltinLevel = BuiltinLevel {
    name: "time_trials",
    remark: "Are you\nFAST\nenough?",
    powerups: &["gun"],
    ai_dumbness: 2,
    world: "
1#......
.#.####.
...#....
###.....
.....###
....#...
.####.#.
......#2
",
    fov: false,
};

const DEATH: BuiltinLevel = BuiltinLevel {
    name: "death",
    remark: "You won't\nbeat\nthis.",
    powerups: &["speedup", "barbwire", "gas_can", "gun"],
    ai_dumbness: 15,
    world: "
1......2
.##%%##.
.#....#.
.%....%.
.%....%.
.#....#.
.##%%##.
2......2
",
    fov: false,
};

const CAMPAIGN: [&BuiltinLevel; 8] = [
    &TUTORIAL,
    &TUTORIAL_GUN,
    &TUTORIAL_GASCAN,
    &TWO_OPPONENT,
    &DUEL,
    &DARK,
    &BOMBERMAN,
    &TIME_TRIALS,
];

pub fn campaign() -> Result<Vec<Level>, LevelError> {
    CAMPAIGN
        .iter()
        .map(|builtin| Level::parse(&builtin.to_def()))
        .collect()
}

pub fn builtin(name: &str) -> Option<Result<Level, LevelError>> {
    CAMPAIGN
        .iter()
        .copied()
        .chain(std::iter::once(&DEATH))
        .find(|builtin| builtin.name == name)
        .map(|builtin| Level::parse(&builtin.to_def()))
}
