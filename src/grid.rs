use std::collections::{BTreeMap, BTreeSet};

use crate::constants::{cell_origin, CELL_SIZE_F};
use crate::level::{Level, Tile};
use crate::square::{Claim, Square};
use crate::types::{Coord, PlayerId, Rect, SquareId, SquareTeam, Team};

#[derive(Clone, Debug)]
pub struct Grid {
    squares: Vec<Square>,
    // Obstacles are in `squares` but never in `cells`.
    cells: BTreeMap<Coord, SquareId>,
    obstacles: BTreeSet<Coord>,
    buckets: BTreeMap<SquareTeam, BTreeSet<SquareId>>,
}

impl Grid {
    pub fn from_level(level: &Level, debounce_secs: f32) -> Self {
        let mut squares = Vec::new();
        let mut cells = BTreeMap::new();
        let mut obstacles = BTreeSet::new();
        let mut buckets: BTreeMap<SquareTeam, BTreeSet<SquareId>> = BTreeMap::new();

        for (coord, tile) in level.cells() {
            let team = match tile {
                Tile::Blank => SquareTeam::Neutral,
                Tile::Rock => SquareTeam::Obstacle,
                Tile::Gravel => SquareTeam::Gravel,
                Tile::Spawn(Team::TeamA) => SquareTeam::SpawnA,
                Tile::Spawn(Team::TeamB) => SquareTeam::SpawnB,
            };
            let id = SquareId(squares.len());
            squares.push(Square::new(id, coord, team, debounce_secs));
            buckets.entry(team).or_default().insert(id);
            if team == SquareTeam::Obstacle {
                obstacles.insert(coord);
            } else {
                cells.insert(coord, id);
            }
        }

        Self {
            squares,
            cells,
            obstacles,
            buckets,
        }
    }

    #[cfg(test)]
    fn is_addressable(&self, coord: Coord) -> bool {
        self.cells.contains_key(&coord)
    }

    pub fn is_passable(&self, coord: Coord) -> bool {
        self.square_at(coord)
            .map(|square| square.team.is_passable())
            .unwrap_or(false)
    }

    pub fn is_obstacle(&self, coord: Coord) -> bool {
        self.obstacles.contains(&coord)
    }

    pub fn id_at(&self, coord: Coord) -> Option<SquareId> {
        self.cells.get(&coord).copied()
    }

    pub fn square_at(&self, coord: Coord) -> Option<&Square> {
        self.id_at(coord).map(|id| &self.squares[id.0])
    }

    pub fn square(&self, id: SquareId) -> &Square {
        &self.squares[id.0]
    }

    pub fn squares(&self) -> &[Square] {
        &self.squares
    }

    pub fn squares_mut(&mut self) -> &mut [Square] {
        &mut self.squares
    }

    /// Passable cells around `coord`.
    ///
    /// Four-connected mode yields Manhattan distance 1. Eight-connected mode
    /// yields Manhattan distance 1 or 2, which is a 12-cell diamond rather
    /// than a Moore neighborhood; blasts and the flee walk rely on that shape.
    pub fn neighbors(&self, coord: Coord, eight_connected: bool) -> Vec<Coord> {
        let (x, y) = coord;
        let reach = if eight_connected { 2 } else { 1 };
        let mut out = Vec::new();
        for nx in (x - reach)..=(x + reach) {
            for ny in (y - reach)..=(y + reach) {
                let distance = (nx - x).abs() + (ny - y).abs();
                if distance == 0 || distance > reach {
                    continue;
                }
                if self.is_passable((nx, ny)) {
                    out.push((nx, ny));
                }
            }
        }
        out
    }

    pub fn obstacle_rects(&self) -> impl Iterator<Item = Rect> + '_ {
        self.obstacles.iter().map(|coord| {
            let (x, y) = cell_origin(*coord);
            Rect::new(x, y, CELL_SIZE_F, CELL_SIZE_F)
        })
    }

    pub fn count(&self, team: SquareTeam) -> usize {
        self.buckets.get(&team).map(BTreeSet::len).unwrap_or(0)
    }

    pub fn record_claim(&mut self, claim: &Claim) {
        self.move_bucket(claim.square, claim.previous_team, SquareTeam::from(claim.team));
    }

    pub fn neutralize(&mut self, coord: Coord) -> Option<(SquareId, Option<PlayerId>)> {
        let id = self.id_at(coord)?;
        let previous = self.squares[id.0].team;
        if !matches!(previous, SquareTeam::TeamA | SquareTeam::TeamB) {
            return None;
        }
        let owner = self.squares[id.0].neutralize();
        self.move_bucket(id, previous, SquareTeam::Neutral);
        Some((id, owner))
    }

    fn move_bucket(&mut self, id: SquareId, from: SquareTeam, to: SquareTeam) {
        if from == to {
            return;
        }
        if let Some(bucket) = self.buckets.get_mut(&from) {
            bucket.remove(&id);
        }
        self.buckets.entry(to).or_default().insert(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{CLAIM_DEBOUNCE_SECS, GRID_SIZE};
    use crate::test_support::{level_from, OPEN};

    const MIXED: &str = "
1.......
........
...#....
..#.%...
........
........
........
.......2
";

    fn manhattan(a: Coord, b: Coord) -> i32 {
        (a.0 - b.0).abs() + (a.1 - b.1).abs()
    }

    #[test]
    fn four_connected_neighbors_are_adjacent_and_passable() {
        let grid = Grid::from_level(&level_from(MIXED), CLAIM_DEBOUNCE_SECS);
        for x in 0..GRID_SIZE {
            for y in 0..GRID_SIZE {
                for n in grid.neighbors((x, y), false) {
                    assert_eq!(manhattan((x, y), n), 1);
                    assert!(grid.is_passable(n));
                }
            }
        }
        assert_eq!(grid.neighbors((3, 3), false), vec![(3, 4), (4, 3)]);
    }

    #[test]
    fn eight_connected_neighbors_form_a_diamond() {
        let open = Grid::from_level(&level_from(OPEN), CLAIM_DEBOUNCE_SECS);
        let around = open.neighbors((4, 4), true);
        assert_eq!(around.len(), 12);
        assert!(around.iter().all(|n| matches!(manhattan((4, 4), *n), 1 | 2)));
        assert!(!around.contains(&(6, 6)));

        let grid = Grid::from_level(&level_from(MIXED), CLAIM_DEBOUNCE_SECS);
        for n in grid.neighbors((3, 3), true) {
            assert!(matches!(manhattan((3, 3), n), 1 | 2));
            assert!(grid.is_passable(n));
        }
    }

    #[test]
    fn obstacles_are_not_addressable_and_spawns_not_passable() {
        let grid = Grid::from_level(&level_from(MIXED), CLAIM_DEBOUNCE_SECS);
        assert!(!grid.is_addressable((3, 2)));
        assert!(grid.is_obstacle((3, 2)));
        assert!(grid.square_at((3, 2)).is_none());
        assert!(grid.is_addressable((0, 0)));
        assert!(!grid.is_passable((0, 0)));
        assert!(grid.is_passable((4, 3)));
        assert!(!grid.is_passable((-1, 0)));
        assert_eq!(grid.count(SquareTeam::Obstacle), 2);
        assert_eq!(grid.count(SquareTeam::Gravel), 1);
        assert_eq!(grid.count(SquareTeam::Neutral), 64 - 2 - 1 - 2);
    }

    #[test]
    fn claims_and_blasts_move_team_buckets() {
        let mut grid = Grid::from_level(&level_from(MIXED), CLAIM_DEBOUNCE_SECS);
        let id = grid.id_at((1, 1)).expect("addressable");
        grid.squares_mut()[id.0].team = SquareTeam::TeamA;
        grid.squares_mut()[id.0].owner = Some(PlayerId(0));
        grid.record_claim(&Claim {
            square: id,
            previous_team: SquareTeam::Neutral,
            previous_owner: None,
            owner: PlayerId(0),
            team: Team::TeamA,
        });
        assert_eq!(grid.count(SquareTeam::TeamA), 1);

        assert_eq!(grid.neutralize((1, 1)), Some((id, Some(PlayerId(0)))));
        assert_eq!(grid.count(SquareTeam::TeamA), 0);
        assert_eq!(grid.square(id).team, SquareTeam::Neutral);
        assert!(grid.neutralize((4, 3)).is_none());
    }
}
