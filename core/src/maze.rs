use bitflags::bitflags;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{CellCount, Coord, Coord2, Direction, GameError, Result, ToNdIndex, mult, step};

bitflags! {
    /// Wall set of a single cell. A missing flag means the passage on that
    /// side is open.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Walls: u8 {
        const TOP    = 1;
        const RIGHT  = 1 << 1;
        const BOTTOM = 1 << 2;
        const LEFT   = 1 << 3;
    }
}

impl Walls {
    pub const fn facing(dir: Direction) -> Walls {
        match dir {
            Direction::Up => Walls::TOP,
            Direction::Right => Walls::RIGHT,
            Direction::Down => Walls::BOTTOM,
            Direction::Left => Walls::LEFT,
        }
    }
}

/// Outcome of resolving a directional move against the wall layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved(Coord2),
    Blocked,
}

impl MoveOutcome {
    /// Whether this outcome changed the player position.
    pub const fn has_update(self) -> bool {
        match self {
            Self::Moved(_) => true,
            Self::Blocked => false,
        }
    }
}

/// Square grid of cells whose wall flags are kept pairwise symmetric: a
/// passage opened from one cell is always open from its neighbor too.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Maze {
    walls: Array2<Walls>,
    size: Coord,
}

impl Maze {
    /// A maze with every wall still present. Only generators start from this.
    pub(crate) fn sealed(size: Coord) -> Self {
        let n = size as usize;
        Self {
            walls: Array2::from_elem([n, n], Walls::all()),
            size,
        }
    }

    pub fn size(&self) -> Coord {
        self.size
    }

    pub fn total_cells(&self) -> CellCount {
        mult(self.size, self.size)
    }

    /// Entry cell, fixed at the top-left corner.
    pub const fn start(&self) -> Coord2 {
        (0, 0)
    }

    /// Goal cell, fixed at the bottom-right corner.
    pub fn goal(&self) -> Coord2 {
        (self.size - 1, self.size - 1)
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if coords.0 < self.size && coords.1 < self.size {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn walls_at(&self, coords: Coord2) -> Walls {
        self.walls[coords.to_nd_index()]
    }

    pub fn has_wall(&self, coords: Coord2, dir: Direction) -> bool {
        self.walls_at(coords).contains(Walls::facing(dir))
    }

    /// Number of wall pairs knocked out so far. A perfect maze of `n` cells
    /// has exactly `n − 1` of them.
    pub fn open_passage_count(&self) -> CellCount {
        let missing: u32 = self
            .walls
            .iter()
            .map(|walls| Walls::all().difference(*walls).bits().count_ones())
            .sum();
        (missing / 2) as CellCount
    }

    /// Clears the shared wall pair between `coords` and its neighbor in `dir`.
    /// Border walls have no neighbor and are left untouched.
    pub(crate) fn open_passage(&mut self, coords: Coord2, dir: Direction) {
        let Some(next) = step(coords, dir, self.size) else {
            log::warn!("Refusing to open border wall at {coords:?} {dir:?}");
            return;
        };
        self.walls[coords.to_nd_index()].remove(Walls::facing(dir));
        self.walls[next.to_nd_index()].remove(Walls::facing(dir.opposite()));
    }

    /// Resolves a proposed move. A move succeeds iff the cell at `position`
    /// has no wall on the given side; on failure the position is unchanged
    /// and the caller treats it as a wall collision.
    pub fn resolve_move(&self, position: Coord2, dir: Direction) -> Result<MoveOutcome> {
        let position = self.validate_coords(position)?;

        if self.has_wall(position, dir) {
            return Ok(MoveOutcome::Blocked);
        }

        match step(position, dir, self.size) {
            Some(next) => Ok(MoveOutcome::Moved(next)),
            None => {
                // Generators never remove border walls, so this is unreachable
                // for any maze built through this crate.
                log::warn!("Open wall points outside the grid at {position:?} {dir:?}");
                Ok(MoveOutcome::Blocked)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Maze {
        // 2x2 maze whose only path is (0,0) -> (1,0) -> (1,1).
        let mut maze = Maze::sealed(2);
        maze.open_passage((0, 0), Direction::Right);
        maze.open_passage((1, 0), Direction::Down);
        maze
    }

    #[test]
    fn sealed_maze_has_every_wall() {
        let maze = Maze::sealed(3);
        for x in 0..3 {
            for y in 0..3 {
                assert_eq!(maze.walls_at((x, y)), Walls::all());
            }
        }
        assert_eq!(maze.open_passage_count(), 0);
    }

    #[test]
    fn open_passage_clears_both_sides() {
        let maze = corridor();
        assert!(!maze.has_wall((0, 0), Direction::Right));
        assert!(!maze.has_wall((1, 0), Direction::Left));
        assert!(!maze.has_wall((1, 0), Direction::Down));
        assert!(!maze.has_wall((1, 1), Direction::Up));
        assert_eq!(maze.open_passage_count(), 2);
    }

    #[test]
    fn open_passage_ignores_border_walls() {
        let mut maze = Maze::sealed(2);
        maze.open_passage((0, 0), Direction::Up);
        assert_eq!(maze.walls_at((0, 0)), Walls::all());
    }

    #[test]
    fn resolve_move_follows_open_passages() {
        let maze = corridor();
        assert_eq!(
            maze.resolve_move((0, 0), Direction::Right).unwrap(),
            MoveOutcome::Moved((1, 0))
        );
        assert_eq!(
            maze.resolve_move((0, 0), Direction::Down).unwrap(),
            MoveOutcome::Blocked
        );
        assert_eq!(
            maze.resolve_move((0, 0), Direction::Up).unwrap(),
            MoveOutcome::Blocked
        );
    }

    #[test]
    fn resolve_move_rejects_out_of_bounds_coords() {
        let maze = corridor();
        assert_eq!(
            maze.resolve_move((2, 0), Direction::Left),
            Err(GameError::InvalidCoords)
        );
    }

    #[test]
    fn resolved_positions_stay_inside_the_grid() {
        let maze = corridor();
        for x in 0..2 {
            for y in 0..2 {
                for dir in Direction::ALL {
                    if let MoveOutcome::Moved(next) = maze.resolve_move((x, y), dir).unwrap() {
                        assert!(next.0 < maze.size() && next.1 < maze.size());
                    }
                }
            }
        }
    }
}
