use crate::{Coord, Maze};

pub use backtracker::*;

mod backtracker;

pub trait MazeGenerator {
    fn generate(self, size: Coord) -> Maze;
}
