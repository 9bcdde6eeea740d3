use super::*;
use crate::{Coord2, Direction, ToNdIndex, step};
use ndarray::Array2;

/// Randomized depth-first backtracker over an explicit stack. Every run
/// carves a perfect maze: the passage graph is a spanning tree of the grid,
/// so exactly one simple path exists between any two cells.
///
/// Identical `(size, seed)` pairs reproduce an identical maze.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BacktrackingGenerator {
    seed: u64,
}

impl BacktrackingGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl MazeGenerator for BacktrackingGenerator {
    fn generate(self, size: Coord) -> Maze {
        use rand::prelude::*;

        let size = if size == 0 {
            log::warn!("Maze of size 0 requested, clamping to 1");
            1
        } else {
            size
        };

        let mut maze = Maze::sealed(size);
        let mut visited: Array2<bool> = Array2::default([size as usize, size as usize]);
        let mut stack: Vec<Coord2> = Vec::with_capacity(maze.total_cells() as usize);
        let mut rng = SmallRng::seed_from_u64(self.seed);

        visited[(0, 0).to_nd_index()] = true;
        stack.push((0, 0));

        while let Some(&current) = stack.last() {
            // unvisited grid-adjacent neighbors of the stack top
            let mut neighbors = [(Direction::Up, (0, 0)); 4];
            let mut count = 0;
            for dir in Direction::ALL {
                if let Some(next) = step(current, dir, size) {
                    if !visited[next.to_nd_index()] {
                        neighbors[count] = (dir, next);
                        count += 1;
                    }
                }
            }

            if count == 0 {
                let _ = stack.pop();
                continue;
            }

            let (dir, next) = neighbors[rng.random_range(0..count)];
            maze.open_passage(current, dir);
            visited[next.to_nd_index()] = true;
            stack.push(next);
        }

        log::debug!(
            "Generated {size}x{size} maze from seed {}, {} passages",
            self.seed,
            maze.open_passage_count()
        );
        maze
    }
}
