use serde::{Deserialize, Serialize};

/// Single coordinate axis used for maze width, height, and positions.
pub type Coord = u8;

/// Count type used for cell totals and passage counts.
pub type CellCount = u16;

/// Two-dimensional coordinates `(x, y)`, `x` growing rightward and `y` downward.
pub type Coord2 = (Coord, Coord);

/// Level numbers start at 1.
pub type Level = u32;

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

/// The four axis-aligned movement directions. No diagonals.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub const fn delta(self) -> (i8, i8) {
        match self {
            Self::Up => (0, -1),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
        }
    }

    pub const fn opposite(self) -> Direction {
        match self {
            Self::Up => Self::Down,
            Self::Right => Self::Left,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
        }
    }
}

/// Applies `dir` to `coords`, returning a value only when the step stays inside
/// the `size × size` grid.
pub(crate) fn step(coords: Coord2, dir: Direction, size: Coord) -> Option<Coord2> {
    let (dx, dy) = dir.delta();

    let next_x = coords.0.checked_add_signed(dx)?;
    if next_x >= size {
        return None;
    }

    let next_y = coords.1.checked_add_signed(dy)?;
    if next_y >= size {
        return None;
    }

    Some((next_x, next_y))
}
