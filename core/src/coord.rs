//! Grid coordinates and the stateless neighbourhood math built on them.

use serde::{Deserialize, Serialize};

/// Location of a single hexagonal cell expressed as column and row.
///
/// Neighbour, distance and orientation math operate on this coordinate. Odd
/// rows are shifted half a cell to the right when placed in pixel space, so the
/// storage column of a cell differs from `col`; see [`HexCoord::to_grid_index`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HexCoord {
    col: i32,
    row: i32,
}

impl HexCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Column of the cell.
    #[must_use]
    pub const fn col(&self) -> i32 {
        self.col
    }

    /// Row of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Converts the coordinate into the compact index used for tile storage.
    ///
    /// Columns saturate at the `i32` limits, which lie outside every grid.
    #[must_use]
    pub const fn to_grid_index(self) -> GridIndex {
        GridIndex::new(self.col.saturating_add(self.row >> 1), self.row)
    }

    /// Number of single steps separating two cells.
    ///
    /// When the column and row deltas share a sign the steps add up, otherwise
    /// the diagonal neighbours let the shorter axis ride along with the longer.
    #[must_use]
    pub fn distance(self, other: HexCoord) -> u32 {
        let delta_col = other.col - self.col;
        let delta_row = other.row - self.row;
        let span_col = delta_col.unsigned_abs();
        let span_row = delta_row.unsigned_abs();

        if delta_col.signum() == delta_row.signum() {
            span_col + span_row
        } else {
            span_col.max(span_row)
        }
    }

    /// Classifies `other` relative to `self`.
    #[must_use]
    pub fn orientation(self, other: HexCoord) -> Direction {
        let col_sign = (other.col - self.col).signum();
        let row_sign = (other.row - self.row).signum();
        ORIENTATION_TABLE[(row_sign + 1) as usize][(col_sign + 1) as usize]
    }

    /// The six cells sharing an edge with this one.
    ///
    /// Neighbours are produced in a fixed order: left, up-left, up-right,
    /// right, down-right, down-left.
    #[must_use]
    pub fn adjacent(self) -> [HexCoord; 6] {
        Direction::MOVES.map(|direction| self.neighbor(direction))
    }

    /// Cell reached by stepping once in `direction`.
    ///
    /// [`Direction::None`] yields the coordinate itself.
    #[must_use]
    pub const fn neighbor(self, direction: Direction) -> HexCoord {
        let (delta_col, delta_row) = direction.offset();
        HexCoord::new(self.col + delta_col, self.row + delta_row)
    }

    /// Cells on the straight line between two coordinates, both ends included.
    ///
    /// Only the three hex axes form straight lines; any other pair yields
    /// `None`.
    #[must_use]
    pub fn line_to(self, end: HexCoord) -> Option<Vec<HexCoord>> {
        let delta_col = end.col - self.col;
        let delta_row = end.row - self.row;

        if delta_col != 0 && delta_row != 0 && delta_col != -delta_row {
            return None;
        }

        let length = delta_col.abs().max(delta_row.abs());
        if length == 0 {
            return Some(vec![self]);
        }

        let step_col = delta_col / length;
        let step_row = delta_row / length;
        Some(
            (0..=length)
                .map(|step| HexCoord::new(self.col + step_col * step, self.row + step_row * step))
                .collect(),
        )
    }

    /// All cells whose distance from this coordinate is at most `radius`.
    ///
    /// Cells are listed row by row from the top.
    #[must_use]
    pub fn circle(self, radius: u32) -> Vec<HexCoord> {
        let radius = i32::try_from(radius).unwrap_or(i32::MAX / 4);
        let mut cells = Vec::new();
        for row in -radius..=radius {
            let (first, last) = if row < 0 {
                (-radius - row, radius)
            } else {
                (-radius, radius - row)
            };
            for col in first..=last {
                cells.push(HexCoord::new(self.col + col, self.row + row));
            }
        }
        cells
    }
}

/// Compact storage index of a cell.
///
/// Derived from a [`HexCoord`] by `column = col + (row >> 1)`, which turns the
/// slanted grid into a dense rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridIndex {
    column: i32,
    row: i32,
}

impl GridIndex {
    /// Creates a new storage index.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Storage column.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Storage row, identical to the coordinate row.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Converts the storage index back into a grid coordinate.
    ///
    /// Columns saturate at the `i32` limits; see [`GridIndex::checked_to_coord`].
    #[must_use]
    pub const fn to_coord(self) -> HexCoord {
        HexCoord::new(self.column.saturating_sub(self.row >> 1), self.row)
    }

    /// Converts the storage index back into a grid coordinate, or `None` when
    /// the column would leave the `i32` range.
    #[must_use]
    pub const fn checked_to_coord(self) -> Option<HexCoord> {
        match self.column.checked_sub(self.row >> 1) {
            Some(col) => Some(HexCoord::new(col, self.row)),
            None => None,
        }
    }
}

/// Relative orientation between two cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Same row, lower column.
    Left,
    /// Next row, lower column.
    DownLeft,
    /// Previous row, same column.
    UpLeft,
    /// Same cell.
    None,
    /// Next row, same column.
    DownRight,
    /// Previous row, higher column.
    UpRight,
    /// Same row, higher column.
    Right,
}

impl Direction {
    /// The six movement directions in neighbour order.
    pub const MOVES: [Direction; 6] = [
        Direction::Left,
        Direction::UpLeft,
        Direction::UpRight,
        Direction::Right,
        Direction::DownRight,
        Direction::DownLeft,
    ];

    /// Column and row delta applied by a single step.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::Left => (-1, 0),
            Self::DownLeft => (-1, 1),
            Self::UpLeft => (0, -1),
            Self::None => (0, 0),
            Self::DownRight => (0, 1),
            Self::UpRight => (1, -1),
            Self::Right => (1, 0),
        }
    }
}

// Indexed by [sign(row delta) + 1][sign(col delta) + 1].
const ORIENTATION_TABLE: [[Direction; 3]; 3] = [
    [Direction::Left, Direction::UpLeft, Direction::UpRight],
    [Direction::Left, Direction::None, Direction::Right],
    [Direction::DownLeft, Direction::DownRight, Direction::Right],
];
