#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the hexmap engine.
//!
//! This crate owns the pure, stateless pieces of the engine: grid coordinates
//! and their neighbourhood math, the pixel geometry of a hexagonal cell, and the
//! small value types that the world, the systems and the adapters exchange.
//! Nothing in here allocates long-lived state or touches a renderer, so every
//! function can be exercised headlessly and deterministically.

use std::fmt;

use serde::{Deserialize, Serialize};

mod coord;
mod shape;

pub use coord::{Direction, GridIndex, HexCoord};
pub use shape::{world_to_grid, HexShape};

/// Integer position in map-space pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPoint {
    /// Horizontal component.
    pub x: i32,
    /// Vertical component.
    pub y: i32,
}

impl PixelPoint {
    /// Creates a new pixel position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle expressed in map-space pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Horizontal extent.
    pub width: i32,
    /// Vertical extent.
    pub height: i32,
}

impl PixelRect {
    /// Creates a new rectangle from its top-left corner and extents.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Reports whether the two rectangles overlap by a positive area.
    #[must_use]
    pub const fn intersects(&self, other: &PixelRect) -> bool {
        self.width > 0
            && self.height > 0
            && other.width > 0
            && other.height > 0
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Returns the rectangle moved by the provided offset.
    #[must_use]
    pub const fn translate(&self, offset: PixelPoint) -> PixelRect {
        PixelRect::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }
}

/// Dimensions of a grid measured in storage columns and rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDimensions {
    columns: u32,
    rows: u32,
}

impl GridDimensions {
    /// Creates a new dimension descriptor.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of storage columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let count = u64::from(self.columns) * u64::from(self.rows);
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    /// Reports whether the coordinate addresses a cell inside the grid.
    #[must_use]
    pub fn contains(&self, coord: HexCoord) -> bool {
        self.index_of(coord).is_some()
    }

    /// Dense row-major offset of the cell, if it lies inside the grid.
    #[must_use]
    pub fn index_of(&self, coord: HexCoord) -> Option<usize> {
        let index = coord.to_grid_index();
        let column = u32::try_from(index.column()).ok()?;
        let row = u32::try_from(index.row()).ok()?;
        if column >= self.columns || row >= self.rows {
            return None;
        }
        let offset = u64::from(row) * u64::from(self.columns) + u64::from(column);
        usize::try_from(offset).ok()
    }
}

/// Small integer selecting the binding a cell is drawn with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(u32);

impl TileId {
    /// Creates a new tile identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Numeric value of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque tag attached to tiles and bindings by the embedding game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileAttribute(u32);

impl TileAttribute {
    /// Creates a new attribute tag.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Numeric value of the tag.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Handle to a packed image owned by the renderer's atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageRef(u32);

impl ImageRef {
    /// Creates a new image handle.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Numeric value of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Handle to an animation owned by the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnimationRef(u32);

impl AnimationRef {
    /// Creates a new animation handle.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Numeric value of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Weighting applied to the remaining distance during path search.
///
/// The estimate for a node is `distance(node, goal) * weight(node, goal)`.
/// Nothing enforces admissibility: a weight that overestimates the true
/// remaining cost speeds the search up at the expense of optimal paths.
pub trait Heuristic: fmt::Debug {
    /// Multiplier applied to the hex distance between `from` and `to`.
    fn weight(&self, from: HexCoord, to: HexCoord) -> f32;
}

/// Heuristic that applies the same weight everywhere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantWeight(pub f32);

impl ConstantWeight {
    /// Weight used when a grid does not configure its own heuristic.
    pub const DEFAULT: ConstantWeight = ConstantWeight(10.0);
}

impl Default for ConstantWeight {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Heuristic for ConstantWeight {
    fn weight(&self, _from: HexCoord, _to: HexCoord) -> f32 {
        self.0
    }
}
