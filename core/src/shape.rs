//! Pixel geometry of a single hexagonal cell and its inverse mapping.

use serde::{Deserialize, Serialize};

use crate::{GridDimensions, GridIndex, HexCoord, PixelPoint, PixelRect};

/// Immutable descriptor of a pointy-top hexagon.
///
/// `start_width` is half the hexagon's width, `mid_height` the length of its
/// vertical sides and `end_height` the height of each slanted cap. The origin
/// is the top-left corner of the bounding box. Every cell of a grid shares the
/// same dimensions; only the origin moves from cell to cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexShape {
    origin_x: i32,
    origin_y: i32,
    start_width: i32,
    mid_height: i32,
    end_height: i32,
}

impl HexShape {
    /// Creates a new shape descriptor.
    #[must_use]
    pub const fn new(
        origin_x: i32,
        origin_y: i32,
        start_width: i32,
        mid_height: i32,
        end_height: i32,
    ) -> Self {
        Self {
            origin_x,
            origin_y,
            start_width,
            mid_height,
            end_height,
        }
    }

    /// Horizontal position of the bounding box.
    #[must_use]
    pub const fn origin_x(&self) -> i32 {
        self.origin_x
    }

    /// Vertical position of the bounding box.
    #[must_use]
    pub const fn origin_y(&self) -> i32 {
        self.origin_y
    }

    /// Half of the hexagon's full width.
    #[must_use]
    pub const fn start_width(&self) -> i32 {
        self.start_width
    }

    /// Length of the vertical sides.
    #[must_use]
    pub const fn mid_height(&self) -> i32 {
        self.mid_height
    }

    /// Height of the top and bottom caps.
    #[must_use]
    pub const fn end_height(&self) -> i32 {
        self.end_height
    }

    /// Full width of the hexagon.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.start_width * 2
    }

    /// Full height of the hexagon, caps included.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.mid_height + self.end_height * 2
    }

    /// Vertical distance between two consecutive rows.
    #[must_use]
    pub const fn base_height(&self) -> i32 {
        self.mid_height + self.end_height
    }

    /// Whether the dimensions describe a drawable hexagon.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.start_width > 0 && self.mid_height >= 0 && self.end_height >= 0 && self.base_height() > 0
    }

    /// Bounding box of the hexagon.
    #[must_use]
    pub const fn frame_rect(&self) -> PixelRect {
        PixelRect::new(self.origin_x, self.origin_y, self.width(), self.height())
    }

    /// Centre of the bounding box, rounded down.
    #[must_use]
    pub const fn center(&self) -> PixelPoint {
        PixelPoint::new(
            self.origin_x + self.start_width,
            self.origin_y + self.height() / 2,
        )
    }

    /// Outline vertices, clockwise from the top.
    #[must_use]
    pub const fn polygon(&self) -> [PixelPoint; 6] {
        let left = self.origin_x;
        let middle = self.origin_x + self.start_width;
        let right = self.origin_x + self.width();
        let top = self.origin_y;
        let upper = self.origin_y + self.end_height;
        let lower = self.origin_y + self.base_height();
        let bottom = self.origin_y + self.height();
        [
            PixelPoint::new(middle, top),
            PixelPoint::new(right, upper),
            PixelPoint::new(right, lower),
            PixelPoint::new(middle, bottom),
            PixelPoint::new(left, lower),
            PixelPoint::new(left, upper),
        ]
    }

    /// Shape of the cell at `coord` when this shape describes the grid origin.
    #[must_use]
    pub const fn placed_at(&self, coord: HexCoord) -> HexShape {
        HexShape::new(
            coord.col() * self.width() + coord.row() * self.start_width + self.origin_x,
            coord.row() * self.base_height() + self.origin_y,
            self.start_width,
            self.mid_height,
            self.end_height,
        )
    }

    /// Cell containing the map-space point `(x, y)`, ignoring grid bounds.
    ///
    /// The plane is cut into blocks one hexagon wide and one row tall. Within a
    /// block only the top `end_height` band is ambiguous: there the slanted caps
    /// of two rows interlock, and the cap edge decides. A point lying exactly on
    /// a cap edge belongs to the lower row; a point on a vertical edge belongs to
    /// the cell on its right.
    ///
    /// Returns `None` for non-finite input, for an invalid shape and for points
    /// whose cell would not fit the `i32` coordinate range.
    #[must_use]
    pub fn locate(&self, x: f32, y: f32) -> Option<HexCoord> {
        if !self.is_valid() {
            return None;
        }
        let block_width = self.width() as f32;
        let block_height = self.base_height() as f32;
        let half_width = self.start_width as f32;
        let cap = self.end_height as f32;

        let local_x = x - self.origin_x as f32;
        let local_y = y - self.origin_y as f32;
        if !local_x.is_finite() || !local_y.is_finite() {
            return None;
        }
        let x_floor = (local_x / block_width).floor();
        let y_floor = (local_y / block_height).floor();
        let x_rem = local_x - x_floor * block_width;
        let y_rem = local_y - y_floor * block_height;
        let x_block = block_index(x_floor)?;
        let y_block = block_index(y_floor)?;

        let rise = cap / half_width * x_rem;
        let left = x_block.checked_sub(1);
        let above = y_block.checked_sub(1);

        let (column, row) = if y_block & 1 == 0 {
            if y_rem < cap - rise {
                (left?, above?)
            } else if y_rem < rise - cap {
                (x_block, above?)
            } else {
                (x_block, y_block)
            }
        } else if x_rem < half_width {
            if y_rem < rise {
                (x_block, above?)
            } else {
                (left?, y_block)
            }
        } else if y_rem < cap + cap - rise {
            (x_block, above?)
        } else {
            (x_block, y_block)
        };

        GridIndex::new(column, row).checked_to_coord()
    }
}

/// Whole block number as an `i32`, if it fits.
fn block_index(block: f32) -> Option<i32> {
    // `i32::MAX as f32` rounds up to 2^31, which is itself out of range.
    (block >= i32::MIN as f32 && block < i32::MAX as f32).then(|| block as i32)
}

/// Cell containing the map-space point `(x, y)`, if it lies within the grid.
#[must_use]
pub fn world_to_grid(x: f32, y: f32, shape: &HexShape, dimensions: GridDimensions) -> Option<HexCoord> {
    let coord = shape.locate(x, y)?;
    dimensions.contains(coord).then_some(coord)
}
