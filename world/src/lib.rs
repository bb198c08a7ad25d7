#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative hexagonal grid state.
//!
//! [`HexGrid`] owns the tile-id matrix, the memoized per-cell geometry and the
//! [`TileBindingRegistry`] that resolves tile identifiers to visuals. Runtime
//! queries are lenient: coordinates outside the grid yield `None` or are
//! ignored. Configuration is strict and reports a [`GridError`].

use std::cell::OnceCell;

use hexmap_core::{
    ConstantWeight, GridDimensions, HexCoord, HexShape, Heuristic, ImageRef, PixelRect,
    TileAttribute, TileId,
};
use thiserror::Error;
use tracing::{debug, warn};

pub mod bindings;
pub mod config;
pub mod layout;

pub use bindings::{BindingId, BindingVisual, TileBinding, TileBindingRegistry};
pub use config::{ConfigError, GridConfig};
pub use layout::{MapLoadError, TileLayout};

/// Cells added on each side of the visible window to cover hexagon overhang.
const VIEW_MARGIN: i64 = 1;
/// Extra cells spanned by a visible window beyond its whole-cell extent.
const VIEW_SLACK: i64 = 3;

static DEFAULT_HEURISTIC: ConstantWeight = ConstantWeight::DEFAULT;

/// Failure raised while configuring a grid or its bindings.
#[derive(Debug, Error)]
pub enum GridError {
    /// Grids need at least one column and one row.
    #[error("grid dimensions must be positive, got {columns}x{rows}")]
    InvalidDimensions {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// The hexagon dimensions cannot tile a grid.
    #[error("hexagon shape {shape:?} cannot tile a grid")]
    InvalidShape {
        /// Rejected shape.
        shape: HexShape,
    },
    /// Bindings were added after the grid was closed.
    #[error("tile bindings cannot be added after the grid was closed")]
    InactiveRegistry,
    /// A map could not be applied to the grid.
    #[error(transparent)]
    Layout(#[from] MapLoadError),
}

/// Contents of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    id: TileId,
    coord: HexCoord,
    attribute: Option<TileAttribute>,
}

impl Tile {
    /// Identifier selecting the binding the cell is drawn with.
    #[must_use]
    pub const fn id(&self) -> TileId {
        self.id
    }

    /// Position of the cell.
    #[must_use]
    pub const fn coord(&self) -> HexCoord {
        self.coord
    }

    /// Tag attached to the cell by the embedding game.
    #[must_use]
    pub const fn attribute(&self) -> Option<TileAttribute> {
        self.attribute
    }
}

/// Hexagonal grid of tiles.
#[derive(Debug)]
pub struct HexGrid {
    dimensions: GridDimensions,
    shape: HexShape,
    tiles: Vec<Tile>,
    cells: Vec<OnceCell<HexShape>>,
    forbidden: Vec<TileId>,
    heuristic: Option<Box<dyn Heuristic>>,
    bindings: TileBindingRegistry,
    revision: u64,
}

impl HexGrid {
    /// Creates a grid filled with tile identifier 0.
    pub fn new(dimensions: GridDimensions, shape: HexShape) -> Result<Self, GridError> {
        let mut grid = Self {
            dimensions: GridDimensions::new(0, 0),
            shape,
            tiles: Vec::new(),
            cells: Vec::new(),
            forbidden: Vec::new(),
            heuristic: None,
            bindings: TileBindingRegistry::new(),
            revision: 0,
        };
        grid.configure(dimensions, shape)?;
        Ok(grid)
    }

    /// Creates a grid sized and filled by `layout`.
    pub fn from_layout(layout: &TileLayout, shape: HexShape) -> Result<Self, GridError> {
        let mut grid = Self::new(layout.dimensions(), shape)?;
        grid.load_layout(layout)?;
        Ok(grid)
    }

    /// Reallocates the tile matrix and discards the cached cell geometry.
    ///
    /// Every cell is reset to tile identifier 0. Bindings, forbidden ids and
    /// the heuristic are kept.
    pub fn configure(&mut self, dimensions: GridDimensions, shape: HexShape) -> Result<(), GridError> {
        if dimensions.columns() == 0 || dimensions.rows() == 0 {
            return Err(GridError::InvalidDimensions {
                columns: dimensions.columns(),
                rows: dimensions.rows(),
            });
        }
        if !shape.is_valid() {
            return Err(GridError::InvalidShape { shape });
        }

        let capacity = dimensions.cell_count();
        let mut tiles = Vec::with_capacity(capacity);
        for row in 0..dimensions.rows() {
            for column in 0..dimensions.columns() {
                let coord = storage_coord(i64::from(column), i64::from(row));
                tiles.push(Tile {
                    id: TileId::default(),
                    coord,
                    attribute: None,
                });
            }
        }

        self.dimensions = dimensions;
        self.shape = shape;
        self.tiles = tiles;
        self.cells = std::iter::repeat_with(OnceCell::new).take(capacity).collect();
        self.touch();
        debug!(
            columns = dimensions.columns(),
            rows = dimensions.rows(),
            ?shape,
            "configured hex grid"
        );
        Ok(())
    }

    /// Dimensions of the grid.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// Shape of the cell at the grid origin.
    #[must_use]
    pub const fn shape(&self) -> HexShape {
        self.shape
    }

    /// Reports whether the coordinate addresses a cell inside the grid.
    #[must_use]
    pub fn contains(&self, coord: HexCoord) -> bool {
        self.dimensions.contains(coord)
    }

    /// Tile stored at `coord`, if the coordinate is inside the grid.
    #[must_use]
    pub fn get_tile(&self, coord: HexCoord) -> Option<&Tile> {
        self.dimensions
            .index_of(coord)
            .and_then(|index| self.tiles.get(index))
    }

    /// Stores `id` at `coord`.
    ///
    /// Coordinates outside the grid are ignored; callers are expected to check
    /// [`HexGrid::contains`] first.
    pub fn set_tile(&mut self, coord: HexCoord, id: TileId) {
        match self.tile_slot(coord) {
            Some(tile) => tile.id = id,
            None => {
                warn!(col = coord.col(), row = coord.row(), tile_id = id.get(), "set_tile outside the grid ignored");
                return;
            }
        }
        self.touch();
    }

    /// Attaches or clears the attribute of the tile at `coord`.
    ///
    /// Returns `false` when the coordinate lies outside the grid.
    pub fn set_attribute(&mut self, coord: HexCoord, attribute: Option<TileAttribute>) -> bool {
        let Some(tile) = self.tile_slot(coord) else {
            return false;
        };
        tile.attribute = attribute;
        self.touch();
        true
    }

    /// Advances the tile at `coord` to the next of `kinds` identifiers,
    /// wrapping back to 0 after the last one.
    ///
    /// Returns the updated tile, or `None` outside the grid or when `kinds` is
    /// zero.
    pub fn cycle_tile(&mut self, coord: HexCoord, kinds: u32) -> Option<Tile> {
        if kinds == 0 {
            return None;
        }
        let tile = self.tile_slot(coord)?;
        let next = tile.id.get().saturating_add(1);
        tile.id = TileId::new(if next < kinds { next } else { 0 });
        let updated = *tile;
        self.touch();
        debug!(col = coord.col(), row = coord.row(), tile_id = updated.id.get(), "cycled tile");
        Some(updated)
    }

    /// Cycles the tile under the map-space point `(x, y)`.
    ///
    /// See [`HexGrid::cycle_tile`]; clicks outside the grid change nothing.
    pub fn toggle_at(&mut self, x: f32, y: f32, kinds: u32) -> Option<Tile> {
        let coord = self.world_to_grid(x, y)?;
        self.cycle_tile(coord, kinds)
    }

    /// Stores `id` in every cell.
    pub fn fill_tiles(&mut self, id: TileId) {
        for tile in &mut self.tiles {
            tile.id = id;
        }
        self.touch();
    }

    /// Reconfigures the grid to the layout's dimensions and copies its ids.
    pub fn load_layout(&mut self, layout: &TileLayout) -> Result<(), GridError> {
        let dimensions = layout.dimensions();
        if dimensions != self.dimensions {
            self.configure(dimensions, self.shape)?;
        }
        for (row, ids) in layout.iter_rows().enumerate() {
            for (column, id) in ids.iter().enumerate() {
                let coord = storage_coord(column as i64, row as i64);
                if let Some(tile) = self.tile_slot(coord) {
                    tile.id = *id;
                }
            }
        }
        self.touch();
        debug!(
            columns = dimensions.columns(),
            rows = dimensions.rows(),
            "loaded tile layout"
        );
        Ok(())
    }

    /// Iterator over every tile in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Tiles whose cells may intersect the map-space rectangle `view`.
    ///
    /// The window is the block of storage columns and rows covering `view`,
    /// widened by a margin and clamped to the grid. Tiles are visited row by
    /// row. Each call computes the window afresh.
    #[must_use]
    pub fn all_tiles(&self, view: PixelRect) -> AllTiles<'_> {
        let width = i64::from(self.shape.width());
        let base = i64::from(self.shape.base_height());
        let columns = i64::from(self.dimensions.columns());
        let rows = i64::from(self.dimensions.rows());

        let first_column = ((i64::from(view.x) - i64::from(self.shape.origin_x())).div_euclid(width)
            - VIEW_MARGIN)
            .clamp(0, columns);
        let first_row = ((i64::from(view.y) - i64::from(self.shape.origin_y())).div_euclid(base)
            - VIEW_MARGIN)
            .clamp(0, rows);
        let span_columns = i64::from(view.width.max(0)) / width + VIEW_SLACK;
        let span_rows = i64::from(view.height.max(0)) / base + VIEW_SLACK;

        AllTiles {
            grid: self,
            first_column,
            end_column: (first_column + span_columns).min(columns),
            end_row: (first_row + span_rows).min(rows),
            column: first_column,
            row: first_row,
        }
    }

    /// Geometry of the cell at `coord`, computed once and memoized.
    #[must_use]
    pub fn cell_shape(&self, coord: HexCoord) -> Option<HexShape> {
        let index = self.dimensions.index_of(coord)?;
        let cell = self.cells.get(index)?;
        Some(*cell.get_or_init(|| self.shape.placed_at(coord)))
    }

    /// Bounding box of the cell at `coord`.
    #[must_use]
    pub fn cell_bounds(&self, coord: HexCoord) -> Option<PixelRect> {
        self.cell_shape(coord).map(|shape| shape.frame_rect())
    }

    /// Bounding box of the whole map in map pixels.
    #[must_use]
    pub fn pixel_bounds(&self) -> PixelRect {
        let columns = i32::try_from(self.dimensions.columns()).unwrap_or(i32::MAX);
        let rows = i32::try_from(self.dimensions.rows()).unwrap_or(i32::MAX);
        let mut width = columns.saturating_mul(self.shape.width());
        if rows > 1 {
            width = width.saturating_add(self.shape.start_width());
        }
        let height = rows
            .saturating_mul(self.shape.base_height())
            .saturating_add(self.shape.end_height());
        PixelRect::new(self.shape.origin_x(), self.shape.origin_y(), width, height)
    }

    /// Cell under the map-space point `(x, y)`.
    #[must_use]
    pub fn world_to_grid(&self, x: f32, y: f32) -> Option<HexCoord> {
        hexmap_core::world_to_grid(x, y, &self.shape, self.dimensions)
    }

    /// Tile under the map-space point `(x, y)`.
    #[must_use]
    pub fn pick(&self, x: f32, y: f32) -> Option<&Tile> {
        self.world_to_grid(x, y)
            .and_then(|coord| self.get_tile(coord))
    }

    /// Replaces the set of tile identifiers that block path search.
    pub fn set_forbidden<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = TileId>,
    {
        self.forbidden = ids.into_iter().collect();
        self.forbidden.sort_unstable();
        self.forbidden.dedup();
    }

    /// Tile identifiers that block path search.
    #[must_use]
    pub fn forbidden(&self) -> &[TileId] {
        &self.forbidden
    }

    /// Reports whether `id` blocks path search.
    #[must_use]
    pub fn is_forbidden(&self, id: TileId) -> bool {
        self.forbidden.binary_search(&id).is_ok()
    }

    /// Reports whether path search may enter the cell at `coord`.
    #[must_use]
    pub fn is_passable(&self, coord: HexCoord) -> bool {
        self.get_tile(coord)
            .is_some_and(|tile| !self.is_forbidden(tile.id))
    }

    /// Cost of stepping onto the cell at `coord`.
    ///
    /// Every step costs one plus the tile identifier. Cells outside the grid
    /// and forbidden cells have no cost because they cannot be entered.
    #[must_use]
    pub fn tile_cost(&self, coord: HexCoord) -> Option<u32> {
        let tile = self.get_tile(coord)?;
        if self.is_forbidden(tile.id) {
            return None;
        }
        Some(tile.id.get().saturating_add(1))
    }

    /// Overrides the heuristic used by path search on this grid.
    pub fn set_heuristic(&mut self, heuristic: Box<dyn Heuristic>) {
        self.heuristic = Some(heuristic);
    }

    /// Heuristic used by path search on this grid.
    #[must_use]
    pub fn heuristic(&self) -> &dyn Heuristic {
        match &self.heuristic {
            Some(heuristic) => heuristic.as_ref(),
            None => &DEFAULT_HEURISTIC,
        }
    }

    /// Weight the grid's heuristic applies between two cells.
    #[must_use]
    pub fn heuristic_weight(&self, from: HexCoord, to: HexCoord) -> f32 {
        self.heuristic().weight(from, to)
    }

    /// Content revision consumed by the render cache.
    ///
    /// Grows whenever tiles, geometry or bindings change.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision.wrapping_add(self.bindings.generation())
    }

    /// Registry resolving tile identifiers to visuals.
    #[must_use]
    pub const fn bindings(&self) -> &TileBindingRegistry {
        &self.bindings
    }

    /// Mutable access to the binding registry.
    pub fn bindings_mut(&mut self) -> &mut TileBindingRegistry {
        &mut self.bindings
    }

    /// Binding that draws the cell at `coord`.
    #[must_use]
    pub fn binding_at(&self, coord: HexCoord) -> Option<&TileBinding> {
        self.get_tile(coord)
            .and_then(|tile| self.bindings.binding_for(tile.id))
    }

    /// Whether the grid still accepts bindings.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.bindings.is_active()
    }

    /// Deactivates the grid, dropping bindings and cached geometry.
    ///
    /// Returns the outline images the registry generated so the owner can
    /// release them.
    pub fn close(&mut self) -> Vec<ImageRef> {
        for cell in &mut self.cells {
            let _ = cell.take();
        }
        let released = self.bindings.close();
        self.touch();
        debug!(released = released.len(), "closed hex grid");
        released
    }

    fn tile_slot(&mut self, coord: HexCoord) -> Option<&mut Tile> {
        let index = self.dimensions.index_of(coord)?;
        self.tiles.get_mut(index)
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

/// Cell produced while walking a visible window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileVisit<'a> {
    /// Position of the cell.
    pub coord: HexCoord,
    /// Contents of the cell.
    pub tile: &'a Tile,
}

/// Iterator returned by [`HexGrid::all_tiles`].
#[derive(Clone, Debug)]
pub struct AllTiles<'a> {
    grid: &'a HexGrid,
    first_column: i64,
    end_column: i64,
    end_row: i64,
    column: i64,
    row: i64,
}

impl<'a> Iterator for AllTiles<'a> {
    type Item = TileVisit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.first_column >= self.end_column {
            return None;
        }
        while self.row < self.end_row {
            if self.column >= self.end_column {
                self.column = self.first_column;
                self.row += 1;
                continue;
            }
            let coord = storage_coord(self.column, self.row);
            self.column += 1;
            if let Some(tile) = self.grid.get_tile(coord) {
                return Some(TileVisit { coord, tile });
            }
        }
        None
    }
}

/// Read-only helpers over a grid used by adapters.
pub mod query {
    use hexmap_core::{HexCoord, TileId};

    use super::{storage_coord, HexGrid};

    /// Tile identifiers laid out row by row in storage order.
    #[must_use]
    pub fn tile_matrix(grid: &HexGrid) -> Vec<Vec<TileId>> {
        let columns = i64::from(grid.dimensions().columns());
        (0..i64::from(grid.dimensions().rows()))
            .map(|row| {
                (0..columns)
                    .filter_map(|column| grid.get_tile(storage_coord(column, row)))
                    .map(|tile| tile.id())
                    .collect()
            })
            .collect()
    }

    /// Coordinates of every cell holding `id`, in storage order.
    #[must_use]
    pub fn cells_with_id(grid: &HexGrid, id: TileId) -> Vec<HexCoord> {
        grid.iter()
            .filter(|tile| tile.id() == id)
            .map(|tile| tile.coord())
            .collect()
    }
}

fn storage_coord(column: i64, row: i64) -> HexCoord {
    let column = i32::try_from(column).unwrap_or(i32::MAX);
    let row = i32::try_from(row).unwrap_or(i32::MAX);
    hexmap_core::GridIndex::new(column, row).to_coord()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexmap_core::GridIndex;

    const SHAPE: HexShape = HexShape::new(0, 0, 10, 10, 5);

    fn grid(columns: u32, rows: u32) -> HexGrid {
        HexGrid::new(GridDimensions::new(columns, rows), SHAPE).expect("valid grid")
    }

    #[test]
    fn configure_rejects_empty_dimensions() {
        assert!(matches!(
            HexGrid::new(GridDimensions::new(0, 4), SHAPE),
            Err(GridError::InvalidDimensions { columns: 0, rows: 4 })
        ));
        assert!(matches!(
            HexGrid::new(GridDimensions::new(3, 3), HexShape::new(0, 0, 0, 4, 4)),
            Err(GridError::InvalidShape { .. })
        ));
    }

    #[test]
    fn tiles_carry_their_coordinates() {
        let grid = grid(3, 4);
        assert_eq!(grid.iter().count(), 12);
        let coord = GridIndex::new(2, 3).to_coord();
        assert_eq!(grid.get_tile(coord).map(Tile::coord), Some(coord));
        assert_eq!(grid.get_tile(coord).map(Tile::id), Some(TileId::new(0)));
    }

    #[test]
    fn out_of_range_queries_are_lenient() {
        let mut grid = grid(3, 3);
        let outside = HexCoord::new(5, 5);
        let revision = grid.revision();

        assert!(grid.get_tile(outside).is_none());
        grid.set_tile(outside, TileId::new(4));
        assert_eq!(grid.revision(), revision);
        assert!(!grid.set_attribute(outside, Some(TileAttribute::new(1))));
        assert!(grid.cell_bounds(outside).is_none());
        assert!(grid.tile_cost(outside).is_none());
    }

    #[test]
    fn set_and_fill_bump_the_revision() {
        let mut grid = grid(3, 3);
        let start = grid.revision();
        grid.set_tile(HexCoord::new(1, 1), TileId::new(2));
        assert_eq!(grid.get_tile(HexCoord::new(1, 1)).map(Tile::id), Some(TileId::new(2)));
        assert!(grid.revision() > start);

        let before_fill = grid.revision();
        grid.fill_tiles(TileId::new(5));
        assert!(grid.iter().all(|tile| tile.id() == TileId::new(5)));
        assert!(grid.revision() > before_fill);

        let before_bind = grid.revision();
        let _ = grid
            .bindings_mut()
            .put_tile(TileId::new(5), ImageRef::new(1), None)
            .expect("active");
        assert!(grid.revision() > before_bind);
        assert_eq!(
            grid.binding_at(HexCoord::new(0, 0)).and_then(TileBinding::image),
            Some(ImageRef::new(1))
        );
    }

    #[test]
    fn attributes_are_stored_per_cell() {
        let mut grid = grid(2, 2);
        assert!(grid.set_attribute(HexCoord::new(0, 1), Some(TileAttribute::new(3))));
        assert_eq!(
            grid.get_tile(HexCoord::new(0, 1)).and_then(Tile::attribute),
            Some(TileAttribute::new(3))
        );
        assert_eq!(grid.get_tile(HexCoord::new(0, 0)).and_then(Tile::attribute), None);
    }

    #[test]
    fn cell_bounds_follow_the_placement_formula() {
        let grid = grid(4, 4);
        assert_eq!(
            grid.cell_bounds(GridIndex::new(1, 1).to_coord()),
            Some(PixelRect::new(30, 15, 20, 20))
        );
        assert_eq!(
            grid.cell_bounds(GridIndex::new(3, 2).to_coord()),
            Some(PixelRect::new(60, 30, 20, 20))
        );
    }

    #[test]
    fn configure_discards_cached_geometry() {
        let mut grid = grid(2, 2);
        let coord = HexCoord::new(1, 0);
        assert_eq!(grid.cell_bounds(coord), Some(PixelRect::new(20, 0, 20, 20)));

        grid.configure(GridDimensions::new(2, 2), HexShape::new(5, 5, 8, 8, 4))
            .expect("valid shape");
        assert_eq!(grid.cell_bounds(coord), Some(PixelRect::new(21, 5, 16, 16)));
    }

    #[test]
    fn pixel_bounds_include_the_odd_row_shift() {
        assert_eq!(grid(4, 3).pixel_bounds(), PixelRect::new(0, 0, 90, 50));
        assert_eq!(grid(4, 1).pixel_bounds(), PixelRect::new(0, 0, 80, 20));
    }

    #[test]
    fn pick_resolves_clicks_inside_the_grid() {
        let mut grid = grid(3, 3);
        let coord = GridIndex::new(1, 1).to_coord();
        grid.set_tile(coord, TileId::new(7));
        assert_eq!(grid.pick(40.0, 25.0).map(Tile::id), Some(TileId::new(7)));
        assert!(grid.pick(-5.0, 25.0).is_none());
    }

    #[test]
    fn clicking_cycles_through_tile_kinds() {
        let mut grid = grid(3, 3);
        let before = grid.revision();
        let cell = GridIndex::new(1, 1).to_coord();

        let ids: Vec<u32> = (0..4)
            .filter_map(|_| grid.toggle_at(40.0, 25.0, 3))
            .map(|tile| tile.id().get())
            .collect();
        assert_eq!(ids, vec![1, 2, 0, 1]);
        assert_eq!(grid.get_tile(cell).map(Tile::id), Some(TileId::new(1)));
        assert_eq!(grid.revision(), before + 4);

        grid.set_tile(cell, TileId::new(9));
        assert_eq!(grid.cycle_tile(cell, 3).map(|tile| tile.id()), Some(TileId::new(0)));
        assert!(grid.cycle_tile(cell, 0).is_none());
        assert!(grid.toggle_at(-50.0, 25.0, 3).is_none());
        assert!(grid.toggle_at(f32::NAN, 25.0, 3).is_none());
    }

    #[test]
    fn far_off_and_non_finite_clicks_miss_the_grid() {
        let grid = grid(3, 3);
        assert!(grid.pick(-1.0e11, 1.0).is_none());
        assert!(grid.pick(1.0, 3.0e10).is_none());
        assert!(grid.pick(f32::NAN, f32::NAN).is_none());
        assert!(grid.pick(f32::INFINITY, 10.0).is_none());
        assert_eq!(grid.world_to_grid(f32::MIN, f32::MAX), None);
    }

    #[test]
    fn view_window_is_clamped_to_the_grid() {
        let grid = grid(20, 20);
        let visited: Vec<_> = grid
            .all_tiles(PixelRect::new(0, 0, 40, 30))
            .map(|visit| visit.coord.to_grid_index())
            .collect();
        assert_eq!(visited.len(), 25);
        assert_eq!(visited.first(), Some(&GridIndex::new(0, 0)));
        assert_eq!(visited.last(), Some(&GridIndex::new(4, 4)));
        assert!(visited.windows(2).all(|pair| pair[0].row() <= pair[1].row()));
    }

    #[test]
    fn view_window_starts_one_cell_before_the_view() {
        let grid = grid(20, 20);
        let visited: Vec<_> = grid
            .all_tiles(PixelRect::new(100, 90, 20, 15))
            .map(|visit| visit.coord.to_grid_index())
            .collect();
        assert_eq!(visited.first(), Some(&GridIndex::new(4, 5)));
        assert_eq!(visited.last(), Some(&GridIndex::new(7, 8)));
        assert_eq!(visited.len(), 16);
    }

    #[test]
    fn view_outside_the_grid_visits_nothing() {
        let grid = grid(4, 4);
        assert_eq!(grid.all_tiles(PixelRect::new(1000, 0, 50, 50)).count(), 0);
        assert_eq!(grid.all_tiles(PixelRect::new(0, 1000, 50, 50)).count(), 0);
        assert_eq!(grid.all_tiles(PixelRect::new(-500, -500, 10_000, 10_000)).count(), 16);
    }

    #[test]
    fn all_tiles_is_restartable() {
        let grid = grid(6, 6);
        let view = PixelRect::new(10, 10, 50, 40);
        let first: Vec<_> = grid.all_tiles(view).map(|visit| visit.coord).collect();
        let second: Vec<_> = grid.all_tiles(view).map(|visit| visit.coord).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn forbidden_ids_have_no_cost() {
        let mut grid = grid(3, 3);
        grid.set_tile(HexCoord::new(1, 1), TileId::new(9));
        grid.set_tile(HexCoord::new(0, 1), TileId::new(4));
        grid.set_forbidden([TileId::new(9), TileId::new(9)]);

        assert_eq!(grid.forbidden(), &[TileId::new(9)]);
        assert!(!grid.is_passable(HexCoord::new(1, 1)));
        assert_eq!(grid.tile_cost(HexCoord::new(1, 1)), None);
        assert_eq!(grid.tile_cost(HexCoord::new(0, 1)), Some(5));
        assert_eq!(grid.tile_cost(HexCoord::new(0, 0)), Some(1));
    }

    #[test]
    fn default_heuristic_weight_is_ten() {
        let mut grid = grid(2, 2);
        let weight = grid.heuristic_weight(HexCoord::new(0, 0), HexCoord::new(1, 1));
        assert!((weight - 10.0).abs() < f32::EPSILON);

        grid.set_heuristic(Box::new(ConstantWeight(1.0)));
        let weight = grid.heuristic_weight(HexCoord::new(0, 0), HexCoord::new(1, 1));
        assert!((weight - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn close_releases_outlines_and_rejects_bindings() {
        let mut grid = grid(2, 2);
        let outline = grid
            .bindings_mut()
            .outline_for(&SHAPE, |_| ImageRef::new(42));
        assert_eq!(outline, Some(ImageRef::new(42)));

        assert_eq!(grid.close(), vec![ImageRef::new(42)]);
        assert!(!grid.is_active());
        assert!(matches!(
            grid.bindings_mut().put_tile(TileId::new(0), ImageRef::new(0), None),
            Err(GridError::InactiveRegistry)
        ));
        assert!(grid.close().is_empty());
    }

    #[test]
    fn query_reports_the_matrix_in_storage_order() {
        let mut grid = grid(3, 2);
        grid.set_tile(GridIndex::new(2, 1).to_coord(), TileId::new(8));
        assert_eq!(
            query::tile_matrix(&grid),
            vec![
                vec![TileId::new(0), TileId::new(0), TileId::new(0)],
                vec![TileId::new(0), TileId::new(0), TileId::new(8)],
            ]
        );
        assert_eq!(
            query::cells_with_id(&grid, TileId::new(8)),
            vec![GridIndex::new(2, 1).to_coord()]
        );
    }
}
