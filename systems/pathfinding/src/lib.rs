#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Best-effort A* search over a hexagonal grid.
//!
//! Searches are stateless: every call allocates its own open and closed sets
//! and returns a freshly owned [`Path`]. Edges follow the six adjacency
//! directions, stepping onto a cell costs one plus its tile identifier, and
//! forbidden identifiers are never expanded.

use std::{
    cmp::Reverse,
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicBool, Ordering},
};

use hexmap_core::{HexCoord, Heuristic};
use hexmap_world::HexGrid;
use priority_queue::PriorityQueue;
use tracing::{debug, trace};

/// Ordered cells from a start cell to an accepted goal cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    positions: Vec<HexCoord>,
    cost: u32,
}

impl Path {
    /// Cells visited by the path, start first.
    #[must_use]
    pub fn positions(&self) -> &[HexCoord] {
        &self.positions
    }

    /// Accumulated step cost of the path.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// First cell of the path.
    #[must_use]
    pub fn start(&self) -> Option<HexCoord> {
        self.positions.first().copied()
    }

    /// Last cell of the path.
    #[must_use]
    pub fn end(&self) -> Option<HexCoord> {
        self.positions.last().copied()
    }

    /// Number of steps taken, excluding the start cell.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.positions.len().saturating_sub(1)
    }

    /// Consumes the path, returning its cells.
    #[must_use]
    pub fn into_positions(self) -> Vec<HexCoord> {
        self.positions
    }
}

/// Result of a search that may be interrupted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A cell within the goal radius was reached.
    Found(Path),
    /// Every reachable cell was expanded without meeting the goal test.
    NoPath,
    /// The cancellation flag was raised before the search finished.
    Cancelled,
}

impl SearchOutcome {
    /// Path carried by a successful outcome.
    #[must_use]
    pub fn into_path(self) -> Option<Path> {
        match self {
            Self::Found(path) => Some(path),
            Self::NoPath | Self::Cancelled => None,
        }
    }
}

/// Finds a path from `start` to any cell within `end_radius` of `end`.
///
/// Uses the heuristic configured on the grid.
#[must_use]
pub fn find_path(grid: &HexGrid, start: HexCoord, end: HexCoord, end_radius: u32) -> Option<Path> {
    find_path_with(grid, start, end, end_radius, grid.heuristic())
}

/// Finds a path using an explicit heuristic instead of the grid's own.
#[must_use]
pub fn find_path_with(
    grid: &HexGrid,
    start: HexCoord,
    end: HexCoord,
    end_radius: u32,
    heuristic: &dyn Heuristic,
) -> Option<Path> {
    search(grid, start, end, end_radius, heuristic, None).into_path()
}

/// Finds a path, checking `cancel` before every node expansion.
#[must_use]
pub fn find_path_cancellable(
    grid: &HexGrid,
    start: HexCoord,
    end: HexCoord,
    end_radius: u32,
    cancel: &AtomicBool,
) -> SearchOutcome {
    search(grid, start, end, end_radius, grid.heuristic(), Some(cancel))
}

/// Straight move from `start` to `end` along one of the three hex axes.
///
/// Returns `None` when the cells are not aligned, when either lies outside
/// the grid, or when a cell after `start` cannot be entered.
#[must_use]
pub fn line_path(grid: &HexGrid, start: HexCoord, end: HexCoord) -> Option<Path> {
    if !grid.contains(start) {
        return None;
    }
    let positions = start.line_to(end)?;
    let cost = positions
        .iter()
        .skip(1)
        .try_fold(0u32, |total, cell| Some(total.saturating_add(grid.tile_cost(*cell)?)))?;
    Some(Path { positions, cost })
}

/// Finds a path from `start` to the cell under the map-space point `(x, y)`.
///
/// Points outside the grid yield `None`.
#[must_use]
pub fn find_path_to_point(
    grid: &HexGrid,
    start: HexCoord,
    x: f32,
    y: f32,
    end_radius: u32,
) -> Option<Path> {
    let end = grid.world_to_grid(x, y)?;
    find_path(grid, start, end, end_radius)
}

/// Straight move from `start` to the cell under the map-space point `(x, y)`.
///
/// See [`line_path`].
#[must_use]
pub fn line_path_to_point(grid: &HexGrid, start: HexCoord, x: f32, y: f32) -> Option<Path> {
    let end = grid.world_to_grid(x, y)?;
    line_path(grid, start, end)
}

// Min-heap ordering: lowest f first, then lowest h, then insertion order.
type Priority = Reverse<(u32, u32, u64)>;

#[derive(Clone, Copy, Debug)]
struct NodeRecord {
    g: u32,
    h: u32,
    seq: u64,
    parent: Option<HexCoord>,
}

fn search(
    grid: &HexGrid,
    start: HexCoord,
    end: HexCoord,
    end_radius: u32,
    heuristic: &dyn Heuristic,
    cancel: Option<&AtomicBool>,
) -> SearchOutcome {
    if !grid.contains(start) {
        debug!(?start, "path search started outside the grid");
        return SearchOutcome::NoPath;
    }

    let mut open: PriorityQueue<HexCoord, Priority> = PriorityQueue::new();
    let mut closed: HashSet<HexCoord> = HashSet::new();
    let mut records: HashMap<HexCoord, NodeRecord> = HashMap::new();
    let mut next_seq: u64 = 0;
    let mut expanded: usize = 0;

    let start_h = estimate(heuristic, start, end);
    let _ = records.insert(
        start,
        NodeRecord {
            g: 0,
            h: start_h,
            seq: next_seq,
            parent: None,
        },
    );
    let _ = open.push(start, Reverse((start_h, start_h, next_seq)));
    next_seq += 1;

    loop {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            debug!(expanded, "path search cancelled");
            return SearchOutcome::Cancelled;
        }

        let Some((current, _)) = open.pop() else {
            debug!(?start, ?end, end_radius, expanded, "no path found");
            return SearchOutcome::NoPath;
        };
        let _ = closed.insert(current);
        expanded += 1;

        let Some(current_g) = records.get(&current).map(|record| record.g) else {
            continue;
        };

        if current.distance(end) <= end_radius {
            let path = reconstruct(&records, current, current_g);
            debug!(
                ?start,
                ?end,
                end_radius,
                cost = path.cost,
                steps = path.steps(),
                expanded,
                "path found"
            );
            return SearchOutcome::Found(path);
        }

        for neighbor in current.adjacent() {
            if closed.contains(&neighbor) {
                continue;
            }
            let Some(step) = grid.tile_cost(neighbor) else {
                continue;
            };
            let g = current_g.saturating_add(step);

            match records.get_mut(&neighbor) {
                Some(record) if g >= record.g => {}
                Some(record) => {
                    record.g = g;
                    record.parent = Some(current);
                    let priority = Reverse((g.saturating_add(record.h), record.h, record.seq));
                    let _ = open.change_priority(&neighbor, priority);
                    trace!(?neighbor, g, "improved open node");
                }
                None => {
                    let h = estimate(heuristic, neighbor, end);
                    let _ = records.insert(
                        neighbor,
                        NodeRecord {
                            g,
                            h,
                            seq: next_seq,
                            parent: Some(current),
                        },
                    );
                    let _ = open.push(neighbor, Reverse((g.saturating_add(h), h, next_seq)));
                    next_seq += 1;
                }
            }
        }
    }
}

fn estimate(heuristic: &dyn Heuristic, from: HexCoord, to: HexCoord) -> u32 {
    let distance = from.distance(to) as f32;
    (distance * heuristic.weight(from, to)) as u32
}

fn reconstruct(records: &HashMap<HexCoord, NodeRecord>, goal: HexCoord, cost: u32) -> Path {
    let mut positions = vec![goal];
    let mut cursor = records.get(&goal).and_then(|record| record.parent);
    while let Some(cell) = cursor {
        positions.push(cell);
        cursor = records.get(&cell).and_then(|record| record.parent);
    }
    positions.reverse();
    Path { positions, cost }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexmap_core::{ConstantWeight, GridDimensions, GridIndex, HexShape, TileId};

    const SHAPE: HexShape = HexShape::new(0, 0, 10, 10, 5);

    fn open_grid(columns: u32, rows: u32) -> HexGrid {
        HexGrid::new(GridDimensions::new(columns, rows), SHAPE).expect("valid grid")
    }

    fn at(column: i32, row: i32) -> HexCoord {
        GridIndex::new(column, row).to_coord()
    }

    #[test]
    fn start_inside_radius_yields_single_cell_path() {
        let grid = open_grid(4, 4);
        let path = find_path(&grid, at(1, 1), at(1, 1), 0).expect("path");
        assert_eq!(path.positions(), &[at(1, 1)]);
        assert_eq!(path.cost(), 0);
        assert_eq!(path.steps(), 0);
    }

    #[test]
    fn neighbours_are_one_step_apart() {
        let grid = open_grid(5, 5);
        let start = at(2, 2);
        for neighbour in start.adjacent() {
            let path = find_path(&grid, start, neighbour, 0).expect("path");
            assert_eq!(path.positions(), &[start, neighbour]);
            assert_eq!(path.cost(), 1);
        }
    }

    #[test]
    fn tile_ids_add_to_the_step_cost() {
        let mut grid = open_grid(3, 1);
        grid.set_tile(at(1, 0), TileId::new(4));
        let path = find_path(&grid, at(0, 0), at(2, 0), 0).expect("path");
        assert_eq!(path.positions(), &[at(0, 0), at(1, 0), at(2, 0)]);
        assert_eq!(path.cost(), 5 + 1);
    }

    #[test]
    fn start_outside_the_grid_has_no_path() {
        let grid = open_grid(3, 3);
        assert!(find_path(&grid, HexCoord::new(-5, 0), at(1, 1), 0).is_none());
    }

    #[test]
    fn unreachable_goal_exhausts_the_open_set() {
        let mut grid = open_grid(3, 1);
        grid.set_tile(at(1, 0), TileId::new(9));
        grid.set_forbidden([TileId::new(9)]);
        assert_eq!(
            find_path_cancellable(&grid, at(0, 0), at(2, 0), 0, &AtomicBool::new(false)),
            SearchOutcome::NoPath
        );
    }

    #[test]
    fn raised_flag_cancels_before_expansion() {
        let grid = open_grid(6, 6);
        let cancel = AtomicBool::new(true);
        assert_eq!(
            find_path_cancellable(&grid, at(0, 0), at(5, 5), 0, &cancel),
            SearchOutcome::Cancelled
        );
    }

    #[test]
    fn explicit_heuristic_overrides_the_grid() {
        let grid = open_grid(8, 8);
        let dijkstra = find_path_with(&grid, at(0, 0), at(7, 7), 0, &ConstantWeight(0.0)).expect("path");
        let greedy = find_path(&grid, at(0, 0), at(7, 7), 0).expect("path");
        assert_eq!(dijkstra.cost(), at(0, 0).distance(at(7, 7)));
        assert_eq!(greedy.cost(), dijkstra.cost());
    }

    #[test]
    fn line_path_follows_axes_and_respects_walls() {
        let mut grid = open_grid(5, 1);
        let path = line_path(&grid, at(0, 0), at(4, 0)).expect("straight line");
        assert_eq!(path.steps(), 4);
        assert_eq!(path.cost(), 4);

        grid.set_tile(at(2, 0), TileId::new(9));
        grid.set_forbidden([TileId::new(9)]);
        assert!(line_path(&grid, at(0, 0), at(4, 0)).is_none());
        assert!(line_path(&grid, at(0, 0), at(1, 0)).is_some());

        let wide = open_grid(5, 5);
        assert!(line_path(&wide, at(0, 0), at(2, 1)).is_none());
    }
}
