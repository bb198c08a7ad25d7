#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives a hexmap grid without a display.

mod headless;

use std::{
    collections::BTreeSet,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use glam::Vec2;
use hexmap_core::{AnimationRef, GridIndex, HexCoord, PixelPoint, TileId};
use hexmap_rendering::{FrameMode, HexMapPainter, MapPlacement};
use hexmap_system_pathfinding::{find_path, line_path, Path};
use hexmap_world::{query, GridConfig, HexGrid, TileLayout};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::headless::CountingBackend;

/// Loads a hex grid from a TOML configuration and runs one command on it.
#[derive(Debug, Parser)]
#[command(name = "hexmap", version, about)]
struct Cli {
    /// Grid configuration file.
    #[arg(long)]
    config: PathBuf,
    /// Map file supplying the tile identifiers.
    #[arg(long)]
    map: Option<PathBuf>,
    /// Read the map as glyphs resolved through the `[legend]` table.
    #[arg(long, requires = "map")]
    chars: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Prints the cheapest path between two cells.
    Path {
        /// Start cell as `column,row`.
        #[arg(long, value_parser = parse_cell)]
        from: GridIndex,
        /// Goal cell as `column,row`.
        #[arg(long, value_parser = parse_cell)]
        to: GridIndex,
        /// Accept any cell within this distance of the goal.
        #[arg(long, default_value_t = 0)]
        radius: u32,
        /// Only move in a straight line along a hex axis.
        #[arg(long, conflicts_with = "radius")]
        line: bool,
    },
    /// Prints the path from a cell to the cell under a screen pixel.
    Route {
        /// Start cell as `column,row`.
        #[arg(long, value_parser = parse_cell)]
        from: GridIndex,
        #[command(flatten)]
        point: ScreenPoint,
        /// Accept any cell within this distance of the goal.
        #[arg(long, default_value_t = 0)]
        radius: u32,
        /// Only move in a straight line along a hex axis.
        #[arg(long, conflicts_with = "radius")]
        line: bool,
    },
    /// Prints the cell under a screen pixel.
    Pick {
        #[command(flatten)]
        point: ScreenPoint,
    },
    /// Cycles the tile under a screen pixel and prints the edited matrix.
    Toggle {
        #[command(flatten)]
        point: ScreenPoint,
        /// Number of tile kinds to cycle through.
        #[arg(long, default_value_t = 2)]
        kinds: u32,
        /// How many clicks to apply.
        #[arg(long, default_value_t = 1)]
        times: u32,
    },
    /// Paints frames headlessly and reports how each one was produced.
    Frames {
        /// Number of frames to paint.
        #[arg(long, default_value_t = 3)]
        count: usize,
        /// Frame at which the map scrolls by half a hexagon.
        #[arg(long)]
        scroll_at: Option<usize>,
        /// Frame at which the renderer drops its saved batch.
        #[arg(long)]
        evict_at: Option<usize>,
        /// Tile identifier drawn as an animation instead of an image.
        #[arg(long)]
        animate: Option<u32>,
    },
    /// Prints the tile identifier matrix in storage order.
    Show,
}

/// Screen pixel resolved through a map placement at the screen origin.
#[derive(Debug, Args)]
struct ScreenPoint {
    /// Horizontal screen position.
    #[arg(long, allow_hyphen_values = true)]
    x: f32,
    /// Vertical screen position.
    #[arg(long, allow_hyphen_values = true)]
    y: f32,
    /// Horizontal scroll applied to the map.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    scroll_x: f32,
    /// Vertical scroll applied to the map.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    scroll_y: f32,
    /// Scale applied to map pixels.
    #[arg(long, default_value_t = 1.0)]
    scale: f32,
}

impl ScreenPoint {
    fn screen(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    fn scroll(&self) -> Vec2 {
        Vec2::new(self.scroll_x, self.scroll_y)
    }

    fn placement(&self, grid: &HexGrid) -> Result<MapPlacement> {
        let bounds = grid.pixel_bounds();
        let placement = MapPlacement::new(
            Vec2::ZERO,
            Vec2::new(bounds.width as f32, bounds.height as f32),
            Vec2::splat(self.scale),
        )?;
        Ok(placement)
    }

    fn map_pixel(&self, placement: &MapPlacement) -> Vec2 {
        placement.to_map_pixel(self.screen(), self.scroll())
    }
}

/// Entry point for the hexmap command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let stdout = io::stdout();
    run(&cli, &mut stdout.lock())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    let mut grid = load_grid(cli)?;
    info!(
        columns = grid.dimensions().columns(),
        rows = grid.dimensions().rows(),
        "grid ready"
    );

    match &cli.command {
        Command::Path {
            from,
            to,
            radius,
            line,
        } => print_path(&grid, *from, *to, *radius, *line, out),
        Command::Route {
            from,
            point,
            radius,
            line,
        } => print_route(&grid, *from, point, *radius, *line, out),
        Command::Pick { point } => print_pick(&grid, point, out),
        Command::Toggle {
            point,
            kinds,
            times,
        } => toggle_cells(&mut grid, point, *kinds, *times, out),
        Command::Frames {
            count,
            scroll_at,
            evict_at,
            animate,
        } => paint_frames(&mut grid, *count, *scroll_at, *evict_at, *animate, out),
        Command::Show => print_matrix(&grid, out),
    }
}

fn load_grid(cli: &Cli) -> Result<HexGrid> {
    let config = GridConfig::from_path(&cli.config)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;
    let Some(map) = &cli.map else {
        return config.build_grid().context("failed to build grid");
    };

    let layout = if cli.chars {
        TileLayout::from_chars_file(map, &config.legend()?)
    } else {
        TileLayout::from_numeric_file(map)
    }
    .with_context(|| format!("failed to load map {}", map.display()))?;
    config
        .build_grid_from_layout(&layout)
        .context("map does not fit the configuration")
}

fn parse_cell(value: &str) -> Result<GridIndex, String> {
    let (column, row) = value
        .split_once(',')
        .ok_or_else(|| format!("`{value}` is not `column,row`"))?;
    let column = column
        .trim()
        .parse::<i32>()
        .map_err(|error| format!("invalid column in `{value}`: {error}"))?;
    let row = row
        .trim()
        .parse::<i32>()
        .map_err(|error| format!("invalid row in `{value}`: {error}"))?;
    Ok(GridIndex::new(column, row))
}

fn start_cell(grid: &HexGrid, from: GridIndex) -> Result<HexCoord> {
    let start = from.to_coord();
    if !grid.contains(start) {
        bail!("start cell {},{} lies outside the grid", from.column(), from.row());
    }
    Ok(start)
}

fn print_path(
    grid: &HexGrid,
    from: GridIndex,
    to: GridIndex,
    radius: u32,
    line: bool,
    out: &mut impl Write,
) -> Result<()> {
    let start = start_cell(grid, from)?;
    let path = if line {
        line_path(grid, start, to.to_coord())
    } else {
        find_path(grid, start, to.to_coord(), radius)
    };
    write_path(path.as_ref(), out)
}

fn print_route(
    grid: &HexGrid,
    from: GridIndex,
    point: &ScreenPoint,
    radius: u32,
    line: bool,
    out: &mut impl Write,
) -> Result<()> {
    let start = start_cell(grid, from)?;
    let placement = point.placement(grid)?;
    let path = if line {
        placement.line_to(grid, start, point.screen(), point.scroll())
    } else {
        placement.path_to(grid, start, point.screen(), point.scroll(), radius)
    };
    write_path(path.as_ref(), out)
}

fn write_path(path: Option<&Path>, out: &mut impl Write) -> Result<()> {
    let Some(path) = path else {
        writeln!(out, "no path")?;
        return Ok(());
    };
    let cells: Vec<String> = path.positions().iter().map(|coord| cell_label(*coord)).collect();
    writeln!(out, "cost {} steps {}", path.cost(), path.steps())?;
    writeln!(out, "{}", cells.join(" "))?;
    Ok(())
}

fn cell_label(coord: HexCoord) -> String {
    let index = coord.to_grid_index();
    format!("[{},{}]", index.column(), index.row())
}

fn print_pick(grid: &HexGrid, point: &ScreenPoint, out: &mut impl Write) -> Result<()> {
    let placement = point.placement(grid)?;
    let map = point.map_pixel(&placement);
    match placement.pick(grid, point.screen(), point.scroll()) {
        Some(tile) => writeln!(
            out,
            "map ({},{}) cell {} tile {}",
            map.x,
            map.y,
            cell_label(tile.coord()),
            tile.id()
        )?,
        None => writeln!(out, "map ({},{}) outside the grid", map.x, map.y)?,
    }
    Ok(())
}

fn toggle_cells(
    grid: &mut HexGrid,
    point: &ScreenPoint,
    kinds: u32,
    times: u32,
    out: &mut impl Write,
) -> Result<()> {
    let placement = point.placement(grid)?;
    for _ in 0..times {
        let Some(tile) = placement.toggle(grid, point.screen(), point.scroll(), kinds) else {
            let map = point.map_pixel(&placement);
            writeln!(out, "map ({},{}) outside the grid", map.x, map.y)?;
            return Ok(());
        };
        writeln!(out, "cell {} tile {}", cell_label(tile.coord()), tile.id())?;
    }
    print_matrix(grid, out)
}

fn paint_frames(
    grid: &mut HexGrid,
    count: usize,
    scroll_at: Option<usize>,
    evict_at: Option<usize>,
    animate: Option<u32>,
    out: &mut impl Write,
) -> Result<()> {
    bind_tiles(grid, animate)?;

    let view = grid.pixel_bounds();
    let mut backend = CountingBackend::default();
    let mut painter = HexMapPainter::new();
    let mut offset = PixelPoint::new(0, 0);

    for frame in 0..count {
        if scroll_at == Some(frame) {
            offset = PixelPoint::new(offset.x - grid.shape().start_width(), offset.y);
        }
        if evict_at == Some(frame) {
            backend.evict();
        }
        let report = painter.paint(grid, &mut backend, offset, view)?;
        let counts = backend.take_counts();
        let mode = match report.mode {
            FrameMode::Replay => "replay".to_owned(),
            FrameMode::Rebuild(reason) => format!("rebuild ({reason:?})"),
            FrameMode::Debug => "debug".to_owned(),
            FrameMode::Skipped => "skipped".to_owned(),
        };
        writeln!(
            out,
            "frame {frame}: {mode} tiles={} animations={} labels={} posted={}",
            counts.tiles, counts.animations, counts.labels, counts.batches_posted
        )?;
    }

    let cache = painter.cache();
    writeln!(
        out,
        "rebuilds={} replays={}",
        cache.rebuild_count(),
        cache.replay_count()
    )?;
    Ok(())
}

fn bind_tiles(grid: &mut HexGrid, animate: Option<u32>) -> Result<()> {
    let ids: BTreeSet<u32> = grid.iter().map(|tile| tile.id().get()).collect();
    let registry = grid.bindings_mut();
    registry.register_identity(ids.into_iter().filter(|id| Some(*id) != animate))?;
    if let Some(id) = animate {
        let _ = registry.put_animation_tile(TileId::new(id), AnimationRef::new(id), None)?;
    }
    Ok(())
}

fn print_matrix(grid: &HexGrid, out: &mut impl Write) -> Result<()> {
    for (row, ids) in query::tile_matrix(grid).iter().enumerate() {
        let cells: Vec<String> = ids.iter().map(ToString::to_string).collect();
        let indent = if row % 2 == 1 { " " } else { "" };
        writeln!(out, "{indent}{}", cells.join(" "))?;
    }
    Ok(())
}
