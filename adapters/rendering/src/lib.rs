#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for hexmap adapters.
//!
//! The engine never touches GPU state. It talks to the presentation layer
//! through [`TileRenderer`], which draws images, animation frames and text,
//! and [`BatchCache`], which packs the static tiles of a frame into a batch
//! that can be replayed while nothing changes. [`HexMapPainter`] drives both
//! once per frame.

use anyhow::Result as AnyResult;
use glam::Vec2;
use hexmap_core::{AnimationRef, HexCoord, HexShape, ImageRef, PixelRect};
use hexmap_system_pathfinding::{find_path_to_point, line_path_to_point, Path};
use hexmap_world::{HexGrid, Tile};
use std::{error::Error, fmt};

mod painter;

pub use painter::{FrameMode, FrameReport, HexMapPainter, PaintOptions};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Untinted white.
    pub const WHITE: Color = Color::from_rgb_u8(255, 255, 255);
    /// Pure red.
    pub const RED: Color = Color::from_rgb_u8(255, 0, 0);
    /// Pure yellow.
    pub const YELLOW: Color = Color::from_rgb_u8(255, 255, 0);
    /// Pure blue.
    pub const BLUE: Color = Color::from_rgb_u8(0, 0, 255);
    /// Pure cyan.
    pub const CYAN: Color = Color::from_rgb_u8(0, 255, 255);
    /// Pure magenta.
    pub const MAGENTA: Color = Color::from_rgb_u8(255, 0, 255);
    /// Dark red.
    pub const MAROON: Color = Color::from_rgb_u8(128, 0, 0);
    /// Pure green.
    pub const GREEN: Color = Color::from_rgb_u8(0, 255, 0);
    /// Highlight used for search paths.
    pub const LIGHT_SKY_BLUE: Color = Color::from_rgb_u8(135, 206, 250);
    /// Highlight used for the selected cell.
    pub const PINK: Color = Color::from_rgb_u8(255, 192, 203);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }

    /// Debug colour of an unbound cell, chosen by its tile identifier.
    #[must_use]
    pub const fn for_tile_id(id: u32) -> Self {
        match id {
            0 => Self::RED,
            1 => Self::YELLOW,
            2 => Self::BLUE,
            3 => Self::CYAN,
            4 => Self::MAGENTA,
            5 => Self::MAROON,
            _ => Self::GREEN,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Packed image known to the renderer's atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PackedImage {
    /// Handle of the image.
    pub image: ImageRef,
    /// Width of the packed region in pixels.
    pub width: i32,
    /// Height of the packed region in pixels.
    pub height: i32,
}

/// Immediate drawing capability provided by the presentation layer.
pub trait TileRenderer {
    /// Draws `image` into the screen rectangle `dest`, multiplied by `tint`.
    fn draw_tile(&mut self, image: ImageRef, dest: PixelRect, tint: Color) -> AnyResult<()>;

    /// Draws the current frame of `animation` into `dest`.
    fn draw_animated_frame(&mut self, animation: AnimationRef, dest: PixelRect) -> AnyResult<()>;

    /// Draws `text` centred on `position`.
    fn draw_text(&mut self, text: &str, position: Vec2, color: Color) -> AnyResult<()>;
}

/// Atlas and batch packing capability provided by the presentation layer.
///
/// Tiles drawn through [`TileRenderer::draw_tile`] between
/// [`BatchCache::begin_batch`] and [`BatchCache::end_batch`] form the packed
/// batch. Animation frames and text never become part of it.
pub trait BatchCache {
    /// Looks up a packed image, returning `None` when the atlas lacks it.
    fn resolve_image(&self, image: ImageRef) -> Option<PackedImage>;

    /// Starts recording a new batch.
    fn begin_batch(&mut self) -> AnyResult<()>;

    /// Stops recording the current batch.
    fn end_batch(&mut self) -> AnyResult<()>;

    /// Keeps the recorded batch for later replay.
    fn save_cache(&mut self) -> AnyResult<()>;

    /// Replays the saved batch.
    fn post_cache(&mut self) -> AnyResult<()>;

    /// Whether a saved batch is available for replay.
    fn has_cache(&self) -> bool;

    /// Generates a filled hexagon image matching the dimensions of `shape`.
    fn create_outline(&mut self, shape: &HexShape) -> ImageRef;
}

/// Placement of the map inside its scene.
///
/// This is everything the engine needs from the scene entity hosting the map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapPlacement {
    /// Top-left corner of the map in screen pixels.
    pub position: Vec2,
    /// Size of the map on screen.
    pub size: Vec2,
    /// Scale applied to map pixels.
    pub scale: Vec2,
    /// Whether the map is drawn at all.
    pub visible: bool,
}

impl MapPlacement {
    /// Smallest scale accepted on either axis.
    pub const MIN_SCALE: f32 = 1.0e-3;

    /// Creates a visible placement.
    ///
    /// Returns an error when either scale component is not a finite number of
    /// at least [`MapPlacement::MIN_SCALE`].
    pub fn new(position: Vec2, size: Vec2, scale: Vec2) -> Result<Self, RenderingError> {
        if !(is_usable_scale(scale.x) && is_usable_scale(scale.y)) {
            return Err(RenderingError::InvalidScale {
                scale_x: scale.x,
                scale_y: scale.y,
            });
        }
        Ok(Self {
            position,
            size,
            scale,
            visible: true,
        })
    }

    /// Unscaled placement at the screen origin.
    #[must_use]
    pub const fn identity(size: Vec2) -> Self {
        Self {
            position: Vec2::ZERO,
            size,
            scale: Vec2::ONE,
            visible: true,
        }
    }

    /// Converts a screen position into map pixels, rounding up.
    #[must_use]
    pub fn to_map_pixel(&self, screen: Vec2, scroll: Vec2) -> Vec2 {
        ((screen - scroll - self.position) / self.scale).ceil()
    }

    /// Tile under a screen position.
    #[must_use]
    pub fn pick<'a>(&self, grid: &'a HexGrid, screen: Vec2, scroll: Vec2) -> Option<&'a Tile> {
        let map = self.visible_map_pixel(screen, scroll)?;
        grid.pick(map.x, map.y)
    }

    /// Shortest path from `start` to the cell under a screen position.
    #[must_use]
    pub fn path_to(
        &self,
        grid: &HexGrid,
        start: HexCoord,
        screen: Vec2,
        scroll: Vec2,
        end_radius: u32,
    ) -> Option<Path> {
        let map = self.visible_map_pixel(screen, scroll)?;
        find_path_to_point(grid, start, map.x, map.y, end_radius)
    }

    /// Straight move from `start` to the cell under a screen position.
    #[must_use]
    pub fn line_to(
        &self,
        grid: &HexGrid,
        start: HexCoord,
        screen: Vec2,
        scroll: Vec2,
    ) -> Option<Path> {
        let map = self.visible_map_pixel(screen, scroll)?;
        line_path_to_point(grid, start, map.x, map.y)
    }

    /// Advances the tile under a screen position to the next of `kinds` ids.
    ///
    /// See [`HexGrid::cycle_tile`].
    pub fn toggle(
        &self,
        grid: &mut HexGrid,
        screen: Vec2,
        scroll: Vec2,
        kinds: u32,
    ) -> Option<Tile> {
        let map = self.visible_map_pixel(screen, scroll)?;
        grid.toggle_at(map.x, map.y, kinds)
    }

    fn visible_map_pixel(&self, screen: Vec2, scroll: Vec2) -> Option<Vec2> {
        self.visible.then(|| self.to_map_pixel(screen, scroll))
    }
}

fn is_usable_scale(scale: f32) -> bool {
    scale.is_finite() && scale >= MapPlacement::MIN_SCALE
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Placement scale must be finite and at least `MapPlacement::MIN_SCALE`.
    InvalidScale {
        /// Provided horizontal scale.
        scale_x: f32,
        /// Provided vertical scale.
        scale_y: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidScale { scale_x, scale_y } => {
                write!(
                    f,
                    "placement scale must be finite and at least {} (received {scale_x}x{scale_y})",
                    MapPlacement::MIN_SCALE
                )
            }
        }
    }
}

impl Error for RenderingError {}
