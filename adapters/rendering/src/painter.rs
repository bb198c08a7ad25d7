//! Per-frame driver that draws a grid through the rendering capabilities.

use anyhow::{Context, Result as AnyResult};
use glam::Vec2;
use hexmap_core::{HexCoord, HexShape, PixelPoint, PixelRect, TileId};
use hexmap_system_render_cache::{
    DirtyReason, FrameContext, FramePlan, OverlayCell, OverlayKind, RenderCacheController,
};
use hexmap_world::{BindingVisual, HexGrid};
use tracing::{trace, warn};

use crate::{BatchCache, Color, TileRenderer};

/// Toggles for the per-frame drawing passes.
#[derive(Clone, Debug, PartialEq)]
pub struct PaintOptions {
    /// Redraw animated bindings every frame.
    pub play_animations: bool,
    /// Draw `[col,row]` labels on visible cells.
    pub show_labels: bool,
    /// Draw coloured outlines for cells without a binding.
    pub show_outlines: bool,
    /// Cells to highlight as a search path.
    pub path: Option<Vec<HexCoord>>,
    /// Cell to highlight as the current selection.
    pub marker: Option<HexCoord>,
    /// Colour used for labels.
    pub label_color: Color,
}

impl PaintOptions {
    /// Whether the frame must bypass the packed batch.
    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.show_outlines || self.path.is_some() || self.marker.is_some()
    }
}

impl Default for PaintOptions {
    fn default() -> Self {
        Self {
            play_animations: true,
            show_labels: false,
            show_outlines: false,
            path: None,
            marker: None,
            label_color: Color::WHITE,
        }
    }
}

/// How a frame was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameMode {
    /// Nothing was drawn because the map is hidden or closed.
    Skipped,
    /// The packed batch was replayed.
    Replay,
    /// The packed batch was rebuilt.
    Rebuild(DirtyReason),
    /// Every visible cell was drawn directly.
    Debug,
}

/// Summary of the work done for a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReport {
    /// How the frame was produced.
    pub mode: FrameMode,
    /// Static tiles drawn.
    pub tiles_drawn: usize,
    /// Animation frames drawn.
    pub animations_drawn: usize,
    /// Text labels drawn.
    pub labels_drawn: usize,
    /// Debug outlines drawn.
    pub outlines_drawn: usize,
}

impl FrameReport {
    const fn new(mode: FrameMode) -> Self {
        Self {
            mode,
            tiles_drawn: 0,
            animations_drawn: 0,
            labels_drawn: 0,
            outlines_drawn: 0,
        }
    }

    /// Per-cell draw calls issued during the frame.
    #[must_use]
    pub const fn cell_draws(&self) -> usize {
        self.tiles_drawn + self.animations_drawn + self.outlines_drawn
    }
}

/// Draws a grid once per frame, replaying the packed batch when possible.
#[derive(Debug)]
pub struct HexMapPainter {
    cache: RenderCacheController,
    options: PaintOptions,
    visible: bool,
}

impl HexMapPainter {
    /// Creates a visible painter with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(PaintOptions::default())
    }

    /// Creates a visible painter with the provided options.
    #[must_use]
    pub fn with_options(options: PaintOptions) -> Self {
        Self {
            cache: RenderCacheController::new(),
            options,
            visible: true,
        }
    }

    /// Drawing toggles.
    #[must_use]
    pub fn options(&self) -> &PaintOptions {
        &self.options
    }

    /// Mutable drawing toggles.
    ///
    /// Label and animation toggles change what the batch records, so the
    /// cache is invalidated.
    pub fn options_mut(&mut self) -> &mut PaintOptions {
        self.cache.mark_dirty();
        &mut self.options
    }

    /// Shows or hides the map.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Forces the next cached frame to rebuild.
    pub fn invalidate(&mut self) {
        self.cache.mark_dirty();
    }

    /// Replay-or-rebuild controller driving cached frames.
    #[must_use]
    pub fn cache(&self) -> &RenderCacheController {
        &self.cache
    }

    /// Draws the part of `grid` inside the map-space rectangle `view`.
    ///
    /// `offset` is the screen position of the map origin.
    pub fn paint<B>(
        &mut self,
        grid: &mut HexGrid,
        backend: &mut B,
        offset: PixelPoint,
        view: PixelRect,
    ) -> AnyResult<FrameReport>
    where
        B: TileRenderer + BatchCache + ?Sized,
    {
        if !self.visible || !grid.is_active() {
            return Ok(FrameReport::new(FrameMode::Skipped));
        }
        if self.options.is_debug() {
            return self.paint_debug(grid, backend, offset, view);
        }

        let frame = FrameContext {
            offset,
            view,
            content_revision: grid.revision(),
            batch_cached: backend.has_cache(),
        };
        match self.cache.plan_frame(&frame) {
            FramePlan::Replay => self.replay(backend),
            FramePlan::Rebuild(reason) => self.rebuild(grid, backend, &frame, reason),
        }
    }

    fn replay<B>(&mut self, backend: &mut B) -> AnyResult<FrameReport>
    where
        B: TileRenderer + BatchCache + ?Sized,
    {
        let mut report = FrameReport::new(FrameMode::Replay);
        backend.post_cache().context("failed to replay the tile batch")?;
        for overlay in self.cache.overlays() {
            match overlay.kind {
                OverlayKind::Animation(animation) => {
                    backend.draw_animated_frame(animation, overlay.bounds)?;
                    report.animations_drawn += 1;
                }
                OverlayKind::Label => {
                    draw_label(backend, overlay.coord, overlay.bounds, self.options.label_color)?;
                    report.labels_drawn += 1;
                }
            }
        }
        trace!(?report, "replayed frame");
        Ok(report)
    }

    fn rebuild<B>(
        &mut self,
        grid: &HexGrid,
        backend: &mut B,
        frame: &FrameContext,
        reason: DirtyReason,
    ) -> AnyResult<FrameReport>
    where
        B: TileRenderer + BatchCache + ?Sized,
    {
        let mut report = FrameReport::new(FrameMode::Rebuild(reason));
        if let Err(error) = backend.begin_batch().context("failed to begin the tile batch") {
            self.cache.abandon_rebuild();
            return Err(error);
        }

        // Close the batch even when a draw failed.
        let drawn = self.draw_batch(grid, backend, frame, &mut report);
        let ended = backend.end_batch().context("failed to end the tile batch");
        let saved = drawn
            .and(ended)
            .and_then(|()| backend.save_cache().context("failed to save the tile batch"));
        if let Err(error) = saved {
            self.cache.abandon_rebuild();
            warn!(?reason, "tile batch rebuild failed: {error:#}");
            return Err(error);
        }

        self.cache.finish_rebuild(frame);
        trace!(?report, "rebuilt frame");
        Ok(report)
    }

    fn draw_batch<B>(
        &mut self,
        grid: &HexGrid,
        backend: &mut B,
        frame: &FrameContext,
        report: &mut FrameReport,
    ) -> AnyResult<()>
    where
        B: TileRenderer + BatchCache + ?Sized,
    {
        for visit in grid.all_tiles(frame.view) {
            let Some(shape) = grid.cell_shape(visit.coord) else {
                continue;
            };
            let bounds = shape.frame_rect();
            if !frame.view.intersects(&bounds) {
                continue;
            }
            let dest = bounds.translate(frame.offset);

            match grid.bindings().binding_for(visit.tile.id()).map(|binding| binding.visual()) {
                Some(BindingVisual::Animation(animation)) => {
                    if self.options.play_animations {
                        backend.draw_animated_frame(animation, dest)?;
                        report.animations_drawn += 1;
                        self.cache.record_overlay(OverlayCell {
                            coord: visit.coord,
                            bounds: dest,
                            kind: OverlayKind::Animation(animation),
                        });
                    }
                }
                Some(BindingVisual::Image(image)) => {
                    if let Some(packed) = backend.resolve_image(image) {
                        let sized = PixelRect::new(
                            dest.x,
                            dest.y,
                            packed.width.max(shape.width()),
                            packed.height.max(shape.height()),
                        );
                        backend.draw_tile(image, sized, Color::WHITE)?;
                        report.tiles_drawn += 1;
                    }
                }
                None => {}
            }

            if self.options.show_labels {
                draw_label(backend, visit.coord, dest, self.options.label_color)?;
                report.labels_drawn += 1;
                self.cache.record_overlay(OverlayCell {
                    coord: visit.coord,
                    bounds: dest,
                    kind: OverlayKind::Label,
                });
            }
        }
        Ok(())
    }

    fn paint_debug<B>(
        &mut self,
        grid: &mut HexGrid,
        backend: &mut B,
        offset: PixelPoint,
        view: PixelRect,
    ) -> AnyResult<FrameReport>
    where
        B: TileRenderer + BatchCache + ?Sized,
    {
        let mut report = FrameReport::new(FrameMode::Debug);
        let visible: Vec<(HexCoord, TileId, HexShape)> = grid
            .all_tiles(view)
            .filter_map(|visit| {
                let shape = grid.cell_shape(visit.coord)?;
                view.intersects(&shape.frame_rect())
                    .then_some((visit.coord, visit.tile.id(), shape))
            })
            .collect();

        for (coord, id, shape) in visible {
            let dest = shape.frame_rect().translate(offset);
            match grid.bindings().binding_for(id).map(|binding| binding.visual()) {
                Some(BindingVisual::Animation(animation)) if self.options.play_animations => {
                    backend.draw_animated_frame(animation, dest)?;
                    report.animations_drawn += 1;
                }
                Some(BindingVisual::Image(image)) => {
                    if let Some(packed) = backend.resolve_image(image) {
                        let sized = PixelRect::new(
                            dest.x,
                            dest.y,
                            packed.width.max(shape.width()),
                            packed.height.max(shape.height()),
                        );
                        backend.draw_tile(image, sized, Color::WHITE)?;
                        report.tiles_drawn += 1;
                    }
                }
                Some(BindingVisual::Animation(_)) => {}
                None => {
                    if self.options.show_outlines
                        && draw_outline(grid, backend, &shape, dest, Color::for_tile_id(id.get()))?
                    {
                        report.outlines_drawn += 1;
                    }
                }
            }
            if self.options.show_labels {
                draw_label(backend, coord, dest, self.options.label_color)?;
                report.labels_drawn += 1;
            }
        }

        let highlights = self
            .options
            .path
            .iter()
            .flatten()
            .map(|coord| (*coord, Color::LIGHT_SKY_BLUE))
            .chain(self.options.marker.map(|coord| (coord, Color::PINK)));
        for (coord, color) in highlights {
            let Some(shape) = grid.cell_shape(coord) else {
                continue;
            };
            if !view.intersects(&shape.frame_rect()) {
                continue;
            }
            let dest = shape.frame_rect().translate(offset);
            if draw_outline(grid, backend, &shape, dest, color)? {
                report.outlines_drawn += 1;
            }
            if self.options.show_labels {
                draw_label(backend, coord, dest, self.options.label_color)?;
                report.labels_drawn += 1;
            }
        }

        trace!(?report, "painted debug frame");
        Ok(report)
    }
}

impl Default for HexMapPainter {
    fn default() -> Self {
        Self::new()
    }
}

fn draw_outline<B>(
    grid: &mut HexGrid,
    backend: &mut B,
    shape: &HexShape,
    dest: PixelRect,
    color: Color,
) -> AnyResult<bool>
where
    B: TileRenderer + BatchCache + ?Sized,
{
    let Some(outline) = grid
        .bindings_mut()
        .outline_for(shape, |shape| backend.create_outline(shape))
    else {
        return Ok(false);
    };
    backend.draw_tile(outline, dest, color)?;
    Ok(true)
}

fn draw_label<B>(backend: &mut B, coord: HexCoord, dest: PixelRect, color: Color) -> AnyResult<()>
where
    B: TileRenderer + ?Sized,
{
    let center = Vec2::new(
        dest.x as f32 + dest.width as f32 / 2.0,
        dest.y as f32 + dest.height as f32 / 2.0,
    );
    backend.draw_text(&format!("[{},{}]", coord.col(), coord.row()), center, color)
}
