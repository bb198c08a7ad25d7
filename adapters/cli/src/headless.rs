//! Renderer that records draw calls instead of touching a display.

use anyhow::Result as AnyResult;
use glam::Vec2;
use hexmap_core::{AnimationRef, HexShape, ImageRef, PixelRect};
use hexmap_rendering::{BatchCache, Color, PackedImage, TileRenderer};

/// Draw-call counters accumulated since the last [`CountingBackend::take_counts`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct DrawCounts {
    pub(crate) tiles: usize,
    pub(crate) animations: usize,
    pub(crate) labels: usize,
    pub(crate) batches_posted: usize,
}

/// Headless stand-in for a GPU renderer and its batch cache.
#[derive(Debug, Default)]
pub(crate) struct CountingBackend {
    counts: DrawCounts,
    recording: bool,
    cached: bool,
    outlines: u32,
}

impl CountingBackend {
    pub(crate) fn take_counts(&mut self) -> DrawCounts {
        std::mem::take(&mut self.counts)
    }

    /// Drops the saved batch, as a real renderer does after a context loss.
    pub(crate) fn evict(&mut self) {
        self.cached = false;
    }
}

impl TileRenderer for CountingBackend {
    fn draw_tile(&mut self, _image: ImageRef, _dest: PixelRect, _tint: Color) -> AnyResult<()> {
        self.counts.tiles += 1;
        Ok(())
    }

    fn draw_animated_frame(&mut self, _animation: AnimationRef, _dest: PixelRect) -> AnyResult<()> {
        self.counts.animations += 1;
        Ok(())
    }

    fn draw_text(&mut self, _text: &str, _position: Vec2, _color: Color) -> AnyResult<()> {
        self.counts.labels += 1;
        Ok(())
    }
}

impl BatchCache for CountingBackend {
    fn resolve_image(&self, image: ImageRef) -> Option<PackedImage> {
        Some(PackedImage {
            image,
            width: 0,
            height: 0,
        })
    }

    fn begin_batch(&mut self) -> AnyResult<()> {
        anyhow::ensure!(!self.recording, "batch already being recorded");
        self.recording = true;
        Ok(())
    }

    fn end_batch(&mut self) -> AnyResult<()> {
        anyhow::ensure!(self.recording, "no batch is being recorded");
        self.recording = false;
        Ok(())
    }

    fn save_cache(&mut self) -> AnyResult<()> {
        self.cached = true;
        Ok(())
    }

    fn post_cache(&mut self) -> AnyResult<()> {
        anyhow::ensure!(self.cached, "no saved batch to replay");
        self.counts.batches_posted += 1;
        Ok(())
    }

    fn has_cache(&self) -> bool {
        self.cached
    }

    fn create_outline(&mut self, _shape: &HexShape) -> ImageRef {
        self.outlines += 1;
        ImageRef::new(u32::MAX - self.outlines)
    }
}
