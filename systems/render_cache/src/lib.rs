#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Replay-or-rebuild policy for the packed tile batch.
//!
//! The controller is consulted once per frame. While the scroll offset, the
//! viewport and the grid content are unchanged and the renderer still holds a
//! packed batch, it answers [`FramePlan::Replay`] and the caller only redraws
//! the overlay cells recorded during the last rebuild. Any change answers
//! [`FramePlan::Rebuild`] with the reason, after which the caller redraws the
//! visible window, records overlays and calls
//! [`RenderCacheController::finish_rebuild`].

use hexmap_core::{AnimationRef, HexCoord, PixelPoint, PixelRect};
use tracing::{debug, trace};

/// Whether the previous batch may be replayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheState {
    /// The packed batch matches the current frame inputs.
    Fresh,
    /// The packed batch must be rebuilt before it can be replayed.
    Dirty,
}

/// Why a rebuild was requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirtyReason {
    /// No frame has been rebuilt yet.
    Initial,
    /// The owner invalidated the cache explicitly.
    Explicit,
    /// The renderer holds no packed batch.
    NoCachedBatch,
    /// The scroll offset moved.
    OffsetChanged,
    /// The viewport rectangle changed.
    ViewChanged,
    /// Tiles, geometry or bindings changed.
    ContentChanged,
}

/// Inputs describing the frame about to be drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameContext {
    /// Scroll position applied to the map.
    pub offset: PixelPoint,
    /// Visible rectangle in map pixels.
    pub view: PixelRect,
    /// Content revision of the grid being drawn.
    pub content_revision: u64,
    /// Whether the renderer currently holds a packed batch.
    pub batch_cached: bool,
}

/// Work the caller must do for the current frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePlan {
    /// Post the cached batch and redraw only the recorded overlays.
    Replay,
    /// Redraw every visible cell into a new batch.
    Rebuild(DirtyReason),
}

/// Per-frame work attached to an overlay cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayKind {
    /// The cell shows the current frame of an animation.
    Animation(AnimationRef),
    /// The cell carries a text label.
    Label,
}

/// Cell that must be redrawn on every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayCell {
    /// Position of the cell.
    pub coord: HexCoord,
    /// Destination rectangle in screen pixels at rebuild time.
    pub bounds: PixelRect,
    /// What to redraw.
    pub kind: OverlayKind,
}

#[derive(Clone, Copy, Debug, Default)]
struct RenderCacheState {
    last_offset: Option<PixelPoint>,
    last_view: Option<PixelRect>,
    last_revision: Option<u64>,
    dirty: bool,
}

/// Dirty-tracking state machine owned by the presentation layer.
#[derive(Debug)]
pub struct RenderCacheController {
    state: RenderCacheState,
    pending_reason: Option<DirtyReason>,
    last_reason: Option<DirtyReason>,
    overlays: Vec<OverlayCell>,
    recording: Vec<OverlayCell>,
    rebuilds: u64,
    replays: u64,
}

impl RenderCacheController {
    /// Creates a controller that rebuilds on its first frame.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RenderCacheState {
                dirty: true,
                ..RenderCacheState::default()
            },
            pending_reason: Some(DirtyReason::Initial),
            last_reason: None,
            overlays: Vec::new(),
            recording: Vec::new(),
            rebuilds: 0,
            replays: 0,
        }
    }

    /// Decides whether the frame described by `frame` can replay.
    pub fn plan_frame(&mut self, frame: &FrameContext) -> FramePlan {
        match self.dirty_reason(frame) {
            Some(reason) => {
                self.state = RenderCacheState {
                    last_offset: Some(frame.offset),
                    last_view: Some(frame.view),
                    last_revision: Some(frame.content_revision),
                    dirty: true,
                };
                self.pending_reason = None;
                self.last_reason = Some(reason);
                self.recording.clear();
                self.rebuilds = self.rebuilds.saturating_add(1);
                debug!(?reason, offset = ?frame.offset, view = ?frame.view, "rebuilding tile batch");
                FramePlan::Rebuild(reason)
            }
            None => {
                self.replays = self.replays.saturating_add(1);
                trace!(overlays = self.overlays.len(), "replaying tile batch");
                FramePlan::Replay
            }
        }
    }

    /// Records a cell that must be redrawn on replayed frames.
    ///
    /// Only meaningful between a [`FramePlan::Rebuild`] and
    /// [`RenderCacheController::finish_rebuild`].
    pub fn record_overlay(&mut self, overlay: OverlayCell) {
        self.recording.push(overlay);
    }

    /// Marks the rebuild of `frame` as complete.
    pub fn finish_rebuild(&mut self, frame: &FrameContext) {
        self.state = RenderCacheState {
            last_offset: Some(frame.offset),
            last_view: Some(frame.view),
            last_revision: Some(frame.content_revision),
            dirty: false,
        };
        self.overlays = std::mem::take(&mut self.recording);
        debug!(overlays = self.overlays.len(), "tile batch rebuilt");
    }

    /// Drops the overlays recorded by a rebuild that failed part way.
    ///
    /// The cache stays dirty, so the next frame rebuilds again.
    pub fn abandon_rebuild(&mut self) {
        self.state.dirty = true;
        self.recording.clear();
        debug!(reason = ?self.last_reason, "tile batch rebuild abandoned");
    }

    /// Forces the next frame to rebuild.
    pub fn mark_dirty(&mut self) {
        if self.pending_reason.is_none() {
            self.pending_reason = Some(DirtyReason::Explicit);
        }
        self.state.dirty = true;
    }

    /// Current cache state.
    #[must_use]
    pub const fn state(&self) -> CacheState {
        if self.state.dirty {
            CacheState::Dirty
        } else {
            CacheState::Fresh
        }
    }

    /// Overlay cells recorded by the last completed rebuild.
    #[must_use]
    pub fn overlays(&self) -> &[OverlayCell] {
        &self.overlays
    }

    /// Reason behind the most recent rebuild.
    #[must_use]
    pub const fn last_reason(&self) -> Option<DirtyReason> {
        self.last_reason
    }

    /// Number of frames planned as rebuilds.
    #[must_use]
    pub const fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Number of frames planned as replays.
    #[must_use]
    pub const fn replay_count(&self) -> u64 {
        self.replays
    }

    // Inputs are compared with the last frame planned as a rebuild, finished
    // or not. An unfinished rebuild with unchanged inputs repeats its reason.
    fn dirty_reason(&self, frame: &FrameContext) -> Option<DirtyReason> {
        if let Some(reason) = self.pending_reason {
            return Some(reason);
        }
        if let Some(reason) = self.input_change(frame) {
            return Some(reason);
        }
        self.state
            .dirty
            .then(|| self.last_reason.unwrap_or(DirtyReason::Explicit))
    }

    fn input_change(&self, frame: &FrameContext) -> Option<DirtyReason> {
        if !frame.batch_cached {
            return Some(DirtyReason::NoCachedBatch);
        }
        if self.state.last_offset != Some(frame.offset) {
            return Some(DirtyReason::OffsetChanged);
        }
        if self.state.last_view != Some(frame.view) {
            return Some(DirtyReason::ViewChanged);
        }
        if self.state.last_revision != Some(frame.content_revision) {
            return Some(DirtyReason::ContentChanged);
        }
        None
    }
}

impl Default for RenderCacheController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> FrameContext {
        FrameContext {
            offset: PixelPoint::new(0, 0),
            view: PixelRect::new(0, 0, 320, 240),
            content_revision: 1,
            batch_cached: true,
        }
    }

    fn rebuild(controller: &mut RenderCacheController, frame: &FrameContext) {
        assert!(matches!(controller.plan_frame(frame), FramePlan::Rebuild(_)));
        controller.finish_rebuild(frame);
    }

    #[test]
    fn first_frame_rebuilds() {
        let mut controller = RenderCacheController::new();
        assert_eq!(controller.state(), CacheState::Dirty);
        assert_eq!(
            controller.plan_frame(&frame()),
            FramePlan::Rebuild(DirtyReason::Initial)
        );
        controller.finish_rebuild(&frame());
        assert_eq!(controller.state(), CacheState::Fresh);
        assert_eq!(controller.plan_frame(&frame()), FramePlan::Replay);
    }

    #[test]
    fn unfinished_rebuild_stays_dirty() {
        let mut controller = RenderCacheController::new();
        let _ = controller.plan_frame(&frame());
        assert_eq!(controller.state(), CacheState::Dirty);
        assert!(matches!(controller.plan_frame(&frame()), FramePlan::Rebuild(_)));
    }

    #[test]
    fn each_input_change_names_its_reason() {
        let mut controller = RenderCacheController::new();
        rebuild(&mut controller, &frame());

        let scrolled = FrameContext {
            offset: PixelPoint::new(4, 0),
            ..frame()
        };
        assert_eq!(
            controller.plan_frame(&scrolled),
            FramePlan::Rebuild(DirtyReason::OffsetChanged)
        );
        controller.finish_rebuild(&scrolled);

        let resized = FrameContext {
            view: PixelRect::new(0, 0, 100, 100),
            ..scrolled
        };
        assert_eq!(
            controller.plan_frame(&resized),
            FramePlan::Rebuild(DirtyReason::ViewChanged)
        );
        controller.finish_rebuild(&resized);

        let edited = FrameContext {
            content_revision: 2,
            ..resized
        };
        assert_eq!(
            controller.plan_frame(&edited),
            FramePlan::Rebuild(DirtyReason::ContentChanged)
        );
        controller.finish_rebuild(&edited);

        let evicted = FrameContext {
            batch_cached: false,
            ..edited
        };
        assert_eq!(
            controller.plan_frame(&evicted),
            FramePlan::Rebuild(DirtyReason::NoCachedBatch)
        );
        assert_eq!(controller.last_reason(), Some(DirtyReason::NoCachedBatch));
    }

    #[test]
    fn mark_dirty_forces_an_explicit_rebuild() {
        let mut controller = RenderCacheController::new();
        rebuild(&mut controller, &frame());
        controller.mark_dirty();
        assert_eq!(controller.state(), CacheState::Dirty);
        assert_eq!(
            controller.plan_frame(&frame()),
            FramePlan::Rebuild(DirtyReason::Explicit)
        );
    }

    #[test]
    fn unfinished_rebuild_reports_the_newest_change() {
        let mut controller = RenderCacheController::new();
        let _ = controller.plan_frame(&frame());

        let scrolled = FrameContext {
            offset: PixelPoint::new(-6, 0),
            ..frame()
        };
        assert_eq!(
            controller.plan_frame(&scrolled),
            FramePlan::Rebuild(DirtyReason::OffsetChanged)
        );
        assert_eq!(
            controller.plan_frame(&scrolled),
            FramePlan::Rebuild(DirtyReason::OffsetChanged)
        );
        controller.finish_rebuild(&scrolled);
        assert_eq!(controller.plan_frame(&scrolled), FramePlan::Replay);
    }

    #[test]
    fn abandoned_rebuild_discards_its_overlays() {
        let mut controller = RenderCacheController::new();
        let cell = OverlayCell {
            coord: HexCoord::new(0, 0),
            bounds: PixelRect::new(0, 0, 20, 20),
            kind: OverlayKind::Label,
        };
        let _ = controller.plan_frame(&frame());
        controller.record_overlay(cell);
        controller.abandon_rebuild();
        assert_eq!(controller.state(), CacheState::Dirty);

        assert!(matches!(controller.plan_frame(&frame()), FramePlan::Rebuild(_)));
        controller.finish_rebuild(&frame());
        assert!(controller.overlays().is_empty());
    }

    #[test]
    fn overlays_are_swapped_in_when_a_rebuild_finishes() {
        let mut controller = RenderCacheController::new();
        let cell = OverlayCell {
            coord: HexCoord::new(1, 1),
            bounds: PixelRect::new(30, 15, 20, 20),
            kind: OverlayKind::Animation(AnimationRef::new(2)),
        };

        let _ = controller.plan_frame(&frame());
        controller.record_overlay(cell);
        assert!(controller.overlays().is_empty());
        controller.finish_rebuild(&frame());
        assert_eq!(controller.overlays(), &[cell]);

        let moved = FrameContext {
            offset: PixelPoint::new(0, 9),
            ..frame()
        };
        let _ = controller.plan_frame(&moved);
        controller.finish_rebuild(&moved);
        assert!(controller.overlays().is_empty());
        assert_eq!(controller.rebuild_count(), 2);
    }
}
