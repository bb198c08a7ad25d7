use hexmap_core::{AnimationRef, HexCoord, PixelPoint, PixelRect};
use hexmap_system_render_cache::{
    CacheState, DirtyReason, FrameContext, FramePlan, OverlayCell, OverlayKind,
    RenderCacheController,
};

#[derive(Default)]
struct FrameLog {
    rebuilds: Vec<DirtyReason>,
    replays: usize,
    overlay_draws: usize,
}

fn drive(controller: &mut RenderCacheController, frames: &[FrameContext], log: &mut FrameLog) {
    for frame in frames {
        match controller.plan_frame(frame) {
            FramePlan::Rebuild(reason) => {
                log.rebuilds.push(reason);
                controller.record_overlay(OverlayCell {
                    coord: HexCoord::new(0, 0),
                    bounds: PixelRect::new(0, 0, 20, 20),
                    kind: OverlayKind::Animation(AnimationRef::new(1)),
                });
                controller.record_overlay(OverlayCell {
                    coord: HexCoord::new(1, 0),
                    bounds: PixelRect::new(20, 0, 20, 20),
                    kind: OverlayKind::Label,
                });
                controller.finish_rebuild(frame);
            }
            FramePlan::Replay => {
                log.replays += 1;
                log.overlay_draws += controller.overlays().len();
            }
        }
    }
}

fn still(offset: PixelPoint) -> FrameContext {
    FrameContext {
        offset,
        view: PixelRect::new(0, 0, 640, 480),
        content_revision: 7,
        batch_cached: true,
    }
}

#[test]
fn identical_frames_replay_after_the_first() {
    let mut controller = RenderCacheController::default();
    let mut log = FrameLog::default();
    let frame = still(PixelPoint::new(0, 0));

    drive(&mut controller, &[frame, frame, frame], &mut log);

    assert_eq!(log.rebuilds, vec![DirtyReason::Initial]);
    assert_eq!(log.replays, 2);
    assert_eq!(log.overlay_draws, 4);
    assert_eq!(controller.state(), CacheState::Fresh);
}

#[test]
fn scrolling_rebuilds_once_per_offset() {
    let mut controller = RenderCacheController::default();
    let mut log = FrameLog::default();
    let frames = [
        still(PixelPoint::new(0, 0)),
        still(PixelPoint::new(0, 0)),
        still(PixelPoint::new(-8, 0)),
        still(PixelPoint::new(-8, 0)),
        still(PixelPoint::new(-16, 0)),
    ];

    drive(&mut controller, &frames, &mut log);

    assert_eq!(
        log.rebuilds,
        vec![
            DirtyReason::Initial,
            DirtyReason::OffsetChanged,
            DirtyReason::OffsetChanged,
        ]
    );
    assert_eq!(log.replays, 2);
    assert_eq!(controller.replay_count(), 2);
    assert_eq!(controller.rebuild_count(), 3);
}
