use super::*;
use crate::foundation::core::{Point, Rgba8Premul};
use crate::render::cpu::CpuEngine;
use crate::render::engine::{EdgePolicy, SampleFilter, sample_rgba8_premul};
use crate::render::image::SurfaceDesc;

fn solid(w: u32, h: u32, color: Rgba8Premul) -> Arc<ImageRGBA> {
    Arc::new(ImageRGBA::solid(Canvas::new(w, h), color))
}

const RED: Rgba8Premul = Rgba8Premul {
    r: 255,
    g: 0,
    b: 0,
    a: 255,
};
const GREEN: Rgba8Premul = Rgba8Premul {
    r: 0,
    g: 255,
    b: 0,
    a: 255,
};
const BLUE: Rgba8Premul = Rgba8Premul {
    r: 0,
    g: 0,
    b: 255,
    a: 255,
};

#[test]
fn later_overlays_paint_on_top() {
    let mut engine = CpuEngine::default();
    let base = ImageRGBA::solid(Canvas::new(20, 20), BLUE);

    let mut stack = OverlayStack::new();
    stack.add(solid(10, 10, RED), Rect::new(0.0, 0.0, 10.0, 10.0));
    stack.add(solid(10, 10, GREEN), Rect::new(5.0, 5.0, 15.0, 15.0));

    let out = stack
        .composite(&mut engine, &base, CoordOrigin::TopLeft)
        .unwrap();
    assert_eq!(out.pixel(2, 2), Some(RED));
    assert_eq!(out.pixel(7, 7), Some(GREEN));
    assert_eq!(out.pixel(12, 12), Some(GREEN));
    assert_eq!(out.pixel(18, 2), Some(BLUE));

    let mut swapped = OverlayStack::new();
    swapped.add(solid(10, 10, GREEN), Rect::new(5.0, 5.0, 15.0, 15.0));
    swapped.add(solid(10, 10, RED), Rect::new(0.0, 0.0, 10.0, 10.0));
    let out = swapped
        .composite(&mut engine, &base, CoordOrigin::TopLeft)
        .unwrap();
    assert_eq!(out.pixel(7, 7), Some(RED));
}

#[test]
fn composite_leaves_base_untouched() {
    let mut engine = CpuEngine::default();
    let base = ImageRGBA::solid(Canvas::new(8, 8), BLUE);
    let snapshot = base.clone();

    let mut stack = OverlayStack::new();
    stack.add_full_canvas(solid(2, 2, RED));
    let out = stack
        .composite(&mut engine, &base, CoordOrigin::TopLeft)
        .unwrap();

    assert_eq!(base, snapshot);
    assert_eq!(out, ImageRGBA::solid(Canvas::new(8, 8), RED));
}

#[test]
fn bottom_left_origin_places_frames_at_bottom_rows() {
    let mut engine = CpuEngine::default();
    let base = ImageRGBA::solid(Canvas::new(10, 10), BLUE);
    let mut stack = OverlayStack::new();
    stack.add(solid(10, 2, RED), Rect::new(0.0, 0.0, 10.0, 2.0));

    let top = stack
        .composite(&mut engine, &base, CoordOrigin::TopLeft)
        .unwrap();
    assert_eq!(top.pixel(0, 0), Some(RED));
    assert_eq!(top.pixel(0, 9), Some(BLUE));

    let bottom = stack
        .composite(&mut engine, &base, CoordOrigin::BottomLeft)
        .unwrap();
    assert_eq!(bottom.pixel(0, 0), Some(BLUE));
    assert_eq!(bottom.pixel(0, 8), Some(RED));
    assert_eq!(bottom.pixel(0, 9), Some(RED));
}

#[test]
fn with_stickers_pairs_images_and_frames() {
    let frames = vec![
        Rect::new(0.0, 0.0, 1.0, 1.0),
        Rect::new(1.0, 1.0, 2.0, 2.0),
    ];
    let stack = OverlayStack::with_stickers(
        vec![solid(1, 1, RED), solid(1, 1, GREEN)],
        frames.clone(),
    )
    .unwrap();
    assert_eq!(stack.len(), 2);
    for (overlay, frame) in stack.iter().zip(frames) {
        assert_eq!(overlay.placement, Placement::Frame(frame));
    }

    let err = OverlayStack::with_stickers(vec![solid(1, 1, RED)], Vec::new()).unwrap_err();
    assert!(matches!(err, WarpError::Validation(_)));
}

#[test]
fn frames_are_stored_as_given() {
    let mut stack = OverlayStack::new();
    let frame = Rect::new(-50.0, 300.0, 900.0, 310.0);
    stack.add(solid(1, 1, RED), frame);
    assert_eq!(
        stack.get(0).map(|o| o.placement),
        Some(Placement::Frame(frame))
    );
}

#[test]
fn remove_at_and_clear() {
    let mut stack = OverlayStack::new();
    stack.add(solid(1, 1, RED), Rect::new(0.0, 0.0, 1.0, 1.0));
    stack.add_full_canvas(solid(1, 1, GREEN));

    assert!(matches!(
        stack.remove_at(5),
        Err(WarpError::OutOfRange { index: 5, len: 2 })
    ));
    let removed = stack.remove_at(0).unwrap();
    assert_eq!(removed.placement, Placement::Frame(Rect::new(0.0, 0.0, 1.0, 1.0)));
    assert_eq!(stack.get(0).map(|o| o.placement), Some(Placement::FullCanvas));

    stack.clear();
    assert!(stack.is_empty());
}

#[test]
fn shared_images_are_not_copied() {
    let img = solid(3, 3, RED);
    let mut stack = OverlayStack::new();
    stack.add(Arc::clone(&img), Rect::new(0.0, 0.0, 3.0, 3.0));
    stack.add_full_canvas(Arc::clone(&img));
    assert_eq!(Arc::strong_count(&img), 3);
    assert!(stack.iter().all(|o| Arc::ptr_eq(&o.image, &img)));
}

/// Delegates to a `CpuEngine` but fails every blend.
struct FailingBlend {
    inner: CpuEngine,
}

impl RenderEngine for FailingBlend {
    fn sample(
        &self,
        image: &ImageRGBA,
        at: Point,
        edge: EdgePolicy,
        filter: SampleFilter,
    ) -> Rgba8Premul {
        sample_rgba8_premul(image, at, edge, filter)
    }

    fn allocate_intermediate(&mut self, desc: SurfaceDesc) -> WarpResult<ImageRGBA> {
        self.inner.allocate_intermediate(desc)
    }

    fn blend_over(
        &mut self,
        _dst: &mut ImageRGBA,
        _src: &ImageRGBA,
        _frame: Rect,
        _mode: BlendMode,
    ) -> WarpResult<()> {
        Err(WarpError::validation("texture lost"))
    }

    fn release_intermediate(&mut self, image: ImageRGBA) {
        self.inner.release_intermediate(image);
    }
}

#[test]
fn failed_blend_surfaces_render_resource_and_releases_target() {
    let mut engine = FailingBlend {
        inner: CpuEngine::default(),
    };
    let base = ImageRGBA::solid(Canvas::new(4, 4), BLUE);
    let mut stack = OverlayStack::new();
    stack.add_full_canvas(solid(1, 1, RED));

    let err = stack
        .composite(&mut engine, &base, CoordOrigin::TopLeft)
        .unwrap_err();
    assert!(matches!(err, WarpError::RenderResource(ref m) if m.contains("texture lost")));
    assert_eq!(engine.inner.stats().live_intermediates, 0);
}
