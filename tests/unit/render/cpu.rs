use super::*;
use crate::foundation::core::Canvas;

const RED: Rgba8Premul = Rgba8Premul {
    r: 255,
    g: 0,
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
fn allocate_hands_out_cleared_buffers_even_when_reused() {
    let mut engine = CpuEngine::default();
    let desc = SurfaceDesc::rgba8_premul(Canvas::new(4, 4));

    let mut a = engine.allocate_intermediate(desc).unwrap();
    a.data.fill(7);
    engine.release_intermediate(a);

    let b = engine.allocate_intermediate(desc).unwrap();
    assert!(b.data.iter().all(|&v| v == 0));
    assert_eq!(engine.stats().pool.reused_surfaces, 1);
    engine.release_intermediate(b);
    assert_eq!(engine.stats().live_intermediates, 0);
    assert_eq!(engine.stats().live_bytes, 0);
}

#[test]
fn allocation_past_live_limit_is_resource_exhausted() {
    let mut engine = CpuEngine::new(CpuEngineOpts {
        max_live_bytes: 4 * 4 * 4,
        ..CpuEngineOpts::default()
    });
    let desc = SurfaceDesc::rgba8_premul(Canvas::new(4, 4));
    let a = engine.allocate_intermediate(desc).unwrap();
    let err = engine.allocate_intermediate(desc).unwrap_err();
    assert!(matches!(err, WarpError::ResourceExhausted(_)));

    engine.release_intermediate(a);
    let b = engine.allocate_intermediate(desc).unwrap();
    engine.release_intermediate(b);
}

#[test]
fn opaque_overlay_replaces_its_frame_only() {
    let mut engine = CpuEngine::default();
    let mut dst = ImageRGBA::solid(Canvas::new(100, 100), BLUE);
    let sticker = ImageRGBA::solid(Canvas::new(10, 10), RED);

    engine
        .blend_over(
            &mut dst,
            &sticker,
            Rect::new(0.0, 0.0, 10.0, 10.0),
            BlendMode::Normal,
        )
        .unwrap();

    for y in 0..100 {
        for x in 0..100 {
            let want = if x < 10 && y < 10 { RED } else { BLUE };
            assert_eq!(dst.pixel(x, y), Some(want), "pixel ({x}, {y})");
        }
    }
}

#[test]
fn overlay_is_stretched_to_its_frame() {
    let mut engine = CpuEngine::default();
    let mut dst = ImageRGBA::solid(Canvas::new(8, 8), BLUE);
    let dot = ImageRGBA::solid(Canvas::new(1, 1), RED);

    engine
        .blend_over(&mut dst, &dot, Rect::new(2.0, 2.0, 6.0, 6.0), BlendMode::Normal)
        .unwrap();

    for y in 0..8 {
        for x in 0..8 {
            let inside = (2..6).contains(&x) && (2..6).contains(&y);
            let want = if inside { RED } else { BLUE };
            assert_eq!(dst.pixel(x, y), Some(want), "pixel ({x}, {y})");
        }
    }
}

#[test]
fn out_of_bounds_frames_are_clipped() {
    let mut engine = CpuEngine::default();
    let mut dst = ImageRGBA::solid(Canvas::new(4, 4), BLUE);
    let sticker = ImageRGBA::solid(Canvas::new(4, 4), RED);

    engine
        .blend_over(
            &mut dst,
            &sticker,
            Rect::new(-2.0, -2.0, 2.0, 2.0),
            BlendMode::Normal,
        )
        .unwrap();
    assert_eq!(dst.pixel(0, 0), Some(RED));
    assert_eq!(dst.pixel(1, 1), Some(RED));
    assert_eq!(dst.pixel(2, 2), Some(BLUE));

    let before = dst.clone();
    engine
        .blend_over(
            &mut dst,
            &sticker,
            Rect::new(50.0, 50.0, 60.0, 60.0),
            BlendMode::Normal,
        )
        .unwrap();
    assert_eq!(dst, before);
}

#[test]
fn empty_frames_and_sources_are_noops() {
    let mut engine = CpuEngine::default();
    let mut dst = ImageRGBA::solid(Canvas::new(4, 4), BLUE);
    let before = dst.clone();
    let sticker = ImageRGBA::solid(Canvas::new(2, 2), RED);
    let empty = ImageRGBA::transparent(Canvas::new(0, 0));

    engine
        .blend_over(&mut dst, &sticker, Rect::new(1.0, 1.0, 1.0, 3.0), BlendMode::Normal)
        .unwrap();
    engine
        .blend_over(&mut dst, &empty, Rect::new(0.0, 0.0, 4.0, 4.0), BlendMode::Normal)
        .unwrap();
    assert_eq!(dst, before);
}

#[test]
fn malformed_source_is_rejected() {
    let mut engine = CpuEngine::default();
    let mut dst = ImageRGBA::solid(Canvas::new(4, 4), BLUE);
    let bad = ImageRGBA {
        width: 2,
        height: 2,
        data: vec![0; 3],
    };
    assert!(
        engine
            .blend_over(&mut dst, &bad, Rect::new(0.0, 0.0, 2.0, 2.0), BlendMode::Normal)
            .is_err()
    );
}

#[test]
fn parallel_and_sequential_remap_match() {
    let mut src = ImageRGBA::transparent(Canvas::new(16, 9));
    for y in 0..9 {
        for x in 0..16 {
            src.set_pixel(x, y, Rgba8Premul::opaque((x * 15) as u8, (y * 25) as u8, 7));
        }
    }
    let map = |p: Point| Point::new(p.x * 0.8 + 1.3, p.y * 1.1 - 0.4);

    let seq = CpuEngine::default();
    let par = CpuEngine::new(CpuEngineOpts {
        parallel: true,
        ..CpuEngineOpts::default()
    });

    let mut a = ImageRGBA::transparent(src.canvas());
    let mut b = ImageRGBA::transparent(src.canvas());
    seq.remap(&src, &mut a, &map, EdgePolicy::ClampToEdge, SampleFilter::Bilinear)
        .unwrap();
    par.remap(&src, &mut b, &map, EdgePolicy::ClampToEdge, SampleFilter::Bilinear)
        .unwrap();
    assert_eq!(a, b);
    assert_ne!(a, src);
}

#[test]
fn half_alpha_overlay_mixes_in_premultiplied_space() {
    let mut engine = CpuEngine::default();
    let mut dst = ImageRGBA::solid(Canvas::new(6, 6), BLUE);
    let sticker = ImageRGBA::solid(
        Canvas::new(3, 3),
        Rgba8Premul::from_straight_rgba(255, 0, 0, 128),
    );

    engine
        .blend_over(&mut dst, &sticker, Rect::new(0.0, 0.0, 3.0, 3.0), BlendMode::Normal)
        .unwrap();

    let mixed = Rgba8Premul::from_array([128, 0, 127, 255]);
    assert_eq!(dst.pixel(1, 1), Some(mixed));
    assert_eq!(dst.pixel(2, 2), Some(mixed));
    assert_eq!(dst.pixel(3, 3), Some(BLUE));
}

#[test]
fn detached_results_leave_the_live_budget() {
    let mut engine = CpuEngine::new(CpuEngineOpts {
        max_live_bytes: 4 * 4 * 4,
        ..CpuEngineOpts::default()
    });
    let desc = SurfaceDesc::rgba8_premul(Canvas::new(4, 4));

    let a = engine.allocate_intermediate(desc).unwrap();
    engine.detach_intermediate(&a);
    assert_eq!(engine.stats().live_intermediates, 0);
    assert_eq!(engine.stats().live_bytes, 0);

    let b = engine.allocate_intermediate(desc).unwrap();
    assert_eq!(engine.stats().live_intermediates, 1);

    // Giving the detached buffer back pools it without touching the live count.
    engine.release_intermediate(a);
    assert_eq!(engine.stats().live_intermediates, 1);
    assert_eq!(engine.stats().pool.retained_surfaces, 1);

    engine.release_intermediate(b);
    assert_eq!(engine.stats().live_intermediates, 0);
    assert_eq!(engine.stats().live_bytes, 0);
}

#[test]
fn foreign_and_malformed_buffers_do_not_skew_accounting() {
    let mut engine = CpuEngine::default();
    let desc = SurfaceDesc::rgba8_premul(Canvas::new(4, 4));
    let live = engine.allocate_intermediate(desc).unwrap();

    engine.release_intermediate(live.clone());
    assert_eq!(engine.stats().live_intermediates, 1);
    assert_eq!(engine.stats().live_bytes, 4 * 4 * 4);

    let malformed = ImageRGBA {
        width: 4,
        height: 4,
        data: vec![0; 10],
    };
    engine.release_intermediate(malformed);
    assert_eq!(engine.stats().pool.retained_surfaces, 1);

    engine.release_intermediate(live);
    assert_eq!(engine.stats().live_intermediates, 0);
    assert_eq!(engine.stats().live_bytes, 0);
    assert_eq!(engine.stats().pool.retained_surfaces, 2);
}
