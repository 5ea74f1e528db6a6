use glam::Vec2;
use parallax::{
    render_frame, reproject, ColorImage, DepthImage, DepthSampler, DriverConfig, FrameDriver,
    KernelParams, ProjectionSettings, ReprojectionVectors, Source, Viewpoint,
};

const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
const GREEN: [f32; 4] = [0.0, 1.0, 0.0, 1.0];

fn no_zoom() -> ProjectionSettings {
    ProjectionSettings {
        upscale: 1.0,
        ..ProjectionSettings::default()
    }
}

#[test]
fn solid_red_with_flat_depth_stays_red() {
    let color = ColorImage::solid(2, 2, [1.0, 0.0, 0.0, 1.0]);
    let depth = DepthImage::constant(2, 2, 0.5);
    let frame = render_frame(
        &color,
        &depth,
        Viewpoint::ZERO,
        (2, 2),
        &KernelParams::default(),
        &ProjectionSettings::default(),
        0,
    );
    for pixel in frame.image().pixels() {
        assert_eq!(pixel.0, [255, 0, 0, 255]);
    }
}

#[test]
fn depth_edge_blends_colors_under_parallax() {
    // Blue on the left, green on the right; the left half is near the camera.
    let color = ColorImage::from_fn(8, 4, |x, _| if x < 4 { BLUE } else { GREEN });
    let depth = DepthImage::from_fn(8, 4, |x, _| if x < 4 { 0.0 } else { 1.0 });
    let frame = render_frame(
        &color,
        &depth,
        Viewpoint::new(0.02, 0.0),
        (8, 4),
        &KernelParams::default(),
        &no_zoom(),
        0,
    );

    for y in 0..4 {
        let row: Vec<[u8; 4]> = (0..8).map(|x| frame.image().get_pixel(x, y).0).collect();
        assert_eq!(row[0], [0, 0, 255, 255], "row {y} left edge");
        assert_eq!(row[7], [0, 255, 0, 255], "row {y} right edge");
        assert!(
            row.iter().any(|pixel| pixel[1] > 0 && pixel[2] > 0),
            "row {y} has no blended pixel: {row:?}"
        );
    }
}

#[test]
fn anti_alias_retry_shifts_sampled_colors() {
    let color = ColorImage::from_fn(16, 4, |x, _| [x as f32 / 15.0, 0.0, 0.0, 1.0]);
    let depth = DepthImage::constant(16, 4, 0.5);
    let smoothed = KernelParams {
        correct: false,
        ..KernelParams::default()
    };
    let plain = KernelParams {
        anti_alias: false,
        ..smoothed
    };
    let render = |params: &KernelParams| {
        render_frame(
            &color,
            &depth,
            Viewpoint::new(0.2, 0.0),
            (16, 4),
            params,
            &no_zoom(),
            0,
        )
    };

    let with_retry = render(&smoothed);
    let without = render(&plain);
    for y in 0..4 {
        let a = with_retry.image().get_pixel(8, y).0[0];
        let b = without.image().get_pixel(8, y).0[0];
        // The retry keeps the average one step closer to the far endpoint.
        assert!(a > b + 4, "row {y}: {a} vs {b}");
    }
}

#[test]
fn flat_depth_shifts_every_pixel_alike() {
    let depth = DepthImage::constant(16, 16, 0.3);
    let params = KernelParams::default();
    let projection = ProjectionSettings::default();
    let sampler = DepthSampler::new(&depth, params.band());
    let vectors = ReprojectionVectors::from_viewpoint(Viewpoint::new(-0.015, 0.006), &projection);

    let shifts: Vec<Vec2> = [(0.1, 0.2), (0.5, 0.5), (0.8, 0.35), (0.65, 0.9)]
        .into_iter()
        .map(|(x, y)| {
            let pos = Vec2::new(x, y);
            reproject(pos, &vectors, &params, &sampler).coord - pos
        })
        .collect();
    for shift in &shifts[1..] {
        assert!((*shift - shifts[0]).length() < 1e-5, "{shift} vs {}", shifts[0]);
    }
}

#[test]
fn identical_inputs_render_identical_frames() {
    let color = ColorImage::from_fn(12, 9, |x, y| {
        [x as f32 / 11.0, y as f32 / 8.0, ((x * y) % 5) as f32 / 4.0, 1.0]
    });
    let depth = DepthImage::from_fn(12, 9, |x, y| ((x + 2 * y) % 7) as f32 / 6.0);
    let render = || {
        render_frame(
            &color,
            &depth,
            Viewpoint::new(0.008, -0.004),
            (24, 18),
            &KernelParams::default(),
            &ProjectionSettings::default(),
            0,
        )
    };
    let first = render();
    let second = render();
    assert_eq!(first.image().as_raw(), second.image().as_raw());
    assert_eq!(first.fallback_pixels(), second.fallback_pixels());
}

#[test]
fn driver_renders_source_pair_through_pool() {
    let mut driver = FrameDriver::new(DriverConfig {
        threads: Some(3),
        projection: no_zoom(),
        ..DriverConfig::new((8, 4))
    })
    .expect("driver");
    driver.replace_color(Source::still(ColorImage::from_fn(8, 4, |x, _| {
        if x < 4 {
            BLUE
        } else {
            GREEN
        }
    })));
    driver.replace_depth(Source::still(DepthImage::constant(8, 4, 0.5)));

    let frame = driver.update(Viewpoint::ZERO);
    assert_eq!(frame.image().get_pixel(3, 0).0, [0, 0, 255, 255]);
    assert_eq!(frame.image().get_pixel(4, 0).0, [0, 255, 0, 255]);
}
