use super::*;
use crate::{
    canvas::{glitch, seam},
    foundation::core::Dimensions,
};
use image::Rgba;

fn pool() -> rayon::ThreadPool {
    rayon::ThreadPoolBuilder::new()
        .num_threads(2)
        .build()
        .unwrap()
}

fn gradient_artwork(side: u32) -> ArtworkImage {
    let image = RgbaImage::from_fn(side, side, |x, y| {
        Rgba([(x * 255 / side) as u8, (y * 255 / side) as u8, 128, 255])
    });
    ArtworkImage { image }
}

fn small_settings() -> CanvasSettings {
    CanvasSettings {
        dims: Dimensions::new(36, 64).unwrap(),
        fps: Fps::whole(6).unwrap(),
        duration_secs: 2,
        glitch_intensity: 0.8,
        tween_frames: 2,
        crossfade_secs: 0.5,
    }
}

#[test]
fn default_settings_are_valid() {
    let s = CanvasSettings::default();
    s.validate().unwrap();
    assert_eq!(s.frame_count(), 192);
    assert!(s.dims.is_nine_by_sixteen());
}

#[test]
fn validation_rejects_bad_shapes() {
    let mut s = small_settings();
    s.dims = Dimensions::new(40, 64).unwrap();
    assert!(s.validate().is_err());

    let mut s = small_settings();
    s.dims = Dimensions::new(9, 16).unwrap();
    assert!(s.validate().is_err(), "odd sides");

    let mut s = small_settings();
    s.glitch_intensity = 1.5;
    assert!(s.validate().is_err());

    let mut s = small_settings();
    s.duration_secs = 0;
    assert!(s.validate().is_err());

    let mut s = small_settings();
    s.crossfade_secs = -1.0;
    assert!(s.validate().is_err());
}

#[test]
fn plan_places_keyframes_and_wraps_tweens() {
    let plan = FramePlan::new(&small_settings());
    assert_eq!(plan.frame_count, 12);
    assert_eq!(plan.period, 3);
    assert_eq!(plan.keyframe_count, 4);
    assert_eq!(plan.seam_frames, 3);

    assert_eq!(plan.source(FrameIndex(0)), FrameSource::Key(0));
    assert_eq!(plan.source(FrameIndex(3)), FrameSource::Key(1));
    match plan.source(FrameIndex(11)) {
        FrameSource::Tween { from, to, t } => {
            assert_eq!((from, to), (3, 0));
            assert!((t - 2.0 / 3.0).abs() < 1e-6);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn seam_partners_are_symmetric() {
    let plan = FramePlan::new(&small_settings());
    let (p, w) = plan.seam_partner(FrameIndex(0)).unwrap();
    assert_eq!(p, FrameIndex(11));
    assert_eq!(w, 0.5);
    let (p, w) = plan.seam_partner(FrameIndex(11)).unwrap();
    assert_eq!(p, FrameIndex(0));
    assert_eq!(w, 0.5);
    let (_, w1) = plan.seam_partner(FrameIndex(1)).unwrap();
    let (_, w10) = plan.seam_partner(FrameIndex(10)).unwrap();
    assert_eq!(w1, w10);
    assert!(w1 < 0.5);
    assert!(plan.seam_partner(FrameIndex(5)).is_none());
}

#[test]
fn seam_count_is_capped_at_half() {
    assert_eq!(seam::seam_frame_count(0.5, 24.0, 192), 12);
    assert_eq!(seam::seam_frame_count(10.0, 24.0, 10), 5);
    assert_eq!(seam::seam_frame_count(0.0, 24.0, 10), 1);
    assert_eq!(seam::seam_frame_count(0.01, 24.0, 10), 1);
    assert_eq!(seam::seam_frame_count(0.5, 24.0, 1), 0);
    assert_eq!(seam::seam_weight(0, 4), 0.5);
    assert_eq!(seam::seam_weight(2, 4), 0.25);
    assert_eq!(seam::seam_weight(4, 4), 0.0);
}

#[test]
fn sub_frame_crossfade_still_closes_the_loop() {
    let pool = pool();
    for crossfade_secs in [0.0, 0.05] {
        let mut settings = small_settings();
        settings.crossfade_secs = crossfade_secs;
        settings.validate().unwrap();
        let anim = CanvasAnimation::build(&gradient_artwork(64), settings, 7, &pool).unwrap();
        assert_eq!(anim.plan().seam_frames, 1);

        let first = anim.frame(FrameIndex(0)).unwrap();
        let last = anim.frame(FrameIndex(anim.len() - 1)).unwrap();
        let d = seam::seam_difference(&first, &last).unwrap();
        assert!(d < SEAM_THRESHOLD, "crossfade {crossfade_secs}: seam difference {d}");
    }
}

#[test]
fn cover_fit_fills_nine_by_sixteen() {
    let art = gradient_artwork(64);
    let dims = Dimensions::new(36, 64).unwrap();
    let fitted = fit::cover_fit(&art.image, dims);
    assert_eq!(fitted.dimensions(), (36, 64));
    assert!(fitted.pixels().all(|p| p[3] == 255));
    // Horizontal gradient is cropped from the center, so the left edge is no longer black.
    assert!(fitted.get_pixel(0, 32)[0] > 40);
}

#[test]
fn animation_has_expected_shape_and_seamless_loop() {
    let pool = pool();
    let anim = CanvasAnimation::build(&gradient_artwork(64), small_settings(), 99, &pool).unwrap();
    assert_eq!(anim.len(), 12);
    assert_eq!(anim.keyframes().len(), 4);
    assert_eq!(anim.still().dimensions(), (36, 64));

    let frames = anim.frames(&pool).unwrap();
    assert_eq!(frames.len(), 12);
    assert!(frames.iter().all(|f| f.dimensions() == (36, 64)));

    let first = &frames[0];
    let last = &frames[11];
    assert!(seam::seam_difference(first, last).unwrap() < SEAM_THRESHOLD);
    assert!(seam::is_seamless(first, last).unwrap());
}

#[test]
fn animation_is_deterministic_per_seed() {
    let pool = pool();
    let art = gradient_artwork(64);
    let a = CanvasAnimation::build(&art, small_settings(), 7, &pool).unwrap();
    let b = CanvasAnimation::build(&art, small_settings(), 7, &pool).unwrap();
    let c = CanvasAnimation::build(&art, small_settings(), 8, &pool).unwrap();
    let fa = a.frames(&pool).unwrap();
    let fb = b.frames(&pool).unwrap();
    let fc = c.frames(&pool).unwrap();
    assert!(fa.iter().zip(&fb).all(|(x, y)| x.as_raw() == y.as_raw()));
    assert!(fa.iter().zip(&fc).any(|(x, y)| x.as_raw() != y.as_raw()));
}

#[test]
fn thread_count_does_not_change_pixels() {
    let art = gradient_artwork(64);
    let one = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
    let four = rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap();
    let a = CanvasAnimation::build(&art, small_settings(), 5, &one).unwrap();
    let b = CanvasAnimation::build(&art, small_settings(), 5, &four).unwrap();
    let fa = a.frames(&one).unwrap();
    let fb = b.frames(&four).unwrap();
    assert!(fa.iter().zip(&fb).all(|(x, y)| x.as_raw() == y.as_raw()));
}

#[test]
fn out_of_range_frame_is_rejected() {
    let pool = pool();
    let anim = CanvasAnimation::build(&gradient_artwork(64), small_settings(), 1, &pool).unwrap();
    assert!(anim.frame(FrameIndex(12)).is_err());
}

#[test]
fn zero_intensity_keeps_the_still() {
    let still = gradient_artwork(32).image;
    let mut rng = Rng64::new(3);
    let out = glitch::glitch_keyframe(&still, 0.0, &mut rng);
    assert_eq!(out.as_raw(), still.as_raw());
}

#[test]
fn channel_displacement_moves_red_right_and_blue_left() {
    let mut src = RgbaImage::from_pixel(100, 1, Rgba([0, 0, 0, 255]));
    src.put_pixel(50, 0, Rgba([255, 0, 255, 255]));
    let mut rng = Rng64::new(11);
    let out = glitch::channel_displace(&src, 1.0, &mut rng);
    let red_at = (0..100).find(|&x| out.get_pixel(x, 0)[0] == 255).unwrap();
    let blue_at = (0..100).find(|&x| out.get_pixel(x, 0)[2] == 255).unwrap();
    assert!(red_at > 50);
    assert!(blue_at < 50);
    assert_eq!(red_at - 50, 50 - blue_at);
}

#[test]
fn scanlines_darken_odd_rows_only() {
    let mut frame = RgbaImage::from_pixel(4, 4, Rgba([200, 200, 200, 255]));
    glitch::scanlines(&mut frame, 1.0);
    assert_eq!(frame.get_pixel(0, 0)[0], 200);
    assert_eq!(frame.get_pixel(0, 1)[0], 130);
    assert_eq!(frame.get_pixel(0, 1)[3], 255);
}

#[test]
fn block_displacement_preserves_row_content() {
    let src = RgbaImage::from_fn(40, 40, |x, y| Rgba([x as u8, y as u8, 0, 255]));
    let mut frame = src.clone();
    let mut rng = Rng64::new(21);
    glitch::block_displace(&mut frame, 1.0, &mut rng);
    for y in 0..40 {
        let mut a: Vec<_> = (0..40).map(|x| src.get_pixel(x, y).0).collect();
        let mut b: Vec<_> = (0..40).map(|x| frame.get_pixel(x, y).0).collect();
        a.sort();
        b.sort();
        assert_eq!(a, b, "row {y} lost pixels");
    }
}

#[test]
fn schedule_stays_within_bounds() {
    let s = IntensitySchedule::new(0.8, 42, 16);
    for k in 0..16 {
        let i = s.intensity(k);
        assert!(i >= 0.8 * schedule::INTENSITY_FLOOR - 1e-6);
        assert!(i <= 0.8 + 1e-6);
    }
    assert_eq!(s.intensity(3), IntensitySchedule::new(0.8, 42, 16).intensity(3));
}
