use image::RgbaImage;

use crate::{composite::mean_abs_diff, foundation::error::LufsResult};

/// Largest mean absolute channel difference between the last and first frame that still
/// counts as a seamless loop.
pub const SEAM_THRESHOLD: f64 = 1.0;

/// Number of head/tail pairs to blend: `round(crossfade_secs · fps)`, at most half the frames.
///
/// At least the seam pair itself is blended whenever the loop has two or more frames, so a
/// crossfade shorter than one frame still closes the loop.
pub fn seam_frame_count(crossfade_secs: f64, fps: f64, frame_count: u64) -> u64 {
    let k = (crossfade_secs * fps).round().max(0.0) as u64;
    k.max(1).min(frame_count / 2)
}

/// Weight the partner frame receives for pair `j` of `k`: `0.5 · (1 − j/k)`.
///
/// The seam pair (`j = 0`) averages both frames; the weight falls linearly to zero.
pub fn seam_weight(j: u64, k: u64) -> f32 {
    if k == 0 || j >= k {
        return 0.0;
    }
    0.5 * (1.0 - j as f32 / k as f32)
}

/// `out = own + (partner − own) · w`, rounded per channel.
///
/// Blending `(a, b, w)` and `(b, a, w)` with `w = 0.5` yields identical rasters.
pub fn blend_toward(own: &RgbaImage, partner: &RgbaImage, w: f32) -> RgbaImage {
    let mut out = own.clone();
    for (o, p) in out.as_mut().iter_mut().zip(partner.as_raw()) {
        let a = f32::from(*o);
        let b = f32::from(*p);
        *o = (a + (b - a) * w).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Mean absolute channel difference between the last and first frame.
pub fn seam_difference(first: &RgbaImage, last: &RgbaImage) -> LufsResult<f64> {
    mean_abs_diff(first, last)
}

/// Return `true` when the loop seam is below [`SEAM_THRESHOLD`].
pub fn is_seamless(first: &RgbaImage, last: &RgbaImage) -> LufsResult<bool> {
    Ok(seam_difference(first, last)? < SEAM_THRESHOLD)
}
