//! Keyframe glitch effects.
//!
//! Every effect takes an effective intensity in `[0, 1]` and draws all of its randomness from
//! the caller's [`Rng64`], so a keyframe is a pure function of `(still, intensity, stream)`.

use image::RgbaImage;

use crate::foundation::math::Rng64;

/// Channel offset at full intensity, as a fraction of the frame width.
const CHANNEL_SHIFT_FRACTION: f32 = 0.02;
/// Band count at full intensity.
const MAX_BANDS: f32 = 8.0;
/// Band offset at full intensity, as a fraction of the frame width.
const BAND_SHIFT_FRACTION: f32 = 0.1;
/// Darkening of every other row at full intensity.
const SCANLINE_DARKEN: f32 = 0.35;
/// Share of smeared columns at full intensity.
const SMEAR_COLUMN_CHANCE: f64 = 0.1;
const SMEAR_MIN_LEN: u32 = 10;
const SMEAR_MAX_LEN: u32 = 40;

/// Apply every effect, in order, to a copy of `still`.
pub fn glitch_keyframe(still: &RgbaImage, intensity: f32, rng: &mut Rng64) -> RgbaImage {
    let intensity = intensity.clamp(0.0, 1.0);
    let mut frame = channel_displace(still, intensity, rng);
    block_displace(&mut frame, intensity, rng);
    scanlines(&mut frame, intensity);
    smear(&mut frame, intensity, rng);
    frame
}

/// Shift red to the right and blue to the left; edges clamp.
pub fn channel_displace(src: &RgbaImage, intensity: f32, rng: &mut Rng64) -> RgbaImage {
    let (w, h) = src.dimensions();
    let jitter = 0.5 + 0.5 * rng.next_f64_01() as f32;
    let shift = (intensity * w as f32 * CHANNEL_SHIFT_FRACTION * jitter).round() as i64;
    if shift == 0 || w == 0 {
        return src.clone();
    }

    let last = i64::from(w) - 1;
    let mut out = src.clone();
    for y in 0..h {
        for x in 0..w {
            let xi = i64::from(x);
            let red_from = (xi - shift).clamp(0, last) as u32;
            let blue_from = (xi + shift).clamp(0, last) as u32;
            let r = src.get_pixel(red_from, y)[0];
            let b = src.get_pixel(blue_from, y)[2];
            let px = out.get_pixel_mut(x, y);
            px[0] = r;
            px[2] = b;
        }
    }
    out
}

/// Shift horizontal bands sideways with wrap-around.
pub fn block_displace(frame: &mut RgbaImage, intensity: f32, rng: &mut Rng64) {
    let (w, h) = frame.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let bands = (intensity * MAX_BANDS).round() as u32;
    let max_offset = (intensity * w as f32 * BAND_SHIFT_FRACTION).round() as i64;
    let max_band_h = (h / 20).max(1);
    let row_bytes = w as usize * 4;
    let mut scratch = vec![0u8; row_bytes];

    for _ in 0..bands {
        let top = rng.next_below(u64::from(h)) as u32;
        let band_h = 2 + rng.next_below(u64::from(max_band_h)) as u32;
        let offset = rng.next_signed(max_offset).rem_euclid(i64::from(w)) as usize;
        if offset == 0 {
            continue;
        }
        for y in top..(top + band_h).min(h) {
            let start = y as usize * row_bytes;
            let row = &mut frame.as_mut()[start..start + row_bytes];
            scratch.copy_from_slice(row);
            // out[x] = in[x - offset], with wrap.
            let split = row_bytes - offset * 4;
            row[offset * 4..].copy_from_slice(&scratch[..split]);
            row[..offset * 4].copy_from_slice(&scratch[split..]);
        }
    }
}

/// Darken every odd row by up to `SCANLINE_DARKEN`.
pub fn scanlines(frame: &mut RgbaImage, intensity: f32) {
    let keep = 1.0 - SCANLINE_DARKEN * intensity;
    if keep >= 1.0 {
        return;
    }
    let (w, h) = frame.dimensions();
    for y in (1..h).step_by(2) {
        for x in 0..w {
            let px = frame.get_pixel_mut(x, y);
            for c in 0..3 {
                px[c] = (f32::from(px[c]) * keep).round() as u8;
            }
        }
    }
}

/// Vertical streaks: in a random subset of columns, blend each pixel of a run into the one
/// above it, fading out along the run.
pub fn smear(frame: &mut RgbaImage, intensity: f32, rng: &mut Rng64) {
    let (w, h) = frame.dimensions();
    if h < 2 {
        return;
    }
    let chance = SMEAR_COLUMN_CHANCE * f64::from(intensity);
    for x in 0..w {
        if !rng.chance(chance) {
            continue;
        }
        let len = SMEAR_MIN_LEN
            + rng.next_below(u64::from(SMEAR_MAX_LEN - SMEAR_MIN_LEN + 1)) as u32;
        let len = len.min(h);
        let start = rng.next_below(u64::from(h - len + 1)) as u32;
        for y in start.max(1)..start + len {
            let alpha = 1.0 - (y - start) as f32 / len as f32;
            let above = *frame.get_pixel(x, y - 1);
            let px = frame.get_pixel_mut(x, y);
            for c in 0..3 {
                let v = f32::from(px[c]) * alpha + f32::from(above[c]) * (1.0 - alpha);
                px[c] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}
