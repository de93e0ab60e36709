use image::RgbaImage;

use crate::foundation::{
    core::Rgba8Premul,
    error::{LufsError, LufsResult},
    math::mul_div255_u8,
};

pub type PremulRgba8 = [u8; 4];

/// Porter-Duff "source over" for premultiplied pixels, with extra `opacity` on `src`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

/// Linear blend `a → b` at `t ∈ [0, 1]`.
pub fn crossfade(a: PremulRgba8, b: PremulRgba8, t: f32) -> PremulRgba8 {
    let t = t.clamp(0.0, 1.0);
    let tt = ((t * 255.0).round() as i32).clamp(0, 255) as u16;
    let it = 255u16 - tt;

    let mut out = [0u8; 4];
    for i in 0..4 {
        let av = mul_div255(u16::from(a[i]), it);
        let bv = mul_div255(u16::from(b[i]), tt);
        out[i] = add_sat_u8(av, bv);
    }
    out
}

/// Composite straight-alpha `src` over premultiplied `dst` with its top-left at `(x, y)`.
///
/// Pixels of `src` falling outside `dst` are ignored.
pub fn over_image_at(dst: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64, opacity: f32) {
    for (sx, sy, px) in src.enumerate_pixels() {
        let dx = x + i64::from(sx);
        let dy = y + i64::from(sy);
        if dx < 0 || dy < 0 || dx >= i64::from(dst.width()) || dy >= i64::from(dst.height()) {
            continue;
        }
        let s = Rgba8Premul::from_straight_rgba(px[0], px[1], px[2], px[3]).to_array();
        let d = dst.get_pixel_mut(dx as u32, dy as u32);
        d.0 = over(d.0, s, opacity);
    }
}

/// Fill a rectangle of premultiplied `dst` with a straight-alpha color using "over".
pub fn fill_rect_over(dst: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: [u8; 4]) {
    let s = Rgba8Premul::from_straight_rgba(color[0], color[1], color[2], color[3]).to_array();
    let x_end = x.saturating_add(w).min(dst.width());
    let y_end = y.saturating_add(h).min(dst.height());
    for yy in y..y_end {
        for xx in x..x_end {
            let d = dst.get_pixel_mut(xx, yy);
            d.0 = over(d.0, s, 1.0);
        }
    }
}

/// Blend two equal-size rasters: `out = a·(1 − t) + b·t`.
pub fn crossfade_images(a: &RgbaImage, b: &RgbaImage, t: f32) -> LufsResult<RgbaImage> {
    if a.dimensions() != b.dimensions() {
        return Err(LufsError::validation(format!(
            "crossfade expects equal-size frames, got {:?} and {:?}",
            a.dimensions(),
            b.dimensions()
        )));
    }
    let mut out = RgbaImage::new(a.width(), a.height());
    for ((o, pa), pb) in out
        .as_mut()
        .chunks_exact_mut(4)
        .zip(a.as_raw().chunks_exact(4))
        .zip(b.as_raw().chunks_exact(4))
    {
        let blended = crossfade([pa[0], pa[1], pa[2], pa[3]], [pb[0], pb[1], pb[2], pb[3]], t);
        o.copy_from_slice(&blended);
    }
    Ok(out)
}

/// Mean absolute per-channel difference between two equal-size rasters.
pub fn mean_abs_diff(a: &RgbaImage, b: &RgbaImage) -> LufsResult<f64> {
    if a.dimensions() != b.dimensions() {
        return Err(LufsError::validation("mean_abs_diff expects equal-size rasters"));
    }
    let raw_a = a.as_raw();
    let raw_b = b.as_raw();
    if raw_a.is_empty() {
        return Ok(0.0);
    }
    let total: u64 = raw_a
        .iter()
        .zip(raw_b)
        .map(|(x, y)| u64::from(x.abs_diff(*y)))
        .sum();
    Ok(total as f64 / raw_a.len() as f64)
}

fn mul_div255(x: u16, y: u16) -> u8 {
    mul_div255_u8(x, y)
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
#[path = "../tests/unit/composite.rs"]
mod tests;
