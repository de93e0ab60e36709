use image::{RgbaImage, imageops::FilterType};

use crate::foundation::core::Dimensions;

/// Scale `src` so it covers `target` on both axes, then crop the centered window.
///
/// Aspect ratio is preserved; content is never letterboxed.
pub fn cover_fit(src: &RgbaImage, target: Dimensions) -> RgbaImage {
    let (sw, sh) = src.dimensions();
    if (sw, sh) == (target.width, target.height) {
        return src.clone();
    }

    let scale = f64::max(
        f64::from(target.width) / f64::from(sw),
        f64::from(target.height) / f64::from(sh),
    );
    let rw = ((f64::from(sw) * scale).round() as u32).max(target.width);
    let rh = ((f64::from(sh) * scale).round() as u32).max(target.height);

    let resized = image::imageops::resize(src, rw, rh, FilterType::Lanczos3);
    let left = (rw - target.width) / 2;
    let top = (rh - target.height) / 2;
    image::imageops::crop_imm(&resized, left, top, target.width, target.height).to_image()
}
