use image::{Rgba, RgbaImage, imageops::FilterType};

use crate::{
    composite::{fill_rect_over, over_image_at},
    identicon::{GRID, IdenticonGlyph},
    spectrogram::SpectrogramImage,
};

/// Side of the canonical artwork raster.
pub const ARTWORK_SIZE: u32 = 1024;
/// Opacity of the spectrogram layer over the black base.
pub const SPECTROGRAM_OPACITY: f32 = 0.5;
/// How far the backing plate extends beyond the glyph on each side.
pub const PLATE_PAD: u32 = 24;
/// Straight alpha of the black backing plate.
pub const PLATE_ALPHA: u8 = 96;

const GLYPH_FRACTION: f32 = 0.4;

/// Opaque square artwork.
#[derive(Clone, Debug)]
pub struct ArtworkImage {
    /// `ARTWORK_SIZE × ARTWORK_SIZE`, alpha 255 everywhere.
    pub image: RgbaImage,
}

impl ArtworkImage {
    /// Side length in pixels.
    pub fn side(&self) -> u32 {
        self.image.width()
    }
}

/// Glyph side for an artwork of `side` pixels: 40% of it, rounded to a multiple of the grid.
pub fn glyph_side(side: u32) -> u32 {
    let grid = GRID as f32;
    let cells = (side as f32 * GLYPH_FRACTION / grid).round().max(1.0);
    cells as u32 * GRID as u32
}

/// Composite the glyph over the square spectrogram at the canonical size.
#[tracing::instrument(level = "debug", skip_all)]
pub fn compose(spectrogram: &SpectrogramImage, glyph: &IdenticonGlyph) -> ArtworkImage {
    compose_at(spectrogram, glyph, ARTWORK_SIZE)
}

/// Same as [`compose`] at an arbitrary side length.
pub fn compose_at(
    spectrogram: &SpectrogramImage,
    glyph: &IdenticonGlyph,
    side: u32,
) -> ArtworkImage {
    let mut canvas = RgbaImage::from_pixel(side, side, Rgba([0, 0, 0, 255]));

    let background =
        image::imageops::resize(&spectrogram.image, side, side, FilterType::Lanczos3);
    over_image_at(&mut canvas, &background, 0, 0, SPECTROGRAM_OPACITY);

    let glyph_px = glyph_side(side).min(side);
    let anchor = (side - glyph_px) / 2;

    let plate_anchor = anchor.saturating_sub(PLATE_PAD);
    let plate_side = (glyph_px + 2 * PLATE_PAD).min(side);
    fill_rect_over(
        &mut canvas,
        plate_anchor,
        plate_anchor,
        plate_side,
        plate_side,
        [0, 0, 0, PLATE_ALPHA],
    );

    let raster = glyph.rasterize(glyph_px);
    over_image_at(&mut canvas, &raster, i64::from(anchor), i64::from(anchor), 1.0);

    ArtworkImage { image: canvas }
}

#[cfg(test)]
#[path = "../tests/unit/artwork.rs"]
mod tests;
