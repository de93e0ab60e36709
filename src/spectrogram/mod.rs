//! Time–frequency rendering of decoded audio.
//!
//! Pipeline: centered STFT ([`stft`]) → mel projection ([`mel`]) → log magnitude normalized per
//! image → colormap with saturation ([`colormap`]) → two fixed-size rasters.

pub mod colormap;
pub mod mel;
pub mod stft;

use image::RgbaImage;
use rayon::prelude::*;

pub use colormap::Saturation;

use crate::{
    audio::AudioSource,
    foundation::error::{LufsError, LufsResult},
    spectrogram::{mel::MelFilterBank, stft::MelFrames},
};

/// Width of the full-duration rectangular raster.
pub const FULL_WIDTH: u32 = 1536;
/// Height shared by both rasters.
pub const SPECTROGRAM_HEIGHT: u32 = 512;
/// Side of the square raster used for artwork.
pub const SQUARE_SIDE: u32 = SPECTROGRAM_HEIGHT;
/// Dynamic range kept below the loudest cell, in dB.
pub const TOP_DB: f32 = 80.0;

const POWER_FLOOR: f32 = 1e-10;

/// A rendered spectrogram raster.
#[derive(Clone, Debug)]
pub struct SpectrogramImage {
    /// Opaque RGBA pixels.
    pub image: RgbaImage,
    /// Saturation used for the color mapping.
    pub saturation: Saturation,
}

/// Both spectrogram variants produced for one input.
#[derive(Clone, Debug)]
pub struct SpectrogramPair {
    /// Centered `SQUARE_SIDE × SQUARE_SIDE` crop for the artwork path.
    pub square: SpectrogramImage,
    /// Full-duration `FULL_WIDTH × SPECTROGRAM_HEIGHT` raster.
    pub full: SpectrogramImage,
}

/// Normalized log-magnitude grid in `[0, 1]`, frame-major like [`MelFrames`].
#[derive(Clone, Debug)]
pub struct LevelGrid {
    levels: Vec<f32>,
    n_frames: usize,
    n_mels: usize,
}

impl LevelGrid {
    /// Convert mel power to normalized levels.
    ///
    /// Levels are `(dB − max_dB + TOP_DB) / TOP_DB`, floored at 0. A grid without dynamic range
    /// (silence, DC) collapses to all zeros instead of dividing by zero.
    pub fn from_power(frames: &MelFrames) -> Self {
        let db: Vec<f32> = frames
            .power
            .iter()
            .map(|&p| 10.0 * p.max(POWER_FLOOR).log10())
            .collect();
        let max_db = db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let min_db = db.iter().copied().fold(f32::INFINITY, f32::min);

        let flat = !(max_db - min_db).is_normal();
        let levels = if flat {
            vec![0.0; db.len()]
        } else {
            db.iter()
                .map(|&d| ((d - max_db).max(-TOP_DB) + TOP_DB) / TOP_DB)
                .collect()
        };

        Self {
            levels,
            n_frames: frames.n_frames,
            n_mels: frames.n_mels,
        }
    }

    /// Bilinear sample at fractional `(frame, band)`.
    pub fn sample(&self, frame: f32, band: f32) -> f32 {
        let f0 = (frame.floor() as usize).min(self.n_frames - 1);
        let f1 = (f0 + 1).min(self.n_frames - 1);
        let b0 = (band.floor() as usize).min(self.n_mels - 1);
        let b1 = (b0 + 1).min(self.n_mels - 1);
        let tf = (frame - f0 as f32).clamp(0.0, 1.0);
        let tb = (band - b0 as f32).clamp(0.0, 1.0);

        let at = |f: usize, b: usize| self.levels[f * self.n_mels + b];
        let low = at(f0, b0) + (at(f1, b0) - at(f0, b0)) * tf;
        let high = at(f0, b1) + (at(f1, b1) - at(f0, b1)) * tf;
        low + (high - low) * tb
    }

    /// Largest level in the grid.
    pub fn max_level(&self) -> f32 {
        self.levels.iter().copied().fold(0.0, f32::max)
    }
}

/// Rasterize `grid` at `width × height`: time runs left to right over the full duration,
/// row 0 holds the highest band.
pub fn rasterize(grid: &LevelGrid, width: u32, height: u32, saturation: Saturation) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    let frame_scale = if width > 1 {
        (grid.n_frames - 1) as f32 / (width - 1) as f32
    } else {
        0.0
    };
    let band_scale = if height > 1 {
        (grid.n_mels - 1) as f32 / (height - 1) as f32
    } else {
        0.0
    };
    let row_bytes = width as usize * 4;

    img.par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            let band = (height as usize - 1 - y) as f32 * band_scale;
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let level = grid.sample(x as f32 * frame_scale, band);
                let [r, g, b] = colormap::colorize(level, saturation);
                px.copy_from_slice(&[r, g, b, 255]);
            }
        });
    img
}

/// Render both spectrogram variants for `audio`.
///
/// Fails with [`LufsError::Render`] only when there are no samples (or no sample rate);
/// short and silent inputs render normally.
#[tracing::instrument(level = "debug", skip(audio), fields(samples = audio.samples.len()))]
pub fn render(audio: &AudioSource, saturation: Saturation) -> LufsResult<SpectrogramPair> {
    if audio.samples.is_empty() {
        return Err(LufsError::render(format!(
            "'{}' decoded to an empty sample buffer",
            audio.path.display()
        )));
    }
    if audio.sample_rate == 0 {
        return Err(LufsError::render(format!(
            "'{}' has no sample rate",
            audio.path.display()
        )));
    }

    let bank = MelFilterBank::new(audio.sample_rate);
    let frames = stft::mel_power_frames(&audio.samples, &bank);
    let grid = LevelGrid::from_power(&frames);
    tracing::debug!(
        frames = frames.n_frames,
        peak = grid.max_level(),
        "computed mel spectrogram"
    );

    let full = rasterize(&grid, FULL_WIDTH, SPECTROGRAM_HEIGHT, saturation);
    let square = center_square(&full);

    Ok(SpectrogramPair {
        square: SpectrogramImage {
            image: square,
            saturation,
        },
        full: SpectrogramImage {
            image: full,
            saturation,
        },
    })
}

/// Centered square crop with side equal to the image height (or width, if smaller).
pub fn center_square(img: &RgbaImage) -> RgbaImage {
    let side = img.height().min(img.width());
    let left = (img.width() - side) / 2;
    let top = (img.height() - side) / 2;
    image::imageops::crop_imm(img, left, top, side, side).to_image()
}

#[cfg(test)]
#[path = "../../tests/unit/spectrogram/render.rs"]
mod tests;
