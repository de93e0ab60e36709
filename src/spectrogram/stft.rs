use std::f32::consts::PI;

use rayon::prelude::*;
use rustfft::{FftPlanner, num_complex::Complex};

use crate::spectrogram::mel::MelFilterBank;

/// FFT window length in samples.
pub const N_FFT: usize = 2048;
/// Hop between consecutive analysis windows.
pub const HOP: usize = 512;
/// Number of non-negative frequency bins produced per window.
pub const N_BINS: usize = N_FFT / 2 + 1;

/// Mel-band power frames, frame-major: `power[frame * n_mels + band]`.
#[derive(Clone, Debug)]
pub struct MelFrames {
    /// Flat power values.
    pub power: Vec<f32>,
    /// Number of analysis frames.
    pub n_frames: usize,
    /// Number of mel bands per frame.
    pub n_mels: usize,
}

/// Periodic Hann window value.
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / size as f32).cos())
}

/// Number of frames a centered STFT yields for `len` samples.
pub fn frame_count(len: usize) -> usize {
    1 + len / HOP
}

/// Centered short-time power spectrum projected onto `bank`.
///
/// The signal is zero-padded by `N_FFT / 2` on both sides so the first window is centered on
/// sample 0; inputs shorter than one window still yield one frame.
pub fn mel_power_frames(samples: &[f32], bank: &MelFilterBank) -> MelFrames {
    let pad = N_FFT / 2;
    let n_frames = frame_count(samples.len());
    let window: Vec<f32> = (0..N_FFT).map(|i| hann_window(i, N_FFT)).collect();
    let fft = FftPlanner::<f32>::new().plan_fft_forward(N_FFT);
    let n_mels = bank.n_mels();

    let frames: Vec<Vec<f32>> = (0..n_frames)
        .into_par_iter()
        .map_init(
            || vec![Complex::new(0.0f32, 0.0f32); N_FFT],
            |buf, frame| {
                let start = frame * HOP;
                for (i, slot) in buf.iter_mut().enumerate() {
                    // Position in the unpadded signal.
                    let s = (start + i)
                        .checked_sub(pad)
                        .and_then(|idx| samples.get(idx))
                        .copied()
                        .unwrap_or(0.0);
                    *slot = Complex::new(s * window[i], 0.0);
                }
                fft.process(buf);
                let power: Vec<f32> = buf[..N_BINS].iter().map(|c| c.norm_sqr()).collect();
                bank.apply(&power)
            },
        )
        .collect();

    let mut power = Vec::with_capacity(n_frames * n_mels);
    for f in frames {
        power.extend_from_slice(&f);
    }
    MelFrames {
        power,
        n_frames,
        n_mels,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/spectrogram/stft.rs"]
mod tests;
