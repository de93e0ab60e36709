use crate::spectrogram::stft::{N_BINS, N_FFT};

/// Number of mel bands.
pub const N_MELS: usize = 128;
/// Upper edge of the mel range in Hz (clamped to Nyquist).
pub const F_MAX_HZ: f32 = 8_000.0;

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

/// One triangular band, stored sparsely from `start` bin.
#[derive(Clone, Debug)]
struct Band {
    start: usize,
    weights: Vec<f32>,
}

/// Triangular mel filter bank with area (Slaney) normalization.
#[derive(Clone, Debug)]
pub struct MelFilterBank {
    bands: Vec<Band>,
}

impl MelFilterBank {
    /// Build `N_MELS` bands between 0 Hz and `min(F_MAX_HZ, sample_rate / 2)`.
    pub fn new(sample_rate: u32) -> Self {
        Self::with_bands(sample_rate, N_MELS)
    }

    /// Build `n_mels` bands for `sample_rate`.
    pub fn with_bands(sample_rate: u32, n_mels: usize) -> Self {
        let sr = sample_rate.max(1) as f32;
        let f_max = F_MAX_HZ.min(sr / 2.0);
        let bin_hz = sr / N_FFT as f32;

        let mel_max = hz_to_mel(f_max);
        let edges: Vec<f32> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_max * i as f32 / (n_mels + 1) as f32))
            .collect();

        let bands = (0..n_mels)
            .map(|m| {
                let (lower, center, upper) = (edges[m], edges[m + 1], edges[m + 2]);
                let norm = 2.0 / (upper - lower).max(f32::EPSILON);

                let mut start = None;
                let mut weights = Vec::new();
                for k in 0..N_BINS {
                    let f = k as f32 * bin_hz;
                    let rise = (f - lower) / (center - lower).max(f32::EPSILON);
                    let fall = (upper - f) / (upper - center).max(f32::EPSILON);
                    let w = rise.min(fall).max(0.0);
                    if w > 0.0 {
                        start.get_or_insert(k);
                        weights.push(w * norm);
                    } else if start.is_some() {
                        break;
                    }
                }

                match start {
                    Some(start) => Band { start, weights },
                    // Band narrower than one FFT bin: sample the bin nearest its center.
                    None => Band {
                        start: ((center / bin_hz).round() as usize).min(N_BINS - 1),
                        weights: vec![1.0],
                    },
                }
            })
            .collect();

        Self { bands }
    }

    /// Number of bands.
    pub fn n_mels(&self) -> usize {
        self.bands.len()
    }

    /// Project one power spectrum (`N_BINS` values) onto the bands.
    pub fn apply(&self, power: &[f32]) -> Vec<f32> {
        self.bands
            .iter()
            .map(|b| {
                b.weights
                    .iter()
                    .zip(&power[b.start..])
                    .map(|(w, p)| w * p)
                    .sum()
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/spectrogram/mel.rs"]
mod tests;
