use std::f64::consts::TAU;

use crate::foundation::math::noise01;

/// Lowest fraction of the configured intensity any keyframe receives.
pub const INTENSITY_FLOOR: f32 = 0.35;

const PERIODIC_WEIGHT: f64 = 0.6;
const SCHEDULE_SALT: u64 = 0x5EED_0F61_17C4;

/// Deterministic per-keyframe glitch intensity.
///
/// `intensity(k) = base · (FLOOR + (1 − FLOOR) · pulse(k))`, where `pulse` mixes a raised cosine
/// that completes one period over the loop with seeded value noise. The cosine term makes the
/// schedule periodic, so the last keyframe leads smoothly back into the first.
#[derive(Clone, Copy, Debug)]
pub struct IntensitySchedule {
    base: f32,
    seed: u64,
    keyframes: usize,
}

impl IntensitySchedule {
    /// Schedule over `keyframes` keyframes for a run seeded with `seed`.
    pub fn new(base: f32, seed: u64, keyframes: usize) -> Self {
        Self {
            base: base.clamp(0.0, 1.0),
            seed,
            keyframes: keyframes.max(1),
        }
    }

    /// Pulse in `[0, 1]` for keyframe `k`.
    pub fn pulse(&self, k: usize) -> f32 {
        let phase = (k % self.keyframes) as f64 / self.keyframes as f64;
        let raised = 0.5 - 0.5 * (TAU * phase).cos();
        let noise = noise01(self.seed ^ SCHEDULE_SALT, k as u64);
        (PERIODIC_WEIGHT * raised + (1.0 - PERIODIC_WEIGHT) * noise).clamp(0.0, 1.0) as f32
    }

    /// Effective intensity for keyframe `k`.
    pub fn intensity(&self, k: usize) -> f32 {
        self.base * (INTENSITY_FLOOR + (1.0 - INTENSITY_FLOOR) * self.pulse(k))
    }
}
