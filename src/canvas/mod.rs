//! Vertical looping canvas built from the artwork.
//!
//! The animation stores the fitted still and its glitch keyframes; individual frames
//! (tweens, loop-seam blends) are derived on demand so that long loops never hold every
//! frame in memory at once. Frames are computed in parallel chunks and handed to the caller
//! in strict frame order.

pub mod fit;
pub mod glitch;
pub mod schedule;
pub mod seam;

use image::RgbaImage;
use rayon::prelude::*;

use crate::{
    artwork::ArtworkImage,
    composite::crossfade_images,
    foundation::{
        core::{Dimensions, Fps, FrameIndex},
        error::{LufsError, LufsResult},
        math::Rng64,
    },
};

pub use schedule::IntensitySchedule;
pub use seam::SEAM_THRESHOLD;

/// Default canvas width.
pub const DEFAULT_WIDTH: u32 = 720;
/// Default canvas height.
pub const DEFAULT_HEIGHT: u32 = 1280;
/// Default frame rate.
pub const DEFAULT_FPS: u32 = 24;
/// Default loop length in seconds.
pub const DEFAULT_DURATION_SECS: u32 = 8;
/// Default glitch intensity in `[0, 1]`.
pub const DEFAULT_GLITCH_INTENSITY: f32 = 0.6;
/// Default number of crossfaded frames between glitch keyframes.
pub const DEFAULT_TWEEN_FRAMES: u32 = 3;
/// Default head/tail crossfade length.
pub const DEFAULT_CROSSFADE_SECS: f64 = 0.5;

/// Frames computed per parallel batch while streaming.
const STREAM_CHUNK: u64 = 24;

/// Validated animation parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasSettings {
    /// Output size; exactly 9:16 with even sides.
    pub dims: Dimensions,
    /// Output frame rate.
    pub fps: Fps,
    /// Loop length.
    pub duration_secs: u32,
    /// Peak glitch intensity in `[0, 1]`.
    pub glitch_intensity: f32,
    /// Crossfaded frames between consecutive keyframes.
    pub tween_frames: u32,
    /// Head/tail crossfade length.
    pub crossfade_secs: f64,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            dims: Dimensions {
                width: DEFAULT_WIDTH,
                height: DEFAULT_HEIGHT,
            },
            fps: Fps {
                num: DEFAULT_FPS,
                den: 1,
            },
            duration_secs: DEFAULT_DURATION_SECS,
            glitch_intensity: DEFAULT_GLITCH_INTENSITY,
            tween_frames: DEFAULT_TWEEN_FRAMES,
            crossfade_secs: DEFAULT_CROSSFADE_SECS,
        }
    }
}

impl CanvasSettings {
    /// Reject settings that cannot produce a valid canvas.
    pub fn validate(&self) -> LufsResult<()> {
        Dimensions::new(self.dims.width, self.dims.height)?;
        Fps::new(self.fps.num, self.fps.den)?;
        if !self.dims.is_nine_by_sixteen() {
            return Err(LufsError::validation(format!(
                "canvas must be 9:16, got {}x{}",
                self.dims.width, self.dims.height
            )));
        }
        if !self.dims.is_even() {
            return Err(LufsError::validation(format!(
                "canvas sides must be even, got {}x{}",
                self.dims.width, self.dims.height
            )));
        }
        if self.duration_secs == 0 {
            return Err(LufsError::validation("canvas duration must be >= 1 second"));
        }
        if !(0.0..=1.0).contains(&self.glitch_intensity) {
            return Err(LufsError::validation(format!(
                "glitch intensity must be within [0, 1], got {}",
                self.glitch_intensity
            )));
        }
        if !self.crossfade_secs.is_finite() || self.crossfade_secs < 0.0 {
            return Err(LufsError::validation(
                "crossfade length must be a non-negative number of seconds",
            ));
        }
        if self.frame_count() == 0 {
            return Err(LufsError::validation("canvas must contain at least one frame"));
        }
        Ok(())
    }

    /// `duration_secs × fps`, rounded.
    pub fn frame_count(&self) -> u64 {
        self.fps.secs_to_frames_round(f64::from(self.duration_secs))
    }
}

/// Where a frame's pixels come from before loop-seam blending.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameSource {
    /// A glitch keyframe as-is.
    Key(usize),
    /// `from → to` crossfade at `t ∈ (0, 1)`.
    Tween {
        /// Keyframe blended from.
        from: usize,
        /// Keyframe blended to (wraps to 0 at the end).
        to: usize,
        /// Blend position.
        t: f32,
    },
}

/// Frame layout of one loop: keyframe spacing plus head/tail seam length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePlan {
    /// Total frames in the loop.
    pub frame_count: u64,
    /// Distance between consecutive keyframes (`tween_frames + 1`).
    pub period: u64,
    /// Number of glitch keyframes.
    pub keyframe_count: usize,
    /// Head/tail pairs blended for the loop seam.
    pub seam_frames: u64,
}

impl FramePlan {
    /// Lay out frames for `settings`.
    pub fn new(settings: &CanvasSettings) -> Self {
        let frame_count = settings.frame_count();
        let period = u64::from(settings.tween_frames) + 1;
        let keyframe_count = frame_count.div_ceil(period).max(1) as usize;
        let seam_frames =
            seam::seam_frame_count(settings.crossfade_secs, settings.fps.as_f64(), frame_count);
        Self {
            frame_count,
            period,
            keyframe_count,
            seam_frames,
        }
    }

    /// Source of frame `idx` before seam blending.
    pub fn source(&self, idx: FrameIndex) -> FrameSource {
        let key = (idx.0 / self.period) as usize;
        let phase = idx.0 % self.period;
        if phase == 0 {
            return FrameSource::Key(key);
        }
        FrameSource::Tween {
            from: key,
            to: (key + 1) % self.keyframe_count,
            t: phase as f32 / self.period as f32,
        }
    }

    /// Partner frame and the weight it contributes, when `idx` lies in the loop seam.
    pub fn seam_partner(&self, idx: FrameIndex) -> Option<(FrameIndex, f32)> {
        let n = self.frame_count;
        let k = self.seam_frames;
        let mirror = n - 1 - idx.0;
        let j = idx.0.min(mirror);
        (j < k).then(|| (FrameIndex(mirror), seam::seam_weight(j, k)))
    }
}

/// Glitch animation over a fitted still.
#[derive(Clone, Debug)]
pub struct CanvasAnimation {
    settings: CanvasSettings,
    plan: FramePlan,
    still: RgbaImage,
    keyframes: Vec<RgbaImage>,
}

impl CanvasAnimation {
    /// Fit `artwork` to the canvas and render the glitch keyframes on `pool`.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(w = settings.dims.width, h = settings.dims.height)
    )]
    pub fn build(
        artwork: &ArtworkImage,
        settings: CanvasSettings,
        seed: u64,
        pool: &rayon::ThreadPool,
    ) -> LufsResult<Self> {
        settings.validate()?;
        let plan = FramePlan::new(&settings);
        let still = fit::cover_fit(&artwork.image, settings.dims);
        let schedule =
            IntensitySchedule::new(settings.glitch_intensity, seed, plan.keyframe_count);

        let keyframes = pool.install(|| {
            (0..plan.keyframe_count)
                .into_par_iter()
                .map(|k| {
                    let mut rng = Rng64::fork(seed, k as u64);
                    glitch::glitch_keyframe(&still, schedule.intensity(k), &mut rng)
                })
                .collect::<Vec<_>>()
        });
        tracing::debug!(
            frames = plan.frame_count,
            keyframes = plan.keyframe_count,
            seam = plan.seam_frames,
            "built canvas keyframes"
        );

        Ok(Self {
            settings,
            plan,
            still,
            keyframes,
        })
    }

    /// The un-glitched fitted still.
    pub fn still(&self) -> &RgbaImage {
        &self.still
    }

    /// Settings the animation was built with.
    pub fn settings(&self) -> &CanvasSettings {
        &self.settings
    }

    /// Frame layout.
    pub fn plan(&self) -> FramePlan {
        self.plan
    }

    /// Number of frames in the loop.
    pub fn len(&self) -> u64 {
        self.plan.frame_count
    }

    /// Return `true` when the loop has no frames.
    pub fn is_empty(&self) -> bool {
        self.plan.frame_count == 0
    }

    /// Glitch keyframes in order.
    pub fn keyframes(&self) -> &[RgbaImage] {
        &self.keyframes
    }

    /// Compute frame `idx`, including loop-seam blending.
    pub fn frame(&self, idx: FrameIndex) -> LufsResult<RgbaImage> {
        if idx.0 >= self.plan.frame_count {
            return Err(LufsError::validation(format!(
                "frame {} out of range (len {})",
                idx.0, self.plan.frame_count
            )));
        }
        let own = self.base_frame(idx)?;
        match self.plan.seam_partner(idx) {
            Some((partner, w)) => {
                let other = self.base_frame(partner)?;
                Ok(seam::blend_toward(&own, &other, w))
            }
            None => Ok(own),
        }
    }

    /// Compute every frame. Intended for short loops and tests.
    pub fn frames(&self, pool: &rayon::ThreadPool) -> LufsResult<Vec<RgbaImage>> {
        let mut out = Vec::with_capacity(self.plan.frame_count as usize);
        self.for_each_frame(pool, |_, frame| {
            out.push(frame);
            Ok(())
        })?;
        Ok(out)
    }

    /// Compute frames in parallel batches and pass them to `f` in frame order.
    pub fn for_each_frame<F>(&self, pool: &rayon::ThreadPool, mut f: F) -> LufsResult<()>
    where
        F: FnMut(FrameIndex, RgbaImage) -> LufsResult<()>,
    {
        let n = self.plan.frame_count;
        let mut chunk_start = 0;
        while chunk_start < n {
            let chunk_end = (chunk_start + STREAM_CHUNK).min(n);
            let rendered = pool.install(|| {
                (chunk_start..chunk_end)
                    .into_par_iter()
                    .map(|i| self.frame(FrameIndex(i)))
                    .collect::<Vec<_>>()
            });
            for (i, frame) in (chunk_start..chunk_end).zip(rendered) {
                f(FrameIndex(i), frame?)?;
            }
            chunk_start = chunk_end;
        }
        Ok(())
    }

    fn base_frame(&self, idx: FrameIndex) -> LufsResult<RgbaImage> {
        match self.plan.source(idx) {
            FrameSource::Key(k) => self.keyframe(k).cloned(),
            FrameSource::Tween { from, to, t } => {
                crossfade_images(self.keyframe(from)?, self.keyframe(to)?, t)
            }
        }
    }

    fn keyframe(&self, k: usize) -> LufsResult<&RgbaImage> {
        self.keyframes
            .get(k)
            .ok_or_else(|| LufsError::render(format!("keyframe {k} missing")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/canvas.rs"]
mod tests;
