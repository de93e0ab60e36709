use image::RgbaImage;

use crate::foundation::core::{Dimensions, Fps, FrameIndex};
use crate::foundation::error::{LufsError, LufsResult};

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinkConfig {
    /// Frame size; every pushed frame must match.
    pub dims: Dimensions,
    /// Playback rate.
    pub fps: Fps,
}

/// Sink contract for consuming canvas frames in loop order.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order between
/// one `begin` and one `end`. Frames are opaque RGBA8.
pub trait FrameSink {
    /// Prepare for a new sequence.
    fn begin(&mut self, cfg: SinkConfig) -> LufsResult<()>;
    /// Consume one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbaImage) -> LufsResult<()>;
    /// Finish the sequence and publish the result.
    fn end(&mut self) -> LufsResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    /// Frames in loop order.
    pub frames: Vec<(FrameIndex, RgbaImage)>,
    finished: bool,
}

impl InMemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration received in `begin`.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Return `true` once `end` was called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> LufsResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbaImage) -> LufsResult<()> {
        check_order(self.frames.last().map(|(i, _)| *i), idx)?;
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> LufsResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// Reject frames that do not advance the sequence.
pub(crate) fn check_order(last: Option<FrameIndex>, idx: FrameIndex) -> LufsResult<()> {
    if let Some(last) = last
        && idx.0 <= last.0
    {
        return Err(LufsError::validation(format!(
            "frame sink received out-of-order frame index {} after {}",
            idx.0, last.0
        )));
    }
    Ok(())
}

/// Reject frames whose size differs from the configured one.
pub(crate) fn check_size(cfg: &SinkConfig, frame: &RgbaImage) -> LufsResult<()> {
    if frame.dimensions() != (cfg.dims.width, cfg.dims.height) {
        return Err(LufsError::validation(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            frame.width(),
            frame.height(),
            cfg.dims.width,
            cfg.dims.height
        )));
    }
    Ok(())
}
