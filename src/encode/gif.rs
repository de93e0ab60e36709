use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use image::{
    Delay, Frame, RgbaImage,
    codecs::gif::{GifEncoder, Repeat},
};

use crate::{
    encode::sink::{FrameSink, SinkConfig, check_order, check_size},
    foundation::{
        core::FrameIndex,
        error::{LufsError, LufsResult},
    },
    publish::Staged,
};

/// NeuQuant sampling factor (1 = best quality, 30 = fastest).
pub const GIF_QUANT_SPEED: i32 = 10;

/// Looping GIF sink. Writes to a staged temporary file and publishes it on `end`.
pub struct GifSink {
    out_path: PathBuf,
    speed: i32,
    state: Option<GifState>,
}

struct GifState {
    cfg: SinkConfig,
    staged: Staged,
    encoder: GifEncoder<BufWriter<ErrorLatch<File>>>,
    write_error: WriteErrorSlot,
    delay: Delay,
    last_idx: Option<FrameIndex>,
}

pub(crate) type WriteErrorSlot = Arc<Mutex<Option<io::Error>>>;

/// Writer that remembers the first I/O error it returns.
///
/// `gif::Encoder` writes its trailer and `BufWriter` flushes on drop, both discarding errors.
/// Latching below the buffer keeps those failures observable after the encoder is gone.
pub(crate) struct ErrorLatch<W> {
    inner: W,
    slot: WriteErrorSlot,
}

impl<W: Write> ErrorLatch<W> {
    pub(crate) fn new(inner: W) -> (Self, WriteErrorSlot) {
        let slot = WriteErrorSlot::default();
        (
            Self {
                inner,
                slot: Arc::clone(&slot),
            },
            slot,
        )
    }

    fn latch<T>(&self, res: io::Result<T>) -> io::Result<T> {
        if let Err(e) = &res
            && e.kind() != io::ErrorKind::Interrupted
        {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                *slot = Some(io::Error::new(e.kind(), e.to_string()));
            }
        }
        res
    }
}

impl<W: Write> Write for ErrorLatch<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let res = self.inner.write(buf);
        self.latch(res)
    }

    fn flush(&mut self) -> io::Result<()> {
        let res = self.inner.flush();
        self.latch(res)
    }
}

/// Take the first latched write error, if any.
pub(crate) fn take_write_error(slot: &WriteErrorSlot) -> Option<io::Error> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

fn gif_error(path: &Path, e: image::ImageError) -> LufsError {
    match e {
        image::ImageError::IoError(io) => LufsError::filesystem(path, io),
        other => LufsError::render(format!("gif encoding failed: {other}")),
    }
}

impl GifSink {
    /// Sink publishing to `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            speed: GIF_QUANT_SPEED,
            state: None,
        }
    }

    /// Override the quantizer speed (clamped to `1..=30`).
    pub fn with_speed(mut self, speed: i32) -> Self {
        self.speed = speed.clamp(1, 30);
        self
    }

    /// Destination path.
    pub fn out_path(&self) -> &Path {
        &self.out_path
    }
}

impl FrameSink for GifSink {
    fn begin(&mut self, cfg: SinkConfig) -> LufsResult<()> {
        let mut staged = Staged::new(&self.out_path)?;
        let file = staged
            .file_mut()
            .try_clone()
            .map_err(|e| LufsError::filesystem(staged.temp_path(), e))?;
        let (latch, write_error) = ErrorLatch::new(file);
        let mut encoder = GifEncoder::new_with_speed(BufWriter::new(latch), self.speed);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| gif_error(staged.temp_path(), e))?;

        let (numer, denom) = cfg.fps.frame_delay_ms();
        self.state = Some(GifState {
            cfg,
            staged,
            encoder,
            write_error,
            delay: Delay::from_numer_denom_ms(numer, denom),
            last_idx: None,
        });
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbaImage) -> LufsResult<()> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| LufsError::render("gif sink not started"))?;
        check_order(state.last_idx, idx)?;
        check_size(&state.cfg, frame)?;
        state.last_idx = Some(idx);

        let frame = Frame::from_parts(frame.clone(), 0, 0, state.delay);
        state
            .encoder
            .encode_frame(frame)
            .map_err(|e| gif_error(state.staged.temp_path(), e))
    }

    fn end(&mut self) -> LufsResult<()> {
        let state = self
            .state
            .take()
            .ok_or_else(|| LufsError::render("gif sink not started"))?;
        if state.last_idx.is_none() {
            return Err(LufsError::render("gif sink received no frames"));
        }
        // Dropping the encoder writes the trailer and flushes the buffered writer.
        drop(state.encoder);
        if let Some(e) = take_write_error(&state.write_error) {
            return Err(LufsError::filesystem(state.staged.temp_path(), e));
        }
        let path = state.staged.publish()?;
        tracing::debug!(path = %path.display(), "wrote gif");
        Ok(())
    }
}
