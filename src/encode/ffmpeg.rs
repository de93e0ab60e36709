use std::{
    io::{Read, Write as _},
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, ExitStatus, Stdio},
    thread::JoinHandle,
    time::{Duration, Instant},
};

use image::RgbaImage;

use crate::{
    encode::{
        capabilities::FfmpegTool,
        sink::{FrameSink, SinkConfig, check_order, check_size},
    },
    foundation::{
        core::{Fps, FrameIndex},
        error::{LufsError, LufsResult},
    },
    publish::Staged,
};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// MP4 sink that spawns `ffmpeg` and streams raw RGBA frames to its stdin.
///
/// Output is H.264 / yuv420p with `+faststart`. `ffmpeg` writes into a staged temporary file
/// that is published only after it exits successfully. Every failure is an
/// [`LufsError::Encode`].
pub struct FfmpegSink {
    tool: FfmpegTool,
    out_path: PathBuf,
    deadline: Option<Instant>,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    staged: Option<Staged>,

    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    /// Sink writing `out_path` with `tool`.
    pub fn new(tool: FfmpegTool, out_path: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            out_path: out_path.into(),
            deadline: None,
            child: None,
            stdin: None,
            stderr_drain: None,
            staged: None,
            cfg: None,
            last_idx: None,
        }
    }

    /// Kill `ffmpeg` if it is still running at `deadline`.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Destination path.
    pub fn out_path(&self) -> &Path {
        &self.out_path
    }

    fn kill(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.stderr_drain = None;
        self.staged = None;
        self.cfg = None;
    }

    fn wait_with_deadline(&mut self) -> LufsResult<ExitStatus> {
        loop {
            let child = self
                .child
                .as_mut()
                .ok_or_else(|| LufsError::encode("ffmpeg sink not started"))?;
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(e) => {
                    return Err(LufsError::encode(format!(
                        "failed to wait for ffmpeg to finish: {e}"
                    )));
                }
            }
            if self.deadline.is_some_and(|d| Instant::now() >= d) {
                self.kill();
                return Err(LufsError::encode("ffmpeg exceeded the run deadline and was killed"));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> LufsResult<()> {
        if !cfg.dims.is_even() {
            return Err(LufsError::encode(
                "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }

        let staged = Staged::new(&self.out_path)?;

        let mut cmd = Command::new(&self.tool.program);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.dims.width, cfg.dims.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args([
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
            "-f",
            "mp4",
        ])
        .arg(staged.temp_path());

        let mut child = cmd.spawn().map_err(|e| {
            LufsError::encode(format!(
                "failed to spawn '{}': {e}",
                self.tool.program.display()
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LufsError::encode("failed to open ffmpeg stdin"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| LufsError::encode("failed to open ffmpeg stderr"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.staged = Some(staged);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbaImage) -> LufsResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| LufsError::encode("ffmpeg sink not started"))?;
        check_order(self.last_idx, idx).map_err(|e| LufsError::encode(e.to_string()))?;
        check_size(&cfg, frame).map_err(|e| LufsError::encode(e.to_string()))?;
        self.last_idx = Some(idx);

        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            self.kill();
            return Err(LufsError::encode("ffmpeg exceeded the run deadline and was killed"));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(LufsError::encode("ffmpeg sink is already finalized"));
        };
        // Frames are opaque, so straight and premultiplied RGBA coincide.
        if let Err(e) = stdin.write_all(frame.as_raw()) {
            self.kill();
            return Err(LufsError::encode(format!(
                "failed to write frame to ffmpeg stdin: {e}"
            )));
        }
        Ok(())
    }

    fn end(&mut self) -> LufsResult<()> {
        drop(self.stdin.take());
        let status = self.wait_with_deadline()?;
        self.child = None;

        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| LufsError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| LufsError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        let staged = self
            .staged
            .take()
            .ok_or_else(|| LufsError::encode("ffmpeg sink not started"))?;
        self.cfg = None;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(LufsError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        let path = staged.publish()?;
        tracing::debug!(path = %path.display(), "wrote mp4");
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.kill();
        }
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input frame rate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}
