use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

/// A located `ffmpeg` executable.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct FfmpegTool {
    /// Program name or path passed to `Command::new`.
    pub program: PathBuf,
}

impl FfmpegTool {
    /// Use `program` without probing it.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Return `true` when `<program> -version` runs and exits successfully.
    pub fn responds(&self) -> bool {
        is_runnable(&self.program)
    }
}

/// Optional encoders available to this process, probed once per run.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct Capabilities {
    /// Video encoder; `None` when MP4 output is unavailable.
    pub video: Option<FfmpegTool>,
}

impl Capabilities {
    /// Probe for `ffmpeg` on `PATH`.
    #[tracing::instrument(level = "debug")]
    pub fn probe() -> Self {
        let candidate = FfmpegTool::new("ffmpeg");
        let video = candidate.responds().then_some(candidate);
        if video.is_none() {
            tracing::debug!("ffmpeg not found on PATH; video output disabled");
        }
        Self { video }
    }

    /// No optional encoders.
    pub fn none() -> Self {
        Self::default()
    }

    /// Use an explicit video encoder without probing it.
    pub fn with_video(tool: FfmpegTool) -> Self {
        Self { video: Some(tool) }
    }
}

fn is_runnable(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
