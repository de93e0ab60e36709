use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use image::RgbaImage;

use crate::{
    artwork,
    audio::{AudioDecoder, SymphoniaDecoder},
    canvas::{CanvasAnimation, CanvasSettings, SEAM_THRESHOLD, seam},
    catalog::CatalogRecord,
    encode::{Capabilities, FfmpegSink, FrameSink, GifSink, SinkConfig},
    fingerprint::Fingerprint,
    foundation::{
        cancel::{CancelToken, RunGuard},
        core::{Dimensions, Fps, FrameIndex},
        error::{LufsError, LufsResult},
    },
    identicon::IdenticonGlyph,
    publish::{remove_stale, write_png},
    spectrogram::{self, Saturation},
};

/// Which optional outputs to attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputFormats {
    /// Attempt MP4 output when an encoder is available.
    pub video: bool,
}

impl Default for OutputFormats {
    fn default() -> Self {
        Self { video: true }
    }
}

/// Everything one run needs besides the input path.
///
/// Deserializes from JSON with every field optional.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Spectrogram color intensity in `[0, 2]`.
    pub saturation: Saturation,
    /// Canvas frame rate.
    pub fps: u32,
    /// Canvas loop length in seconds.
    pub duration_secs: u32,
    /// Canvas width; with `canvas_height` exactly 9:16 and even.
    pub canvas_width: u32,
    /// Canvas height.
    pub canvas_height: u32,
    /// Peak glitch intensity in `[0, 1]`.
    pub glitch_intensity: f32,
    /// Crossfaded frames between glitch keyframes.
    pub tween_frames: u32,
    /// Head/tail loop crossfade length.
    pub crossfade_secs: f64,
    /// Optional outputs.
    pub formats: OutputFormats,
    /// Worker threads for parallel stages (`None`: rayon default).
    pub threads: Option<usize>,
    /// Overall run budget.
    pub timeout_secs: Option<f64>,
    /// Output root; defaults to a directory next to the audio file.
    pub out_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let canvas = CanvasSettings::default();
        Self {
            saturation: Saturation::default(),
            fps: canvas.fps.num,
            duration_secs: canvas.duration_secs,
            canvas_width: canvas.dims.width,
            canvas_height: canvas.dims.height,
            glitch_intensity: canvas.glitch_intensity,
            tween_frames: canvas.tween_frames,
            crossfade_secs: canvas.crossfade_secs,
            formats: OutputFormats::default(),
            threads: None,
            timeout_secs: None,
            out_dir: None,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> LufsResult<Self> {
        let file = std::fs::File::open(path).map_err(|e| LufsError::filesystem(path, e))?;
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(|e| {
            LufsError::validation(format!("invalid config '{}': {e}", path.display()))
        })
    }

    /// Reject values no run could honor.
    pub fn validate(&self) -> LufsResult<()> {
        if let Some(n) = self.threads
            && n == 0
        {
            return Err(LufsError::validation("'threads' must be >= 1 when set"));
        }
        if let Some(t) = self.timeout_secs
            && (!t.is_finite() || t <= 0.0)
        {
            return Err(LufsError::validation("'timeout_secs' must be a positive number"));
        }
        self.canvas_settings()?.validate()
    }

    /// Canvas parameters derived from this config.
    pub fn canvas_settings(&self) -> LufsResult<CanvasSettings> {
        Ok(CanvasSettings {
            dims: Dimensions::new(self.canvas_width, self.canvas_height)?,
            fps: Fps::whole(self.fps)?,
            duration_secs: self.duration_secs,
            glitch_intensity: self.glitch_intensity,
            tween_frames: self.tween_frames,
            crossfade_secs: self.crossfade_secs,
        })
    }

    /// Run budget as a [`Duration`].
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs_f64)
    }

    /// Output root for `audio_path`: `out_dir` if set, else
    /// `<audio dir>/id_<base>_<ext>_sat<saturation>`.
    pub fn output_root(&self, audio_path: &Path) -> PathBuf {
        if let Some(dir) = &self.out_dir {
            return dir.clone();
        }
        let (base, ext) = base_and_ext(audio_path);
        let parent = audio_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        parent.join(format!(
            "id_{base}_{ext}_sat{}",
            saturation_label(self.saturation)
        ))
    }
}

/// Final locations of every artifact of a run.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ArtifactPaths {
    /// Output root.
    pub root: PathBuf,
    /// `artwork/<base>.png`.
    pub artwork: PathBuf,
    /// `canvas/<base>_canvas_static.png`.
    pub canvas_static: PathBuf,
    /// `canvas/<base>_canvas.gif`.
    pub canvas_gif: PathBuf,
    /// `canvas/<base>_canvas.mp4`, only when video output succeeded.
    pub canvas_mp4: Option<PathBuf>,
    /// `components/identicon.png`.
    pub identicon: PathBuf,
    /// `components/spectrogram.png` (square).
    pub spectrogram: PathBuf,
    /// `components/rectangle_spectrogram.png` (full duration).
    pub spectrogram_full: PathBuf,
    /// `catalog.txt`.
    pub catalog: PathBuf,
}

impl ArtifactPaths {
    /// Layout under `root` for an input with base name `base`.
    pub fn new(root: &Path, base: &str) -> Self {
        let artwork_dir = root.join("artwork");
        let canvas_dir = root.join("canvas");
        let components = root.join("components");
        Self {
            root: root.to_path_buf(),
            artwork: artwork_dir.join(format!("{base}.png")),
            canvas_static: canvas_dir.join(format!("{base}_canvas_static.png")),
            canvas_gif: canvas_dir.join(format!("{base}_canvas.gif")),
            canvas_mp4: None,
            identicon: components.join("identicon.png"),
            spectrogram: components.join("spectrogram.png"),
            spectrogram_full: components.join("rectangle_spectrogram.png"),
            catalog: root.join("catalog.txt"),
        }
    }

    /// Where the MP4 would be written.
    pub fn planned_mp4(&self) -> PathBuf {
        self.canvas_gif.with_extension("mp4")
    }
}

/// Outcome of a successful run.
#[derive(Clone, Debug, serde::Serialize)]
pub struct RunReport {
    /// Identity of the input.
    pub fingerprint: Fingerprint,
    /// Persisted catalog entry.
    pub catalog: CatalogRecord,
    /// Published files.
    pub artifacts: ArtifactPaths,
    /// Non-fatal problems, e.g. a failed MP4 encode.
    pub warnings: Vec<String>,
    /// Frames in the canvas loop.
    pub frames: u64,
    /// Mean absolute difference between the last and first canvas frame.
    pub seam_difference: f64,
}

/// The generation pipeline: fingerprint, spectrogram and identicon, artwork, canvas, catalog.
pub struct Pipeline {
    config: PipelineConfig,
    capabilities: Capabilities,
    decoder: Arc<dyn AudioDecoder>,
    cancel: CancelToken,
}

impl Pipeline {
    /// Validate `config` and probe optional encoders once.
    pub fn new(config: PipelineConfig) -> LufsResult<Self> {
        config.validate()?;
        let capabilities = if config.formats.video {
            Capabilities::probe()
        } else {
            Capabilities::none()
        };
        Ok(Self {
            config,
            capabilities,
            decoder: Arc::new(SymphoniaDecoder),
            cancel: CancelToken::new(),
        })
    }

    /// Replace the probed capabilities.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Replace the audio decoder.
    pub fn with_decoder(mut self, decoder: impl AudioDecoder + 'static) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    /// Use `token` to cancel runs from another thread.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Config in use.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Capabilities in use.
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Generate every artifact for `audio_path`.
    ///
    /// Input problems fail before any output directory is created. A failing or missing video
    /// encoder only adds a warning to the report.
    #[tracing::instrument(skip(self), fields(path = %audio_path.display()))]
    pub fn run(&self, audio_path: &Path) -> LufsResult<RunReport> {
        let guard = RunGuard::new(self.cancel.clone(), self.config.timeout());
        let mut warnings = Vec::new();

        guard.check("fingerprint")?;
        let fingerprint = Fingerprint::from_path(audio_path)?;
        tracing::info!(code = %fingerprint.catalog_code, "fingerprinted input");

        guard.check("decode")?;
        let audio = self.decoder.decode(audio_path)?;
        tracing::info!(
            sample_rate = audio.sample_rate,
            duration_secs = audio.duration_secs(),
            "decoded audio"
        );

        let pool = build_thread_pool(self.config.threads)?;
        let settings = self.config.canvas_settings()?;
        let (base, _) = base_and_ext(audio_path);
        let mut artifacts = ArtifactPaths::new(&self.config.output_root(audio_path), &base);

        guard.check("spectrogram")?;
        let saturation = self.config.saturation;
        let seed = fingerprint.seed;
        let (spectrograms, glyph) = pool.install(|| {
            rayon::join(
                || spectrogram::render(&audio, saturation),
                || IdenticonGlyph::generate(seed),
            )
        });
        let spectrograms = spectrograms?;
        write_png(&artifacts.spectrogram, &spectrograms.square.image)?;
        write_png(&artifacts.spectrogram_full, &spectrograms.full.image)?;
        write_png(
            &artifacts.identicon,
            &glyph.rasterize(artwork::glyph_side(artwork::ARTWORK_SIZE)),
        )?;

        guard.check("artwork")?;
        let art = artwork::compose(&spectrograms.square, &glyph);
        write_png(&artifacts.artwork, &art.image)?;
        tracing::info!(path = %artifacts.artwork.display(), "wrote artwork");

        guard.check("canvas")?;
        let animation = CanvasAnimation::build(&art, settings, seed, &pool)?;
        write_png(&artifacts.canvas_static, animation.still())?;

        guard.check("encode")?;
        let encoded = self.encode_canvas(&animation, &artifacts, &guard, &pool, &mut warnings)?;
        artifacts.canvas_mp4 = encoded.mp4;
        if encoded.seam_difference >= SEAM_THRESHOLD {
            tracing::warn!(diff = encoded.seam_difference, "canvas loop seam above threshold");
        }

        guard.check("catalog")?;
        let catalog = CatalogRecord::new(&fingerprint, audio_path, chrono::Utc::now());
        catalog.write(&artifacts.catalog)?;

        for w in &warnings {
            tracing::warn!("{w}");
        }
        tracing::info!(root = %artifacts.root.display(), "run complete");

        Ok(RunReport {
            fingerprint,
            catalog,
            artifacts,
            warnings,
            frames: animation.len(),
            seam_difference: encoded.seam_difference,
        })
    }

    /// Stream canvas frames into the GIF sink and, when possible, the MP4 sink.
    fn encode_canvas(
        &self,
        animation: &CanvasAnimation,
        artifacts: &ArtifactPaths,
        guard: &RunGuard,
        pool: &rayon::ThreadPool,
        warnings: &mut Vec<String>,
    ) -> LufsResult<EncodedCanvas> {
        let cfg = SinkConfig {
            dims: animation.settings().dims,
            fps: animation.settings().fps,
        };

        let mut gif = GifSink::new(&artifacts.canvas_gif);
        gif.begin(cfg)?;

        let mut mp4 = match (&self.capabilities.video, self.config.formats.video) {
            (Some(tool), true) => {
                let mut sink = FfmpegSink::new(tool.clone(), artifacts.planned_mp4())
                    .with_deadline(guard.deadline());
                match sink.begin(cfg) {
                    Ok(()) => Some(sink),
                    Err(e) => {
                        warnings.push(video_warning(&e));
                        None
                    }
                }
            }
            (None, true) => {
                warnings.push("video encoder (ffmpeg) not available; skipped MP4 output".into());
                None
            }
            (_, false) => None,
        };

        let last_idx = animation.len().saturating_sub(1);
        let mut first: Option<RgbaImage> = None;
        let mut last: Option<RgbaImage> = None;
        animation.for_each_frame(pool, |idx, frame| {
            gif.push_frame(idx, &frame)?;
            let failed = match mp4.as_mut() {
                Some(sink) => sink.push_frame(idx, &frame).err(),
                None => None,
            };
            if let Some(e) = failed {
                warnings.push(video_warning(&e));
                mp4 = None;
            }
            if idx == FrameIndex(0) {
                first = Some(frame.clone());
            }
            if idx.0 == last_idx {
                last = Some(frame);
            }
            Ok(())
        })?;

        gif.end()?;
        tracing::info!(path = %artifacts.canvas_gif.display(), "wrote canvas gif");

        let mp4_path = match mp4.as_mut().map(|sink| sink.end()) {
            Some(Ok(())) => Some(artifacts.planned_mp4()),
            Some(Err(e)) => {
                warnings.push(video_warning(&e));
                None
            }
            None => None,
        };
        if mp4_path.is_none() {
            remove_stale(&artifacts.planned_mp4())?;
        }

        let seam_difference = match (&first, &last) {
            (Some(a), Some(b)) => seam::seam_difference(a, b)?,
            _ => 0.0,
        };

        Ok(EncodedCanvas {
            mp4: mp4_path,
            seam_difference,
        })
    }
}

struct EncodedCanvas {
    mp4: Option<PathBuf>,
    seam_difference: f64,
}

fn video_warning(e: &LufsError) -> String {
    format!("MP4 output skipped: {e}")
}

/// `(base name, extension)` of `path`, with `"audio"` / `"bin"` fallbacks.
fn base_and_ext(path: &Path) -> (String, String) {
    let base = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "audio".to_string());
    let ext = path
        .extension()
        .map(|s| s.to_string_lossy().to_lowercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "bin".to_string());
    (base, ext)
}

/// Saturation as used in directory names: `1.0`, `0.5`, `1.25`.
fn saturation_label(s: Saturation) -> String {
    let v = (f64::from(s) * 100.0).round() / 100.0;
    if v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

fn build_thread_pool(threads: Option<usize>) -> LufsResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(LufsError::validation("'threads' must be >= 1 when set"));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| LufsError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
