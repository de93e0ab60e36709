use std::path::{Path, PathBuf};

use symphonia::core::{
    audio::SampleBuffer,
    codecs::{CODEC_TYPE_NULL, DecoderOptions},
    errors::Error as SymphoniaError,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
};

use crate::foundation::error::{LufsError, LufsResult};

/// Decoded audio, downmixed to mono.
#[derive(Clone, Debug)]
pub struct AudioSource {
    /// Path the samples were decoded from.
    pub path: PathBuf,
    /// Mono `f32` samples in `[-1, 1]`.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioSource {
    /// Wrap already-decoded mono samples.
    pub fn from_samples(path: impl Into<PathBuf>, samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            path: path.into(),
            samples,
            sample_rate,
        }
    }

    /// Duration in seconds (0 when the sample rate is unknown).
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Decoding collaborator: turns an audio file into PCM.
pub trait AudioDecoder: Send + Sync {
    /// Decode `path` into mono samples.
    ///
    /// Unreadable or unsupported inputs must be reported as [`LufsError::Input`].
    fn decode(&self, path: &Path) -> LufsResult<AudioSource>;
}

/// Default decoder backed by `symphonia` (WAV, FLAC, MP3, OGG/Vorbis, AAC/MP4, ...).
#[derive(Clone, Copy, Debug, Default)]
pub struct SymphoniaDecoder;

impl AudioDecoder for SymphoniaDecoder {
    #[tracing::instrument(level = "debug", skip(self))]
    fn decode(&self, path: &Path) -> LufsResult<AudioSource> {
        let file = std::fs::File::open(path)
            .map_err(|e| LufsError::input(format!("open audio '{}': {e}", path.display())))?;
        let media_source = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                media_source,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| {
                LufsError::input(format!(
                    "unsupported or corrupt audio '{}': {e}",
                    path.display()
                ))
            })?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| {
                LufsError::input(format!("no decodable audio track in '{}'", path.display()))
            })?;
        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| {
                LufsError::input(format!("no decoder for '{}': {e}", path.display()))
            })?;

        let mut sample_rate = codec_params.sample_rate.unwrap_or(0);
        let mut mono = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => {
                    return Err(LufsError::input(format!(
                        "read packet from '{}': {e}",
                        path.display()
                    )));
                }
            };
            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    sample_rate = spec.rate;
                    let channels = spec.channels.count().max(1);
                    let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                    buf.copy_interleaved_ref(decoded);
                    downmix_into(&mut mono, buf.samples(), channels);
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::warn!(error = %e, "skipping undecodable packet");
                }
                Err(e) => {
                    return Err(LufsError::input(format!(
                        "decode '{}': {e}",
                        path.display()
                    )));
                }
            }
        }

        tracing::debug!(samples = mono.len(), sample_rate, "decoded audio");
        Ok(AudioSource {
            path: path.to_path_buf(),
            samples: mono,
            sample_rate,
        })
    }
}

/// Average interleaved frames of `channels` samples into `out`.
pub(crate) fn downmix_into(out: &mut Vec<f32>, interleaved: &[f32], channels: usize) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    let inv = 1.0 / channels as f32;
    out.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() * inv),
    );
}

#[cfg(test)]
#[path = "../tests/unit/audio.rs"]
mod tests;
