//! lufs turns an audio file into deterministic release artwork.
//!
//! One run of the [`Pipeline`] produces:
//!
//! - a square album artwork (identicon glyph over a mel spectrogram),
//! - a vertical 9:16 looping "canvas" (static PNG, GIF, optional MP4),
//! - a catalog record derived from the content hash.
//!
//! Every random choice is seeded from the [`Fingerprint`], so identical input bytes always give
//! identical pixels.
#![forbid(unsafe_code)]

mod foundation;

/// Square artwork compositing.
pub mod artwork;
/// Audio decoding.
pub mod audio;
pub mod canvas;
/// Catalog codes and records.
pub mod catalog;
/// Premultiplied RGBA8 compositing helpers.
pub mod composite;
pub mod encode;
/// Content fingerprinting.
pub mod fingerprint;
/// Seeded symmetric glyphs.
pub mod identicon;
/// Single-entry generation pipeline.
pub mod pipeline;
/// Atomic artifact publishing.
pub mod publish;
pub mod spectrogram;

pub use crate::foundation::cancel::{CancelToken, RunGuard};
pub use crate::foundation::core::{Dimensions, Fps, FrameIndex, Rgba8Premul};
pub use crate::foundation::error::{LufsError, LufsResult};
pub use crate::foundation::math::Rng64;

pub use crate::artwork::ArtworkImage;
pub use crate::audio::{AudioDecoder, AudioSource, SymphoniaDecoder};
pub use crate::canvas::{CanvasAnimation, CanvasSettings};
pub use crate::catalog::CatalogRecord;
pub use crate::encode::{Capabilities, FfmpegTool, FrameSink, InMemorySink, SinkConfig};
pub use crate::fingerprint::Fingerprint;
pub use crate::identicon::IdenticonGlyph;
pub use crate::pipeline::{ArtifactPaths, OutputFormats, Pipeline, PipelineConfig, RunReport};
pub use crate::spectrogram::{Saturation, SpectrogramImage, SpectrogramPair};
