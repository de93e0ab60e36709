//! Frame sinks and encoder discovery.
//!
//! Still images go through [`crate::publish::write_png`]; animated output goes through a
//! [`FrameSink`].

pub mod capabilities;
pub mod ffmpeg;
pub mod gif;
pub mod sink;

pub use capabilities::{Capabilities, FfmpegTool};
pub use ffmpeg::FfmpegSink;
pub use gif::GifSink;
pub use sink::{FrameSink, InMemorySink, SinkConfig};

#[cfg(test)]
#[path = "../../tests/unit/encode.rs"]
mod tests;
