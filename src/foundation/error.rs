use std::path::PathBuf;

/// Convenience result type used across lufs.
pub type LufsResult<T> = Result<T, LufsError>;

/// Top-level error taxonomy used by pipeline APIs.
///
/// `Input`, `Render`, `Filesystem`, `Validation`, `Cancelled` and `TimedOut` abort a run.
/// `Encode` is only ever raised by the optional video path and is downgraded to a warning by
/// [`crate::Pipeline::run`].
#[derive(thiserror::Error, Debug)]
pub enum LufsError {
    /// Missing, unreadable or undecodable audio input.
    #[error("input error: {0}")]
    Input(String),

    /// Degenerate signal that cannot be rendered (e.g. no decoded samples).
    #[error("render error: {0}")]
    Render(String),

    /// Optional video encoder missing or failing.
    #[error("encode error: {0}")]
    Encode(String),

    /// Output path could not be created or written.
    #[error("filesystem error at '{}': {source}", .path.display())]
    Filesystem {
        /// Path that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration values.
    #[error("validation error: {0}")]
    Validation(String),

    /// The caller cancelled the run before `stage` started.
    #[error("run cancelled before stage '{stage}'")]
    Cancelled {
        /// Stage that was about to start.
        stage: &'static str,
    },

    /// The caller-supplied timeout elapsed before `stage` started.
    #[error("run timed out before stage '{stage}'")]
    TimedOut {
        /// Stage that was about to start.
        stage: &'static str,
    },

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LufsError {
    /// Build a [`LufsError::Input`] value.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Build a [`LufsError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`LufsError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`LufsError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LufsError::Filesystem`] value for `path`.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Return `true` for errors that end the run.
    ///
    /// Only [`LufsError::Encode`] is recoverable.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Encode(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
