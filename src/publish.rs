use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::foundation::error::{LufsError, LufsResult};

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> LufsResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_dir(parent)?;
    }
    Ok(())
}

/// Create `dir` and any missing ancestors.
pub fn ensure_dir(dir: &Path) -> LufsResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| LufsError::filesystem(dir, e))
}

/// Remove a previously published artifact at `path`, if there is one.
pub fn remove_stale(path: &Path) -> LufsResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed stale artifact");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(LufsError::filesystem(path, e)),
    }
}

/// A scoped temporary file next to its final destination.
///
/// Nothing is visible at `final_path` until [`Staged::publish`] renames the temporary file into
/// place. Dropping a `Staged` without publishing removes the temporary file.
pub struct Staged {
    tmp: tempfile::NamedTempFile,
    final_path: PathBuf,
}

impl Staged {
    /// Reserve a temporary file in the directory of `final_path`.
    pub fn new(final_path: impl Into<PathBuf>) -> LufsResult<Self> {
        let final_path = final_path.into();
        ensure_parent_dir(&final_path)?;
        let dir = match final_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let suffix = final_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let tmp = tempfile::Builder::new()
            .prefix(".lufs-")
            .suffix(&suffix)
            .tempfile_in(&dir)
            .map_err(|e| LufsError::filesystem(&dir, e))?;
        Ok(Self { tmp, final_path })
    }

    /// Path of the temporary file (for external writers such as `ffmpeg`).
    pub fn temp_path(&self) -> &Path {
        self.tmp.path()
    }

    /// Destination the file will be published to.
    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Mutable handle to the temporary file.
    pub fn file_mut(&mut self) -> &mut std::fs::File {
        self.tmp.as_file_mut()
    }

    /// Flush and atomically rename the temporary file onto the final path.
    pub fn publish(mut self) -> LufsResult<PathBuf> {
        let final_path = self.final_path.clone();
        self.tmp
            .as_file_mut()
            .sync_all()
            .map_err(|e| LufsError::filesystem(self.tmp.path(), e))?;
        self.tmp
            .persist(&final_path)
            .map_err(|e| LufsError::filesystem(&final_path, e.error))?;
        tracing::debug!(path = %final_path.display(), "published artifact");
        Ok(final_path)
    }
}

/// Write an artifact through `write` and publish it atomically.
///
/// If `write` fails the temporary file is discarded and `path` is left untouched.
pub fn write_atomic<F>(path: &Path, write: F) -> LufsResult<PathBuf>
where
    F: FnOnce(&mut dyn Write) -> LufsResult<()>,
{
    let mut staged = Staged::new(path)?;
    {
        let tmp_path = staged.temp_path().to_path_buf();
        let mut w = BufWriter::new(staged.file_mut());
        write(&mut w)?;
        w.flush().map_err(|e| LufsError::filesystem(tmp_path, e))?;
    }
    staged.publish()
}

/// Write an RGBA8 raster as a lossless PNG, atomically.
pub fn write_png(path: &Path, img: &image::RgbaImage) -> LufsResult<PathBuf> {
    use image::ImageEncoder as _;

    write_atomic(path, |w| {
        image::codecs::png::PngEncoder::new(w)
            .write_image(
                img.as_raw(),
                img.width(),
                img.height(),
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| LufsError::Other(anyhow::anyhow!("encode png '{}': {e}", path.display())))
    })
}

#[cfg(test)]
#[path = "../tests/unit/publish.rs"]
mod tests;
