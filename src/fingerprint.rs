use std::{fs::File, io::Read, path::Path};

use sha2::{Digest as _, Sha256};

use crate::{
    catalog::catalog_code,
    foundation::error::{LufsError, LufsResult},
};

/// Read chunk size used while hashing; the source is never loaded in one shot.
pub const HASH_CHUNK_BYTES: usize = 64 * 1024;

/// Content-addressed identity of an audio file.
///
/// Computed once per run and shared by every downstream stage. Two byte-identical files always
/// produce the same fingerprint.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Fingerprint {
    /// Lowercase hex SHA-256 of the full byte stream.
    pub hash: String,
    /// First 8 digest bytes as a big-endian integer.
    pub seed: u64,
    /// Short human-facing label, see [`catalog_code`].
    pub catalog_code: String,
}

impl Fingerprint {
    /// Hash everything `reader` yields.
    pub fn from_reader(mut reader: impl Read) -> std::io::Result<Self> {
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; HASH_CHUNK_BYTES];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(Self::from_digest(&hasher.finalize()))
    }

    /// Hash an in-memory byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_digest(&Sha256::digest(bytes))
    }

    /// Hash the file at `path`.
    ///
    /// Missing or unreadable files are reported as [`LufsError::Input`].
    #[tracing::instrument(level = "debug")]
    pub fn from_path(path: &Path) -> LufsResult<Self> {
        let f = File::open(path)
            .map_err(|e| LufsError::input(format!("open audio '{}': {e}", path.display())))?;
        let fp = Self::from_reader(f)
            .map_err(|e| LufsError::input(format!("read audio '{}': {e}", path.display())))?;
        tracing::debug!(
            hash_head = &fp.hash[..8],
            hash_tail = &fp.hash[fp.hash.len() - 8..],
            "fingerprinted audio"
        );
        Ok(fp)
    }

    fn from_digest(digest: &[u8]) -> Self {
        let hash = hex_lower(digest);
        let mut seed_bytes = [0u8; 8];
        seed_bytes.copy_from_slice(&digest[..8]);
        let seed = u64::from_be_bytes(seed_bytes);
        let catalog_code = catalog_code(&hash);
        Self {
            hash,
            seed,
            catalog_code,
        }
    }
}

fn hex_lower(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

#[cfg(test)]
#[path = "../tests/unit/fingerprint.rs"]
mod tests;
