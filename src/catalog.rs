use std::{
    io::Write as _,
    path::{Path, PathBuf},
};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{
    fingerprint::Fingerprint,
    foundation::error::{LufsError, LufsResult},
    publish::write_atomic,
};

/// Fixed textual prefix of every catalog code.
pub const CATALOG_PREFIX: &str = "lufs-";

/// Number of hash characters kept in a catalog code.
pub const CATALOG_HASH_CHARS: usize = 8;

/// Derive the short catalog code from a full hex hash.
///
/// No collision avoidance: the code is a convenience label, the full hash stays the identity.
pub fn catalog_code(hash: &str) -> String {
    let head: String = hash
        .chars()
        .take(CATALOG_HASH_CHARS)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    format!("{CATALOG_PREFIX}{head}")
}

/// Return `true` when `code` is `lufs-` followed by exactly 8 lowercase hex characters.
pub fn is_valid_catalog_code(code: &str) -> bool {
    code.strip_prefix(CATALOG_PREFIX).is_some_and(|rest| {
        rest.len() == CATALOG_HASH_CHARS
            && rest
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    })
}

/// Persisted catalog entry for one generated release.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CatalogRecord {
    /// Short label, e.g. `lufs-1a2b3c4d`.
    pub catalog_code: String,
    /// Full content hash.
    pub hash: String,
    /// File name of the source audio.
    pub source: String,
    /// Generation time (UTC).
    pub generated_at: DateTime<Utc>,
}

impl CatalogRecord {
    /// Build a record for `source_path` at `generated_at`.
    pub fn new(fp: &Fingerprint, source_path: &Path, generated_at: DateTime<Utc>) -> Self {
        let source = source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| source_path.display().to_string());
        Self {
            catalog_code: fp.catalog_code.clone(),
            hash: fp.hash.clone(),
            source,
            generated_at,
        }
    }

    /// Human-readable text form, one `key: value` per line.
    pub fn to_text(&self) -> String {
        format!(
            "generated_at: {}\nsource: {}\ncatalog_code: {}\nhash: {}\n",
            self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.source,
            self.catalog_code,
            self.hash,
        )
    }

    /// Parse the text form produced by [`CatalogRecord::to_text`].
    pub fn parse(text: &str) -> LufsResult<Self> {
        let mut generated_at = None;
        let mut source = None;
        let mut catalog_code = None;
        let mut hash = None;

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let Some((key, value)) = line.split_once(':') else {
                return Err(LufsError::validation(format!(
                    "catalog line without ':' separator: '{line}'"
                )));
            };
            let value = value.trim().to_string();
            match key.trim() {
                "generated_at" => {
                    let ts = DateTime::parse_from_rfc3339(&value).map_err(|e| {
                        LufsError::validation(format!("bad catalog timestamp '{value}': {e}"))
                    })?;
                    generated_at = Some(ts.with_timezone(&Utc));
                }
                "source" => source = Some(value),
                "catalog_code" => catalog_code = Some(value),
                "hash" => hash = Some(value),
                other => {
                    tracing::debug!(key = other, "ignoring unknown catalog field");
                }
            }
        }

        fn required<T>(v: Option<T>, name: &str) -> LufsResult<T> {
            v.ok_or_else(|| LufsError::validation(format!("catalog record is missing '{name}'")))
        }

        Ok(Self {
            generated_at: required(generated_at, "generated_at")?,
            source: required(source, "source")?,
            catalog_code: required(catalog_code, "catalog_code")?,
            hash: required(hash, "hash")?,
        })
    }

    /// Persist the record atomically at `path`.
    #[tracing::instrument(level = "debug", skip(self), fields(code = %self.catalog_code))]
    pub fn write(&self, path: &Path) -> LufsResult<PathBuf> {
        let text = self.to_text();
        write_atomic(path, |w| {
            w.write_all(text.as_bytes())
                .map_err(|e| LufsError::filesystem(path, e))
        })
    }
}

#[cfg(test)]
#[path = "../tests/unit/catalog.rs"]
mod tests;
