//! Level persistence: one `<name>.level.json` document per level.
//!
//! The document carries the world, its validation report, provenance and
//! a digest of the world under the default quantization precision.
//!
//! # Fail-closed semantics
//!
//! - Unknown `format` → error
//! - Stored world digest differs from the recomputed digest → error
//!
//! The file path is never part of any hash surface.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use levelcert_kernel::carrier::quantize::Precision;
use levelcert_kernel::carrier::world::{WorldError, WorldState};
use levelcert_kernel::proof::canon::canonical_json_bytes;
use levelcert_kernel::proof::hash::{canonical_hash, ContentHash, HashDomain};

use crate::report::ValidationReport;
use crate::runner::{GeneratedLevel, Provenance};

/// Format tag written into every level document.
pub const LEVEL_FORMAT: &str = "levelcert.level.v1";
/// File suffix recognized by batch validation.
pub const LEVEL_SUFFIX: &str = ".level.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDocument {
    pub format: String,
    pub domain_id: String,
    pub template_id: String,
    pub seed: u64,
    pub provenance: Provenance,
    pub attempts_used: u32,
    /// `sha256:<hex>` of the world's canonical bytes.
    pub world_digest: String,
    pub world: WorldState,
    pub report: ValidationReport,
}

impl LevelDocument {
    /// Wrap a generated level for persistence.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if the world cannot be digested.
    pub fn from_level(domain_id: &str, level: &GeneratedLevel) -> Result<Self, WorldError> {
        Ok(Self {
            format: LEVEL_FORMAT.to_string(),
            domain_id: domain_id.to_string(),
            template_id: level.template_id.clone(),
            seed: level.seed,
            provenance: level.provenance,
            attempts_used: level.attempts_used,
            world_digest: level.world.digest(Precision::DEFAULT)?.to_string(),
            world: level.world.clone(),
            report: level.report.clone(),
        })
    }

    /// Digest of the whole document (world, report and provenance).
    ///
    /// Floats are quantized at the default precision, so the digest does not
    /// depend on JSON formatting or float printing.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if a float in the document is not finite.
    pub fn digest(&self) -> Result<ContentHash, WorldError> {
        let tree = serde_json::to_value(self).unwrap_or_default();
        let quantized = Precision::DEFAULT.quantize_value(&tree)?;
        let bytes = canonical_json_bytes(&quantized)?;
        Ok(canonical_hash(HashDomain::LevelArtifact, &bytes))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LevelIoError {
    #[error("I/O error at {path}: {detail}")]
    Io { path: String, detail: String },
    #[error("{path} is not a level document: {detail}")]
    Parse { path: String, detail: String },
    #[error("unsupported level format `{found}`")]
    UnsupportedFormat { found: String },
    #[error("world digest mismatch: stored={stored}, recomputed={recomputed}")]
    DigestMismatch { stored: String, recomputed: String },
    #[error(transparent)]
    World(#[from] WorldError),
}

fn io_error(path: &Path, e: &std::io::Error) -> LevelIoError {
    LevelIoError::Io {
        path: path.display().to_string(),
        detail: e.to_string(),
    }
}

/// Write `level` to `<dir>/<name>.level.json`, creating `dir` if needed.
///
/// # Errors
///
/// Returns [`LevelIoError`] on I/O failure or if the world cannot be
/// digested.
pub fn write_level(
    dir: &Path,
    name: &str,
    domain_id: &str,
    level: &GeneratedLevel,
) -> Result<PathBuf, LevelIoError> {
    std::fs::create_dir_all(dir).map_err(|e| io_error(dir, &e))?;
    let doc = LevelDocument::from_level(domain_id, level)?;
    let path = dir.join(format!("{name}{LEVEL_SUFFIX}"));
    let mut bytes = serde_json::to_vec_pretty(&doc).map_err(|e| LevelIoError::Parse {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    bytes.push(b'\n');
    std::fs::write(&path, bytes).map_err(|e| io_error(&path, &e))?;
    tracing::debug!(path = %path.display(), digest = %doc.world_digest, "level written");
    Ok(path)
}

/// Read and verify a level document.
///
/// # Errors
///
/// Returns [`LevelIoError`] when the file is unreadable, malformed, of an
/// unknown format, or its world digest does not match.
pub fn read_level(path: &Path) -> Result<LevelDocument, LevelIoError> {
    let bytes = std::fs::read(path).map_err(|e| io_error(path, &e))?;
    let doc: LevelDocument = serde_json::from_slice(&bytes).map_err(|e| LevelIoError::Parse {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    if doc.format != LEVEL_FORMAT {
        return Err(LevelIoError::UnsupportedFormat { found: doc.format });
    }
    let recomputed = doc.world.digest(Precision::DEFAULT)?.to_string();
    if recomputed != doc.world_digest {
        return Err(LevelIoError::DigestMismatch {
            stored: doc.world_digest,
            recomputed,
        });
    }
    Ok(doc)
}
