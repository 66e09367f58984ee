//! Batch drivers: re-validate a directory of levels, generate many seeds.
//!
//! Both fan work out over `std::thread::scope`. Each worker owns its own
//! world and RNG context; the only shared values are read-only (domain,
//! verifier, template, policy). Results are always returned in input order.

use std::path::{Path, PathBuf};
use std::thread;

use crate::contract::LevelDomain;
use crate::level_io::{read_level, LevelIoError, LEVEL_SUFFIX};
use crate::policy::RetryPolicy;
use crate::report::ValidationReport;
use crate::runner::{generate_valid, AuthoringError, GeneratedLevel};
use crate::template::WorldTemplate;
use crate::verifier::Verifier;

#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    Passed(ValidationReport),
    Failed(ValidationReport),
    /// The file could not be read, parsed or digest-verified, or belongs to
    /// another domain.
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub file_name: String,
    pub outcome: EntryOutcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub unreadable: usize,
    /// Per-file results, sorted by file name.
    pub entries: Vec<BatchEntry>,
}

impl BatchSummary {
    fn from_entries(entries: Vec<BatchEntry>) -> Self {
        let mut summary = Self {
            total: entries.len(),
            ..Self::default()
        };
        for entry in &entries {
            match entry.outcome {
                EntryOutcome::Passed(_) => summary.passed += 1,
                EntryOutcome::Failed(_) => summary.failed += 1,
                EntryOutcome::Unreadable(_) => summary.unreadable += 1,
            }
        }
        summary.entries = entries;
        summary
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

/// List `*.level.json` files in `dir`, sorted by file name.
///
/// # Errors
///
/// Returns [`LevelIoError::Io`] if the directory cannot be listed.
pub fn level_files(dir: &Path) -> Result<Vec<PathBuf>, LevelIoError> {
    let io = |e: std::io::Error| LevelIoError::Io {
        path: dir.display().to_string(),
        detail: e.to_string(),
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io)? {
        let path = entry.map_err(io)?.path();
        let is_level = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(LEVEL_SUFFIX));
        if is_level && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn validate_file(verifier: &Verifier<'_>, path: &Path) -> EntryOutcome {
    let doc = match read_level(path) {
        Ok(doc) => doc,
        Err(e) => return EntryOutcome::Unreadable(e.to_string()),
    };
    let expected = verifier.domain().domain_id();
    if doc.domain_id != expected {
        return EntryOutcome::Unreadable(format!(
            "level belongs to domain `{}`, not `{expected}`",
            doc.domain_id
        ));
    }
    let report = verifier.validate(&doc.world);
    if report.is_valid() {
        EntryOutcome::Passed(report)
    } else {
        EntryOutcome::Failed(report)
    }
}

/// Run `job` over `items` on up to `workers` scoped threads, preserving order.
///
/// A worker that panics yields `on_panic(item)` for each item of its chunk.
fn fan_out<T, R, J, P>(items: &[T], workers: usize, job: J, on_panic: P) -> Vec<R>
where
    T: Sync,
    R: Send,
    J: Fn(&T) -> R + Sync,
    P: Fn(&T) -> R,
{
    if items.is_empty() {
        return Vec::new();
    }
    let chunk_size = items.len().div_ceil(workers.max(1));
    thread::scope(|scope| {
        let handles: Vec<_> = items
            .chunks(chunk_size)
            .map(|chunk| {
                let job = &job;
                (chunk, scope.spawn(move || chunk.iter().map(job).collect::<Vec<R>>()))
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|(chunk, handle)| {
                handle
                    .join()
                    .unwrap_or_else(|_| chunk.iter().map(&on_panic).collect())
            })
            .collect()
    })
}

/// Validate every level document in `dir` against `verifier`'s domain.
///
/// # Errors
///
/// Returns [`LevelIoError::Io`] if the directory cannot be listed.
/// Per-file problems are reported as [`EntryOutcome::Unreadable`].
pub fn validate_dir(
    dir: &Path,
    verifier: &Verifier<'_>,
    workers: usize,
) -> Result<BatchSummary, LevelIoError> {
    let files = level_files(dir)?;
    let outcomes = fan_out(
        &files,
        workers,
        |path| validate_file(verifier, path),
        |_| EntryOutcome::Unreadable("validation worker panicked".into()),
    );
    let entries: Vec<BatchEntry> = files
        .iter()
        .zip(outcomes)
        .map(|(path, outcome)| BatchEntry {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            outcome,
        })
        .collect();
    let summary = BatchSummary::from_entries(entries);
    tracing::info!(
        dir = %dir.display(),
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        unreadable = summary.unreadable,
        "batch validation finished"
    );
    Ok(summary)
}

/// Generate one level per seed, returned in seed order.
#[must_use]
pub fn generate_batch(
    domain: &dyn LevelDomain,
    template: &WorldTemplate,
    seeds: &[u64],
    policy: &RetryPolicy,
    workers: usize,
) -> Vec<Result<GeneratedLevel, AuthoringError>> {
    fan_out(
        seeds,
        workers,
        |&seed| generate_valid(domain, template, policy, seed),
        |&seed| Err(AuthoringError::WorkerPanicked { seed }),
    )
}
