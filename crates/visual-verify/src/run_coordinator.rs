// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Run coordinator - once-per-run purge of transient artifact directories
//
// The harness creates one RunCoordinator per process and hands it to every
// Verifier it constructs. The first construction for an artifact root clears
// temp/, pending-review/ and diff/ of every suite under that root; later
// constructions wait for that purge to finish and then do nothing.
//
// The check-and-mark is done under an async mutex that is held for the whole
// purge, so no suite can start capturing while a purge is still running.
// Roots are keyed by their canonical path when it can be resolved.
//
// Only files are deleted. A directory found inside a transient directory is
// reported as a failure and left in place.

use crate::artifact::ArtifactRole;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Outcome of a purge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Number of entries removed
    pub removed: usize,
    /// Entries that could not be removed
    pub failed: Vec<PathBuf>,
}

impl PurgeReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Process-wide purge state, shared by reference between suites
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use visual_verify::RunCoordinator;
///
/// let coordinator = Arc::new(RunCoordinator::new());
/// // pass &coordinator to every Verifier::new(...)
/// ```
#[derive(Debug, Default)]
pub struct RunCoordinator {
    purged_roots: Mutex<HashSet<PathBuf>>,
    purges: AtomicUsize,
}

impl RunCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Purges transient directories under `root` the first time it is seen.
    ///
    /// Returns the report of the purge that ran, or `None` if this root was
    /// already purged during the run. Spellings of the same directory
    /// (`a/b/..`, symlinks) count as one root. Failures to delete are logged
    /// and reported, never returned as errors.
    pub async fn ensure_purged(&self, root: &Path) -> Option<PurgeReport> {
        let key = root_key(root).await;
        let mut purged = self.purged_roots.lock().await;
        if purged.contains(&key) {
            return None;
        }

        let owned = root.to_path_buf();
        let report = match tokio::task::spawn_blocking(move || purge_transient_dirs(&owned)).await
        {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("Purge of {} did not complete: {}", root.display(), e);
                PurgeReport::default()
            }
        };

        purged.insert(key);
        self.purges.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(
            "Purged {} transient artifacts under {} ({} failures)",
            report.removed,
            root.display(),
            report.failed.len()
        );
        Some(report)
    }

    /// Number of purges performed so far
    pub fn purge_count(&self) -> usize {
        self.purges.load(Ordering::SeqCst)
    }

    /// Returns true if `root` has already been purged in this run
    pub async fn has_purged(&self, root: &Path) -> bool {
        let key = root_key(root).await;
        self.purged_roots.lock().await.contains(&key)
    }
}

async fn root_key(root: &Path) -> PathBuf {
    tokio::fs::canonicalize(root)
        .await
        .unwrap_or_else(|_| root.to_path_buf())
}

/// Clears the transient directories of every suite found under `root`.
///
/// A suite directory is one holding all four role directories; its baseline
/// directory is never touched.
pub(crate) fn purge_transient_dirs(root: &Path) -> PurgeReport {
    let mut report = PurgeReport::default();

    let Some(root_str) = root.to_str() else {
        tracing::warn!(
            "Artifact root {} is not valid UTF-8, skipping purge",
            root.display()
        );
        return report;
    };

    let pattern = format!(
        "{}/**/{}",
        glob::Pattern::escape(root_str),
        ArtifactRole::Baseline.dir_name()
    );

    let baselines = match glob::glob(&pattern) {
        Ok(paths) => paths,
        Err(e) => {
            tracing::warn!("Invalid purge pattern '{}': {}", pattern, e);
            return report;
        }
    };

    for entry in baselines {
        let baseline_dir = match entry {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Skipping unreadable path during purge: {}", e);
                continue;
            }
        };
        let Some(suite_dir) = baseline_dir.parent() else {
            continue;
        };
        let is_suite = ArtifactRole::ALL
            .iter()
            .all(|role| suite_dir.join(role.dir_name()).is_dir());
        if !is_suite {
            continue;
        }

        for role in ArtifactRole::TRANSIENT {
            clear_dir(&suite_dir.join(role.dir_name()), &mut report);
        }
    }

    report
}

fn clear_dir(dir: &Path, report: &mut PurgeReport) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Cannot list {} for purge: {}", dir.display(), e);
            report.failed.push(dir.to_path_buf());
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if entry.file_type().is_ok_and(|kind| kind.is_dir()) {
            tracing::warn!("Not purging directory {}", path.display());
            report.failed.push(path);
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => report.removed += 1,
            // Another process got there first
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!("Failed to purge {}: {}", path.display(), e);
                report.failed.push(path);
            }
        }
    }
}
