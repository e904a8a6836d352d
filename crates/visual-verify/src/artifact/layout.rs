// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Suite layout - the four artifact directories of a suite and their file names
//
// Layout under the artifact root:
//
//   <root>/<suite dir>/baseline/         accepted images, curated by hand
//   <root>/<suite dir>/pending-review/   candidates and failing captures
//   <root>/<suite dir>/temp/             scratch captures, never outlive a call
//   <root>/<suite dir>/diff/             difference images for mismatches
//
// Everything except ensure_dirs() is pure path arithmetic.

use crate::api::VisualConfig;
use crate::artifact::SuiteIdentity;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Marker appended to diff artifact names before the extension
pub const DIFF_MARKER: &str = "-diff";

/// Artifact directories of a suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactRole {
    /// Accepted-good images
    Baseline,
    /// Images waiting for human triage
    PendingReview,
    /// Scratch captures
    Temp,
    /// Difference images
    Diff,
}

impl ArtifactRole {
    /// Every role, in creation order
    pub const ALL: [ArtifactRole; 4] = [
        ArtifactRole::Baseline,
        ArtifactRole::PendingReview,
        ArtifactRole::Temp,
        ArtifactRole::Diff,
    ];

    /// Roles purged once per run
    pub const TRANSIENT: [ArtifactRole; 3] = [
        ArtifactRole::Temp,
        ArtifactRole::Diff,
        ArtifactRole::PendingReview,
    ];

    /// Directory name of the role inside a suite directory
    pub fn dir_name(self) -> &'static str {
        match self {
            ArtifactRole::Baseline => "baseline",
            ArtifactRole::PendingReview => "pending-review",
            ArtifactRole::Temp => "temp",
            ArtifactRole::Diff => "diff",
        }
    }
}

/// How a logical name becomes a file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactName {
    /// Apply the role's prefix and format suffix.
    ///
    /// `Diff` uses the diff prefix and `-diff.<ext>`; every other role uses the
    /// baseline prefix and `.<ext>`.
    Wrapped(ArtifactRole),
    /// Use the logical name verbatim; it already is a final file name
    Raw,
}

/// Resolved directories and naming rules for one suite
#[derive(Debug, Clone)]
pub struct SuiteLayout {
    suite_dir: PathBuf,
    baseline_prefix: String,
    diff_prefix: String,
    extension: &'static str,
}

impl SuiteLayout {
    /// Resolves the suite directory from the identity and the configured root.
    pub fn resolve(identity: &SuiteIdentity, config: &VisualConfig) -> Self {
        Self {
            suite_dir: identity.suite_dir(&config.artifact_root),
            baseline_prefix: config.baseline_prefix.clone(),
            diff_prefix: config.diff_prefix.clone(),
            extension: config.image_format.extension(),
        }
    }

    pub fn suite_dir(&self) -> &Path {
        &self.suite_dir
    }

    /// Directory of the given role
    pub fn dir(&self, role: ArtifactRole) -> PathBuf {
        self.suite_dir.join(role.dir_name())
    }

    /// File name for `logical_name` under the given naming rule
    pub fn file_name(&self, logical_name: &str, naming: ArtifactName) -> String {
        match naming {
            ArtifactName::Wrapped(ArtifactRole::Diff) => format!(
                "{}{}{}.{}",
                self.diff_prefix, logical_name, DIFF_MARKER, self.extension
            ),
            ArtifactName::Wrapped(_) => {
                format!("{}{}.{}", self.baseline_prefix, logical_name, self.extension)
            }
            ArtifactName::Raw => logical_name.to_string(),
        }
    }

    /// Full path of an artifact in the `role` directory
    pub fn path(&self, role: ArtifactRole, logical_name: &str, naming: ArtifactName) -> PathBuf {
        self.dir(role).join(self.file_name(logical_name, naming))
    }

    /// File extension of every artifact in this layout
    pub fn extension(&self) -> &'static str {
        self.extension
    }

    /// Creates all four directories if absent.
    ///
    /// Idempotent: existing directories are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if a directory cannot be created.
    pub async fn ensure_dirs(&self) -> Result<()> {
        for role in ArtifactRole::ALL {
            let dir = self.dir(role);
            tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                Error::Configuration(format!(
                    "Cannot create artifact directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        }
        tracing::debug!("Artifact directories ready under {}", self.suite_dir.display());
        Ok(())
    }
}
