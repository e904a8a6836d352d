// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Suite identity - namespace path that names a test suite
//
// A suite identity must carry a "modules" and a "tests" marker segment. The
// segments after the last "modules" marker (with "tests" removed) become the
// suite's directory under the artifact root, so
// `com.acme.modules.commons.tests.ButtonTest` maps to `commons/ButtonTest`.
//
// Suite directory segments may not be role directory names: `a/diff` would
// sit inside the diff/ directory of suite `a` and be swept by its purge.

use crate::artifact::ArtifactRole;
use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Segment that anchors the suite directory
pub const MODULES_MARKER: &str = "modules";

/// Segment that must be present and is dropped from the suite directory
pub const TESTS_MARKER: &str = "tests";

/// Validated identity of a test suite
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SuiteIdentity {
    full_name: String,
    segments: Vec<String>,
}

impl SuiteIdentity {
    /// Parses a dotted (`a.modules.b.tests.C`) or Rust module path
    /// (`a::modules::b::tests::c`) identity.
    ///
    /// Performs no I/O.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if either marker is missing, if a marker
    /// only appears as the first or last segment, or if any segment is empty or
    /// contains a path separator, or if a suite directory segment is a role
    /// directory name (`baseline`, `pending-review`, `temp`, `diff`). The
    /// harness must treat this as fatal.
    pub fn parse(identity: &str) -> Result<Self> {
        let full_name = identity.trim().replace("::", ".");
        let segments: Vec<&str> = full_name.split('.').collect();

        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || s.contains(['/', '\\']) || **s == "..")
        {
            return Err(Error::Configuration(format!(
                "Suite identity '{}' has an invalid segment '{}'",
                identity, bad
            )));
        }

        let last = segments.len().saturating_sub(1);
        let is_interior = |idx: usize| idx > 0 && idx < last;

        let has_marker = |marker: &str| {
            segments
                .iter()
                .enumerate()
                .any(|(idx, s)| *s == marker && is_interior(idx))
        };

        if !has_marker(MODULES_MARKER) || !has_marker(TESTS_MARKER) {
            return Err(Error::Configuration(format!(
                "Suite identity '{}' must contain '{}' and '{}' segments, \
                 e.g. com.acme.modules.commons.tests.ButtonTest",
                identity, MODULES_MARKER, TESTS_MARKER
            )));
        }

        let kept: Vec<&str> = segments
            .iter()
            .enumerate()
            .filter(|(idx, s)| !(**s == TESTS_MARKER && is_interior(*idx)))
            .map(|(_, s)| *s)
            .collect();

        // The tests filter never touches modules markers, so one is still interior
        let anchor = kept
            .iter()
            .enumerate()
            .rev()
            .find(|(idx, s)| **s == MODULES_MARKER && *idx > 0 && *idx + 1 < kept.len())
            .map(|(idx, _)| idx)
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "Suite identity '{}' has nothing after the '{}' segment",
                    identity, MODULES_MARKER
                ))
            })?;

        let suite_segments = &kept[anchor + 1..];
        if let Some(clash) = suite_segments
            .iter()
            .find(|s| ArtifactRole::ALL.iter().any(|role| role.dir_name() == **s))
        {
            return Err(Error::Configuration(format!(
                "Suite identity '{}' uses the reserved directory name '{}'",
                identity, clash
            )));
        }

        Ok(Self {
            segments: suite_segments.iter().map(|s| s.to_string()).collect(),
            full_name,
        })
    }

    /// Normalized dotted identity
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Directory of this suite relative to the artifact root
    pub fn relative_dir(&self) -> PathBuf {
        self.segments.iter().collect()
    }

    /// Absolute suite directory under `root`
    pub fn suite_dir(&self, root: &Path) -> PathBuf {
        root.join(self.relative_dir())
    }

    /// Last segment, usually the suite type name
    pub fn short_name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }
}

impl fmt::Display for SuiteIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}
