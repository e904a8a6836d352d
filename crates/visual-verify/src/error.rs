// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Error types for visual-verify

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for visual-verify operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing, comparing, or storing visual artifacts
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed suite identity or unusable artifact root
    ///
    /// This is the only fatal error: a misconfigured suite cannot safely write
    /// artifacts anywhere, so the harness should halt the whole run.
    /// See [`Error::is_fatal`].
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The capture collaborator could not produce pixels
    ///
    /// Common causes: browser unresponsive, surface not renderable.
    #[error("Capture failed: {0}")]
    Capture(String),

    /// Element could not be located on the rendered surface
    #[error("Element not found: '{0}'")]
    ElementNotFound(String),

    /// Capture or comparison exceeded its configured timeout
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The external comparator failed
    #[error("Comparison error: {0}")]
    Comparison(String),

    /// A review artifact could not be written or relocated
    ///
    /// Distinct from a mismatch: the images may or may not differ, but the
    /// evidence could not be saved.
    #[error("Artifact I/O error at '{}': {source}", path.display())]
    ArtifactIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Region with zero width or height
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// Assert-mode verification did not pass
    #[error("Visual verification failed for '{baseline}' ({suite}::{test}): {reason}")]
    VerificationFailed {
        suite: String,
        test: String,
        baseline: String,
        reason: FailureReason,
    },

    /// Verify-mode failures collected during a test
    #[error("{count} visual verification(s) failed:\n{summary}")]
    SoftFailures { count: usize, summary: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error with additional context
    #[error("{0}: {1}")]
    Context(String, #[source] Box<Error>),
}

impl Error {
    /// Adds context to the error
    pub fn context(self, msg: impl Into<String>) -> Self {
        Error::Context(msg.into(), Box::new(self))
    }

    /// Returns true if the run cannot safely continue.
    ///
    /// Only configuration errors are fatal; everything else fails a single
    /// verification and lets the process go on.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Configuration(_) => true,
            Error::Context(_, inner) => inner.is_fatal(),
            _ => false,
        }
    }

    /// Returns true if the collaborator failed to produce pixels.
    pub fn is_capture_failure(&self) -> bool {
        match self {
            Error::Capture(_) | Error::ElementNotFound(_) | Error::Timeout(_) => true,
            Error::Context(_, inner) => inner.is_capture_failure(),
            _ => false,
        }
    }

    pub(crate) fn artifact_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::ArtifactIo {
            path: path.into(),
            source,
        }
    }
}

/// Why an assert-mode verification failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Baseline and actual capture differ (or the comparator failed closed)
    Mismatch { message: String },
    /// No baseline existed and development mode is off
    BaselineMissing { candidate: PathBuf },
    /// The surface could not be captured
    Capture { message: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Mismatch { message } => write!(f, "images differ: {}", message),
            FailureReason::BaselineMissing { candidate } => write!(
                f,
                "no baseline exists; candidate saved to '{}' for review",
                candidate.display()
            ),
            FailureReason::Capture { message } => write!(f, "capture failed: {}", message),
        }
    }
}
