// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Comparison pipeline
//
// The pixel-level algorithm is external and sits behind the Comparer trait.
// The pipeline only decides "did it match": it bounds the call with a
// timeout, fails closed on any comparator error, and writes the diff image
// into the diff temp file it is handed. Moving files afterwards is the
// Verifier's job.

use crate::api::Tolerance;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Result reported by a comparator
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Comparison {
    /// Whether the images agree within tolerance
    pub matched: bool,
    /// Encoded difference image; may be empty
    pub diff_image: Vec<u8>,
    /// Human-readable summary
    pub message: String,
}

/// External pixel comparer
#[async_trait]
pub trait Comparer: Send + Sync {
    /// Compares the baseline file against the actual capture.
    async fn compare(
        &self,
        baseline: &Path,
        actual: &Path,
        tolerance: Tolerance,
    ) -> Result<Comparison>;
}

/// Who is comparing, for diagnostics
#[derive(Debug, Clone, Copy)]
pub struct ComparisonContext<'a> {
    pub suite: &'a str,
    pub test: &'a str,
    pub baseline: &'a str,
}

/// What the pipeline decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonOutcome {
    pub matched: bool,
    pub message: String,
    /// True if the comparator failed and the outcome was forced to non-match
    pub faulted: bool,
}

/// Wraps a comparator with tolerances and a timeout
#[derive(Clone)]
pub struct ComparisonPipeline {
    comparer: Arc<dyn Comparer>,
    tolerance: Tolerance,
    timeout: Duration,
}

impl ComparisonPipeline {
    pub fn new(comparer: Arc<dyn Comparer>, tolerance: Tolerance, timeout: Duration) -> Self {
        Self {
            comparer,
            tolerance,
            timeout,
        }
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    /// Compares `baseline` with `actual`, writing any diff image to `diff`.
    ///
    /// Comparator errors and timeouts never escape: they are logged and
    /// reported as a non-match with `faulted` set.
    ///
    /// # Errors
    ///
    /// Returns `Error::ArtifactIo` only if the diff image cannot be written.
    pub async fn run(
        &self,
        baseline: &Path,
        actual: &Path,
        diff: &Path,
        ctx: ComparisonContext<'_>,
    ) -> Result<ComparisonOutcome> {
        let result = tokio::time::timeout(
            self.timeout,
            self.comparer.compare(baseline, actual, self.tolerance),
        )
        .await
        .unwrap_or_else(|_| {
            Err(Error::Timeout(format!(
                "comparison exceeded {}ms",
                self.timeout.as_millis()
            )))
        });

        let comparison = match result {
            Ok(comparison) => comparison,
            Err(e) => {
                tracing::error!(
                    suite = ctx.suite,
                    test = ctx.test,
                    baseline = ctx.baseline,
                    "Comparator failed, treating as mismatch: {}",
                    e
                );
                return Ok(ComparisonOutcome {
                    matched: false,
                    message: format!("comparator error: {}", e),
                    faulted: true,
                });
            }
        };

        if comparison.matched {
            tracing::info!(
                suite = ctx.suite,
                test = ctx.test,
                baseline = ctx.baseline,
                "Comparing {} ==> PASS",
                ctx.baseline
            );
        } else {
            tracing::warn!(
                suite = ctx.suite,
                test = ctx.test,
                baseline = ctx.baseline,
                "Comparing {} ==> FAILED: {}",
                ctx.baseline,
                comparison.message
            );
            if !comparison.diff_image.is_empty() {
                tokio::fs::write(diff, &comparison.diff_image)
                    .await
                    .map_err(|e| Error::artifact_io(diff, e))?;
            }
        }

        Ok(ComparisonOutcome {
            matched: comparison.matched,
            message: comparison.message,
            faulted: false,
        })
    }
}

impl std::fmt::Debug for ComparisonPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComparisonPipeline")
            .field("tolerance", &self.tolerance)
            .field("timeout", &self.timeout)
            .finish()
    }
}
