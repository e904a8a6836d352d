// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Verifier - baseline/actual/diff verification for one test suite
//
// Every verification follows the same path, whatever the region source:
//
// 1. Resolve the region source to a capture target
// 2. No baseline: capture straight into pending-review/<baseline file> and
//    return the development-mode flag
// 3. Baseline present: capture into temp/, compare, then
//    - match: delete the temp capture and the temp diff
//    - mismatch: move the capture to pending-review/<baseline file> and the
//      diff to diff/<name>-diff.<ext>
//
// verify() reports the outcome as a bool and records failures in a soft
// ledger; assert() returns an error instead. Both produce the same files.

use crate::api::VisualConfig;
use crate::artifact::{ArtifactName, ArtifactRole, SuiteIdentity, SuiteLayout};
use crate::capture::{CaptureAdapter, CaptureTarget, RegionSource, Surface};
use crate::compare::{Comparer, ComparisonContext, ComparisonPipeline};
use crate::error::{Error, FailureReason, Result};
use crate::run_coordinator::RunCoordinator;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempPath;

/// Test name used before `begin_test` is called
const UNNAMED_TEST: &str = "<unnamed>";

/// Outcome of a single verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Capture equals the baseline; no artifacts were kept
    Match,
    /// Capture differs; both artifacts were kept for review
    Mismatch {
        candidate: PathBuf,
        diff: PathBuf,
        message: String,
    },
    /// No baseline existed; the capture was saved as a candidate
    BaselineMissing { candidate: PathBuf, accepted: bool },
}

impl Verdict {
    /// Returns true if the verification counts as passing
    pub fn passed(&self) -> bool {
        match self {
            Verdict::Match => true,
            Verdict::Mismatch { .. } => false,
            Verdict::BaselineMissing { accepted, .. } => *accepted,
        }
    }

    fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            Verdict::Match | Verdict::BaselineMissing { accepted: true, .. } => None,
            Verdict::Mismatch { message, .. } => Some(FailureReason::Mismatch {
                message: message.clone(),
            }),
            Verdict::BaselineMissing { candidate, .. } => Some(FailureReason::BaselineMissing {
                candidate: candidate.clone(),
            }),
        }
    }
}

/// A failed verify-mode check, kept until the test asks for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftFailure {
    pub suite: String,
    pub test: String,
    pub baseline: String,
    pub message: String,
}

/// Visual verification for one test suite
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use visual_verify::{Comparer, RegionSource, RunCoordinator, Surface, Verifier, VisualConfig};
///
/// # async fn run(surface: Arc<dyn Surface>, comparer: Arc<dyn Comparer>) -> visual_verify::Result<()> {
/// let coordinator = RunCoordinator::new();
/// let config = VisualConfig::from_env()?;
///
/// let verifier = Verifier::new(
///     "acme::modules::commons::tests::button_test",
///     &config,
///     &coordinator,
///     surface,
///     comparer,
/// )
/// .await?;
///
/// verifier.begin_test("renders_login_button");
/// verifier
///     .assert(RegionSource::element("login-button"), "LoginButton")
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Verifier {
    suite: SuiteIdentity,
    suite_name: String,
    layout: SuiteLayout,
    dev_mode: bool,
    capture: CaptureAdapter,
    pipeline: ComparisonPipeline,
    current_test: Mutex<String>,
    last_verdict: Mutex<Option<Verdict>>,
    soft_failures: Mutex<Vec<SoftFailure>>,
}

impl Verifier {
    /// Creates the verifier for a suite.
    ///
    /// Validates the identity before touching the filesystem, creates the
    /// suite's four directories, and runs the once-per-run purge through
    /// `coordinator`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` for a malformed identity or an unusable
    /// artifact root. Callers should treat it as fatal (see [`Error::is_fatal`]).
    pub async fn new(
        identity: &str,
        config: &VisualConfig,
        coordinator: &RunCoordinator,
        surface: Arc<dyn Surface>,
        comparer: Arc<dyn Comparer>,
    ) -> Result<Self> {
        let suite = SuiteIdentity::parse(identity)?;
        config.validate()?;

        let layout = SuiteLayout::resolve(&suite, config);
        layout.ensure_dirs().await?;
        coordinator.ensure_purged(&config.artifact_root).await;

        let capture = CaptureAdapter::new(
            surface,
            layout.dir(ArtifactRole::Temp),
            layout.extension(),
            config.capture_timeout_duration(),
        );
        let pipeline = ComparisonPipeline::new(
            comparer,
            config.tolerance,
            config.compare_timeout_duration(),
        );

        tracing::debug!(
            "Verifier ready for {} at {}",
            suite.full_name(),
            layout.suite_dir().display()
        );

        Ok(Self {
            suite_name: suite.to_string(),
            suite,
            layout,
            dev_mode: config.dev_mode,
            capture,
            pipeline,
            current_test: Mutex::new(UNNAMED_TEST.to_string()),
            last_verdict: Mutex::new(None),
            soft_failures: Mutex::new(Vec::new()),
        })
    }

    pub fn suite(&self) -> &SuiteIdentity {
        &self.suite
    }

    pub fn layout(&self) -> &SuiteLayout {
        &self.layout
    }

    pub fn dev_mode(&self) -> bool {
        self.dev_mode
    }

    /// Names the test that subsequent verifications belong to
    pub fn begin_test(&self, name: impl Into<String>) {
        *self.current_test.lock() = name.into();
    }

    pub fn current_test(&self) -> String {
        self.current_test.lock().clone()
    }

    /// Verdict of the most recent verification.
    ///
    /// `None` if nothing was verified yet or the last call ended in an error
    /// (capture failure, artifact I/O, invalid region).
    pub fn last_verdict(&self) -> Option<Verdict> {
        self.last_verdict.lock().clone()
    }

    /// Verifies a region against a baseline, reporting failure as `false`.
    ///
    /// Failures (mismatch, rejected missing baseline, capture or artifact
    /// errors) are logged and recorded in the soft-failure ledger.
    pub async fn verify(&self, source: RegionSource, baseline: &str) -> bool {
        let message = match self.evaluate(&source, baseline).await {
            Ok(verdict) => match verdict.failure_reason() {
                None => return true,
                Some(reason) => reason.to_string(),
            },
            Err(e) => {
                self.log_error(&source, baseline, &e);
                e.to_string()
            }
        };

        self.soft_failures.lock().push(SoftFailure {
            suite: self.suite_name.clone(),
            test: self.current_test(),
            baseline: baseline.to_string(),
            message,
        });
        false
    }

    /// Verifies a region against a baseline, failing with an error.
    ///
    /// Produces exactly the same artifacts as [`Verifier::verify`].
    ///
    /// # Errors
    ///
    /// - `Error::VerificationFailed` for a mismatch, a missing baseline outside
    ///   development mode, or a failed capture
    /// - `Error::Context` wrapping `Error::ArtifactIo` or `Error::InvalidRegion`
    pub async fn assert(&self, source: RegionSource, baseline: &str) -> Result<()> {
        match self.evaluate(&source, baseline).await {
            Ok(verdict) => match verdict.failure_reason() {
                None => Ok(()),
                Some(reason) => Err(self.failure(baseline, reason)),
            },
            Err(e) => {
                self.log_error(&source, baseline, &e);
                if e.is_capture_failure() {
                    Err(self.failure(
                        baseline,
                        FailureReason::Capture {
                            message: e.to_string(),
                        },
                    ))
                } else {
                    Err(e.context(format!(
                        "{}::{} baseline '{}'",
                        self.suite_name,
                        self.current_test(),
                        baseline
                    )))
                }
            }
        }
    }

    /// Captures a region into pending-review/ without comparing.
    ///
    /// Returns the path of the saved image.
    pub async fn capture_for_review(&self, source: RegionSource, name: &str) -> Result<PathBuf> {
        let target = self.capture.resolve(&source).await?;
        let dest = self.layout.path(
            ArtifactRole::PendingReview,
            name,
            ArtifactName::Wrapped(ArtifactRole::PendingReview),
        );
        let actual = self.capture.capture(&target).await?;
        persist(actual, &dest)?;

        tracing::info!(
            suite = %self.suite_name,
            baseline = name,
            "An image is created in: {}",
            dest.display()
        );
        Ok(dest)
    }

    /// Failed verify-mode checks recorded so far
    pub fn soft_failures(&self) -> Vec<SoftFailure> {
        self.soft_failures.lock().clone()
    }

    /// Drains the soft-failure ledger, failing if it held anything.
    pub fn assert_no_soft_failures(&self) -> Result<()> {
        let failures = std::mem::take(&mut *self.soft_failures.lock());
        if failures.is_empty() {
            return Ok(());
        }

        let summary = failures
            .iter()
            .map(|f| format!("  {}::{} '{}': {}", f.suite, f.test, f.baseline, f.message))
            .collect::<Vec<_>>()
            .join("\n");
        Err(Error::SoftFailures {
            count: failures.len(),
            summary,
        })
    }

    async fn evaluate(&self, source: &RegionSource, name: &str) -> Result<Verdict> {
        let result = self.run_verification(source, name).await;
        *self.last_verdict.lock() = result.as_ref().ok().cloned();
        result
    }

    async fn run_verification(&self, source: &RegionSource, name: &str) -> Result<Verdict> {
        let target = self.capture.resolve(source).await?;

        let baseline_file = self
            .layout
            .file_name(name, ArtifactName::Wrapped(ArtifactRole::Baseline));
        let baseline = self.layout.dir(ArtifactRole::Baseline).join(&baseline_file);
        let candidate =
            self.layout
                .path(ArtifactRole::PendingReview, &baseline_file, ArtifactName::Raw);

        match tokio::fs::metadata(&baseline).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(Error::artifact_io(
                    &baseline,
                    std::io::Error::other("baseline path is not a regular file"),
                ));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return self.bootstrap(&target, &baseline_file, candidate).await;
            }
            Err(e) => return Err(Error::artifact_io(&baseline, e)),
        }

        let actual = self.capture.capture(&target).await?;
        let diff = self.capture.allocate("diff-").await?;

        let test = self.current_test();
        let ctx = ComparisonContext {
            suite: &self.suite_name,
            test: &test,
            baseline: &baseline_file,
        };
        let outcome = self.pipeline.run(&baseline, &actual, &diff, ctx).await?;

        if outcome.matched {
            discard(actual);
            discard(diff);
            return Ok(Verdict::Match);
        }

        let diff_dest =
            self.layout
                .path(ArtifactRole::Diff, name, ArtifactName::Wrapped(ArtifactRole::Diff));
        persist(actual, &candidate)?;
        persist(diff, &diff_dest)?;

        tracing::warn!(
            suite = %self.suite_name,
            test = %test,
            baseline = %baseline_file,
            "The new candidate image is saved on: {}; diff image is created on: {}",
            candidate.display(),
            diff_dest.display()
        );

        Ok(Verdict::Mismatch {
            candidate,
            diff: diff_dest,
            message: outcome.message,
        })
    }

    /// No baseline: the capture itself becomes the candidate baseline.
    ///
    /// Nothing is diffed, since there is only one image.
    async fn bootstrap(
        &self,
        target: &CaptureTarget,
        baseline_file: &str,
        candidate: PathBuf,
    ) -> Result<Verdict> {
        let actual = self.capture.capture(target).await?;
        persist(actual, &candidate)?;

        tracing::warn!(
            suite = %self.suite_name,
            test = %self.current_test(),
            baseline = baseline_file,
            dev_mode = self.dev_mode,
            "No baseline found; candidate saved to {} for review",
            candidate.display()
        );

        Ok(Verdict::BaselineMissing {
            candidate,
            accepted: self.dev_mode,
        })
    }

    fn failure(&self, baseline: &str, reason: FailureReason) -> Error {
        Error::VerificationFailed {
            suite: self.suite_name.clone(),
            test: self.current_test(),
            baseline: baseline.to_string(),
            reason,
        }
    }

    fn log_error(&self, source: &RegionSource, baseline: &str, error: &Error) {
        let test = self.current_test();
        if error.is_capture_failure() {
            tracing::warn!(
                suite = %self.suite_name,
                test = %test,
                baseline,
                "Capture of {} failed: {}",
                source,
                error
            );
        } else if matches!(error, Error::ArtifactIo { .. }) {
            tracing::error!(
                suite = %self.suite_name,
                test = %test,
                baseline,
                "Could not save verification evidence: {}",
                error
            );
        } else {
            tracing::error!(
                suite = %self.suite_name,
                test = %test,
                baseline,
                "Verification of {} aborted: {}",
                source,
                error
            );
        }
    }
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("suite", &self.suite_name)
            .field("suite_dir", &self.layout.suite_dir())
            .field("dev_mode", &self.dev_mode)
            .finish()
    }
}

fn persist(temp: TempPath, dest: &Path) -> Result<()> {
    temp.persist(dest)
        .map_err(|e| Error::artifact_io(dest, e.error))
}

fn discard(temp: TempPath) {
    let path = temp.to_path_buf();
    if let Err(e) = temp.close() {
        tracing::warn!("Failed to delete temp artifact {}: {}", path.display(), e);
    }
}
