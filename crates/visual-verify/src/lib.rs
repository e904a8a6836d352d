//! visual-verify: Baseline/actual/diff artifact lifecycle for visual regression tests
//!
//! This crate decides whether a rendered UI region still looks the way a human
//! accepted it. It captures the region through a [`Surface`], compares it with
//! the stored baseline through a [`Comparer`], and keeps the evidence on disk
//! when they disagree.
//!
//! Per suite, under the configured artifact root:
//!
//! | Directory         | Contents                                          |
//! |-------------------|---------------------------------------------------|
//! | `baseline/`       | accepted images, curated by hand                  |
//! | `pending-review/` | new candidates and failing captures               |
//! | `temp/`           | scratch captures, gone after each verification    |
//! | `diff/`           | difference images for mismatches                  |
//!
//! `temp/`, `pending-review/` and `diff/` are emptied once per run by the
//! [`RunCoordinator`].
//!
//! # Examples
//!
//! ## Verifying an element
//!
//! ```ignore
//! use std::sync::Arc;
//! use visual_verify::{Comparer, RegionSource, RunCoordinator, Surface, Verifier, VisualConfig};
//!
//! async fn login_page(
//!     surface: Arc<dyn Surface>,
//!     comparer: Arc<dyn Comparer>,
//! ) -> visual_verify::Result<()> {
//!     let coordinator = RunCoordinator::new();
//!     let config = VisualConfig::new("/srv/visual-baselines").dev_mode(false);
//!
//!     let verifier = Verifier::new(
//!         "acme::modules::login::tests::login_page",
//!         &config,
//!         &coordinator,
//!         surface,
//!         comparer,
//!     )
//!     .await?;
//!
//!     verifier.begin_test("login_button_default_state");
//!
//!     // Hard failure on mismatch
//!     verifier
//!         .assert(RegionSource::element("login-button"), "LoginButton")
//!         .await?;
//!
//!     // Soft checks, reported together at the end of the test
//!     verifier.verify(RegionSource::rect(0, 0, 400, 120), "Header").await;
//!     verifier.verify(RegionSource::FullSurface, "LoginPage").await;
//!     verifier.assert_no_soft_failures()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Implementing a surface
//!
//! ```ignore
//! use async_trait::async_trait;
//! use visual_verify::{Error, Region, Result, Surface};
//!
//! struct MySurface;
//!
//! #[async_trait]
//! impl Surface for MySurface {
//!     async fn locate(&self, element_id: &str) -> Result<Region> {
//!         Err(Error::ElementNotFound(element_id.to_string()))
//!     }
//!
//!     async fn capture_region(&self, region: Region) -> Result<Vec<u8>> {
//!         Err(Error::Capture(format!("cannot capture {}", region)))
//!     }
//!
//!     async fn capture_full_surface(&self) -> Result<Vec<u8>> {
//!         Err(Error::Capture("no browser".to_string()))
//!     }
//! }
//! ```

pub mod api;
pub mod artifact;
pub mod capture;
pub mod compare;
mod error;
mod run_coordinator;
mod verifier;

// Re-export error types
pub use error::{Error, FailureReason, Result};

// Re-export configuration
pub use api::{DEFAULT_OPERATION_TIMEOUT_MS, ImageFormat, Tolerance, VisualConfig};

// Re-export artifact layout
pub use artifact::{ArtifactName, ArtifactRole, SuiteIdentity, SuiteLayout};

// Re-export capture types
pub use capture::{CaptureAdapter, CaptureTarget, Region, RegionSource, Surface};

// Re-export comparison types
pub use compare::{Comparer, Comparison, ComparisonContext, ComparisonOutcome, ComparisonPipeline};

// Re-export run coordination and verification
pub use run_coordinator::{PurgeReport, RunCoordinator};
pub use verifier::{SoftFailure, Verdict, Verifier};
