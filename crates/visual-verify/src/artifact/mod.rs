// Artifact path resolution
//
// Maps a suite identity to its directories and artifact file names.

pub mod identity;
pub mod layout;

pub use identity::{MODULES_MARKER, SuiteIdentity, TESTS_MARKER};
pub use layout::{ArtifactName, ArtifactRole, DIFF_MARKER, SuiteLayout};
