// Public API types module
//
// Configuration shared by every suite of a run, with builder-style setters.

pub mod visual_config;

pub use visual_config::{DEFAULT_OPERATION_TIMEOUT_MS, ImageFormat, Tolerance, VisualConfig};
