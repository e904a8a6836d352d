// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Configuration for visual verification
//
// A VisualConfig is created once by the harness and shared read-only by every
// suite. It can be built in code, parsed from JSON, or read from VISUAL_*
// environment variables.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default timeout in milliseconds for captures and comparisons.
pub const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 30_000;

/// Raster format used for every artifact of a run
///
/// # Example
///
/// ```ignore
/// use visual_verify::ImageFormat;
///
/// assert_eq!(ImageFormat::Png.extension(), "png");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless)
    #[default]
    Png,
    /// JPEG format (lossy, only useful with a nonzero color tolerance)
    Jpeg,
}

impl ImageFormat {
    /// File extension without the leading dot
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            _ => None,
        }
    }
}

/// Comparison tolerances handed to the comparator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tolerance {
    /// Maximum per-pixel color distance still considered equal
    pub color_distance: u32,
    /// Number of differing pixels still considered a match
    pub pixel_count: u64,
}

impl Tolerance {
    /// Exact match: no color drift, no differing pixels
    pub const EXACT: Tolerance = Tolerance {
        color_distance: 0,
        pixel_count: 0,
    };

    pub fn new(color_distance: u32, pixel_count: u64) -> Self {
        Self {
            color_distance,
            pixel_count,
        }
    }
}

/// Process-wide settings for visual verification
///
/// All fields have defaults, so partial JSON documents are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisualConfig {
    /// Root of the shared image repository
    pub artifact_root: PathBuf,

    /// Treat a missing baseline as passing (candidate is still saved for review)
    pub dev_mode: bool,

    /// Raster format for baselines, captures, and diffs
    pub image_format: ImageFormat,

    /// Tolerances passed to the comparator
    pub tolerance: Tolerance,

    /// Prefix applied to wrapped baseline names
    pub baseline_prefix: String,

    /// Prefix applied to wrapped diff names
    pub diff_prefix: String,

    /// Upper bound for a single capture in milliseconds
    pub capture_timeout_ms: u64,

    /// Upper bound for a single comparison in milliseconds
    pub compare_timeout_ms: u64,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            artifact_root: PathBuf::from("visual-artifacts"),
            dev_mode: false,
            image_format: ImageFormat::Png,
            tolerance: Tolerance::EXACT,
            baseline_prefix: String::new(),
            diff_prefix: String::new(),
            capture_timeout_ms: DEFAULT_OPERATION_TIMEOUT_MS,
            compare_timeout_ms: DEFAULT_OPERATION_TIMEOUT_MS,
        }
    }
}

impl VisualConfig {
    /// Creates a config rooted at `artifact_root` with default values
    pub fn new(artifact_root: impl Into<PathBuf>) -> Self {
        Self {
            artifact_root: artifact_root.into(),
            ..Self::default()
        }
    }

    /// Set development mode
    pub fn dev_mode(mut self, enabled: bool) -> Self {
        self.dev_mode = enabled;
        self
    }

    /// Set the artifact image format
    pub fn image_format(mut self, format: ImageFormat) -> Self {
        self.image_format = format;
        self
    }

    /// Set comparison tolerances
    pub fn tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the prefix for wrapped baseline names
    pub fn baseline_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.baseline_prefix = prefix.into();
        self
    }

    /// Set the prefix for wrapped diff names
    pub fn diff_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.diff_prefix = prefix.into();
        self
    }

    /// Set the capture timeout
    pub fn capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the comparison timeout
    pub fn compare_timeout(mut self, timeout: Duration) -> Self {
        self.compare_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn capture_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    pub fn compare_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.compare_timeout_ms)
    }

    /// Parses a config from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: VisualConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Builds a config from `VISUAL_*` environment variables
    ///
    /// Unset variables keep their defaults. Recognized variables:
    /// - `VISUAL_ARTIFACT_ROOT`
    /// - `VISUAL_DEV_MODE` (`1`/`true`/`yes`)
    /// - `VISUAL_IMAGE_FORMAT` (`png`/`jpeg`)
    /// - `VISUAL_COLOR_DISTANCE`, `VISUAL_PIXEL_TOLERANCE`
    /// - `VISUAL_BASELINE_PREFIX`, `VISUAL_DIFF_PREFIX`
    /// - `VISUAL_CAPTURE_TIMEOUT_MS`, `VISUAL_COMPARE_TIMEOUT_MS`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(root) = lookup("VISUAL_ARTIFACT_ROOT") {
            config.artifact_root = PathBuf::from(root);
        }
        if let Some(value) = lookup("VISUAL_DEV_MODE") {
            config.dev_mode = parse_flag(&value);
        }
        if let Some(value) = lookup("VISUAL_IMAGE_FORMAT") {
            config.image_format = ImageFormat::parse(&value).ok_or_else(|| {
                Error::Configuration(format!("Unsupported VISUAL_IMAGE_FORMAT '{}'", value))
            })?;
        }
        if let Some(value) = lookup("VISUAL_COLOR_DISTANCE") {
            config.tolerance.color_distance = parse_number("VISUAL_COLOR_DISTANCE", &value)?;
        }
        if let Some(value) = lookup("VISUAL_PIXEL_TOLERANCE") {
            config.tolerance.pixel_count = parse_number("VISUAL_PIXEL_TOLERANCE", &value)?;
        }
        if let Some(prefix) = lookup("VISUAL_BASELINE_PREFIX") {
            config.baseline_prefix = prefix;
        }
        if let Some(prefix) = lookup("VISUAL_DIFF_PREFIX") {
            config.diff_prefix = prefix;
        }
        if let Some(value) = lookup("VISUAL_CAPTURE_TIMEOUT_MS") {
            config.capture_timeout_ms = parse_number("VISUAL_CAPTURE_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("VISUAL_COMPARE_TIMEOUT_MS") {
            config.compare_timeout_ms = parse_number("VISUAL_COMPARE_TIMEOUT_MS", &value)?;
        }

        Ok(config)
    }

    /// Checks that the config can be used for a run.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the root is empty or is an existing
    /// non-directory, or if a timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.artifact_root.as_os_str().is_empty() {
            return Err(Error::Configuration("Artifact root is empty".to_string()));
        }
        check_root(&self.artifact_root)?;
        if self.capture_timeout_ms == 0 || self.compare_timeout_ms == 0 {
            return Err(Error::Configuration(
                "Capture and compare timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_root(root: &Path) -> Result<()> {
    match std::fs::metadata(root) {
        Ok(meta) if !meta.is_dir() => Err(Error::Configuration(format!(
            "Artifact root '{}' is not a directory",
            root.display()
        ))),
        Ok(_) => Ok(()),
        // Created lazily with the suite directories
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Configuration(format!(
            "Artifact root '{}' is unreadable: {}",
            root.display(),
            e
        ))),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Configuration(format!("{} must be a number, got '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = VisualConfig::default();
        assert!(!config.dev_mode);
        assert_eq!(config.image_format, ImageFormat::Png);
        assert_eq!(config.tolerance, Tolerance::EXACT);
        assert_eq!(config.capture_timeout_ms, DEFAULT_OPERATION_TIMEOUT_MS);
        assert!(config.baseline_prefix.is_empty());
    }

    #[test]
    fn test_builder_chain() {
        let config = VisualConfig::new("/tmp/images")
            .dev_mode(true)
            .image_format(ImageFormat::Jpeg)
            .tolerance(Tolerance::new(8, 25))
            .capture_timeout(Duration::from_secs(5));

        assert_eq!(config.artifact_root, PathBuf::from("/tmp/images"));
        assert!(config.dev_mode);
        assert_eq!(config.image_format.extension(), "jpg");
        assert_eq!(config.tolerance.pixel_count, 25);
        assert_eq!(config.capture_timeout_duration(), Duration::from_secs(5));
    }

    #[test]
    fn test_from_json_partial() {
        let config = VisualConfig::from_json_str(
            r#"{"artifactRoot": "/srv/images", "devMode": true, "tolerance": {"colorDistance": 3}}"#,
        )
        .unwrap();

        assert_eq!(config.artifact_root, PathBuf::from("/srv/images"));
        assert!(config.dev_mode);
        assert_eq!(config.tolerance.color_distance, 3);
        assert_eq!(config.tolerance.pixel_count, 0);
        assert_eq!(config.compare_timeout_ms, DEFAULT_OPERATION_TIMEOUT_MS);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("VISUAL_ARTIFACT_ROOT", "/data/shots"),
            ("VISUAL_DEV_MODE", "TRUE"),
            ("VISUAL_IMAGE_FORMAT", "jpeg"),
            ("VISUAL_PIXEL_TOLERANCE", "40"),
            ("VISUAL_BASELINE_PREFIX", "chrome_"),
            ("VISUAL_DIFF_PREFIX", "cmp_"),
        ]
        .into_iter()
        .collect();

        let config =
            VisualConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.artifact_root, PathBuf::from("/data/shots"));
        assert!(config.dev_mode);
        assert_eq!(config.image_format, ImageFormat::Jpeg);
        assert_eq!(config.tolerance.pixel_count, 40);
        assert_eq!(config.baseline_prefix, "chrome_");
        assert_eq!(config.diff_prefix, "cmp_");
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = VisualConfig::from_lookup(|key| {
            (key == "VISUAL_COLOR_DISTANCE").then(|| "lots".to_string())
        })
        .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_validate() {
        assert!(VisualConfig::new("").validate().is_err());
        assert!(
            VisualConfig::new("/nonexistent/visual-root")
                .validate()
                .is_ok()
        );

        let mut config = VisualConfig::new("/nonexistent/visual-root");
        config.compare_timeout_ms = 0;
        assert!(config.validate().is_err());

        let file = tempfile::NamedTempFile::new().unwrap();
        let err = VisualConfig::new(file.path()).validate().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
