// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Capture - obtaining pixels from the rendered surface
//
// The browser is reached through the Surface trait; this crate never talks
// to a driver itself. CaptureAdapter wraps a Surface with timeouts, error
// normalization, and temp-file handling:
//
// - Region sources (rectangle, element, element-anchored, viewport, full
//   surface) are resolved to a CaptureTarget before any pixels are taken
// - Captured bytes land in uniquely named files inside the suite's temp/
// - Temp files are returned as tempfile::TempPath, which deletes the file on
//   drop unless it is persisted into pending-review/ or diff/

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempPath;

/// Rectangle in rendered-surface coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// X coordinate of the region origin
    pub x: i32,
    /// Y coordinate of the region origin
    pub y: i32,
    /// Width of the region
    pub width: u32,
    /// Height of the region
    pub height: u32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Same origin, different size
    pub fn with_size(self, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..self
        }
    }

    /// Rejects regions without area.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRegion` if width or height is zero.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidRegion(format!(
                "{} has no area; width and height must be positive",
                self
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} at ({}, {})",
            self.width, self.height, self.x, self.y
        )
    }
}

/// What part of the surface a verification looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionSource {
    /// Explicit rectangle
    Rect(Region),
    /// Bounding box of an element
    Element(String),
    /// Element origin with a caller-chosen size
    ElementAnchored {
        element_id: String,
        width: u32,
        height: u32,
    },
    /// Visible view box of the browser
    Viewport,
    /// Entire rendered surface, captured with the whole-surface primitive
    FullSurface,
}

impl RegionSource {
    pub fn rect(x: i32, y: i32, width: u32, height: u32) -> Self {
        RegionSource::Rect(Region::new(x, y, width, height))
    }

    pub fn element(element_id: impl Into<String>) -> Self {
        RegionSource::Element(element_id.into())
    }

    pub fn element_anchored(element_id: impl Into<String>, width: u32, height: u32) -> Self {
        RegionSource::ElementAnchored {
            element_id: element_id.into(),
            width,
            height,
        }
    }
}

impl fmt::Display for RegionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionSource::Rect(region) => write!(f, "region {}", region),
            RegionSource::Element(id) => write!(f, "element '{}'", id),
            RegionSource::ElementAnchored {
                element_id,
                width,
                height,
            } => write!(f, "{}x{} anchored at element '{}'", width, height, element_id),
            RegionSource::Viewport => f.write_str("viewport"),
            RegionSource::FullSurface => f.write_str("full surface"),
        }
    }
}

/// A region source resolved against the live surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTarget {
    Region(Region),
    FullSurface,
}

impl fmt::Display for CaptureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureTarget::Region(region) => write!(f, "{}", region),
            CaptureTarget::FullSurface => f.write_str("full surface"),
        }
    }
}

/// Rendered surface that can be measured and captured
///
/// Implementations wrap a browser session. Errors must be mapped to
/// `Error::Capture`, `Error::ElementNotFound` or `Error::Timeout`; anything
/// else is normalized to `Error::Capture` by the adapter.
#[async_trait]
pub trait Surface: Send + Sync {
    /// Bounding box of the element with the given id
    async fn locate(&self, element_id: &str) -> Result<Region>;

    /// Raster bytes of a rectangle of the surface
    async fn capture_region(&self, region: Region) -> Result<Vec<u8>>;

    /// Raster bytes of the whole rendered surface
    async fn capture_full_surface(&self) -> Result<Vec<u8>>;

    /// Visible view box of the browser
    async fn viewport(&self) -> Result<Region> {
        Err(Error::Capture(
            "this surface does not report a viewport".to_string(),
        ))
    }

    /// Waits until rendering has settled; awaited before every capture
    async fn wait_for_stable(&self) -> Result<()> {
        Ok(())
    }
}

/// Capture side of a suite: a surface plus the suite's temp directory
#[derive(Clone)]
pub struct CaptureAdapter {
    surface: Arc<dyn Surface>,
    temp_dir: PathBuf,
    extension: &'static str,
    timeout: Duration,
}

impl CaptureAdapter {
    pub fn new(
        surface: Arc<dyn Surface>,
        temp_dir: impl Into<PathBuf>,
        extension: &'static str,
        timeout: Duration,
    ) -> Self {
        Self {
            surface,
            temp_dir: temp_dir.into(),
            extension,
            timeout,
        }
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Turns a region source into a concrete target.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidRegion` if the resolved rectangle has no area
    /// - a capture failure if the element or viewport cannot be measured
    pub async fn resolve(&self, source: &RegionSource) -> Result<CaptureTarget> {
        let region = match source {
            RegionSource::FullSurface => return Ok(CaptureTarget::FullSurface),
            RegionSource::Rect(region) => *region,
            RegionSource::Element(id) => {
                self.bounded("locate", self.surface.locate(id)).await?
            }
            RegionSource::ElementAnchored {
                element_id,
                width,
                height,
            } => self
                .bounded("locate", self.surface.locate(element_id))
                .await?
                .with_size(*width, *height),
            RegionSource::Viewport => self.bounded("viewport", self.surface.viewport()).await?,
        };

        region.validate()?;
        Ok(CaptureTarget::Region(region))
    }

    /// Captures the target into a fresh temp file.
    ///
    /// On failure no file is left behind.
    pub async fn capture(&self, target: &CaptureTarget) -> Result<TempPath> {
        let bytes = self.grab(target).await?;
        let path = self.write_temp("capture-", bytes).await?;
        tracing::debug!("Captured {} into {}", target, path.display());
        Ok(path)
    }

    /// Allocates an empty, uniquely named temp file
    pub async fn allocate(&self, prefix: &'static str) -> Result<TempPath> {
        self.write_temp(prefix, Vec::new()).await
    }

    async fn grab(&self, target: &CaptureTarget) -> Result<Vec<u8>> {
        self.bounded("settle", self.surface.wait_for_stable()).await?;

        let bytes = match target {
            CaptureTarget::Region(region) => {
                self.bounded("capture", self.surface.capture_region(*region))
                    .await?
            }
            CaptureTarget::FullSurface => {
                self.bounded("capture", self.surface.capture_full_surface())
                    .await?
            }
        };

        if bytes.is_empty() {
            return Err(Error::Capture(format!(
                "surface returned no pixels for {}",
                target
            )));
        }
        Ok(bytes)
    }

    /// Runs a collaborator call under the capture timeout, normalizing errors
    async fn bounded<T>(
        &self,
        what: &str,
        call: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) if e.is_capture_failure() => Err(e),
            Ok(Err(e)) => Err(Error::Capture(format!("{} failed: {}", what, e))),
            Err(_) => Err(Error::Timeout(format!(
                "{} exceeded {}ms",
                what,
                self.timeout.as_millis()
            ))),
        }
    }

    async fn write_temp(&self, prefix: &'static str, bytes: Vec<u8>) -> Result<TempPath> {
        let dir = self.temp_dir.clone();
        let suffix = format!(".{}", self.extension);

        tokio::task::spawn_blocking(move || -> Result<TempPath> {
            let mut file = tempfile::Builder::new()
                .prefix(prefix)
                .suffix(&suffix)
                .tempfile_in(&dir)
                .map_err(|e| Error::artifact_io(&dir, e))?;
            file.write_all(&bytes)
                .and_then(|()| file.flush())
                .map_err(|e| Error::artifact_io(file.path(), e))?;
            Ok(file.into_temp_path())
        })
        .await
        .map_err(|e| Error::Capture(format!("temp writer did not complete: {}", e)))?
    }
}

impl fmt::Debug for CaptureAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureAdapter")
            .field("temp_dir", &self.temp_dir)
            .field("extension", &self.extension)
            .field("timeout", &self.timeout)
            .finish()
    }
}
