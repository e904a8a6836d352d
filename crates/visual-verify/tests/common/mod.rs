// Shared fixtures for integration tests
//
// - init_tracing(): installs a tracing subscriber once (RUST_LOG controls output)
// - FakeSurface: scripted Surface returning fixed raster bytes
// - ByteComparer / FailingComparer / HangingComparer: scripted Comparers
// - helpers for building verifiers and listing artifact directories

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use visual_verify::{
    ArtifactRole, Comparer, Comparison, Error, Region, Result, RunCoordinator, Surface,
    Tolerance, Verifier, VisualConfig,
};

static TRACING: Once = Once::new();

pub const SUITE: &str = "com.acme.modules.commons.tests.ButtonTest";

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Surface returning the same raster for every capture
pub struct FakeSurface {
    elements: HashMap<String, Region>,
    viewport: Option<Region>,
    raster: Mutex<Vec<u8>>,
    fail_with: Mutex<Option<String>>,
    pub region_captures: Mutex<Vec<Region>>,
    pub full_captures: AtomicUsize,
}

impl FakeSurface {
    pub fn new(raster: impl Into<Vec<u8>>) -> Self {
        Self {
            elements: HashMap::new(),
            viewport: None,
            raster: Mutex::new(raster.into()),
            fail_with: Mutex::new(None),
            region_captures: Mutex::new(Vec::new()),
            full_captures: AtomicUsize::new(0),
        }
    }

    pub fn with_element(mut self, id: &str, region: Region) -> Self {
        self.elements.insert(id.to_string(), region);
        self
    }

    pub fn with_viewport(mut self, region: Region) -> Self {
        self.viewport = Some(region);
        self
    }

    pub fn set_raster(&self, raster: impl Into<Vec<u8>>) {
        *self.raster.lock() = raster.into();
    }

    pub fn fail_captures(&self, message: &str) {
        *self.fail_with.lock() = Some(message.to_string());
    }

    pub fn capture_count(&self) -> usize {
        self.region_captures.lock().len() + self.full_captures.load(Ordering::SeqCst)
    }

    fn next_raster(&self) -> Result<Vec<u8>> {
        match self.fail_with.lock().clone() {
            Some(message) => Err(Error::Capture(message)),
            None => Ok(self.raster.lock().clone()),
        }
    }
}

#[async_trait]
impl Surface for FakeSurface {
    async fn locate(&self, element_id: &str) -> Result<Region> {
        self.elements
            .get(element_id)
            .copied()
            .ok_or_else(|| Error::ElementNotFound(element_id.to_string()))
    }

    async fn capture_region(&self, region: Region) -> Result<Vec<u8>> {
        self.region_captures.lock().push(region);
        self.next_raster()
    }

    async fn capture_full_surface(&self) -> Result<Vec<u8>> {
        self.full_captures.fetch_add(1, Ordering::SeqCst);
        self.next_raster()
    }

    async fn viewport(&self) -> Result<Region> {
        self.viewport
            .ok_or_else(|| Error::Capture("no viewport".to_string()))
    }
}

/// Matches when both files hold the same bytes; diff image is fixed
#[derive(Default)]
pub struct ByteComparer {
    pub calls: AtomicUsize,
}

pub const DIFF_BYTES: &[u8] = b"DIFF-IMAGE";

#[async_trait]
impl Comparer for ByteComparer {
    async fn compare(
        &self,
        baseline: &Path,
        actual: &Path,
        _tolerance: Tolerance,
    ) -> Result<Comparison> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let expected = tokio::fs::read(baseline).await?;
        let found = tokio::fs::read(actual).await?;
        let matched = expected == found;
        Ok(Comparison {
            matched,
            diff_image: if matched { Vec::new() } else { DIFF_BYTES.to_vec() },
            message: if matched {
                "identical".to_string()
            } else {
                "bytes differ".to_string()
            },
        })
    }
}

/// Always fails
pub struct FailingComparer;

#[async_trait]
impl Comparer for FailingComparer {
    async fn compare(&self, _: &Path, _: &Path, _: Tolerance) -> Result<Comparison> {
        Err(Error::Comparison("comparator crashed".to_string()))
    }
}

/// Never finishes within any reasonable timeout
pub struct HangingComparer;

#[async_trait]
impl Comparer for HangingComparer {
    async fn compare(&self, _: &Path, _: &Path, _: Tolerance) -> Result<Comparison> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Comparison::default())
    }
}

pub async fn verifier(
    config: &VisualConfig,
    coordinator: &RunCoordinator,
    surface: Arc<dyn Surface>,
    comparer: Arc<dyn Comparer>,
) -> Verifier {
    Verifier::new(SUITE, config, coordinator, surface, comparer)
        .await
        .expect("Failed to create verifier")
}

pub fn suite_dir(root: &Path) -> PathBuf {
    root.join("commons").join("ButtonTest")
}

pub fn role_dir(root: &Path, role: ArtifactRole) -> PathBuf {
    suite_dir(root).join(role.dir_name())
}

/// Sorted file names in a role directory
pub fn files_in(root: &Path, role: ArtifactRole) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(role_dir(root, role))
        .map(|entries| {
            entries
                .flatten()
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

pub fn write_baseline(root: &Path, file_name: &str, bytes: &[u8]) {
    let dir = role_dir(root, ArtifactRole::Baseline);
    std::fs::create_dir_all(&dir).expect("Failed to create baseline dir");
    std::fs::write(dir.join(file_name), bytes).expect("Failed to write baseline");
}
