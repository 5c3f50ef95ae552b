/// Image load primitive
///
/// A load always settles: success and failure both come back as an
/// `Outcome`, so code aggregating many loads never handles errors per item.
/// The actual fetch/decode is behind the `ImageLoader` trait; the site uses
/// `FileImageLoader`, tests inject their own.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::task;

use super::manifest::AssetLocator;

/// How a single load settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Loaded,
    Failed,
}

impl Outcome {
    pub fn is_loaded(self) -> bool {
        self == Outcome::Loaded
    }
}

/// Fetches and decodes one image
///
/// Implementations must not panic on bad input: every failure is reported
/// as `Outcome::Failed`.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn fetch(&self, locator: &AssetLocator) -> Outcome;
}

/// Load one locator
///
/// `data:` URIs are already in memory and are never handed to the loader.
pub async fn load(loader: &dyn ImageLoader, locator: &AssetLocator) -> Outcome {
    if locator.is_data_uri() {
        return Outcome::Loaded;
    }
    loader.fetch(locator).await
}

/// Loads images from the local filesystem
///
/// Locators are file paths, absolute or relative to `base`. Raster images
/// are fully decoded so a corrupt file settles as `Failed`; SVG files only
/// have to be readable.
#[derive(Debug, Clone, Default)]
pub struct FileImageLoader {
    base: Option<PathBuf>,
}

impl FileImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative locators against `base`
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }

    fn resolve(&self, locator: &AssetLocator) -> PathBuf {
        let path = Path::new(locator.as_str());
        match &self.base {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[async_trait]
impl ImageLoader for FileImageLoader {
    async fn fetch(&self, locator: &AssetLocator) -> Outcome {
        let path = self.resolve(locator);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("⚠️  Failed to read image {}: {}", path.display(), e);
                return Outcome::Failed;
            }
        };

        if is_svg(&path) {
            return Outcome::Loaded;
        }

        // Spawn blocking because decoding is CPU-intensive
        let decoded = task::spawn_blocking(move || image::load_from_memory(&bytes).map(|_| ())).await;

        match decoded {
            Ok(Ok(())) => Outcome::Loaded,
            Ok(Err(e)) => {
                tracing::warn!("⚠️  Failed to decode image {}: {}", path.display(), e);
                Outcome::Failed
            }
            Err(e) => {
                tracing::warn!("⚠️  Decode task join error for {}: {}", path.display(), e);
                Outcome::Failed
            }
        }
    }
}

fn is_svg(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("svg"))
        .unwrap_or(false)
}
