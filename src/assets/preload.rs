/// Preload tracker
///
/// Drives the load primitive over a list of locators and aggregates the
/// settlements into a progress percentage. A pass:
/// 1. Counts cached locators (and inline `data:` URIs) as settled at once
/// 2. Dispatches every other locator concurrently, with no cap
/// 3. Caches each locator as it settles, whether it loaded or failed
/// 4. Holds completion back until the minimum visible duration has passed
///
/// Failed loads never stop a pass; they are collected in `errors`.

use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::cache::SharedLoadCache;
use super::loader::{self, ImageLoader};
use super::manifest::AssetLocator;
use crate::error::AssetError;

/// Called with the new percentage every time an asset settles
pub type ProgressCallback = Box<dyn FnMut(u8) + Send + 'static>;

/// Progress of one preload pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreloadProgress {
    pub loaded_count: usize,
    pub total_count: usize,
    /// `round(100 * loaded / total)`, or 100 when there is nothing to load
    pub percentage: u8,
}

impl PreloadProgress {
    pub fn new(loaded_count: usize, total_count: usize) -> Self {
        let percentage = if total_count == 0 {
            100
        } else {
            // Round half up, in integers
            ((loaded_count.min(total_count) * 200 + total_count) / (total_count * 2)) as u8
        };
        Self {
            loaded_count,
            total_count,
            percentage,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.loaded_count >= self.total_count
    }
}

/// Options for a single pass
#[derive(Default)]
pub struct PreloadOptions {
    /// Completion never arrives earlier than this after the call
    pub minimum_visible: Duration,
    pub on_progress: Option<ProgressCallback>,
}

impl PreloadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn minimum_visible(mut self, duration: Duration) -> Self {
        self.minimum_visible = duration;
        self
    }

    pub fn on_progress(mut self, callback: impl FnMut(u8) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for PreloadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreloadOptions")
            .field("minimum_visible", &self.minimum_visible)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Final state of a finished pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadReport {
    pub progress: PreloadProgress,
    /// Locators whose load failed, in settlement order
    pub errors: Vec<AssetLocator>,
    /// Number of loads actually handed to the loader
    pub dispatched: usize,
}

/// Handle to a running pass
///
/// Dropping the handle does not cancel anything: in-flight loads still
/// complete and warm the cache.
pub struct PreloadPass {
    progress: watch::Receiver<PreloadProgress>,
    errors: Arc<Mutex<Vec<AssetLocator>>>,
    task: JoinHandle<PreloadReport>,
}

impl PreloadPass {
    /// Current progress snapshot
    pub fn progress(&self) -> PreloadProgress {
        *self.progress.borrow()
    }

    /// Locators that have failed so far
    pub fn errors(&self) -> Vec<AssetLocator> {
        self.errors.lock().clone()
    }

    /// Watch progress updates
    pub fn subscribe(&self) -> watch::Receiver<PreloadProgress> {
        self.progress.clone()
    }

    /// Wait for every asset to settle and the minimum duration to pass
    pub async fn finished(self) -> Result<PreloadReport, AssetError> {
        Ok(self.task.await?)
    }
}

impl fmt::Debug for PreloadPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreloadPass")
            .field("progress", &self.progress())
            .finish()
    }
}

/// Runs preload passes against one shared cache
#[derive(Clone)]
pub struct Preloader {
    cache: SharedLoadCache,
    loader: Arc<dyn ImageLoader>,
}

impl Preloader {
    pub fn new(cache: SharedLoadCache, loader: Arc<dyn ImageLoader>) -> Self {
        Self { cache, loader }
    }

    pub fn cache(&self) -> &SharedLoadCache {
        &self.cache
    }

    /// Start a pass over `locators`
    ///
    /// Already-settled locators are counted (and reported through
    /// `on_progress`) before this returns; the rest load on a spawned task,
    /// so this must be called from inside a tokio runtime.
    pub fn preload(&self, locators: Vec<AssetLocator>, options: PreloadOptions) -> PreloadPass {
        let started = Instant::now();
        let PreloadOptions {
            minimum_visible,
            mut on_progress,
        } = options;

        let total = locators.len();
        let (tx, rx) = watch::channel(PreloadProgress::new(0, total));
        let errors = Arc::new(Mutex::new(Vec::new()));

        // Empty work is not loading: report 100% and finish right away
        if total == 0 {
            if let Some(callback) = on_progress.as_mut() {
                callback(100);
            }
            let task = tokio::spawn(async move {
                PreloadReport {
                    progress: PreloadProgress::new(0, 0),
                    errors: Vec::new(),
                    dispatched: 0,
                }
            });
            return PreloadPass {
                progress: rx,
                errors,
                task,
            };
        }

        // Partition into settled-already and still-to-load
        let mut loaded = 0;
        let mut pending = Vec::new();
        for locator in locators {
            if locator.is_data_uri() || self.cache.has(&locator) {
                loaded += 1;
                let progress = PreloadProgress::new(loaded, total);
                tx.send_replace(progress);
                if let Some(callback) = on_progress.as_mut() {
                    callback(progress.percentage);
                }
            } else {
                pending.push(locator);
            }
        }

        let dispatched = pending.len();
        tracing::debug!(
            "⏳ Preloading {} assets ({} already cached)",
            dispatched,
            total - dispatched
        );

        let cache = self.cache.clone();
        let loader = self.loader.clone();
        let task_errors = errors.clone();

        let task = tokio::spawn(async move {
            let mut in_flight: FuturesUnordered<_> = pending
                .into_iter()
                .map(|locator| {
                    let loader = loader.clone();
                    async move {
                        let outcome = loader::load(loader.as_ref(), &locator).await;
                        (locator, outcome)
                    }
                })
                .collect();

            while let Some((locator, outcome)) = in_flight.next().await {
                // Failed assets are cached too so they are not retried
                cache.mark_loaded(locator.clone());
                loaded += 1;

                if outcome.is_loaded() {
                    tracing::debug!("📸 Loaded {}", locator);
                } else {
                    tracing::warn!("⚠️  Failed to load image: {}", locator);
                    task_errors.lock().push(locator);
                }

                let progress = PreloadProgress::new(loaded, total);
                tx.send_replace(progress);
                if let Some(callback) = on_progress.as_mut() {
                    callback(progress.percentage);
                }
            }

            // Keep the loading indicator up long enough to be seen; a pass
            // served entirely from the cache shows no indicator at all
            if dispatched > 0 {
                tokio::time::sleep_until(started + minimum_visible).await;
            }

            let errors = task_errors.lock().clone();
            tracing::info!(
                "✅ Preload complete: {} assets, {} fetched, {} failed",
                total,
                dispatched,
                errors.len()
            );

            PreloadReport {
                progress: PreloadProgress::new(loaded, total),
                errors,
                dispatched,
            }
        });

        PreloadPass {
            progress: rx,
            errors,
            task,
        }
    }
}

impl fmt::Debug for Preloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preloader")
            .field("cached", &self.cache.len())
            .finish()
    }
}
