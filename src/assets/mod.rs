/// Image asset loading module
///
/// This module handles:
/// - Discovering the asset manifest (manifest.rs)
/// - Resolving page and project asset groups (resolver.rs)
/// - Loading single images that always settle (loader.rs)
/// - The process-wide cache of settled assets (cache.rs)
/// - Progress-tracked preload passes (preload.rs)
/// - Route changes and scoped cache clearing (navigation.rs)

pub mod manifest;
pub mod resolver;
pub mod loader;
pub mod cache;
pub mod preload;
pub mod navigation;

pub use cache::SharedLoadCache;
pub use loader::{FileImageLoader, ImageLoader, Outcome};
pub use manifest::{AssetLocator, Manifest};
pub use navigation::{Navigator, NavigatorOptions};
pub use preload::{PreloadOptions, PreloadPass, PreloadProgress, PreloadReport, Preloader};
pub use resolver::{AssetInventory, GroupKey};
