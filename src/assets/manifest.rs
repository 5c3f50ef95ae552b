/// Asset manifest
///
/// The manifest is the static table of every image the site ships:
/// `(relative path, locator)` pairs where the relative path is rooted at the
/// assets directory (`home/logo.png`, `projects/atlas/atlas_2.png`) and the
/// locator is what gets handed to the loader.
///
/// It is produced once by walking the asset tree (or read back from a
/// generated JSON file) and never changes while the process runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::AssetError;

/// Image extensions picked up by discovery
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "svg", "webp"];

/// Opaque reference to a loadable image (file path, URL or `data:` URI)
///
/// Two locators are equal only if they are byte-identical.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct AssetLocator(String);

impl AssetLocator {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Inline `data:` URIs need no fetch at all
    pub fn is_data_uri(&self) -> bool {
        self.0.starts_with("data:")
    }
}

impl fmt::Display for AssetLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetLocator {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AssetLocator {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One manifest row
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Path relative to the assets root, `/`-separated
    pub path: String,
    pub locator: AssetLocator,
}

/// Static table of every available asset
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Build a manifest from an injected table
    pub fn from_entries<I, P, L>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, L)>,
        P: Into<String>,
        L: Into<AssetLocator>,
    {
        let entries = entries
            .into_iter()
            .map(|(path, locator)| ManifestEntry {
                path: normalize(&path.into()),
                locator: locator.into(),
            })
            .collect();
        Self { entries }
    }

    /// Walk `root` and record every image file below it
    ///
    /// Entries are sorted by relative path so two walks of the same tree
    /// always produce the same manifest. Unreadable entries are skipped.
    pub fn discover(root: &Path) -> Self {
        let base = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

        let mut entries = Vec::new();
        for entry in WalkDir::new(&base).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("⚠️  Skipping unreadable asset entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();

            // Only process files (not directories)
            if !entry.file_type().is_file() {
                continue;
            }

            // Check if this is an image by extension
            let is_image = path
                .extension()
                .map(|ext| {
                    let ext = ext.to_string_lossy().to_lowercase();
                    IMAGE_EXTENSIONS.contains(&ext.as_str())
                })
                .unwrap_or(false);
            if !is_image {
                continue;
            }

            let Ok(relative) = path.strip_prefix(&base) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            entries.push(ManifestEntry {
                path: relative,
                locator: AssetLocator::new(path.to_string_lossy()),
            });
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));

        tracing::info!("🔍 Discovered {} assets under {}", entries.len(), base.display());
        Self { entries }
    }

    /// Read a previously generated manifest
    pub fn load_json(path: &Path) -> Result<Self, AssetError> {
        let text = std::fs::read_to_string(path).map_err(|e| AssetError::io(path, e))?;
        serde_json::from_str(&text).map_err(|source| AssetError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the manifest as pretty JSON
    pub fn save_json(&self, path: &Path) -> Result<(), AssetError> {
        let text = serde_json::to_string_pretty(self).map_err(|source| AssetError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, text).map_err(|e| AssetError::io(path, e))
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Strip leading `./` and `/` and turn backslashes into slashes
fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut path = path.as_str();
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest;
        } else if let Some(rest) = path.strip_prefix('/') {
            path = rest;
        } else {
            break;
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_data_uri_detection() {
        assert!(AssetLocator::new("data:image/svg+xml,%3Csvg%3E").is_data_uri());
        assert!(!AssetLocator::new("/assets/home/logo.png").is_data_uri());
    }

    #[test]
    fn test_from_entries_normalizes_paths() {
        let manifest = Manifest::from_entries([
            ("./home/logo.png", "/static/logo.png"),
            ("/about/me.jpg", "/static/me.jpg"),
        ]);

        let paths: Vec<_> = manifest.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["home/logo.png", "about/me.jpg"]);
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("home")).unwrap();
        fs::create_dir_all(root.join("projects/atlas")).unwrap();
        fs::write(root.join("projects/atlas/atlas_2.png"), b"x").unwrap();
        fs::write(root.join("projects/atlas/atlas_1.PNG"), b"x").unwrap();
        fs::write(root.join("home/logo.svg"), b"x").unwrap();
        fs::write(root.join("home/notes.txt"), b"x").unwrap();

        let manifest = Manifest::discover(root);
        let paths: Vec<_> = manifest.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["home/logo.svg", "projects/atlas/atlas_1.PNG", "projects/atlas/atlas_2.png"]
        );

        // Locators point at real files
        for entry in manifest.entries() {
            assert!(Path::new(entry.locator.as_str()).is_file());
        }

        // Same tree, same manifest
        assert_eq!(manifest, Manifest::discover(root));
    }

    #[test]
    fn test_discover_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = Manifest::discover(&dir.path().join("nope"));
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_json_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let manifest = Manifest::from_entries([("home/logo.png", "/static/logo.png")]);

        manifest.save_json(&path).unwrap();
        assert_eq!(Manifest::load_json(&path).unwrap(), manifest);

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Manifest::load_json(&path), Err(AssetError::Json { .. })));
    }
}
