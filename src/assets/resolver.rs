/// Asset inventory resolver
///
/// Turns a logical group (a page, a project, or "the main image of every
/// project") into the ordered list of locators that belong to it, by
/// prefix-matching the manifest. Groups are views: they are recomputed on
/// every call and never stored.

use std::collections::BTreeMap;
use std::fmt;

use super::manifest::{AssetLocator, Manifest, ManifestEntry};

/// Folder holding one sub-folder per project
const PROJECTS_DIR: &str = "projects";

/// Shown when a project has no images at all
pub const PLACEHOLDER_IMAGE: &str = "data:image/svg+xml,%3Csvg xmlns=\"http://www.w3.org/2000/svg\" width=\"800\" height=\"600\"%3E%3Crect fill=\"%23e2e8f0\" width=\"800\" height=\"600\"/%3E%3Ctext x=\"50%25\" y=\"50%25\" text-anchor=\"middle\" fill=\"%2364748b\" font-family=\"sans-serif\" font-size=\"24\"%3ENo Image Available%3C/text%3E%3C/svg%3E";

/// Logical asset group
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// Everything under `<name>/`
    Page(String),
    /// Everything under `projects/<id>/`
    Project(String),
    /// One main image per project
    CuratedMainImages,
}

impl GroupKey {
    pub fn page(name: impl Into<String>) -> Self {
        Self::Page(name.into())
    }

    /// Project folders are lower-case, so ids are matched case-insensitively
    pub fn project(id: impl Into<String>) -> Self {
        Self::Project(id.into().to_lowercase())
    }

    /// Map a site route to the group its page needs
    ///
    /// `/` is the home page, `/projects` only needs the gallery's main
    /// images, `/projects/<id>` needs the whole project folder, and any
    /// other `/<name>` loads the folder of the same name.
    pub fn for_route(route: &str) -> Self {
        let trimmed = route.trim_matches('/');
        if trimmed.is_empty() {
            return Self::page("home");
        }

        let mut parts = trimmed.splitn(2, '/');
        let first = parts.next().unwrap_or_default();
        let rest = parts.next().map(|r| r.trim_matches('/')).unwrap_or_default();

        match (first, rest) {
            (PROJECTS_DIR, "") => Self::CuratedMainImages,
            (PROJECTS_DIR, id) => Self::project(id),
            (page, _) => Self::page(page),
        }
    }

    /// The project id when this is a project detail group
    pub fn project_id(&self) -> Option<&str> {
        match self {
            Self::Project(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(name) => write!(f, "page:{}", name),
            Self::Project(id) => write!(f, "project:{}", id),
            Self::CuratedMainImages => f.write_str("curated-main-images"),
        }
    }
}

/// Resolves asset groups against an injected manifest
#[derive(Debug, Clone, Default)]
pub struct AssetInventory {
    manifest: Manifest,
}

impl AssetInventory {
    pub fn new(manifest: Manifest) -> Self {
        Self { manifest }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Resolve a group to its locators
    ///
    /// Unknown keys resolve to an empty list.
    pub fn resolve_group(&self, key: &GroupKey) -> Vec<AssetLocator> {
        match key {
            GroupKey::Page(name) => self
                .under(name)
                .map(|entry| entry.locator.clone())
                .collect(),
            GroupKey::Project(id) => {
                let mut entries: Vec<_> = self.under(&project_folder(id)).collect();
                entries.sort_by(|a, b| image_order(a).cmp(&image_order(b)));
                entries.into_iter().map(|e| e.locator.clone()).collect()
            }
            GroupKey::CuratedMainImages => self
                .by_project()
                .into_values()
                .filter_map(|entries| entries.into_iter().min_by(|a, b| image_order(a).cmp(&image_order(b))))
                .map(|entry| entry.locator.clone())
                .collect(),
        }
    }

    /// Ids of every project folder in the manifest, sorted
    pub fn project_ids(&self) -> Vec<String> {
        self.by_project().into_keys().map(str::to_string).collect()
    }

    pub fn has_project_images(&self, id: &str) -> bool {
        self.under(&project_folder(&id.to_lowercase())).next().is_some()
    }

    /// Gallery images for a project detail view
    ///
    /// Only files following the `<id>_<n>.<ext>` convention count. When a
    /// project has none, the gallery is the single placeholder image.
    pub fn project_gallery(&self, id: &str) -> Vec<AssetLocator> {
        let id = id.to_lowercase();
        let prefix = format!("{}_", id);

        let mut images: Vec<_> = self
            .under(&project_folder(&id))
            .filter(|entry| file_name(&entry.path).starts_with(&prefix))
            .collect();
        images.sort_by_key(|entry| numeric_suffix(&entry.path).unwrap_or(0));

        if images.is_empty() {
            return vec![AssetLocator::new(PLACEHOLDER_IMAGE)];
        }
        images.into_iter().map(|e| e.locator.clone()).collect()
    }

    /// First gallery image (or the placeholder)
    pub fn project_main_image(&self, id: &str) -> AssetLocator {
        self.project_gallery(id)
            .into_iter()
            .next()
            .unwrap_or_else(|| AssetLocator::new(PLACEHOLDER_IMAGE))
    }

    /// Rotating identity badge pictures from the home folder
    pub fn badge_images(&self) -> Vec<AssetLocator> {
        self.under("home")
            .filter(|entry| file_name(&entry.path).contains("badge_pic"))
            .map(|entry| entry.locator.clone())
            .collect()
    }

    /// Entries whose path lies under `folder/`
    fn under<'a>(&'a self, folder: &str) -> impl Iterator<Item = &'a ManifestEntry> + 'a {
        let prefix = format!("{}/", folder.trim_matches('/'));
        let valid = prefix.len() > 1;
        self.manifest
            .entries()
            .iter()
            .filter(move |entry| valid && entry.path.starts_with(&prefix))
    }

    /// Project entries grouped by project id
    fn by_project(&self) -> BTreeMap<&str, Vec<&ManifestEntry>> {
        let mut projects: BTreeMap<&str, Vec<&ManifestEntry>> = BTreeMap::new();
        for entry in self.under(PROJECTS_DIR) {
            let rest = &entry.path[PROJECTS_DIR.len() + 1..];
            // Files directly in projects/ belong to no project
            if let Some((id, _)) = rest.split_once('/') {
                projects.entry(id).or_default().push(entry);
            }
        }
        projects
    }
}

fn project_folder(id: &str) -> String {
    format!("{}/{}", PROJECTS_DIR, id)
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Number after the last `_` of the file stem (`atlas_12.png` -> 12)
fn numeric_suffix(path: &str) -> Option<u64> {
    let name = file_name(path);
    let stem = name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name);
    let (_, digits) = stem.rsplit_once('_')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Un-suffixed main image first, then by suffix, then by path
fn image_order(entry: &ManifestEntry) -> (Option<u64>, &str) {
    (numeric_suffix(&entry.path), entry.path.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory() -> AssetInventory {
        AssetInventory::new(Manifest::from_entries([
            ("home/logo.png", "/s/logo.png"),
            ("home/badge_pic_1.jpg", "/s/badge_pic_1.jpg"),
            ("home/badge_pic_2.jpg", "/s/badge_pic_2.jpg"),
            ("about/me.jpg", "/s/me.jpg"),
            ("aboutus/team.jpg", "/s/team.jpg"),
            ("projects/atlas/atlas_10.png", "/s/atlas_10.png"),
            ("projects/atlas/atlas_2.png", "/s/atlas_2.png"),
            ("projects/atlas/atlas.png", "/s/atlas.png"),
            ("projects/atlas/atlas_1.png", "/s/atlas_1.png"),
            ("projects/nova/nova_3.webp", "/s/nova_3.webp"),
            ("projects/nova/nova_1.webp", "/s/nova_1.webp"),
            ("projects/readme.png", "/s/readme.png"),
        ]))
    }

    fn strs(locators: &[AssetLocator]) -> Vec<&str> {
        locators.iter().map(AssetLocator::as_str).collect()
    }

    #[test]
    fn test_page_group_matches_exact_folder() {
        let inv = inventory();
        assert_eq!(strs(&inv.resolve_group(&GroupKey::page("about"))), vec!["/s/me.jpg"]);
        assert_eq!(inv.resolve_group(&GroupKey::page("home")).len(), 3);
    }

    #[test]
    fn test_project_group_sorted_by_suffix() {
        let inv = inventory();
        assert_eq!(
            strs(&inv.resolve_group(&GroupKey::project("atlas"))),
            vec!["/s/atlas.png", "/s/atlas_1.png", "/s/atlas_2.png", "/s/atlas_10.png"]
        );
    }

    #[test]
    fn test_curated_main_images() {
        let inv = inventory();
        assert_eq!(
            strs(&inv.resolve_group(&GroupKey::CuratedMainImages)),
            vec!["/s/atlas.png", "/s/nova_1.webp"]
        );
    }

    #[test]
    fn test_unknown_keys_are_empty() {
        let inv = inventory();
        assert!(inv.resolve_group(&GroupKey::page("contact")).is_empty());
        assert!(inv.resolve_group(&GroupKey::project("ghost")).is_empty());
        assert!(inv.resolve_group(&GroupKey::page("")).is_empty());
        assert!(AssetInventory::default()
            .resolve_group(&GroupKey::CuratedMainImages)
            .is_empty());
    }

    #[test]
    fn test_routes() {
        assert_eq!(GroupKey::for_route("/"), GroupKey::page("home"));
        assert_eq!(GroupKey::for_route(""), GroupKey::page("home"));
        assert_eq!(GroupKey::for_route("/about"), GroupKey::page("about"));
        assert_eq!(GroupKey::for_route("/services/"), GroupKey::page("services"));
        assert_eq!(GroupKey::for_route("/projects"), GroupKey::CuratedMainImages);
        assert_eq!(GroupKey::for_route("/projects/atlas"), GroupKey::project("atlas"));
    }

    #[test]
    fn test_project_route_ignores_case() {
        let inv = inventory();
        let key = GroupKey::for_route("/projects/Atlas");
        assert_eq!(key.project_id(), Some("atlas"));

        let group = inv.resolve_group(&key);
        assert!(!group.is_empty());
        assert_eq!(group, inv.resolve_group(&GroupKey::project("atlas")));
        for image in inv.project_gallery("Atlas") {
            assert!(group.contains(&image));
        }
    }

    #[test]
    fn test_project_gallery_and_placeholder() {
        let inv = inventory();
        assert_eq!(
            strs(&inv.project_gallery("ATLAS")),
            vec!["/s/atlas_1.png", "/s/atlas_2.png", "/s/atlas_10.png"]
        );
        assert_eq!(inv.project_main_image("nova").as_str(), "/s/nova_1.webp");

        let missing = inv.project_gallery("ghost");
        assert_eq!(missing.len(), 1);
        assert!(missing[0].is_data_uri());
        assert!(!inv.has_project_images("ghost"));
        assert!(inv.has_project_images("Nova"));
    }

    #[test]
    fn test_project_ids_and_badges() {
        let inv = inventory();
        assert_eq!(inv.project_ids(), vec!["atlas", "nova"]);
        assert_eq!(
            strs(&inv.badge_images()),
            vec!["/s/badge_pic_1.jpg", "/s/badge_pic_2.jpg"]
        );
    }

    #[test]
    fn test_numeric_suffix() {
        assert_eq!(numeric_suffix("projects/a/a_12.png"), Some(12));
        assert_eq!(numeric_suffix("projects/a/a.png"), None);
        assert_eq!(numeric_suffix("projects/a/a_main.png"), None);
    }
}
