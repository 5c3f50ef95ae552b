/// Project records and category filtering
///
/// Project records are static data read once at startup. The projects page
/// shows the subset whose category is toggled on; the toggles themselves
/// (`CategorySelection`) belong to the caller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::assets::resolver::AssetInventory;
use crate::error::ProjectError;

/// A single portfolio project
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct ProjectRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub tech: Vec<String>,
    pub problem: String,
    pub solution: String,
    pub outcome: String,
    pub category: String,
    pub github: String,
    pub demo: String,
    /// Main image locator
    pub image: String,
    /// Gallery locators
    pub images: Vec<String>,
}

/// Display data for a known category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub color: &'static str,
    pub gradient: &'static str,
}

/// Every category a project may use
pub const CATEGORIES: [Category; 7] = [
    Category {
        name: "AI & Telecom",
        color: "cyan",
        gradient: "from-cyan-500 to-blue-600",
    },
    Category {
        name: "AI & NLP",
        color: "purple",
        gradient: "from-purple-500 to-pink-600",
    },
    Category {
        name: "AI & Healthcare",
        color: "green",
        gradient: "from-green-500 to-teal-600",
    },
    Category {
        name: "Web & FinTech",
        color: "orange",
        gradient: "from-orange-500 to-red-600",
    },
    Category {
        name: "Data & AI",
        color: "blue",
        gradient: "from-blue-500 to-indigo-600",
    },
    Category {
        name: "Web & Education",
        color: "violet",
        gradient: "from-violet-500 to-purple-600",
    },
    Category {
        name: "Mobile Apps",
        color: "pink",
        gradient: "from-pink-500 to-rose-600",
    },
];

/// Look up a category by name
pub fn category(name: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.name == name)
}

/// Read project records from a JSON array
pub fn load_projects(path: &Path) -> Result<Vec<ProjectRecord>, ProjectError> {
    let text = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<ProjectRecord> =
        serde_json::from_str(&text).map_err(|source| ProjectError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    for record in invalid_categories(&records) {
        tracing::warn!(
            "❌ Project \"{}\" has invalid category: \"{}\"",
            record.id,
            record.category
        );
    }
    tracing::info!("📦 Loaded {} projects", records.len());

    Ok(records)
}

/// Records whose category is not in the catalog
pub fn invalid_categories(records: &[ProjectRecord]) -> Vec<&ProjectRecord> {
    records
        .iter()
        .filter(|r| category(&r.category).is_none())
        .collect()
}

/// Distinct categories used by `records`
pub fn all_categories(records: &[ProjectRecord]) -> BTreeSet<String> {
    records.iter().map(|r| r.category.clone()).collect()
}

/// Copies of `records` with `image`/`images` taken from the asset tree
///
/// Projects without images get the placeholder.
pub fn with_images(records: &[ProjectRecord], inventory: &AssetInventory) -> Vec<ProjectRecord> {
    records
        .iter()
        .map(|record| {
            let images: Vec<String> = inventory
                .project_gallery(&record.id)
                .into_iter()
                .map(|l| l.as_str().to_string())
                .collect();
            if !inventory.has_project_images(&record.id) {
                tracing::warn!("⚠️  Project \"{}\" has no images", record.id);
            }
            ProjectRecord {
                image: images.first().cloned().unwrap_or_default(),
                images,
                ..record.clone()
            }
        })
        .collect()
}

/// Categories currently toggled on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySelection {
    selected: BTreeSet<String>,
}

impl CategorySelection {
    /// Nothing selected
    pub fn none() -> Self {
        Self::default()
    }

    /// Every category present in `records`
    pub fn all(records: &[ProjectRecord]) -> Self {
        Self {
            selected: all_categories(records),
        }
    }

    /// Flip one category; returns whether it is now selected
    pub fn toggle(&mut self, name: &str) -> bool {
        if self.selected.remove(name) {
            false
        } else {
            self.selected.insert(name.to_string());
            true
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.selected.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for CategorySelection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            selected: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Records whose category is selected, in their original order
///
/// An empty selection selects nothing.
pub fn filter_by_category<'a>(
    records: &'a [ProjectRecord],
    selected: &CategorySelection,
) -> Vec<&'a ProjectRecord> {
    records
        .iter()
        .filter(|r| selected.contains(&r.category))
        .collect()
}
