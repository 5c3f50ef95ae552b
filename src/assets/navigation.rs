/// Route-driven preloading
///
/// The page router calls `visit` once per route change. Each visit preloads
/// the route's asset group against the shared cache, so revisiting a page
/// is served from the cache. Project detail views are the exception: when
/// the user leaves one, that project's assets are dropped from the cache so
/// browsing many large projects does not keep every gallery alive.

use std::time::Duration;

use super::preload::{PreloadOptions, PreloadPass, Preloader};
use super::resolver::{AssetInventory, GroupKey};

/// Knobs for route visits
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigatorOptions {
    /// Minimum loading-screen time per visit
    pub minimum_visible: Duration,
}

#[derive(Debug)]
pub struct Navigator {
    inventory: AssetInventory,
    preloader: Preloader,
    options: NavigatorOptions,
    current: Option<GroupKey>,
}

impl Navigator {
    pub fn new(inventory: AssetInventory, preloader: Preloader, options: NavigatorOptions) -> Self {
        Self {
            inventory,
            preloader,
            options,
            current: None,
        }
    }

    /// Group of the route being shown
    pub fn current(&self) -> Option<&GroupKey> {
        self.current.as_ref()
    }

    pub fn inventory(&self) -> &AssetInventory {
        &self.inventory
    }

    pub fn preloader(&self) -> &Preloader {
        &self.preloader
    }

    /// Switch to `route` and start preloading what it needs
    pub fn visit(&mut self, route: &str) -> PreloadPass {
        self.visit_with(route, |options| options)
    }

    /// Like `visit`, letting the caller attach a progress callback
    pub fn visit_with(
        &mut self,
        route: &str,
        configure: impl FnOnce(PreloadOptions) -> PreloadOptions,
    ) -> PreloadPass {
        let next = GroupKey::for_route(route);

        // Leaving a project detail view drops that project's assets
        if let Some(previous) = self.current.take() {
            if let Some(id) = previous.project_id() {
                if previous != next {
                    let assets = self.inventory.resolve_group(&previous);
                    tracing::info!("🧹 Leaving project {}, clearing {} cached assets", id, assets.len());
                    self.preloader.cache().clear_group(&assets);
                }
            }
        }

        let assets = self.inventory.resolve_group(&next);
        tracing::info!("🧭 Visiting {} ({}): {} assets", route, next, assets.len());

        let options = configure(PreloadOptions::new().minimum_visible(self.options.minimum_visible));
        let pass = self.preloader.preload(assets, options);
        self.current = Some(next);
        pass
    }
}
