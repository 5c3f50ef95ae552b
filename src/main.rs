use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use portfolio_assets::assets::{
    AssetInventory, FileImageLoader, GroupKey, Manifest, Navigator, NavigatorOptions, Preloader,
    SharedLoadCache,
};
use portfolio_assets::state::projects::{self, CategorySelection};
use portfolio_assets::state::{BadgeRotationScheduler, SqliteSessionStore, SystemClock};
use portfolio_assets::Config;

#[derive(Parser)]
#[command(name = "portfolio-assets")]
#[command(about = "Asset preloading and badge rotation for the portfolio site")]
struct Cli {
    /// Config file (default: ~/.config/portfolio-assets/config.toml)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the assets root and print (or write) the manifest
    Manifest {
        /// Write the manifest as JSON instead of printing it
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Show the asset group each route resolves to
    Groups {
        #[arg(required = true)]
        routes: Vec<String>,
    },
    /// Visit routes in order, preloading each one's assets
    Preload {
        #[arg(required = true)]
        routes: Vec<String>,
    },
    /// List projects, optionally filtered by category
    Projects {
        /// Category to include (repeatable; all when omitted)
        #[arg(long = "category", short = 'g')]
        categories: Vec<String>,
    },
    /// Show where the badge rotation resumes
    Badge,
}

/// Main application state
struct App {
    config: Config,
    /// Asset groups resolved against the manifest
    inventory: AssetInventory,
    /// Process-wide cache of settled assets
    cache: SharedLoadCache,
}

impl App {
    /// Load configuration-dependent state
    fn new(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let manifest = match &config.manifest {
            Some(path) => Manifest::load_json(path)?,
            None => Manifest::discover(&config.assets_root),
        };

        tracing::info!("🎨 Portfolio assets initialized with {} images", manifest.len());

        Ok(App {
            inventory: AssetInventory::new(manifest),
            cache: SharedLoadCache::new(),
            config,
        })
    }

    fn preloader(&self) -> Preloader {
        let loader = FileImageLoader::with_base(&self.config.assets_root);
        Preloader::new(self.cache.clone(), Arc::new(loader))
    }

    fn session_store(&self) -> Result<Arc<SqliteSessionStore>, Box<dyn std::error::Error>> {
        let store = match self.config.session_path() {
            Some(path) => SqliteSessionStore::open(&path, "cli")?,
            None => SqliteSessionStore::in_memory()?,
        };
        Ok(Arc::new(store))
    }

    async fn run(self, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
        match command {
            Commands::Manifest { out } => {
                let manifest = self.inventory.manifest();
                match out {
                    Some(path) => {
                        manifest.save_json(&path)?;
                        println!("Manifest with {} assets written to: {}", manifest.len(), path.display());
                    }
                    None => {
                        for entry in manifest.entries() {
                            println!("{}\t{}", entry.path, entry.locator);
                        }
                    }
                }
            }
            Commands::Groups { routes } => {
                for route in routes {
                    let key = GroupKey::for_route(&route);
                    let assets = self.inventory.resolve_group(&key);
                    println!("{} -> {} ({} assets)", route, key, assets.len());
                    for locator in assets {
                        println!("  - {}", locator);
                    }
                }
            }
            Commands::Preload { routes } => {
                let options = NavigatorOptions {
                    minimum_visible: self.config.minimum_visible(),
                };
                let mut navigator = Navigator::new(self.inventory.clone(), self.preloader(), options);

                for route in routes {
                    let label = route.clone();
                    let pass = navigator.visit_with(&route, move |options| {
                        options.on_progress(move |percentage| {
                            println!("⏳ {}: {}%", label, percentage);
                        })
                    });
                    let report = pass.finished().await?;

                    println!(
                        "✅ {}: {} assets, {} fetched, {} failed",
                        route,
                        report.progress.total_count,
                        report.dispatched,
                        report.errors.len()
                    );
                    for locator in &report.errors {
                        println!("  ⚠️  {}", locator);
                    }
                }

                println!("📊 {} assets cached", self.cache.len());
            }
            Commands::Projects { categories } => {
                let records = projects::load_projects(&self.config.projects)?;
                let records = projects::with_images(&records, &self.inventory);

                let selection = if categories.is_empty() {
                    CategorySelection::all(&records)
                } else {
                    categories.into_iter().collect()
                };
                println!("Categories: {}", selection.iter().collect::<Vec<_>>().join(", "));

                for record in projects::filter_by_category(&records, &selection) {
                    println!("{} [{}] {}", record.id, record.category, record.title);
                    println!("  image: {} ({} in gallery)", record.image, record.images.len());
                }
            }
            Commands::Badge => {
                let images = self.inventory.badge_images();
                let store = self.session_store()?;
                println!("Session: {}", store.session_id());
                let scheduler = BadgeRotationScheduler::new(store, Arc::new(SystemClock));

                let mut handle = scheduler.start(images.len(), self.config.badge_interval());
                match handle.current(&images) {
                    Some(image) => println!("Badge {} of {}: {}", handle.current_index() + 1, images.len(), image),
                    None => println!("No badge images found"),
                }
                match handle.next_tick_in() {
                    Some(delay) => println!("Next rotation in {:.1}s", delay.as_secs_f64()),
                    None => println!("Rotation is not scheduled"),
                }
                handle.dispose();
            }
        }

        Ok(())
    }
}

/// Install the tracing subscriber (RUST_LOG, default `info`)
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.config.as_deref())?;
    init_tracing(config.log_json);

    let app = App::new(config)?;
    app.run(cli.command).await
}
