//! Service runtime
//!
//! [`ServerHandle`] owns the full lifecycle: database and migrations,
//! first-start seeding, services, the expiry sweep, the REST API and
//! graceful shutdown.

use std::sync::{Arc, OnceLock};

use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use crate::application::services::{
    CustomerService, DashboardService, ExpiryMonitor, MonitorConfig, OrderWorkflow, ResourcePool,
    SessionManager,
};
use crate::config::{AppConfig, VenueSection};
use crate::domain::catalog::{ItemExtra, ItemTakeout, MenuCategory, MenuItem};
use crate::domain::pc::Pc;
use crate::domain::pricing::BillingCalculator;
use crate::domain::{DomainResult, RepositoryProvider};
use crate::interfaces::http::{create_api_router, ApiContext};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};
use crate::{create_event_bus, init_database, SeaOrmRepositoryProvider, SharedEventBus};

// ── Options ────────────────────────────────────────────────────────

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true)
    pub auto_migrate: bool,
    /// Create PCs and the starter menu when the tables are empty (default: true)
    pub seed: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            seed: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running lounge service.
///
/// ```rust,no_run
/// use gaming_lounge::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub event_bus: SharedEventBus,
    pub repos: Arc<dyn RepositoryProvider>,
    pub sessions: Arc<SessionManager>,
    pub config: AppConfig,
    pub api_port: u16,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!("Starting gaming lounge service...");

        // The global recorder can be installed once per process; a restart
        // within the same process reuses it.
        static PROM_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> =
            OnceLock::new();
        let prometheus = match PROM_HANDLE.get() {
            Some(handle) => handle.clone(),
            None => {
                let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
                    .install_recorder()?;
                info!("📊 Prometheus metrics recorder installed");
                PROM_HANDLE.get_or_init(|| handle).clone()
            }
        };

        // ── Database ───────────────────────────────────────────
        let db = init_database(&app_cfg.database_config()).await?;
        if opts.auto_migrate {
            crate::infrastructure::run_migrations(&db).await?;
        }

        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(db.clone()));

        if opts.seed {
            seed_venue(repos.as_ref(), &app_cfg.venue).await?;
        }

        // ── Services ───────────────────────────────────────────
        let event_bus = create_event_bus();
        info!("🔔 Event bus initialized");

        let billing = BillingCalculator::new(app_cfg.pricing_table())?;
        info!(
            currency = billing.currency(),
            tiers = billing.table().tiers.len(),
            "Billing configured"
        );

        let pool = Arc::new(ResourcePool::new(repos.clone(), event_bus.clone()));
        let sessions = Arc::new(SessionManager::new(
            repos.clone(),
            pool.clone(),
            billing,
            event_bus.clone(),
        ));
        let monitor = Arc::new(
            ExpiryMonitor::new(sessions.clone(), event_bus.clone()).with_config(MonitorConfig {
                tick_interval_secs: app_cfg.monitor.tick_interval_secs,
                warning_thresholds_secs: app_cfg.monitor.warning_thresholds_secs.clone(),
            }),
        );
        let orders = Arc::new(OrderWorkflow::new(repos.clone(), event_bus.clone()));

        // ── Shutdown coordinator & background tasks ────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        monitor.start(shutdown_signal.clone());

        // ── REST API ───────────────────────────────────────────
        let router = create_api_router(ApiContext {
            db: db.clone(),
            event_bus: event_bus.clone(),
            pool,
            customers: Arc::new(CustomerService::new(repos.clone())),
            sessions: sessions.clone(),
            monitor,
            orders,
            dashboard: Arc::new(DashboardService::new(repos.clone())),
            prometheus,
        });

        let api_addr = app_cfg.api_address();
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        let api_port = listener.local_addr()?.port();
        info!("REST API listening on http://{}", api_addr);

        let api_shutdown = shutdown_signal.clone();
        let api_server = axum::serve(listener, router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("🛑 REST API received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        info!("🚀 Gaming lounge service started");

        Ok(Self {
            event_bus,
            repos,
            sessions,
            config: app_cfg,
            api_port,
            db,
            shutdown,
            api_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install SIGTERM/SIGINT listeners that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait until the API has stopped, then close the pool.
    pub async fn wait(self) {
        let timeout = self.shutdown.grace();
        let mut api_task = self.api_task;

        tokio::select! {
            result = &mut api_task => match result {
                Ok(()) => info!("REST API server stopped"),
                Err(e) => error!("REST API server task panicked: {}", e),
            },
            _ = async {
                self.shutdown.signal().wait().await;
                tokio::time::sleep(timeout).await;
            } => {
                warn!("Shutdown timeout of {}s elapsed, aborting API server", timeout.as_secs());
                api_task.abort();
            }
        }

        if let Err(e) = self.db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("✅ Database connection closed");
        }

        info!("👋 Gaming lounge service shutdown complete");
    }

    pub async fn shutdown(self) {
        info!("🛑 Shutting down gaming lounge service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

// ── Seeding ────────────────────────────────────────────────────────

/// Extra name and price in cents
type SeedExtra = (&'static str, i64);

struct SeedItem {
    name: &'static str,
    description: &'static str,
    price: i64,
    category: MenuCategory,
    extras: &'static [SeedExtra],
    takeouts: &'static [&'static str],
}

const fn item(
    name: &'static str,
    description: &'static str,
    price: i64,
    category: MenuCategory,
) -> SeedItem {
    SeedItem {
        name,
        description,
        price,
        category,
        extras: &[],
        takeouts: &[],
    }
}

const STARTER_MENU: &[SeedItem] = &[
    SeedItem {
        extras: &[("Extra cheese", 50), ("Bacon", 100)],
        takeouts: &["No onions", "No pickles"],
        ..item("Burger", "Classic beef burger with cheese", 599, MenuCategory::Food)
    },
    SeedItem {
        extras: &[("Extra pepperoni", 150)],
        takeouts: &["No olives"],
        ..item("Pizza", "Pepperoni pizza", 899, MenuCategory::Food)
    },
    item("Fries", "Crispy french fries", 299, MenuCategory::Food),
    SeedItem {
        takeouts: &["No mayo"],
        ..item("Sandwich", "Chicken sandwich", 499, MenuCategory::Food)
    },
    item("Cola", "Cold cola drink", 199, MenuCategory::Drink),
    item("Water", "Mineral water", 99, MenuCategory::Drink),
    SeedItem {
        extras: &[("Extra shot", 75)],
        takeouts: &["No sugar"],
        ..item("Coffee", "Hot coffee", 299, MenuCategory::Drink)
    },
    item("Energy Drink", "Energy drink", 399, MenuCategory::Drink),
    item("Gaming Mouse", "High precision gaming mouse", 599, MenuCategory::Accessory),
    item("Gaming Headset", "Noise cancelling headset", 799, MenuCategory::Accessory),
    item("Controller", "Game controller", 699, MenuCategory::Accessory),
    item("Massage", "15 minute shoulder massage", 999, MenuCategory::Service),
    item("Tech Support", "Technical assistance", 499, MenuCategory::Service),
];

/// Create PCs `1..=pc_count` and the starter menu, each only when its
/// table is empty.
pub async fn seed_venue(repos: &dyn RepositoryProvider, venue: &VenueSection) -> DomainResult<()> {
    if repos.pcs().count().await? == 0 && venue.pc_count > 0 {
        let specs = Some(venue.pc_specs.clone()).filter(|s| !s.trim().is_empty());
        for number in 1..=venue.pc_count as i32 {
            repos.pcs().save(Pc::new(number, specs.clone())).await?;
        }
        info!(count = venue.pc_count, "Seeded PCs");
    }

    if venue.seed_sample_menu && repos.catalog().count_items().await? == 0 {
        let catalog = repos.catalog();
        for seed in STARTER_MENU {
            let saved = catalog
                .save_item(
                    MenuItem::new(seed.name, seed.category, seed.price)
                        .with_description(seed.description),
                )
                .await?;
            for (name, price) in seed.extras {
                catalog
                    .save_extra(ItemExtra::new(saved.id, *name, *price))
                    .await?;
            }
            for name in seed.takeouts {
                catalog.save_takeout(ItemTakeout::new(saved.id, *name)).await?;
            }
        }
        info!(count = STARTER_MENU.len(), "Seeded starter menu");
    }
    Ok(())
}

// ── Tracing ────────────────────────────────────────────────────────

/// Initialize tracing from the application config. Call once at startup.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
