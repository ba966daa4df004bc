use std::sync::Arc;

use propel_core::applications::ApplicationService;
use propel_core::lifecycle::{LifecycleConfig, LifecycleOrchestrator};
use propel_core::resources::ResourceOrchestrator;
use propel_core::storage::LocalFileStore;
use propel_core::team::TeamService;
use propel_db::PgStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; every service sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: propel_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    pub applications: Arc<ApplicationService<PgStore>>,
    pub lifecycle: Arc<LifecycleOrchestrator<PgStore>>,
    pub team: Arc<TeamService<PgStore>>,
    pub resources: Arc<ResourceOrchestrator<PgStore, LocalFileStore>>,
}

impl AppState {
    /// Wire the domain services over one Postgres store and the local file store.
    pub fn new(pool: propel_db::DbPool, config: ServerConfig) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));
        let files = Arc::new(LocalFileStore::new(config.storage_root.clone()));
        let lifecycle_config = LifecycleConfig {
            deadline_margin_days: config.deadline_margin_days,
        };

        Self {
            pool,
            applications: Arc::new(ApplicationService::new(Arc::clone(&store))),
            lifecycle: Arc::new(LifecycleOrchestrator::new(
                Arc::clone(&store),
                lifecycle_config,
            )),
            team: Arc::new(TeamService::new(Arc::clone(&store))),
            resources: Arc::new(ResourceOrchestrator::new(store, files)),
            config: Arc::new(config),
        }
    }
}
