//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use tavola_core::RestaurantId;

use crate::config::ServerConfig;
use crate::models::restaurant::MenuItem;

/// How long a cached menu stays fresh. Menus change rarely; sixty seconds
/// keeps the read path off the database without making edits feel stale.
const MENU_CACHE_TTL: Duration = Duration::from_secs(60);

const MENU_CACHE_CAPACITY: u64 = 1_000;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; provides access to shared resources like
/// the database pool, configuration, and the menu cache.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    menu_cache: Cache<RestaurantId, Arc<Vec<MenuItem>>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool) -> Self {
        let menu_cache = Cache::builder()
            .max_capacity(MENU_CACHE_CAPACITY)
            .time_to_live(MENU_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                menu_cache,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the per-restaurant menu cache.
    #[must_use]
    pub fn menu_cache(&self) -> &Cache<RestaurantId, Arc<Vec<MenuItem>>> {
        &self.inner.menu_cache
    }

    /// Drop the cached menu for a restaurant after a menu mutation.
    pub async fn invalidate_menu(&self, restaurant_id: RestaurantId) {
        self.inner.menu_cache.invalidate(&restaurant_id).await;
    }
}
