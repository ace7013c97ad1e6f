pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::config::SearchApiConfig;
use crate::search::SearchService;
use crate::store::ArticleStore;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub search: SearchService,
    pub store: Arc<dyn ArticleStore>,
    pub default_size: i64,
    pub max_size: i64,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(search: SearchService, store: Arc<dyn ArticleStore>) -> Self {
        let defaults = SearchApiConfig::default();
        Self {
            search,
            store,
            default_size: defaults.default_size,
            max_size: defaults.max_size,
            started_at: Instant::now(),
        }
    }

    /// Apply the page size settings
    pub fn with_search_config(mut self, config: &SearchApiConfig) -> Self {
        self.default_size = config.default_size;
        self.max_size = config.max_size;
        self
    }
}
