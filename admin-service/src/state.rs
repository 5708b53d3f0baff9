//! Application state for the admin service.

use std::sync::Arc;

use common::config::AppConfig;
use common::errors::AppResult;

use crate::bookmarks::BookmarkRepository;
use crate::dbi::{DatabaseInterface, MySqlDbi};
use crate::relation::Relation;
use crate::template::Template;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub dbi: Arc<dyn DatabaseInterface>,
    pub template: Arc<Template>,
    pub relation: Arc<Relation>,
}

impl AppState {
    /// Creates the state with a lazily connecting MySQL pool.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let dbi = Arc::new(MySqlDbi::connect_lazy(&config)?);
        Self::with_dbi(config, dbi)
    }

    pub fn with_dbi(config: AppConfig, dbi: Arc<dyn DatabaseInterface>) -> AppResult<Self> {
        let relation = Arc::new(Relation::new(
            dbi.clone(),
            Some(config.server.pmadb.clone()),
        ));
        Ok(Self {
            config,
            dbi,
            template: Arc::new(Template::new()?),
            relation,
        })
    }

    pub fn bookmarks(&self) -> BookmarkRepository {
        BookmarkRepository::new(
            self.dbi.clone(),
            self.relation.clone(),
            self.config.server.user.clone(),
        )
    }
}
