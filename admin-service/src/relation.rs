//! Configuration storage.
//!
//! Optional features keep their data in tables of a dedicated database.
//! [`Relation`] discovers which of those tables exist, caches the answer and
//! can create the database and any missing tables.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use common::errors::{AppError, AppResult};
use common::utils::{backquote, quote_string};

use crate::dbi::DatabaseInterface;

/// Storage database suggested when none is configured.
pub const DEFAULT_STORAGE_DB: &str = "dbadmin";

/// A feature backed by one configuration storage table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    Bookmark,
    Relation,
    Display,
    ColumnInfo,
    History,
    Recent,
    Favorite,
    SavedSearches,
    UserConfig,
    NavigationHiding,
    CentralColumns,
    ExportTemplates,
}

impl Feature {
    pub const ALL: [Feature; 12] = [
        Feature::Bookmark,
        Feature::Relation,
        Feature::Display,
        Feature::ColumnInfo,
        Feature::History,
        Feature::Recent,
        Feature::Favorite,
        Feature::SavedSearches,
        Feature::UserConfig,
        Feature::NavigationHiding,
        Feature::CentralColumns,
        Feature::ExportTemplates,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Feature::Bookmark => "Bookmarked SQL query",
            Feature::Relation => "General relation features",
            Feature::Display => "Display features",
            Feature::ColumnInfo => "Column comments",
            Feature::History => "SQL history",
            Feature::Recent => "Persistent recently used tables",
            Feature::Favorite => "Persistent favorite tables",
            Feature::SavedSearches => "Saving Query-By-Example searches",
            Feature::UserConfig => "User preferences",
            Feature::NavigationHiding => "Hiding/showing navigation items",
            Feature::CentralColumns => "Central columns",
            Feature::ExportTemplates => "Export templates",
        }
    }

    /// Name of the backing table.
    pub fn table(&self) -> &'static str {
        match self {
            Feature::Bookmark => "dbadmin__bookmark",
            Feature::Relation => "dbadmin__relation",
            Feature::Display => "dbadmin__table_info",
            Feature::ColumnInfo => "dbadmin__column_info",
            Feature::History => "dbadmin__history",
            Feature::Recent => "dbadmin__recent",
            Feature::Favorite => "dbadmin__favorite",
            Feature::SavedSearches => "dbadmin__savedsearches",
            Feature::UserConfig => "dbadmin__userconfig",
            Feature::NavigationHiding => "dbadmin__navigationhiding",
            Feature::CentralColumns => "dbadmin__central_columns",
            Feature::ExportTemplates => "dbadmin__export_templates",
        }
    }

    fn columns_ddl(&self) -> &'static str {
        match self {
            Feature::Bookmark => {
                "`id` int(10) unsigned NOT NULL AUTO_INCREMENT,
  `dbase` varchar(255) NOT NULL DEFAULT '',
  `user` varchar(255) NOT NULL DEFAULT '',
  `label` varchar(255) NOT NULL DEFAULT '',
  `query` text NOT NULL,
  PRIMARY KEY (`id`)"
            }
            Feature::Relation => {
                "`master_db` varchar(64) NOT NULL DEFAULT '',
  `master_table` varchar(64) NOT NULL DEFAULT '',
  `master_field` varchar(64) NOT NULL DEFAULT '',
  `foreign_db` varchar(64) NOT NULL DEFAULT '',
  `foreign_table` varchar(64) NOT NULL DEFAULT '',
  `foreign_field` varchar(64) NOT NULL DEFAULT '',
  PRIMARY KEY (`master_db`, `master_table`, `master_field`),
  KEY `foreign_field` (`foreign_db`, `foreign_table`)"
            }
            Feature::Display => {
                "`db_name` varchar(64) NOT NULL DEFAULT '',
  `table_name` varchar(64) NOT NULL DEFAULT '',
  `display_field` varchar(64) NOT NULL DEFAULT '',
  PRIMARY KEY (`db_name`, `table_name`)"
            }
            Feature::ColumnInfo => {
                "`id` int(5) unsigned NOT NULL AUTO_INCREMENT,
  `db_name` varchar(64) NOT NULL DEFAULT '',
  `table_name` varchar(64) NOT NULL DEFAULT '',
  `column_name` varchar(64) NOT NULL DEFAULT '',
  `comment` varchar(255) NOT NULL DEFAULT '',
  `mimetype` varchar(255) NOT NULL DEFAULT '',
  PRIMARY KEY (`id`),
  UNIQUE KEY `db_name` (`db_name`, `table_name`, `column_name`)"
            }
            Feature::History => {
                "`id` bigint(20) unsigned NOT NULL AUTO_INCREMENT,
  `username` varchar(64) NOT NULL DEFAULT '',
  `db` varchar(64) NOT NULL DEFAULT '',
  `table` varchar(64) NOT NULL DEFAULT '',
  `timevalue` timestamp NOT NULL DEFAULT CURRENT_TIMESTAMP,
  `sqlquery` text NOT NULL,
  PRIMARY KEY (`id`),
  KEY `username` (`username`, `db`, `table`, `timevalue`)"
            }
            Feature::Recent | Feature::Favorite => {
                "`username` varchar(64) NOT NULL,
  `tables` text NOT NULL,
  PRIMARY KEY (`username`)"
            }
            Feature::SavedSearches => {
                "`id` int(5) unsigned NOT NULL AUTO_INCREMENT,
  `username` varchar(64) NOT NULL DEFAULT '',
  `db_name` varchar(64) NOT NULL DEFAULT '',
  `search_name` varchar(64) NOT NULL DEFAULT '',
  `search_data` text NOT NULL,
  PRIMARY KEY (`id`),
  UNIQUE KEY `u_savedsearches_username_dbname` (`username`, `db_name`, `search_name`)"
            }
            Feature::UserConfig => {
                "`username` varchar(64) NOT NULL,
  `timevalue` timestamp NOT NULL DEFAULT CURRENT_TIMESTAMP,
  `config_data` text NOT NULL,
  PRIMARY KEY (`username`)"
            }
            Feature::NavigationHiding => {
                "`username` varchar(64) NOT NULL,
  `item_name` varchar(64) NOT NULL,
  `item_type` varchar(64) NOT NULL,
  `db_name` varchar(64) NOT NULL,
  `table_name` varchar(64) NOT NULL,
  PRIMARY KEY (`username`, `item_name`, `item_type`, `db_name`, `table_name`)"
            }
            Feature::CentralColumns => {
                "`db_name` varchar(64) NOT NULL,
  `col_name` varchar(64) NOT NULL,
  `col_type` varchar(64) NOT NULL,
  `col_length` text,
  `col_collation` varchar(64) NOT NULL,
  `col_isNull` boolean NOT NULL,
  `col_extra` varchar(255) DEFAULT '',
  `col_default` text,
  PRIMARY KEY (`db_name`, `col_name`)"
            }
            Feature::ExportTemplates => {
                "`id` int(5) unsigned NOT NULL AUTO_INCREMENT,
  `username` varchar(64) NOT NULL,
  `export_type` varchar(10) NOT NULL,
  `template_name` varchar(64) NOT NULL,
  `template_data` text NOT NULL,
  PRIMARY KEY (`id`),
  UNIQUE KEY `u_user_type_template` (`username`, `export_type`, `template_name`)"
            }
        }
    }

    /// `CREATE TABLE` statement for the backing table in `database`.
    pub fn create_table_sql(&self, database: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {}.{} (\n  {}\n) DEFAULT CHARACTER SET utf8mb4 COLLATE utf8mb4_bin",
            backquote(database),
            backquote(self.table()),
            self.columns_ddl()
        )
    }
}

/// Status of one feature for the check page.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureStatus {
    pub label: &'static str,
    pub table: &'static str,
    pub ok: bool,
}

/// Snapshot of what the configuration storage supports.
#[derive(Debug, Clone, Default)]
pub struct RelationParameters {
    /// Storage database; `None` when not configured.
    pub db: Option<String>,
    features: BTreeSet<Feature>,
}

impl RelationParameters {
    pub fn has(&self, feature: Feature) -> bool {
        self.db.is_some() && self.features.contains(&feature)
    }

    pub fn all_ok(&self) -> bool {
        Feature::ALL.iter().all(|f| self.has(*f))
    }

    /// Qualified `` `db`.`table` `` name of an enabled feature's table.
    pub fn table(&self, feature: Feature) -> Option<String> {
        if !self.has(feature) {
            return None;
        }
        let db = self.db.as_deref()?;
        Some(format!("{}.{}", backquote(db), backquote(feature.table())))
    }

    pub fn statuses(&self) -> Vec<FeatureStatus> {
        Feature::ALL
            .iter()
            .map(|f| FeatureStatus {
                label: f.label(),
                table: f.table(),
                ok: self.has(*f),
            })
            .collect()
    }
}

/// Foreign key recorded in the relation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Foreigner {
    pub master_field: String,
    pub foreign_db: String,
    pub foreign_table: String,
    pub foreign_field: String,
}

/// 配置存储访问
pub struct Relation {
    dbi: Arc<dyn DatabaseInterface>,
    storage_db: RwLock<Option<String>>,
    cache: RwLock<Option<RelationParameters>>,
}

impl Relation {
    pub fn new(dbi: Arc<dyn DatabaseInterface>, storage_db: Option<String>) -> Self {
        Self {
            dbi,
            storage_db: RwLock::new(storage_db.filter(|db| !db.is_empty())),
            cache: RwLock::new(None),
        }
    }

    /// Currently enabled features, discovered once and then cached.
    pub async fn get_relation_parameters(&self) -> RelationParameters {
        if let Some(cached) = self.cache.read().await.as_ref() {
            return cached.clone();
        }

        let params = self.discover().await;
        *self.cache.write().await = Some(params.clone());
        params
    }

    async fn discover(&self) -> RelationParameters {
        let Some(db) = self.storage_db.read().await.clone() else {
            return RelationParameters::default();
        };

        let tables = match self.dbi.get_tables(&db).await {
            Ok(tables) => tables,
            Err(e) => {
                tracing::warn!(database = %db, error = %e, "configuration storage is not accessible");
                return RelationParameters::default();
            }
        };

        let features = Feature::ALL
            .iter()
            .copied()
            .filter(|f| tables.iter().any(|t| t == f.table()))
            .collect();
        RelationParameters {
            db: Some(db),
            features,
        }
    }

    /// Configured storage database, whether or not it is reachable.
    pub async fn storage_db(&self) -> Option<String> {
        self.storage_db.read().await.clone()
    }

    pub async fn reset_cache(&self) {
        *self.cache.write().await = None;
    }

    /// Creates missing storage tables in `database` and switches to it.
    ///
    /// With `create` the database itself is created first.
    pub async fn fix_storage(&self, database: &str, create: bool) -> AppResult<()> {
        if database.is_empty() {
            return Err(AppError::Validation("Database is required".into()));
        }

        if create {
            let sql = format!(
                "CREATE DATABASE IF NOT EXISTS {} DEFAULT CHARACTER SET utf8mb4 COLLATE utf8mb4_bin",
                backquote(database)
            );
            self.dbi.query(None, &sql).await?;
            tracing::info!(database, "configuration storage database created");
        }

        let existing = self.dbi.get_tables(database).await?;
        for feature in Feature::ALL {
            if existing.iter().any(|t| t == feature.table()) {
                continue;
            }
            self.dbi
                .query(None, &feature.create_table_sql(database))
                .await?;
            tracing::info!(database, table = feature.table(), "configuration storage table created");
        }

        *self.storage_db.write().await = Some(database.to_string());
        self.reset_cache().await;
        Ok(())
    }

    /// Foreign keys of `table` recorded in the relation table.
    pub async fn get_foreigners(&self, db: &str, table: &str) -> AppResult<Vec<Foreigner>> {
        let params = self.get_relation_parameters().await;
        let Some(relation_table) = params.table(Feature::Relation) else {
            return Ok(Vec::new());
        };

        let sql = format!(
            "SELECT `master_field`, `foreign_db`, `foreign_table`, `foreign_field` FROM {} WHERE `master_db` = {} AND `master_table` = {}",
            relation_table,
            quote_string(db),
            quote_string(table)
        );
        let result = self.dbi.query(None, &sql).await?;
        Ok((0..result.rows.len())
            .map(|row| Foreigner {
                master_field: result.get_str(row, "master_field").unwrap_or_default(),
                foreign_db: result.get_str(row, "foreign_db").unwrap_or_default(),
                foreign_table: result.get_str(row, "foreign_table").unwrap_or_default(),
                foreign_field: result.get_str(row, "foreign_field").unwrap_or_default(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbi::dummy::DbiDummy;
    use serde_json::json;

    fn storage_tables(dbi: &DbiDummy, db: &str, tables: &[&str]) {
        dbi.add_result(
            &format!("SHOW TABLES FROM `{db}`"),
            &["Tables_in_db"],
            tables.iter().map(|t| vec![json!(t)]).collect(),
        );
    }

    #[tokio::test]
    async fn test_unconfigured_storage_has_no_features() {
        let dbi = Arc::new(DbiDummy::new());
        let relation = Relation::new(dbi.clone(), None);
        let params = relation.get_relation_parameters().await;
        assert!(params.db.is_none());
        assert!(!params.has(Feature::Bookmark));
        assert!(dbi.executed().is_empty());
    }

    #[tokio::test]
    async fn test_features_follow_existing_tables_and_are_cached() {
        let dbi = Arc::new(DbiDummy::new());
        storage_tables(&dbi, "dbadmin", &["dbadmin__bookmark", "other"]);
        let relation = Relation::new(dbi.clone(), Some("dbadmin".into()));

        let params = relation.get_relation_parameters().await;
        assert!(params.has(Feature::Bookmark));
        assert!(!params.has(Feature::Relation));
        assert!(!params.all_ok());
        assert_eq!(
            params.table(Feature::Bookmark).as_deref(),
            Some("`dbadmin`.`dbadmin__bookmark`")
        );

        relation.get_relation_parameters().await;
        assert_eq!(dbi.executed().len(), 1);
    }

    #[tokio::test]
    async fn test_inaccessible_storage_disables_everything() {
        let dbi = Arc::new(DbiDummy::new());
        dbi.add_failure("SHOW TABLES FROM `missing`");
        let relation = Relation::new(dbi, Some("missing".into()));
        let params = relation.get_relation_parameters().await;
        assert!(params.db.is_none());
    }

    #[tokio::test]
    async fn test_fix_storage_creates_database_and_missing_tables() {
        let dbi = Arc::new(DbiDummy::new());
        dbi.add_affected(
            "CREATE DATABASE IF NOT EXISTS `dbadmin` DEFAULT CHARACTER SET utf8mb4 COLLATE utf8mb4_bin",
            1,
        );
        storage_tables(&dbi, "dbadmin", &["dbadmin__bookmark"]);
        for feature in Feature::ALL.iter().skip(1) {
            dbi.add_affected(&feature.create_table_sql("dbadmin"), 0);
        }
        storage_tables(
            &dbi,
            "dbadmin",
            &Feature::ALL.iter().map(|f| f.table()).collect::<Vec<_>>(),
        );

        let relation = Relation::new(dbi.clone(), None);
        relation.fix_storage("dbadmin", true).await.unwrap();
        let params = relation.get_relation_parameters().await;
        assert!(params.all_ok());
        dbi.assert_all_queries_consumed();
    }

    #[tokio::test]
    async fn test_get_foreigners() {
        let dbi = Arc::new(DbiDummy::new());
        storage_tables(&dbi, "dbadmin", &["dbadmin__relation"]);
        dbi.add_result(
            "SELECT `master_field`, `foreign_db`, `foreign_table`, `foreign_field` FROM `dbadmin`.`dbadmin__relation` WHERE `master_db` = 'shop' AND `master_table` = 'orders'",
            &["master_field", "foreign_db", "foreign_table", "foreign_field"],
            vec![vec![json!("customer_id"), json!("shop"), json!("customers"), json!("id")]],
        );
        let relation = Relation::new(dbi, Some("dbadmin".into()));
        let foreigners = relation.get_foreigners("shop", "orders").await.unwrap();
        assert_eq!(foreigners.len(), 1);
        assert_eq!(foreigners[0].foreign_table, "customers");
    }
}
