//! Removes configuration storage rows that refer to dropped objects.

use std::sync::Arc;

use common::errors::AppResult;
use common::utils::quote_string;

use crate::dbi::DatabaseInterface;
use crate::relation::{Feature, Relation};

pub struct RelationCleanup {
    dbi: Arc<dyn DatabaseInterface>,
    relation: Arc<Relation>,
}

impl RelationCleanup {
    pub fn new(dbi: Arc<dyn DatabaseInterface>, relation: Arc<Relation>) -> Self {
        Self { dbi, relation }
    }

    /// Runs `DELETE FROM <feature table> WHERE <condition>` when the feature is enabled.
    async fn delete_from(&self, feature: Feature, condition: &str) -> AppResult<()> {
        let params = self.relation.get_relation_parameters().await;
        if let Some(table) = params.table(feature) {
            self.dbi
                .query(None, &format!("DELETE FROM {table} WHERE {condition}"))
                .await?;
        }
        Ok(())
    }

    pub async fn column(&self, db: &str, table: &str, column: &str) -> AppResult<()> {
        let (db, table, column) = (quote_string(db), quote_string(table), quote_string(column));

        self.delete_from(
            Feature::ColumnInfo,
            &format!("db_name = {db} AND table_name = {table} AND column_name = {column}"),
        )
        .await?;
        self.delete_from(
            Feature::Display,
            &format!("db_name = {db} AND table_name = {table} AND display_field = {column}"),
        )
        .await?;
        self.delete_from(
            Feature::Relation,
            &format!("master_db = {db} AND master_table = {table} AND master_field = {column}"),
        )
        .await?;
        self.delete_from(
            Feature::Relation,
            &format!("foreign_db = {db} AND foreign_table = {table} AND foreign_field = {column}"),
        )
        .await
    }

    pub async fn table(&self, db: &str, table: &str) -> AppResult<()> {
        let (db, table) = (quote_string(db), quote_string(table));

        self.delete_from(
            Feature::ColumnInfo,
            &format!("db_name = {db} AND table_name = {table}"),
        )
        .await?;
        self.delete_from(
            Feature::Display,
            &format!("db_name = {db} AND table_name = {table}"),
        )
        .await?;
        self.delete_from(
            Feature::Relation,
            &format!("master_db = {db} AND master_table = {table}"),
        )
        .await?;
        self.delete_from(
            Feature::Relation,
            &format!("foreign_db = {db} AND foreign_table = {table}"),
        )
        .await?;
        self.delete_from(
            Feature::NavigationHiding,
            &format!("db_name = {db} AND (table_name = {table} OR (item_name = {table} AND item_type = 'table'))"),
        )
        .await
    }

    pub async fn database(&self, db: &str) -> AppResult<()> {
        let db = quote_string(db);

        self.delete_from(Feature::ColumnInfo, &format!("db_name = {db}"))
            .await?;
        self.delete_from(Feature::Display, &format!("db_name = {db}"))
            .await?;
        self.delete_from(Feature::Bookmark, &format!("dbase = {db}"))
            .await?;
        self.delete_from(Feature::Relation, &format!("master_db = {db}"))
            .await?;
        self.delete_from(Feature::Relation, &format!("foreign_db = {db}"))
            .await?;
        self.delete_from(Feature::History, &format!("db = {db}"))
            .await?;
        self.delete_from(Feature::NavigationHiding, &format!("db_name = {db}"))
            .await?;
        self.delete_from(Feature::SavedSearches, &format!("db_name = {db}"))
            .await?;
        self.delete_from(Feature::CentralColumns, &format!("db_name = {db}"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbi::dummy::DbiDummy;
    use serde_json::json;

    fn cleanup_with(dbi: &Arc<DbiDummy>, tables: &[&str]) -> RelationCleanup {
        dbi.add_result(
            "SHOW TABLES FROM `dbadmin`",
            &["Tables_in_dbadmin"],
            tables.iter().map(|t| vec![json!(t)]).collect(),
        );
        let relation = Arc::new(Relation::new(dbi.clone(), Some("dbadmin".into())));
        RelationCleanup::new(dbi.clone(), relation)
    }

    #[tokio::test]
    async fn test_column_cleanup_touches_enabled_tables_only() {
        let dbi = Arc::new(DbiDummy::new());
        let cleanup = cleanup_with(&dbi, &["dbadmin__column_info"]);
        dbi.add_affected(
            "DELETE FROM `dbadmin`.`dbadmin__column_info` WHERE db_name = 'db' AND table_name = 't' AND column_name = 'c'",
            1,
        );

        cleanup.column("db", "t", "c").await.unwrap();
        dbi.assert_all_queries_consumed();
        assert_eq!(dbi.executed().len(), 2);
    }

    #[tokio::test]
    async fn test_database_cleanup_removes_bookmarks() {
        let dbi = Arc::new(DbiDummy::new());
        let cleanup = cleanup_with(&dbi, &["dbadmin__bookmark", "dbadmin__history"]);
        dbi.add_affected("DELETE FROM `dbadmin`.`dbadmin__bookmark` WHERE dbase = 'shop'", 3);
        dbi.add_affected("DELETE FROM `dbadmin`.`dbadmin__history` WHERE db = 'shop'", 0);

        cleanup.database("shop").await.unwrap();
        dbi.assert_all_queries_consumed();
    }

    #[tokio::test]
    async fn test_nothing_runs_without_storage() {
        let dbi = Arc::new(DbiDummy::new());
        let relation = Arc::new(Relation::new(dbi.clone(), None));
        RelationCleanup::new(dbi.clone(), relation)
            .table("db", "t")
            .await
            .unwrap();
        assert!(dbi.executed().is_empty());
    }
}
