//! 书签（已保存的查询）存储

use std::sync::Arc;

use common::errors::{AppError, AppResult};
use common::models::{Bookmark, NewBookmark, QueryResult};
use common::utils::quote_string;

use crate::dbi::DatabaseInterface;
use crate::relation::{Feature, Relation};

pub struct BookmarkRepository {
    dbi: Arc<dyn DatabaseInterface>,
    relation: Arc<Relation>,
    user: String,
}

impl BookmarkRepository {
    pub fn new(dbi: Arc<dyn DatabaseInterface>, relation: Arc<Relation>, user: String) -> Self {
        Self {
            dbi,
            relation,
            user,
        }
    }

    async fn table(&self) -> Option<String> {
        self.relation
            .get_relation_parameters()
            .await
            .table(Feature::Bookmark)
    }

    /// Bookmarks the current user can see: their own and the shared ones.
    fn visible_to_user(&self) -> String {
        format!("(`user` = '' OR `user` = {})", quote_string(&self.user))
    }

    fn from_result(result: &QueryResult) -> Vec<Bookmark> {
        (0..result.rows.len())
            .filter_map(|row| {
                Some(Bookmark {
                    id: result.get_str(row, "id")?.parse().ok()?,
                    database: result.get_str(row, "dbase").unwrap_or_default(),
                    user: result.get_str(row, "user").unwrap_or_default(),
                    label: result.get_str(row, "label").unwrap_or_default(),
                    query: result.get_str(row, "query").unwrap_or_default(),
                })
            })
            .collect()
    }

    /// 保存书签
    pub async fn save(&self, bookmark: &NewBookmark) -> AppResult<()> {
        let table = self.table().await.ok_or_else(|| {
            AppError::StorageUnavailable("bookmark table is not configured".into())
        })?;
        if bookmark.label.trim().is_empty() || bookmark.query.trim().is_empty() {
            return Err(AppError::Validation(
                "Bookmark label and query are required".into(),
            ));
        }

        let sql = format!(
            "INSERT INTO {table} (`dbase`, `user`, `query`, `label`) VALUES ({}, {}, {}, {})",
            quote_string(&bookmark.database),
            quote_string(&bookmark.user),
            quote_string(&bookmark.query),
            quote_string(&bookmark.label)
        );
        self.dbi.query(None, &sql).await?;
        tracing::info!(database = %bookmark.database, label = %bookmark.label, "bookmark saved");
        Ok(())
    }

    /// 列出数据库下的书签
    pub async fn list(&self, database: &str) -> AppResult<Vec<Bookmark>> {
        let Some(table) = self.table().await else {
            return Ok(Vec::new());
        };
        let sql = format!(
            "SELECT `id`, `dbase`, `user`, `label`, `query` FROM {table} WHERE {} AND `dbase` = {} ORDER BY `label` ASC",
            self.visible_to_user(),
            quote_string(database)
        );
        Ok(Self::from_result(&self.dbi.query(None, &sql).await?))
    }

    /// 按 ID 获取书签
    pub async fn get(&self, id: u64) -> AppResult<Bookmark> {
        let table = self.table().await.ok_or_else(|| {
            AppError::StorageUnavailable("bookmark table is not configured".into())
        })?;
        let sql = format!(
            "SELECT `id`, `dbase`, `user`, `label`, `query` FROM {table} WHERE `id` = {id} AND {}",
            self.visible_to_user()
        );
        Self::from_result(&self.dbi.query(None, &sql).await?)
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("bookmark {id}")))
    }

    /// 删除书签
    pub async fn delete(&self, id: u64) -> AppResult<()> {
        let table = self.table().await.ok_or_else(|| {
            AppError::StorageUnavailable("bookmark table is not configured".into())
        })?;
        let sql = format!(
            "DELETE FROM {table} WHERE `id` = {id} AND {}",
            self.visible_to_user()
        );
        let result = self.dbi.query(None, &sql).await?;
        if result.affected_rows.unwrap_or(0) == 0 {
            return Err(AppError::NotFound(format!("bookmark {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbi::dummy::DbiDummy;
    use serde_json::json;

    fn repository(dbi: &Arc<DbiDummy>, tables: &[&str]) -> BookmarkRepository {
        dbi.add_result(
            "SHOW TABLES FROM `dbadmin`",
            &["Tables_in_dbadmin"],
            tables.iter().map(|t| vec![json!(t)]).collect(),
        );
        let relation = Arc::new(Relation::new(dbi.clone(), Some("dbadmin".into())));
        BookmarkRepository::new(dbi.clone(), relation, "root".into())
    }

    #[tokio::test]
    async fn test_save_and_list() {
        let dbi = Arc::new(DbiDummy::new());
        let repo = repository(&dbi, &["dbadmin__bookmark"]);
        dbi.add_affected(
            "INSERT INTO `dbadmin`.`dbadmin__bookmark` (`dbase`, `user`, `query`, `label`) VALUES ('shop', '', 'SELECT 1', 'one')",
            1,
        );
        dbi.add_result(
            "SELECT `id`, `dbase`, `user`, `label`, `query` FROM `dbadmin`.`dbadmin__bookmark` WHERE (`user` = '' OR `user` = 'root') AND `dbase` = 'shop' ORDER BY `label` ASC",
            &["id", "dbase", "user", "label", "query"],
            vec![vec![json!(7), json!("shop"), json!(""), json!("one"), json!("SELECT 1")]],
        );

        repo.save(&NewBookmark {
            database: "shop".into(),
            user: String::new(),
            label: "one".into(),
            query: "SELECT 1".into(),
        })
        .await
        .unwrap();
        let bookmarks = repo.list("shop").await.unwrap();
        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0].id, 7);
        assert!(bookmarks[0].is_shared());
        dbi.assert_all_queries_consumed();
    }

    #[tokio::test]
    async fn test_without_storage() {
        let dbi = Arc::new(DbiDummy::new());
        let repo = repository(&dbi, &[]);
        assert!(repo.list("shop").await.unwrap().is_empty());
        assert!(matches!(
            repo.get(1).await,
            Err(AppError::StorageUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_bookmark() {
        let dbi = Arc::new(DbiDummy::new());
        let repo = repository(&dbi, &["dbadmin__bookmark"]);
        dbi.add_affected(
            "DELETE FROM `dbadmin`.`dbadmin__bookmark` WHERE `id` = 3 AND (`user` = '' OR `user` = 'root')",
            0,
        );
        assert!(matches!(repo.delete(3).await, Err(AppError::NotFound(_))));
    }
}
