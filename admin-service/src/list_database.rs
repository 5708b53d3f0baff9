//! Databases visible to the user.
//!
//! The list honours `ONLY_DB` patterns and the `HIDE_DB` expression and is
//! built once per request.

use regex::Regex;

use common::config::ServerConfig;
use common::errors::AppResult;
use common::models::DatabaseListItem;
use common::utils::quote_string;
use common::utils::sql_util::{has_unescaped_wildcards, unescape_mysql_wildcards};

use crate::dbi::DatabaseInterface;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListDatabase {
    items: Vec<String>,
}

impl ListDatabase {
    /// 加载数据库列表
    pub async fn load(dbi: &dyn DatabaseInterface, server: &ServerConfig) -> AppResult<Self> {
        let mut items = if server.only_db.is_empty() {
            let sql = if server.disable_is {
                "SHOW DATABASES"
            } else {
                "SELECT `SCHEMA_NAME` FROM `INFORMATION_SCHEMA`.`SCHEMATA`"
            };
            let mut names = dbi.query(None, sql).await?.first_column();
            names.sort();
            names
        } else {
            Self::from_patterns(dbi, &server.only_db).await?
        };
        items.dedup();

        let mut list = Self { items };
        list.hide(server.hide_db.as_deref());
        Ok(list)
    }

    async fn from_patterns(dbi: &dyn DatabaseInterface, patterns: &[String]) -> AppResult<Vec<String>> {
        let mut items: Vec<String> = Vec::new();
        for pattern in patterns {
            if !has_unescaped_wildcards(pattern) {
                let name = unescape_mysql_wildcards(pattern);
                if !items.contains(&name) {
                    items.push(name);
                }
                continue;
            }

            let sql = format!("SHOW DATABASES LIKE {}", quote_string(pattern));
            for name in dbi.query(None, &sql).await?.first_column() {
                if !items.contains(&name) {
                    items.push(name);
                }
            }
        }
        Ok(items)
    }

    /// Drops names matching `hide_db`; an invalid expression hides nothing.
    pub fn hide(&mut self, hide_db: Option<&str>) {
        let Some(pattern) = hide_db.filter(|p| !p.is_empty()) else {
            return;
        };
        match Regex::new(pattern) {
            Ok(regex) => self.items.retain(|name| !regex.is_match(name)),
            Err(e) => tracing::warn!(pattern, error = %e, "invalid HIDE_DB expression ignored"),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether every name in `names` is in the list.
    pub fn exists(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.items.iter().any(|item| item == name))
    }

    pub fn get_list(&self, current: &str) -> Vec<DatabaseListItem> {
        self.items
            .iter()
            .map(|name| DatabaseListItem {
                name: name.clone(),
                is_selected: name == current,
            })
            .collect()
    }

    /// The database a page opens with: the current one, or none. The current
    /// database is kept even when the list does not show it.
    pub fn get_default(&self, current: &str) -> String {
        current.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbi::dummy::DbiDummy;
    use serde_json::json;

    fn only(patterns: &[&str]) -> ServerConfig {
        ServerConfig {
            only_db: patterns.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_only_db_without_wildcards() {
        let dbi = DbiDummy::new();
        let list = ListDatabase::load(&dbi, &only(&["single\\_db"])).await.unwrap();
        assert_eq!(list.names(), ["single_db"]);
        assert!(list.exists(&["single_db"]));
        assert!(!list.exists(&["single_db", "other"]));
        assert_eq!(
            list.get_list("single_db"),
            vec![DatabaseListItem {
                name: "single_db".into(),
                is_selected: true
            }]
        );
        assert!(dbi.executed().is_empty());
    }

    #[tokio::test]
    async fn test_default_is_current_database_outside_the_list() {
        let dbi = DbiDummy::new();
        let list = ListDatabase::load(&dbi, &only(&["single\\_db"])).await.unwrap();
        assert_eq!(list.get_default("mysql"), "mysql");
        assert_eq!(list.get_default(""), "");
    }

    #[tokio::test]
    async fn test_hide_db() {
        let dbi = DbiDummy::new();
        let mut server = only(&["single\\_db"]);
        server.hide_db = Some("^single_db$".into());
        let list = ListDatabase::load(&dbi, &server).await.unwrap();
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn test_only_db_with_wildcards() {
        let dbi = DbiDummy::new();
        dbi.add_result(
            "SHOW DATABASES LIKE 'app\\\\_%'",
            &["Database (app\\_%)"],
            vec![vec![json!("app_one")], vec![json!("app_two")]],
        );
        let list = ListDatabase::load(&dbi, &only(&["app\\_%", "app\\_one"]))
            .await
            .unwrap();
        assert_eq!(list.names(), ["app_one", "app_two"]);
    }

    #[tokio::test]
    async fn test_all_databases() {
        let dbi = DbiDummy::new();
        dbi.add_result(
            "SELECT `SCHEMA_NAME` FROM `INFORMATION_SCHEMA`.`SCHEMATA`",
            &["SCHEMA_NAME"],
            vec![vec![json!("b")], vec![json!("a")], vec![json!("information_schema")]],
        );
        let server = ServerConfig {
            hide_db: Some("^information_schema$".into()),
            ..Default::default()
        };
        let list = ListDatabase::load(&dbi, &server).await.unwrap();
        assert_eq!(list.names(), ["a", "b"]);
        assert_eq!(list.get_default("b"), "b");
        assert_eq!(list.get_default(""), "");
    }

    #[tokio::test]
    async fn test_disable_is_uses_show_databases() {
        let dbi = DbiDummy::new();
        dbi.add_result("SHOW DATABASES", &["Database"], vec![vec![json!("x")]]);
        let server = ServerConfig {
            disable_is: true,
            ..Default::default()
        };
        let list = ListDatabase::load(&dbi, &server).await.unwrap();
        assert_eq!(list.names(), ["x"]);
    }
}
