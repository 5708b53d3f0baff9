//! 索引管理
//!
//! Reads indexes with `SHOW INDEXES`, generates `ALTER TABLE` statements for
//! the index editor and applies them.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use common::errors::{AppError, AppResult};
use common::models::{Index, IndexChoice, IndexColumn, IndexSaveRequest, QueryResult};
use common::utils::{backquote, quote_string};

use crate::dbi::DatabaseInterface;
use crate::state::AppState;
use crate::template::Template;

/// Reasons an index definition cannot be turned into SQL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexSqlError {
    #[error("The name of the primary key must be \"PRIMARY\"!")]
    PrimaryKeyName,
    #[error("Can't rename index to PRIMARY!")]
    RenameToPrimary,
    #[error("No index parts defined!")]
    NoParts,
}

/// Generated statement and the first problem found while building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStatement {
    pub sql: String,
    pub error: Option<IndexSqlError>,
}

/// Result of the save endpoint.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SaveOutcome {
    Preview { sql_data: String },
    Saved { message: String, index_table: String },
}

/// Groups `SHOW INDEXES` rows into indexes, keeping server order.
pub fn indexes_from_result(result: &QueryResult) -> Vec<Index> {
    let mut indexes: Vec<Index> = Vec::new();
    for row in 0..result.rows.len() {
        let Some(name) = result.get_str(row, "Key_name") else {
            continue;
        };
        let column = IndexColumn {
            name: result.get_str(row, "Column_name").unwrap_or_default(),
            sub_part: result.get_str(row, "Sub_part").and_then(|s| s.parse().ok()),
            seq_in_index: result
                .get_str(row, "Seq_in_index")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            cardinality: result.get_str(row, "Cardinality").and_then(|s| s.parse().ok()),
            nullable: result.get_str(row, "Null").as_deref() == Some("YES"),
            collation: result.get_str(row, "Collation"),
        };

        if let Some(index) = indexes.iter_mut().find(|i| i.name == name) {
            index.columns.push(column);
            continue;
        }

        let index_type = result.get_str(row, "Index_type");
        let non_unique = result.get_str(row, "Non_unique").as_deref() != Some("0");
        let choice = match index_type.as_deref() {
            _ if name == "PRIMARY" => IndexChoice::Primary,
            Some("FULLTEXT") => IndexChoice::Fulltext,
            Some("SPATIAL") => IndexChoice::Spatial,
            _ if !non_unique => IndexChoice::Unique,
            _ => IndexChoice::Index,
        };
        indexes.push(Index {
            name,
            choice,
            index_type,
            columns: vec![column],
            comment: result.get_str(row, "Index_comment").unwrap_or_default(),
            key_block_size: None,
            parser: None,
        });
    }
    indexes
}

/// Warnings for indexes covering the same columns.
pub fn find_duplicates(indexes: &[Index]) -> Vec<String> {
    let mut warnings = Vec::new();
    for (i, first) in indexes.iter().enumerate() {
        for second in &indexes[i + 1..] {
            if first.signature() == second.signature() {
                warnings.push(format!(
                    "The indexes {} and {} seem to be equal and one of them could possibly be removed.",
                    first.name, second.name
                ));
            }
        }
    }
    warnings
}

/// `ALTER TABLE` statement creating `index`, replacing `old_index` when given.
pub fn create_or_edit_sql(
    db: &str,
    table: &str,
    index: &Index,
    old_index: Option<&str>,
) -> IndexStatement {
    let mut error = None;
    let mut sql = format!("ALTER TABLE {}.{}", backquote(db), backquote(table));

    if let Some(old) = old_index.filter(|o| !o.is_empty()) {
        if old == "PRIMARY" {
            sql.push_str(" DROP PRIMARY KEY,");
        } else {
            sql.push_str(&format!(" DROP INDEX {},", backquote(old)));
        }
    }

    match index.choice {
        IndexChoice::Primary => {
            if !index.name.is_empty() && index.name != "PRIMARY" {
                error = Some(IndexSqlError::PrimaryKeyName);
            }
            sql.push_str(" ADD PRIMARY KEY");
        }
        choice => {
            if index.name == "PRIMARY" {
                error = Some(IndexSqlError::RenameToPrimary);
            }
            sql.push_str(&format!(" ADD {choice} "));
            if !index.name.is_empty() {
                sql.push_str(&backquote(&index.name));
            }
        }
    }

    let parts: Vec<String> = index
        .columns
        .iter()
        .filter(|c| !c.name.is_empty())
        .map(|c| match c.sub_part {
            Some(len) if len > 0 => format!("{}({len})", backquote(&c.name)),
            _ => backquote(&c.name),
        })
        .collect();
    if parts.is_empty() {
        error.get_or_insert(IndexSqlError::NoParts);
    }
    sql.push_str(&format!(" ({})", parts.join(", ")));

    if let Some(size) = index.key_block_size.filter(|s| *s > 0) {
        sql.push_str(&format!(" KEY_BLOCK_SIZE = {size}"));
    }

    let is_text_or_spatial = matches!(index.choice, IndexChoice::Fulltext | IndexChoice::Spatial);
    if !is_text_or_spatial {
        if let Some(kind) = index
            .index_type
            .as_deref()
            .filter(|t| matches!(*t, "BTREE" | "HASH"))
        {
            sql.push_str(&format!(" USING {kind}"));
        }
    }

    if index.choice == IndexChoice::Fulltext {
        if let Some(parser) = index.parser.as_deref().filter(|p| !p.is_empty()) {
            sql.push_str(&format!(" WITH PARSER {}", backquote(parser)));
        }
    }

    if !index.comment.is_empty() {
        sql.push_str(&format!(" COMMENT {}", quote_string(&index.comment)));
    }
    sql.push(';');

    IndexStatement { sql, error }
}

/// `ALTER TABLE ... RENAME INDEX` statement.
pub fn rename_sql(db: &str, table: &str, old_name: &str, new_name: &str) -> IndexStatement {
    let error = (new_name == "PRIMARY").then_some(IndexSqlError::RenameToPrimary);
    IndexStatement {
        sql: format!(
            "ALTER TABLE {}.{} RENAME INDEX {} TO {};",
            backquote(db),
            backquote(table),
            backquote(old_name),
            backquote(new_name)
        ),
        error,
    }
}

pub struct Indexes {
    dbi: Arc<dyn DatabaseInterface>,
    template: Arc<Template>,
}

impl Indexes {
    pub fn new(state: &AppState) -> Self {
        Self {
            dbi: state.dbi.clone(),
            template: state.template.clone(),
        }
    }

    /// 读取表的索引
    pub async fn from_table(&self, db: &str, table: &str) -> AppResult<Vec<Index>> {
        let sql = format!("SHOW INDEXES FROM {}.{}", backquote(db), backquote(table));
        Ok(indexes_from_result(&self.dbi.query(None, &sql).await?))
    }

    /// Rendered index table for `table`.
    pub async fn index_table(&self, db: &str, table: &str) -> AppResult<String> {
        let indexes = self.from_table(db, table).await?;
        self.template.render(
            "indexes.html",
            json!({
                "db": db,
                "table": table,
                "indexes": indexes,
                "duplicates": find_duplicates(&indexes),
            }),
        )
    }

    async fn statement_for(&self, req: &IndexSaveRequest) -> AppResult<IndexStatement> {
        let old_index = req.old_index.as_deref().filter(|o| !o.is_empty());
        if !req.rename {
            return Ok(create_or_edit_sql(&req.db, &req.table, &req.index, old_index));
        }

        let old = old_index
            .ok_or_else(|| AppError::Validation("Index to rename is required".into()))?;
        if self.dbi.server_version().await?.supports_rename_index() {
            Ok(rename_sql(&req.db, &req.table, old, &req.index.name))
        } else {
            Ok(create_or_edit_sql(&req.db, &req.table, &req.index, Some(old)))
        }
    }

    /// 预览或执行索引变更
    pub async fn do_save_data(&self, req: &IndexSaveRequest) -> AppResult<SaveOutcome> {
        let statement = self.statement_for(req).await?;

        if req.preview_sql {
            let sql_data = self
                .template
                .render("preview_sql.html", json!({ "query_data": statement.sql }))?;
            return Ok(SaveOutcome::Preview { sql_data });
        }

        if let Some(error) = statement.error {
            return Err(AppError::RequestFailed(error.to_string()));
        }

        self.dbi.query(None, &statement.sql).await?;
        tracing::info!(db = %req.db, table = %req.table, index = %req.index.name, "index saved");

        let message = self.template.render(
            "message.html",
            json!({
                "kind": "success",
                "message": format!("Table {} has been altered successfully.", req.table),
                "sql": statement.sql,
            }),
        )?;
        let index_table = self.index_table(&req.db, &req.table).await?;
        Ok(SaveOutcome::Saved {
            message,
            index_table,
        })
    }
}
