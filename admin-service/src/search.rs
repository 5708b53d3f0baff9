//! 表搜索服务
//!
//! Builds search queries from per-column criteria and serves the helper
//! lookups of the search form.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use common::errors::{AppError, AppResult};
use common::models::{ColumnFull, DataRowRequest, SearchCriterion, TableSearchRequest};
use common::utils::{backquote, escape_string, is_numeric, parse_enum_set_values, quote_string};

use crate::dbi::DatabaseInterface;
use crate::relation::Relation;
use crate::sql::Sql;
use crate::state::AppState;

const NUMERIC_OPERATORS: &[&str] = &["=", ">", ">=", "<", "<=", "!=", "LIKE", "LIKE %...%", "NOT LIKE", "IN (...)", "NOT IN (...)", "BETWEEN", "NOT BETWEEN"];
const TEXT_OPERATORS: &[&str] = &["LIKE", "LIKE %...%", "=", "!=", "REGEXP", "REGEXP ^...$", "NOT REGEXP", "= ''", "!= ''", "IN (...)", "NOT IN (...)", "BETWEEN", "NOT BETWEEN"];
const ENUM_OPERATORS: &[&str] = &["=", "!="];
const NULL_OPERATORS: &[&str] = &["IS NULL", "IS NOT NULL"];

const NUMERIC_TYPES: &[&str] = &[
    "tinyint", "smallint", "mediumint", "int", "integer", "bigint", "decimal", "dec", "numeric",
    "fixed", "float", "double", "real", "bit", "bool", "boolean", "serial",
];

pub fn is_numeric_type(base_type: &str) -> bool {
    NUMERIC_TYPES.contains(&base_type)
}

/// Operators offered for a column.
pub fn operators_for(column: &ColumnFull) -> Vec<&'static str> {
    let base = column.base_type();
    let mut operators: Vec<&'static str> = if base == "enum" || base == "set" {
        ENUM_OPERATORS.to_vec()
    } else if is_numeric_type(&base) {
        NUMERIC_OPERATORS.to_vec()
    } else {
        TEXT_OPERATORS.to_vec()
    };
    if column.is_nullable {
        operators.extend_from_slice(NULL_OPERATORS);
    }
    operators
}

/// One column of the search form.
#[derive(Debug, Serialize)]
pub struct SearchColumn {
    pub name: String,
    pub column_type: String,
    pub collation: Option<String>,
    pub operators: Vec<&'static str>,
    /// Choices of an enum or set column.
    pub values: Vec<String>,
    /// `db.table.column` this column refers to.
    pub foreign: Option<String>,
}

pub struct Search {
    dbi: Arc<dyn DatabaseInterface>,
    relation: Arc<Relation>,
    sql: Sql,
}

impl Search {
    pub fn new(state: &AppState) -> Self {
        Self {
            dbi: state.dbi.clone(),
            relation: state.relation.clone(),
            sql: Sql::new(state),
        }
    }

    pub fn sql(&self) -> &Sql {
        &self.sql
    }

    /// Columns of the search form.
    pub async fn form_columns(&self, db: &str, table: &str) -> AppResult<Vec<SearchColumn>> {
        let columns = self.dbi.get_columns(db, table).await?;
        let foreigners = self.relation.get_foreigners(db, table).await?;
        Ok(columns
            .into_iter()
            .map(|column| {
                let base = column.base_type();
                let values = if base == "enum" || base == "set" {
                    parse_enum_set_values(&column.column_type)
                } else {
                    Vec::new()
                };
                let foreign = foreigners
                    .iter()
                    .find(|f| f.master_field == column.field)
                    .map(|f| format!("{}.{}.{}", f.foreign_db, f.foreign_table, f.foreign_field));
                SearchColumn {
                    operators: operators_for(&column),
                    name: column.field,
                    column_type: column.column_type,
                    collation: column.collation,
                    values,
                    foreign,
                }
            })
            .collect())
    }

    /// 获取列的最小值与最大值
    pub async fn get_column_min_max(
        &self,
        db: &str,
        table: &str,
        column: &str,
    ) -> AppResult<Map<String, Value>> {
        let sql = format!(
            "SELECT MIN({column}) AS `min`, MAX({column}) AS `max` FROM {}.{}",
            backquote(db),
            backquote(table),
            column = backquote(column)
        );
        Ok(self
            .dbi
            .fetch_single_row(None, &sql)
            .await?
            .unwrap_or_default())
    }

    /// 按签名条件获取单行数据
    pub async fn get_data_row(&self, req: &DataRowRequest) -> AppResult<Map<String, Value>> {
        self.sql
            .verify_where_clause(&req.where_clause, &req.where_clause_sign)?;

        let sql = format!(
            "SELECT * FROM {}.{} WHERE {};",
            backquote(&req.db),
            backquote(&req.table),
            req.where_clause
        );
        let result = self.dbi.query(None, &sql).await?;

        let mut row_info = Map::new();
        for row in &result.rows {
            for (column, value) in result.columns.iter().zip(row) {
                let value = if column.data_type.eq_ignore_ascii_case("BIT") {
                    printable_bit(value)
                } else {
                    value.clone()
                };
                row_info.insert(column.name.clone(), value);
            }
        }
        Ok(row_info)
    }

    /// Search query built from the request; columns must exist in `columns`.
    pub fn build_sql_query(
        &self,
        req: &TableSearchRequest,
        columns: &[ColumnFull],
    ) -> AppResult<String> {
        let find = |name: &str| {
            columns
                .iter()
                .find(|c| c.field == name)
                .ok_or_else(|| AppError::Validation(format!("Unknown column: {name}")))
        };

        let select_list = if req.columns_to_display.is_empty() {
            "*".to_string()
        } else {
            req.columns_to_display
                .iter()
                .map(|name| find(name).map(|c| backquote(&c.field)))
                .collect::<AppResult<Vec<_>>>()?
                .join(", ")
        };

        let mut sql = format!(
            "SELECT {}{} FROM {}.{}",
            if req.distinct { "DISTINCT " } else { "" },
            select_list,
            backquote(&req.db),
            backquote(&req.table)
        );

        let conditions = req
            .criteria
            .iter()
            .map(|criterion| build_where_condition(criterion, find(&criterion.column)?))
            .collect::<AppResult<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        if let Some(order_by) = req.order_by.as_deref().filter(|o| !o.is_empty()) {
            let column = find(order_by)?;
            sql.push_str(&format!(
                " ORDER BY {} {}",
                backquote(&column.field),
                req.order.as_sql()
            ));
        }
        Ok(sql)
    }
}

/// BIT values shown as binary digits.
fn printable_bit(value: &Value) -> Value {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(|bits| Value::String(format!("{bits:b}")))
            .unwrap_or_else(|| value.clone()),
        Value::String(s) => s
            .parse::<u64>()
            .map(|bits| Value::String(format!("{bits:b}")))
            .unwrap_or_else(|_| value.clone()),
        other => other.clone(),
    }
}

/// Literal for `value` compared against `column`.
fn literal(column: &ColumnFull, value: &str) -> String {
    let value = value.trim();
    if is_numeric_type(&column.base_type()) && is_numeric(value) {
        value.to_string()
    } else {
        quote_string(value)
    }
}

/// Condition for one criterion; `None` when the criterion is left empty.
pub fn build_where_condition(
    criterion: &SearchCriterion,
    column: &ColumnFull,
) -> AppResult<Option<String>> {
    let name = backquote(&column.field);
    let value = criterion.value.as_str();
    let operator = criterion.operator.trim();

    let condition = match operator {
        "IS NULL" | "IS NOT NULL" => format!("{name} {operator}"),
        "= ''" | "!= ''" => format!("{name} {operator}"),
        _ if value.is_empty() => return Ok(None),
        "LIKE %...%" => format!("{name} LIKE '%{}%'", escape_string(value)),
        "REGEXP ^...$" => format!("{name} REGEXP '^{}$'", escape_string(value)),
        "LIKE" | "NOT LIKE" | "REGEXP" | "NOT REGEXP" => {
            format!("{name} {operator} {}", quote_string(value))
        }
        "IN (...)" | "NOT IN (...)" => {
            let items = value
                .split(',')
                .map(|item| literal(column, item))
                .collect::<Vec<_>>()
                .join(", ");
            let keyword = operator.trim_end_matches(" (...)");
            format!("{name} {keyword} ({items})")
        }
        "BETWEEN" | "NOT BETWEEN" => {
            let bounds: Vec<&str> = value.split(',').collect();
            let [low, high] = bounds.as_slice() else {
                return Err(AppError::Validation(format!(
                    "{operator} needs two comma separated values"
                )));
            };
            format!(
                "{name} {operator} {} AND {}",
                literal(column, low),
                literal(column, high)
            )
        }
        "=" | ">" | ">=" | "<" | "<=" | "!=" | "<>" => {
            format!("{name} {operator} {}", literal(column, value))
        }
        other => {
            return Err(AppError::Validation(format!("Unsupported operator: {other}")));
        }
    };
    Ok(Some(condition))
}
