//! String utilities for SQL building and HTML output.

pub mod enum_values;
pub mod html;
pub mod signing;
pub mod sql_analyzer;
pub mod sql_lexer;
pub mod sql_util;

pub use enum_values::{parse_enum_set_values, ValueOption};
pub use html::{escape_html, escape_text};
pub use signing::QuerySigner;
pub use sql_analyzer::{DropTarget, SqlAnalyzer, StatementKind};
pub use sql_util::{backquote, escape_mysql_wildcards, escape_string, is_numeric, quote_string};
