//! Statement classification.
//!
//! Decides how a statement is executed and displayed: whether it returns
//! rows, whether a page `LIMIT` can be appended and what a `DROP` removes.

use super::sql_lexer::{tokenize, unquote_identifier, Token, TokenKind};

/// Leading verb of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Show,
    Explain,
    Describe,
    Insert,
    Update,
    Delete,
    Replace,
    Create,
    Alter,
    Drop,
    Truncate,
    Use,
    Other,
}

/// Object removed by `DROP DATABASE`, `DROP TABLE` or `ALTER TABLE ... DROP`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Database(String),
    Table {
        database: Option<String>,
        table: String,
    },
    Column {
        database: Option<String>,
        table: String,
        column: String,
    },
}

/// `ALTER TABLE ... DROP <word>` forms that do not remove a column.
const NON_COLUMN_DROPS: &[&str] = &[
    "INDEX", "KEY", "PRIMARY", "FOREIGN", "CHECK", "CONSTRAINT", "PARTITION",
];

pub struct SqlAnalyzer;

/// Tokens with whitespace and comments removed.
fn code_tokens(sql: &str) -> Vec<Token<'_>> {
    tokenize(sql).into_iter().filter(|t| !t.is_trivia()).collect()
}

/// Cursor over the code tokens of a statement.
struct Cursor<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(sql: &'a str) -> Self {
        Self {
            tokens: code_tokens(sql),
            pos: 0,
        }
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        self.tokens
            .get(self.pos)
            .is_some_and(|t| t.is_keyword(keyword))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let found = self.peek_keyword(keyword);
        if found {
            self.pos += 1;
        }
        found
    }

    fn eat_symbol(&mut self, symbol: &str) -> bool {
        let found = self
            .tokens
            .get(self.pos)
            .is_some_and(|t| t.kind == TokenKind::Symbol && t.text == symbol);
        if found {
            self.pos += 1;
        }
        found
    }

    fn eat_if_exists(&mut self) {
        if self.eat_keyword("IF") {
            self.eat_keyword("EXISTS");
        }
    }

    fn name(&mut self) -> Option<String> {
        let token = self.tokens.get(self.pos)?;
        if !matches!(token.kind, TokenKind::Word | TokenKind::Identifier) {
            return None;
        }
        self.pos += 1;
        Some(unquote_identifier(token.text))
    }

    /// `name` or `db.name`.
    fn qualified_name(&mut self) -> Option<(Option<String>, String)> {
        let first = self.name()?;
        if self.eat_symbol(".") {
            let second = self.name()?;
            return Some((Some(first), second));
        }
        Some((None, first))
    }

    /// Moves past the next comma outside parentheses; false at the end.
    fn skip_past_comma(&mut self) -> bool {
        let mut depth = 0usize;
        while let Some(token) = self.tokens.get(self.pos) {
            self.pos += 1;
            match token.kind {
                TokenKind::OpenParen => depth += 1,
                TokenKind::CloseParen => depth = depth.saturating_sub(1),
                TokenKind::Symbol if depth == 0 && token.text == "," => return true,
                _ => {}
            }
        }
        false
    }
}

impl SqlAnalyzer {
    pub fn kind(sql: &str) -> StatementKind {
        let first = code_tokens(sql)
            .into_iter()
            .find(|t| t.kind != TokenKind::OpenParen);
        let Some(first) = first.filter(|t| t.kind == TokenKind::Word) else {
            return StatementKind::Other;
        };

        match first.text.to_ascii_uppercase().as_str() {
            "SELECT" | "WITH" | "TABLE" | "VALUES" => StatementKind::Select,
            "SHOW" => StatementKind::Show,
            "EXPLAIN" | "ANALYZE" => StatementKind::Explain,
            "DESCRIBE" | "DESC" => StatementKind::Describe,
            "INSERT" => StatementKind::Insert,
            "UPDATE" => StatementKind::Update,
            "DELETE" => StatementKind::Delete,
            "REPLACE" => StatementKind::Replace,
            "CREATE" => StatementKind::Create,
            "ALTER" => StatementKind::Alter,
            "DROP" => StatementKind::Drop,
            "TRUNCATE" => StatementKind::Truncate,
            "USE" => StatementKind::Use,
            _ => StatementKind::Other,
        }
    }

    /// Checks if the SQL is a SELECT query.
    pub fn is_select(sql: &str) -> bool {
        Self::kind(sql) == StatementKind::Select
    }

    /// Whether the statement produces a result set.
    pub fn returns_rows(sql: &str) -> bool {
        matches!(
            Self::kind(sql),
            StatementKind::Select
                | StatementKind::Show
                | StatementKind::Explain
                | StatementKind::Describe
        )
    }

    /// Whether `keyword` occurs outside parentheses, literals and comments.
    pub fn has_top_level_keyword(sql: &str, keyword: &str) -> bool {
        let mut depth = 0usize;
        for token in code_tokens(sql) {
            match token.kind {
                TokenKind::OpenParen => depth += 1,
                TokenKind::CloseParen => depth = depth.saturating_sub(1),
                _ if depth == 0 && token.is_keyword(keyword) => return true,
                _ => {}
            }
        }
        false
    }

    /// A SELECT that can take a page `LIMIT`: no LIMIT of its own, no INTO.
    pub fn can_paginate(sql: &str) -> bool {
        Self::is_select(sql)
            && !Self::has_top_level_keyword(sql, "LIMIT")
            && !Self::has_top_level_keyword(sql, "INTO")
    }

    /// Every database, table or column the statement removes.
    pub fn drop_targets(sql: &str) -> Vec<DropTarget> {
        let mut cursor = Cursor::new(sql);
        if cursor.eat_keyword("DROP") {
            Self::dropped_objects(&mut cursor)
        } else if cursor.eat_keyword("ALTER") {
            Self::dropped_columns(&mut cursor)
        } else {
            Vec::new()
        }
    }

    fn dropped_objects(cursor: &mut Cursor<'_>) -> Vec<DropTarget> {
        cursor.eat_keyword("TEMPORARY");
        if cursor.eat_keyword("DATABASE") || cursor.eat_keyword("SCHEMA") {
            cursor.eat_if_exists();
            return cursor.name().map(DropTarget::Database).into_iter().collect();
        }
        if !cursor.eat_keyword("TABLE") {
            return Vec::new();
        }
        cursor.eat_if_exists();

        let mut targets = Vec::new();
        while let Some((database, table)) = cursor.qualified_name() {
            targets.push(DropTarget::Table { database, table });
            if !cursor.eat_symbol(",") {
                break;
            }
        }
        targets
    }

    fn dropped_columns(cursor: &mut Cursor<'_>) -> Vec<DropTarget> {
        cursor.eat_keyword("ONLINE");
        cursor.eat_keyword("IGNORE");
        if !cursor.eat_keyword("TABLE") {
            return Vec::new();
        }
        let Some((database, table)) = cursor.qualified_name() else {
            return Vec::new();
        };

        let mut targets = Vec::new();
        loop {
            let drops_column = cursor.eat_keyword("DROP")
                && !NON_COLUMN_DROPS.iter().any(|k| cursor.peek_keyword(k));
            if drops_column {
                cursor.eat_keyword("COLUMN");
                cursor.eat_if_exists();
                if let Some(column) = cursor.name() {
                    targets.push(DropTarget::Column {
                        database: database.clone(),
                        table: table.clone(),
                        column,
                    });
                }
            }
            if !cursor.skip_past_comma() {
                break;
            }
        }
        targets
    }
}
