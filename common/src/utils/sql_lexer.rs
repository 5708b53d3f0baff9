//! A small MySQL lexer.
//!
//! Only as much as the admin tools need: it tells string literals,
//! backquoted identifiers and comments apart from the rest, so that
//! placeholders, delimiters and keywords are only recognised in code.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Whitespace,
    /// `-- ` or `#` comment, up to (not including) the newline.
    LineComment,
    /// `/* ... */` comment.
    BlockComment,
    /// `'...'` or `"..."` literal.
    String,
    /// `` `...` `` identifier.
    Identifier,
    /// Keyword, unquoted identifier or number.
    Word,
    /// `;`
    Delimiter,
    OpenParen,
    CloseParen,
    Symbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

impl Token<'_> {
    /// Whitespace or comment.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }

    /// Case-insensitive keyword match.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(keyword)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Splits `sql` into tokens. Unterminated literals and comments run to the end.
pub fn tokenize(sql: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chars = sql.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        let kind = match c {
            c if c.is_whitespace() => {
                while chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}
                TokenKind::Whitespace
            }
            '#' => {
                while chars.next_if(|&(_, c)| c != '\n').is_some() {}
                TokenKind::LineComment
            }
            '-' if sql[start..].starts_with("--")
                && sql[start + 2..]
                    .chars()
                    .next()
                    .map_or(true, |c| c.is_whitespace() || c.is_control()) =>
            {
                while chars.next_if(|&(_, c)| c != '\n').is_some() {}
                TokenKind::LineComment
            }
            '/' if sql[start..].starts_with("/*") => {
                chars.next();
                chars.next();
                let mut prev = '\0';
                for (_, c) in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                TokenKind::BlockComment
            }
            '\'' | '"' | '`' => {
                let quote = c;
                chars.next();
                while let Some((_, c)) = chars.next() {
                    if c == '\\' && quote != '`' {
                        chars.next();
                    } else if c == quote {
                        // A doubled quote continues the literal.
                        if chars.next_if(|&(_, n)| n == quote).is_none() {
                            break;
                        }
                    }
                }
                if quote == '`' {
                    TokenKind::Identifier
                } else {
                    TokenKind::String
                }
            }
            c if is_word_char(c) => {
                while chars.next_if(|&(_, c)| is_word_char(c)).is_some() {}
                TokenKind::Word
            }
            ';' => {
                chars.next();
                TokenKind::Delimiter
            }
            '(' => {
                chars.next();
                TokenKind::OpenParen
            }
            ')' => {
                chars.next();
                TokenKind::CloseParen
            }
            _ => {
                chars.next();
                TokenKind::Symbol
            }
        };

        let end = chars.peek().map_or(sql.len(), |&(i, _)| i);
        tokens.push(Token {
            kind,
            text: &sql[start..end],
        });
    }

    tokens
}

/// `/*! ... */` version comments and `/*+ ... */` optimizer hints are
/// executed by the server.
fn is_executable_comment(text: &str) -> bool {
    text.starts_with("/*!") || text.starts_with("/*+")
}

/// Single-line form used for execution: whitespace runs and comments become
/// one space, trailing delimiters are dropped. Executable comments stay.
pub fn normalize(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    for token in tokenize(sql) {
        let collapses = match token.kind {
            TokenKind::Whitespace | TokenKind::LineComment => true,
            TokenKind::BlockComment => !is_executable_comment(token.text),
            _ => false,
        };
        if !collapses {
            out.push_str(token.text);
        } else if !out.is_empty() && !out.ends_with(' ') {
            out.push(' ');
        }
    }
    out.trim_end_matches(|c: char| c == ';' || c == ' ')
        .to_string()
}

/// Splits a script into statements on `;` outside literals and comments.
/// Statements holding nothing but whitespace and comments are dropped.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut has_code = false;

    for token in tokenize(sql) {
        if token.kind == TokenKind::Delimiter {
            if has_code {
                statements.push(current.trim().to_string());
            }
            current.clear();
            has_code = false;
            continue;
        }
        has_code |= !token.is_trivia();
        current.push_str(token.text);
    }
    if has_code {
        statements.push(current.trim().to_string());
    }
    statements
}

/// Replaces `:name` placeholders with values.
///
/// Keys may be given with or without the leading colon. A placeholder runs
/// to the end of the identifier, so `:param` never matches `:param1`.
/// Placeholders inside literals and backquoted identifiers are left alone.
/// Numeric values are inserted verbatim, everything else as a quoted string.
pub fn substitute_parameters(sql: &str, parameters: &BTreeMap<String, String>) -> String {
    let lookup: BTreeMap<String, &String> = parameters
        .iter()
        .map(|(name, value)| (name.trim_start_matches(':').to_string(), value))
        .collect();

    let tokens = tokenize(sql);
    let mut out = String::with_capacity(sql.len());
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        if token.kind == TokenKind::Symbol && token.text == ":" {
            if let Some(next) = tokens.get(i + 1).filter(|t| t.kind == TokenKind::Word) {
                if let Some(value) = lookup.get(next.text) {
                    if super::sql_util::is_numeric(value) {
                        out.push_str(value);
                    } else {
                        out.push_str(&super::sql_util::quote_string(value));
                    }
                    i += 2;
                    continue;
                }
            }
        }
        out.push_str(token.text);
        i += 1;
    }
    out
}

/// Strips the quotes from a backquoted identifier; other text is returned as is.
pub fn unquote_identifier(text: &str) -> String {
    match text.strip_prefix('`').and_then(|t| t.strip_suffix('`')) {
        Some(inner) => inner.replace("``", "`"),
        None => text.to_string(),
    }
}
