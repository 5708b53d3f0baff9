//! Quoting and escaping helpers for building SQL text.

/// Wraps an identifier in backquotes, doubling embedded backquotes.
pub fn backquote(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

/// Escapes a string literal body the way the MySQL client library does.
pub fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\x1a' => out.push_str("\\Z"),
            other => out.push(other),
        }
    }
    out
}

/// Escapes and single-quotes a string literal.
pub fn quote_string(value: &str) -> String {
    format!("'{}'", escape_string(value))
}

/// Escapes `_` and `%` so a name matches itself in a `LIKE` pattern.
pub fn escape_mysql_wildcards(name: &str) -> String {
    name.replace('_', "\\_").replace('%', "\\%")
}

/// Reverses [`escape_mysql_wildcards`].
pub fn unescape_mysql_wildcards(pattern: &str) -> String {
    pattern.replace("\\_", "_").replace("\\%", "%")
}

/// Whether a `LIKE` pattern contains a wildcard not preceded by a backslash.
pub fn has_unescaped_wildcards(pattern: &str) -> bool {
    let mut escaped = false;
    for c in pattern.chars() {
        match c {
            '\\' if !escaped => escaped = true,
            '%' | '_' if !escaped => return true,
            _ => escaped = false,
        }
    }
    false
}

/// Numeric string test with the usual web-form semantics: surrounding
/// whitespace, an optional sign, a decimal mantissa and an optional exponent.
pub fn is_numeric(value: &str) -> bool {
    let s = value.trim_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c'));
    let bytes = s.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;

    let mut frac_digits = 0;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        frac_digits = i - frac_start;
    }

    if int_digits == 0 && frac_digits == 0 {
        return false;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+') | Some(b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}
