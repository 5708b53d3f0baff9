//! Decoding of `enum(...)` / `set(...)` column definitions.

use serde::Serialize;

/// Splits an enum or set definition into its values.
///
/// Quoting is undone: `''` and `\'` give `'`, `\\` gives `\`. Any other
/// character inside a value is kept as is, including a lone backslash.
/// Text outside quotes is ignored, so the `enum(` prefix and separators do
/// not need stripping first. An unterminated trailing value is kept when
/// non-empty.
pub fn parse_enum_set_values(definition: &str) -> Vec<String> {
    let chars: Vec<char> = definition.chars().collect();
    let mut values = Vec::new();
    let mut buffer = String::new();
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let curr = chars[i];
        let next = chars.get(i + 1).copied();

        if !in_string {
            if curr == '\'' {
                in_string = true;
            }
        } else if curr == '\\' && next == Some('\\') {
            buffer.push('\\');
            i += 1;
        } else if (curr == '\'' || curr == '\\') && next == Some('\'') {
            buffer.push('\'');
            i += 1;
        } else if curr == '\'' {
            in_string = false;
            values.push(std::mem::take(&mut buffer));
        } else {
            buffer.push(curr);
        }
        i += 1;
    }

    if !buffer.is_empty() {
        values.push(buffer);
    }
    values
}

/// A value offered in a dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueOption {
    pub value: String,
    pub selected: bool,
}

impl ValueOption {
    /// Options for an enum column: only an exact match is selected.
    pub fn for_enum(values: Vec<String>, current: &str) -> Vec<Self> {
        values
            .into_iter()
            .map(|value| Self {
                selected: value == current,
                value,
            })
            .collect()
    }

    /// Options for a set column: every member of the comma-separated
    /// current value is selected.
    pub fn for_set(values: Vec<String>, current: &str) -> Vec<Self> {
        let chosen: Vec<&str> = current.split(',').collect();
        values
            .into_iter()
            .map(|value| Self {
                selected: chosen.contains(&value.as_str()),
                value,
            })
            .collect()
    }
}
