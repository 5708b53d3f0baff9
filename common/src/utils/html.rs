//! HTML escaping.

/// Escapes text for use in element content and quoted attributes.
///
/// Already-escaped entities are escaped again: `&amp;` becomes `&amp;amp;`.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

/// Escapes text for element content only: quotes are left as they are.
pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_markup_and_quotes() {
        assert_eq!(
            escape_html(r#"<a href="x">'y'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#039;y&#039;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_text_keeps_quotes() {
        assert_eq!(
            escape_text("WHERE a = 'x' AND b < \"y\" & c"),
            "WHERE a = 'x' AND b &lt; \"y\" &amp; c"
        );
    }

    #[test]
    fn test_no_double_encode_protection() {
        assert_eq!(escape_html("vrai&amp"), "vrai&amp;amp");
    }

    #[test]
    fn test_leaves_backslashes_and_multibyte_alone() {
        assert_eq!(escape_html("\\漢字"), "\\漢字");
    }
}
