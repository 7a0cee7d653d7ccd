//! HTML escaping for text interpolated into the notification email

/// Escape `&`, `<`, `>`, `"` and `'` for safe inclusion in HTML
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Turn line breaks into `<br>` tags
pub fn newlines_to_br(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\n', "<br>")
}

/// Escape multi-line text, keeping its line structure
pub fn escape_multiline(input: &str) -> String {
    newlines_to_br(&escape_html(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x" & 'y')</script>"#),
            "&lt;script&gt;alert(&quot;x&quot; &amp; &#39;y&#39;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("plain text"), "plain text");
    }

    #[test]
    fn test_ampersand_is_escaped_once() {
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
    }

    #[test]
    fn test_escape_multiline() {
        assert_eq!(
            escape_multiline("line one\r\nline <two>\nthree"),
            "line one<br>line &lt;two&gt;<br>three"
        );
    }
}
