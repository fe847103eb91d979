//! Extraction of JSON payloads embedded in HTML pages.

/// Finds `marker` in `text` and returns the first complete JSON object that
/// starts after it.
///
/// Typical input is a `<script>` tag like
/// `window.__KEYWORD_DATA__ = {"keywords": [...]};` or a framework data tag
/// with the marker in its `id` attribute.
pub(crate) fn extract_json_after_marker<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let marker_pos = text.find(marker)?;
    let rest = &text[marker_pos + marker.len()..];
    let open = rest.find('{')?;
    extract_balanced_object(&rest[open..])
}

/// Try to extract a balanced JSON object from the start of `s`.
///
/// Scans `s` character-by-character tracking brace depth, respecting string
/// literals and escape sequences, so a `}` inside a string value never ends
/// the object early. Returns the shortest prefix of `s` that forms a complete
/// `{…}` object, or `None` if the object is unterminated.
pub(crate) fn extract_balanced_object(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            ']' => depth -= 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_after_marker() {
        let html = r#"<script>window.__KEYWORD_DATA__ = {"keywords":[{"keyword":"a"}]};</script>"#;
        let json = extract_json_after_marker(html, "__KEYWORD_DATA__").unwrap();
        assert_eq!(json, r#"{"keywords":[{"keyword":"a"}]}"#);
    }

    #[test]
    fn ignores_braces_inside_strings() {
        let html = r#"__KEYWORD_DATA__ {"note":"a } b","keywords":[]} trailing {"other":1}"#;
        let json = extract_json_after_marker(html, "__KEYWORD_DATA__").unwrap();
        assert_eq!(json, r#"{"note":"a } b","keywords":[]}"#);
        assert!(serde_json::from_str::<serde_json::Value>(json).is_ok());
    }

    #[test]
    fn handles_escaped_quotes() {
        let s = r#"{"q":"say \"}\" twice"} tail"#;
        assert_eq!(
            extract_balanced_object(s).unwrap(),
            r#"{"q":"say \"}\" twice"}"#
        );
    }

    #[test]
    fn stops_at_first_complete_object() {
        let html = r#"<script>__KEYWORD_DATA__={"a":1}</script><script>{"b":2}</script>"#;
        assert_eq!(
            extract_json_after_marker(html, "__KEYWORD_DATA__").unwrap(),
            r#"{"a":1}"#
        );
    }

    #[test]
    fn missing_marker_returns_none() {
        assert!(extract_json_after_marker(r#"{"a":1}"#, "__KEYWORD_DATA__").is_none());
    }

    #[test]
    fn unterminated_object_returns_none() {
        assert!(extract_balanced_object(r#"{"a":{"b":1}"#).is_none());
    }

    #[test]
    fn requires_leading_brace() {
        assert!(extract_balanced_object(r#" {"a":1}"#).is_none());
    }
}
