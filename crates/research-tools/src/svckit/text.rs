//! Text helpers shared by the tools

/// Cap `text` at `max` characters, on a char boundary
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}... [truncated]", &text[..cut]),
        None => text.to_string(),
    }
}

/// Collapse runs of whitespace (including newlines) into single spaces
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode the handful of entities XML feeds use
pub(crate) fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Inner text of every `<tag ...>...</tag>` element in `xml`, in order
pub(crate) fn tag_texts<'a>(xml: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut found = Vec::new();
    let mut rest = xml;

    while let Some(start) = rest.find(&open) {
        let after = &rest[start + open.len()..];
        // Reject longer tag names sharing the prefix (`<name` vs `<namespace`).
        if !after.starts_with(['>', ' ', '\t', '\n', '\r']) {
            rest = after;
            continue;
        }
        let Some(gt) = after.find('>') else { break };
        let body = &after[gt + 1..];
        let Some(end) = body.find(&close) else { break };
        found.push(&body[..end]);
        rest = &body[end + close.len()..];
    }
    found
}

/// Inner text of the first `<tag>` element
pub(crate) fn tag_text<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    tag_texts(xml, tag).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc... [truncated]");
        assert_eq!(truncate_chars("ééé", 2), "éé... [truncated]");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a\n  b\tc  "), "a b c");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("A &amp; B &lt;x&gt;"), "A & B <x>");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_tag_texts() {
        let xml = r#"<author><name>A</name></author><namespace>x</namespace><name type="x">B</name>"#;
        assert_eq!(tag_texts(xml, "name"), vec!["A", "B"]);
        assert_eq!(tag_text(xml, "missing"), None);
    }
}
