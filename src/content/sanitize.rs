//! Sanitizing remote markup before it reaches a page

use ammonia::Builder;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

/// Tags that survive sanitizing; everything else is stripped
pub const ALLOWED_TAGS: &[&str] = &["a", "b", "br", "em", "i", "li", "ol", "p", "strong", "ul"];

lazy_static! {
    static ref MARKUP_RE: Regex = Regex::new(r"(?i)</?[a-z][\s\S]*>").unwrap();
}

/// Whether a text looks like it contains HTML tags
pub fn is_markup(s: &str) -> bool {
    MARKUP_RE.is_match(s)
}

/// Sanitize remote markup against the fixed tag allow-list
pub fn sanitize_html(html: &str) -> String {
    let tags: HashSet<&str> = ALLOWED_TAGS.iter().copied().collect();
    let schemes: HashSet<&str> = ["http", "https", "mailto"].into_iter().collect();
    let generic: HashSet<&str> = HashSet::new();
    let mut tag_attributes = std::collections::HashMap::new();
    tag_attributes.insert("a", ["href", "title"].into_iter().collect::<HashSet<&str>>());

    Builder::default()
        .tags(tags)
        .generic_attributes(generic)
        .tag_attributes(tag_attributes)
        .url_schemes(schemes)
        .link_rel(Some("noopener noreferrer"))
        .clean(html)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_markup() {
        assert!(is_markup("<p>Hello</p>"));
        assert!(is_markup("line one<br/>line two"));
        assert!(!is_markup("1 < 2 and 3 > 2"));
        assert!(!is_markup("plain text"));
    }

    #[test]
    fn test_keeps_allowed_tags() {
        let clean = sanitize_html("<p>A <strong>bold</strong> <em>move</em></p><ul><li>x</li></ul>");
        assert_eq!(
            clean,
            "<p>A <strong>bold</strong> <em>move</em></p><ul><li>x</li></ul>"
        );
    }

    #[test]
    fn test_strips_scripts_and_handlers() {
        let clean = sanitize_html(r#"<p onclick="steal()">Hi<script>alert(1)</script></p><img src=x onerror=alert(1)>"#);
        assert!(!clean.contains("script"));
        assert!(!clean.contains("onclick"));
        assert!(!clean.contains("onerror"));
        assert!(!clean.contains("<img"));
        assert!(clean.contains("<p>Hi</p>"));
    }

    #[test]
    fn test_links_are_restricted() {
        let clean = sanitize_html(r#"<a href="javascript:alert(1)">bad</a> <a href="https://example.com" target="_top">good</a>"#);
        assert!(!clean.contains("javascript"));
        assert!(!clean.contains("target"));
        assert!(clean.contains(r#"href="https://example.com""#));
        assert!(clean.contains(r#"rel="noopener noreferrer""#));
    }

    #[test]
    fn test_disallowed_container_keeps_text() {
        let clean = sanitize_html("<div><h1>Title</h1><p>Body</p></div>");
        assert_eq!(clean, "Title<p>Body</p>");
    }
}
