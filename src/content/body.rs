//! Body text formatting: paragraphs, simple lists, or sanitized markup

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::sanitize::{is_markup, sanitize_html};

lazy_static! {
    static ref BULLET_RE: Regex = Regex::new(r"^[-*•]\s*(.*)$").unwrap();
    static ref NUMBERED_RE: Regex = Regex::new(r"^\d+\.\s+(.*)$").unwrap();
}

/// A unit of formatted body text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    /// Prose; lines of the unit are kept
    Paragraph { lines: Vec<String> },
    List { ordered: bool, items: Vec<String> },
}

/// Formatted body of a detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormattedBody {
    /// Sanitized HTML, safe to insert as-is
    Markup { html: String },
    Blocks { blocks: Vec<Block> },
}

impl FormattedBody {
    pub fn is_empty(&self) -> bool {
        match self {
            FormattedBody::Markup { html } => html.trim().is_empty(),
            FormattedBody::Blocks { blocks } => blocks.is_empty(),
        }
    }
}

/// Format a body for display
pub fn format_body(body: &str) -> FormattedBody {
    if is_markup(body) {
        FormattedBody::Markup {
            html: sanitize_html(body),
        }
    } else {
        FormattedBody::Blocks {
            blocks: split_blocks(body),
        }
    }
}

enum LineKind {
    Bullet(String),
    Numbered(String),
    Prose(String),
}

fn classify(line: &str) -> LineKind {
    if let Some(caps) = NUMBERED_RE.captures(line) {
        return LineKind::Numbered(caps[1].trim().to_string());
    }
    if let Some(caps) = BULLET_RE.captures(line) {
        return LineKind::Bullet(caps[1].trim().to_string());
    }
    LineKind::Prose(line.to_string())
}

/// Split plain text into blocks on blank lines
pub fn split_blocks(body: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut prose: Vec<String> = Vec::new();
    let mut list: Option<(bool, Vec<String>)> = None;

    for line in body.lines().map(str::trim) {
        if line.is_empty() {
            flush_prose(&mut prose, &mut blocks);
            flush_list(&mut list, &mut blocks);
            continue;
        }

        let (ordered, text) = match classify(line) {
            LineKind::Prose(text) => {
                flush_list(&mut list, &mut blocks);
                prose.push(text);
                continue;
            }
            LineKind::Bullet(text) => (false, text),
            LineKind::Numbered(text) => (true, text),
        };

        flush_prose(&mut prose, &mut blocks);
        match list.as_mut() {
            Some((kind, items)) if *kind == ordered => items.push(text),
            _ => {
                flush_list(&mut list, &mut blocks);
                list = Some((ordered, vec![text]));
            }
        }
    }

    flush_prose(&mut prose, &mut blocks);
    flush_list(&mut list, &mut blocks);
    blocks
}

fn flush_prose(prose: &mut Vec<String>, blocks: &mut Vec<Block>) {
    if !prose.is_empty() {
        blocks.push(Block::Paragraph {
            lines: std::mem::take(prose),
        });
    }
}

fn flush_list(list: &mut Option<(bool, Vec<String>)>, blocks: &mut Vec<Block>) {
    if let Some((ordered, items)) = list.take() {
        blocks.push(Block::List { ordered, items });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(lines: &[&str]) -> Block {
        Block::Paragraph {
            lines: lines.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn list(ordered: bool, items: &[&str]) -> Block {
        Block::List {
            ordered,
            items: items.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        let blocks = split_blocks("First line\nstill first\n\n\nSecond");
        assert_eq!(
            blocks,
            vec![para(&["First line", "still first"]), para(&["Second"])]
        );
    }

    #[test]
    fn test_bullet_and_numbered_lists() {
        let body = "Why plan early:\n- Compounding\n* Discipline\n• Peace of mind\n\n1. Save\n2. Invest";
        assert_eq!(
            split_blocks(body),
            vec![
                para(&["Why plan early:"]),
                list(false, &["Compounding", "Discipline", "Peace of mind"]),
                list(true, &["Save", "Invest"]),
            ]
        );
    }

    #[test]
    fn test_list_kind_change_starts_new_list() {
        assert_eq!(
            split_blocks("- a\n1. b\n- c"),
            vec![list(false, &["a"]), list(true, &["b"]), list(false, &["c"])]
        );
    }

    #[test]
    fn test_prose_between_list_lines_splits_lists() {
        assert_eq!(
            split_blocks("- a\nnote\n- b"),
            vec![list(false, &["a"]), para(&["note"]), list(false, &["b"])]
        );
    }

    #[test]
    fn test_lists_in_separate_units_do_not_merge() {
        assert_eq!(
            split_blocks("- a\n\n- b"),
            vec![list(false, &["a"]), list(false, &["b"])]
        );
    }

    #[test]
    fn test_number_without_dot_space_is_prose() {
        assert_eq!(split_blocks("2024 was a good year"), vec![para(&["2024 was a good year"])]);
        assert_eq!(split_blocks("3.5% returns"), vec![para(&["3.5% returns"])]);
    }

    #[test]
    fn test_crlf_and_whitespace_only_separators() {
        assert_eq!(split_blocks("a\r\n\r\nb"), vec![para(&["a"]), para(&["b"])]);
        assert_eq!(split_blocks("a\n   \nb"), vec![para(&["a"]), para(&["b"])]);
    }

    #[test]
    fn test_markup_body_is_sanitized() {
        let body = format_body("<p>Hello</p><script>x()</script>");
        assert_eq!(
            body,
            FormattedBody::Markup {
                html: "<p>Hello</p>".to_string()
            }
        );
    }

    #[test]
    fn test_empty_body() {
        assert!(format_body("").is_empty());
        assert!(format_body("\n\n").is_empty());
    }
}
