//! Content item model shared by blog posts and events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Opaque identifier of an item, unique within its collection
///
/// Ids compare by their displayed form, so `Number(42)` equals `Text("42")`.
/// Route segments, JSON numbers and Firestore document names can then all
/// name the same item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentId {
    Number(i64),
    Text(String),
}

impl ContentId {
    /// Build an id from a JSON value (number or string)
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_i64().map(ContentId::Number),
            serde_json::Value::String(s) if !s.trim().is_empty() => {
                Some(ContentId::Text(s.trim().to_string()))
            }
            _ => None,
        }
    }

    /// Whether the id can be used verbatim as a directory name
    pub fn is_path_safe(&self) -> bool {
        match self {
            ContentId::Number(_) => true,
            ContentId::Text(s) => s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
        }
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentId::Number(n) => write!(f, "{}", n),
            ContentId::Text(s) => f.write_str(s),
        }
    }
}

impl PartialEq for ContentId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ContentId::Number(a), ContentId::Number(b)) => a == b,
            (ContentId::Text(a), ContentId::Text(b)) => a == b,
            (ContentId::Number(n), ContentId::Text(s))
            | (ContentId::Text(s), ContentId::Number(n)) => *s == n.to_string(),
        }
    }
}

impl Eq for ContentId {}

impl Hash for ContentId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            ContentId::Number(n) => n.to_string().hash(state),
            ContentId::Text(s) => s.hash(state),
        }
    }
}

impl FromStr for ContentId {
    type Err = std::convert::Infallible;

    /// Route segments that round-trip as integers become numbers
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<i64>() {
            Ok(n) if n.to_string() == s => Ok(ContentId::Number(n)),
            _ => Ok(ContentId::Text(s.to_string())),
        }
    }
}

/// A reference to an image, resolved to a URL at render time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ImageRef {
    /// An image id served by the backend's blob endpoint
    Blob(String),
    /// A direct image URL
    Url(String),
}

/// A blog post or event record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,

    pub title: String,

    /// Body text, possibly containing simple markup
    pub body: String,

    /// Short teaser text
    pub summary: Option<String>,

    /// Author (posts) or host (events)
    pub author: Option<String>,

    /// Publication date, used for ordering and display
    pub published_at: Option<DateTime<Utc>>,

    pub cover_image: Option<ImageRef>,

    /// Secondary images, in display order
    pub gallery: Vec<ImageRef>,

    /// External meeting link for events
    pub meeting_link: Option<String>,
}

impl ContentItem {
    /// Create an item with only an id and a title
    pub fn new(id: ContentId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            body: String::new(),
            summary: None,
            author: None,
            published_at: None,
            cover_image: None,
            gallery: Vec::new(),
            meeting_link: None,
        }
    }

    /// Ordering for listings: newest first, undated items last
    pub fn newest_first(a: &ContentItem, b: &ContentItem) -> Ordering {
        match (&a.published_at, &b.published_at) {
            (Some(x), Some(y)) => y.cmp(x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Sort items newest first; the sort is stable so undated items keep source order
pub fn sort_newest_first(items: &mut [ContentItem]) {
    items.sort_by(ContentItem::newest_first);
}
