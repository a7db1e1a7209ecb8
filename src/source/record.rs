//! Mapping loosely-shaped JSON records onto content items
//!
//! Backends disagree on field names (`content` vs `description`, `author`
//! vs `host`, ...). The first key present in each list below wins.

use serde_json::{Map, Value};

use crate::content::timestamp::parse_timestamp;
use crate::content::{ContentId, ContentItem, ImageRef};

const TITLE_KEYS: &[&str] = &["title", "name"];
const BODY_KEYS: &[&str] = &["content", "body", "description"];
const SUMMARY_KEYS: &[&str] = &["summary", "excerpt"];
const AUTHOR_KEYS: &[&str] = &["author", "host"];
const DATE_KEYS: &[&str] = &["publishedAt", "published_at", "created_at", "createdAt", "date"];
const COVER_ID_KEYS: &[&str] = &["cover_image_id", "coverImageId"];
const COVER_URL_KEYS: &[&str] = &["coverImage", "cover_image", "thumbnailUrl", "image"];
const GALLERY_KEYS: &[&str] = &["gallery", "images"];
const MEETING_KEYS: &[&str] = &["meetingLink", "meeting_link"];

/// Build an item from a record; `id` overrides the record's own `id` field
pub fn item_from_record(record: &Map<String, Value>, id: Option<ContentId>) -> Option<ContentItem> {
    let id = id.or_else(|| record.get("id").and_then(ContentId::from_json))?;

    let mut item = ContentItem::new(id, first_text(record, TITLE_KEYS).unwrap_or_default());
    item.body = first_text(record, BODY_KEYS).unwrap_or_default();
    item.summary = first_text(record, SUMMARY_KEYS);
    item.author = first_text(record, AUTHOR_KEYS);
    item.published_at = DATE_KEYS
        .iter()
        .filter_map(|k| record.get(*k))
        .find_map(parse_timestamp);
    item.cover_image = first_value(record, COVER_ID_KEYS)
        .and_then(blob_id)
        .map(ImageRef::Blob)
        .or_else(|| first_text(record, COVER_URL_KEYS).map(ImageRef::Url));
    item.gallery = first_value(record, GALLERY_KEYS)
        .map(image_refs)
        .unwrap_or_default();
    item.meeting_link = first_text(record, MEETING_KEYS);

    Some(item)
}

/// Parse an image list: strings are URLs, objects carry an `id` or a `url`
pub fn image_refs(value: &Value) -> Vec<ImageRef> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(url) => Some(ImageRef::Url(url.trim().to_string())),
            Value::Object(obj) => obj
                .get("id")
                .and_then(blob_id)
                .map(ImageRef::Blob)
                .or_else(|| {
                    obj.get("url")
                        .and_then(Value::as_str)
                        .map(|u| ImageRef::Url(u.trim().to_string()))
                }),
            _ => None,
        })
        .collect()
}

fn first_value<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .find(|v| !v.is_null())
}

fn first_text(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn blob_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}
