//! In-memory source, optionally loaded from a local YAML/JSON file

use async_trait::async_trait;
use serde_json::Value;
use std::fs;
use std::path::Path;

use super::record::item_from_record;
use super::{ContentSource, SourceError};
use crate::content::{ContentId, ContentItem};

/// Serves a fixed list of items
pub struct StaticSource {
    items: Vec<ContentItem>,
    name: String,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, items: Vec<ContentItem>) -> Self {
        Self {
            items,
            name: name.into(),
        }
    }

    /// Load a YAML (or JSON) list of records
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let records: Vec<Value> =
            serde_yaml::from_str(&content).map_err(|e| SourceError::Decode {
                url: path.display().to_string(),
                message: e.to_string(),
            })?;

        let mut items = Vec::with_capacity(records.len());
        for record in &records {
            match record.as_object().and_then(|r| item_from_record(r, None)) {
                Some(item) => items.push(item),
                None => tracing::warn!("Skipping record without an id in {:?}", path),
            }
        }
        tracing::debug!("Loaded {} items from {:?}", items.len(), path);

        Ok(Self::new(format!("file {}", path.display()), items))
    }
}

#[async_trait]
impl ContentSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_collection(&self) -> Result<Vec<ContentItem>, SourceError> {
        Ok(self.items.clone())
    }

    async fn fetch_detail(&self, id: &ContentId) -> Result<Option<ContentItem>, SourceError> {
        Ok(self.items.iter().find(|item| &item.id == id).cloned())
    }

    fn detail_required(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_yaml_records() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
- id: 1
  title: Welcome
  date: 2024-01-01
  content: |
    Hello

    - one
    - two
- title: skipped, no id
- id: launch
  title: Launch event
  thumbnailUrl: https://cdn.example.com/launch.jpg
"#
        )
        .unwrap();

        let source = StaticSource::load(file.path()).unwrap();
        let items = source.fetch_collection().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Welcome");
        assert!(items[0].published_at.is_some());

        let launch = source
            .fetch_detail(&ContentId::Text("launch".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(launch.title, "Launch event");
        assert!(source
            .fetch_detail(&ContentId::Number(99))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_fetch_detail_by_route_segment() {
        let source = StaticSource::new(
            "events",
            vec![ContentItem::new(ContentId::Text("42".into()), "Pension clinic")],
        );
        let id: ContentId = "42".parse().unwrap();
        let item = source.fetch_detail(&id).await.unwrap().unwrap();
        assert_eq!(item.title, "Pension clinic");
    }

    #[test]
    fn test_load_missing_file() {
        let err = StaticSource::load("/definitely/not/here.yml").err().unwrap();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
