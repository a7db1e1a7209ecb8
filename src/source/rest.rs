//! REST backend source (`GET /<resource>`, `GET /<resource>/<id>`)

use async_trait::async_trait;
use serde_json::{Map, Value};
use url::Url;

use super::record::{image_refs, item_from_record};
use super::{ContentSource, SourceError};
use crate::content::{ContentId, ContentItem};

/// Reads items from a JSON REST API
pub struct RestSource {
    client: reqwest::Client,
    base: Url,
    record_key: Option<String>,
    name: String,
}

impl RestSource {
    /// `base_url` is the collection endpoint, e.g. `https://host/api/blogs`
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        record_key: Option<String>,
    ) -> Result<Self, SourceError> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| SourceError::InvalidConfig(format!("{}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(SourceError::InvalidConfig(format!(
                "{} cannot be used as a base URL",
                base_url
            )));
        }
        let name = format!("rest {}", base);
        Ok(Self {
            client,
            base,
            record_key,
            name,
        })
    }

    fn detail_url(&self, id: &ContentId) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&id.to_string());
        }
        url
    }

    /// Pick the record out of a detail response
    fn detail_record<'a>(&self, body: &'a Map<String, Value>) -> Option<&'a Map<String, Value>> {
        if let Some(key) = &self.record_key {
            return body.get(key).and_then(Value::as_object);
        }
        if body.contains_key("id") {
            return Some(body);
        }
        body.iter()
            .filter(|(k, _)| k.as_str() != "images")
            .find_map(|(_, v)| v.as_object())
    }
}

#[async_trait]
impl ContentSource for RestSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_collection(&self) -> Result<Vec<ContentItem>, SourceError> {
        let url = self.base.clone();
        let body = get_json(&self.client, url.clone())
            .await?
            .ok_or_else(|| SourceError::Status {
                status: reqwest::StatusCode::NOT_FOUND,
                url: url.to_string(),
            })?;

        let entries = match &body {
            Value::Array(entries) => entries,
            Value::Object(obj) => match obj.get("data") {
                Some(Value::Array(entries)) => entries,
                _ => {
                    return Err(SourceError::Decode {
                        url: url.to_string(),
                        message: "expected a `data` array".to_string(),
                    })
                }
            },
            _ => {
                return Err(SourceError::Decode {
                    url: url.to_string(),
                    message: "expected an array of items".to_string(),
                })
            }
        };

        let items = entries
            .iter()
            .filter_map(|entry| {
                let item = entry.as_object().and_then(|rec| item_from_record(rec, None));
                if item.is_none() {
                    tracing::warn!("Skipping record without an id from {}", url);
                }
                item
            })
            .collect();
        Ok(items)
    }

    async fn fetch_detail(&self, id: &ContentId) -> Result<Option<ContentItem>, SourceError> {
        let url = self.detail_url(id);
        let Some(body) = get_json(&self.client, url.clone()).await? else {
            return Ok(None);
        };

        let decode_error = |message: &str| SourceError::Decode {
            url: url.to_string(),
            message: message.to_string(),
        };

        let body = body
            .as_object()
            .ok_or_else(|| decode_error("expected an object"))?;
        let record = self
            .detail_record(body)
            .ok_or_else(|| decode_error("no item record in response"))?;

        let mut item = if record.contains_key("id") {
            item_from_record(record, None)
        } else {
            item_from_record(record, Some(id.clone()))
        }
        .ok_or_else(|| decode_error("item record has no usable id"))?;

        if let Some(images) = body.get("images") {
            let refs = image_refs(images);
            if !refs.is_empty() {
                item.gallery = refs;
            }
        }

        Ok(Some(item))
    }

    fn image_base(&self) -> Option<Url> {
        Some(self.base.clone())
    }
}

/// GET a JSON document; `Ok(None)` on 404
pub(super) async fn get_json(
    client: &reqwest::Client,
    url: Url,
) -> Result<Option<Value>, SourceError> {
    tracing::debug!("GET {}", url);
    let response = client.get(url.clone()).send().await?;
    let status = response.status();

    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(SourceError::Status {
            status,
            url: url.to_string(),
        });
    }

    let value = response
        .json::<Value>()
        .await
        .map_err(|e| SourceError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })?;
    Ok(Some(value))
}
