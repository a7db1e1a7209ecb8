//! Firestore document collection source (REST API, read-only)

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use super::record::item_from_record;
use super::rest::get_json;
use super::{ContentSource, SourceError};
use crate::content::{ContentId, ContentItem};

const PAGE_SIZE: &str = "100";

/// Reads every document of a Firestore collection
pub struct FirestoreSource {
    client: reqwest::Client,
    collection_url: Url,
    api_key: Option<String>,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl Document {
    fn into_item(self) -> Option<ContentItem> {
        let id = self
            .name
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .map(|s| ContentId::Text(s.to_string()))?;
        let record: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), decode_value(v)))
            .collect();
        item_from_record(&record, Some(id))
    }
}

impl FirestoreSource {
    pub fn new(
        client: reqwest::Client,
        endpoint: &str,
        project_id: &str,
        collection: &str,
        api_key: Option<String>,
    ) -> Result<Self, SourceError> {
        let mut collection_url = Url::parse(endpoint)
            .map_err(|e| SourceError::InvalidConfig(format!("{}: {}", endpoint, e)))?;
        collection_url
            .path_segments_mut()
            .map_err(|_| SourceError::InvalidConfig(format!("{} cannot be a base", endpoint)))?
            .pop_if_empty()
            .extend(["projects", project_id, "databases", "(default)", "documents"])
            .extend(collection.split('/').filter(|s| !s.is_empty()));

        let name = format!("firestore {}/{}", project_id, collection);
        Ok(Self {
            client,
            collection_url,
            api_key,
            name,
        })
    }

    fn with_key(&self, mut url: Url) -> Url {
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        url
    }
}

#[async_trait]
impl ContentSource for FirestoreSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_collection(&self) -> Result<Vec<ContentItem>, SourceError> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.with_key(self.collection_url.clone());
            url.query_pairs_mut().append_pair("pageSize", PAGE_SIZE);
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            // A missing collection reads as empty.
            let Some(body) = get_json(&self.client, url.clone()).await? else {
                break;
            };
            let page: ListDocumentsResponse =
                serde_json::from_value(body).map_err(|e| SourceError::Decode {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

            for doc in page.documents {
                let name = doc.name.clone();
                match doc.into_item() {
                    Some(item) => items.push(item),
                    None => tracing::warn!("Skipping unreadable document {}", name),
                }
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(items)
    }

    async fn fetch_detail(&self, id: &ContentId) -> Result<Option<ContentItem>, SourceError> {
        let mut url = self.collection_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(&id.to_string());
        }
        let url = self.with_key(url);

        let Some(body) = get_json(&self.client, url.clone()).await? else {
            return Ok(None);
        };
        let doc: Document = serde_json::from_value(body).map_err(|e| SourceError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(doc.into_item())
    }

    /// Collection reads return whole documents
    fn detail_required(&self) -> bool {
        false
    }
}

/// Convert a typed Firestore value (`{"stringValue": "x"}`) into plain JSON
fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Value::Null;
    };

    match kind.as_str() {
        "stringValue" | "timestampValue" | "referenceValue" | "booleanValue" | "doubleValue" => {
            inner.clone()
        }
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or_else(|| inner.clone()),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(|fields| {
                    fields
                        .iter()
                        .map(|(k, v)| (k.clone(), decode_value(v)))
                        .collect()
                })
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ImageRef;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DOCS: &str = "/projects/demo/databases/(default)/documents/events";

    fn source(server: &MockServer) -> FirestoreSource {
        FirestoreSource::new(
            reqwest::Client::new(),
            &server.uri(),
            "demo",
            "events",
            Some("k3y".into()),
        )
        .unwrap()
    }

    fn event_doc(id: &str, title: &str, date: &str) -> Value {
        json!({
            "name": format!("projects/demo/databases/(default)/documents/events/{}", id),
            "fields": {
                "title": {"stringValue": title},
                "date": {"timestampValue": date},
                "gallery": {"arrayValue": {"values": [
                    {"stringValue": "https://cdn.example.com/a.jpg"}
                ]}}
            }
        })
    }

    #[test]
    fn test_decode_value() {
        assert_eq!(decode_value(&json!({"integerValue": "42"})), json!(42));
        assert_eq!(decode_value(&json!({"nullValue": null})), Value::Null);
        assert_eq!(
            decode_value(&json!({"mapValue": {"fields": {"url": {"stringValue": "u"}}}})),
            json!({"url": "u"})
        );
        assert_eq!(decode_value(&json!({"arrayValue": {}})), json!([]));
    }

    #[tokio::test]
    async fn test_fetch_collection_follows_page_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DOCS))
            .and(query_param("pageToken", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [event_doc("e2", "Second", "2024-02-01T00:00:00Z")]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(DOCS))
            .and(query_param("key", "k3y"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [event_doc("e1", "First", "2024-01-01T00:00:00Z")],
                "nextPageToken": "p2"
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        let items = source(&server).fetch_collection().await.unwrap();
        let ids: Vec<_> = items.iter().map(|i| i.id.to_string()).collect();
        assert_eq!(ids, vec!["e1", "e2"]);
        assert_eq!(
            items[0].gallery,
            vec![ImageRef::Url("https://cdn.example.com/a.jpg".into())]
        );
        assert!(items[0].published_at.is_some());
    }

    #[tokio::test]
    async fn test_empty_collection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DOCS))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        assert!(source(&server).fetch_collection().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/e9", DOCS)))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(event_doc("e9", "Nine", "2024-09-09")),
            )
            .mount(&server)
            .await;

        let src = source(&server);
        assert!(!src.detail_required());
        let item = src
            .fetch_detail(&ContentId::Text("e9".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.title, "Nine");

        let missing = src.fetch_detail(&ContentId::Text("nope".into())).await.unwrap();
        assert!(missing.is_none());
    }
}
