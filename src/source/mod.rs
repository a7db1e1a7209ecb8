//! Data sources that content collections are read from
//!
//! Every backend (the REST API, a Firestore document collection, a local
//! file) sits behind [`ContentSource`], so listers and pages never care
//! where items come from.

mod file;
mod firestore;
mod record;
mod rest;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::SourceConfig;
use crate::content::{ContentId, ContentItem};

pub use file::StaticSource;
pub use firestore::FirestoreSource;
pub use record::item_from_record;
pub use rest::RestSource;

/// Errors raised while reading from a source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid source configuration: {0}")]
    InvalidConfig(String),
}

impl SourceError {
    /// Whether trying again later could succeed
    pub fn retryable(&self) -> bool {
        match self {
            SourceError::Transport(_) => true,
            SourceError::Status { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

/// A place content items are fetched from
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Read the collection, in source order
    async fn fetch_collection(&self) -> Result<Vec<ContentItem>, SourceError>;

    /// Read one item by id; `Ok(None)` when it does not exist
    async fn fetch_detail(&self, id: &ContentId) -> Result<Option<ContentItem>, SourceError>;

    /// Whether collection entries are summaries that need a detail fetch
    fn detail_required(&self) -> bool {
        true
    }

    /// Base URL that blob image ids are served under
    fn image_base(&self) -> Option<Url> {
        None
    }
}

/// Build an HTTP client with the configured timeout
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, SourceError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("brochure-rs/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Create the source a collection is configured with
pub fn from_config(
    config: &SourceConfig,
    client: reqwest::Client,
    base_dir: &Path,
) -> Result<Arc<dyn ContentSource>, SourceError> {
    let source: Arc<dyn ContentSource> = match config {
        SourceConfig::Rest {
            base_url,
            record_key,
        } => Arc::new(RestSource::new(client, base_url, record_key.clone())?),
        SourceConfig::Firestore {
            project_id,
            collection,
            endpoint,
            api_key,
        } => Arc::new(FirestoreSource::new(
            client,
            endpoint,
            project_id,
            collection,
            api_key.clone(),
        )?),
        SourceConfig::File { path } => Arc::new(StaticSource::load(base_dir.join(path))?),
    };
    Ok(source)
}
