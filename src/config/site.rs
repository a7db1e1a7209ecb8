//! Site configuration (_config.yml)

use anyhow::{bail, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub language: String,
    pub timezone: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,
    pub static_dir: String,

    // Presentation
    pub fallback_image: String,
    pub date_format: String,
    pub excerpt_length: usize,
    pub featured_excerpt_length: usize,
    pub per_page: usize,
    pub related_count: usize,

    // Fetching
    pub max_concurrent_fetches: usize,
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub scheduling: SchedulingConfig,

    /// Content collections, in navigation order
    #[serde(default)]
    pub collections: IndexMap<String, CollectionConfig>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Brochure".to_string(),
            subtitle: String::new(),
            description: String::new(),
            language: "en".to_string(),
            timezone: String::new(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            fallback_image: crate::content::FALLBACK_IMAGE.to_string(),
            date_format: "DD MMM YYYY".to_string(),
            excerpt_length: 140,
            featured_excerpt_length: 200,
            per_page: 9,
            related_count: 3,

            max_concurrent_fetches: 8,
            request_timeout_secs: 15,

            scheduling: SchedulingConfig::default(),
            collections: IndexMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make every page unrenderable
    pub fn validate(&self) -> Result<()> {
        if self.per_page == 0 {
            bail!("per_page must be at least 1");
        }
        if self.max_concurrent_fetches == 0 {
            bail!("max_concurrent_fetches must be at least 1");
        }
        if !crate::helpers::is_valid_date_format(&self.date_format) {
            bail!("invalid date_format: {:?}", self.date_format);
        }
        for (name, collection) in &self.collections {
            if name.is_empty() || name.contains('/') || name == "static" || name == "schedule" {
                bail!("invalid collection name: {:?}", name);
            }
            collection.source.validate(name)?;
        }
        Ok(())
    }

    /// Look up a collection by its route name
    pub fn collection(&self, name: &str) -> Option<&CollectionConfig> {
        self.collections.get(name)
    }
}

/// A single content collection (blog, events, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    /// Shown on detail pages when an item has no author/host
    #[serde(default)]
    pub default_author: Option<String>,
    /// Maximum number of items shown; the newest are kept
    #[serde(default)]
    pub limit: Option<usize>,
    pub source: SourceConfig,
}

/// Where a collection's items come from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Rest {
        base_url: String,
        #[serde(default)]
        record_key: Option<String>,
    },
    Firestore {
        project_id: String,
        collection: String,
        #[serde(default = "default_firestore_endpoint")]
        endpoint: String,
        #[serde(default)]
        api_key: Option<String>,
    },
    File {
        path: String,
    },
}

fn default_firestore_endpoint() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

impl SourceConfig {
    fn validate(&self, collection: &str) -> Result<()> {
        match self {
            SourceConfig::Rest { base_url, .. } => {
                if url::Url::parse(base_url).is_err() {
                    bail!("collection {}: invalid base_url {:?}", collection, base_url);
                }
            }
            SourceConfig::Firestore {
                project_id,
                collection: name,
                endpoint,
                ..
            } => {
                if project_id.is_empty() || name.is_empty() {
                    bail!("collection {}: firestore needs project_id and collection", collection);
                }
                if url::Url::parse(endpoint).is_err() {
                    bail!("collection {}: invalid endpoint {:?}", collection, endpoint);
                }
            }
            SourceConfig::File { path } => {
                if path.is_empty() {
                    bail!("collection {}: file source needs a path", collection);
                }
            }
        }
        Ok(())
    }
}

/// Booking link shown as the call to action
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    pub url: Option<String>,
    pub label: Option<String>,
}
