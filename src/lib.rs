//! brochure-rs: a brochure website generator and server for remote content
//!
//! Blog posts and events are read from a REST backend, a Firestore document
//! collection or a local file, then rendered with embedded Tera templates,
//! either on request or as a static site.

pub mod commands;
pub mod config;
pub mod content;
pub mod detail;
pub mod generator;
pub mod helpers;
pub mod lister;
pub mod pages;
pub mod scheduling;
pub mod server;
pub mod source;
pub mod templates;

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use detail::{BackLink, DetailRenderer};
use helpers::{collection_url, DatePolicy};
use lister::ContentLister;
use scheduling::Scheduler;

/// The main site application
#[derive(Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Static assets directory
    pub static_dir: PathBuf,
    /// Date display policy shared by every page
    pub dates: DatePolicy,
    /// Booking call-to-action
    pub scheduler: Arc<dyn Scheduler>,
    client: reqwest::Client,
}

impl Site {
    /// Create a new site from a directory, reading `_config.yml` if present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Self::from_config(base_dir, config)
    }

    /// Create a site from an already loaded configuration
    pub fn from_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);
        let dates = DatePolicy::from_config(&config);
        let scheduler = scheduling::from_config(&config.scheduling);
        let client = source::http_client(Duration::from_secs(config.request_timeout_secs))?;

        Ok(Self {
            config,
            base_dir,
            public_dir,
            static_dir,
            dates,
            scheduler,
            client,
        })
    }

    /// Replace the booking call-to-action
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Build the lister for a configured collection
    pub fn lister(&self, name: &str) -> Result<ContentLister> {
        let collection = self
            .config
            .collection(name)
            .ok_or_else(|| anyhow!("Unknown collection: {}", name))?;
        let source = source::from_config(&collection.source, self.client.clone(), &self.base_dir)?;
        Ok(ContentLister::new(source, &self.config.fallback_image)
            .with_limit(collection.limit)
            .with_max_concurrent(self.config.max_concurrent_fetches))
    }

    /// Build the detail renderer for a collection, using the lister's image rules
    pub fn detail_renderer(&self, name: &str, lister: &ContentLister) -> Result<DetailRenderer> {
        let collection = self
            .config
            .collection(name)
            .ok_or_else(|| anyhow!("Unknown collection: {}", name))?;
        let back = BackLink {
            url: collection_url(&self.config, name),
            label: collection.title.clone(),
        };
        Ok(
            DetailRenderer::new(lister.resolver().clone(), self.dates.clone(), back)
                .with_default_author(collection.default_author.clone()),
        )
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
