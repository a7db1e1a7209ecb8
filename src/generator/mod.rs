//! Generator module - writes the site as static HTML files
//!
//! Each collection is loaded once; listing pages and detail pages are then
//! rendered from that one load. A collection that fails to load aborts the
//! run, since a static page cannot offer a retry.

use anyhow::{bail, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::detail::DetailView;
use crate::helpers::{collection_url, item_url};
use crate::lister::ListingState;
use crate::pages::{Pages, RenderedPage};
use crate::Site;

/// What a run produced
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerateSummary {
    pub listing_pages: usize,
    pub detail_pages: usize,
    /// Items whose id cannot be used as a directory name
    pub skipped: usize,
}

/// Static site generator using Tera templates
pub struct Generator {
    pages: Pages,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site) -> Result<Self> {
        Ok(Self {
            pages: Pages::new(site.clone())?,
        })
    }

    fn site(&self) -> &Site {
        self.pages.site()
    }

    /// Generate the entire site
    pub async fn generate(&self) -> Result<GenerateSummary> {
        let public_dir = &self.site().public_dir;
        fs::create_dir_all(public_dir)?;

        self.copy_static_assets()?;

        let mut summary = GenerateSummary::default();
        for name in self.site().config.collections.keys() {
            self.generate_collection(name, &mut summary).await?;
        }

        self.generate_home()?;
        self.generate_not_found()?;

        Ok(summary)
    }

    /// Generate listing and detail pages for one collection
    async fn generate_collection(&self, name: &str, summary: &mut GenerateSummary) -> Result<()> {
        let site = self.site();
        let lister = site.lister(name)?;
        let state = lister.load().await;

        let listing = match &state {
            ListingState::Failed(failure) => {
                bail!("Failed to load collection {}: {}", name, failure.message)
            }
            ListingState::Loaded(listing) => Some(listing),
            _ => None,
        };

        let total_pages = listing
            .map(|l| l.total_pages(site.config.per_page))
            .unwrap_or(1);
        for page in 1..=total_pages {
            let rendered = self.pages.listing(name, &state, page)?;
            let dir = if page == 1 {
                self.public_path(name)
            } else {
                self.public_path(name).join("page").join(page.to_string())
            };
            write_page(&dir, &rendered)?;
            summary.listing_pages += 1;
        }

        let Some(listing) = listing else {
            return Ok(());
        };

        let renderer = site.detail_renderer(name, &lister)?;
        for card in listing.cards() {
            let id = &card.item.id;
            if !id.is_path_safe() {
                tracing::warn!("Skipping {} in {}: id cannot be a directory name", id, name);
                summary.skipped += 1;
                continue;
            }

            let url = item_url(&site.config, name, id);
            let related = self.pages.related_cards(name, listing, id);
            let view = DetailView::Found(Box::new(renderer.render(&card.item, 0)));
            let rendered = self.pages.detail(name, view, related, &url)?;
            write_page(&self.public_path(name).join(id.to_string()), &rendered)?;
            summary.detail_pages += 1;
        }

        tracing::info!(
            "Generated {} with {} items",
            name,
            listing.len()
        );
        Ok(())
    }

    /// `index.html` forwards to the first collection
    fn generate_home(&self) -> Result<()> {
        let site = self.site();
        let Some(first) = site.config.collections.keys().next() else {
            return Ok(());
        };
        let target = collection_url(&site.config, first);
        let html = format!(
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><meta http-equiv=\"refresh\" content=\"0; url={0}\"><link rel=\"canonical\" href=\"{0}\"></head><body><a href=\"{0}\">{1}</a></body></html>\n",
            target, site.config.title.replace('<', "&lt;")
        );
        let path = site.public_dir.join("index.html");
        fs::write(&path, html)?;
        tracing::debug!("Generated: {:?}", path);
        Ok(())
    }

    fn generate_not_found(&self) -> Result<()> {
        let rendered = self.pages.not_found(&self.pages.back_home(), None)?;
        let path = self.site().public_dir.join("404.html");
        fs::write(&path, rendered.html)?;
        tracing::debug!("Generated: {:?}", path);
        Ok(())
    }

    fn public_path(&self, collection: &str) -> PathBuf {
        self.site().public_dir.join(collection)
    }

    /// Copy the static directory to `public/static`
    fn copy_static_assets(&self) -> Result<()> {
        let static_dir = &self.site().static_dir;
        if !static_dir.exists() {
            return Ok(());
        }
        let dest_root = self.site().public_dir.join("static");

        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() {
                let relative = path.strip_prefix(static_dir)?;
                let dest = dest_root.join(relative);

                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)?;
                }

                fs::copy(path, &dest)?;
            }
        }

        Ok(())
    }
}

/// Write `dir/index.html`
fn write_page(dir: &Path, page: &RenderedPage) -> Result<()> {
    fs::create_dir_all(dir)
        .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", dir, e))?;
    let path = dir.join("index.html");
    fs::write(&path, &page.html)
        .map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", path, e))?;
    tracing::debug!("Generated: {:?}", path);
    Ok(())
}
