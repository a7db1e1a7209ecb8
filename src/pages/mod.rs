//! Page assembly shared by the server and the static generator
//!
//! Takes lister and detail states, builds template data, and renders it with
//! the embedded templates. Each rendered page carries a [`PageStatus`] so the
//! server can pick a status code and the generator can refuse to publish a
//! failed collection.

use anyhow::Result;
use tera::Context;

use crate::content::ContentId;
use crate::detail::{BackLink, DetailView};
use crate::helpers::{absolute_url, collection_page_url, collection_url, item_url, url_for};
use crate::lister::{Listing, ListingState, LoadFailure};
use crate::templates::{
    BookingData, CardData, CollectionData, DetailData, FailedData, ListingData, NavItem,
    PaginationData, SiteData, TemplateRenderer,
};
use crate::Site;

/// Outcome class of a rendered page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Ok,
    NotFound,
    /// The content could not be loaded; retrying may help
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub status: PageStatus,
    pub html: String,
}

/// Renders every page of a site
pub struct Pages {
    site: Site,
    renderer: TemplateRenderer,
}

impl Pages {
    pub fn new(site: Site) -> Result<Self> {
        Ok(Self {
            site,
            renderer: TemplateRenderer::new()?,
        })
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Site-wide template data; `active` marks the current collection in the menu
    pub fn site_data(&self, active: Option<&str>) -> SiteData {
        let config = &self.site.config;
        let scheduler = &self.site.scheduler;
        SiteData {
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            description: config.description.clone(),
            language: config.language.clone(),
            root: url_for(config, ""),
            static_url: url_for(config, "static"),
            menu: config
                .collections
                .iter()
                .map(|(name, collection)| NavItem {
                    title: collection.title.clone(),
                    url: collection_url(config, name),
                    active: Some(name.as_str()) == active,
                })
                .collect(),
            booking: scheduler.booking_url().map(|url| BookingData {
                url: url.to_string(),
                label: scheduler.label().to_string(),
            }),
            current_year: chrono::Utc::now().format("%Y").to_string(),
        }
    }

    fn collection_data(&self, name: &str) -> Option<CollectionData> {
        let collection = self.site.config.collection(name)?;
        Some(CollectionData {
            name: name.to_string(),
            title: collection.title.clone(),
            subtitle: collection.subtitle.clone(),
            url: collection_url(&self.site.config, name),
        })
    }

    fn base_context(&self, active: Option<&str>, link: Option<&str>) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site_data(active));
        context.insert(
            "canonical",
            &link.map(|link| absolute_url(&self.site.config, link)),
        );
        if let Some(collection) = active.and_then(|name| self.collection_data(name)) {
            context.insert("collection", &collection);
        }
        context
    }

    /// Link back to a collection's listing
    pub fn back_to(&self, collection: &str) -> BackLink {
        match self.site.config.collection(collection) {
            Some(c) => BackLink {
                url: collection_url(&self.site.config, collection),
                label: c.title.clone(),
            },
            None => self.back_home(),
        }
    }

    pub fn back_home(&self) -> BackLink {
        BackLink {
            url: url_for(&self.site.config, ""),
            label: self.site.config.title.clone(),
        }
    }

    /// Card data for listing `cards`
    fn card(&self, collection: &str, card: &crate::lister::Card, excerpt_length: usize) -> CardData {
        CardData::new(
            card,
            item_url(&self.site.config, collection, &card.item.id),
            &self.site.dates,
            excerpt_length,
        )
    }

    /// Cards for the items listed after `id`
    pub fn related_cards(&self, collection: &str, listing: &Listing, id: &ContentId) -> Vec<CardData> {
        listing
            .related(id, self.site.config.related_count)
            .into_iter()
            .map(|card| self.card(collection, card, self.site.config.excerpt_length))
            .collect()
    }

    /// Render page `page` (1-based) of a collection listing
    pub fn listing(&self, collection: &str, state: &ListingState, page: usize) -> Result<RenderedPage> {
        let config = &self.site.config;
        let data = match state {
            ListingState::Loading => ListingData::loading(),
            ListingState::Empty if page <= 1 => ListingData::empty(),
            ListingState::Empty => return self.not_found(&self.back_to(collection), Some(collection)),
            ListingState::Failed(failure) => {
                return self.failed(
                    failure,
                    &collection_page_url(config, collection, page),
                    None,
                    Some(collection),
                )
            }
            ListingState::Loaded(listing) => {
                let Some(slice) = listing.page(page, config.per_page) else {
                    return self.not_found(&self.back_to(collection), Some(collection));
                };
                let (featured, rest) = match slice.cards.split_first() {
                    Some((first, rest)) if slice.number == 1 => (
                        Some(self.card(collection, first, config.featured_excerpt_length)),
                        rest,
                    ),
                    _ => (None, slice.cards),
                };
                ListingData {
                    state: "loaded",
                    featured,
                    cards: rest
                        .iter()
                        .map(|card| self.card(collection, card, config.excerpt_length))
                        .collect(),
                    pagination: Some(PaginationData {
                        total: slice.total,
                        current: slice.number,
                        prev_link: (slice.number > 1)
                            .then(|| collection_page_url(config, collection, slice.number - 1)),
                        next_link: (slice.number < slice.total)
                            .then(|| collection_page_url(config, collection, slice.number + 1)),
                    }),
                }
            }
        };

        let link = collection_page_url(config, collection, page);
        let mut context = self.base_context(Some(collection), Some(&link));
        context.insert("listing", &data);
        Ok(RenderedPage {
            status: PageStatus::Ok,
            html: self.renderer.render("listing.html", &context)?,
        })
    }

    /// Render a detail view; `page_url` is the item's own URL
    pub fn detail(
        &self,
        collection: &str,
        view: DetailView,
        related: Vec<CardData>,
        page_url: &str,
    ) -> Result<RenderedPage> {
        match view {
            DetailView::Found(page) => {
                let mut context = self.base_context(Some(collection), Some(page_url));
                context.insert(
                    "page",
                    &DetailData::new(*page, page_url, related, self.back_to(collection)),
                );
                Ok(RenderedPage {
                    status: PageStatus::Ok,
                    html: self.renderer.render("detail.html", &context)?,
                })
            }
            DetailView::NotFound(back) => self.not_found(&back, Some(collection)),
            DetailView::Failed(failure, back) => {
                self.failed(&failure, page_url, Some(back), Some(collection))
            }
        }
    }

    /// The not-found page, with a single way back
    pub fn not_found(&self, back: &BackLink, active: Option<&str>) -> Result<RenderedPage> {
        let mut context = self.base_context(active, None);
        context.insert("back", back);
        Ok(RenderedPage {
            status: PageStatus::NotFound,
            html: self.renderer.render("not_found.html", &context)?,
        })
    }

    /// The "could not load" page, offering a retry when it may help
    pub fn failed(
        &self,
        failure: &LoadFailure,
        retry_url: &str,
        back: Option<BackLink>,
        active: Option<&str>,
    ) -> Result<RenderedPage> {
        let mut context = self.base_context(active, None);
        context.insert(
            "failure",
            &FailedData {
                message: failure.message.clone(),
                retryable: failure.retryable,
                retry_url: retry_url.to_string(),
                back,
            },
        );
        Ok(RenderedPage {
            status: PageStatus::Unavailable,
            html: self.renderer.render("failed.html", &context)?,
        })
    }
}
