//! Content lister - fetches a collection and assembles the listing model
//!
//! A load reads the collection, fetches per-item detail when the source only
//! returns summaries, and orders the result newest first. The outcome is
//! always one of the explicit [`ListingState`]s; a failed load never shows
//! partial data.

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::content::{sort_newest_first, ContentId, ContentItem, MediaResolver};
use crate::helpers::{collapse_whitespace, excerpt, strip_html};
use crate::source::{ContentSource, SourceError};

/// Why a load failed, in a form pages can show
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFailure {
    pub message: String,
    pub retryable: bool,
}

impl From<&SourceError> for LoadFailure {
    fn from(err: &SourceError) -> Self {
        Self {
            message: err.to_string(),
            retryable: err.retryable(),
        }
    }
}

/// An item ready for display in a listing
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub item: ContentItem,
    /// Resolved display image, never empty
    pub image: String,
    /// Plain-text teaser: the summary, or the body with markup stripped
    pub teaser: String,
}

impl Card {
    pub fn new(item: ContentItem, resolver: &MediaResolver) -> Self {
        let image = resolver.resolve(&item);
        let teaser = match item.summary.as_deref() {
            Some(summary) => collapse_whitespace(summary),
            None => collapse_whitespace(&strip_html(&item.body)),
        };
        Self {
            item,
            image,
            teaser,
        }
    }

    /// Teaser cut to `length` characters
    pub fn excerpt(&self, length: usize) -> String {
        excerpt(&self.teaser, length)
    }
}

/// The ordered items of a collection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Listing {
    cards: Vec<Card>,
}

/// One page of a listing
#[derive(Debug, Clone, Copy)]
pub struct ListingPage<'a> {
    /// 1-based page number
    pub number: usize,
    pub total: usize,
    pub cards: &'a [Card],
}

impl Listing {
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// The newest item, shown prominently
    pub fn featured(&self) -> Option<&Card> {
        self.cards.first()
    }

    pub fn total_pages(&self, per_page: usize) -> usize {
        self.cards.len().div_ceil(per_page.max(1)).max(1)
    }

    /// Slice out page `number` (1-based); `None` when out of range
    pub fn page(&self, number: usize, per_page: usize) -> Option<ListingPage<'_>> {
        let per_page = per_page.max(1);
        let total = self.total_pages(per_page);
        if number == 0 || number > total {
            return None;
        }
        let start = (number - 1) * per_page;
        let end = (start + per_page).min(self.cards.len());
        Some(ListingPage {
            number,
            total,
            cards: &self.cards[start.min(end)..end],
        })
    }

    /// Up to `count` items listed after `id`, i.e. the older ones
    pub fn related(&self, id: &ContentId, count: usize) -> Vec<&Card> {
        match self.cards.iter().position(|c| &c.item.id == id) {
            Some(pos) => self.cards[pos + 1..].iter().take(count).collect(),
            None => self
                .cards
                .iter()
                .filter(|c| &c.item.id != id)
                .take(count)
                .collect(),
        }
    }
}

/// Where a listing load stands
#[derive(Debug, Clone, PartialEq)]
pub enum ListingState {
    Loading,
    /// Loaded successfully, but the collection has no items
    Empty,
    Loaded(Listing),
    Failed(LoadFailure),
}

impl ListingState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ListingState::Loading)
    }
}

/// Outcome of fetching one item by id
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Found(ContentItem),
    NotFound,
    Failed(LoadFailure),
}

/// Loads one collection from its source
#[derive(Clone)]
pub struct ContentLister {
    source: Arc<dyn ContentSource>,
    resolver: MediaResolver,
    limit: Option<usize>,
    max_concurrent: usize,
}

impl ContentLister {
    /// Create a lister; images that cannot be resolved show `fallback_image`
    pub fn new(source: Arc<dyn ContentSource>, fallback_image: &str) -> Self {
        let resolver = MediaResolver::new(fallback_image).with_image_base(source.image_base());
        Self {
            source,
            resolver,
            limit: None,
            max_concurrent: 8,
        }
    }

    /// Take at most the newest `limit` items
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Bound on detail requests in flight at once
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn resolver(&self) -> &MediaResolver {
        &self.resolver
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Fetch the collection and per-item detail, newest first
    pub async fn fetch(&self) -> Result<Vec<ContentItem>, SourceError> {
        let mut summaries = self.source.fetch_collection().await?;
        if let Some(limit) = self.limit {
            // Keep the newest `limit` items; undated ones go last.
            sort_newest_first(&mut summaries);
            summaries.truncate(limit);
        }

        let mut items = if self.source.detail_required() {
            let source = &self.source;
            // `buffered` yields in input order, whatever order requests finish in.
            stream::iter(summaries.into_iter().map(|summary| async move {
                match source.fetch_detail(&summary.id).await? {
                    Some(item) => Ok::<_, SourceError>(item),
                    None => {
                        tracing::warn!(
                            "Item {} vanished from {}, showing its summary",
                            summary.id,
                            source.name()
                        );
                        Ok(summary)
                    }
                }
            }))
            .buffered(self.max_concurrent)
            .try_collect::<Vec<_>>()
            .await?
        } else {
            summaries
        };

        sort_newest_first(&mut items);
        Ok(items)
    }

    /// Load the listing
    pub async fn load(&self) -> ListingState {
        match self.fetch().await {
            Ok(items) if items.is_empty() => {
                tracing::info!("No items in {}", self.source.name());
                ListingState::Empty
            }
            Ok(items) => {
                tracing::info!("Loaded {} items from {}", items.len(), self.source.name());
                let cards = items
                    .into_iter()
                    .map(|item| Card::new(item, &self.resolver))
                    .collect();
                ListingState::Loaded(Listing::new(cards))
            }
            Err(e) => {
                tracing::error!("Failed to load {}: {}", self.source.name(), e);
                ListingState::Failed(LoadFailure::from(&e))
            }
        }
    }

    /// Load one item by id
    pub async fn load_detail(&self, id: &ContentId) -> DetailState {
        match self.source.fetch_detail(id).await {
            Ok(Some(item)) => DetailState::Found(item),
            Ok(None) => DetailState::NotFound,
            Err(e) => {
                tracing::error!("Failed to load {} from {}: {}", id, self.source.name(), e);
                DetailState::Failed(LoadFailure::from(&e))
            }
        }
    }

    /// Start loading in the background; the task starts out `Loading`
    pub fn spawn(&self) -> ListerTask {
        let (tx, rx) = watch::channel(ListingState::Loading);
        let lister = self.clone();
        let handle = tokio::spawn(async move {
            let state = lister.load().await;
            let _ = tx.send(state);
        });
        ListerTask { state: rx, handle }
    }
}

/// A background load; dropping it cancels the load
pub struct ListerTask {
    state: watch::Receiver<ListingState>,
    handle: JoinHandle<()>,
}

impl ListerTask {
    /// The current state
    pub fn state(&self) -> ListingState {
        self.state.borrow().clone()
    }

    /// Wait until the load has finished
    pub async fn finished(&mut self) -> ListingState {
        match self.state.wait_for(|s| !s.is_loading()).await {
            Ok(state) => state.clone(),
            // The sender only goes away without a result if the task was aborted.
            Err(_) => ListingState::Failed(LoadFailure {
                message: "load was cancelled".to_string(),
                retryable: true,
            }),
        }
    }
}

impl Drop for ListerTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
