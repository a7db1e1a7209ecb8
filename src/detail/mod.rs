//! Content detail renderer
//!
//! Turns one fully populated [`ContentItem`] into the model of a detail page:
//! hero image, title, date, author, formatted body, gallery viewer and meeting
//! link. A missing item becomes an explicit not-found model with a single way
//! back to the listing.

use serde::Serialize;
use url::Url;

use crate::content::{format_body, ContentId, ContentItem, FormattedBody, MediaResolver};
use crate::helpers::DatePolicy;
use crate::lister::{DetailState, LoadFailure};

/// A gallery with one selected image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryView {
    pub images: Vec<String>,
    pub current: usize,
    pub prev: usize,
    pub next: usize,
}

impl GalleryView {
    /// Select image `index`, wrapping around either end; `None` for an empty gallery
    pub fn new(images: Vec<String>, index: i64) -> Option<Self> {
        if images.is_empty() {
            return None;
        }
        let len = images.len() as i64;
        let current = index.rem_euclid(len);
        Some(Self {
            images,
            current: current as usize,
            prev: (current - 1).rem_euclid(len) as usize,
            next: (current + 1).rem_euclid(len) as usize,
        })
    }

    pub fn current_image(&self) -> &str {
        &self.images[self.current]
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Everything a detail page shows about one item
#[derive(Debug, Clone, Serialize)]
pub struct DetailPage {
    pub id: ContentId,
    pub title: String,
    /// Resolved hero image, never empty
    pub hero_image: String,
    pub date: Option<String>,
    /// `datetime` attribute value
    pub date_machine: Option<String>,
    pub author: Option<String>,
    pub summary: Option<String>,
    pub body: FormattedBody,
    pub gallery: Option<GalleryView>,
    pub meeting_link: Option<String>,
}

/// The recovery action offered when there is nothing to show
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackLink {
    pub url: String,
    pub label: String,
}

/// What a detail route ends up showing
#[derive(Debug, Clone)]
pub enum DetailView {
    Found(Box<DetailPage>),
    NotFound(BackLink),
    Failed(LoadFailure, BackLink),
}

/// Renders detail pages for one collection
#[derive(Debug, Clone)]
pub struct DetailRenderer {
    resolver: MediaResolver,
    dates: DatePolicy,
    default_author: Option<String>,
    back: BackLink,
}

impl DetailRenderer {
    /// `back` is where the not-found state sends visitors, normally the listing
    pub fn new(resolver: MediaResolver, dates: DatePolicy, back: BackLink) -> Self {
        Self {
            resolver,
            dates,
            default_author: None,
            back,
        }
    }

    /// Author shown when an item names none
    pub fn with_default_author(mut self, author: Option<String>) -> Self {
        self.default_author = author.filter(|a| !a.trim().is_empty());
        self
    }

    /// Build the page for `item`, with gallery image `image` selected
    pub fn render(&self, item: &ContentItem, image: i64) -> DetailPage {
        let author = item
            .author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .or_else(|| self.default_author.clone());

        DetailPage {
            id: item.id.clone(),
            title: item.title.clone(),
            hero_image: self.resolver.resolve(item),
            date: item.published_at.as_ref().map(|d| self.dates.display(d)),
            date_machine: item.published_at.as_ref().map(|d| self.dates.machine(d)),
            author,
            summary: item
                .summary
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            body: format_body(&item.body),
            gallery: GalleryView::new(self.resolver.gallery_urls(item), image),
            meeting_link: item.meeting_link.as_deref().and_then(external_link),
        }
    }

    /// Map the outcome of a by-id fetch onto what the page shows
    pub fn view(&self, state: DetailState, image: i64) -> DetailView {
        match state {
            DetailState::Found(item) => DetailView::Found(Box::new(self.render(&item, image))),
            DetailState::NotFound => DetailView::NotFound(self.back.clone()),
            DetailState::Failed(failure) => DetailView::Failed(failure, self.back.clone()),
        }
    }

    /// Render an optional item; `None` is the not-found state
    pub fn view_item(&self, item: Option<&ContentItem>, image: i64) -> DetailView {
        match item {
            Some(item) => DetailView::Found(Box::new(self.render(item, image))),
            None => DetailView::NotFound(self.back.clone()),
        }
    }
}

/// Keep a meeting link only if it is an absolute http(s) URL
fn external_link(link: &str) -> Option<String> {
    let url = Url::parse(link.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::{Block, ImageRef, FALLBACK_IMAGE};
    use chrono::{TimeZone, Utc};

    fn renderer() -> DetailRenderer {
        DetailRenderer::new(
            MediaResolver::new(""),
            DatePolicy::from_config(&SiteConfig::default()),
            BackLink {
                url: "/events".into(),
                label: "Events".into(),
            },
        )
    }

    fn event() -> ContentItem {
        let mut item = ContentItem::new(ContentId::Number(4), "Retirement Planning 101");
        item.body = "Join us online.\n\n- Budgeting\n- Pensions\n\n1. Register\n2. Attend".into();
        item.published_at = Some(Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap());
        item.gallery = vec![
            ImageRef::Url("https://cdn.example.com/1.jpg".into()),
            ImageRef::Url("https://cdn.example.com/2.jpg".into()),
            ImageRef::Url("https://cdn.example.com/3.jpg".into()),
        ];
        item.meeting_link = Some("https://meet.example.com/abc".into());
        item
    }

    #[test]
    fn test_render_detail_page() {
        let page = renderer().render(&event(), 0);
        assert_eq!(page.title, "Retirement Planning 101");
        assert_eq!(page.hero_image, "https://cdn.example.com/1.jpg");
        assert_eq!(page.date.as_deref(), Some("01 Jun 2024"));
        assert_eq!(page.meeting_link.as_deref(), Some("https://meet.example.com/abc"));
        match page.body {
            FormattedBody::Blocks { blocks } => {
                assert_eq!(blocks.len(), 3);
                assert_eq!(
                    blocks[1],
                    Block::List {
                        ordered: false,
                        items: vec!["Budgeting".into(), "Pensions".into()],
                    }
                );
                assert!(matches!(blocks[2], Block::List { ordered: true, .. }));
            }
            other => panic!("expected blocks, got {:?}", other),
        }
    }

    #[test]
    fn test_markup_body_is_sanitized() {
        let mut item = event();
        item.body = "<p>Hi<script>alert(1)</script></p>".into();
        match renderer().render(&item, 0).body {
            FormattedBody::Markup { html } => assert_eq!(html, "<p>Hi</p>"),
            other => panic!("expected markup, got {:?}", other),
        }
    }

    #[test]
    fn test_default_author() {
        let renderer = renderer().with_default_author(Some("The Advisory Team".into()));
        let page = renderer.render(&event(), 0);
        assert_eq!(page.author.as_deref(), Some("The Advisory Team"));

        let mut item = event();
        item.author = Some("Priya".into());
        assert_eq!(renderer.render(&item, 0).author.as_deref(), Some("Priya"));
    }

    #[test]
    fn test_item_without_images_or_date() {
        let item = ContentItem::new(ContentId::Text("intro".into()), "Intro");
        let page = renderer().render(&item, 0);
        assert_eq!(page.hero_image, FALLBACK_IMAGE);
        assert!(page.gallery.is_none());
        assert!(page.date.is_none());
        assert!(page.author.is_none());
    }

    #[test]
    fn test_meeting_link_must_be_http() {
        let mut item = event();
        item.meeting_link = Some("javascript:alert(1)".into());
        assert!(renderer().render(&item, 0).meeting_link.is_none());
        item.meeting_link = Some("not a url".into());
        assert!(renderer().render(&item, 0).meeting_link.is_none());
    }

    #[test]
    fn test_gallery_wraps_both_ways() {
        let images: Vec<String> = (1..=3).map(|i| format!("/{}.jpg", i)).collect();

        let first = GalleryView::new(images.clone(), 0).unwrap();
        assert_eq!((first.prev, first.current, first.next), (2, 0, 1));

        let last = GalleryView::new(images.clone(), 2).unwrap();
        assert_eq!(last.next, 0);

        let past_end = GalleryView::new(images.clone(), 4).unwrap();
        assert_eq!(past_end.current, 1);

        let before_start = GalleryView::new(images, -1).unwrap();
        assert_eq!(before_start.current, 2);
        assert_eq!(before_start.current_image(), "/3.jpg");

        assert!(GalleryView::new(Vec::new(), 0).is_none());
    }

    #[test]
    fn test_single_image_gallery() {
        let gallery = GalleryView::new(vec!["/a.jpg".into()], 5).unwrap();
        assert_eq!((gallery.prev, gallery.current, gallery.next), (0, 0, 0));
    }

    #[test]
    fn test_missing_item_is_not_found_with_way_back() {
        match renderer().view_item(None, 0) {
            DetailView::NotFound(back) => {
                assert_eq!(back.url, "/events");
                assert_eq!(back.label, "Events");
            }
            other => panic!("expected not found, got {:?}", other),
        }
        assert!(matches!(
            renderer().view(DetailState::NotFound, 0),
            DetailView::NotFound(_)
        ));
    }

    #[test]
    fn test_failed_state_keeps_failure() {
        let failure = LoadFailure {
            message: "timed out".into(),
            retryable: true,
        };
        match renderer().view(DetailState::Failed(failure.clone()), 0) {
            DetailView::Failed(f, back) => {
                assert_eq!(f, failure);
                assert_eq!(back.url, "/events");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
