//! Built-in site templates using Tera template engine
//!
//! The templates are embedded directly in the binary, so a site needs no
//! theme directory.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

use crate::content::FormattedBody;
use crate::detail::{BackLink, DetailPage, GalleryView};
use crate::helpers::DatePolicy;
use crate::lister::Card;

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Remote text ends up in these pages; only sanitized markup is marked safe.
        // Paths and URLs stay readable, so '/' is left alone.
        tera.autoescape_on(vec![".html"]);
        tera.set_escape_fn(escape_html);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("listing.html", include_str!("site/listing.html")),
            ("detail.html", include_str!("site/detail.html")),
            ("not_found.html", include_str!("site/not_found.html")),
            ("failed.html", include_str!("site/failed.html")),
            ("partials/card.html", include_str!("site/partials/card.html")),
            ("partials/pager.html", include_str!("site/partials/pager.html")),
            ("partials/body.html", include_str!("site/partials/body.html")),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Escape text for HTML element content and quoted attributes
///
/// Same as `tera::escape_html` except that `/` is left as is, so paths and
/// URLs in `href`/`src` attributes stay readable in the output.
fn escape_html(input: &str) -> String {
    let mut output = String::with_capacity(input.len() * 2);
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#x27;"),
            _ => output.push(c),
        }
    }
    output
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub language: String,
    /// Home link
    pub root: String,
    /// Prefix of static assets
    pub static_url: String,
    pub menu: Vec<NavItem>,
    pub booking: Option<BookingData>,
    pub current_year: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavItem {
    pub title: String,
    pub url: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingData {
    pub url: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionData {
    pub name: String,
    pub title: String,
    pub subtitle: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardData {
    pub title: String,
    pub url: String,
    pub image: String,
    pub date: Option<String>,
    pub date_machine: Option<String>,
    pub author: Option<String>,
    pub excerpt: String,
}

impl CardData {
    pub fn new(card: &Card, url: String, dates: &DatePolicy, excerpt_length: usize) -> Self {
        Self {
            title: card.item.title.clone(),
            url,
            image: card.image.clone(),
            date: card.item.published_at.as_ref().map(|d| dates.display(d)),
            date_machine: card.item.published_at.as_ref().map(|d| dates.machine(d)),
            author: card.item.author.clone(),
            excerpt: card.excerpt(excerpt_length),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationData {
    pub total: usize,
    pub current: usize,
    pub prev_link: Option<String>,
    pub next_link: Option<String>,
}

/// Model of a listing page
#[derive(Debug, Clone, Serialize)]
pub struct ListingData {
    /// `loaded`, `empty` or `loading`
    pub state: &'static str,
    pub featured: Option<CardData>,
    pub cards: Vec<CardData>,
    pub pagination: Option<PaginationData>,
}

impl ListingData {
    pub fn empty() -> Self {
        Self {
            state: "empty",
            featured: None,
            cards: Vec::new(),
            pagination: None,
        }
    }

    pub fn loading() -> Self {
        Self {
            state: "loading",
            ..Self::empty()
        }
    }
}

/// Model of a detail page
#[derive(Debug, Clone, Serialize)]
pub struct DetailData {
    pub title: String,
    pub hero_image: String,
    pub date: Option<String>,
    pub date_machine: Option<String>,
    pub author: Option<String>,
    pub summary: Option<String>,
    pub body: FormattedBody,
    pub gallery: Option<GalleryData>,
    pub meeting_link: Option<String>,
    pub related: Vec<CardData>,
    pub back: BackLink,
}

impl DetailData {
    pub fn new(page: DetailPage, url: &str, related: Vec<CardData>, back: BackLink) -> Self {
        Self {
            title: page.title,
            hero_image: page.hero_image,
            date: page.date,
            date_machine: page.date_machine,
            author: page.author,
            summary: page.summary,
            body: page.body,
            gallery: page.gallery.map(|g| GalleryData::new(g, url)),
            meeting_link: page.meeting_link,
            related,
            back,
        }
    }
}

/// A gallery viewer with ready-made navigation links
#[derive(Debug, Clone, Serialize)]
pub struct GalleryData {
    pub images: Vec<GalleryImage>,
    pub current_image: String,
    /// 1-based position, for "2 / 5"
    pub position: usize,
    pub total: usize,
    pub prev_link: String,
    pub next_link: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GalleryImage {
    pub url: String,
    pub link: String,
    pub current: bool,
}

impl GalleryData {
    pub fn new(view: GalleryView, page_url: &str) -> Self {
        let link = |i: usize| format!("{}?image={}", page_url, i);
        Self {
            current_image: view.current_image().to_string(),
            position: view.current + 1,
            total: view.len(),
            prev_link: link(view.prev),
            next_link: link(view.next),
            images: view
                .images
                .iter()
                .enumerate()
                .map(|(i, url)| GalleryImage {
                    url: url.clone(),
                    link: link(i),
                    current: i == view.current,
                })
                .collect(),
        }
    }
}

/// Model of the "could not load" page
#[derive(Debug, Clone, Serialize)]
pub struct FailedData {
    pub message: String,
    pub retryable: bool,
    pub retry_url: String,
    pub back: Option<BackLink>,
}
