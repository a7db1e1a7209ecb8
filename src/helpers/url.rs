//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::config::SiteConfig;
use crate::content::ContentId;

/// Characters escaped when an id becomes a path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/blog") // -> "/site/blog"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Prefix a link that already carries the root with the site's domain
pub fn absolute_url(config: &SiteConfig, link: &str) -> String {
    format!("{}{}", config.url.trim_end_matches('/'), link)
}

/// Encode an id for use as a single path segment
pub fn encode_segment(id: &ContentId) -> String {
    utf8_percent_encode(&id.to_string(), PATH_SEGMENT).to_string()
}

/// Link to a collection listing
pub fn collection_url(config: &SiteConfig, collection: &str) -> String {
    url_for(config, collection)
}

/// Link to a page of a collection listing
pub fn collection_page_url(config: &SiteConfig, collection: &str, page: usize) -> String {
    if page <= 1 {
        collection_url(config, collection)
    } else {
        url_for(config, &format!("{}/page/{}", collection, page))
    }
}

/// Link to an item's detail page
pub fn item_url(config: &SiteConfig, collection: &str, id: &ContentId) -> String {
    url_for(config, &format!("{}/{}", collection, encode_segment(id)))
}
