//! Display image resolution

use url::Url;

use super::{ContentItem, ImageRef};

/// Image shown when an item has no usable cover or gallery image
pub const FALLBACK_IMAGE: &str = "/static/fallback-image.jpg";

/// Picks the display image for an item: cover, then first gallery image, then the fallback
#[derive(Debug, Clone)]
pub struct MediaResolver {
    image_base: Option<Url>,
    fallback: String,
}

impl MediaResolver {
    /// Create a resolver; an empty fallback means [`FALLBACK_IMAGE`]
    pub fn new(fallback: &str) -> Self {
        let fallback = if fallback.trim().is_empty() {
            FALLBACK_IMAGE.to_string()
        } else {
            fallback.trim().to_string()
        };
        Self {
            image_base: None,
            fallback,
        }
    }

    /// Base URL that blob image ids are served under
    pub fn with_image_base(mut self, base: Option<Url>) -> Self {
        self.image_base = base;
        self
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Resolve the display image for an item; never empty
    pub fn resolve(&self, item: &ContentItem) -> String {
        if let Some(url) = item.cover_image.as_ref().and_then(|r| self.resolve_ref(r)) {
            return url;
        }
        // Only the first gallery entry is considered.
        item.gallery
            .first()
            .and_then(|r| self.resolve_ref(r))
            .unwrap_or_else(|| self.fallback.clone())
    }

    /// All resolvable gallery images, in order
    pub fn gallery_urls(&self, item: &ContentItem) -> Vec<String> {
        item.gallery
            .iter()
            .filter_map(|r| self.resolve_ref(r))
            .collect()
    }

    /// Turn a single reference into a URL, if it is well-formed
    pub fn resolve_ref(&self, image: &ImageRef) -> Option<String> {
        match image {
            ImageRef::Blob(id) => {
                if !is_valid_blob_id(id) {
                    return None;
                }
                let base = self.image_base.as_ref()?;
                Some(format!(
                    "{}/image/{}/blob",
                    base.as_str().trim_end_matches('/'),
                    id
                ))
            }
            ImageRef::Url(url) => {
                let url = url.trim();
                if url.is_empty() || url.chars().any(char::is_whitespace) {
                    return None;
                }
                if url.starts_with('/') && !url.starts_with("//") {
                    return Some(url.to_string());
                }
                match Url::parse(url) {
                    Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                        Some(url.to_string())
                    }
                    _ => None,
                }
            }
        }
    }
}

fn is_valid_blob_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentId;

    const BASE: &str = "https://futureplanhelp.com/api/blogs";

    fn resolver() -> MediaResolver {
        MediaResolver::new("/fallback.jpg").with_image_base(Some(Url::parse(BASE).unwrap()))
    }

    fn item() -> ContentItem {
        ContentItem::new(ContentId::Number(1), "Item")
    }

    #[test]
    fn test_no_images_resolves_to_fallback() {
        assert_eq!(resolver().resolve(&item()), "/fallback.jpg");
    }

    #[test]
    fn test_empty_fallback_uses_constant() {
        let r = MediaResolver::new("  ");
        assert_eq!(r.resolve(&item()), FALLBACK_IMAGE);
        assert_eq!(r.fallback(), FALLBACK_IMAGE);
    }

    #[test]
    fn test_cover_image_wins() {
        let mut it = item();
        it.cover_image = Some(ImageRef::Blob("12".into()));
        it.gallery = vec![ImageRef::Blob("99".into())];
        assert_eq!(
            resolver().resolve(&it),
            "https://futureplanhelp.com/api/blogs/image/12/blob"
        );
    }

    #[test]
    fn test_first_gallery_image_without_cover() {
        let mut it = item();
        it.gallery = vec![
            ImageRef::Url("https://cdn.example.com/a.jpg".into()),
            ImageRef::Url("https://cdn.example.com/b.jpg".into()),
        ];
        assert_eq!(resolver().resolve(&it), "https://cdn.example.com/a.jpg");
    }

    #[test]
    fn test_malformed_cover_falls_through_to_gallery() {
        let mut it = item();
        it.cover_image = Some(ImageRef::Blob("../etc/passwd".into()));
        it.gallery = vec![ImageRef::Blob("5".into())];
        assert_eq!(
            resolver().resolve(&it),
            "https://futureplanhelp.com/api/blogs/image/5/blob"
        );
    }

    #[test]
    fn test_malformed_first_gallery_entry_falls_back() {
        let mut it = item();
        it.gallery = vec![
            ImageRef::Blob("".into()),
            ImageRef::Url("https://cdn.example.com/b.jpg".into()),
        ];
        assert_eq!(resolver().resolve(&it), "/fallback.jpg");
    }

    #[test]
    fn test_blob_without_base_does_not_resolve() {
        let r = MediaResolver::new("/fallback.jpg");
        let mut it = item();
        it.cover_image = Some(ImageRef::Blob("12".into()));
        assert_eq!(r.resolve(&it), "/fallback.jpg");
    }

    #[test]
    fn test_url_refs() {
        let r = resolver();
        assert_eq!(
            r.resolve_ref(&ImageRef::Url("/images/a.png".into())),
            Some("/images/a.png".to_string())
        );
        assert_eq!(r.resolve_ref(&ImageRef::Url("//evil.example/a.png".into())), None);
        assert_eq!(r.resolve_ref(&ImageRef::Url("javascript:alert(1)".into())), None);
        assert_eq!(r.resolve_ref(&ImageRef::Url("a b.png".into())), None);
    }

    #[test]
    fn test_gallery_urls_skip_unresolvable() {
        let mut it = item();
        it.gallery = vec![
            ImageRef::Blob("1".into()),
            ImageRef::Blob("bad id".into()),
            ImageRef::Url("https://cdn.example.com/c.jpg".into()),
        ];
        assert_eq!(
            resolver().gallery_urls(&it),
            vec![
                "https://futureplanhelp.com/api/blogs/image/1/blob".to_string(),
                "https://cdn.example.com/c.jpg".to_string(),
            ]
        );
    }
}
