//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

const CONFIG: &str = r#"# Site
title: My Advisory
subtitle: Independent financial planning
description: ''
language: en
timezone: ''

# URL
url: http://example.com
root: /

# Directory
public_dir: public
static_dir: static

# Display
date_format: DD MMM YYYY
fallback_image: /static/fallback-image.svg
excerpt_length: 140
featured_excerpt_length: 200
per_page: 9
related_count: 3

# Fetching
max_concurrent_fetches: 8
request_timeout_secs: 15

# Booking link shown on every page
scheduling:
  url: ''
  label: Book a free consultation

# Content collections, shown in this order in the menu
collections:
  blog:
    title: Blog
    subtitle: Notes on planning, saving and investing
    source:
      kind: file
      path: content/blog.yml
  events:
    title: Events
    subtitle: Workshops and webinars
    default_author: The advisory team
    source:
      kind: file
      path: content/events.yml
#  events:
#    title: Events
#    source:
#      kind: rest
#      base_url: https://api.example.com/events
#  blog:
#    title: Blog
#    source:
#      kind: firestore
#      project_id: my-project
#      collection: blogs
"#;

const BLOG: &str = r#"- id: 1
  title: Welcome to our blog
  author: Jane Doe
  publishedAt: "2024-06-01T09:00:00Z"
  content: |
    This is your first post. Edit content/blog.yml to change it.

    What we cover:
    - Retirement planning
    - Tax-efficient saving
    - Insurance
"#;

const EVENTS: &str = r#"- id: 1
  title: Retirement planning webinar
  publishedAt: "2024-07-15T17:00:00Z"
  meetingLink: https://meet.example.com/retirement
  description: |
    An hour on building a retirement plan.

    1. Where you are today
    2. Where you want to be
    3. How to get there
"#;

const STYLE: &str = r#"body { font-family: system-ui, sans-serif; margin: 0; color: #222; }
.site-header, .site-footer { display: flex; gap: 1rem; align-items: center; padding: 1rem 2rem; }
.site-header nav { flex: 1; display: flex; gap: 1rem; }
.site-header nav a.active { font-weight: bold; }
main { max-width: 60rem; margin: 0 auto; padding: 1rem; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(16rem, 1fr)); gap: 1.5rem; }
.card img, .hero { width: 100%; object-fit: cover; }
.featured .card { font-size: 1.15em; }
.button { display: inline-block; padding: .5rem 1rem; background: #14532d; color: #fff; border-radius: .25rem; text-decoration: none; }
.gallery figure img { max-width: 100%; }
.thumbnails { display: flex; gap: .5rem; list-style: none; padding: 0; }
.thumbnails img { width: 5rem; height: 3.5rem; object-fit: cover; }
.thumbnails .current img { outline: 2px solid #14532d; }
.status { text-align: center; padding: 3rem 0; }
"#;

const FALLBACK_IMAGE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="800" height="450" viewBox="0 0 800 450"><rect width="800" height="450" fill="#e5e7eb"/><circle cx="400" cy="200" r="60" fill="#cbd5e1"/><rect x="250" y="300" width="300" height="24" rx="12" fill="#cbd5e1"/></svg>
"##;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("content"))?;
    fs::create_dir_all(target_dir.join("static"))?;

    write_new(&target_dir.join("_config.yml"), CONFIG)?;
    write_new(&target_dir.join("content/blog.yml"), BLOG)?;
    write_new(&target_dir.join("content/events.yml"), EVENTS)?;
    write_new(&target_dir.join("static/style.css"), STYLE)?;
    write_new(&target_dir.join("static/fallback-image.svg"), FALLBACK_IMAGE)?;

    Ok(())
}

/// Write a file unless it already exists
fn write_new(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        tracing::info!("Keeping existing {:?}", path);
        return Ok(());
    }
    fs::write(path, content)?;
    tracing::debug!("Created: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lister::ListingState;
    use crate::Site;

    #[tokio::test]
    async fn test_init_creates_a_loadable_site() {
        let dir = tempfile::tempdir().unwrap();
        init_site(dir.path()).unwrap();

        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.config.collections.len(), 2);
        assert!(site.scheduler.booking_url().is_none());

        for name in ["blog", "events"] {
            let state = site.lister(name).unwrap().load().await;
            assert!(
                matches!(state, ListingState::Loaded(ref l) if l.len() == 1),
                "{} did not load: {:?}",
                name,
                state
            );
        }
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("_config.yml"), "title: Mine\n").unwrap();
        init_site(dir.path()).unwrap();
        let config = fs::read_to_string(dir.path().join("_config.yml")).unwrap();
        assert_eq!(config, "title: Mine\n");
    }
}
