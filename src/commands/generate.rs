//! Generate static files

use anyhow::Result;

use crate::generator::Generator;
use crate::Site;

/// Generate the static site
pub async fn run(site: &Site) -> Result<()> {
    let start = std::time::Instant::now();

    if site.config.collections.is_empty() {
        tracing::warn!("No collections configured in _config.yml");
    }

    let generator = Generator::new(site)?;
    let summary = generator.generate().await?;

    if summary.skipped > 0 {
        tracing::warn!("Skipped {} items with unusable ids", summary.skipped);
    }
    tracing::info!(
        "Generated {} listing pages and {} detail pages in {:.2}s",
        summary.listing_pages,
        summary.detail_pages,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
