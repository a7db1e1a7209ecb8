//! List the items of a collection

use anyhow::{bail, Result};

use crate::lister::ListingState;
use crate::Site;

/// Load a collection and print its items, newest first
pub async fn run(site: &Site, collection: &str) -> Result<()> {
    let lister = site.lister(collection)?;
    let mut task = lister.spawn();

    if task.state().is_loading() {
        println!("Loading {}…", collection);
    }

    let state = tokio::select! {
        state = task.finished() => state,
        // Returning drops the task, which cancels the load.
        _ = tokio::signal::ctrl_c() => bail!("Interrupted"),
    };

    match state {
        ListingState::Loaded(listing) => {
            println!("{} ({}):", collection, listing.len());
            for card in listing.cards() {
                let date = card
                    .item
                    .published_at
                    .as_ref()
                    .map(|d| site.dates.display(d))
                    .unwrap_or_else(|| "-".to_string());
                println!("  {} - {} [{}]", date, card.item.title, card.item.id);
            }
        }
        ListingState::Empty => println!("{} has no items", collection),
        ListingState::Failed(failure) => {
            let hint = if failure.retryable {
                " (try again later)"
            } else {
                ""
            };
            bail!("Could not load {}: {}{}", collection, failure.message, hint);
        }
        ListingState::Loading => bail!("Load of {} did not finish", collection),
    }

    Ok(())
}
