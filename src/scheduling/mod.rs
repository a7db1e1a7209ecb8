//! Booking links for the "schedule a call" call to action
//!
//! Pages never reach for a global widget; whoever renders a page is handed a
//! [`Scheduler`] explicitly.

use std::sync::Arc;
use url::Url;

use crate::config::SchedulingConfig;

/// Something that can hand out a booking link
pub trait Scheduler: Send + Sync {
    /// Where visitors book a call, if booking is enabled
    fn booking_url(&self) -> Option<&Url>;

    /// Text for the call-to-action button
    fn label(&self) -> &str {
        "Book a free consultation"
    }
}

/// A fixed booking page (e.g. a Calendly event link)
pub struct BookingLink {
    url: Url,
    label: Option<String>,
}

impl BookingLink {
    pub fn new(url: Url, label: Option<String>) -> Self {
        Self { url, label }
    }
}

impl Scheduler for BookingLink {
    fn booking_url(&self) -> Option<&Url> {
        Some(&self.url)
    }

    fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("Book a free consultation")
    }
}

/// Booking disabled
pub struct NoScheduler;

impl Scheduler for NoScheduler {
    fn booking_url(&self) -> Option<&Url> {
        None
    }
}

/// Build the scheduler described by the site configuration
pub fn from_config(config: &SchedulingConfig) -> Arc<dyn Scheduler> {
    let Some(raw) = config.url.as_deref().filter(|u| !u.trim().is_empty()) else {
        return Arc::new(NoScheduler);
    };
    match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Arc::new(BookingLink::new(url, config.label.clone()))
        }
        _ => {
            tracing::warn!("Ignoring invalid scheduling url {:?}", raw);
            Arc::new(NoScheduler)
        }
    }
}
