//! Content module - items, image resolution, and body formatting

pub mod body;
mod item;
mod media;
pub mod sanitize;
pub mod timestamp;

pub use body::{format_body, Block, FormattedBody};
pub use item::{sort_newest_first, ContentId, ContentItem, ImageRef};
pub use media::{MediaResolver, FALLBACK_IMAGE};
