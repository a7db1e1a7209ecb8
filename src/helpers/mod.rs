//! Helper functions for templates and page models

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
