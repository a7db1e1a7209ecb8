//! Configuration module

mod site;

pub use site::CollectionConfig;
pub use site::SchedulingConfig;
pub use site::SiteConfig;
pub use site::SourceConfig;
