// Service exports
pub mod cache;
pub mod catalog;
pub mod fetch;
pub mod items;

pub use cache::{fingerprint, CacheError, CacheKey, ResponseCache};
pub use catalog::{CatalogConfig, CatalogError, CatalogStore, DataSource};
pub use fetch::FetchCoordinator;
pub use items::{ItemSourceError, LocalItemStore, ProviderClient};
