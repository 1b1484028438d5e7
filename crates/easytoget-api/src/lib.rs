// Client for the EasyToGet content API
pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;

// Re-export common types
pub use client::{CatalogSource, ContentClient, DEFAULT_API_PORT};
pub use endpoints::{category_heading, category_name, FetchTarget, PageRequest};
pub use error::{ApiError, Result};
pub use models::{CatalogItem, ContentPage, ContentResponse, HealthStatus, PageInfo};
