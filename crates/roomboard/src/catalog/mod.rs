/// Catalog collaborator access: rooms, subjects and their sections
mod cache;
mod client;
mod error;
mod types;

pub use cache::CatalogState;
pub use client::CatalogClient;
pub use error::CatalogError;
pub use types::*;
