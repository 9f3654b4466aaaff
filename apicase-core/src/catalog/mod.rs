//! External API catalog: wire payloads and the HTTP client.

mod client;
mod model;

pub use client::{CatalogClient, DETAIL_CONCURRENCY, LIST_PAGE_LIMIT};
pub use model::{MenuCategory, MenuItem, MenuResponse, RemoteCatalogItem, RemoteParam};
