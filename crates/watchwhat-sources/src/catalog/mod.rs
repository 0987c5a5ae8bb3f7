pub mod api;
pub mod client;

pub use api::{DiscoverQuery, SearchScope, TimeWindow, TrendingScope, join_any};
pub use client::CatalogClient;
