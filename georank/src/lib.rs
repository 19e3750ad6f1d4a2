//! georank - geo-ranked paginated listing search
//!
//! One engine per listing domain (jobs, local jobs, used products), all backed
//! by the same SQLite database. Results are ranked by distance to an anchor,
//! text relevance, or recency depending on which inputs the request carries,
//! and the search radius widens automatically in sparse regions.

pub mod binding;
pub mod config;
pub mod cursor;
pub mod database;
pub mod engine;
pub mod expander;
pub mod interface;
pub mod models;
pub mod planner;
pub mod projection;
pub mod scoring;
mod store;

pub use config::EngineConfig;
pub use engine::GeoRankedSearchEngine;
pub use interface::*;
pub use store::{ListingSearchService, MAX_POPULAR_TERMS};
