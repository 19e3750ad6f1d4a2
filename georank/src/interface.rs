//! georank public interface
//!
//! Request/response types, the error type, and the collaborator traits the
//! engine consumes. This file is the source of truth for shared types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::models::{GeoPoint, Listing};
use crate::planner::{QueryPlan, QueryShape};

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMS
// ═══════════════════════════════════════════════════════════════════════════════

/// Listing domain. Each domain gets its own engine instance bound to its tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Jobs,
    LocalJobs,
    UsedProducts,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Jobs, Domain::LocalJobs, Domain::UsedProducts];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Jobs => "jobs",
            Domain::LocalJobs => "local_jobs",
            Domain::UsedProducts => "used_products",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jobs" => Ok(Domain::Jobs),
            "local_jobs" | "local-jobs" => Ok(Domain::LocalJobs),
            "used_products" | "used-products" => Ok(Domain::UsedProducts),
            other => Err(format!(
                "unknown domain '{other}', expected jobs, local_jobs or used_products"
            )),
        }
    }
}

/// Non-fatal degradations applied while serving a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchNotice {
    /// The anchor was out of bounds and the search ran without one.
    InvalidAnchor,
    /// The cursor could not be decoded and the search restarted from the first page.
    MalformedCursor,
}

/// Typed filter on a domain attribute column. ANDed into the query, never ranked on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Filter {
    OneOf { field: String, values: Vec<String> },
    AtLeast { field: String, value: f64 },
    AtMost { field: String, value: f64 },
}

impl Filter {
    pub fn field(&self) -> &str {
        match self {
            Filter::OneOf { field, .. } | Filter::AtLeast { field, .. } | Filter::AtMost { field, .. } => field,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS (Structs)
// ═══════════════════════════════════════════════════════════════════════════════

/// A search request for one domain.
///
/// `cursor` and `page` are alternative pagination schemes: when `page` is set
/// the request uses offset paging and the cursor is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct SearchRequest {
    pub user_id: Option<i64>,
    #[validate(length(max = 256))]
    pub query: Option<String>,
    /// Explicit anchor; overrides the user's stored location.
    pub anchor: Option<GeoPoint>,
    pub cursor: Option<String>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    /// Upper bound is `EngineConfig::max_page_size`, checked by the engine.
    #[validate(range(min = 1))]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl SearchRequest {
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    /// Query text with surrounding whitespace removed; empty text counts as absent.
    pub fn query_text(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

/// One ranked listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub listing: Listing,
    /// Present only when an anchor was applied.
    pub distance_km: Option<f64>,
    /// Present only when query text was applied.
    pub relevance: Option<f64>,
    /// 1-based position under the active shape's ordering.
    pub rank: u64,
}

/// Search result container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub results: Vec<RankedResult>,
    pub next_cursor: Option<String>,
    pub next_page: Option<u32>,
    pub shape: QueryShape,
    /// Radius of the final attempt; `None` when no anchor was applied.
    pub effective_radius_km: Option<f64>,
    pub notices: Vec<SearchNotice>,
}

/// Popularity counter for a searched term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularTerm {
    pub term: String,
    pub search_count: i64,
    pub last_searched_at: i64,
}

/// Error type for georank operations
#[derive(Debug, Error)]
pub enum GeoRankError {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<crate::database::DatabaseError> for GeoRankError {
    fn from(e: crate::database::DatabaseError) -> Self {
        use crate::database::DatabaseError;
        match e {
            DatabaseError::Pool(_) => GeoRankError::StoreUnavailable(e.to_string()),
            DatabaseError::Interrupted => GeoRankError::Cancelled,
            DatabaseError::InvalidListing(msg) => GeoRankError::InvalidInput(msg),
            other => GeoRankError::Database(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for GeoRankError {
    fn from(e: validator::ValidationErrors) -> Self {
        GeoRankError::InvalidInput(e.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLABORATORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Relational store holding listings, locations and per-user markers.
///
/// A session is checked out once per logical request and held across every
/// radius-expansion attempt; dropping it releases the underlying connection.
/// Cancelling `cancel` aborts a fetch in flight.
pub trait ListingStore: Send + Sync {
    type Session<'a>: StoreSession
    where
        Self: 'a;

    fn checkout(&self, cancel: &CancellationToken) -> Result<Self::Session<'_>, GeoRankError>;
}

/// A checked-out store connection.
pub trait StoreSession {
    fn fetch(&mut self, plan: &QueryPlan) -> Result<Vec<crate::projection::ScoredRow>, GeoRankError>;
}

/// Resolves a user's stored coordinates.
pub trait UserLocationProvider: Send + Sync {
    fn resolve(&self, user_id: i64) -> Result<Option<GeoPoint>, GeoRankError>;
}

/// Term popularity bookkeeping. Called at most once per logical request.
pub trait TermPopularityRecorder: Send + Sync {
    fn record_search(&self, domain: Domain, term: &str) -> Result<(), GeoRankError>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// SERVICE INTERFACE
// ═══════════════════════════════════════════════════════════════════════════════

/// The primary interface for searching listings.
#[async_trait::async_trait]
pub trait ListingSearchApi: Send + Sync {
    /// Geo-ranked paginated search within one domain.
    async fn search(&self, domain: Domain, request: SearchRequest) -> Result<SearchPage, GeoRankError>;

    /// Most searched terms for a domain, most popular first.
    fn popular_terms(&self, domain: Domain, limit: usize) -> Result<Vec<PopularTerm>, GeoRankError>;
}
