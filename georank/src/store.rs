//! ListingSearchService - async entry point over the per-domain engines
//!
//! Async Cancellation Architecture:
//! When a caller drops the search future, the token's drop guard triggers a
//! CancellationToken. The blocking search thread checks the token between
//! radius-expansion attempts, and the SQLite session interrupts a statement
//! that is already running.

use crate::config::EngineConfig;
use crate::database::Database;
use crate::engine::GeoRankedSearchEngine;
use crate::interface::{Domain, GeoRankError, ListingSearchApi, PopularTerm, SearchPage, SearchRequest};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Upper bound for `popular_terms`.
pub const MAX_POPULAR_TERMS: usize = 100;

/// Global fallback Tokio runtime for async calls made outside any runtime context.
/// Shared across all service instances and never dropped.
static FALLBACK_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("georank-fallback")
        .build()
        .expect("Failed to create fallback tokio runtime")
});

/// Search service over one SQLite database
///
/// Concurrency Model:
/// - Database uses r2d2 connection pool (concurrent reads, no mutex blocking)
/// - Each search holds one pooled connection for all of its expansion attempts
/// - Blocking work runs on tokio spawn_blocking threads
/// - Uses global FALLBACK_RUNTIME when called outside any runtime
pub struct ListingSearchService {
    db: Arc<Database>,
    engines: HashMap<Domain, Arc<GeoRankedSearchEngine<Database>>>,
}

impl ListingSearchService {
    /// Open (or create) the database at `db_path` and build one engine per domain.
    pub fn open<P: AsRef<Path>>(db_path: P, config: EngineConfig) -> Result<Self, GeoRankError> {
        config
            .validate()
            .map_err(|e| GeoRankError::InvalidInput(e.to_string()))?;
        let db = Database::open_with_pool_size(db_path, config.pool_size)?;
        Ok(Self::from_database(Arc::new(db), config))
    }

    /// Service over an in-memory database (tests, benchmarks)
    pub fn new_in_memory(config: EngineConfig) -> Result<Self, GeoRankError> {
        config
            .validate()
            .map_err(|e| GeoRankError::InvalidInput(e.to_string()))?;
        let db = Database::open_in_memory()?;
        Ok(Self::from_database(Arc::new(db), config))
    }

    /// The database serves as listing store, location provider and term recorder.
    pub fn from_database(db: Arc<Database>, config: EngineConfig) -> Self {
        let config = Arc::new(config);
        let engines = Domain::ALL
            .into_iter()
            .map(|domain| {
                let engine = GeoRankedSearchEngine::new(
                    Arc::clone(&db),
                    db.clone(),
                    db.clone(),
                    domain,
                    Arc::clone(&config),
                );
                (domain, Arc::new(engine))
            })
            .collect();

        Self { db, engines }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    fn engine(&self, domain: Domain) -> Result<Arc<GeoRankedSearchEngine<Database>>, GeoRankError> {
        self.engines
            .get(&domain)
            .cloned()
            .ok_or_else(|| GeoRankError::InvalidInput(format!("no engine for {domain}")))
    }

    /// Get a tokio runtime handle - uses current runtime if available, otherwise global fallback
    fn runtime_handle(&self) -> tokio::runtime::Handle {
        tokio::runtime::Handle::try_current().unwrap_or_else(|_| FALLBACK_RUNTIME.handle().clone())
    }
}

#[async_trait::async_trait]
impl ListingSearchApi for ListingSearchService {
    /// Runs the engine on a blocking thread. Dropping the returned future
    /// cancels the search mid-flight.
    async fn search(&self, domain: Domain, request: SearchRequest) -> Result<SearchPage, GeoRankError> {
        let engine = self.engine(domain)?;

        // Dropping the search future drops the guard, which cancels the token
        let token = CancellationToken::new();
        let _guard = token.clone().drop_guard();

        // runtime.spawn_blocking rather than tokio::task::spawn_blocking: callers may not be on a runtime
        let runtime = self.runtime_handle();
        let token_clone = token.clone();
        let handle = runtime.spawn_blocking(move || engine.search(&request, &token_clone));

        match handle.await {
            Ok(result) => result,
            Err(join_error) => {
                // JoinError means the task panicked or was aborted
                tracing::warn!("search task for {} did not complete: {}", domain, join_error);
                Err(GeoRankError::Cancelled)
            }
        }
    }

    fn popular_terms(&self, domain: Domain, limit: usize) -> Result<Vec<PopularTerm>, GeoRankError> {
        Ok(self.db.popular_terms(domain, limit.min(MAX_POPULAR_TERMS))?)
    }
}
