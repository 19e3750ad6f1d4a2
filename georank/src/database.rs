//! SQLite database layer for listing storage
//!
//! One table set per domain (listing, location, bookmarks, applications,
//! images) generated from the domain bindings, plus shared `user_locations`
//! and `search_terms` tables.
//! Uses r2d2 connection pooling; every pooled connection gets the scoring
//! functions installed at init.

use crate::binding::{DomainBinding, JOBS, LOCAL_JOBS, USED_PRODUCTS};
use crate::interface::{
    Domain, GeoRankError, ListingStore, PopularTerm, StoreSession, TermPopularityRecorder,
    UserLocationProvider,
};
use crate::models::{GeoPoint, NewListing};
use crate::planner::QueryPlan;
use crate::projection::ScoredRow;
use crate::scoring::register_functions;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;

pub const DEFAULT_POOL_SIZE: u32 = 8;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Query interrupted")]
    Interrupted,
    #[error("Invalid listing: {0}")]
    InvalidListing(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

fn is_interrupt(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ffi::ErrorCode::OperationInterrupted)
}

fn json_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real))
            .unwrap_or(SqlValue::Null),
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

/// Thread-safe database wrapper using connection pooling
///
/// WAL mode lets concurrent searches read without blocking each other.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open or create a database at the given path with the default pool size
    pub fn open<P: AsRef<Path>>(path: P) -> DatabaseResult<Self> {
        Self::open_with_pool_size(path, DEFAULT_POOL_SIZE)
    }

    pub fn open_with_pool_size<P: AsRef<Path>>(path: P, pool_size: u32) -> DatabaseResult<Self> {
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch(
                "
                PRAGMA journal_mode=WAL;
                PRAGMA synchronous=NORMAL;
                PRAGMA foreign_keys=ON;
                PRAGMA busy_timeout=5000;
                PRAGMA cache_size=-32000;
            ",
            )?;
            register_functions(conn)
        });

        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;

        let db = Self { pool };
        db.setup_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (tests, benchmarks)
    pub fn open_in_memory() -> DatabaseResult<Self> {
        let manager = SqliteConnectionManager::memory().with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys=ON;")?;
            register_functions(conn)
        });

        // In-memory needs a single long-lived connection to keep its state
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(manager)?;

        let db = Self { pool };
        db.setup_schema()?;
        Ok(db)
    }

    /// Get a connection from the pool
    fn get_conn(&self) -> DatabaseResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    fn setup_schema(&self) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        for binding in [&JOBS, &LOCAL_JOBS, &USED_PRODUCTS] {
            conn.execute_batch(&Self::domain_schema(binding))?;
        }

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS user_locations (
                user_id INTEGER PRIMARY KEY,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS search_terms (
                domain TEXT NOT NULL,
                term TEXT NOT NULL,
                search_count INTEGER NOT NULL DEFAULT 0,
                last_searched_at INTEGER NOT NULL,
                PRIMARY KEY (domain, term)
            );

            CREATE INDEX IF NOT EXISTS idx_search_terms_count ON search_terms(domain, search_count);
        "#,
        )?;

        Ok(())
    }

    fn domain_schema(b: &DomainBinding) -> String {
        let mut listing_columns = vec![
            "id INTEGER PRIMARY KEY AUTOINCREMENT".to_string(),
            "owner_id INTEGER NOT NULL".to_string(),
            format!("{} TEXT NOT NULL", b.title_column),
            format!("{} TEXT NOT NULL DEFAULT ''", b.description_column),
            "created_at INTEGER NOT NULL".to_string(),
        ];
        if let Some(tags) = b.tags_column {
            listing_columns.push(format!("{tags} TEXT"));
        }
        listing_columns.extend(b.attributes.iter().map(|a| format!("{} {}", a.name, a.kind.sql_type())));

        let table = b.listing_table;
        let mut sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                {columns}
            );
            CREATE INDEX IF NOT EXISTS idx_{table}_created_at ON {table}(created_at);

            CREATE TABLE IF NOT EXISTS {loc} (
                {loc_fk} INTEGER PRIMARY KEY REFERENCES {table}(id) ON DELETE CASCADE,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                geo TEXT NOT NULL DEFAULT '',
                precision TEXT NOT NULL DEFAULT 'approximate'
            );
            CREATE INDEX IF NOT EXISTS idx_{loc}_lat_lon ON {loc}(latitude, longitude);

            CREATE VIRTUAL TABLE IF NOT EXISTS {fts} USING fts5(
                {t}, {d}, content='{table}', content_rowid='id'
            );
            CREATE TRIGGER IF NOT EXISTS {table}_fts_insert AFTER INSERT ON {table} BEGIN
                INSERT INTO {fts}(rowid, {t}, {d}) VALUES (new.id, new.{t}, new.{d});
            END;
            CREATE TRIGGER IF NOT EXISTS {table}_fts_delete AFTER DELETE ON {table} BEGIN
                INSERT INTO {fts}({fts}, rowid, {t}, {d}) VALUES ('delete', old.id, old.{t}, old.{d});
            END;
            CREATE TRIGGER IF NOT EXISTS {table}_fts_update AFTER UPDATE OF {t}, {d} ON {table} BEGIN
                INSERT INTO {fts}({fts}, rowid, {t}, {d}) VALUES ('delete', old.id, old.{t}, old.{d});
                INSERT INTO {fts}(rowid, {t}, {d}) VALUES (new.id, new.{t}, new.{d});
            END;
            "#,
            columns = listing_columns.join(",\n                "),
            loc = b.location_table,
            loc_fk = b.location_fk,
            fts = b.fts_table,
            t = b.title_column,
            d = b.description_column,
        );

        for marker in std::iter::once(&b.bookmarks).chain(b.applications.as_ref()) {
            sql.push_str(&format!(
                r#"
            CREATE TABLE IF NOT EXISTS {t} (
                user_id INTEGER NOT NULL,
                {fk} INTEGER NOT NULL REFERENCES {table}(id) ON DELETE CASCADE,
                created_at INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (user_id, {fk})
            );
            "#,
                t = marker.table,
                fk = marker.listing_fk,
            ));
        }

        if let Some(images) = b.images {
            sql.push_str(&format!(
                r#"
            CREATE TABLE IF NOT EXISTS {t} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                {fk} INTEGER NOT NULL REFERENCES {table}(id) ON DELETE CASCADE,
                {url} TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_{t}_listing ON {t}({fk});
            "#,
                t = images.table,
                fk = images.listing_fk,
                url = images.url_column,
            ));
        }

        sql
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Writes (seeding and bookkeeping)
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a listing with its location and images. Returns the new listing id.
    pub fn insert_listing(&self, domain: Domain, listing: &NewListing) -> DatabaseResult<i64> {
        let b = DomainBinding::for_domain(domain);
        if let Some(unknown) = listing.attributes.keys().find(|k| b.attribute(k).is_none()) {
            return Err(DatabaseError::InvalidListing(format!(
                "'{unknown}' is not an attribute of {domain}"
            )));
        }
        if let Some(location) = &listing.location {
            if !location.point.is_valid() {
                return Err(DatabaseError::InvalidListing(format!(
                    "coordinates ({}, {}) are out of range",
                    location.point.latitude, location.point.longitude
                )));
            }
        }

        let mut columns: Vec<&str> = vec!["owner_id", b.title_column, b.description_column, "created_at"];
        let mut values: Vec<SqlValue> = vec![
            listing.owner_id.into(),
            listing.title.clone().into(),
            listing.description.clone().into(),
            listing.created_at.into(),
        ];
        match b.tags_column {
            Some(tags) => {
                columns.push(tags);
                values.push(SqlValue::Text(Value::from(listing.tags.clone()).to_string()));
            }
            None if !listing.tags.is_empty() => {
                tracing::debug!("{} has no tag column, dropping {} tags", domain, listing.tags.len());
            }
            None => {}
        }
        for attr in b.attributes {
            if let Some(value) = listing.attributes.get(attr.name) {
                columns.push(attr.name);
                values.push(json_to_sql(value));
            }
        }

        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            b.listing_table,
            columns.join(", "),
            placeholders.join(", ")
        );

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute(&sql, rusqlite::params_from_iter(values))?;
        let id = tx.last_insert_rowid();

        if let Some(location) = &listing.location {
            tx.execute(
                &format!(
                    "INSERT INTO {} ({}, latitude, longitude, geo, precision) VALUES (?1, ?2, ?3, ?4, ?5)",
                    b.location_table, b.location_fk
                ),
                params![
                    id,
                    location.point.latitude,
                    location.point.longitude,
                    location.geo,
                    location.precision.to_database_str()
                ],
            )?;
        }

        match b.images {
            Some(images) => {
                let sql = format!(
                    "INSERT INTO {} ({}, {}) VALUES (?1, ?2)",
                    images.table, images.listing_fk, images.url_column
                );
                for url in &listing.image_urls {
                    tx.execute(&sql, params![id, url])?;
                }
            }
            None if !listing.image_urls.is_empty() => {
                return Err(DatabaseError::InvalidListing(format!("{domain} listings have no images")));
            }
            None => {}
        }

        tx.commit()?;
        Ok(id)
    }

    pub fn set_user_location(&self, user_id: i64, point: GeoPoint) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO user_locations (user_id, latitude, longitude) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET latitude = excluded.latitude, longitude = excluded.longitude",
            params![user_id, point.latitude, point.longitude],
        )?;
        Ok(())
    }

    pub fn user_location(&self, user_id: i64) -> DatabaseResult<Option<GeoPoint>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare_cached("SELECT latitude, longitude FROM user_locations WHERE user_id = ?1")?;
        let mut rows = stmt.query_map([user_id], |row| Ok(GeoPoint::new(row.get(0)?, row.get(1)?)))?;
        Ok(rows.next().transpose()?)
    }

    pub fn add_bookmark(&self, domain: Domain, user_id: i64, listing_id: i64) -> DatabaseResult<()> {
        let marker = DomainBinding::for_domain(domain).bookmarks;
        self.insert_marker(marker.table, marker.listing_fk, user_id, listing_id)
    }

    pub fn add_application(&self, domain: Domain, user_id: i64, listing_id: i64) -> DatabaseResult<()> {
        let marker = DomainBinding::for_domain(domain)
            .applications
            .ok_or_else(|| DatabaseError::InvalidListing(format!("{domain} listings take no applications")))?;
        self.insert_marker(marker.table, marker.listing_fk, user_id, listing_id)
    }

    fn insert_marker(&self, table: &str, listing_fk: &str, user_id: i64, listing_id: i64) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            &format!("INSERT OR IGNORE INTO {table} (user_id, {listing_fk}, created_at) VALUES (?1, ?2, ?3)"),
            params![user_id, listing_id, chrono::Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    pub fn count_listings(&self, domain: Domain) -> DatabaseResult<u64> {
        let conn = self.get_conn()?;
        let table = DomainBinding::for_domain(domain).listing_table;
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Bump the popularity counter for a normalized term.
    pub fn record_term(&self, domain: Domain, term: &str) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO search_terms (domain, term, search_count, last_searched_at) VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(domain, term) DO UPDATE SET
                search_count = search_count + 1,
                last_searched_at = excluded.last_searched_at",
            params![domain.as_str(), term, chrono::Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    /// Most searched terms, ties broken by recency.
    pub fn popular_terms(&self, domain: Domain, limit: usize) -> DatabaseResult<Vec<PopularTerm>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT term, search_count, last_searched_at FROM search_terms
             WHERE domain = ?1
             ORDER BY search_count DESC, last_searched_at DESC, term ASC
             LIMIT ?2",
        )?;
        let terms = stmt
            .query_map(params![domain.as_str(), limit as i64], |row| {
                Ok(PopularTerm {
                    term: row.get(0)?,
                    search_count: row.get(1)?,
                    last_searched_at: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(terms)
    }

    /// Check out a connection for one logical search.
    ///
    /// When called on a tokio runtime (including `spawn_blocking` threads) the
    /// session watches `cancel` and interrupts SQLite mid-statement.
    pub fn session(&self, cancel: &CancellationToken) -> DatabaseResult<SqliteSession> {
        let conn = self.get_conn()?;

        let watcher = tokio::runtime::Handle::try_current().ok().map(|runtime| {
            let interrupt_handle = conn.get_interrupt_handle();
            let token = cancel.clone();
            AbortOnDropHandle::new(runtime.spawn(async move {
                token.cancelled().await;
                interrupt_handle.interrupt();
            }))
        });

        Ok(SqliteSession { conn, _watcher: watcher })
    }
}

/// A pooled connection held for the duration of one search.
pub struct SqliteSession {
    conn: PooledConnection<SqliteConnectionManager>,
    _watcher: Option<AbortOnDropHandle<()>>,
}

impl SqliteSession {
    fn query(&mut self, plan: &QueryPlan) -> DatabaseResult<Vec<ScoredRow>> {
        let mut stmt = self.conn.prepare_cached(&plan.sql)?;
        let params = plan.named_params();
        let rows = stmt
            .query_map(params.as_slice(), |row| ScoredRow::from_row(row, plan.binding))
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>());

        match rows {
            Ok(rows) => Ok(rows),
            Err(e) if is_interrupt(&e) => Err(DatabaseError::Interrupted),
            Err(e) => Err(e.into()),
        }
    }
}

impl StoreSession for SqliteSession {
    fn fetch(&mut self, plan: &QueryPlan) -> Result<Vec<ScoredRow>, GeoRankError> {
        Ok(self.query(plan)?)
    }
}

impl ListingStore for Database {
    type Session<'a> = SqliteSession where Self: 'a;

    fn checkout(&self, cancel: &CancellationToken) -> Result<SqliteSession, GeoRankError> {
        Ok(self.session(cancel)?)
    }
}

impl UserLocationProvider for Database {
    fn resolve(&self, user_id: i64) -> Result<Option<GeoPoint>, GeoRankError> {
        Ok(self.user_location(user_id)?)
    }
}

impl TermPopularityRecorder for Database {
    fn record_search(&self, domain: Domain, term: &str) -> Result<(), GeoRankError> {
        Ok(self.record_term(domain, term)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{CursorTieBreak, PageWindow, PlanInput, QueryPlanner};
    use crate::projection::fold_rows;

    const BLR: (f64, f64) = (12.9716, 77.5946);

    fn plan_input(query: Option<&str>, anchor: Option<GeoPoint>) -> PlanInput<'_> {
        PlanInput {
            user_id: None,
            query_text: query,
            anchor,
            window: PageWindow::Cursor(None),
            page_size: 10,
            filters: &[],
        }
    }

    #[test]
    fn test_schema_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.setup_schema().unwrap();
        assert_eq!(db.count_listings(Domain::Jobs).unwrap(), 0);
    }

    #[test]
    fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_with_pool_size(dir.path().join("nested/listings.db"), 2).unwrap();
        db.insert_listing(Domain::Jobs, &NewListing::new(1, "Driver", "", 1)).unwrap();
        assert_eq!(db.count_listings(Domain::Jobs).unwrap(), 1);
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let db = Database::open_in_memory().unwrap();
        let listing = NewListing::new(1, "Driver", "", 1).attribute("price", 10);
        assert!(matches!(
            db.insert_listing(Domain::Jobs, &listing),
            Err(DatabaseError::InvalidListing(_))
        ));
    }

    #[test]
    fn test_images_rejected_for_domain_without_images() {
        let db = Database::open_in_memory().unwrap();
        let mut listing = NewListing::new(1, "Driver", "", 1);
        listing.image_urls.push("https://img/1.jpg".into());
        assert!(db.insert_listing(Domain::Jobs, &listing).is_err());
        assert_eq!(db.count_listings(Domain::Jobs).unwrap(), 0);
    }

    #[test]
    fn test_applications_only_where_bound() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .insert_listing(Domain::UsedProducts, &NewListing::new(1, "Sofa", "", 1))
            .unwrap();
        assert!(db.add_bookmark(Domain::UsedProducts, 5, id).is_ok());
        assert!(db.add_application(Domain::UsedProducts, 5, id).is_err());
    }

    #[test]
    fn test_user_location_upsert() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.user_location(3).unwrap(), None);
        db.set_user_location(3, GeoPoint::new(1.0, 2.0)).unwrap();
        db.set_user_location(3, GeoPoint::new(12.0, 77.0)).unwrap();
        assert_eq!(db.resolve(3).unwrap(), Some(GeoPoint::new(12.0, 77.0)));
    }

    #[test]
    fn test_popular_terms_count_and_order() {
        let db = Database::open_in_memory().unwrap();
        db.record_term(Domain::Jobs, "driver").unwrap();
        db.record_term(Domain::Jobs, "cook").unwrap();
        db.record_term(Domain::Jobs, "driver").unwrap();
        db.record_term(Domain::LocalJobs, "cook").unwrap();

        let terms = db.popular_terms(Domain::Jobs, 10).unwrap();
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0].term, "driver");
        assert_eq!(terms[0].search_count, 2);
        assert_eq!(terms[1].search_count, 1);
        assert_eq!(db.popular_terms(Domain::LocalJobs, 10).unwrap().len(), 1);
    }

    #[test]
    fn test_session_runs_anchor_text_plan() {
        let db = Database::open_in_memory().unwrap();
        let near = db
            .insert_listing(
                Domain::Jobs,
                &NewListing::new(1, "Delivery driver", "Two-wheeler delivery", 100)
                    .at(12.98, 77.60, "Indiranagar")
                    .attribute("work_mode", "onsite"),
            )
            .unwrap();
        db.insert_listing(
            Domain::Jobs,
            &NewListing::new(1, "Cook", "Kitchen helper", 200).at(12.97, 77.59, "MG Road"),
        )
        .unwrap();
        db.insert_listing(
            Domain::Jobs,
            &NewListing::new(1, "Truck driver", "Long haul", 300).at(19.07, 72.87, "Mumbai"),
        )
        .unwrap();

        let planner = QueryPlanner::new(&JOBS, CursorTieBreak::default(), false);
        let anchor = GeoPoint::new(BLR.0, BLR.1);
        let plan = planner.plan(&plan_input(Some("driver"), Some(anchor)), 50.0).unwrap();

        let token = CancellationToken::new();
        let mut session = db.checkout(&token).unwrap();
        let rows = session.fetch(&plan).unwrap();
        let results = fold_rows(rows, plan.shape);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].listing.id, near);
        assert_eq!(results[0].rank, 1);
        assert!(results[0].distance_km.unwrap() < 5.0);
        assert!(results[0].relevance.unwrap() > 0.0);
        assert_eq!(results[0].listing.attributes["work_mode"], serde_json::json!("onsite"));
    }

    #[test]
    fn test_session_folds_images_and_markers() {
        let db = Database::open_in_memory().unwrap();
        let mut listing = NewListing::new(2, "Cleaner", "Office cleaning", 50).at(BLR.0, BLR.1, "MG Road");
        listing.image_urls = (1..=5).map(|i| format!("https://img/{i}.jpg")).collect();
        let id = db.insert_listing(Domain::LocalJobs, &listing).unwrap();
        db.add_bookmark(Domain::LocalJobs, 9, id).unwrap();

        let mut input = plan_input(None, None);
        input.user_id = Some(9);
        let plan = QueryPlanner::new(&LOCAL_JOBS, CursorTieBreak::default(), false)
            .plan(&input, 50.0)
            .unwrap();

        let mut session = db.session(&CancellationToken::new()).unwrap();
        let results = fold_rows(session.fetch(&plan).unwrap(), plan.shape);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].listing.images.len(), 5);
        assert!(results[0].listing.is_bookmarked);
        assert!(!results[0].listing.is_applied);
    }

    #[test]
    fn test_text_index_follows_listing_writes() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .insert_listing(Domain::UsedProducts, &NewListing::new(1, "Sofa set", "Three seater", 1))
            .unwrap();

        let conn = db.get_conn().unwrap();
        let hits = |q: &str| -> i64 {
            conn.query_row(
                "SELECT COUNT(*) FROM used_product_listings_fts WHERE used_product_listings_fts MATCH ?1",
                [q],
                |r| r.get(0),
            )
            .unwrap()
        };
        assert_eq!(hits("sofa"), 1);
        assert_eq!(hits("seater"), 1);

        conn.execute("UPDATE used_product_listings SET name = 'Armchair' WHERE id = ?1", [id])
            .unwrap();
        assert_eq!(hits("sofa"), 0);
        assert_eq!(hits("armchair"), 1);

        conn.execute("DELETE FROM used_product_listings WHERE id = ?1", [id]).unwrap();
        assert_eq!(hits("armchair"), 0);
    }

    #[test]
    fn test_tags_stored_as_json() {
        let db = Database::open_in_memory().unwrap();
        let mut listing = NewListing::new(1, "Driver", "", 1);
        listing.tags = vec!["driving".into(), "hindi".into()];
        db.insert_listing(Domain::Jobs, &listing).unwrap();

        let plan = QueryPlanner::new(&JOBS, CursorTieBreak::default(), false)
            .plan(&plan_input(None, None), 50.0)
            .unwrap();
        let mut session = db.session(&CancellationToken::new()).unwrap();
        let results = fold_rows(session.fetch(&plan).unwrap(), plan.shape);
        assert_eq!(results[0].listing.tags, vec!["driving", "hindi"]);
        assert!(results[0].listing.location.is_none());
    }
}
