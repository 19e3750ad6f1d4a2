//! Relevance and distance scoring.
//!
//! Relevance comes from SQLite FTS5: each domain keeps an FTS5 index over its
//! title and description, and a row's relevance is `-bm25(..)` with both
//! columns weighted equally. FTS5 floors term IDF at a small positive value,
//! so every matched row scores above zero. Distance is a deterministic scalar
//! function installed on every pooled connection by `register_functions`.

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

use crate::models::GeoPoint;

/// Mean Earth radius (IUGG) in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

pub const DISTANCE_FN: &str = "georank_distance_km";

/// Query terms shorter than this only match whole words.
const MIN_PREFIX_LEN: usize = 3;

/// Build an FTS5 MATCH expression from free text.
///
/// Words are split the way the `unicode61` tokenizer splits them, quoted so
/// that FTS5 operators in user input stay literal, and ORed together. Terms
/// of at least `MIN_PREFIX_LEN` characters also match as word prefixes.
/// Returns an empty string when the text has no words.
pub fn fts_query(text: &str) -> String {
    let mut terms: Vec<String> = Vec::new();
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let word = word.to_lowercase();
        if !terms.contains(&word) {
            terms.push(word);
        }
    }
    terms
        .iter()
        .map(|t| {
            if t.chars().count() >= MIN_PREFIX_LEN {
                format!("\"{t}\"*")
            } else {
                format!("\"{t}\"")
            }
        })
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// SQL expression for the relevance of the current row of `fts_table`.
/// Only valid in a statement that runs a MATCH against that table.
pub(crate) fn relevance_expr(fts_table: &str) -> String {
    format!("-bm25({fts_table}, 1.0, 1.0)")
}

/// Great-circle distance in kilometres on a spherical Earth.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

pub fn distance_km(from: GeoPoint, to: GeoPoint) -> f64 {
    haversine_km(from.latitude, from.longitude, to.latitude, to.longitude)
}

/// With query text active, only rows with a positive relevance are admissible.
pub(crate) fn is_admissible(relevance: f64, has_query_text: bool) -> bool {
    !has_query_text || relevance > 0.0
}

/// Install the distance function on a connection.
pub(crate) fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function(DISTANCE_FN, 4, flags, |ctx| {
        let lat1: Option<f64> = ctx.get(0)?;
        let lon1: Option<f64> = ctx.get(1)?;
        let lat2: Option<f64> = ctx.get(2)?;
        let lon2: Option<f64> = ctx.get(3)?;
        Ok(match (lat1, lon1, lat2, lon2) {
            (Some(lat1), Some(lon1), Some(lat2), Some(lon2)) => Some(haversine_km(lat1, lon1, lat2, lon2)),
            _ => None,
        })
    })?;

    Ok(())
}
