//! Row mapping and result projection.
//!
//! The outer image join multiplies rows: a listing with five images arrives as
//! five consecutive rows. Folding keeps the first row per listing, collects the
//! images in row order, and preserves the store's ordering.

use std::collections::HashMap;

use rusqlite::types::Value as SqlValue;
use rusqlite::Row;
use serde_json::{Map, Number, Value};

use crate::binding::DomainBinding;
use crate::interface::RankedResult;
use crate::models::{parse_tags, GeoPoint, Listing, ListingImage, ListingLocation, LocationPrecision};
use crate::planner::QueryShape;
use crate::scoring::is_admissible;

/// One row of a planned query, before folding.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRow {
    pub listing_id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    pub created_at: i64,
    /// Raw embedded JSON array, parsed during projection.
    pub tags: Option<String>,
    pub location: Option<ListingLocation>,
    pub attributes: Map<String, Value>,
    pub relevance: f64,
    pub distance_km: Option<f64>,
    pub is_bookmarked: bool,
    pub is_applied: bool,
    pub rank_position: u64,
    pub image: Option<ListingImage>,
}

impl ScoredRow {
    /// Map a row produced by a `QueryPlanner` plan for `binding`.
    pub(crate) fn from_row(row: &Row, binding: &DomainBinding) -> rusqlite::Result<Self> {
        let latitude: Option<f64> = row.get("latitude")?;
        let longitude: Option<f64> = row.get("longitude")?;
        let location = match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => {
                let geo: Option<String> = row.get("geo")?;
                let precision: Option<String> = row.get("precision")?;
                Some(ListingLocation {
                    point: GeoPoint::new(latitude, longitude),
                    geo: geo.unwrap_or_default(),
                    precision: precision
                        .as_deref()
                        .map(LocationPrecision::from_database_str)
                        .unwrap_or_default(),
                })
            }
            _ => None,
        };

        let mut attributes = Map::new();
        for attr in binding.attributes {
            let value: SqlValue = row.get(format!("attr_{}", attr.name).as_str())?;
            attributes.insert(attr.name.to_string(), sql_to_json(value));
        }

        let image_id: Option<i64> = row.get("image_id")?;
        let image_url: Option<String> = row.get("image_url")?;
        let image = match (image_id, image_url) {
            (Some(id), Some(url)) => Some(ListingImage { id, url }),
            _ => None,
        };

        let rank_position: i64 = row.get("rank_position")?;

        Ok(Self {
            listing_id: row.get("listing_id")?,
            owner_id: row.get("owner_id")?,
            title: row.get::<_, Option<String>>("title")?.unwrap_or_default(),
            description: row.get::<_, Option<String>>("description")?.unwrap_or_default(),
            created_at: row.get("created_at")?,
            tags: row.get("tags")?,
            location,
            attributes,
            relevance: row.get::<_, Option<f64>>("relevance")?.unwrap_or(0.0),
            distance_km: row.get("distance_km")?,
            is_bookmarked: row.get::<_, i64>("is_bookmarked")? != 0,
            is_applied: row.get::<_, i64>("is_applied")? != 0,
            rank_position: rank_position.max(0) as u64,
            image,
        })
    }
}

fn sql_to_json(value: SqlValue) -> Value {
    match value {
        SqlValue::Null | SqlValue::Blob(_) => Value::Null,
        SqlValue::Integer(i) => Value::Number(i.into()),
        SqlValue::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        SqlValue::Text(s) => Value::String(s),
    }
}

/// Collapse joined rows into ranked results, one per listing.
///
/// Rows that fail the admission rule for `shape` are dropped even if the
/// store returned them.
pub fn fold_rows(rows: Vec<ScoredRow>, shape: QueryShape) -> Vec<RankedResult> {
    let mut results: Vec<RankedResult> = Vec::new();
    let mut positions: HashMap<i64, usize> = HashMap::new();
    let mut rejected = 0usize;

    for row in rows {
        if !is_admissible(row.relevance, shape.uses_text()) {
            rejected += 1;
            continue;
        }

        if let Some(&index) = positions.get(&row.listing_id) {
            if let Some(image) = row.image {
                let images = &mut results[index].listing.images;
                if !images.iter().any(|i| i.id == image.id) {
                    images.push(image);
                }
            }
            continue;
        }

        positions.insert(row.listing_id, results.len());
        results.push(project(row, shape));
    }

    if rejected > 0 {
        tracing::debug!("dropped {} rows without a positive relevance", rejected);
    }
    results
}

fn project(row: ScoredRow, shape: QueryShape) -> RankedResult {
    RankedResult {
        distance_km: row.distance_km.filter(|_| shape.uses_anchor()),
        relevance: Some(row.relevance).filter(|_| shape.uses_text()),
        rank: row.rank_position,
        listing: Listing {
            id: row.listing_id,
            owner_id: row.owner_id,
            title: row.title,
            description: row.description,
            created_at: row.created_at,
            location: row.location,
            attributes: row.attributes,
            tags: parse_tags(row.tags.as_deref()),
            images: row.image.into_iter().collect(),
            is_bookmarked: row.is_bookmarked,
            is_applied: row.is_applied,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::USED_PRODUCTS;
    use rusqlite::Connection;

    fn row(listing_id: i64, rank: u64, image: Option<(i64, &str)>) -> ScoredRow {
        ScoredRow {
            listing_id,
            owner_id: 1,
            title: format!("Listing {listing_id}"),
            description: String::new(),
            created_at: 1_000 - listing_id,
            tags: None,
            location: None,
            attributes: Map::new(),
            relevance: 0.5,
            distance_km: Some(3.0),
            is_bookmarked: false,
            is_applied: false,
            rank_position: rank,
            image: image.map(|(id, url)| ListingImage { id, url: url.to_string() }),
        }
    }

    #[test]
    fn test_images_fold_into_one_result() {
        let rows = (1..=5).map(|i| row(7, 1, Some((i, "https://img/x.jpg")))).collect();
        let results = fold_rows(rows, QueryShape::AnchorText);
        assert_eq!(results.len(), 1);
        let ids: Vec<i64> = results[0].listing.images.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_order_preserved_first_seen_wins() {
        let mut second_copy = row(1, 1, Some((11, "b")));
        second_copy.title = "ignored".into();
        let rows = vec![
            row(3, 1, Some((10, "a"))),
            row(1, 2, None),
            row(3, 1, Some((12, "c"))),
            second_copy,
            row(2, 3, None),
        ];
        let results = fold_rows(rows, QueryShape::AnchorOnly);
        let ids: Vec<i64> = results.iter().map(|r| r.listing.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(results[1].listing.title, "Listing 1");
        assert_eq!(results[0].listing.images.len(), 2);
    }

    #[test]
    fn test_duplicate_image_rows_collapse() {
        let rows = vec![row(1, 1, Some((5, "a"))), row(1, 1, Some((5, "a")))];
        let results = fold_rows(rows, QueryShape::Chronological);
        assert_eq!(results[0].listing.images.len(), 1);
    }

    #[test]
    fn test_scores_reported_per_shape() {
        let anchor_only = fold_rows(vec![row(1, 1, None)], QueryShape::AnchorOnly);
        assert_eq!(anchor_only[0].distance_km, Some(3.0));
        assert_eq!(anchor_only[0].relevance, None);

        let text_only = fold_rows(vec![row(1, 1, None)], QueryShape::TextOnly);
        assert_eq!(text_only[0].distance_km, None);
        assert_eq!(text_only[0].relevance, Some(0.5));
    }

    #[test]
    fn test_zero_relevance_rejected_when_text_active() {
        let mut irrelevant = row(2, 2, None);
        irrelevant.relevance = 0.0;
        let results = fold_rows(vec![row(1, 1, None), irrelevant.clone()], QueryShape::TextOnly);
        assert_eq!(results.len(), 1);

        let results = fold_rows(vec![irrelevant], QueryShape::Chronological);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_from_row_maps_columns() {
        let conn = Connection::open_in_memory().unwrap();
        let sql = r#"SELECT 9 AS listing_id, 4 AS owner_id, 'Bicycle' AS title, NULL AS description,
                            1700 AS created_at, NULL AS tags, 12.9 AS latitude, 77.6 AS longitude,
                            'Indiranagar' AS geo, 'precise' AS precision,
                            2500.5 AS attr_price, 'INR' AS attr_price_unit, NULL AS attr_condition,
                            0.75 AS relevance, 4.2 AS distance_km, 1 AS is_bookmarked, 0 AS is_applied,
                            3 AS rank_position, 31 AS image_id, 'https://img/31.jpg' AS image_url"#;
        let mapped = conn
            .query_row(sql, [], |r| ScoredRow::from_row(r, &USED_PRODUCTS))
            .unwrap();

        assert_eq!(mapped.listing_id, 9);
        assert_eq!(mapped.description, "");
        assert_eq!(mapped.rank_position, 3);
        assert!(mapped.is_bookmarked);
        assert!(!mapped.is_applied);
        let location = mapped.location.unwrap();
        assert_eq!(location.precision, LocationPrecision::Precise);
        assert_eq!(location.geo, "Indiranagar");
        assert_eq!(mapped.attributes["price"], serde_json::json!(2500.5));
        assert_eq!(mapped.attributes["price_unit"], serde_json::json!("INR"));
        assert_eq!(mapped.attributes["condition"], Value::Null);
        assert_eq!(mapped.image, Some(ListingImage { id: 31, url: "https://img/31.jpg".into() }));
    }
}
