//! Query planning: shape selection and SQL assembly.
//!
//! Two independent facts pick one of four shapes: whether the request has a
//! usable anchor, and whether it has query text. The shape decides the join
//! kind on the location table, the admission predicate, and the ordering.
//!
//! Every plan has the same three-stage layout so that row mapping is identical
//! for all shapes:
//!
//! ```text
//! scored  — one row per listing: attributes, FTS5 match, distance, user markers, filters
//! ranked  — shape predicate + cursor predicate, ordered, LIMIT (listings, not rows)
//! outer   — LEFT JOIN images, ordered by rank position then image id
//! ```

use rusqlite::types::{ToSql, Value};
use serde::{Deserialize, Serialize};

use crate::binding::DomainBinding;
use crate::cursor::Cursor;
use crate::interface::{Filter, GeoRankError};
use crate::models::GeoPoint;
use crate::scoring::{fts_query, relevance_expr, DISTANCE_FN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryShape {
    /// Relevance + distance, `distance < radius`, ordered by distance then relevance.
    AnchorText,
    /// Distance only, ordered by distance then recency.
    AnchorOnly,
    /// Relevance only, ordered by relevance.
    TextOnly,
    /// Recency only.
    Chronological,
}

impl QueryShape {
    pub fn select(has_anchor: bool, has_query_text: bool) -> Self {
        match (has_anchor, has_query_text) {
            (true, true) => QueryShape::AnchorText,
            (true, false) => QueryShape::AnchorOnly,
            (false, true) => QueryShape::TextOnly,
            (false, false) => QueryShape::Chronological,
        }
    }

    pub fn uses_anchor(&self) -> bool {
        matches!(self, QueryShape::AnchorText | QueryShape::AnchorOnly)
    }

    pub fn uses_text(&self) -> bool {
        matches!(self, QueryShape::AnchorText | QueryShape::TextOnly)
    }

    /// Trailing `created_at, listing_id` keys make the order total, so repeated reads are identical.
    fn order_by(&self) -> &'static str {
        match self {
            QueryShape::AnchorText => "distance_km ASC, relevance DESC, created_at DESC, listing_id DESC",
            QueryShape::AnchorOnly => "distance_km ASC, created_at DESC, listing_id DESC",
            QueryShape::TextOnly => "relevance DESC, created_at DESC, listing_id DESC",
            QueryShape::Chronological => "created_at DESC, listing_id DESC",
        }
    }
}

/// How rows tied on relevance with the cursor are treated on the next page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorTieBreak {
    /// Ties on relevance are re-admitted while within the current radius, so
    /// they may repeat. Without a radius this behaves as `Strict`.
    #[default]
    ReadmitWithinRadius,
    /// Ties on relevance continue strictly by creation time.
    Strict,
}

/// Where the requested page starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageWindow<'a> {
    /// Cursor pagination; `None` is the first page.
    Cursor(Option<&'a Cursor>),
    /// Legacy offset pagination.
    Offset(u64),
}

#[derive(Debug, Clone, Copy)]
pub struct PlanInput<'a> {
    pub user_id: Option<i64>,
    pub query_text: Option<&'a str>,
    /// Already validated (or deliberately kept for legacy compatibility).
    pub anchor: Option<GeoPoint>,
    pub window: PageWindow<'a>,
    pub page_size: u32,
    pub filters: &'a [Filter],
}

impl PlanInput<'_> {
    pub fn shape(&self) -> QueryShape {
        QueryShape::select(self.anchor.is_some(), self.query_text.is_some())
    }
}

/// A fully bound query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub binding: &'static DomainBinding,
    pub shape: QueryShape,
    /// Radius the plan admits rows within; `None` for unanchored shapes.
    pub radius_km: Option<f64>,
    pub sql: String,
    /// Named parameters, names include the `:` prefix.
    pub params: Vec<(String, Value)>,
}

impl QueryPlan {
    pub fn named_params(&self) -> Vec<(&str, &dyn ToSql)> {
        self.params
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect()
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

#[derive(Default)]
struct Bindings {
    params: Vec<(String, Value)>,
}

impl Bindings {
    /// Bind a named parameter and return its placeholder. Rebinding a name keeps the first value.
    fn bind(&mut self, name: &str, value: impl Into<Value>) -> String {
        let placeholder = format!(":{name}");
        if !self.params.iter().any(|(n, _)| *n == placeholder) {
            self.params.push((placeholder.clone(), value.into()));
        }
        placeholder
    }
}

/// Builds query plans for one domain.
#[derive(Debug, Clone, Copy)]
pub struct QueryPlanner {
    binding: &'static DomainBinding,
    tie_break: CursorTieBreak,
    legacy_anchor_predicate: bool,
}

impl QueryPlanner {
    pub fn new(binding: &'static DomainBinding, tie_break: CursorTieBreak, legacy_anchor_predicate: bool) -> Self {
        Self {
            binding,
            tie_break,
            legacy_anchor_predicate,
        }
    }

    pub fn binding(&self) -> &'static DomainBinding {
        self.binding
    }

    /// Reject filters on columns the domain does not expose.
    pub fn validate_filters(&self, filters: &[Filter]) -> Result<(), GeoRankError> {
        for filter in filters {
            if self.binding.attribute(filter.field()).is_none() {
                return Err(GeoRankError::InvalidInput(format!(
                    "'{}' is not a filterable field for {}",
                    filter.field(),
                    self.binding.domain
                )));
            }
            match filter {
                Filter::AtLeast { value, .. } | Filter::AtMost { value, .. } if !value.is_finite() => {
                    return Err(GeoRankError::InvalidInput(format!(
                        "filter on '{}' needs a finite bound",
                        filter.field()
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Plan one attempt at `radius_km`. The radius is ignored by unanchored shapes.
    pub fn plan(&self, input: &PlanInput<'_>, radius_km: f64) -> Result<QueryPlan, GeoRankError> {
        if input.page_size == 0 {
            return Err(GeoRankError::InvalidInput("page size must be positive".into()));
        }
        self.validate_filters(input.filters)?;

        let b = self.binding;
        let shape = input.shape();
        let mut bindings = Bindings::default();

        // ── scored ──────────────────────────────────────────────────────────
        let mut columns: Vec<String> = vec![
            "l.id AS listing_id".into(),
            "l.owner_id AS owner_id".into(),
            format!("l.{} AS title", b.title_column),
            format!("l.{} AS description", b.description_column),
            "l.created_at AS created_at".into(),
            match b.tags_column {
                Some(col) => format!("l.{col} AS tags"),
                None => "NULL AS tags".into(),
            },
            "loc.latitude AS latitude".into(),
            "loc.longitude AS longitude".into(),
            "loc.geo AS geo".into(),
            "loc.precision AS precision".into(),
        ];
        columns.extend(b.attributes.iter().map(|a| format!("l.{0} AS attr_{0}", a.name)));

        // Text without indexable words matches nothing
        let text_match = input
            .query_text
            .filter(|_| shape.uses_text())
            .map(fts_query)
            .filter(|q| !q.is_empty())
            .map(|q| bindings.bind("query", q));
        match &text_match {
            Some(_) => columns.push(format!("{} AS relevance", relevance_expr(b.fts_table))),
            None => columns.push("0.0 AS relevance".into()),
        }

        let anchor_params = match input.anchor.filter(|_| shape.uses_anchor()) {
            Some(anchor) => {
                let lat = bindings.bind("anchor_lat", anchor.latitude);
                let lon = bindings.bind("anchor_lon", anchor.longitude);
                columns.push(format!("{DISTANCE_FN}({lat}, {lon}, loc.latitude, loc.longitude) AS distance_km"));
                Some((lat, lon))
            }
            None => {
                columns.push("NULL AS distance_km".into());
                None
            }
        };

        let location_join = if shape.uses_anchor() { "INNER JOIN" } else { "LEFT JOIN" };
        let mut joins = vec![format!(
            "{location_join} {} loc ON loc.{} = l.id",
            b.location_table, b.location_fk
        )];
        if text_match.is_some() {
            joins.insert(0, format!("INNER JOIN {fts} ON {fts}.rowid = l.id", fts = b.fts_table));
        }

        match input.user_id {
            Some(user_id) => {
                let u = bindings.bind("user_id", user_id);
                joins.push(format!(
                    "LEFT JOIN {} bm ON bm.{} = l.id AND bm.user_id = {u}",
                    b.bookmarks.table, b.bookmarks.listing_fk
                ));
                columns.push("CASE WHEN bm.user_id IS NULL THEN 0 ELSE 1 END AS is_bookmarked".into());
                match b.applications {
                    Some(applications) => {
                        joins.push(format!(
                            "LEFT JOIN {} ap ON ap.{} = l.id AND ap.user_id = {u}",
                            applications.table, applications.listing_fk
                        ));
                        columns.push("CASE WHEN ap.user_id IS NULL THEN 0 ELSE 1 END AS is_applied".into());
                    }
                    None => columns.push("0 AS is_applied".into()),
                }
            }
            None => {
                columns.push("0 AS is_bookmarked".into());
                columns.push("0 AS is_applied".into());
            }
        }

        let mut scored_where = self.filter_predicates(input.filters, &mut bindings);
        if let Some(q) = &text_match {
            scored_where.insert(0, format!("{} MATCH {q}", b.fts_table));
        }
        if self.legacy_anchor_predicate {
            if let Some((lat, lon)) = &anchor_params {
                scored_where.push(format!("{lat} BETWEEN -90 AND 90 AND {lon} BETWEEN -180 AND 180"));
            }
        }

        // ── ranked ──────────────────────────────────────────────────────────
        let mut ranked_where: Vec<String> = Vec::new();
        let radius = anchor_params.as_ref().map(|_| bindings.bind("radius_km", radius_km));
        if let Some(r) = &radius {
            ranked_where.push(format!("distance_km < {r}"));
        }
        if shape.uses_text() {
            ranked_where.push("relevance > 0".into());
        }
        if let PageWindow::Cursor(Some(cursor)) = input.window {
            ranked_where.push(self.continuation_predicate(shape, cursor, radius.as_deref(), &mut bindings));
        }

        let limit = bindings.bind("limit", i64::from(input.page_size));
        let offset = match input.window {
            PageWindow::Offset(offset) if offset > 0 => {
                format!(" OFFSET {}", bindings.bind("offset", offset as i64))
            }
            _ => String::new(),
        };

        // ── outer ───────────────────────────────────────────────────────────
        let (image_columns, image_join, image_order) = match b.images {
            Some(images) => (
                format!("img.id AS image_id, img.{} AS image_url", images.url_column),
                format!("LEFT JOIN {} img ON img.{} = ranked.listing_id", images.table, images.listing_fk),
                ", img.id ASC",
            ),
            None => ("NULL AS image_id, NULL AS image_url".to_string(), String::new(), ""),
        };

        let order = shape.order_by();
        let sql = format!(
            r#"WITH scored AS (
    SELECT {columns}
    FROM {table} l
    {joins}{scored_where}
),
ranked AS (
    SELECT scored.*, ROW_NUMBER() OVER (ORDER BY {order}) AS rank_position
    FROM scored{ranked_where}
    ORDER BY {order}
    LIMIT {limit}{offset}
)
SELECT ranked.*, {image_columns}
FROM ranked
{image_join}
ORDER BY ranked.rank_position ASC{image_order}"#,
            columns = columns.join(",\n           "),
            table = b.listing_table,
            joins = joins.join("\n    "),
            scored_where = where_clause(&scored_where, "\n    "),
            ranked_where = where_clause(&ranked_where, "\n    "),
        );

        Ok(QueryPlan {
            binding: b,
            shape,
            radius_km: radius.map(|_| radius_km),
            sql,
            params: bindings.params,
        })
    }

    fn filter_predicates(&self, filters: &[Filter], bindings: &mut Bindings) -> Vec<String> {
        let mut predicates = Vec::new();
        for (i, filter) in filters.iter().enumerate() {
            // validate_filters has already rejected unknown fields
            let Some(attr) = self.binding.attribute(filter.field()) else {
                continue;
            };
            match filter {
                Filter::OneOf { values, .. } => {
                    if values.is_empty() {
                        continue;
                    }
                    let placeholders: Vec<String> = values
                        .iter()
                        .enumerate()
                        .map(|(j, v)| bindings.bind(&format!("f{i}_{j}"), v.clone()))
                        .collect();
                    predicates.push(format!("l.{} IN ({})", attr.name, placeholders.join(", ")));
                }
                Filter::AtLeast { value, .. } => {
                    let p = bindings.bind(&format!("f{i}"), *value);
                    predicates.push(format!("l.{} >= {p}", attr.name));
                }
                Filter::AtMost { value, .. } => {
                    let p = bindings.bind(&format!("f{i}"), *value);
                    predicates.push(format!("l.{} <= {p}", attr.name));
                }
            }
        }
        predicates
    }

    /// Rows admitted after `cursor`.
    ///
    /// With text active, relevance is the primary continuation key. A cursor
    /// minted by a text-less search carries no relevance and falls back to time.
    /// Re-admitting ties needs a radius to bound it; unanchored plans always
    /// continue strictly, otherwise a tie group as large as a page never advances.
    fn continuation_predicate(
        &self,
        shape: QueryShape,
        cursor: &Cursor,
        radius: Option<&str>,
        bindings: &mut Bindings,
    ) -> String {
        match cursor.last_relevance.filter(|_| shape.uses_text()) {
            Some(last_relevance) => {
                let r = bindings.bind("cursor_relevance", last_relevance);
                match (self.tie_break, radius) {
                    (CursorTieBreak::ReadmitWithinRadius, Some(radius)) => {
                        format!("(relevance < {r} OR (relevance = {r} AND distance_km <= {radius}))")
                    }
                    (CursorTieBreak::ReadmitWithinRadius, None) | (CursorTieBreak::Strict, _) => {
                        let t = bindings.bind("cursor_ts", cursor.last_timestamp);
                        format!("(relevance < {r} OR (relevance = {r} AND created_at < {t}))")
                    }
                }
            }
            None => {
                let t = bindings.bind("cursor_ts", cursor.last_timestamp);
                format!("created_at < {t}")
            }
        }
    }
}

fn where_clause(predicates: &[String], indent: &str) -> String {
    if predicates.is_empty() {
        String::new()
    } else {
        format!("{indent}WHERE {}", predicates.join(" AND "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{JOBS, LOCAL_JOBS, USED_PRODUCTS};

    fn input<'a>(query: Option<&'a str>, anchor: Option<GeoPoint>, window: PageWindow<'a>) -> PlanInput<'a> {
        PlanInput {
            user_id: None,
            query_text: query,
            anchor,
            window,
            page_size: 20,
            filters: &[],
        }
    }

    fn planner(binding: &'static DomainBinding) -> QueryPlanner {
        QueryPlanner::new(binding, CursorTieBreak::default(), false)
    }

    fn strict(binding: &'static DomainBinding) -> QueryPlanner {
        QueryPlanner::new(binding, CursorTieBreak::Strict, false)
    }

    const BLR: GeoPoint = GeoPoint { latitude: 12.97, longitude: 77.59 };

    #[test]
    fn test_shape_selection() {
        assert_eq!(QueryShape::select(true, true), QueryShape::AnchorText);
        assert_eq!(QueryShape::select(true, false), QueryShape::AnchorOnly);
        assert_eq!(QueryShape::select(false, true), QueryShape::TextOnly);
        assert_eq!(QueryShape::select(false, false), QueryShape::Chronological);
    }

    #[test]
    fn test_anchor_text_plan() {
        let plan = planner(&JOBS)
            .plan(&input(Some("driver"), Some(BLR), PageWindow::Cursor(None)), 50.0)
            .unwrap();
        assert_eq!(plan.shape, QueryShape::AnchorText);
        assert_eq!(plan.radius_km, Some(50.0));
        assert!(plan.sql.contains("INNER JOIN job_locations loc"));
        assert!(plan.sql.contains("distance_km < :radius_km"));
        assert!(plan.sql.contains("INNER JOIN jobs_fts ON jobs_fts.rowid = l.id"));
        assert!(plan.sql.contains("jobs_fts MATCH :query"));
        assert!(plan.sql.contains("-bm25(jobs_fts, 1.0, 1.0) AS relevance"));
        assert!(plan.sql.contains("relevance > 0"));
        assert!(plan.sql.contains("ORDER BY distance_km ASC, relevance DESC"));
        assert_eq!(plan.param(":query"), Some(&Value::Text(r#""driver"*"#.into())));
        assert_eq!(plan.param(":radius_km"), Some(&Value::Real(50.0)));
        assert_eq!(plan.param(":limit"), Some(&Value::Integer(20)));
    }

    #[test]
    fn test_unanchored_plans_left_join_location() {
        let plan = planner(&JOBS)
            .plan(&input(Some("driver"), None, PageWindow::Cursor(None)), 50.0)
            .unwrap();
        assert_eq!(plan.shape, QueryShape::TextOnly);
        assert_eq!(plan.radius_km, None);
        assert!(plan.sql.contains("LEFT JOIN job_locations loc"));
        assert!(!plan.sql.contains(":radius_km"));
        assert!(plan.sql.contains("NULL AS distance_km"));
        assert!(plan.sql.contains("ORDER BY relevance DESC"));
    }

    #[test]
    fn test_chronological_plan_has_no_text_or_distance() {
        let plan = planner(&USED_PRODUCTS)
            .plan(&input(None, None, PageWindow::Cursor(None)), 50.0)
            .unwrap();
        assert_eq!(plan.shape, QueryShape::Chronological);
        assert!(plan.sql.contains("0.0 AS relevance"));
        assert!(!plan.sql.contains("bm25"));
        assert!(!plan.sql.contains("MATCH"));
        assert!(plan.sql.contains("l.name AS title"));
        assert!(plan.sql.contains("ORDER BY created_at DESC, listing_id DESC"));
        assert_eq!(plan.params.len(), 1);
    }

    #[test]
    fn test_cursor_without_text_continues_by_time() {
        let cursor = Cursor::new(1_000, None);
        let plan = planner(&JOBS)
            .plan(&input(None, Some(BLR), PageWindow::Cursor(Some(&cursor))), 80.0)
            .unwrap();
        assert!(plan.sql.contains("created_at < :cursor_ts"));
        assert_eq!(plan.param(":cursor_ts"), Some(&Value::Integer(1_000)));
    }

    #[test]
    fn test_text_without_words_matches_nothing() {
        let plan = planner(&JOBS)
            .plan(&input(Some("!!! ???"), None, PageWindow::Cursor(None)), 50.0)
            .unwrap();
        assert_eq!(plan.shape, QueryShape::TextOnly);
        assert!(plan.sql.contains("0.0 AS relevance"));
        assert!(plan.sql.contains("relevance > 0"));
        assert!(plan.param(":query").is_none());
    }

    #[test]
    fn test_cursor_readmits_ties_within_radius() {
        let cursor = Cursor::new(1_000, Some(0.5));
        let plan = planner(&JOBS)
            .plan(&input(Some("driver"), Some(BLR), PageWindow::Cursor(Some(&cursor))), 80.0)
            .unwrap();
        assert!(plan
            .sql
            .contains("(relevance < :cursor_relevance OR (relevance = :cursor_relevance AND distance_km <= :radius_km))"));
        assert!(plan.param(":cursor_ts").is_none());
    }

    #[test]
    fn test_readmission_without_anchor_continues_strictly() {
        let cursor = Cursor::new(1_000, Some(0.5));
        let plan = planner(&JOBS)
            .plan(&input(Some("driver"), None, PageWindow::Cursor(Some(&cursor))), 50.0)
            .unwrap();
        assert!(!plan.sql.contains("relevance <= :cursor_relevance"));
        assert!(plan
            .sql
            .contains("(relevance < :cursor_relevance OR (relevance = :cursor_relevance AND created_at < :cursor_ts))"));
    }

    #[test]
    fn test_strict_tie_break_uses_timestamp() {
        let cursor = Cursor::new(1_000, Some(0.5));
        let plan = strict(&JOBS)
            .plan(&input(Some("driver"), Some(BLR), PageWindow::Cursor(Some(&cursor))), 50.0)
            .unwrap();
        assert!(plan
            .sql
            .contains("(relevance < :cursor_relevance OR (relevance = :cursor_relevance AND created_at < :cursor_ts))"));
    }

    #[test]
    fn test_offset_window() {
        let plan = planner(&LOCAL_JOBS)
            .plan(&input(None, None, PageWindow::Offset(60)), 50.0)
            .unwrap();
        assert!(plan.sql.contains("LIMIT :limit OFFSET :offset"));
        assert_eq!(plan.param(":offset"), Some(&Value::Integer(60)));

        let first = planner(&LOCAL_JOBS)
            .plan(&input(None, None, PageWindow::Offset(0)), 50.0)
            .unwrap();
        assert!(!first.sql.contains("OFFSET"));
    }

    #[test]
    fn test_image_join_only_for_domains_with_images() {
        let local = planner(&LOCAL_JOBS)
            .plan(&input(None, None, PageWindow::Cursor(None)), 50.0)
            .unwrap();
        assert!(local.sql.contains("LEFT JOIN local_job_images img ON img.local_job_id = ranked.listing_id"));

        let jobs = planner(&JOBS).plan(&input(None, None, PageWindow::Cursor(None)), 50.0).unwrap();
        assert!(jobs.sql.contains("NULL AS image_id"));
    }

    #[test]
    fn test_user_markers() {
        let mut with_user = input(None, None, PageWindow::Cursor(None));
        with_user.user_id = Some(7);
        let plan = planner(&JOBS).plan(&with_user, 50.0).unwrap();
        assert!(plan.sql.contains("LEFT JOIN job_bookmarks bm ON bm.job_id = l.id AND bm.user_id = :user_id"));
        assert!(plan.sql.contains("LEFT JOIN job_applications ap"));
        assert_eq!(plan.param(":user_id"), Some(&Value::Integer(7)));

        let plan = planner(&USED_PRODUCTS).plan(&with_user, 50.0).unwrap();
        assert!(plan.sql.contains("0 AS is_applied"));
    }

    #[test]
    fn test_filters_are_bound() {
        let filters = vec![
            Filter::OneOf { field: "work_mode".into(), values: vec!["remote".into(), "hybrid".into()] },
            Filter::AtLeast { field: "salary_min".into(), value: 30_000.0 },
            Filter::OneOf { field: "salary_unit".into(), values: vec![] },
        ];
        let mut req = input(None, None, PageWindow::Cursor(None));
        req.filters = &filters;
        let plan = planner(&JOBS).plan(&req, 50.0).unwrap();
        assert!(plan.sql.contains("l.work_mode IN (:f0_0, :f0_1)"));
        assert!(plan.sql.contains("l.salary_min >= :f1"));
        assert!(!plan.sql.contains("l.salary_unit IN"));
    }

    #[test]
    fn test_unknown_filter_field_rejected() {
        let filters = vec![Filter::AtMost { field: "id; DROP TABLE jobs".into(), value: 1.0 }];
        let mut req = input(None, None, PageWindow::Cursor(None));
        req.filters = &filters;
        assert!(matches!(planner(&JOBS).plan(&req, 50.0), Err(GeoRankError::InvalidInput(_))));
    }

    #[test]
    fn test_non_finite_filter_bound_rejected() {
        let filters = vec![Filter::AtMost { field: "price".into(), value: f64::NAN }];
        assert!(planner(&USED_PRODUCTS).validate_filters(&filters).is_err());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let mut req = input(None, None, PageWindow::Cursor(None));
        req.page_size = 0;
        assert!(matches!(planner(&JOBS).plan(&req, 50.0), Err(GeoRankError::InvalidInput(_))));
    }

    #[test]
    fn test_legacy_anchor_predicate() {
        let plan = QueryPlanner::new(&JOBS, CursorTieBreak::default(), true)
            .plan(&input(None, Some(GeoPoint::new(120.0, 0.0)), PageWindow::Cursor(None)), 50.0)
            .unwrap();
        assert!(plan
            .sql
            .contains(":anchor_lat BETWEEN -90 AND 90 AND :anchor_lon BETWEEN -180 AND 180"));
    }
}
