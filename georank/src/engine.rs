//! Geo-ranked search orchestration.
//!
//! One engine per domain. A search validates the request, resolves the
//! anchor, decodes the cursor, records the term, then runs the planned query
//! inside a single store session, widening the radius while the page is short.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::binding::DomainBinding;
use crate::config::EngineConfig;
use crate::cursor::{Cursor, PageState};
use crate::expander::RadiusExpander;
use crate::interface::{
    Domain, GeoRankError, ListingStore, SearchNotice, SearchPage, SearchRequest, StoreSession,
    TermPopularityRecorder, UserLocationProvider,
};
use crate::models::GeoPoint;
use crate::planner::{PageWindow, PlanInput, QueryPlanner};
use crate::projection::fold_rows;

pub struct GeoRankedSearchEngine<S: ListingStore> {
    store: Arc<S>,
    locations: Arc<dyn UserLocationProvider>,
    recorder: Arc<dyn TermPopularityRecorder>,
    binding: &'static DomainBinding,
    config: Arc<EngineConfig>,
}

impl<S: ListingStore> GeoRankedSearchEngine<S> {
    pub fn new(
        store: Arc<S>,
        locations: Arc<dyn UserLocationProvider>,
        recorder: Arc<dyn TermPopularityRecorder>,
        domain: Domain,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            store,
            locations,
            recorder,
            binding: DomainBinding::for_domain(domain),
            config,
        }
    }

    pub fn domain(&self) -> Domain {
        self.binding.domain
    }

    fn planner(&self) -> QueryPlanner {
        QueryPlanner::new(
            self.binding,
            self.config.cursor_tie_break,
            self.config.legacy_anchor_predicate,
        )
    }

    fn expander(&self) -> RadiusExpander {
        RadiusExpander::new(
            self.config.default_radius_km,
            self.config.radius_step_km,
            self.config.domain(self.domain()).radius_cap_km,
        )
    }

    fn page_size(&self, request: &SearchRequest) -> Result<u32, GeoRankError> {
        let page_size = request
            .page_size
            .unwrap_or(self.config.domain(self.domain()).default_page_size);
        if page_size == 0 || page_size > self.config.max_page_size {
            return Err(GeoRankError::InvalidInput(format!(
                "page size must be within 1..={}",
                self.config.max_page_size
            )));
        }
        Ok(page_size)
    }

    /// Explicit anchor first, then the user's stored location.
    fn resolve_anchor(
        &self,
        request: &SearchRequest,
        notices: &mut Vec<SearchNotice>,
    ) -> Result<Option<GeoPoint>, GeoRankError> {
        let anchor = match (request.anchor, request.user_id) {
            (Some(anchor), _) => Some(anchor),
            (None, Some(user_id)) => self.locations.resolve(user_id)?,
            (None, None) => None,
        };

        match anchor {
            Some(point) if !point.is_valid() => {
                notices.push(SearchNotice::InvalidAnchor);
                if self.config.legacy_anchor_predicate {
                    tracing::warn!(
                        "anchor ({}, {}) is out of range, keeping it for legacy filtering",
                        point.latitude,
                        point.longitude
                    );
                    Ok(Some(point))
                } else {
                    tracing::warn!(
                        "anchor ({}, {}) is out of range, searching without location",
                        point.latitude,
                        point.longitude
                    );
                    Ok(None)
                }
            }
            other => Ok(other),
        }
    }

    /// Term popularity is bookkeeping: a failed write never fails the search.
    fn record_term(&self, query_text: &str) {
        let term = query_text.to_lowercase();
        if let Err(e) = self.recorder.record_search(self.domain(), &term) {
            tracing::warn!("failed to record search term '{}' for {}: {}", term, self.domain(), e);
        }
    }

    /// Run one logical search. Blocks on the store; call from a blocking thread.
    pub fn search(&self, request: &SearchRequest, cancel: &CancellationToken) -> Result<SearchPage, GeoRankError> {
        request.validate()?;
        let page_size = self.page_size(request)?;
        let planner = self.planner();
        planner.validate_filters(&request.filters)?;

        if cancel.is_cancelled() {
            return Err(GeoRankError::Cancelled);
        }

        let mut notices = Vec::new();
        let query_text = request.query_text();
        let anchor = self.resolve_anchor(request, &mut notices)?;

        let page_state = match request.page {
            Some(_) => PageState::Initial,
            None => {
                let (state, malformed) = PageState::from_token(request.cursor.as_deref());
                if malformed {
                    notices.push(SearchNotice::MalformedCursor);
                }
                state
            }
        };
        let window = match request.page {
            Some(page) => PageWindow::Offset(u64::from(page - 1) * u64::from(page_size)),
            None => PageWindow::Cursor(page_state.cursor()),
        };

        let input = PlanInput {
            user_id: request.user_id,
            query_text,
            anchor,
            window,
            page_size,
            filters: &request.filters,
        };

        // Before checkout: a recorder sharing the store's pool must not wait on our own session
        if let Some(text) = query_text {
            self.record_term(text);
        }

        let expander = self.expander();
        let mut radius = expander.initial();
        let mut session = self.store.checkout(cancel)?;

        let (results, plan) = loop {
            if cancel.is_cancelled() {
                return Err(GeoRankError::Cancelled);
            }

            let plan = planner.plan(&input, radius)?;
            let rows = session.fetch(&plan)?;
            let row_count = rows.len();
            let results = fold_rows(rows, plan.shape);
            tracing::debug!(
                domain = %self.domain(),
                shape = ?plan.shape,
                radius_km = ?plan.radius_km,
                rows = row_count,
                listings = results.len(),
                "search attempt"
            );

            match expander.widen(radius, results.len(), page_size as usize, plan.shape.uses_anchor()) {
                Some(next) => {
                    tracing::info!(
                        "{}: {} of {} listings within {} km, widening to {} km",
                        self.domain(),
                        results.len(),
                        page_size,
                        radius,
                        next
                    );
                    radius = next;
                }
                None => break (results, plan),
            }
        };
        drop(session);

        let full_page = results.len() == page_size as usize;
        let next_cursor = match (request.page, results.last()) {
            (None, Some(last)) if full_page => {
                let next = Cursor::new(
                    last.listing.created_at,
                    last.relevance.filter(|_| plan.shape.uses_text()),
                );
                // A re-admitted tie group filling the page would hand back the same cursor forever
                if page_state.cursor() == Some(&next) {
                    tracing::warn!("{}: page ended on the incoming cursor, ending the scroll", self.domain());
                    None
                } else {
                    Some(next.encode())
                }
            }
            _ => None,
        };
        let next_page = request.page.filter(|_| full_page).map(|page| page + 1);

        Ok(SearchPage {
            results,
            next_cursor,
            next_page,
            shape: plan.shape,
            effective_radius_km: plan.radius_km,
            notices,
        })
    }
}
