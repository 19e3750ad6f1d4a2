//! Opaque pagination cursor.
//!
//! A cursor carries exactly the last row's creation timestamp and, when a text
//! query was active, its relevance. It never carries the radius or an offset,
//! so every page starts its radius expansion from the domain default.
//!
//! The relevance is compared for equality in SQL on the next page, so it must
//! decode to the same bits it was encoded from (serde_json `float_roundtrip`).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(rename = "t")]
    pub last_timestamp: i64,
    #[serde(rename = "r", default, skip_serializing_if = "Option::is_none")]
    pub last_relevance: Option<f64>,
}

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("cursor is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("cursor payload is malformed: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("cursor relevance is not a finite non-negative number")]
    Relevance,
}

impl Cursor {
    pub fn new(last_timestamp: i64, last_relevance: Option<f64>) -> Self {
        Self { last_timestamp, last_relevance }
    }

    pub fn encode(&self) -> String {
        // Serializing two plain numbers cannot fail
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let bytes = URL_SAFE_NO_PAD.decode(token.trim())?;
        let cursor: Cursor = serde_json::from_slice(&bytes)?;
        if let Some(r) = cursor.last_relevance {
            if !r.is_finite() || r < 0.0 {
                return Err(CursorError::Relevance);
            }
        }
        Ok(cursor)
    }
}

/// Pagination state for one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageState {
    /// First page.
    Initial,
    /// Continuing after a decoded cursor.
    Paging(Cursor),
}

impl PageState {
    /// Decode a client cursor. A missing cursor is `Initial`; a garbled one is
    /// also `Initial` and reported through the returned flag.
    pub fn from_token(token: Option<&str>) -> (Self, bool) {
        match token.map(str::trim).filter(|t| !t.is_empty()) {
            None => (PageState::Initial, false),
            Some(token) => match Cursor::decode(token) {
                Ok(cursor) => (PageState::Paging(cursor), false),
                Err(e) => {
                    tracing::warn!("restarting pagination, {}", e);
                    (PageState::Initial, true)
                }
            },
        }
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        match self {
            PageState::Initial => None,
            PageState::Paging(cursor) => Some(cursor),
        }
    }
}
