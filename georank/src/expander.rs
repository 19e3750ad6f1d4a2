//! Adaptive radius widening.
//!
//! Sparse regions should not produce short pages: while an anchored search
//! returns fewer rows than requested, the radius grows by a fixed step up to a
//! per-domain cap. Widening is strictly sequential, each attempt depends on the
//! previous attempt's row count.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusExpander {
    default_km: f64,
    step_km: f64,
    cap_km: f64,
}

impl RadiusExpander {
    /// `step_km` must be positive and `cap_km >= default_km`; `EngineConfig::validate` enforces both.
    pub fn new(default_km: f64, step_km: f64, cap_km: f64) -> Self {
        Self {
            default_km,
            step_km,
            cap_km: cap_km.max(default_km),
        }
    }

    pub fn initial(&self) -> f64 {
        self.default_km
    }

    pub fn cap(&self) -> f64 {
        self.cap_km
    }

    /// Radius for the next attempt, or `None` when the current result set is final.
    pub fn widen(&self, current_km: f64, found: usize, page_size: usize, has_anchor: bool) -> Option<f64> {
        if !has_anchor || found >= page_size || current_km >= self.cap_km {
            return None;
        }
        Some((current_km + self.step_km).min(self.cap_km))
    }

    /// Upper bound on retries after the first attempt.
    pub fn max_retries(&self) -> usize {
        if self.step_km <= 0.0 {
            return 0;
        }
        ((self.cap_km - self.default_km) / self.step_km).ceil() as usize
    }
}
