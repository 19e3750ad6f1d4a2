//! Engine configuration.
//!
//! Every field has a default, so an empty TOML file (or no file) is valid.
//! `GEORANK_*` environment variables override file values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::binding::DomainBinding;
use crate::interface::Domain;
use crate::planner::CursorTieBreak;

pub const DEFAULT_RADIUS_KM: f64 = 50.0;
pub const RADIUS_STEP_KM: f64 = 30.0;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainSettings {
    pub radius_cap_km: f64,
    pub default_page_size: u32,
}

impl DomainSettings {
    fn from_binding(binding: &DomainBinding) -> Self {
        Self {
            radius_cap_km: binding.radius_cap_km,
            default_page_size: binding.default_page_size,
        }
    }
}

fn jobs_settings() -> DomainSettings {
    DomainSettings::from_binding(DomainBinding::for_domain(Domain::Jobs))
}

fn local_jobs_settings() -> DomainSettings {
    DomainSettings::from_binding(DomainBinding::for_domain(Domain::LocalJobs))
}

fn used_products_settings() -> DomainSettings {
    DomainSettings::from_binding(DomainBinding::for_domain(Domain::UsedProducts))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainTable {
    #[serde(default = "jobs_settings")]
    pub jobs: DomainSettings,
    #[serde(default = "local_jobs_settings")]
    pub local_jobs: DomainSettings,
    #[serde(default = "used_products_settings")]
    pub used_products: DomainSettings,
}

impl Default for DomainTable {
    fn default() -> Self {
        Self {
            jobs: jobs_settings(),
            local_jobs: local_jobs_settings(),
            used_products: used_products_settings(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub default_radius_km: f64,
    pub radius_step_km: f64,
    pub max_page_size: u32,
    pub cursor_tie_break: CursorTieBreak,
    /// Keep invalid anchors and filter them in SQL (always zero rows) instead of dropping them.
    pub legacy_anchor_predicate: bool,
    pub pool_size: u32,
    pub domains: DomainTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_radius_km: DEFAULT_RADIUS_KM,
            radius_step_km: RADIUS_STEP_KM,
            max_page_size: MAX_PAGE_SIZE,
            cursor_tie_break: CursorTieBreak::default(),
            legacy_anchor_predicate: false,
            pool_size: crate::database::DEFAULT_POOL_SIZE,
            domains: DomainTable::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse().ok())
}

fn env_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    lookup(key).map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file (missing file means defaults), apply env overrides, validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                toml::from_str(&raw)?
            }
            Some(path) => {
                tracing::debug!("config {} not found, using defaults", path.display());
                EngineConfig::default()
            }
            None => EngineConfig::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env_parse(&lookup, "GEORANK_DEFAULT_RADIUS_KM") {
            self.default_radius_km = v;
        }
        if let Some(v) = env_parse(&lookup, "GEORANK_RADIUS_STEP_KM") {
            self.radius_step_km = v;
        }
        if let Some(v) = env_parse(&lookup, "GEORANK_MAX_PAGE_SIZE") {
            self.max_page_size = v;
        }
        if let Some(v) = env_parse(&lookup, "GEORANK_POOL_SIZE") {
            self.pool_size = v;
        }
        if let Some(v) = env_flag(&lookup, "GEORANK_LEGACY_ANCHOR_PREDICATE") {
            self.legacy_anchor_predicate = v;
        }
        match lookup("GEORANK_CURSOR_TIE_BREAK").as_deref().map(str::trim) {
            Some("strict") => self.cursor_tie_break = CursorTieBreak::Strict,
            Some("readmit_within_radius") => self.cursor_tie_break = CursorTieBreak::ReadmitWithinRadius,
            Some(other) => tracing::warn!("ignoring unknown GEORANK_CURSOR_TIE_BREAK '{}'", other),
            None => {}
        }
    }

    pub fn domain(&self, domain: Domain) -> &DomainSettings {
        match domain {
            Domain::Jobs => &self.domains.jobs,
            Domain::LocalJobs => &self.domains.local_jobs,
            Domain::UsedProducts => &self.domains.used_products,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.default_radius_km) {
            return Err(ConfigError::Invalid("default_radius_km must be positive".into()));
        }
        if !positive(self.radius_step_km) {
            return Err(ConfigError::Invalid("radius_step_km must be positive".into()));
        }
        if self.max_page_size == 0 {
            return Err(ConfigError::Invalid("max_page_size must be positive".into()));
        }
        if self.pool_size == 0 {
            return Err(ConfigError::Invalid("pool_size must be positive".into()));
        }
        for domain in Domain::ALL {
            let settings = self.domain(domain);
            if !settings.radius_cap_km.is_finite() || settings.radius_cap_km < self.default_radius_km {
                return Err(ConfigError::Invalid(format!(
                    "{domain}: radius_cap_km must be at least default_radius_km"
                )));
            }
            if settings.default_page_size == 0 || settings.default_page_size > self.max_page_size {
                return Err(ConfigError::Invalid(format!(
                    "{domain}: default_page_size must be within 1..={}",
                    self.max_page_size
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.domain(Domain::Jobs).radius_cap_km, 500.0);
        assert_eq!(config.domain(Domain::LocalJobs).default_page_size, 30);
        assert_eq!(config.cursor_tie_break, CursorTieBreak::ReadmitWithinRadius);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            radius_step_km = 25.0
            cursor_tie_break = "strict"

            [domains.jobs]
            radius_cap_km = 300.0
            default_page_size = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.radius_step_km, 25.0);
        assert_eq!(config.cursor_tie_break, CursorTieBreak::Strict);
        assert_eq!(config.domain(Domain::Jobs).radius_cap_km, 300.0);
        assert_eq!(config.domain(Domain::UsedProducts).radius_cap_km, 200.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("radius_step_km = 0.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[domains.used_products]\nradius_cap_km = 10.0\ndefault_page_size = 30"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(EngineConfig::from_toml_str("pool_size = \"many\""), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GEORANK_DEFAULT_RADIUS_KM", "40"),
            ("GEORANK_LEGACY_ANCHOR_PREDICATE", "true"),
            ("GEORANK_CURSOR_TIE_BREAK", "strict"),
            ("GEORANK_POOL_SIZE", "not a number"),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config.apply_env_with(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.default_radius_km, 40.0);
        assert!(config.legacy_anchor_predicate);
        assert_eq!(config.cursor_tie_break, CursorTieBreak::Strict);
        assert_eq!(config.pool_size, 8);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.max_page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("georank.toml");
        std::fs::write(&path, "max_page_size = 50\n").unwrap();
        assert_eq!(EngineConfig::load(Some(&path)).unwrap().max_page_size, 50);
    }
}
