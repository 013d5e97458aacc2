//! Runtime configuration
//!
//! Read from the environment (and `.env` when present):
//! - `MEDTRANS_DATA_DIR`: directory holding `store.json` (default `.medtrans`)
//! - `MEDTRANS_RATE_CACHE_TTL_SECS`: rate table cache TTL (default 300)
//! - `MEDTRANS_AUDIT_CAPACITY`: audit entries retained (default 1000)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::audit::DEFAULT_AUDIT_CAPACITY;
use crate::error::{AppError, Result};

const DEFAULT_DATA_DIR: &str = ".medtrans";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub rate_cache_ttl: Duration,
    pub audit_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            rate_cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let data_dir = lookup("MEDTRANS_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let ttl_secs = parse_var(&lookup, "MEDTRANS_RATE_CACHE_TTL_SECS")?
            .unwrap_or(DEFAULT_CACHE_TTL_SECS);

        let audit_capacity = parse_var(&lookup, "MEDTRANS_AUDIT_CAPACITY")?
            .unwrap_or(defaults.audit_capacity);

        Ok(Self {
            data_dir,
            rate_cache_ttl: Duration::from_secs(ttl_secs),
            audit_capacity,
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::Config(format!("{} must be a non-negative integer, got {:?}", key, raw))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.data_dir, PathBuf::from(".medtrans"));
        assert_eq!(config.audit_capacity, 1000);
    }

    #[test]
    fn test_reads_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("MEDTRANS_DATA_DIR", "/var/lib/medtrans"),
            ("MEDTRANS_RATE_CACHE_TTL_SECS", "60"),
            ("MEDTRANS_AUDIT_CAPACITY", " 250 "),
        ]))
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/medtrans"));
        assert_eq!(config.rate_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.audit_capacity, 250);
    }

    #[test]
    fn test_rejects_bad_numbers() {
        let err = AppConfig::from_lookup(lookup_from(&[("MEDTRANS_AUDIT_CAPACITY", "lots")]))
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("MEDTRANS_AUDIT_CAPACITY"));
    }
}
