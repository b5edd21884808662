use crate::calculations::compression::CrewRounding;
use crate::catalog::{CatalogError, ElementCatalog};
use crate::estimator::{EstimatorError, RateEstimator, SampleEstimator, UnitEstimator};
use crate::persistence::{EstimateStore, MemoryEstimateStore, PersistenceResult};
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const HTTP_ADDR_VAR: &str = "ESTIMATE_TOOL_HTTP_ADDR";
pub const DATABASE_VAR: &str = "ESTIMATE_TOOL_DB";
pub const CATALOG_VAR: &str = "ESTIMATE_TOOL_CATALOG";
pub const SAMPLES_VAR: &str = "ESTIMATE_TOOL_SAMPLES";
pub const CREW_ROUNDING_VAR: &str = "ESTIMATE_TOOL_CREW_ROUNDING";
pub const LOG_VAR: &str = "ESTIMATE_TOOL_LOG";

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    InvalidAddr { var: &'static str, value: String },
    #[error("{var}: {message}")]
    InvalidValue { var: &'static str, message: String },
}

/// Runtime settings shared by the binaries, read from `ESTIMATE_TOOL_*` variables.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    /// SQLite file for committed estimates. Unset keeps them in memory.
    pub database_path: Option<PathBuf>,
    /// Catalog sheet (CSV or JSON). Unset uses the built-in sample catalog.
    pub catalog_path: Option<PathBuf>,
    /// Historical samples for the nearest-neighbour estimator. Unset uses the rate model.
    pub samples_path: Option<PathBuf>,
    pub crew_rounding: CrewRounding,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_path: None,
            catalog_path: None,
            samples_path: None,
            crew_rounding: CrewRounding::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let addr = get(HTTP_ADDR_VAR).unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let http_addr = addr.trim().parse().map_err(|_| ConfigError::InvalidAddr {
            var: HTTP_ADDR_VAR,
            value: addr.clone(),
        })?;

        let crew_rounding = match get(CREW_ROUNDING_VAR) {
            Some(value) => value
                .parse()
                .map_err(|message| ConfigError::InvalidValue {
                    var: CREW_ROUNDING_VAR,
                    message,
                })?,
            None => CrewRounding::default(),
        };

        Ok(Self {
            http_addr,
            database_path: get(DATABASE_VAR).map(PathBuf::from),
            catalog_path: get(CATALOG_VAR).map(PathBuf::from),
            samples_path: get(SAMPLES_VAR).map(PathBuf::from),
            crew_rounding,
        })
    }

    pub fn load_catalog(&self) -> Result<ElementCatalog, CatalogError> {
        match &self.catalog_path {
            Some(path) => {
                let catalog = ElementCatalog::load(path)?;
                tracing::info!(path = %path.display(), entries = catalog.len(), "catalog loaded");
                Ok(catalog)
            }
            None => Ok(ElementCatalog::sample()),
        }
    }

    pub fn load_estimator(&self) -> Result<Box<dyn UnitEstimator + Send + Sync>, EstimatorError> {
        match &self.samples_path {
            Some(path) => {
                let estimator = SampleEstimator::from_csv(path)?;
                tracing::info!(
                    path = %path.display(),
                    samples = estimator.sample_count(),
                    "historical samples loaded"
                );
                Ok(Box::new(estimator))
            }
            None => Ok(Box::new(RateEstimator::default())),
        }
    }

    /// SQLite when a database path is configured, otherwise an in-memory store.
    pub fn open_store(&self) -> PersistenceResult<Box<dyn EstimateStore>> {
        match &self.database_path {
            #[cfg(feature = "sqlite")]
            Some(path) => {
                let store = crate::persistence::sqlite::SqliteEstimateStore::new(path)?;
                tracing::info!(path = %path.display(), "using sqlite estimate store");
                Ok(Box::new(store))
            }
            #[cfg(not(feature = "sqlite"))]
            Some(path) => {
                tracing::warn!(
                    path = %path.display(),
                    "built without the `sqlite` feature, keeping estimates in memory"
                );
                Ok(Box::new(MemoryEstimateStore::new()))
            }
            None => Ok(Box::new(MemoryEstimateStore::new())),
        }
    }
}
