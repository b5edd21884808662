pub mod calculations;
pub mod catalog;
pub mod config;
pub mod element;
pub(crate) mod element_validation;
pub mod estimate;
pub mod estimator;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod logging;
pub mod notify;
pub mod persistence;
pub mod progress;

pub use calculations::builder::{EstimateBuilder, EstimateError};
pub use calculations::compression::{CompressedSchedule, CrewRounding, ScheduleCompressor};
pub use catalog::{Catalog, CatalogEntry, CatalogError, ElementCatalog};
pub use config::{AppConfig, ConfigError};
pub use element::{BaselineEntry, ElementEstimate, ElementRequest};
pub use element_validation::ValidationError;
pub use estimate::{CalculationRequest, ElementInput, EstimateSummary, ProjectEstimate};
pub use estimator::{
    EstimatorError, HistoricalSample, RateEstimator, SampleEstimator, UnitEstimator,
    UnitPrediction,
};
pub use notify::{DeviationNotifier, LogNotifier, NotifyError, RecordingNotifier};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteEstimateStore;
pub use persistence::{
    EstimateListing, EstimateStore, MemoryEstimateStore, PersistenceError, StoredEstimate,
    load_estimate_from_csv, load_estimate_from_json, save_estimate_to_csv, save_estimate_to_json,
};
pub use progress::{DeviationEvent, ProgressRecord, ProgressUpdate, record_progress};
