mod aggregator;
mod catalog;
mod config;
mod engine;
mod error;
mod output;
mod resolve;
mod types;
mod utils;

pub use aggregator::*;
pub use config::{ConfigError, RunConfig, DEFAULT_PARALLELISM, DEFAULT_PROJECTION};
pub use error::CatalogAggError;

pub use catalog::error::CatalogError;
pub use catalog::filter::{GridQuery, ParamQuery, RecordFilter};
pub use catalog::loader::{load_catalogs, CatalogLoader, Catalogs, GRIDS_URL, PARAMS_URL};
pub use catalog::records::*;

pub use resolve::error::ResolveError;
pub use resolve::resolver::*;

pub use types::metadata::*;
pub use types::period::{DatePeriod, StartEndDate, TimeSegment, TimeSegments, Year};

pub use engine::driver::{generate_weights, AggregationDriver, SegmentReport};
pub use engine::error::{DriverError, EngineError};
pub use engine::{AggregationEngine, EngineOutput, EngineRequest, WeightEngine};

pub use output::error::OutputError;
pub use output::units::UnitConversion;
pub use output::writer::{
    FinalizedFiles, ParquetFinalizer, FEATURE_COLUMN, LAT_COLUMN, LON_COLUMN, TIME_COLUMN,
};

pub use utils::get_cache_dir;
