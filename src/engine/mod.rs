//! Seams to the external weighting engine.
//!
//! Area weighting, raster/polygon intersection and aggregation live outside this
//! crate. An engine adapter implements [`AggregationEngine`] (and
//! [`WeightEngine`] when it can compute weights) and the driver calls it once per
//! time segment.

pub mod driver;
pub mod error;

use crate::catalog::records::{GridRecord, ParamRecord};
use crate::engine::error::EngineError;
use crate::resolve::resolver::{GridDict, ParamDict};
use crate::types::metadata::OutputMetadata;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};

/// Everything an engine needs to aggregate one time segment.
#[derive(Debug, Clone, Copy)]
pub struct EngineRequest<'a> {
    pub params: &'a ParamDict,
    pub grids: &'a GridDict,
    pub weights_file: &'a Path,
    pub feature_file: &'a Path,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Aggregated tables returned by [`AggregationEngine::run`].
///
/// `features` has one row per polygon (`feature`, `lat`, `lon`, ...) and
/// `values` one row per polygon and time step (`feature`, `time`, one column per
/// variable).
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    pub features: DataFrame,
    pub values: DataFrame,
}

pub trait AggregationEngine {
    fn initialize(&mut self, request: EngineRequest<'_>) -> Result<(), EngineError>;

    fn run(&mut self, parallelism: usize) -> Result<EngineOutput, EngineError>;

    /// Writes the output of one segment. `Ok(false)` means the engine finished
    /// without writing a complete file set.
    fn finalize(
        &mut self,
        output: EngineOutput,
        output_dir: &Path,
        prefix: &str,
        metadata: &OutputMetadata,
    ) -> Result<bool, EngineError>;
}

pub trait WeightEngine {
    /// Computes area weights of the grid cells of `params`/`grids` over the
    /// polygons in `feature_file`, reprojected to EPSG `projection`, and writes
    /// them to `weights_file`.
    fn calc_weights_catalog(
        &self,
        params: &[ParamRecord],
        grids: &[GridRecord],
        feature_file: &Path,
        weights_file: &Path,
        projection: u32,
    ) -> Result<PathBuf, EngineError>;
}
