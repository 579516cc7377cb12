use crate::config::RunConfig;
use crate::engine::error::{DriverError, EngineError};
use crate::engine::{AggregationEngine, EngineRequest, WeightEngine};
use crate::resolve::resolver::ResolvedVariables;
use crate::types::metadata::OutputMetadata;
use crate::types::period::{TimeSegment, TimeSegments};
use chrono::NaiveDate;
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of one processed segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentReport {
    pub label: String,
    pub prefix: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Flag returned by the engine's finalize step.
    pub success: bool,
}

/// Runs an engine over a sequence of time segments.
#[derive(Debug, Clone, Copy)]
pub struct AggregationDriver<'a> {
    config: &'a RunConfig,
    resolved: &'a ResolvedVariables,
    metadata: &'a OutputMetadata,
}

impl<'a> AggregationDriver<'a> {
    pub fn new(
        config: &'a RunConfig,
        resolved: &'a ResolvedVariables,
        metadata: &'a OutputMetadata,
    ) -> Self {
        Self {
            config,
            resolved,
            metadata,
        }
    }

    /// Checks that every resolved variable has an output descriptor and that
    /// the feature and weights files exist.
    pub fn preflight(&self) -> Result<(), DriverError> {
        let missing = self.metadata.missing(self.resolved.variables());
        if !missing.is_empty() {
            return Err(DriverError::MissingDescriptor(missing));
        }
        require_file(&self.config.feature_file)?;
        require_file(&self.config.weights_file)?;
        Ok(())
    }

    /// Initializes, runs and finalizes `engine` once per segment, in order.
    ///
    /// A segment whose finalize step reports `false` is logged and the run
    /// continues. An engine error stops the run; later segments are not
    /// attempted.
    pub fn run<E>(
        &self,
        engine: &mut E,
        segments: &TimeSegments,
    ) -> Result<Vec<SegmentReport>, DriverError>
    where
        E: AggregationEngine + ?Sized,
    {
        self.preflight()?;
        if segments.is_empty() {
            warn!("No time segments to process");
        }

        let mut reports = Vec::with_capacity(segments.len());
        for segment in segments.iter() {
            let prefix = self.config.output_prefix(&segment);
            info!(
                "Aggregating segment '{}': {} to {}",
                segment.label, segment.start, segment.end
            );

            let success = self
                .run_segment(engine, &segment, &prefix)
                .map_err(|source| DriverError::Segment {
                    label: segment.label.clone(),
                    source,
                })?;
            if success {
                info!("Finalized '{}'", prefix);
            } else {
                warn!("Engine reported failure finalizing '{}'", prefix);
            }

            reports.push(SegmentReport {
                label: segment.label,
                prefix,
                start: segment.start,
                end: segment.end,
                success,
            });
        }
        Ok(reports)
    }

    fn run_segment<E>(
        &self,
        engine: &mut E,
        segment: &TimeSegment,
        prefix: &str,
    ) -> Result<bool, EngineError>
    where
        E: AggregationEngine + ?Sized,
    {
        engine.initialize(EngineRequest {
            params: &self.resolved.params,
            grids: &self.resolved.grids,
            weights_file: &self.config.weights_file,
            feature_file: &self.config.feature_file,
            start_date: segment.start,
            end_date: segment.end,
        })?;
        let output = engine.run(self.config.parallelism)?;
        engine.finalize(output, &self.config.output_dir, prefix, self.metadata)
    }
}

/// Asks `engine` for the weights of `variable`'s grid over `feature_file`.
pub fn generate_weights<E>(
    engine: &E,
    resolved: &ResolvedVariables,
    variable: &str,
    feature_file: &Path,
    weights_file: &Path,
    projection: u32,
) -> Result<PathBuf, DriverError>
where
    E: WeightEngine + ?Sized,
{
    let (params, grids) = resolved.get(variable)?;
    require_file(feature_file)?;
    info!(
        "Calculating weights for '{}' over {} (EPSG:{})",
        variable,
        feature_file.display(),
        projection
    );
    let path = engine
        .calc_weights_catalog(params, grids, feature_file, weights_file, projection)
        .map_err(|source| DriverError::Weights {
            variable: variable.to_string(),
            source,
        })?;
    info!("Weights written to {}", path.display());
    Ok(path)
}

fn require_file(path: &Path) -> Result<(), DriverError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(DriverError::MissingInput(path.to_path_buf()))
    }
}
