use crate::engine::EngineOutput;
use crate::output::error::OutputError;
use crate::output::units::UnitConversion;
use crate::types::metadata::OutputMetadata;
use log::{debug, info, warn};
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Column names an engine is expected to produce.
pub const FEATURE_COLUMN: &str = "feature";
pub const TIME_COLUMN: &str = "time";
pub const LAT_COLUMN: &str = "lat";
pub const LON_COLUMN: &str = "lon";

/// Writes engine output as Parquet plus a JSON metadata sidecar, converting and
/// renaming variables as the metadata describes.
///
/// Engine adapters can delegate their `finalize` step to this type.
#[derive(Debug, Clone, Default)]
pub struct ParquetFinalizer;

/// Paths produced by one finalize call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedFiles {
    pub values: PathBuf,
    pub features: PathBuf,
    pub metadata: PathBuf,
}

impl FinalizedFiles {
    pub fn new(opath: &Path, prefix: &str) -> Self {
        Self {
            values: opath.join(format!("{prefix}_values.parquet")),
            features: opath.join(format!("{prefix}_features.parquet")),
            metadata: opath.join(format!("{prefix}_metadata.json")),
        }
    }
}

impl ParquetFinalizer {
    pub fn new() -> Self {
        Self
    }

    /// Writes `<opath>/<prefix>_values.parquet`, `<prefix>_features.parquet` and
    /// `<prefix>_metadata.json`. Returns `true` once all three are on disk.
    pub fn finalize(
        &self,
        output: EngineOutput,
        opath: &Path,
        prefix: &str,
        metadata: &OutputMetadata,
    ) -> Result<bool, OutputError> {
        self.write(output, opath, prefix, metadata)?;
        Ok(true)
    }

    /// Same as [`ParquetFinalizer::finalize`], returning the written paths.
    pub fn write(
        &self,
        output: EngineOutput,
        opath: &Path,
        prefix: &str,
        metadata: &OutputMetadata,
    ) -> Result<FinalizedFiles, OutputError> {
        fs::create_dir_all(opath)
            .map_err(|e| OutputError::DirCreation(opath.to_path_buf(), e))?;
        let files = FinalizedFiles::new(opath, prefix);

        let values = Self::prepare_values(output.values, metadata)?;
        let features = Self::prepare_features(output.features, metadata)?;

        Self::write_parquet(values, &files.values)?;
        Self::write_parquet(features, &files.features)?;

        let json = serde_json::to_vec_pretty(metadata).map_err(OutputError::MetadataSerialize)?;
        fs::write(&files.metadata, json)
            .map_err(|e| OutputError::WriteIo(files.metadata.clone(), e))?;

        info!("Wrote output '{}' to {}", prefix, opath.display());
        Ok(files)
    }

    /// Applies unit conversions and output names to the values table.
    pub fn prepare_values(
        values: DataFrame,
        metadata: &OutputMetadata,
    ) -> Result<DataFrame, OutputError> {
        let columns = column_names(&values);
        require_column(&columns, "values", FEATURE_COLUMN)?;
        require_column(&columns, "values", TIME_COLUMN)?;

        let mut exprs = vec![
            col(FEATURE_COLUMN).alias(metadata.dims.feature.as_str()),
            col(TIME_COLUMN).alias(metadata.dims.time.as_str()),
        ];
        for name in columns
            .iter()
            .filter(|c| c.as_str() != FEATURE_COLUMN && c.as_str() != TIME_COLUMN)
        {
            match metadata.variable(name) {
                Some(descriptor) => {
                    let conversion = UnitConversion::for_descriptor(name, descriptor)?;
                    debug!("Variable '{}': {:?}", name, conversion);
                    let expr = match conversion {
                        UnitConversion::Identity => col(name.as_str()),
                        other => other.apply(col(name.as_str()).cast(DataType::Float64)),
                    };
                    exprs.push(expr.alias(descriptor.varname.as_str()));
                }
                None => {
                    warn!("No output descriptor for column '{}', writing it unchanged", name);
                    exprs.push(col(name.as_str()));
                }
            }
        }

        Ok(values.lazy().select(exprs).collect()?)
    }

    /// Renames the feature table's id and coordinate columns to their output names.
    pub fn prepare_features(
        features: DataFrame,
        metadata: &OutputMetadata,
    ) -> Result<DataFrame, OutputError> {
        let columns = column_names(&features);
        let renames = [
            (FEATURE_COLUMN, metadata.feature.varname.as_str()),
            (LAT_COLUMN, metadata.lat.varname.as_str()),
            (LON_COLUMN, metadata.lon.varname.as_str()),
        ];
        for (column, _) in renames {
            require_column(&columns, "features", column)?;
        }

        let mut exprs: Vec<Expr> = renames
            .iter()
            .map(|(column, output)| col(*column).alias(*output))
            .collect();
        exprs.extend(
            columns
                .iter()
                .filter(|c| !renames.iter().any(|(column, _)| c.as_str() == *column))
                .map(|c| col(c.as_str())),
        );

        Ok(features.lazy().select(exprs).collect()?)
    }

    fn write_parquet(mut df: DataFrame, path: &Path) -> Result<(), OutputError> {
        let file =
            fs::File::create(path).map_err(|e| OutputError::WriteIo(path.to_path_buf(), e))?;
        ParquetWriter::new(file)
            .with_compression(ParquetCompression::Snappy)
            .finish(&mut df)
            .map_err(|e| OutputError::WritePolars(path.to_path_buf(), e))?;
        Ok(())
    }
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

fn require_column(
    columns: &[String],
    table: &'static str,
    column: &str,
) -> Result<(), OutputError> {
    if columns.iter().any(|c| c == column) {
        Ok(())
    } else {
        Err(OutputError::MissingColumn {
            table,
            column: column.to_string(),
        })
    }
}
