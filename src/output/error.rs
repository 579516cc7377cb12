use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to create output directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("I/O error writing output file '{0}'")]
    WriteIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing parquet file '{0}'")]
    WritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Required column '{column}' not found in {table} table")]
    MissingColumn { table: &'static str, column: String },

    #[error("No conversion from '{from}' to '{to}' for variable '{variable}'")]
    UnsupportedConversion {
        variable: String,
        from: String,
        to: String,
    },

    #[error("Variable '{0}' is marked for conversion but has no target unit")]
    MissingTargetUnit(String),

    #[error("Failed to serialize output metadata")]
    MetadataSerialize(#[source] serde_json::Error),
}
