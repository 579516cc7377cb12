use crate::output::error::OutputError;
use crate::resolve::error::ResolveError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by an engine implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine failed to initialize: {0}")]
    Initialize(String),

    #[error("Engine aggregation failed: {0}")]
    Run(String),

    #[error("Engine failed to finalize output: {0}")]
    Finalize(String),

    #[error("Engine failed to calculate weights: {0}")]
    Weights(String),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("No output descriptor for variable(s): {}", .0.join(", "))]
    MissingDescriptor(Vec<String>),

    #[error("Input file '{0}' does not exist")]
    MissingInput(PathBuf),

    #[error("Segment '{label}' failed")]
    Segment {
        label: String,
        #[source]
        source: EngineError,
    },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Weight generation for variable '{variable}' failed")]
    Weights {
        variable: String,
        #[source]
        source: EngineError,
    },
}
