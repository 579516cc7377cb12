use crate::catalog::records::GridId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error(
        "No parameter rows for variable '{variable}' in dataset '{dataset}' (grid {})",
        .grid_id.map_or_else(|| "any".to_string(), |g| g.to_string())
    )]
    NoParameterMatch {
        variable: String,
        dataset: String,
        grid_id: Option<GridId>,
    },

    #[error("Parameter row for variable '{variable}' has no grid_id")]
    MissingGridId { variable: String },

    #[error("Expected one parameter row for variable '{variable}', found {count}")]
    AmbiguousParameter { variable: String, count: usize },

    #[error("No grid rows with grid_id {grid_id} for variable '{variable}'")]
    NoGridMatch { variable: String, grid_id: GridId },

    #[error("Expected one grid row with grid_id {grid_id} for variable '{variable}', found {count}")]
    AmbiguousGrid {
        variable: String,
        grid_id: GridId,
        count: usize,
    },

    #[error("Variable '{0}' was not part of the resolved set")]
    UnknownVariable(String),
}
