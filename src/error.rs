use crate::catalog::error::CatalogError;
use crate::config::ConfigError;
use crate::engine::error::DriverError;
use crate::output::error::OutputError;
use crate::resolve::error::ResolveError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogAggError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Output(#[from] OutputError),
}
