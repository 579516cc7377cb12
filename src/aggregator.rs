use crate::catalog::loader::{CatalogLoader, Catalogs, GRIDS_URL, PARAMS_URL};
use crate::catalog::records::GridId;
use crate::config::RunConfig;
use crate::engine::driver::{generate_weights, AggregationDriver, SegmentReport};
use crate::engine::{AggregationEngine, WeightEngine};
use crate::error::CatalogAggError;
use crate::resolve::resolver::{MatchPolicy, ResolvedVariables, VariableResolver};
use crate::types::metadata::OutputMetadata;
use crate::utils::get_cache_dir;
use bon::bon;
use log::info;
use std::path::PathBuf;

/// The main entry point: holds the loaded catalogs and drives resolution and
/// aggregation runs against them.
///
/// # Examples
///
/// ```no_run
/// # use catalog_agg::{Aggregator, CatalogAggError, GridId};
/// # #[tokio::main]
/// # async fn main() -> Result<(), CatalogAggError> {
/// let aggregator = Aggregator::new().await?;
/// let resolved = aggregator
///     .resolve()
///     .dataset("daymet4")
///     .grid_id(GridId(3.0))
///     .variables(&["tmax", "tmin"])
///     .call()?;
/// assert_eq!(resolved.variables().count(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Aggregator {
    catalogs: Catalogs,
}

#[bon]
impl Aggregator {
    /// Fetches the default parameter and grid catalogs.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogAggError::Catalog`] if either request fails, the server
    /// answers with an error status, or a payload does not parse.
    pub async fn new() -> Result<Self, CatalogAggError> {
        Self::from_urls(PARAMS_URL, GRIDS_URL).await
    }

    /// Fetches the catalogs from custom locations.
    pub async fn from_urls(param_url: &str, grid_url: &str) -> Result<Self, CatalogAggError> {
        let catalogs = CatalogLoader::new().load(param_url, grid_url).await?;
        Ok(Self::from_catalogs(catalogs))
    }

    /// Loads the default catalogs through an on-disk cache in `cache_folder`.
    ///
    /// The first call downloads and stores both catalogs; later calls read
    /// them back without touching the network.
    pub async fn with_cache_folder(cache_folder: PathBuf) -> Result<Self, CatalogAggError> {
        let catalogs = CatalogLoader::with_cache_folder(cache_folder)
            .load(PARAMS_URL, GRIDS_URL)
            .await?;
        Ok(Self::from_catalogs(catalogs))
    }

    /// Loads the default catalogs through the per-user cache folder
    /// (e.g. `~/.cache/catalog_agg_cache` on Linux).
    pub async fn with_default_cache() -> Result<Self, CatalogAggError> {
        let cache_folder = get_cache_dir()?;
        Self::with_cache_folder(cache_folder).await
    }

    /// Loads the catalogs named by a run configuration.
    pub async fn from_config(config: &RunConfig) -> Result<Self, CatalogAggError> {
        Self::from_urls(&config.param_catalog_url, &config.grid_catalog_url).await
    }

    pub fn from_catalogs(catalogs: Catalogs) -> Self {
        Self { catalogs }
    }

    pub fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    /// Resolves variables of a dataset to their parameter and grid rows.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.dataset(&str)`: **Required.** Dataset id, e.g. `"daymet4"`.
    /// * `.variables(&[&str])`: **Required.** Variable names to resolve.
    /// * `.grid_id(GridId)`: Optional. Restricts parameter rows to one grid.
    /// * `.match_policy(MatchPolicy)`: Optional. Defaults to [`MatchPolicy::First`].
    ///
    /// # Errors
    ///
    /// Returns [`CatalogAggError::Resolve`] when a variable has no parameter
    /// rows, its grid cannot be found, or the policy's uniqueness check fails.
    #[builder]
    pub fn resolve(
        &self,
        dataset: &str,
        variables: &[&str],
        grid_id: Option<GridId>,
        match_policy: Option<MatchPolicy>,
    ) -> Result<ResolvedVariables, CatalogAggError> {
        let rows = self.catalogs.params.dataset(dataset, grid_id).len();
        info!("Dataset '{}' has {} parameter rows", dataset, rows);

        let resolved = VariableResolver::from_catalogs(&self.catalogs)
            .with_policy(match_policy.unwrap_or_default())
            .resolve(dataset, grid_id, variables)?;
        Ok(resolved)
    }

    /// Resolves the dataset, grid and variables named by `config`.
    pub fn resolve_config(&self, config: &RunConfig) -> Result<ResolvedVariables, CatalogAggError> {
        let variables: Vec<&str> = config.variables.iter().map(String::as_str).collect();
        self.resolve()
            .dataset(&config.dataset)
            .variables(&variables)
            .maybe_grid_id(config.grid_id)
            .match_policy(config.match_policy)
            .call()
    }

    /// Resolves `config` and runs `engine` over each of its time segments.
    pub fn run<E>(
        &self,
        config: &RunConfig,
        engine: &mut E,
        metadata: &OutputMetadata,
    ) -> Result<Vec<SegmentReport>, CatalogAggError>
    where
        E: AggregationEngine + ?Sized,
    {
        let resolved = self.resolve_config(config)?;
        let segments = config.segments()?;
        let reports = AggregationDriver::new(config, &resolved, metadata).run(engine, &segments)?;
        let failed = reports.iter().filter(|r| !r.success).count();
        info!(
            "Processed {} segment(s) for '{}', {} reported failure",
            reports.len(),
            config.dataset,
            failed
        );
        Ok(reports)
    }

    /// Computes the weights file of `config` from the grid of `variable`.
    pub fn generate_weights<E>(
        &self,
        config: &RunConfig,
        engine: &E,
        variable: &str,
    ) -> Result<PathBuf, CatalogAggError>
    where
        E: WeightEngine + ?Sized,
    {
        let resolved = self.resolve_config(config)?;
        Ok(generate_weights(
            engine,
            &resolved,
            variable,
            &config.feature_file,
            &config.weights_file,
            config.projection,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::records::{GridRecord, ParamRecord};
    use crate::engine::error::{DriverError, EngineError};
    use crate::engine::{EngineOutput, EngineRequest};
    use crate::resolve::error::ResolveError;
    use crate::types::period::Year;
    use crate::utils::cache_file_name;
    use std::path::Path;
    use tempfile::tempdir;

    const PARAMS_JSON: &str = r#"[
        {"id": "daymet4", "grid_id": 3.0, "variable": "tmax", "varname": "tmax"},
        {"id": "daymet4", "grid_id": 3.0, "variable": "tmin", "varname": "tmin"},
        {"id": "daymet4", "grid_id": 4.0, "variable": "tmax", "varname": "tmax"},
        {"id": "terraclim", "grid_id": 5.0, "variable": "PDSI", "varname": "PDSI"}
    ]"#;

    const GRIDS_JSON: &str = r#"[
        {"grid_id": 3.0, "X_name": "x", "Y_name": "y", "proj": "+proj=lcc"},
        {"grid_id": 4.0, "X_name": "x", "Y_name": "y"},
        {"grid_id": 5.0, "X_name": "lon", "Y_name": "lat"}
    ]"#;

    fn aggregator() -> Aggregator {
        Aggregator::from_catalogs(Catalogs {
            params: CatalogLoader::parse_params(PARAMS_JSON.as_bytes(), "params").unwrap(),
            grids: CatalogLoader::parse_grids(GRIDS_JSON.as_bytes(), "grids").unwrap(),
        })
    }

    #[derive(Default)]
    struct CountingEngine {
        segments: usize,
    }

    impl AggregationEngine for CountingEngine {
        fn initialize(&mut self, request: EngineRequest<'_>) -> Result<(), EngineError> {
            assert_eq!(request.params.dataset(), "daymet4");
            self.segments += 1;
            Ok(())
        }

        fn run(&mut self, _parallelism: usize) -> Result<EngineOutput, EngineError> {
            Ok(EngineOutput::default())
        }

        fn finalize(
            &mut self,
            _output: EngineOutput,
            _output_dir: &Path,
            _prefix: &str,
            _metadata: &OutputMetadata,
        ) -> Result<bool, EngineError> {
            Ok(true)
        }
    }

    impl WeightEngine for CountingEngine {
        fn calc_weights_catalog(
            &self,
            params: &[ParamRecord],
            grids: &[GridRecord],
            _feature_file: &Path,
            weights_file: &Path,
            _projection: u32,
        ) -> Result<PathBuf, EngineError> {
            assert_eq!(params[0].grid_id, grids[0].grid_id);
            Ok(weights_file.to_path_buf())
        }
    }

    #[test]
    fn test_resolve_with_grid_filter() -> Result<(), CatalogAggError> {
        let resolved = aggregator()
            .resolve()
            .dataset("daymet4")
            .grid_id(GridId(3.0))
            .variables(&["tmax", "tmin"])
            .call()?;

        assert_eq!(resolved.variables().collect::<Vec<_>>(), vec!["tmax", "tmin"]);
        assert_eq!(resolved.params.get("tmax").unwrap().len(), 1);
        assert_eq!(
            resolved.grids.get("tmin").unwrap()[0].proj.as_deref(),
            Some("+proj=lcc")
        );
        Ok(())
    }

    #[test]
    fn test_resolve_policy() {
        let aggregator = aggregator();

        let first = aggregator
            .resolve()
            .dataset("daymet4")
            .variables(&["tmax"])
            .call()
            .unwrap();
        assert_eq!(first.params.get("tmax").unwrap().len(), 2);
        assert_eq!(first.grids.get("tmax").unwrap()[0].grid_id, Some(GridId(3.0)));

        let err = aggregator
            .resolve()
            .dataset("daymet4")
            .variables(&["tmax"])
            .match_policy(MatchPolicy::Unique)
            .call()
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogAggError::Resolve(ResolveError::AmbiguousParameter { count: 2, .. })
        ));
    }

    #[test]
    fn test_run_and_weights_from_config() {
        let dir = tempdir().unwrap();
        let feature_file = dir.path().join("basins.shp");
        std::fs::write(&feature_file, b"").unwrap();
        let weights_file = dir.path().join("weights.csv");
        std::fs::write(&weights_file, b"").unwrap();

        let config = RunConfig::builder()
            .dataset("daymet4")
            .grid_id(GridId(3.0))
            .variables(vec!["tmax".to_string(), "tmin".to_string()])
            .feature_file(feature_file)
            .weights_file(weights_file.clone())
            .output_dir(dir.path())
            .prefix_suffix("dm_ak")
            .start_year(Year(1980))
            .years(4)
            .build();

        let aggregator = aggregator();
        let mut engine = CountingEngine::default();
        let reports = aggregator
            .run(&config, &mut engine, &OutputMetadata::daymet_nhru())
            .unwrap();
        assert_eq!(reports.len(), 4);
        assert_eq!(engine.segments, 4);
        assert_eq!(reports[3].prefix, "1983_dm_ak");

        let path = aggregator.generate_weights(&config, &engine, "tmax").unwrap();
        assert_eq!(path, weights_file);
    }

    #[test]
    fn test_run_requires_metadata_for_every_variable() {
        let dir = tempdir().unwrap();
        let config = RunConfig::pdsi_gages2(dir.path());
        let err = aggregator()
            .run(&config, &mut CountingEngine::default(), &OutputMetadata::daymet_nhru())
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogAggError::Driver(DriverError::MissingDescriptor(_))
        ));
    }

    #[tokio::test]
    async fn test_with_cache_folder_reads_cached_catalogs() -> Result<(), CatalogAggError> {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(cache_file_name(PARAMS_URL)), PARAMS_JSON).unwrap();
        std::fs::write(dir.path().join(cache_file_name(GRIDS_URL)), GRIDS_JSON).unwrap();

        let aggregator = Aggregator::with_cache_folder(dir.path().to_path_buf()).await?;
        assert_eq!(aggregator.catalogs().params.len(), 4);
        assert_eq!(aggregator.catalogs().grids.len(), 3);
        Ok(())
    }
}
