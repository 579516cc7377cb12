//! Run configuration: which catalog rows to resolve, which files to aggregate
//! over and which years to process.

use crate::catalog::loader::{GRIDS_URL, PARAMS_URL};
use crate::catalog::records::GridId;
use crate::resolve::resolver::MatchPolicy;
use crate::types::period::{DatePeriod, TimeSegment, TimeSegments, Year};
use bon::Builder;
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_PARALLELISM: usize = 4;
/// EPSG code of the equal-area projection weights are computed in.
pub const DEFAULT_PROJECTION: u32 = 6931;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse configuration file '{0}'")]
    Parse(PathBuf, #[source] serde_json::Error),

    #[error("Cannot build {years} annual segment(s) starting at {start}")]
    InvalidPeriod { start: Year, years: usize },
}

/// Settings of one aggregation run.
///
/// # Examples
///
/// ```
/// use catalog_agg::{GridId, RunConfig, Year};
///
/// let config = RunConfig::builder()
///     .dataset("daymet4")
///     .grid_id(GridId(3.0))
///     .variables(vec!["tmax".to_string(), "tmin".to_string()])
///     .feature_file("data/NHM_19/NHM_19_nhrus_c.shp")
///     .weights_file("data/NHM_19/cc_dm_wght_file.csv")
///     .output_dir("data/NHM_19")
///     .prefix_suffix("dm_ak")
///     .start_year(Year(1980))
///     .years(2)
///     .build();
///
/// assert_eq!(config.parallelism, 4);
/// assert_eq!(config.segments().unwrap().labels(), ["1980", "1981"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(deny_unknown_fields)]
#[builder(on(String, into))]
pub struct RunConfig {
    #[serde(default = "default_params_url")]
    #[builder(default = default_params_url())]
    pub param_catalog_url: String,

    #[serde(default = "default_grids_url")]
    #[builder(default = default_grids_url())]
    pub grid_catalog_url: String,

    pub dataset: String,

    /// Restricts parameter rows to one grid. `None` matches any grid.
    #[serde(default)]
    pub grid_id: Option<GridId>,

    pub variables: Vec<String>,

    #[builder(into)]
    pub feature_file: PathBuf,

    #[builder(into)]
    pub weights_file: PathBuf,

    #[builder(into)]
    pub output_dir: PathBuf,

    /// Joined to each segment label to form the output prefix.
    #[serde(default)]
    #[builder(default)]
    pub prefix_suffix: String,

    /// Put `prefix_suffix` before the label instead of after it.
    #[serde(default)]
    #[builder(default)]
    pub suffix_first: bool,

    pub start_year: Year,

    #[serde(default = "default_years")]
    #[builder(default = 1)]
    pub years: usize,

    /// Aggregate all years in one window instead of one window per year.
    #[serde(default)]
    #[builder(default)]
    pub single_window: bool,

    #[serde(default = "default_parallelism")]
    #[builder(default = DEFAULT_PARALLELISM)]
    pub parallelism: usize,

    #[serde(default = "default_projection")]
    #[builder(default = DEFAULT_PROJECTION)]
    pub projection: u32,

    #[serde(default)]
    #[builder(default)]
    pub match_policy: MatchPolicy,
}

fn default_params_url() -> String {
    PARAMS_URL.to_string()
}

fn default_grids_url() -> String {
    GRIDS_URL.to_string()
}

fn default_years() -> usize {
    1
}

fn default_parallelism() -> usize {
    DEFAULT_PARALLELISM
}

fn default_projection() -> u32 {
    DEFAULT_PROJECTION
}

impl RunConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config: RunConfig =
            serde_json::from_str(&text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        info!(
            "Loaded run configuration for dataset '{}' from {}",
            config.dataset,
            path.display()
        );
        Ok(config)
    }

    /// The time segments this run covers.
    ///
    /// Annual segments by default. With `single_window` the whole span is one
    /// segment labelled `<first>_<last + 1>` (e.g. `1960_2020`).
    pub fn segments(&self) -> Result<TimeSegments, ConfigError> {
        let invalid = || ConfigError::InvalidPeriod {
            start: self.start_year,
            years: self.years,
        };
        if !self.single_window {
            return TimeSegments::annual(self.start_year, self.years).ok_or_else(invalid);
        }

        let last = self
            .years
            .checked_sub(1)
            .and_then(|offset| self.start_year.checked_add(offset))
            .ok_or_else(invalid)?;
        let start: NaiveDate = self
            .start_year
            .get_date_period()
            .ok_or_else(invalid)?
            .start;
        let end = last.get_date_period().ok_or_else(invalid)?.end;
        let label = format!("{}_{}", self.start_year, last.checked_add(1).ok_or_else(invalid)?);
        Ok(TimeSegments::single(start, end, label))
    }

    /// Output file prefix for one of this run's segments.
    pub fn output_prefix(&self, segment: &TimeSegment) -> String {
        if self.suffix_first {
            segment.tagged_prefix(&self.prefix_suffix)
        } else {
            segment.prefix(&self.prefix_suffix)
        }
    }

    /// Daymet v4 over the NHM region 19 (Alaska) HRUs, ten years from 1980.
    pub fn daymet_nhm19(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref().join("NHM_19");
        RunConfig::builder()
            .dataset("daymet4")
            .grid_id(GridId(3.0))
            .variables(
                ["prcp", "srad", "swe", "tmax", "tmin", "vp"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            )
            .feature_file(dir.join("NHM_19_nhrus_c.shp"))
            .weights_file(dir.join("cc_dm_wght_file.csv"))
            .output_dir(dir)
            .prefix_suffix("dm_ak")
            .start_year(Year(1980))
            .years(10)
            .build()
    }

    /// TerraClimate PDSI over the GAGES-II basins, 1960 through 2019 in one window.
    pub fn pdsi_gages2(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref().join("Mikes_basins");
        RunConfig::builder()
            .dataset("terraclim")
            .variables(vec!["PDSI".to_string()])
            .feature_file(dir.join("Mikes_basins_2.shp"))
            .weights_file(dir.join("cwc_pdsi_wght_file_2.csv"))
            .output_dir(dir)
            .prefix_suffix("pdsi_gages2")
            .suffix_first(true)
            .start_year(Year(1960))
            .years(60)
            .single_window(true)
            .parallelism(1)
            .build()
    }
}
