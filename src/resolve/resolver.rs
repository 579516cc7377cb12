//! Per-variable lookup dictionaries built from the catalog tables.
//!
//! For a dataset (and optionally a grid), every requested variable is resolved
//! to the parameter rows describing it, and through their `grid_id` to the grid
//! rows describing the grid it is served on. Both dictionaries are built once
//! and never modified afterwards.

use crate::catalog::filter::{GridQuery, ParamQuery};
use crate::catalog::loader::Catalogs;
use crate::catalog::records::{GridId, GridRecord, GridTable, ParamRecord, ParamTable};
use crate::resolve::error::ResolveError;
use log::{debug, warn};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// How strictly catalog matches are checked when building the grid dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// The grid id is read from the first matching parameter row in table order,
    /// and every grid row carrying that id is kept. A variable whose grid id has
    /// no grid rows is an error.
    #[default]
    First,
    /// Exactly one parameter row and exactly one grid row per variable.
    Unique,
}

/// Mapping from variable name to the catalog rows resolved for it.
///
/// Iterates in lexical key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VariableDict<R> {
    entries: BTreeMap<String, Vec<R>>,
}

pub type GridDict = VariableDict<GridRecord>;

impl<R> Default for VariableDict<R> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<R> VariableDict<R> {
    pub fn get(&self, variable: &str) -> Option<&[R]> {
        self.entries.get(variable).map(Vec::as_slice)
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.entries.contains_key(variable)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[R])> {
        self.entries
            .iter()
            .map(|(variable, rows)| (variable.as_str(), rows.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<R> FromIterator<(String, Vec<R>)> for VariableDict<R> {
    fn from_iter<T: IntoIterator<Item = (String, Vec<R>)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Variable → parameter rows, remembering the dataset and grid it was built for
/// so lookup failures can name them.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDict {
    dataset: String,
    grid_id: Option<GridId>,
    entries: VariableDict<ParamRecord>,
}

impl ParamDict {
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn grid_filter(&self) -> Option<GridId> {
        self.grid_id
    }

    /// Rows matched for `variable`. An empty slice means the catalog has no row
    /// for it; `None` means the variable was never requested.
    pub fn get(&self, variable: &str) -> Option<&[ParamRecord]> {
        self.entries.get(variable)
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.entries.contains(variable)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ParamRecord])> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Grid id of the first row matched for `variable`, in table order.
    pub fn grid_id(&self, variable: &str) -> Result<GridId, ResolveError> {
        let rows = self
            .get(variable)
            .ok_or_else(|| ResolveError::UnknownVariable(variable.to_string()))?;
        let first = rows.first().ok_or_else(|| ResolveError::NoParameterMatch {
            variable: variable.to_string(),
            dataset: self.dataset.clone(),
            grid_id: self.grid_id,
        })?;
        first.grid_id.ok_or_else(|| ResolveError::MissingGridId {
            variable: variable.to_string(),
        })
    }
}

impl Serialize for ParamDict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

/// Both dictionaries for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedVariables {
    pub params: ParamDict,
    pub grids: GridDict,
}

impl ResolvedVariables {
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.params.keys()
    }

    /// Parameter and grid rows of one variable.
    pub fn get(&self, variable: &str) -> Result<(&[ParamRecord], &[GridRecord]), ResolveError> {
        match (self.params.get(variable), self.grids.get(variable)) {
            (Some(params), Some(grids)) => Ok((params, grids)),
            _ => Err(ResolveError::UnknownVariable(variable.to_string())),
        }
    }
}

/// Builds [`ParamDict`] and [`GridDict`] from borrowed catalog tables.
///
/// # Examples
///
/// ```
/// use catalog_agg::{GridId, GridRecord, GridTable, ParamRecord, ParamTable, VariableResolver};
///
/// let params: ParamTable = vec![ParamRecord {
///     id: "daymet4".into(),
///     grid_id: Some(GridId(3.0)),
///     variable: Some("tmax".into()),
///     ..Default::default()
/// }]
/// .into_iter()
/// .collect();
/// let grids: GridTable = vec![GridRecord {
///     grid_id: Some(GridId(3.0)),
///     ..Default::default()
/// }]
/// .into_iter()
/// .collect();
///
/// let resolved = VariableResolver::new(&params, &grids)
///     .resolve("daymet4", Some(GridId(3.0)), &["tmax"])
///     .unwrap();
/// assert_eq!(resolved.params.get("tmax").unwrap().len(), 1);
/// assert_eq!(resolved.grids.get("tmax").unwrap()[0].grid_id, Some(GridId(3.0)));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct VariableResolver<'a> {
    params: &'a ParamTable,
    grids: &'a GridTable,
    policy: MatchPolicy,
}

impl<'a> VariableResolver<'a> {
    pub fn new(params: &'a ParamTable, grids: &'a GridTable) -> Self {
        Self {
            params,
            grids,
            policy: MatchPolicy::default(),
        }
    }

    pub fn from_catalogs(catalogs: &'a Catalogs) -> Self {
        Self::new(&catalogs.params, &catalogs.grids)
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Filters the parameter table once per variable.
    ///
    /// Never fails: a variable without catalog rows gets an empty entry.
    /// Repeated names resolve to the same entry.
    pub fn resolve_params<S: AsRef<str>>(
        &self,
        dataset: &str,
        grid_id: Option<GridId>,
        variables: &[S],
    ) -> ParamDict {
        let mut entries = BTreeMap::new();
        for variable in variables.iter().map(AsRef::as_ref) {
            if entries.contains_key(variable) {
                continue;
            }
            let query = ParamQuery::new(dataset)
                .maybe_grid_id(grid_id)
                .variable(variable);
            let rows = self.params.select(&query);
            if rows.is_empty() {
                warn!(
                    "No parameter rows for variable '{}' in dataset '{}'",
                    variable, dataset
                );
            } else {
                debug!("Variable '{}' matched {} parameter rows", variable, rows.len());
            }
            entries.insert(variable.to_string(), rows);
        }

        ParamDict {
            dataset: dataset.to_string(),
            grid_id,
            entries: VariableDict { entries },
        }
    }

    /// Looks up the grid rows of every variable in `params`.
    pub fn resolve_grids(&self, params: &ParamDict) -> Result<GridDict, ResolveError> {
        let mut entries = BTreeMap::new();
        for (variable, rows) in params.iter() {
            if self.policy == MatchPolicy::Unique && rows.len() > 1 {
                return Err(ResolveError::AmbiguousParameter {
                    variable: variable.to_string(),
                    count: rows.len(),
                });
            }

            let grid_id = params.grid_id(variable)?;
            let grid_rows = self.grids.select(&GridQuery::new(grid_id));
            match (self.policy, grid_rows.len()) {
                (_, 0) => {
                    return Err(ResolveError::NoGridMatch {
                        variable: variable.to_string(),
                        grid_id,
                    })
                }
                (MatchPolicy::Unique, count) if count > 1 => {
                    return Err(ResolveError::AmbiguousGrid {
                        variable: variable.to_string(),
                        grid_id,
                        count,
                    })
                }
                _ => {}
            }
            entries.insert(variable.to_string(), grid_rows);
        }
        Ok(VariableDict { entries })
    }

    pub fn resolve<S: AsRef<str>>(
        &self,
        dataset: &str,
        grid_id: Option<GridId>,
        variables: &[S],
    ) -> Result<ResolvedVariables, ResolveError> {
        let params = self.resolve_params(dataset, grid_id, variables);
        let grids = self.resolve_grids(&params)?;
        Ok(ResolvedVariables { params, grids })
    }
}
