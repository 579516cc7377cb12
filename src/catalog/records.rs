//! Typed rows of the OPeNDAP parameter and grid catalogs.
//!
//! Only the join keys (`id`, `grid_id`, `variable`) and a handful of descriptive
//! fields are typed. Every other attribute of a catalog row is kept verbatim in
//! `attributes`, so a record can be handed back to a weighting engine unchanged.

use crate::catalog::filter::RecordFilter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Identifier of a grid definition in the grid catalog.
///
/// The catalogs store grid ids as floating point numbers (`3.0`), so the newtype
/// wraps an `f64` and compares exactly.
///
/// # Examples
///
/// ```
/// use catalog_agg::GridId;
///
/// let daymet = GridId(3.0);
/// assert_eq!(daymet.get(), 3.0);
/// assert_eq!(daymet.to_string(), "3");
/// ```
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridId(pub f64);

impl GridId {
    pub fn get(self) -> f64 {
        self.0
    }
}

impl From<f64> for GridId {
    fn from(value: f64) -> Self {
        GridId(value)
    }
}

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A row of the parameter catalog: one variable of one dataset on one grid.
///
/// Deserialization never fails on a single row: a `null` id reads as the empty
/// string, and a known column holding a value of an unexpected type is left in
/// `attributes` with its typed field set to `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct ParamRecord {
    /// Dataset identifier (e.g. `"daymet4"`, `"terraclim"`).
    pub id: String,
    /// Grid the variable is served on. Null in a few catalog rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_id: Option<GridId>,
    /// Variable name as used for lookups (e.g. `"tmax"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    /// OPeNDAP endpoint of the dataset.
    #[serde(rename = "URL", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Variable name inside the remote file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub varname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    /// Temporal coverage, `start/end` as published by the catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Time step (e.g. `"1 days"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    /// Remaining catalog columns, untouched.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl From<Map<String, Value>> for ParamRecord {
    fn from(mut map: Map<String, Value>) -> Self {
        Self {
            id: take_id(&mut map),
            grid_id: take_f64(&mut map, "grid_id").map(GridId),
            variable: take_string(&mut map, "variable"),
            url: take_string(&mut map, "URL"),
            varname: take_string(&mut map, "varname"),
            long_name: take_string(&mut map, "long_name"),
            units: take_string(&mut map, "units"),
            duration: take_string(&mut map, "duration"),
            interval: take_string(&mut map, "interval"),
            attributes: map,
        }
    }
}

/// A row of the grid catalog: spatial reference and extent of one grid.
///
/// Reads leniently, like [`ParamRecord`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct GridRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_id: Option<GridId>,
    #[serde(rename = "X_name", skip_serializing_if = "Option::is_none")]
    pub x_name: Option<String>,
    #[serde(rename = "Y_name", skip_serializing_if = "Option::is_none")]
    pub y_name: Option<String>,
    #[serde(rename = "X1", skip_serializing_if = "Option::is_none")]
    pub x1: Option<f64>,
    #[serde(rename = "Xn", skip_serializing_if = "Option::is_none")]
    pub xn: Option<f64>,
    #[serde(rename = "Y1", skip_serializing_if = "Option::is_none")]
    pub y1: Option<f64>,
    #[serde(rename = "Yn", skip_serializing_if = "Option::is_none")]
    pub yn: Option<f64>,
    #[serde(rename = "resX", skip_serializing_if = "Option::is_none")]
    pub res_x: Option<f64>,
    #[serde(rename = "resY", skip_serializing_if = "Option::is_none")]
    pub res_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ncols: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nrows: Option<f64>,
    /// PROJ string of the grid's native projection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proj: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl From<Map<String, Value>> for GridRecord {
    fn from(mut map: Map<String, Value>) -> Self {
        Self {
            grid_id: take_f64(&mut map, "grid_id").map(GridId),
            x_name: take_string(&mut map, "X_name"),
            y_name: take_string(&mut map, "Y_name"),
            x1: take_f64(&mut map, "X1"),
            xn: take_f64(&mut map, "Xn"),
            y1: take_f64(&mut map, "Y1"),
            yn: take_f64(&mut map, "Yn"),
            res_x: take_f64(&mut map, "resX"),
            res_y: take_f64(&mut map, "resY"),
            ncols: take_f64(&mut map, "ncols"),
            nrows: take_f64(&mut map, "nrows"),
            proj: take_string(&mut map, "proj"),
            attributes: map,
        }
    }
}

/// Removes `key` if it holds a string (or null). Any other value stays in `map`.
fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(value)) => Some(value),
        Some(Value::Null) | None => None,
        Some(other) => {
            map.insert(key.to_string(), other);
            None
        }
    }
}

/// Removes `key` if it holds a number (or null). Any other value stays in `map`.
fn take_f64(map: &mut Map<String, Value>, key: &str) -> Option<f64> {
    match map.remove(key) {
        Some(Value::Number(value)) => value.as_f64(),
        Some(Value::Null) | None => None,
        Some(other) => {
            map.insert(key.to_string(), other);
            None
        }
    }
}

/// Dataset id of a row. Null or missing reads as `""`, numbers and booleans
/// as their text.
fn take_id(map: &mut Map<String, Value>) -> String {
    match map.remove("id") {
        Some(Value::String(id)) => id,
        Some(Value::Null) | None => String::new(),
        Some(other @ (Value::Number(_) | Value::Bool(_))) => other.to_string(),
        Some(other) => {
            map.insert("id".to_string(), other);
            String::new()
        }
    }
}

/// An immutable, ordered set of catalog rows.
///
/// Row order is the order of the source payload and is what "first matching row"
/// refers to throughout the crate.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogTable<R> {
    rows: Vec<R>,
}

pub type ParamTable = CatalogTable<ParamRecord>;
pub type GridTable = CatalogTable<GridRecord>;

impl<R> Default for CatalogTable<R> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<R> CatalogTable<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }

    /// Returns every row accepted by `filter`, in table order.
    pub fn matching<'a, F>(&'a self, filter: &'a F) -> impl Iterator<Item = &'a R> + 'a
    where
        F: RecordFilter<R>,
    {
        self.rows.iter().filter(move |row| filter.matches(row))
    }

    /// Clones the rows accepted by `filter` into an owned subset, in table order.
    pub fn select<F>(&self, filter: &F) -> Vec<R>
    where
        F: RecordFilter<R>,
        R: Clone,
    {
        self.matching(filter).cloned().collect()
    }
}

impl<R> FromIterator<R> for CatalogTable<R> {
    fn from_iter<T: IntoIterator<Item = R>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a, R> IntoIterator for &'a CatalogTable<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl ParamTable {
    /// All rows of one dataset, optionally restricted to a single grid.
    pub fn dataset(&self, id: &str, grid_id: Option<GridId>) -> Vec<&ParamRecord> {
        self.rows
            .iter()
            .filter(|row| row.id == id)
            .filter(|row| grid_id.map_or(true, |g| row.grid_id == Some(g)))
            .collect()
    }

    /// Distinct variable names of a dataset, in table order.
    pub fn variables(&self, id: &str, grid_id: Option<GridId>) -> Vec<&str> {
        let mut seen = Vec::new();
        for row in self.dataset(id, grid_id) {
            if let Some(variable) = row.variable.as_deref() {
                if !seen.contains(&variable) {
                    seen.push(variable);
                }
            }
        }
        seen
    }
}
