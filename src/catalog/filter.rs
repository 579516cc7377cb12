use crate::catalog::records::{GridId, GridRecord, ParamRecord};

/// An equality predicate over catalog rows.
pub trait RecordFilter<R> {
    fn matches(&self, record: &R) -> bool;
}

/// Selects parameter rows by dataset id, and optionally by grid id and variable.
///
/// A `None` key matches every row.
///
/// # Examples
///
/// ```
/// use catalog_agg::{GridId, ParamQuery, ParamRecord, RecordFilter};
///
/// let row = ParamRecord {
///     id: "daymet4".into(),
///     grid_id: Some(GridId(3.0)),
///     variable: Some("tmax".into()),
///     ..Default::default()
/// };
///
/// let query = ParamQuery::new("daymet4")
///     .grid_id(GridId(3.0))
///     .variable("tmax");
/// assert!(query.matches(&row));
/// assert!(!ParamQuery::new("daymet4").variable("tmin").matches(&row));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamQuery<'a> {
    pub dataset: &'a str,
    pub grid_id: Option<GridId>,
    pub variable: Option<&'a str>,
}

impl<'a> ParamQuery<'a> {
    pub fn new(dataset: &'a str) -> Self {
        Self {
            dataset,
            grid_id: None,
            variable: None,
        }
    }

    pub fn grid_id(mut self, grid_id: GridId) -> Self {
        self.grid_id = Some(grid_id);
        self
    }

    pub fn maybe_grid_id(mut self, grid_id: Option<GridId>) -> Self {
        self.grid_id = grid_id;
        self
    }

    pub fn variable(mut self, variable: &'a str) -> Self {
        self.variable = Some(variable);
        self
    }
}

impl RecordFilter<ParamRecord> for ParamQuery<'_> {
    fn matches(&self, record: &ParamRecord) -> bool {
        record.id == self.dataset
            && self.grid_id.map_or(true, |g| record.grid_id == Some(g))
            && self
                .variable
                .map_or(true, |v| record.variable.as_deref() == Some(v))
    }
}

/// Selects grid rows carrying one grid id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridQuery {
    pub grid_id: GridId,
}

impl GridQuery {
    pub fn new(grid_id: GridId) -> Self {
        Self { grid_id }
    }
}

impl RecordFilter<GridRecord> for GridQuery {
    fn matches(&self, record: &GridRecord) -> bool {
        record.grid_id == Some(self.grid_id)
    }
}

/// Any closure over a row is a filter too.
impl<R, F> RecordFilter<R> for F
where
    F: Fn(&R) -> bool,
{
    fn matches(&self, record: &R) -> bool {
        self(record)
    }
}
