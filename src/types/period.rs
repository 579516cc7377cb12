//! Calendar years and the annual time segments that drive aggregation runs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Year(pub i32);

impl Year {
    pub fn get(self) -> i32 {
        self.0
    }

    pub fn checked_add(self, years: usize) -> Option<Year> {
        let years = i32::try_from(years).ok()?;
        self.0.checked_add(years).map(Year)
    }
}

impl Display for Year {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StartEndDate {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub trait DatePeriod {
    fn get_date_period(self) -> Option<StartEndDate>;
}

impl DatePeriod for Year {
    fn get_date_period(self) -> Option<StartEndDate> {
        Some(StartEndDate {
            start: NaiveDate::from_ymd_opt(self.0, 1, 1)?,
            end: NaiveDate::from_ymd_opt(self.0, 12, 31)?,
        })
    }
}

/// One aggregation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSegment {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

impl TimeSegment {
    /// Output prefix for this segment, `<label>_<suffix>` (e.g. `1980_dm_ak`).
    pub fn prefix(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            self.label.clone()
        } else {
            format!("{}_{}", self.label, suffix)
        }
    }

    /// Output prefix with the tag in front, `<tag>_<label>` (e.g. `pdsi_gages2_1960_2020`).
    pub fn tagged_prefix(&self, tag: &str) -> String {
        if tag.is_empty() {
            self.label.clone()
        } else {
            format!("{}_{}", tag, self.label)
        }
    }
}

/// Parallel sequences of segment start dates, end dates and labels.
///
/// Segment `i` is `(starts[i], ends[i], labels[i])`. All three sequences always
/// have the same length.
///
/// # Examples
///
/// ```
/// use catalog_agg::{TimeSegments, Year};
///
/// let segments = TimeSegments::annual(Year(1980), 10).unwrap();
/// assert_eq!(segments.len(), 10);
/// assert_eq!(segments.starts()[0], "1980-01-01");
/// assert_eq!(segments.ends()[0], "1980-12-31");
/// assert_eq!(segments.labels()[9], "1989");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimeSegments {
    starts: Vec<NaiveDate>,
    ends: Vec<NaiveDate>,
    labels: Vec<String>,
}

impl TimeSegments {
    /// `count` calendar years starting at `anchor`.
    ///
    /// Returns `None` when a year falls outside the supported date range.
    pub fn annual(anchor: Year, count: usize) -> Option<Self> {
        let mut segments = Self::default();
        for offset in 0..count {
            let year = anchor.checked_add(offset)?;
            let period = year.get_date_period()?;
            segments.push(period.start, period.end, year.to_string());
        }
        Some(segments)
    }

    /// Every calendar year from `first` to `last`, inclusive. Empty when
    /// `last < first`.
    pub fn years(first: Year, last: Year) -> Option<Self> {
        let count = last
            .get()
            .checked_sub(first.get())
            .and_then(|span| span.checked_add(1))
            .and_then(|span| usize::try_from(span).ok())
            .unwrap_or(0);
        Self::annual(first, count)
    }

    /// A single window, used for multi-year runs in one pass.
    pub fn single(start: NaiveDate, end: NaiveDate, label: impl Into<String>) -> Self {
        let mut segments = Self::default();
        segments.push(start, end, label.into());
        segments
    }

    fn push(&mut self, start: NaiveDate, end: NaiveDate, label: String) {
        self.starts.push(start);
        self.ends.push(end);
        self.labels.push(label);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<TimeSegment> {
        Some(TimeSegment {
            start: *self.starts.get(index)?,
            end: *self.ends.get(index)?,
            label: self.labels.get(index)?.clone(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = TimeSegment> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Start dates as `YYYY-MM-DD`.
    pub fn starts(&self) -> Vec<String> {
        self.starts.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect()
    }

    /// End dates as `YYYY-MM-DD`.
    pub fn ends(&self) -> Vec<String> {
        self.ends.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annual_segments_from_1980() {
        let segments = TimeSegments::annual(Year(1980), 10).unwrap();
        assert_eq!(segments.len(), 10);
        assert_eq!(segments.starts().len(), 10);
        assert_eq!(segments.ends().len(), 10);
        assert_eq!(segments.labels().len(), 10);

        assert_eq!(segments.starts()[0], "1980-01-01");
        assert_eq!(segments.ends()[0], "1980-12-31");
        assert_eq!(segments.labels()[0], "1980");
        assert_eq!(segments.labels()[9], "1989");
        assert_eq!(segments.starts()[9], "1989-01-01");
        assert_eq!(segments.ends()[9], "1989-12-31");
    }

    #[test]
    fn test_segment_by_index() {
        let segments = TimeSegments::annual(Year(1984), 2).unwrap();
        let leap = segments.get(0).unwrap();
        assert_eq!(leap.start, NaiveDate::from_ymd_opt(1984, 1, 1).unwrap());
        assert_eq!(leap.end, NaiveDate::from_ymd_opt(1984, 12, 31).unwrap());
        assert_eq!(leap.prefix("dm_ak"), "1984_dm_ak");
        assert!(segments.get(2).is_none());

        let labels: Vec<String> = segments.iter().map(|s| s.label).collect();
        assert_eq!(labels, vec!["1984", "1985"]);
    }

    #[test]
    fn test_zero_count_and_inverted_range_are_empty() {
        assert!(TimeSegments::annual(Year(1980), 0).unwrap().is_empty());
        assert!(TimeSegments::years(Year(1990), Year(1980)).unwrap().is_empty());
        assert_eq!(
            TimeSegments::years(Year(1980), Year(1989)),
            TimeSegments::annual(Year(1980), 10)
        );
    }

    #[test]
    fn test_out_of_range_year() {
        assert!(TimeSegments::annual(Year(i32::MAX), 2).is_none());
        assert!(TimeSegments::annual(Year(300_000), 1).is_none());
    }

    #[test]
    fn test_single_window() {
        let start = NaiveDate::from_ymd_opt(1960, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2019, 12, 31).unwrap();
        let segments = TimeSegments::single(start, end, "1960_2020");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments.get(0).unwrap().prefix("pdsi_gages2"), "1960_2020_pdsi_gages2");
        assert_eq!(segments.get(0).unwrap().prefix(""), "1960_2020");
        assert_eq!(
            segments.get(0).unwrap().tagged_prefix("pdsi_gages2"),
            "pdsi_gages2_1960_2020"
        );
    }

    #[test]
    fn test_year_display_pads() {
        assert_eq!(Year(980).to_string(), "0980");
    }
}
