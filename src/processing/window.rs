//! Row windows and relative date ranges.
//!
//! Usage charts select "Last 7 days / Last 14 days / All data" by position in a dataset that is
//! already in chronological order; list screens select "Today / Yesterday / Last 7 days / Last 30
//! days / Custom" by timestamp. Both are resolved against explicit inputs so results are
//! reproducible in tests.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::processing::filter::Criterion;
use crate::types::DataSet;

/// Half-open row range `[start, end)` over a dataset's natural order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowWindow {
    pub start: usize,
    pub end: usize,
}

impl RowWindow {
    /// The last `n` rows of a dataset with `len` rows (all of them when `n >= len`).
    pub fn last(n: usize, len: usize) -> Self {
        Self {
            start: len.saturating_sub(n),
            end: len,
        }
    }

    pub fn all(len: usize) -> Self {
        Self { start: 0, end: len }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn apply(&self, dataset: &DataSet) -> DataSet {
        dataset.slice_rows(self.start..self.end)
    }
}

/// Trailing `n` rows of `dataset`.
pub fn last_n(dataset: &DataSet, n: usize) -> DataSet {
    RowWindow::last(n, dataset.row_count()).apply(dataset)
}

/// Range selector on the usage charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingRange {
    Last7Days,
    Last14Days,
    All,
}

impl TrailingRange {
    pub fn window(self, len: usize) -> RowWindow {
        match self {
            Self::Last7Days => RowWindow::last(7, len),
            Self::Last14Days => RowWindow::last(14, len),
            Self::All => RowWindow::all(len),
        }
    }
}

/// Period selector on the leaderboards. Each period ranks by its own precomputed counter
/// column (`totalLikes`, `thisWeek`, `thisMonth`) rather than by filtering rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeFrame {
    #[default]
    #[serde(rename = "all-time")]
    AllTime,
    #[serde(rename = "7-days")]
    Last7Days,
    #[serde(rename = "30-days")]
    Last30Days,
}

impl TimeFrame {
    pub fn from_input(raw: &str) -> Option<Self> {
        match raw.trim() {
            "" | "all-time" => Some(Self::AllTime),
            "7-days" => Some(Self::Last7Days),
            "30-days" => Some(Self::Last30Days),
            _ => None,
        }
    }
}

/// Relative date filter on list screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "preset")]
pub enum DatePreset {
    All,
    Today,
    /// From midnight yesterday onwards.
    Yesterday,
    Week,
    Month,
    Custom {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

impl DatePreset {
    /// Parse a select-input value; `custom` takes its bounds separately.
    pub fn from_input(raw: &str) -> Option<Self> {
        match raw.trim() {
            "" | "all" => Some(Self::All),
            "today" => Some(Self::Today),
            "yesterday" => Some(Self::Yesterday),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "custom" => Some(Self::Custom {
                start: None,
                end: None,
            }),
            _ => None,
        }
    }

    /// Inclusive `(start, end)` instants relative to `now`; `None` means unbounded.
    pub fn resolve(self, now: DateTime<Utc>) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let midnight = |d: NaiveDate| d.and_time(NaiveTime::MIN).and_utc();
        let today = now.date_naive();
        match self {
            Self::All => (None, None),
            Self::Today => (Some(midnight(today)), None),
            Self::Yesterday => (today.pred_opt().map(midnight), None),
            Self::Week => (Some(now - Duration::days(7)), None),
            Self::Month => (Some(now - Duration::days(30)), None),
            Self::Custom { start, end } => (
                start.map(midnight),
                end.and_then(|d| d.and_hms_opt(23, 59, 59)).map(|t| t.and_utc()),
            ),
        }
    }

    /// Range criterion on `field`, or `None` when the preset constrains nothing.
    pub fn criterion(self, field: &str, now: DateTime<Utc>) -> Option<Criterion> {
        match self.resolve(now) {
            (None, None) => None,
            (start, end) => Some(Criterion::during(field, start, end)),
        }
    }
}

/// Share of the current month already elapsed, in percent.
pub fn month_progress(now: DateTime<Utc>) -> f64 {
    let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1);
    let next = if now.month() == 12 {
        NaiveDate::from_ymd_opt(now.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(now.year(), now.month() + 1, 1)
    };
    match (first, next) {
        (Some(first), Some(next)) => {
            let days = (next - first).num_days() as f64;
            f64::from(now.day()) / days * 100.0
        }
        _ => 0.0,
    }
}
