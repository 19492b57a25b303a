//! Inclusive, optionally open-ended time range filter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Reading;

/// Inclusive interval; a `None` bound is unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| start <= at) && self.end.map_or(true, |end| at <= end)
    }
}

/// Readings whose timestamp lies within `range`.
///
/// Readings without a valid timestamp never pass, whatever the bounds.
pub fn filter_range<'a>(readings: &'a [Reading], range: &DateRange) -> Vec<&'a Reading> {
    // ---
    readings
        .iter()
        .filter(|r| match r.observed_at() {
            Some(at) => range.contains(at),
            None => {
                tracing::debug!("Skipping reading {} with invalid timestamp {:?}", r.id, r.timestamp);
                false
            }
        })
        .collect()
}
