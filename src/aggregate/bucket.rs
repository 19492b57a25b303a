//! Hour/day bucketing and averaging.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Reading;

const SECS_PER_HOUR: i64 = 3600;
const SECS_PER_DAY: i64 = 24 * SECS_PER_HOUR;

/// Bucket width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Hour,
    Day,
}

impl Granularity {
    fn width_secs(&self) -> i64 {
        match self {
            Self::Hour => SECS_PER_HOUR,
            Self::Day => SECS_PER_DAY,
        }
    }

    /// Start of the bucket containing `at`, with wall-clock fields of the
    /// finer units zeroed in `tz`.
    pub fn truncate(&self, at: DateTime<Utc>, tz: &FixedOffset) -> Option<DateTime<Utc>> {
        let offset = i64::from(tz.local_minus_utc());
        let local = at.timestamp() + offset;
        let start = local - local.rem_euclid(self.width_secs()) - offset;
        DateTime::from_timestamp(start, 0)
    }

    /// Display label for a bucket starting at `start`.
    pub fn label(&self, start: DateTime<Utc>, tz: &FixedOffset) -> String {
        let local = start.with_timezone(tz);
        match self {
            Self::Hour => local.format("%Y-%m-%d %H:00").to_string(),
            Self::Day => local.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Average PM values of the readings sharing one bucket.
///
/// `count` is always positive: buckets exist only once a member is seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBucket {
    pub label: String,
    pub start: DateTime<Utc>,
    pub average_pm25: f64,
    pub average_pm1: f64,
    pub average_pm10: f64,
    pub count: usize,
}

#[derive(Debug, Default)]
struct Accumulator {
    sum_pm25: f64,
    sum_pm1: f64,
    sum_pm10: f64,
    count: usize,
}

impl Accumulator {
    fn add(&mut self, reading: &Reading) {
        self.sum_pm25 += reading.pm2_5;
        self.sum_pm1 += reading.pm1;
        self.sum_pm10 += reading.pm10;
        self.count += 1;
    }
}

/// Group readings by truncated timestamp and average each group.
///
/// Buckets come back in first-seen order. Readings without a valid
/// timestamp are skipped. No rounding is applied.
pub fn aggregate<'a, I>(readings: I, granularity: Granularity, tz: &FixedOffset) -> Vec<AggregateBucket>
where
    I: IntoIterator<Item = &'a Reading>,
{
    // ---
    let mut index: HashMap<DateTime<Utc>, usize> = HashMap::new();
    let mut groups: Vec<(DateTime<Utc>, Accumulator)> = Vec::new();

    for reading in readings {
        let Some(start) = reading
            .observed_at()
            .and_then(|at| granularity.truncate(at, tz))
        else {
            tracing::debug!("Skipping reading {} with invalid timestamp", reading.id);
            continue;
        };

        let slot = *index.entry(start).or_insert_with(|| {
            groups.push((start, Accumulator::default()));
            groups.len() - 1
        });
        groups[slot].1.add(reading);
    }

    groups
        .into_iter()
        .map(|(start, acc)| {
            let count = acc.count as f64;
            AggregateBucket {
                label: granularity.label(start, tz),
                start,
                average_pm25: acc.sum_pm25 / count,
                average_pm1: acc.sum_pm1 / count,
                average_pm10: acc.sum_pm10 / count,
                count: acc.count,
            }
        })
        .collect()
}

/// Mean PM2.5 over a whole filtered set; `None` when it is empty.
pub fn mean_pm25(readings: &[&Reading]) -> Option<f64> {
    if readings.is_empty() {
        return None;
    }
    let sum: f64 = readings.iter().map(|r| r.pm2_5).sum();
    Some(sum / readings.len() as f64)
}
