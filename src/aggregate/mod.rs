//! Time-bucketed PM2.5 aggregation.
//!
//! Everything here is pure and synchronous over an already-fetched list of
//! readings: [`filter_range`] narrows it, [`aggregate`] groups what remains
//! into hour or day buckets, and the [`present`] functions order the
//! buckets for charting or ranking. Results are recomputed from scratch on
//! every change; nothing is cached between calls.

mod bucket;
mod filter;
mod level;
pub mod present;

pub use bucket::{aggregate, mean_pm25, AggregateBucket, Granularity};
pub use filter::{filter_range, DateRange};
pub use level::SafetyLevel;
pub use present::{chart_series, format_pm, rank, top, ChartSeries, RankedBucket};

#[cfg(test)]
pub(crate) mod test_support {
    // ---
    use chrono::{FixedOffset, Offset, Utc};
    use uuid::Uuid;

    use crate::models::Reading;

    pub fn utc() -> FixedOffset {
        Utc.fix()
    }

    pub fn reading(timestamp: &str, pm2_5: f64) -> Reading {
        Reading {
            id: Uuid::new_v4(),
            pm_id: "dev-1".to_string(),
            timestamp: timestamp.to_string(),
            pm1: 0.0,
            pm2_5,
            pm10: 0.0,
            sensor_status: "ok".to_string(),
            received_at: Utc::now(),
        }
    }
}
