//! Chronological chart series and PM2.5 ranking over aggregated buckets.

use serde::{Deserialize, Serialize};

use super::{AggregateBucket, SafetyLevel};

/// Parallel sequences fed to a plotting component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub levels: Vec<SafetyLevel>,
    /// Bar color per bucket, from its level.
    pub colors: Vec<String>,
}

/// A bucket with its 1-based position in a ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedBucket {
    pub rank: usize,
    #[serde(flatten)]
    pub bucket: AggregateBucket,
}

/// Buckets sorted ascending by bucket start.
///
/// Sorting uses the instant, never the label text.
pub fn chronological(buckets: &[AggregateBucket]) -> Vec<AggregateBucket> {
    let mut sorted = buckets.to_vec();
    sorted.sort_by_key(|b| b.start);
    sorted
}

/// Chart series of average PM2.5 in chronological order.
pub fn chart_series(buckets: &[AggregateBucket]) -> ChartSeries {
    // ---
    let sorted = chronological(buckets);
    let levels: Vec<SafetyLevel> = sorted
        .iter()
        .map(|b| SafetyLevel::from_pm25(b.average_pm25))
        .collect();

    ChartSeries {
        labels: sorted.iter().map(|b| b.label.clone()).collect(),
        values: sorted.iter().map(|b| b.average_pm25).collect(),
        colors: levels.iter().map(|l| l.color().to_string()).collect(),
        levels,
    }
}

/// Top `n` buckets by average PM2.5, highest first.
///
/// The sort is stable, so ties keep their input order.
pub fn rank(buckets: &[AggregateBucket], n: usize) -> Vec<RankedBucket> {
    // ---
    let mut sorted = buckets.to_vec();
    sorted.sort_by(|a, b| b.average_pm25.total_cmp(&a.average_pm25));
    sorted
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, bucket)| RankedBucket { rank: i + 1, bucket })
        .collect()
}

/// The single highest bucket, if any.
pub fn top(buckets: &[AggregateBucket]) -> Option<RankedBucket> {
    rank(buckets, 1).into_iter().next()
}

/// Render a concentration rounded to two decimals.
pub fn format_pm(value: f64) -> String {
    format!("{value:.2} µg/m³")
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn bucket(label: &str, start: DateTime<Utc>, avg: f64) -> AggregateBucket {
        AggregateBucket {
            label: label.to_string(),
            start,
            average_pm25: avg,
            average_pm1: 0.0,
            average_pm10: 0.0,
            count: 1,
        }
    }

    fn hour(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn ranking_puts_highest_first() {
        // ---
        let buckets = vec![
            bucket("A", hour(1), 15.0),
            bucket("B", hour(2), 30.0),
            bucket("C", hour(3), 20.0),
        ];

        let best = top(&buckets).unwrap();
        assert_eq!(best.rank, 1);
        assert_eq!(best.bucket.label, "B");

        let ranked = rank(&buckets, 10);
        let order: Vec<(usize, &str)> = ranked.iter().map(|r| (r.rank, r.bucket.label.as_str())).collect();
        assert_eq!(order, [(1, "B"), (2, "C"), (3, "A")]);
    }

    #[test]
    fn ranking_ties_keep_input_order() {
        // ---
        let buckets = vec![
            bucket("first", hour(5), 10.0),
            bucket("second", hour(1), 10.0),
            bucket("third", hour(3), 10.0),
        ];

        let labels: Vec<String> = rank(&buckets, 3).into_iter().map(|r| r.bucket.label).collect();
        assert_eq!(labels, ["first", "second", "third"]);
    }

    #[test]
    fn empty_ranking_has_no_top() {
        assert!(top(&[]).is_none());
        assert!(rank(&[], 5).is_empty());
    }

    #[test]
    fn chart_sorts_by_instant_not_label() {
        // ---
        // "9-3 10:00" sorts after "10-3 09:00" lexically; instants disagree
        let buckets = vec![
            bucket("10-3 09:00", hour(9) + chrono::Duration::days(9), 40.0),
            bucket("9-3 10:00", hour(10) + chrono::Duration::days(8), 12.0),
        ];

        let series = chart_series(&buckets);
        assert_eq!(series.labels, ["9-3 10:00", "10-3 09:00"]);
        assert_eq!(series.values, [12.0, 40.0]);
        assert_eq!(series.levels, [SafetyLevel::Good, SafetyLevel::Unhealthy]);
        assert_eq!(
            series.colors,
            [SafetyLevel::Good.color(), SafetyLevel::Unhealthy.color()]
        );
    }

    #[test]
    fn formats_two_decimals() {
        assert_eq!(format_pm(12.345678), "12.35 µg/m³");
        assert_eq!(format_pm(7.0), "7.00 µg/m³");
    }
}
