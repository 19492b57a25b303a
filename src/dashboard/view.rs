//! Per-view dashboard state: one reading snapshot plus the user's choices.

use chrono::FixedOffset;
use serde::Serialize;

use super::{ClientError, DashboardClient, RequestEpoch, Ticket};
use crate::aggregate::{
    aggregate, chart_series, filter_range, format_pm, mean_pm25, present, rank, AggregateBucket,
    ChartSeries, DateRange, Granularity, RankedBucket,
};
use crate::models::Reading;

/// Message shown when a fetch fails.
pub const FETCH_ERROR_MESSAGE: &str = "Error fetching data.";

/// Everything a dashboard page renders, derived from one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewSnapshot {
    /// Buckets in chronological order.
    pub buckets: Vec<AggregateBucket>,
    pub chart: ChartSeries,
    pub ranking: Vec<RankedBucket>,
    /// Mean PM2.5 over every reading in range.
    pub average_pm25: Option<f64>,
    pub readings_in_range: usize,
    pub error: Option<String>,
}

/// State owned by one dashboard view.
///
/// Aggregates are never stored: [`DashboardView::snapshot`] recomputes them
/// from the current readings, range and granularity.
#[derive(Debug)]
pub struct DashboardView {
    epoch: RequestEpoch,
    readings: Vec<Reading>,
    range: DateRange,
    granularity: Granularity,
    tz: FixedOffset,
    error: Option<String>,
}

impl DashboardView {
    // ---
    pub fn new(tz: FixedOffset) -> Self {
        Self {
            epoch: RequestEpoch::new(),
            readings: Vec::new(),
            range: DateRange::unbounded(),
            granularity: Granularity::default(),
            tz,
            error: None,
        }
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn set_range(&mut self, range: DateRange) {
        self.range = range;
    }

    pub fn set_granularity(&mut self, granularity: Granularity) {
        self.granularity = granularity;
    }

    /// Start a fetch; its result must be passed back to [`Self::apply`].
    pub fn begin_fetch(&self) -> Ticket {
        self.epoch.issue()
    }

    /// Clear the range and start a new fetch.
    pub fn restart(&mut self) -> Ticket {
        self.range = DateRange::unbounded();
        self.begin_fetch()
    }

    /// Replace the snapshot with a fetch result.
    ///
    /// Returns `false` and changes nothing if a newer fetch was started after
    /// `ticket`. A failed fetch empties the view and records a message.
    pub fn apply(&mut self, ticket: Ticket, result: Result<Vec<Reading>, ClientError>) -> bool {
        // ---
        if !self.epoch.is_current(ticket) {
            tracing::debug!("Discarding stale response {:?}", ticket);
            return false;
        }

        match result {
            Ok(readings) => {
                self.readings = readings;
                self.error = None;
            }
            Err(e) => {
                tracing::error!("Error fetching data: {}", e);
                self.readings.clear();
                self.error = Some(FETCH_ERROR_MESSAGE.to_string());
            }
        }
        true
    }

    /// Fetch history through `client` and apply it.
    pub async fn refresh(&mut self, client: &DashboardClient, pm_id: Option<&str>) -> bool {
        let ticket = self.begin_fetch();
        let result = client.fetch_history(pm_id).await;
        self.apply(ticket, result)
    }

    /// Compute the chart, top-`top_n` ranking and overall average.
    pub fn snapshot(&self, top_n: usize) -> ViewSnapshot {
        // ---
        let filtered = filter_range(&self.readings, &self.range);
        let buckets = aggregate(filtered.iter().copied(), self.granularity, &self.tz);

        ViewSnapshot {
            chart: chart_series(&buckets),
            ranking: rank(&buckets, top_n),
            average_pm25: mean_pm25(&filtered),
            readings_in_range: filtered.len(),
            buckets: present::chronological(&buckets),
            error: self.error.clone(),
        }
    }
}

/// Alert text describing the most recent valid reading in `readings`.
pub fn latest_alert_text(readings: &[Reading], tz: &FixedOffset) -> Option<String> {
    // ---
    let (at, latest) = readings
        .iter()
        .filter_map(|r| r.observed_at().map(|at| (at, r)))
        .max_by_key(|(at, _)| *at)?;

    Some(format!(
        "Device {} at {}: PM2.5 {}, PM1 {}, PM10 {}",
        latest.pm_id,
        at.with_timezone(tz).format("%Y-%m-%d %H:%M:%S"),
        format_pm(latest.pm2_5),
        format_pm(latest.pm1),
        format_pm(latest.pm10),
    ))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::aggregate::test_support::{reading, utc};
    use chrono::{TimeZone, Utc};

    fn sample() -> Vec<Reading> {
        vec![
            reading("2025-03-01T09:15:00Z", 10.0),
            reading("2025-03-01T09:45:00Z", 20.0),
            reading("2025-03-01T10:05:00Z", 30.0),
        ]
    }

    fn transport_error() -> ClientError {
        ClientError::Status {
            status: 500,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn snapshot_follows_range_and_granularity() {
        // ---
        let mut view = DashboardView::new(utc());
        let ticket = view.begin_fetch();
        assert!(view.apply(ticket, Ok(sample())));

        let hourly = view.snapshot(1);
        assert_eq!(hourly.chart.labels, ["2025-03-01 09:00", "2025-03-01 10:00"]);
        assert_eq!(hourly.ranking[0].bucket.label, "2025-03-01 10:00");
        assert_eq!(hourly.average_pm25, Some(20.0));

        view.set_granularity(Granularity::Day);
        view.set_range(DateRange::new(
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()),
            None,
        ));
        let daily = view.snapshot(1);
        assert_eq!(daily.buckets.len(), 1);
        assert_eq!(daily.buckets[0].count, 2);
        assert_eq!(daily.average_pm25, Some(25.0));
        assert_eq!(daily.readings_in_range, 2);
    }

    #[test]
    fn stale_response_is_discarded() {
        // ---
        let mut view = DashboardView::new(utc());
        let older = view.begin_fetch();
        let newer = view.begin_fetch();

        assert!(view.apply(newer, Ok(sample())));
        assert!(!view.apply(older, Ok(Vec::new())));
        assert_eq!(view.readings().len(), 3);
    }

    #[test]
    fn failed_fetch_empties_the_view() {
        // ---
        let mut view = DashboardView::new(utc());
        let ticket = view.begin_fetch();
        view.apply(ticket, Ok(sample()));

        let ticket = view.begin_fetch();
        assert!(view.apply(ticket, Err(transport_error())));

        let snapshot = view.snapshot(1);
        assert_eq!(snapshot.error.as_deref(), Some(FETCH_ERROR_MESSAGE));
        assert!(snapshot.chart.values.is_empty());
        assert!(snapshot.ranking.is_empty());
        assert_eq!(snapshot.average_pm25, None);
    }

    #[test]
    fn restart_clears_range() {
        // ---
        let mut view = DashboardView::new(utc());
        view.set_range(DateRange::new(Some(Utc::now()), None));

        let ticket = view.restart();
        assert_eq!(view.range(), DateRange::unbounded());
        assert!(view.apply(ticket, Ok(sample())));
        assert_eq!(view.snapshot(1).readings_in_range, 3);
    }

    #[test]
    fn alert_text_uses_latest_valid_reading() {
        // ---
        let mut readings = sample();
        readings.push(reading("broken", 999.0));

        let text = latest_alert_text(&readings, &utc()).unwrap();
        assert!(text.contains("2025-03-01 10:05:00"));
        assert!(text.contains("30.00 µg/m³"));
        assert!(latest_alert_text(&[], &utc()).is_none());
    }
}
