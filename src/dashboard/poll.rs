//! Fixed-interval refresh of the live device list.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{DashboardClient, RequestEpoch};
use crate::models::Device;

/// Refresh period used by the live device pages.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(1);

/// A polled device with its online indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveDevice {
    #[serde(flatten)]
    pub device: Device,
    /// Reported within the last 30 seconds, as of the poll.
    pub online: bool,
}

impl LiveDevice {
    fn from_poll(devices: Vec<Device>) -> Vec<Self> {
        let now = Utc::now();
        devices
            .into_iter()
            .map(|device| Self {
                online: device.is_online(now),
                device,
            })
            .collect()
    }
}

/// Poll `/api/devices` every `period` until `shutdown` becomes `true`.
///
/// Each tick spawns an independent fetch. Overlapping fetches are not
/// deduplicated; a response is published only if no newer one was
/// published first. Failures are logged and the previous list is kept.
pub fn spawn_device_poller(
    client: Arc<DashboardClient>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> (watch::Receiver<Vec<LiveDevice>>, JoinHandle<()>) {
    // ---
    let (tx, rx) = watch::channel(Vec::new());
    let tx = Arc::new(tx);
    let epoch = Arc::new(RequestEpoch::new());

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let ticket = epoch.issue();
                    let (client, epoch, tx) = (client.clone(), epoch.clone(), tx.clone());
                    tokio::spawn(async move {
                        match client.fetch_devices().await {
                            Ok(devices) if epoch.try_advance(ticket) => {
                                tx.send_replace(LiveDevice::from_poll(devices));
                            }
                            Ok(_) => tracing::debug!("Discarding stale device poll {:?}", ticket),
                            Err(e) => tracing::warn!("Device poll failed: {}", e),
                        }
                    });
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::debug!("Device poller stopping");
                        break;
                    }
                }
            }
        }
    });

    (rx, handle)
}
