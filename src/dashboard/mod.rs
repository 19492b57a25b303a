//! Client side of the dashboard pages.
//!
//! A view fetches the full reading history once per user action (initial
//! load, restart, range or granularity change), keeps it as an immutable
//! snapshot, and derives every chart and ranking from it with the pure
//! functions in [`crate::aggregate`]. Responses that arrive after a newer
//! request was issued are dropped using [`RequestEpoch`].

mod client;
mod epoch;
mod poll;
mod view;

pub use client::{ClientError, DashboardClient};
pub use epoch::{RequestEpoch, Ticket};
pub use poll::{spawn_device_poller, LiveDevice, DEFAULT_POLL_PERIOD};
pub use view::{latest_alert_text, DashboardView, ViewSnapshot, FETCH_ERROR_MESSAGE};
