//! Periodic health reporting.
//!
//! The publisher runs one long-lived task that posts a monitor event on a
//! timer, follows interval changes from a watch channel, and keeps failure
//! logging quiet during long outages.

pub mod policy;
pub mod publisher;

pub use policy::{FailureTracker, FAILURE_LOG_EVERY};
pub use publisher::{machine_name, HeartbeatPublisher, MonitorSink, PublisherState};
