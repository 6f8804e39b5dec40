//! Periodic bulk expiry of overdue sessions.
//!
//! Reads already expire sessions lazily; the sweeper only keeps stored
//! statuses fresh for listings and dashboards that never read a session by id.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::services::lifecycle::SessionManager;

pub fn spawn_sweeper(manager: SessionManager, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match manager.sweep_expired().await {
                Ok(0) => {}
                Ok(expired) => tracing::info!(expired, "Swept overdue sessions"),
                Err(e) => tracing::warn!(error = %e, "Session sweep failed"),
            }
        }
    })
}
