//! Periodic overdue scan

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::TodoState;

/// Background task rescanning a [`TodoState`] for overdue tasks.
///
/// Dropping the watcher cancels it.
pub struct OverdueWatcher {
    handle: JoinHandle<()>,
}

impl OverdueWatcher {
    /// Start scanning at the state's configured interval
    pub fn spawn(state: TodoState) -> Self {
        let period = state.config().overdue_scan_interval;
        Self::with_period(state, period)
    }

    pub fn with_period(state: TodoState, period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let notified = state.scan_overdue().await;
                if !notified.is_empty() {
                    debug!("Overdue scan notified {} todos", notified.len());
                }
            }
        });

        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancel the scan loop
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for OverdueWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
