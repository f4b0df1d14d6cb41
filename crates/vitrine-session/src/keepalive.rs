//! Background session refresh.
//!
//! While the session is authenticated, refreshes it every
//! `session.refresh_interval_secs` and whenever the application signals that
//! it regained focus. Refreshes go through the coordinator, so they coalesce
//! with refreshes triggered by rejected requests.

use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::debug;
use vitrine_config::SessionConfig;

use crate::store::SessionStore;

/// Handle to the running keepalive task. Dropping it stops the task.
#[derive(Debug)]
pub struct Keepalive {
    handle: JoinHandle<()>,
    focus: Arc<Notify>,
    refresh_on_focus: bool,
}

impl Keepalive {
    /// Spawn the keepalive task for `store`.
    pub fn spawn(store: Arc<SessionStore>, config: &SessionConfig) -> Self {
        let focus = Arc::new(Notify::new());
        let mut interval = config.refresh_interval().map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        let notified = Arc::clone(&focus);
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tick(&mut interval) => debug!("Periodic session refresh"),
                    _ = notified.notified() => debug!("Focus session refresh"),
                }

                if store.can_refresh().await {
                    // Failure already signs the session out.
                    let _ = store.refresh_token().await;
                }
            }
        });

        Self {
            handle,
            focus,
            refresh_on_focus: config.refresh_on_focus,
        }
    }

    /// Signal that the application regained focus.
    pub fn focus(&self) {
        if self.refresh_on_focus {
            self.focus.notify_one();
        }
    }

    /// Whether the task is still running.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the task.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for Keepalive {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
