//! Background status polling.
//!
//! While the service reports running, the poller refreshes the controller's
//! status on a fixed period. It goes quiet as soon as a refresh observes the
//! service stopped, and resumes when the running flag comes back.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::ServiceController;

/// Default period between status refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Handle to the polling task. Dropping it stops polling.
pub struct StatusPoller {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl StatusPoller {
    /// Spawn the polling task on the current tokio runtime.
    pub fn spawn(controller: Arc<ServiceController>, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let running = controller.subscribe_running();
        let handle = tokio::spawn(supervise(controller, running, period, cancel.clone()));
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Stop polling and wait for the task to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Status poller task ended abnormally");
            }
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn supervise(
    controller: Arc<ServiceController>,
    mut running: watch::Receiver<bool>,
    period: Duration,
    cancel: CancellationToken,
) {
    loop {
        // Park until the service is reported running.
        tokio::select! {
            () = cancel.cancelled() => break,
            res = running.wait_for(|is_running| *is_running) => {
                if res.is_err() {
                    break;
                }
            }
        }

        debug!(period_ms = period.as_millis(), "Status polling started");
        if !poll_while_running(&controller, &mut running, period, &cancel).await {
            break;
        }
        debug!("Status polling stopped");
    }
}

/// Refresh on every tick until the service stops. Returns `false` when the
/// poller itself should exit.
async fn poll_while_running(
    controller: &ServiceController,
    running: &mut watch::Receiver<bool>,
    period: Duration,
    cancel: &CancellationToken,
) -> bool {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => return false,
            changed = running.changed() => {
                if changed.is_err() {
                    return false;
                }
                if !*running.borrow_and_update() {
                    return true;
                }
            }
            _ = ticker.tick() => {
                if let Err(e) = controller.refresh_status().await {
                    warn!(error = %e, "Status refresh failed");
                }
            }
        }
    }
}
