//! Periodic flush timer.

use super::Shared;
use std::sync::Weak;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Flush every `period`, first at `start + period`. The task holds only a weak
/// reference and exits once the session state is gone.
pub(super) fn spawn(
    runtime: &Handle,
    shared: Weak<Shared>,
    start: Instant,
    period: Duration,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        let mut ticker = interval_at(start + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(state) = shared.upgrade() else {
                break;
            };
            if !state.flush_and_dispatch() {
                break;
            }
        }
        tracing::debug!("flush timer exited");
    })
}
