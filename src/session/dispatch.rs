//! Hands finished vectors to the host callback and the classifier uplink.

use crate::config::TelemetryConfig;
use crate::features::FeatureVector;
use crate::uplink::UplinkClient;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Host callback invoked synchronously with every vector.
pub type VectorCallback = Arc<dyn Fn(&FeatureVector) + Send + Sync>;

#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

/// Decrements the in-flight count when a send task finishes or is aborted.
struct InFlightGuard(Arc<InFlight>);

impl InFlightGuard {
    fn new(in_flight: &Arc<InFlight>) -> Self {
        in_flight.count.fetch_add(1, Ordering::AcqRel);
        Self(in_flight.clone())
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.count.fetch_sub(1, Ordering::AcqRel);
        self.0.idle.notify_one();
    }
}

#[derive(Clone, Default)]
pub struct Dispatcher {
    uplink: Option<UplinkClient>,
    on_vector: Option<VectorCallback>,
    in_flight: Arc<InFlight>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uplink to `endpointUrl` when one is configured.
    pub fn from_config(config: &TelemetryConfig) -> Self {
        let uplink = config.endpoint_url.as_deref().and_then(|url| {
            let client = UplinkClient::new(url, &config.uplink);
            if client.is_none() {
                warn!(endpoint = url, "uplink client unavailable; vectors stay local");
            }
            client
        });
        Self {
            uplink,
            ..Default::default()
        }
    }

    pub fn with_uplink(mut self, uplink: UplinkClient) -> Self {
        self.uplink = Some(uplink);
        self
    }

    pub fn with_callback(mut self, f: impl Fn(&FeatureVector) + Send + Sync + 'static) -> Self {
        self.on_vector = Some(Arc::new(f));
        self
    }

    pub fn has_uplink(&self) -> bool {
        self.uplink.is_some()
    }

    /// Run the callback, then start an independent send task that owns only
    /// the vector. Returns the send task, if one was started; callers are free
    /// to drop it. Failures are logged, never retried.
    pub fn dispatch(&self, vector: FeatureVector, window: u64) -> Option<JoinHandle<()>> {
        if let Some(cb) = &self.on_vector {
            if catch_unwind(AssertUnwindSafe(|| cb(&vector))).is_err() {
                error!(window, "vector callback panicked");
            }
        }

        let uplink = self.uplink.clone()?;
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(window, "no async runtime; vector not sent");
            return None;
        };
        let guard = InFlightGuard::new(&self.in_flight);
        Some(runtime.spawn(async move {
            let _guard = guard;
            match uplink.send(&vector).await {
                Ok(()) => debug!(window, endpoint = uplink.endpoint(), "vector sent"),
                Err(e) => warn!(window, endpoint = uplink.endpoint(), error = %e, "vector send failed"),
            }
        }))
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.count.load(Ordering::Acquire)
    }

    /// Wait up to `limit` for in-flight sends to finish. Returns false if some
    /// were still pending at the deadline.
    pub async fn drain(&self, limit: Duration) -> bool {
        let wait = async {
            while self.in_flight() > 0 {
                self.in_flight.idle.notified().await;
            }
        };
        tokio::time::timeout(limit, wait).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureComposer, ResultLabel, WindowAccumulator};
    use std::sync::Mutex;

    fn vector() -> FeatureVector {
        FeatureComposer::new(ResultLabel::Human).compose(&WindowAccumulator::new(), Duration::from_secs(5))
    }

    #[test]
    fn callback_only_starts_no_task() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let d = Dispatcher::new().with_callback(move |v| sink.lock().unwrap().push(v.clone()));
        assert!(d.dispatch(vector(), 0).is_none());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn panicking_callback_is_contained() {
        let d = Dispatcher::new().with_callback(|_| panic!("host bug"));
        assert!(d.dispatch(vector(), 3).is_none());
    }

    #[test]
    fn no_endpoint_means_no_uplink() {
        let d = Dispatcher::from_config(&TelemetryConfig::default());
        assert!(!d.has_uplink());
    }

    #[tokio::test]
    async fn drain_with_nothing_in_flight_returns_immediately() {
        let d = Dispatcher::new();
        assert_eq!(d.in_flight(), 0);
        assert!(d.drain(Duration::from_millis(10)).await);
    }
}
