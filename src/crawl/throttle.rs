//! Per-host politeness delays.

use crate::core::config::{get_random_sleep_duration, Config};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;

type Gate = Arc<tokio::sync::Mutex<Option<Instant>>>;

/// Serialises request issuance per host and spaces consecutive requests to
/// the same host by the configured delay. Distinct hosts never wait on each other.
///
/// Lives as long as one discovery run; gates are never shared across runs.
#[derive(Default)]
pub(crate) struct HostThrottle {
    gates: Mutex<HashMap<String, Gate>>,
}

impl HostThrottle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn gate(&self, host: &str) -> Gate {
        let mut gates = self.gates.lock();
        Arc::clone(gates.entry(host.to_lowercase()).or_default())
    }

    /// Waits until a request to `host` may be issued.
    pub(crate) async fn wait_turn(&self, host: &str, config: &Config) {
        let gate = self.gate(host);
        let mut last_issued = gate.lock().await;
        if let Some(previous) = *last_issued {
            let ready_at = previous + get_random_sleep_duration(config);
            if ready_at > Instant::now() {
                tracing::trace!(target: "crawl_task", "Delaying next request to {}", host);
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last_issued = Some(Instant::now());
    }

    #[cfg(test)]
    pub(crate) fn host_count(&self) -> usize {
        self.gates.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn delay(seconds: f32) -> Config {
        Config {
            sleep_between_requests: (seconds, seconds),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn same_host_is_spaced() {
        let config = delay(0.2);
        let throttle = HostThrottle::new();
        let start = Instant::now();
        throttle.wait_turn("acme.test", &config).await;
        throttle.wait_turn("ACME.test", &config).await;
        assert!(start.elapsed() >= Duration::from_millis(190));
        assert_eq!(throttle.host_count(), 1);
    }

    #[tokio::test]
    async fn other_hosts_are_not_delayed() {
        let config = delay(0.5);
        let throttle = HostThrottle::new();
        throttle.wait_turn("acme.test", &config).await;
        let start = Instant::now();
        throttle.wait_turn("other.test", &config).await;
        assert!(start.elapsed() < Duration::from_millis(250));
    }
}
