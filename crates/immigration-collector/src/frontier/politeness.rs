//! Per-domain politeness delay.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Enforces a minimum spacing between requests to the same domain.
///
/// Each domain gets its own async gate. The gate stays locked while the
/// caller sleeps, so concurrent callers for one domain are released one at a
/// time and always at least `min_delay` apart. Other domains are unaffected.
pub struct PolitenessScheduler {
    min_delay: Duration,
    gates: Mutex<HashMap<String, Arc<tokio::sync::Mutex<Option<Instant>>>>>,
}

impl PolitenessScheduler {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_millis(min_delay_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_delay_ms))
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    fn gate(&self, domain: &str) -> Arc<tokio::sync::Mutex<Option<Instant>>> {
        let mut gates = self.gates.lock().unwrap_or_else(|e| e.into_inner());
        gates
            .entry(domain.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(None)))
            .clone()
    }

    /// Wait until `domain` may be hit again, then stamp the request time.
    pub async fn wait_if_needed(&self, domain: &str) {
        let gate = self.gate(domain);
        let mut last = gate.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_delay {
                tokio::time::sleep(self.min_delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
