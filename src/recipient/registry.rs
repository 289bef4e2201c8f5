//! Active peer registry
//!
//! Server-side record of which client addresses have made a request
//! recently. Only addresses seen within the timeout are offered as
//! recipients.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

/// How long an address stays listed after its last request
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct PeerRegistry {
    timeout: Duration,
    /// First-seen order is kept so listings are stable
    last_seen: Vec<(String, Instant)>,
}

impl PeerRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_seen: Vec::new(),
        }
    }

    /// Record a request from `addr`
    pub fn touch(&mut self, addr: &str, now: Instant) {
        match self.last_seen.iter_mut().find(|(a, _)| a == addr) {
            Some((_, seen)) => *seen = now,
            None => {
                debug!("New peer seen: {}", addr);
                self.last_seen.push((addr.to_string(), now));
            }
        }
        trace!("Peer {} touched", addr);
    }

    /// Addresses seen within the timeout, in first-seen order
    pub fn active(&self, now: Instant) -> Vec<String> {
        self.last_seen
            .iter()
            .filter(|(_, seen)| now.saturating_duration_since(*seen) <= self.timeout)
            .map(|(addr, _)| addr.clone())
            .collect()
    }

    /// Forget expired addresses, returning how many were dropped
    pub fn prune(&mut self, now: Instant) -> usize {
        let before = self.last_seen.len();
        let timeout = self.timeout;
        self.last_seen
            .retain(|(_, seen)| now.saturating_duration_since(*seen) <= timeout);
        let removed = before - self.last_seen.len();
        if removed > 0 {
            debug!("Pruned {} inactive peers, {} remain", removed, self.last_seen.len());
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_PEER_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_and_active() {
        let start = Instant::now();
        let mut registry = PeerRegistry::new(Duration::from_secs(30));
        registry.touch("10.0.0.1", start);
        registry.touch("10.0.0.2", start + Duration::from_secs(10));

        assert_eq!(registry.active(start + Duration::from_secs(20)), vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(registry.active(start + Duration::from_secs(35)), vec!["10.0.0.2"]);
    }

    #[test]
    fn test_touch_refreshes_timestamp() {
        let start = Instant::now();
        let mut registry = PeerRegistry::default();
        registry.touch("10.0.0.1", start);
        registry.touch("10.0.0.1", start + Duration::from_secs(25));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.active(start + Duration::from_secs(50)), vec!["10.0.0.1"]);
    }

    #[test]
    fn test_prune() {
        let start = Instant::now();
        let mut registry = PeerRegistry::new(Duration::from_secs(5));
        registry.touch("a", start);
        registry.touch("b", start + Duration::from_secs(4));

        assert_eq!(registry.prune(start + Duration::from_secs(8)), 1);
        assert_eq!(registry.active(start + Duration::from_secs(8)), vec!["b"]);
        assert!(!registry.is_empty());
    }
}
