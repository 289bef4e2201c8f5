//! Recipient directory module
//!
//! Client-side list of addressable peers plus the current selection.

use tracing::{debug, info};

use crate::recipient::target::RecipientTarget;

/// Peers the uploader may target and which one is selected
#[derive(Debug, Clone, Default)]
pub struct RecipientDirectory {
    peers: Vec<String>,
    selected: RecipientTarget,
}

impl RecipientDirectory {
    /// Create an empty directory with `Everyone` selected
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    pub fn selected(&self) -> &RecipientTarget {
        &self.selected
    }

    /// Selector entries: `Everyone` first, then each known peer
    pub fn options(&self) -> Vec<RecipientTarget> {
        std::iter::once(RecipientTarget::Everyone)
            .chain(self.peers.iter().cloned().map(RecipientTarget::Address))
            .collect()
    }

    pub fn contains(&self, addr: &str) -> bool {
        self.peers.iter().any(|p| p == addr)
    }

    /// Map a candidate onto something selectable; unknown addresses become `Everyone`
    pub fn resolve(&self, candidate: Option<&RecipientTarget>) -> RecipientTarget {
        match candidate {
            Some(RecipientTarget::Address(addr)) if self.contains(addr) => RecipientTarget::Address(addr.clone()),
            Some(RecipientTarget::Address(addr)) => {
                debug!("Recipient {} is not in the directory, using Everyone", addr);
                RecipientTarget::Everyone
            }
            _ => RecipientTarget::Everyone,
        }
    }

    /// Select a target and return what was actually selected
    pub fn select(&mut self, target: RecipientTarget) -> &RecipientTarget {
        self.selected = self.resolve(Some(&target));
        &self.selected
    }

    /// Go back to `Everyone`
    pub fn reset(&mut self) {
        self.selected = RecipientTarget::Everyone;
    }

    /// Replace the peer list.
    ///
    /// Blank and duplicate entries are dropped. If the selected address is
    /// no longer listed the selection falls back to `Everyone`; the return
    /// value says whether that happened.
    pub fn refresh(&mut self, peers: Vec<String>) -> bool {
        let mut unique: Vec<String> = Vec::with_capacity(peers.len());
        for peer in peers {
            let peer = peer.trim().to_string();
            if !peer.is_empty() && !unique.contains(&peer) {
                unique.push(peer);
            }
        }
        self.peers = unique;
        debug!("Recipient directory refreshed: {} peers", self.peers.len());

        let resolved = self.resolve(Some(&self.selected));
        if resolved != self.selected {
            info!("Selected recipient {} is gone, falling back to Everyone", self.selected);
            self.selected = resolved;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peers(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_directory_offers_everyone() {
        let dir = RecipientDirectory::new();
        assert_eq!(dir.options(), vec![RecipientTarget::Everyone]);
        assert!(dir.selected().is_everyone());
    }

    #[test]
    fn test_select_known_peer() {
        let mut dir = RecipientDirectory::new();
        dir.refresh(peers(&["192.168.1.10", "192.168.1.42"]));
        let selected = dir.select(RecipientTarget::address("192.168.1.42")).clone();
        assert_eq!(selected, RecipientTarget::address("192.168.1.42"));
        assert_eq!(dir.options().len(), 3);
    }

    #[test]
    fn test_select_unknown_peer_falls_back() {
        let mut dir = RecipientDirectory::new();
        dir.refresh(peers(&["192.168.1.10"]));
        assert!(dir.select(RecipientTarget::address("192.168.1.99")).is_everyone());
    }

    #[test]
    fn test_refresh_drops_vanished_selection() {
        let mut dir = RecipientDirectory::new();
        dir.refresh(peers(&["192.168.1.42"]));
        dir.select(RecipientTarget::address("192.168.1.42"));

        assert!(dir.refresh(peers(&["192.168.1.7"])));
        assert!(dir.selected().is_everyone());
    }

    #[test]
    fn test_refresh_keeps_present_selection() {
        let mut dir = RecipientDirectory::new();
        dir.refresh(peers(&["192.168.1.42"]));
        dir.select(RecipientTarget::address("192.168.1.42"));

        assert!(!dir.refresh(peers(&["192.168.1.7", "192.168.1.42"])));
        assert_eq!(dir.selected(), &RecipientTarget::address("192.168.1.42"));
    }

    #[test]
    fn test_refresh_dedupes_and_trims() {
        let mut dir = RecipientDirectory::new();
        dir.refresh(peers(&["10.0.0.1", " 10.0.0.1 ", "", "10.0.0.2"]));
        assert_eq!(dir.peers(), &["10.0.0.1".to_string(), "10.0.0.2".to_string()]);
    }

    #[test]
    fn test_resolve() {
        let mut dir = RecipientDirectory::new();
        dir.refresh(peers(&["10.0.0.1"]));
        assert!(dir.resolve(None).is_everyone());
        assert!(dir.resolve(Some(&RecipientTarget::Everyone)).is_everyone());
        assert!(dir.resolve(Some(&RecipientTarget::address("10.0.0.3"))).is_everyone());
        assert_eq!(
            dir.resolve(Some(&RecipientTarget::address("10.0.0.1"))),
            RecipientTarget::address("10.0.0.1")
        );
    }
}
