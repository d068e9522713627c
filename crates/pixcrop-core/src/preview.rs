//! Preview handle lifecycle.
//!
//! A crop session publishes at most one preview at a time: an encoded blob
//! plus a revocable URL-like reference. The reference lifecycle is the
//! central resource-ownership invariant of the pipeline, so instead of an
//! implicit module-global URL it lives in an explicit registry owned by the
//! session: mint on publish, revoke the superseded reference exactly once,
//! never the newest.

use std::collections::HashSet;

/// A published preview: the encoded blob and its revocable reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewHandle {
    /// Encoded image data.
    pub blob: Vec<u8>,
    /// Revocable reference to the blob, unique per mint.
    pub url: String,
}

/// Registry of revocable preview references.
///
/// References are minted with a monotonic counter and revoked at most once;
/// revoking an unknown or already-revoked reference is a no-op that reports
/// `false` so double-release bugs surface in tests.
#[derive(Debug, Default)]
pub struct PreviewUrls {
    next_id: u64,
    live: HashSet<String>,
    revoked_count: u64,
}

impl PreviewUrls {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh live reference.
    pub fn mint(&mut self) -> String {
        let url = format!("blob:pixcrop/{}", self.next_id);
        self.next_id += 1;
        self.live.insert(url.clone());
        url
    }

    /// Revoke a reference. Returns true only when the reference was live;
    /// a second revoke of the same reference returns false and changes
    /// nothing.
    pub fn revoke(&mut self, url: &str) -> bool {
        if self.live.remove(url) {
            self.revoked_count += 1;
            true
        } else {
            false
        }
    }

    /// True while the reference is live.
    pub fn is_live(&self, url: &str) -> bool {
        self.live.contains(url)
    }

    /// Number of currently live references.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Total references minted so far.
    pub fn minted_count(&self) -> u64 {
        self.next_id
    }

    /// Total references revoked so far.
    pub fn revoked_count(&self) -> u64 {
        self.revoked_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_is_unique_and_live() {
        let mut urls = PreviewUrls::new();

        let a = urls.mint();
        let b = urls.mint();

        assert_ne!(a, b);
        assert!(urls.is_live(&a));
        assert!(urls.is_live(&b));
        assert_eq!(urls.live_count(), 2);
    }

    #[test]
    fn test_revoke_once() {
        let mut urls = PreviewUrls::new();
        let url = urls.mint();

        assert!(urls.revoke(&url));
        assert!(!urls.is_live(&url));
        assert_eq!(urls.live_count(), 0);
        assert_eq!(urls.revoked_count(), 1);
    }

    #[test]
    fn test_double_revoke_is_noop() {
        let mut urls = PreviewUrls::new();
        let url = urls.mint();

        assert!(urls.revoke(&url));
        assert!(!urls.revoke(&url));
        assert_eq!(urls.revoked_count(), 1);
    }

    #[test]
    fn test_revoke_unknown_is_noop() {
        let mut urls = PreviewUrls::new();
        assert!(!urls.revoke("blob:pixcrop/999"));
        assert_eq!(urls.revoked_count(), 0);
    }

    #[test]
    fn test_replace_discipline() {
        // M sequential mint+revoke cycles leave exactly one live reference
        // and M-1 revocations.
        let mut urls = PreviewUrls::new();
        let mut current: Option<String> = None;

        const M: u64 = 8;
        for _ in 0..M {
            let fresh = urls.mint();
            if let Some(prev) = current.take() {
                assert!(urls.revoke(&prev));
            }
            current = Some(fresh);
        }

        assert_eq!(urls.live_count(), 1);
        assert_eq!(urls.minted_count(), M);
        assert_eq!(urls.revoked_count(), M - 1);
        assert!(urls.is_live(current.as_deref().unwrap()));
    }
}
