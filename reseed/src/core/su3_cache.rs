//! # Reseed Bundle Cache Module
//!
//! Holds the current generation of pre-encoded su3 bundles and assigns one of them
//! to every requesting peer. The request path only ever clones an `Arc` under a
//! short read lock; building, compressing and signing happen elsewhere.
//!
//! ## States
//! - `Empty`: no generation installed yet, lookups fail with `CacheNotReady`
//! - `Ready`: a generation is installed and served
//! - `Rebuilding`: the next generation is being built, the installed one is still served
//!
//! A generation is immutable. A rebuild installs a complete new one with a single
//! pointer swap, readers holding the old one keep it until they drop it.
//!
//! ## Peer assignment
//! The bundle of a peer is `SHA-256(peer)[..8] as u64 mod bundle count`: the same peer
//! gets the same bundle for the lifetime of a generation, distinct peers spread
//! over all bundles.
//!
//! Copyrights © 2025 Reseed Contributors. All rights reserved.

use anyhow::Result;
use bytes::Bytes;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use super::super::reseed_errors::ReseedError;

/// Identity of a requester, usually its IP address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Peer(String);

impl Peer {
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self(key.into())
    }

    /// Peer key of a remote socket address; the port is dropped so every
    /// connection from one host maps to the same bundle.
    pub fn from_remote_addr(remote_addr: &str) -> Self {
        match remote_addr.parse::<SocketAddr>() {
            Ok(addr) => Self(addr.ip().to_string()),
            Err(_) => Self(remote_addr.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Bundle index of this peer among `count` bundles. `count` must be non zero.
    pub fn slot(&self, count: usize) -> usize {
        let digest = Sha256::digest(self.0.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        (u64::from_be_bytes(prefix) % count as u64) as usize
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One immutable set of encoded su3 bundles.
#[derive(Debug)]
pub struct Generation {
    pub bundles: Vec<Bytes>,
    pub built_at: SystemTime,
}

impl Generation {
    pub fn new(bundles: Vec<Bytes>) -> Self {
        Self {
            bundles,
            built_at: SystemTime::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    pub fn bundle_for(&self, peer: &Peer) -> Option<&Bytes> {
        if self.bundles.is_empty() {
            return None;
        }
        self.bundles.get(peer.slot(self.bundles.len()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Ready,
    Rebuilding,
}

#[derive(Debug, Default)]
pub struct Su3Cache {
    current: RwLock<Option<Arc<Generation>>>,
    rebuilding: AtomicBool,
}

/// Marks the cache as rebuilding until dropped.
pub struct RebuildGuard<'a> {
    cache: &'a Su3Cache,
}

impl Drop for RebuildGuard<'_> {
    fn drop(&mut self) {
        self.cache.rebuilding.store(false, Ordering::Release);
    }
}

impl Su3Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CacheState {
        let ready = self.current.read().is_some();
        match (ready, self.rebuilding.load(Ordering::Acquire)) {
            (false, _) => CacheState::Empty,
            (true, true) => CacheState::Rebuilding,
            (true, false) => CacheState::Ready,
        }
    }

    pub fn current(&self) -> Option<Arc<Generation>> {
        self.current.read().clone()
    }

    /// Claim the single rebuild slot, `None` if a rebuild is already running.
    pub fn begin_rebuild(&self) -> Option<RebuildGuard<'_>> {
        self.rebuilding
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RebuildGuard { cache: self })
    }

    /// Replace the served generation. Empty generations are refused.
    pub fn install(&self, generation: Arc<Generation>) -> Result<()> {
        if generation.is_empty() {
            return Err(ReseedError::RebuildFailed("refusing to install an empty generation".to_string()).into());
        }
        *self.current.write() = Some(generation);
        Ok(())
    }

    /// Encoded su3 bundle assigned to `peer` in the current generation.
    pub fn lookup(&self, peer: &Peer) -> Result<Bytes> {
        let generation = self.current().ok_or(ReseedError::CacheNotReady)?;
        generation.bundle_for(peer).cloned().ok_or_else(|| ReseedError::CacheNotReady.into())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    fn generation(tag: &str, count: usize) -> Arc<Generation> {
        Arc::new(Generation::new((0..count).map(|i| Bytes::from(format!("{tag}-{i}"))).collect()))
    }

    #[test]
    fn test_lookup_before_install() {
        let cache = Su3Cache::new();
        assert_eq!(cache.state(), CacheState::Empty);
        let err = cache.lookup(&Peer::new("127.0.0.1")).unwrap_err();
        assert!(matches!(err.downcast_ref::<ReseedError>(), Some(ReseedError::CacheNotReady)));
    }

    #[test]
    fn test_lookup_is_deterministic() {
        let cache = Su3Cache::new();
        cache.install(generation("g1", 50)).unwrap();

        for i in 0..100 {
            let peer = Peer::new(format!("10.0.{}.{}", i / 256, i % 256));
            assert_eq!(cache.lookup(&peer).unwrap(), cache.lookup(&peer).unwrap(), "same peer should get the same bundle");
        }
    }

    #[test]
    fn test_slots_cover_all_bundles() {
        let count = 16;
        let slots: HashSet<usize> = (0..2000).map(|i| Peer::new(format!("192.168.{}.{}", i / 256, i % 256)).slot(count)).collect();
        assert_eq!(slots.len(), count, "many peers should reach every bundle");
        assert!(slots.iter().all(|slot| *slot < count));
    }

    #[test]
    fn test_slot_is_pure() {
        let peer = Peer::new("203.0.113.7");
        assert_eq!(peer.slot(75), peer.slot(75));
        assert_eq!(peer.slot(1), 0);
    }

    #[test]
    fn test_from_remote_addr_drops_port() {
        assert_eq!(Peer::from_remote_addr("203.0.113.7:4567"), Peer::new("203.0.113.7"));
        assert_eq!(Peer::from_remote_addr("[2001:db8::1]:443"), Peer::new("2001:db8::1"));
        assert_eq!(Peer::from_remote_addr("some.b32.i2p"), Peer::new("some.b32.i2p"));
    }

    #[test]
    fn test_install_swaps_generation() {
        let cache = Su3Cache::new();
        let peer = Peer::new("198.51.100.1");

        cache.install(generation("old", 10)).unwrap();
        let held = cache.current().unwrap();
        assert!(cache.lookup(&peer).unwrap().starts_with(b"old-"));

        cache.install(generation("new", 10)).unwrap();
        assert!(cache.lookup(&peer).unwrap().starts_with(b"new-"));
        assert!(held.bundles[0].starts_with(b"old-"), "readers keep the generation they hold");
    }

    #[test]
    fn test_empty_generation_refused() {
        let cache = Su3Cache::new();
        assert!(cache.install(generation("none", 0)).is_err());
        assert_eq!(cache.state(), CacheState::Empty);
    }

    #[test]
    fn test_rebuild_states() {
        let cache = Su3Cache::new();
        {
            let _guard = cache.begin_rebuild().unwrap();
            assert_eq!(cache.state(), CacheState::Empty, "a first rebuild does not make the cache ready");
            assert!(cache.begin_rebuild().is_none(), "only one rebuild runs at a time");
            cache.install(generation("g", 4)).unwrap();
            assert_eq!(cache.state(), CacheState::Rebuilding);
        }
        assert_eq!(cache.state(), CacheState::Ready);
        assert!(cache.begin_rebuild().is_some());
    }

    #[test]
    fn test_concurrent_readers_see_whole_generations() {
        let cache = Arc::new(Su3Cache::new());
        cache.install(generation("g0", 8)).unwrap();

        let readers: Vec<_> = (0..4)
            .map(|r| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..2000 {
                        let current = cache.current().unwrap();
                        let tag = String::from_utf8(current.bundles[0].to_vec()).unwrap();
                        let prefix = format!("{}-", tag.split('-').next().unwrap());
                        assert!(current.bundles.iter().all(|b| b.starts_with(prefix.as_bytes())), "generation mixed");
                        let _ = cache.lookup(&Peer::new(format!("{r}-{i}"))).unwrap();
                    }
                })
            })
            .collect();

        for g in 1..200 {
            cache.install(generation(&format!("g{g}"), 8)).unwrap();
        }
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
