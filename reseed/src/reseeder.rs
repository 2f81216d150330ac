//! # Reseeder Module
//!
//! Ties the pieces together: a `Reseeder` owns the netDb source, the signing
//! identity and the bundle cache, rebuilds every bundle of the cache on a fixed
//! interval and answers bundle lookups for transports.
//!
//! ## Rebuild
//! 1. read the fresh router infos from the netDb
//! 2. pick the bundle count (configured, or derived from the netDb size)
//! 3. build and sign every bundle on the rayon pool, each an independent sample
//! 4. install the new generation only if every bundle was built and no shutdown was requested
//!
//! A failed rebuild leaves the previous generation in service and is retried on the
//! next tick. Without a signing identity no generation is ever installed and lookups
//! keep failing with `CacheNotReady`; the process keeps running.
//!
//! Copyrights © 2025 Reseed Contributors. All rights reserved.

use anyhow::Result;
use bytes::Bytes;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use crate::config::ReseedConfig;
use crate::constants::{AUTO_SU3_MINIMUM, AUTO_SU3_TIERS};
use crate::core::certificate::SigningIdentity;
use crate::core::netdb::{LocalNetDb, RouterInfo};
use crate::core::seeds::build_signed_su3;
use crate::core::su3_cache::{CacheState, Generation, Peer, Su3Cache};
use crate::reseed_errors::ReseedError;

const MIN_REBUILD_INTERVAL: Duration = Duration::from_secs(1);

/// Bundle count for a netDb of `router_infos` entries when none is configured.
pub fn auto_su3_count(router_infos: usize) -> usize {
    AUTO_SU3_TIERS
        .iter()
        .find(|(above, _)| router_infos > *above)
        .map_or(AUTO_SU3_MINIMUM, |(_, count)| *count)
}

pub struct Reseeder {
    config: ReseedConfig,
    netdb: LocalNetDb,
    identity: Option<Arc<SigningIdentity>>,
    cache: Arc<Su3Cache>,
}

impl Reseeder {
    pub fn new(config: ReseedConfig, identity: Option<SigningIdentity>) -> Self {
        Self::with_cache(config, identity, Arc::new(Su3Cache::new()))
    }

    /// Build on a cache owned by the caller, e.g. shared with a transport.
    pub fn with_cache(config: ReseedConfig, identity: Option<SigningIdentity>, cache: Arc<Su3Cache>) -> Self {
        let netdb = LocalNetDb::new(&config.netdb, config.max_router_info_age);
        Self {
            config,
            netdb,
            identity: identity.map(Arc::new),
            cache,
        }
    }

    /// Load the signing identity named by the config. A missing or unreadable key is
    /// logged and leaves the reseeder without identity instead of failing.
    pub fn from_config(config: ReseedConfig) -> Self {
        let identity = match &config.signing_key {
            Some(path) => match SigningIdentity::load(path, &config.signer) {
                Ok(identity) => Some(identity),
                Err(err) => {
                    error!(key = %path.display(), error = %err, "unable to load signing key, bundles will not be served");
                    None
                }
            },
            None => {
                error!("no signing key configured, bundles will not be served");
                None
            }
        };
        Self::new(config, identity)
    }

    pub fn config(&self) -> &ReseedConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<Su3Cache> {
        &self.cache
    }

    pub fn state(&self) -> CacheState {
        self.cache.state()
    }

    /// Encoded su3 bundle for `peer`. Never builds or signs anything.
    pub fn lookup(&self, peer: &Peer) -> Result<Bytes> {
        self.cache.lookup(peer)
    }

    pub fn bundle_count(&self, router_infos: usize) -> usize {
        match self.config.num_su3 {
            0 => auto_su3_count(router_infos),
            configured => configured,
        }
    }

    /// Build and install a complete new generation.
    pub fn rebuild(&self) -> Result<Arc<Generation>> {
        self.rebuild_with(|| false)
    }

    /// Like `rebuild`, abandoned as soon as `shutdown` fires or its sender is dropped.
    pub fn rebuild_until(&self, shutdown: &watch::Receiver<()>) -> Result<Arc<Generation>> {
        self.rebuild_with(|| shutdown.has_changed().unwrap_or(true))
    }

    fn rebuild_with<F>(&self, cancelled: F) -> Result<Arc<Generation>>
    where
        F: Fn() -> bool + Sync,
    {
        let identity = self.identity.clone().ok_or(ReseedError::MissingSigningKey)?;
        let Some(_guard) = self.cache.begin_rebuild() else {
            return Err(ReseedError::RebuildFailed("another rebuild is running".to_string()).into());
        };

        let started = Instant::now();
        let records: Vec<RouterInfo> = self
            .netdb
            .router_infos()
            .map_err(|e| ReseedError::RebuildFailed(format!("reading netDb {}: {e}", self.netdb.path.display())))?
            .collect();
        let count = self.bundle_count(records.len());
        info!(router_infos = records.len(), bundles = count, "rebuilding su3 cache");

        let built: Result<Vec<Bytes>> = (0..count)
            .into_par_iter()
            .map(|index| {
                if cancelled() {
                    return Err(ReseedError::RebuildCancelled.into());
                }
                let su3 = build_signed_su3(&records, self.config.num_ri, &identity, self.config.signature_type)?;
                debug!(index, "built su3 bundle");
                Ok(Bytes::from(su3.to_bytes()?))
            })
            .collect();

        let bundles = match built {
            Ok(bundles) => bundles,
            Err(err) if matches!(err.downcast_ref::<ReseedError>(), Some(ReseedError::RebuildCancelled)) => return Err(err),
            Err(err) => return Err(ReseedError::RebuildFailed(err.to_string()).into()),
        };
        if cancelled() {
            return Err(ReseedError::RebuildCancelled.into());
        }

        let generation = Arc::new(Generation::new(bundles));
        self.cache.install(Arc::clone(&generation))?;
        info!(bundles = generation.len(), elapsed = ?started.elapsed(), "installed new su3 generation");
        Ok(generation)
    }

    /// Rebuild now and then every `rebuild_interval` until `shutdown` fires.
    /// Ticks that fall due while a rebuild runs are skipped.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<()>) -> Result<()> {
        let mut ticker = interval(self.config.rebuild_interval.max(MIN_REBUILD_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("su3 rebuild loop shutting down");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    let reseeder = Arc::clone(&self);
                    let cancel = shutdown.clone();
                    match tokio::task::spawn_blocking(move || reseeder.rebuild_until(&cancel)).await {
                        Ok(Ok(_)) => {}
                        Ok(Err(err)) => match err.downcast_ref::<ReseedError>() {
                            Some(ReseedError::RebuildCancelled) => info!("su3 rebuild cancelled"),
                            _ => warn!(error = %err, state = ?self.state(), "su3 rebuild failed, keeping the previous generation"),
                        },
                        Err(err) => error!(error = %err, "su3 rebuild task panicked"),
                    }
                }
            }
        }
    }
}
