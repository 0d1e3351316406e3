//! At-most-once admission of authenticators.

use crate::asn1::principal_name::PrincipalName;
use crate::asn1::microseconds::Microseconds;
use crate::constants::DEFAULT_REPLAY_PURGE_INTERVAL;
use crate::error::ValidationError;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;
use tracing::{debug, trace, warn};

/// Identity of one authenticator: who sent it and the exact time it claims.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReplayKey {
    realm: String,
    client: Vec<String>,
    ctime: SystemTime,
    cusec: Microseconds,
}

impl ReplayKey {
    /// `ctime` is the whole-second client time, `cusec` travels beside it.
    pub fn new(realm: &str, client: &PrincipalName, ctime: SystemTime, cusec: Microseconds) -> Self {
        Self {
            realm: realm.to_string(),
            client: client.components().map(str::to_string).collect(),
            ctime,
            cusec,
        }
    }
}

pub trait ReplayCache: Send + Sync {
    /// Record `key` as seen until `expires`. Fails with
    /// [`ValidationError::ReplayDetected`] if an unexpired entry for `key` already
    /// exists. The check and the insert are one atomic step.
    fn check_and_insert(
        &self,
        key: ReplayKey,
        expires: SystemTime,
        now: SystemTime,
    ) -> Result<(), ValidationError>;
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<ReplayKey, SystemTime>,
    inserts_since_purge: usize,
}

/// A mutex guarded map. Expired entries are ignored on lookup and swept out every
/// `purge_interval` inserts.
#[derive(Debug)]
pub struct MemoryReplayCache {
    state: Mutex<CacheState>,
    purge_interval: usize,
}

impl Default for MemoryReplayCache {
    fn default() -> Self {
        Self::new(DEFAULT_REPLAY_PURGE_INTERVAL)
    }
}

impl MemoryReplayCache {
    pub fn new(purge_interval: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            purge_interval: purge_interval.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // Every critical section leaves the map consistent, so a panic elsewhere
        // does not invalidate it.
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Replay cache lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Number of retained entries, live or not yet swept.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry that has expired by `now`.
    pub fn purge(&self, now: SystemTime) {
        let mut state = self.lock();
        Self::purge_locked(&mut state, now);
    }

    fn purge_locked(state: &mut CacheState, now: SystemTime) {
        let before = state.entries.len();
        state.entries.retain(|_, expires| *expires >= now);
        state.inserts_since_purge = 0;
        trace!(removed = before - state.entries.len(), "replay cache purge");
    }
}

impl ReplayCache for MemoryReplayCache {
    fn check_and_insert(
        &self,
        key: ReplayKey,
        expires: SystemTime,
        now: SystemTime,
    ) -> Result<(), ValidationError> {
        let mut state = self.lock();

        if let Some(existing) = state.entries.get(&key) {
            if *existing >= now {
                debug!(realm = %key.realm, "Authenticator replay detected");
                return Err(ValidationError::ReplayDetected);
            }
        }

        state.entries.insert(key, expires);
        state.inserts_since_purge += 1;
        if state.inserts_since_purge >= self.purge_interval {
            Self::purge_locked(&mut state, now);
        }
        Ok(())
    }
}
