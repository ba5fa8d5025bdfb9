// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Which agents are online, inferred from recent heartbeats.
//!
//! Entries are evicted lazily: a host older than the TTL is dropped the next
//! time someone takes a [`PresenceRegistry::snapshot`], never by a timer.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::time::Instant;

/// Default window after which a silent host counts as offline.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
struct LastSeen {
    at: Instant,
    wall: DateTime<Utc>,
}

impl LastSeen {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.at) <= ttl
    }
}

#[derive(Default)]
pub struct PresenceRegistry {
    hosts: Mutex<HashMap<String, LastSeen>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a heartbeat from `hostname` at the current time.
    pub fn touch(&self, hostname: &str) {
        let seen = LastSeen { at: Instant::now(), wall: Utc::now() };
        let mut hosts = self.hosts.lock();
        match hosts.get_mut(hostname) {
            Some(entry) => *entry = seen,
            None => {
                tracing::debug!(hostname, "agent came online");
                hosts.insert(hostname.to_owned(), seen);
            }
        }
    }

    /// Hosts seen within `ttl`, mapped to their last heartbeat.
    ///
    /// Older entries are removed permanently.
    pub fn snapshot(&self, ttl: Duration) -> BTreeMap<String, DateTime<Utc>> {
        let now = Instant::now();
        let mut hosts = self.hosts.lock();
        hosts.retain(|hostname, seen| {
            let fresh = seen.is_fresh(now, ttl);
            if !fresh {
                tracing::debug!(hostname = %hostname, "evicting stale agent");
            }
            fresh
        });
        hosts.iter().map(|(h, seen)| (h.clone(), seen.wall)).collect()
    }

    /// Number of hosts seen within `ttl`. Does not evict.
    pub fn online_count(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        self.hosts.lock().values().filter(|seen| seen.is_fresh(now, ttl)).count()
    }

    /// Number of entries currently held, including stale ones not yet evicted.
    pub fn len(&self) -> usize {
        self.hosts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "presence_tests.rs"]
mod tests;
