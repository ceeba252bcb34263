// src/storage/memory.rs
use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use crate::models::server::{ServerRecord, ServerStatus};
use crate::utils::now_millis;

/// Result of one eviction pass: what was dropped and what is left to query.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepOutcome {
    pub evicted: Vec<SocketAddr>,
    pub live: Vec<SocketAddr>,
}

/// In-memory registry of announced game servers, keyed by their address.
///
/// Every operation runs under a single reader/writer lock, so each call is
/// atomic with respect to every other one. No lock is ever held across I/O.
#[derive(Debug, Default)]
pub struct ServerRegistry {
    servers: RwLock<HashMap<SocketAddr, ServerRecord>>,
}

impl ServerRegistry {
    pub fn new() -> Self {
        Self {
            servers: RwLock::new(HashMap::new()),
        }
    }

    /// Admits `address` or refreshes its `last_seen`. Returns `true` when the
    /// server was not known before.
    pub fn touch(&self, address: SocketAddr) -> bool {
        self.touch_at(address, now_millis())
    }

    pub fn touch_at(&self, address: SocketAddr, now: u64) -> bool {
        let mut servers = self.servers.write();
        match servers.get_mut(&address) {
            Some(record) => {
                // last_seen never moves backwards, even if the wall clock does
                record.last_seen = record.last_seen.max(now);
                false
            }
            None => {
                servers.insert(address, ServerRecord::new(address, now));
                true
            }
        }
    }

    pub fn remove(&self, address: &SocketAddr) -> bool {
        self.servers.write().remove(address).is_some()
    }

    /// Overwrites the descriptive fields of a still-registered server.
    /// Results for servers removed in the meantime are dropped.
    pub fn apply_status(&self, address: &SocketAddr, status: ServerStatus) -> bool {
        let mut servers = self.servers.write();
        match servers.get_mut(address) {
            Some(record) => {
                record.apply(status);
                true
            }
            None => false,
        }
    }

    /// Owned copy of every record, most recently seen first.
    pub fn snapshot(&self) -> Vec<ServerRecord> {
        let mut list: Vec<ServerRecord> = self.servers.read().values().cloned().collect();
        list.sort_by(|a, b| {
            b.last_seen
                .cmp(&a.last_seen)
                .then_with(|| a.address.cmp(&b.address))
        });
        list
    }

    pub fn get(&self, address: &SocketAddr) -> Option<ServerRecord> {
        self.servers.read().get(address).cloned()
    }

    pub fn contains(&self, address: &SocketAddr) -> bool {
        self.servers.read().contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.servers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.read().is_empty()
    }

    pub fn evict_older_than(&self, threshold: Duration) -> SweepOutcome {
        self.evict_older_than_at(threshold, now_millis())
    }

    /// Removes every server not seen within `threshold` of `now` and lists the
    /// survivors, both under one exclusive lock hold.
    pub fn evict_older_than_at(&self, threshold: Duration, now: u64) -> SweepOutcome {
        let threshold_ms = u64::try_from(threshold.as_millis()).unwrap_or(u64::MAX);
        let mut outcome = SweepOutcome::default();
        let mut servers = self.servers.write();

        servers.retain(|address, record| {
            if now.saturating_sub(record.last_seen) > threshold_ms {
                outcome.evicted.push(*address);
                false
            } else {
                outcome.live.push(*address);
                true
            }
        });

        outcome
    }
}
