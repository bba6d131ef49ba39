//! TTL-bounded classification cache.
//!
//! Memoizes classifications keyed by the fingerprint of normalized request
//! text, so repeated requests skip both the rule table and the remote
//! fallback. Process-wide shared state with interior locking; injected into
//! the classifier, never reached as an ambient global.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use switchboard_domain::{Intent, fingerprint};

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    intent: Intent,
    inserted_at: Instant,
}

/// Shared intent memo with per-entry TTL and a capacity bound.
///
/// Eviction is lazy: expired entries are dropped when touched, and the
/// oldest entry makes room when an insert would exceed capacity.
#[derive(Debug)]
pub struct IntentCache {
    entries: Mutex<HashMap<u64, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl IntentCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Look up a non-expired classification for this text.
    pub fn get(&self, text: &str) -> Option<Intent> {
        let key = fingerprint(text);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(&key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.intent),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Write through a classification for this text.
    pub fn insert(&self, text: &str, intent: Intent) {
        let key = fingerprint(text);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        entries.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(k, _)| *k)
            {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                intent,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries (shutdown/reset lifecycle).
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}
