//! Bounded record of recently seen frames, per sender.
//!
//! The listener uses this to track how often each distinct frame
//! repeats. Deliberately observational: the caller logs every frame
//! regardless of the verdict here; the cache only keeps last-seen
//! times. Eviction is strict FIFO on insertion order, not LRU — a
//! frequently refreshed entry still ages out by its insertion position.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default cache capacity.
pub const DEFAULT_DEDUP_CAPACITY: usize = 100;

#[derive(Debug)]
struct DedupEntry {
    sender: char,
    bytes: Vec<u8>,
    last_seen: Instant,
}

/// Capacity-bounded, insertion-ordered cache keyed by (sender, bytes).
#[derive(Debug)]
pub struct DedupCache {
    entries: VecDeque<DedupEntry>,
    capacity: usize,
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_CAPACITY)
    }
}

impl DedupCache {
    /// Create a cache holding at most `capacity` entries.
    ///
    /// A zero capacity is clamped to 1; the eviction step assumes there
    /// is always room for the entry being recorded.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a sighting of `(sender, bytes)`.
    ///
    /// Returns `Some(age)` — time since the previous sighting — when the
    /// pair was already cached (its timestamp is refreshed in place, the
    /// entry does not move). Returns `None` for a first sighting, which
    /// is appended, evicting the oldest entry when at capacity.
    pub fn seen_or_record(&mut self, sender: char, bytes: &[u8], now: Instant) -> Option<Duration> {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.sender == sender && e.bytes == bytes)
        {
            let age = now.duration_since(entry.last_seen);
            entry.last_seen = now;
            return Some(age);
        }

        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(DedupEntry {
            sender,
            bytes: bytes.to_vec(),
            last_seen: now,
        });
        None
    }

    /// Whether `(sender, bytes)` is currently cached.
    pub fn contains(&self, sender: char, bytes: &[u8]) -> bool {
        self.entries
            .iter()
            .any(|e| e.sender == sender && e.bytes == bytes)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
