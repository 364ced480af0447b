//! Owner-partitioned temporal index.
//!
//! For one entity type, `OwnerIndex` maps every owner key (including the
//! absent-owner sentinel) to a `Partition`: an ordered sequence of
//! `(TimeKey, RecordId)` pairs sorted by time ascending. Partitions are
//! created lazily on first insert and are never destroyed; draining one
//! simply leaves it conceptually empty.

use crate::error::{Result, TidemarkError};
use crate::types::{IndexEntry, OwnerRef, RecordId, TimeKey};
use std::collections::BTreeMap;
use std::sync::Arc;

/// An immutable snapshot of one owner's ordered entry sequence.
///
/// The entries live behind an `Arc`, so cloning a partition is cheap and the
/// clone stays valid while the index continues to accept inserts: writers
/// publish a new sequence instead of mutating the one readers hold.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    entries: Arc<Vec<IndexEntry>>,
}

impl Partition {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Vec::with_capacity(capacity)),
        }
    }

    /// Number of entries in this partition.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this partition holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The ordered entries, time ascending.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Index of the first entry with time >= `time`.
    pub fn lower_bound(&self, time: TimeKey) -> usize {
        self.entries.partition_point(|e| e.time < time)
    }

    /// Index of the first entry with time > `time`.
    pub fn upper_bound(&self, time: TimeKey) -> usize {
        self.entries.partition_point(|e| e.time <= time)
    }

    /// The entry whose time equals `time`, if any.
    ///
    /// At most one entry can match because time keys are unique within a
    /// partition.
    pub fn exact(&self, time: TimeKey) -> Option<IndexEntry> {
        let idx = self.lower_bound(time);
        match self.entries.get(idx) {
            Some(entry) if entry.time == time => Some(*entry),
            _ => None,
        }
    }

    /// The entry with the greatest time <= `time`, if any.
    ///
    /// The boundary is inclusive: an entry at exactly `time` is the answer.
    pub fn as_of(&self, time: TimeKey) -> Option<IndexEntry> {
        let idx = self.upper_bound(time);
        if idx == 0 {
            None
        } else {
            Some(self.entries[idx - 1])
        }
    }

    /// All entries with time >= `time`, ascending.
    pub fn tail(&self, time: TimeKey) -> &[IndexEntry] {
        &self.entries[self.lower_bound(time)..]
    }

    /// All entries with time <= `time`, ascending.
    pub fn head(&self, time: TimeKey) -> &[IndexEntry] {
        &self.entries[..self.upper_bound(time)]
    }

    /// All entries with `from <= time <= until`, ascending.
    ///
    /// # Errors
    ///
    /// Returns `TidemarkError::InvalidRange` when `from > until`; no partial
    /// result is produced.
    pub fn window(&self, from: TimeKey, until: TimeKey) -> Result<&[IndexEntry]> {
        if from > until {
            return Err(TidemarkError::InvalidRange { from, until });
        }
        Ok(&self.entries[self.lower_bound(from)..self.upper_bound(until)])
    }
}

/// Per-entity-type index from owner keys to ordered partitions.
///
/// `K` is the owner key type; the key space is made total by `OwnerRef`,
/// whose `Absent` sentinel holds records without an owner. The index never
/// performs I/O and never resolves payloads; it only orders record ids.
///
/// # Examples
///
/// ```rust
/// use tidemark::{OwnerIndex, OwnerRef, RecordId, TimeKey};
///
/// let mut index: OwnerIndex<u32> = OwnerIndex::new();
/// index
///     .insert(OwnerRef::Owned(1), TimeKey::from_millis(10), RecordId::new())
///     .unwrap();
/// assert_eq!(index.partition(&OwnerRef::Owned(1)).len(), 1);
/// assert!(index.partition(&OwnerRef::Owned(2)).is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct OwnerIndex<K> {
    partitions: BTreeMap<OwnerRef<K>, Partition>,
    capacity_hint: usize,
    record_count: usize,
}

impl<K: Ord> OwnerIndex<K> {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::with_capacity_hint(0)
    }

    /// Create an empty index reserving `hint` entry slots per new partition.
    pub fn with_capacity_hint(hint: usize) -> Self {
        Self {
            partitions: BTreeMap::new(),
            capacity_hint: hint,
            record_count: 0,
        }
    }

    /// Insert a record reference, keeping the partition sorted.
    ///
    /// Insert is all-or-nothing: on any error the partition is unchanged.
    /// Readers holding a partition snapshot never observe a half-applied
    /// insert, because the updated sequence is built aside and published as
    /// a whole.
    ///
    /// # Errors
    ///
    /// Returns `TidemarkError::DuplicateTimeKey` when `(owner, time)` is
    /// already present.
    pub fn insert(&mut self, owner: OwnerRef<K>, time: TimeKey, id: RecordId) -> Result<()> {
        let capacity_hint = self.capacity_hint;
        let partition = self.partitions.entry(owner).or_insert_with(|| {
            log::trace!("creating partition (hint {capacity_hint})");
            Partition::with_capacity(capacity_hint)
        });

        let entries = partition.entries();
        let idx = partition.lower_bound(time);
        if entries.get(idx).is_some_and(|e| e.time == time) {
            return Err(TidemarkError::DuplicateTimeKey { time });
        }

        let mut next = Vec::with_capacity((entries.len() + 1).max(capacity_hint));
        next.extend_from_slice(&entries[..idx]);
        next.push(IndexEntry { time, id });
        next.extend_from_slice(&entries[idx..]);
        partition.entries = Arc::new(next);

        self.record_count += 1;
        Ok(())
    }

    /// Snapshot the partition for an owner.
    ///
    /// Unknown owners yield the empty partition; absence of history is a
    /// normal state, not a fault.
    pub fn partition(&self, owner: &OwnerRef<K>) -> Partition {
        self.partitions.get(owner).cloned().unwrap_or_default()
    }

    /// Iterate all partitions in owner order, the absent-owner sentinel
    /// first.
    pub fn partitions(&self) -> impl Iterator<Item = (&OwnerRef<K>, &Partition)> {
        self.partitions.iter()
    }

    /// Number of partitions ever created.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Number of records across all partitions.
    pub fn record_count(&self) -> usize {
        self.record_count
    }
}
