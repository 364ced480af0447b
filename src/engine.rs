//! Generic temporal query engine.
//!
//! `TemporalQueryEngine` implements the five temporal query shapes (exact,
//! as-of, from, until, range) plus identity lookup and owner-scoped listing
//! over any `OwnerIndex`, mapping record ids to payloads through a
//! caller-supplied resolver. The engine holds no state of its own; it is a
//! view over the index and resolver it is given.

use crate::error::{Result, TidemarkError};
use crate::index::{OwnerIndex, Partition};
use crate::types::{IndexEntry, OwnerRef, RecordId, TimeKey};
use smallvec::SmallVec;

/// Maps a record id to its concrete payload.
///
/// The engine never stores payloads; the hundreds of entity-specific record
/// shapes live entirely behind this trait. A resolver miss for an indexed id
/// indicates an ingestion bug, so the engine skips the entry and logs a
/// warning rather than failing the query.
pub trait PayloadResolver {
    type Payload;

    /// Resolve one record id, or `None` if the id is unknown.
    fn resolve(&self, id: RecordId) -> Option<Self::Payload>;
}

impl<P: Clone> PayloadResolver for rustc_hash::FxHashMap<RecordId, P> {
    type Payload = P;

    fn resolve(&self, id: RecordId) -> Option<P> {
        self.get(&id).cloned()
    }
}

/// The temporal query shapes over one entity type.
///
/// Scoped queries take an owner and are a binary search over that owner's
/// partition: O(log n + k) in partition size n and result size k. Unscoped
/// `*_all` variants are the ordered union across all partitions, merged by
/// `(TimeKey, RecordId)` so the ordering is deterministic even when records
/// of different owners share a time key.
///
/// # Examples
///
/// ```rust
/// use rustc_hash::FxHashMap;
/// use tidemark::{OwnerIndex, OwnerRef, RecordId, TemporalQueryEngine, TimeKey};
///
/// let mut index: OwnerIndex<u32> = OwnerIndex::new();
/// let mut payloads: FxHashMap<RecordId, &str> = FxHashMap::default();
///
/// let id = RecordId::new();
/// index.insert(OwnerRef::Owned(1), TimeKey::from_millis(10), id).unwrap();
/// payloads.insert(id, "first sample");
///
/// let engine = TemporalQueryEngine::new(&index, &payloads);
/// assert_eq!(
///     engine.as_of(&OwnerRef::Owned(1), TimeKey::from_millis(15)),
///     Some("first sample")
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TemporalQueryEngine<'a, K, R> {
    index: &'a OwnerIndex<K>,
    resolver: &'a R,
}

impl<'a, K: Ord, R: PayloadResolver> TemporalQueryEngine<'a, K, R> {
    /// Build an engine over an index and a payload resolver.
    pub fn new(index: &'a OwnerIndex<K>, resolver: &'a R) -> Self {
        Self { index, resolver }
    }

    /// Direct lookup by record id; neither owner- nor time-scoped.
    pub fn by_id(&self, id: RecordId) -> Option<R::Payload> {
        self.resolver.resolve(id)
    }

    /// Every record of the entity type.
    ///
    /// Returned in owner order (absent-owner partition first), time
    /// ascending within each owner. That ordering is an implementation
    /// detail, not a contract.
    pub fn all(&self) -> Vec<R::Payload> {
        let mut results = Vec::new();
        for (_, partition) in self.index.partitions() {
            self.resolve_into(partition.entries(), &mut results);
        }
        results
    }

    /// Every record in one owner's partition, time ascending.
    pub fn by_owner(&self, owner: &OwnerRef<K>) -> Vec<R::Payload> {
        self.resolve_entries(self.index.partition(owner).entries())
    }

    /// The record whose time key equals `time` within the owner's
    /// partition. At most one record can match, by the per-partition
    /// uniqueness invariant.
    pub fn exact(&self, owner: &OwnerRef<K>, time: TimeKey) -> Option<R::Payload> {
        self.resolve_one(self.index.partition(owner).exact(time))
    }

    /// The record in effect at `time`: the greatest time key <= `time`.
    ///
    /// The boundary is inclusive, so `exact(owner, t)` is contained in
    /// `as_of(owner, t)` whenever it is present.
    pub fn as_of(&self, owner: &OwnerRef<K>, time: TimeKey) -> Option<R::Payload> {
        self.resolve_one(self.index.partition(owner).as_of(time))
    }

    /// All records with time key >= `time`, ascending.
    pub fn from(&self, owner: &OwnerRef<K>, time: TimeKey) -> Vec<R::Payload> {
        self.resolve_entries(self.index.partition(owner).tail(time))
    }

    /// All records with time key <= `time`, ascending.
    pub fn until(&self, owner: &OwnerRef<K>, time: TimeKey) -> Vec<R::Payload> {
        self.resolve_entries(self.index.partition(owner).head(time))
    }

    /// All records with `from <= time key <= until`, ascending.
    ///
    /// # Errors
    ///
    /// Returns `TidemarkError::InvalidRange` when `from > until`.
    pub fn range(
        &self,
        owner: &OwnerRef<K>,
        from: TimeKey,
        until: TimeKey,
    ) -> Result<Vec<R::Payload>> {
        let partition = self.index.partition(owner);
        Ok(self.resolve_entries(partition.window(from, until)?))
    }

    /// Unscoped exact match: across all owners, every record whose time key
    /// equals `time` (at most one per partition), ordered by record id.
    pub fn exact_all(&self, time: TimeKey) -> Vec<R::Payload> {
        self.merge_per_partition(|partition| partition.exact(time))
    }

    /// Unscoped as-of: each owner's record in effect at `time`, merged by
    /// `(TimeKey, RecordId)`.
    pub fn as_of_all(&self, time: TimeKey) -> Vec<R::Payload> {
        self.merge_per_partition(|partition| partition.as_of(time))
    }

    /// Unscoped from: across all owners, every record with time key >=
    /// `time`, merged by `(TimeKey, RecordId)`.
    pub fn from_all(&self, time: TimeKey) -> Vec<R::Payload> {
        self.merge_slices(|partition| partition.tail(time))
    }

    /// Unscoped until: across all owners, every record with time key <=
    /// `time`, merged by `(TimeKey, RecordId)`.
    pub fn until_all(&self, time: TimeKey) -> Vec<R::Payload> {
        self.merge_slices(|partition| partition.head(time))
    }

    /// Unscoped range: across all owners, every record inside the closed
    /// interval, merged by `(TimeKey, RecordId)`.
    ///
    /// # Errors
    ///
    /// Returns `TidemarkError::InvalidRange` when `from > until`.
    pub fn range_all(&self, from: TimeKey, until: TimeKey) -> Result<Vec<R::Payload>> {
        if from > until {
            return Err(TidemarkError::InvalidRange { from, until });
        }
        Ok(self.merge_slices(|partition| {
            let entries = partition.entries();
            &entries[partition.lower_bound(from)..partition.upper_bound(until)]
        }))
    }

    fn resolve_one(&self, entry: Option<IndexEntry>) -> Option<R::Payload> {
        let entry = entry?;
        let payload = self.resolver.resolve(entry.id);
        if payload.is_none() {
            log::warn!("indexed record {} has no payload", entry.id);
        }
        payload
    }

    fn resolve_entries(&self, entries: &[IndexEntry]) -> Vec<R::Payload> {
        let mut results = Vec::with_capacity(entries.len());
        self.resolve_into(entries, &mut results);
        results
    }

    fn resolve_into(&self, entries: &[IndexEntry], results: &mut Vec<R::Payload>) {
        for entry in entries {
            match self.resolver.resolve(entry.id) {
                Some(payload) => results.push(payload),
                None => log::warn!("indexed record {} has no payload", entry.id),
            }
        }
    }

    /// Select at most one entry per partition, then order the union.
    fn merge_per_partition<F>(&self, select: F) -> Vec<R::Payload>
    where
        F: Fn(&Partition) -> Option<IndexEntry>,
    {
        let mut selected: Vec<IndexEntry> = self
            .index
            .partitions()
            .filter_map(|(_, partition)| select(partition))
            .collect();
        selected.sort_unstable();
        self.resolve_entries(&selected)
    }

    /// Select a sorted slice per partition, then merge the union by
    /// `(TimeKey, RecordId)`.
    fn merge_slices<F>(&self, select: F) -> Vec<R::Payload>
    where
        F: for<'p> Fn(&'p Partition) -> &'p [IndexEntry],
    {
        let mut slices: SmallVec<[&[IndexEntry]; 8]> = SmallVec::new();
        for (_, partition) in self.index.partitions() {
            let slice = select(partition);
            if !slice.is_empty() {
                slices.push(slice);
            }
        }

        let total = slices.iter().map(|s| s.len()).sum();
        let mut merged: Vec<IndexEntry> = Vec::with_capacity(total);
        for slice in &slices {
            merged.extend_from_slice(slice);
        }
        merged.sort_unstable();
        self.resolve_entries(&merged)
    }
}
