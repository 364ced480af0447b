//! Composed in-memory store hosting one index per entity type.
//!
//! `Store` wires the generic pieces together the way a deployed system
//! would: a registry of `OwnerIndex` instances keyed by entity name, a
//! payload map shared across all entity types (one global record id space),
//! and the full query surface of the engine and the absent-owner adapter,
//! exposed per entity name. The ingestion path calls `insert`; everything
//! else is read-only.

use crate::builder::StoreBuilder;
use crate::engine::TemporalQueryEngine;
use crate::error::{Result, TidemarkError};
use crate::index::OwnerIndex;
use crate::types::{Config, OwnerRef, RecordId, StoreStats, TimeKey};
use bytes::Bytes;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Shared handle to an in-memory temporal store.
///
/// Cloning a `Store` clones the handle, not the data: all clones observe
/// the same records, so the store can be handed to ingestion and query
/// sides of a host system freely.
///
/// Reads run in parallel under a shared lock; inserts take the exclusive
/// lock, which serializes them and keeps the per-partition sort and
/// uniqueness invariants intact. No operation performs I/O.
///
/// # Examples
///
/// ```rust
/// use tidemark::{Store, TimeKey};
/// use uuid::Uuid;
///
/// let store = Store::new();
/// let device = Uuid::new_v4();
///
/// store.insert("radar_status", Some(device), TimeKey::from_millis(10), &b"standby"[..])?;
/// store.insert("radar_status", Some(device), TimeKey::from_millis(20), &b"tracking"[..])?;
///
/// let status = store.as_of("radar_status", Some(device), TimeKey::from_millis(15));
/// assert_eq!(status.as_deref(), Some(&b"standby"[..]));
/// # Ok::<(), tidemark::TidemarkError>(())
/// ```
#[derive(Clone)]
pub struct Store {
    pub(crate) inner: Arc<RwLock<StoreInner>>,
}

pub(crate) struct StoreInner {
    /// One temporal index per entity type, created lazily.
    entities: FxHashMap<String, OwnerIndex<Uuid>>,
    /// Payloads for every record across all entity types.
    payloads: FxHashMap<RecordId, Bytes>,
    /// Store statistics.
    stats: StoreStats,
    /// Configuration.
    config: Config,
}

impl Store {
    /// Create a store with the default configuration.
    pub fn new() -> Self {
        Self::from_inner(StoreInner::new_with_config(&Config::default()))
    }

    /// Create a store with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns `TidemarkError::Other` if the configuration fails
    /// validation.
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().map_err(TidemarkError::Other)?;
        Ok(Self::from_inner(StoreInner::new_with_config(&config)))
    }

    /// Create a store builder for advanced configuration.
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    pub(crate) fn from_inner(inner: StoreInner) -> Self {
        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// Get store statistics.
    pub fn stats(&self) -> StoreStats {
        self.inner.read().stats.clone()
    }

    /// Get the configuration the store was built with.
    pub fn config(&self) -> Config {
        self.inner.read().config.clone()
    }

    /// Entity type names with at least one record ever inserted, sorted.
    pub fn entity_names(&self) -> Vec<String> {
        let inner = self.inner.read();
        let mut names: Vec<String> = inner.entities.keys().cloned().collect();
        names.sort();
        names
    }

    /// Ingest one record: store its payload and index it under
    /// `(entity, owner, time)`.
    ///
    /// Assigns and returns a fresh `RecordId`. Insert is all-or-nothing:
    /// when the index rejects the record the payload write is unwound and
    /// the store is left exactly as before.
    ///
    /// # Errors
    ///
    /// Returns `TidemarkError::DuplicateTimeKey` when the owner's partition
    /// already holds a record at `time`. How to handle that (reject the
    /// incoming record, skip it, treat it as a replay) is the caller's
    /// policy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tidemark::{Store, TimeKey};
    ///
    /// let store = Store::new();
    /// let id = store.insert("system_log", None, TimeKey::from_millis(1), &b"started"[..])?;
    /// assert!(store.by_id(id).is_some());
    /// # Ok::<(), tidemark::TidemarkError>(())
    /// ```
    pub fn insert(
        &self,
        entity: &str,
        owner: Option<Uuid>,
        time: TimeKey,
        payload: impl Into<Bytes>,
    ) -> Result<RecordId> {
        let mut inner = self.inner.write();
        inner.stats.insert_count += 1;

        let id = RecordId::new();
        inner.payloads.insert(id, payload.into());

        let hint = inner.config.partition_capacity_hint;
        let index = inner
            .entities
            .entry(entity.to_string())
            .or_insert_with(|| OwnerIndex::with_capacity_hint(hint));

        if let Err(err) = index.insert(OwnerRef::from(owner), time, id) {
            inner.payloads.remove(&id);
            inner.stats.duplicate_insert_count += 1;
            return Err(err);
        }

        inner.stats.record_count = inner.payloads.len();
        inner.stats.entity_count = inner.entities.len();
        inner.stats.partition_count = inner
            .entities
            .values()
            .map(|index| index.partition_count())
            .sum();
        Ok(id)
    }

    /// Direct lookup by record id, across all entity types.
    ///
    /// Never fails for a missing id; all entity types share one identifier
    /// space, so no entity name is needed.
    pub fn by_id(&self, id: RecordId) -> Option<Bytes> {
        self.inner.read().payloads.get(&id).cloned()
    }

    /// Every record of an entity type, owner order then time ascending.
    pub fn all(&self, entity: &str) -> Vec<Bytes> {
        self.with_engine(entity, |engine| engine.all(), Vec::new())
    }

    /// Every record in one owner's partition, time ascending. `None` scopes
    /// the query to records without an owner.
    pub fn by_owner(&self, entity: &str, owner: Option<Uuid>) -> Vec<Bytes> {
        let owner = OwnerRef::from(owner);
        self.with_engine(entity, |engine| engine.by_owner(&owner), Vec::new())
    }

    /// Every ownerless record of an entity type, time ascending.
    pub fn by_absent_owner(&self, entity: &str) -> Vec<Bytes> {
        self.by_owner(entity, None)
    }

    /// The record whose time key equals `time` in the owner's partition.
    pub fn exact(&self, entity: &str, owner: Option<Uuid>, time: TimeKey) -> Option<Bytes> {
        let owner = OwnerRef::from(owner);
        self.with_engine(entity, |engine| engine.exact(&owner, time), None)
    }

    /// The record in effect at `time`: greatest time key <= `time`,
    /// boundary inclusive.
    pub fn as_of(&self, entity: &str, owner: Option<Uuid>, time: TimeKey) -> Option<Bytes> {
        let owner = OwnerRef::from(owner);
        self.with_engine(entity, |engine| engine.as_of(&owner, time), None)
    }

    /// All records with time key >= `time` in the owner's partition,
    /// ascending.
    pub fn from(&self, entity: &str, owner: Option<Uuid>, time: TimeKey) -> Vec<Bytes> {
        let owner = OwnerRef::from(owner);
        self.with_engine(entity, |engine| engine.from(&owner, time), Vec::new())
    }

    /// All records with time key <= `time` in the owner's partition,
    /// ascending.
    pub fn until(&self, entity: &str, owner: Option<Uuid>, time: TimeKey) -> Vec<Bytes> {
        let owner = OwnerRef::from(owner);
        self.with_engine(entity, |engine| engine.until(&owner, time), Vec::new())
    }

    /// All records with `from <= time key <= until` in the owner's
    /// partition, ascending.
    ///
    /// # Errors
    ///
    /// Returns `TidemarkError::InvalidRange` when `from > until`, even for
    /// unknown entity names.
    pub fn range(
        &self,
        entity: &str,
        owner: Option<Uuid>,
        from: TimeKey,
        until: TimeKey,
    ) -> Result<Vec<Bytes>> {
        if from > until {
            return Err(TidemarkError::InvalidRange { from, until });
        }
        let owner = OwnerRef::from(owner);
        self.with_engine(
            entity,
            |engine| engine.range(&owner, from, until),
            Ok(Vec::new()),
        )
    }

    /// Unscoped exact match across all owners of an entity type.
    pub fn exact_all(&self, entity: &str, time: TimeKey) -> Vec<Bytes> {
        self.with_engine(entity, |engine| engine.exact_all(time), Vec::new())
    }

    /// Unscoped as-of: each owner's record in effect at `time`.
    pub fn as_of_all(&self, entity: &str, time: TimeKey) -> Vec<Bytes> {
        self.with_engine(entity, |engine| engine.as_of_all(time), Vec::new())
    }

    /// Unscoped from across all owners of an entity type.
    pub fn from_all(&self, entity: &str, time: TimeKey) -> Vec<Bytes> {
        self.with_engine(entity, |engine| engine.from_all(time), Vec::new())
    }

    /// Unscoped until across all owners of an entity type.
    pub fn until_all(&self, entity: &str, time: TimeKey) -> Vec<Bytes> {
        self.with_engine(entity, |engine| engine.until_all(time), Vec::new())
    }

    /// Unscoped range across all owners of an entity type.
    ///
    /// # Errors
    ///
    /// Returns `TidemarkError::InvalidRange` when `from > until`, even for
    /// unknown entity names.
    pub fn range_all(&self, entity: &str, from: TimeKey, until: TimeKey) -> Result<Vec<Bytes>> {
        if from > until {
            return Err(TidemarkError::InvalidRange { from, until });
        }
        self.with_engine(
            entity,
            |engine| engine.range_all(from, until),
            Ok(Vec::new()),
        )
    }

    /// Run a query against an entity's engine, or return `empty` for an
    /// entity type that was never inserted into. Unknown entities behave as
    /// empty collections, not errors.
    fn with_engine<T, F>(&self, entity: &str, query: F, empty: T) -> T
    where
        F: for<'e> FnOnce(
            TemporalQueryEngine<'e, Uuid, FxHashMap<RecordId, Bytes>>,
        ) -> T,
    {
        let inner = self.inner.read();
        match inner.entities.get(entity) {
            Some(index) => query(TemporalQueryEngine::new(index, &inner.payloads)),
            None => empty,
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreInner {
    pub(crate) fn new_with_config(config: &Config) -> Self {
        Self {
            entities: FxHashMap::with_capacity_and_hasher(
                config.entity_capacity_hint,
                Default::default(),
            ),
            payloads: FxHashMap::default(),
            stats: StoreStats::new(),
            config: config.clone(),
        }
    }
}
