//! First-class queries over the absent-owner partition.
//!
//! Many entities model optional ownership (a camera command with no reply
//! yet, a track not yet bound to a device). Records without an owner live in
//! a dedicated partition rather than being filtered out of other results,
//! and this adapter exposes that partition through the same temporal query
//! shapes the owned partitions get — without leaking the sentinel encoding
//! to callers.

use crate::engine::{PayloadResolver, TemporalQueryEngine};
use crate::error::Result;
use crate::types::{OwnerRef, TimeKey};

/// The temporal query shapes scoped to records without an owner.
///
/// Stateless composition over [`TemporalQueryEngine`]: every method routes
/// to the reserved sentinel partition, which is an ordinary key internally.
///
/// # Examples
///
/// ```rust
/// use rustc_hash::FxHashMap;
/// use tidemark::{AbsentOwnerQueries, OwnerIndex, OwnerRef, RecordId, TemporalQueryEngine, TimeKey};
///
/// let mut index: OwnerIndex<u32> = OwnerIndex::new();
/// let mut payloads: FxHashMap<RecordId, &str> = FxHashMap::default();
///
/// let id = RecordId::new();
/// index.insert(OwnerRef::Absent, TimeKey::from_millis(5), id).unwrap();
/// payloads.insert(id, "unclaimed");
///
/// let absent = AbsentOwnerQueries::new(TemporalQueryEngine::new(&index, &payloads));
/// assert_eq!(absent.by_absent_owner(), vec!["unclaimed"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AbsentOwnerQueries<'a, K, R> {
    engine: TemporalQueryEngine<'a, K, R>,
}

impl<'a, K: Ord, R: PayloadResolver> AbsentOwnerQueries<'a, K, R> {
    /// Wrap an engine.
    pub fn new(engine: TemporalQueryEngine<'a, K, R>) -> Self {
        Self { engine }
    }

    /// Every ownerless record, time ascending.
    pub fn by_absent_owner(&self) -> Vec<R::Payload> {
        self.engine.by_owner(&OwnerRef::Absent)
    }

    /// The ownerless record whose time key equals `time`.
    pub fn exact(&self, time: TimeKey) -> Option<R::Payload> {
        self.engine.exact(&OwnerRef::Absent, time)
    }

    /// The ownerless record in effect at `time`.
    pub fn as_of(&self, time: TimeKey) -> Option<R::Payload> {
        self.engine.as_of(&OwnerRef::Absent, time)
    }

    /// All ownerless records with time key >= `time`, ascending.
    pub fn from(&self, time: TimeKey) -> Vec<R::Payload> {
        self.engine.from(&OwnerRef::Absent, time)
    }

    /// All ownerless records with time key <= `time`, ascending.
    pub fn until(&self, time: TimeKey) -> Vec<R::Payload> {
        self.engine.until(&OwnerRef::Absent, time)
    }

    /// All ownerless records inside the closed interval, ascending.
    ///
    /// # Errors
    ///
    /// Returns `TidemarkError::InvalidRange` when `from > until`.
    pub fn range(&self, from: TimeKey, until: TimeKey) -> Result<Vec<R::Payload>> {
        self.engine.range(&OwnerRef::Absent, from, until)
    }
}
