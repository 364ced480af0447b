//! Core value types and configuration for tidemark.
//!
//! This module defines the temporal ordering key, the record identifier,
//! the owner key space, and the serializable store configuration.

use crate::error::{Result, TidemarkError};
use serde::de::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// A record's temporal ordering key: milliseconds since the Unix epoch.
///
/// `TimeKey` is totally ordered and supports exact equality, which is what
/// makes the `exact` and `as_of` query shapes well-defined. Negative values
/// represent instants before the epoch.
///
/// # Examples
///
/// ```rust
/// use tidemark::TimeKey;
///
/// let t0 = TimeKey::from_millis(1_700_000_000_000);
/// let t1 = TimeKey::from_millis(1_700_000_000_001);
/// assert!(t0 < t1);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct TimeKey(i64);

impl TimeKey {
    /// The earliest representable time key.
    pub const MIN: TimeKey = TimeKey(i64::MIN);
    /// The latest representable time key.
    pub const MAX: TimeKey = TimeKey(i64::MAX);

    /// Create a time key from milliseconds since the Unix epoch.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the Unix epoch.
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Convert a `SystemTime` to a time key.
    ///
    /// # Errors
    ///
    /// Returns `TidemarkError::InvalidTimestamp` if the instant is too far
    /// from the epoch to fit in a signed 64-bit millisecond count.
    pub fn from_system_time(time: SystemTime) -> Result<Self> {
        let millis = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => {
                i64::try_from(after.as_millis()).map_err(|_| TidemarkError::InvalidTimestamp)?
            }
            Err(err) => {
                let before = err.duration();
                let millis =
                    i64::try_from(before.as_millis()).map_err(|_| TidemarkError::InvalidTimestamp)?;
                millis.checked_neg().ok_or(TidemarkError::InvalidTimestamp)?
            }
        };
        Ok(Self(millis))
    }

    /// The current instant as a time key.
    pub fn now() -> Self {
        // The present era always fits in i64 milliseconds.
        Self::from_system_time(SystemTime::now()).unwrap_or(Self(0))
    }
}

impl fmt::Display for TimeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TimeKey {
    fn from(millis: i64) -> Self {
        Self(millis)
    }
}

/// Opaque, globally unique identifier of one stored record.
///
/// All entity types share a single identifier space, so a `RecordId` alone
/// is enough to locate a record without knowing its entity type. Identifiers
/// are immutable once assigned and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RecordId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// The owner key space of a partition, including the absent-owner sentinel.
///
/// Entities whose owning foreign key is optional model "no owner" as a
/// first-class partition rather than an error state. `Absent` sorts before
/// every concrete key, which keeps the index's key space total without
/// special-casing null checks at call sites.
///
/// # Examples
///
/// ```rust
/// use tidemark::OwnerRef;
///
/// let absent: OwnerRef<u32> = OwnerRef::Absent;
/// let owned = OwnerRef::Owned(7u32);
/// assert!(absent < owned);
/// assert_eq!(OwnerRef::from(None::<u32>), absent);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OwnerRef<K> {
    /// The reserved sentinel partition for records without an owner.
    Absent,
    /// A concrete owner key.
    Owned(K),
}

impl<K> OwnerRef<K> {
    /// View the owner as an `Option`, hiding the sentinel encoding.
    pub fn as_option(&self) -> Option<&K> {
        match self {
            OwnerRef::Absent => None,
            OwnerRef::Owned(key) => Some(key),
        }
    }

    /// Whether this is the absent-owner sentinel.
    pub fn is_absent(&self) -> bool {
        matches!(self, OwnerRef::Absent)
    }
}

impl<K> From<Option<K>> for OwnerRef<K> {
    fn from(owner: Option<K>) -> Self {
        match owner {
            None => OwnerRef::Absent,
            Some(key) => OwnerRef::Owned(key),
        }
    }
}

impl<K> From<OwnerRef<K>> for Option<K> {
    fn from(owner: OwnerRef<K>) -> Self {
        match owner {
            OwnerRef::Absent => None,
            OwnerRef::Owned(key) => Some(key),
        }
    }
}

/// One indexed record reference: a time key and the record it locates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexEntry {
    pub time: TimeKey,
    pub id: RecordId,
}

/// Store configuration.
///
/// Designed to be easily serializable and loadable from JSON or TOML while
/// keeping complexity minimal.
///
/// # Example
///
/// ```rust
/// use tidemark::Config;
///
/// let config = Config::default();
///
/// let json = r#"{
///     "partition_capacity_hint": 256,
///     "entity_capacity_hint": 32
/// }"#;
/// let config: Config = Config::from_json(json).unwrap();
/// assert_eq!(config.partition_capacity_hint, 256);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Initial capacity reserved for a partition's entry sequence on its
    /// first insert. Zero means no reservation.
    #[serde(default)]
    pub partition_capacity_hint: usize,

    /// Initial capacity of the per-store entity registry.
    #[serde(default = "Config::default_entity_capacity_hint")]
    pub entity_capacity_hint: usize,
}

impl Config {
    const fn default_entity_capacity_hint() -> usize {
        16
    }

    /// Maximum accepted capacity hint, to catch configs that would
    /// preallocate absurd amounts of memory.
    const MAX_CAPACITY_HINT: usize = 1 << 30;

    /// Reserve this many entry slots when a partition is first created.
    pub fn with_partition_capacity_hint(mut self, hint: usize) -> Self {
        self.partition_capacity_hint = hint;
        self
    }

    /// Size the entity registry for this many entity types up front.
    pub fn with_entity_capacity_hint(mut self, hint: usize) -> Self {
        self.entity_capacity_hint = hint;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.partition_capacity_hint > Self::MAX_CAPACITY_HINT {
            return Err("Partition capacity hint is too large".to_string());
        }
        if self.entity_capacity_hint > Self::MAX_CAPACITY_HINT {
            return Err("Entity capacity hint is too large".to_string());
        }
        Ok(())
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as a JSON string.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from a TOML string (requires the `toml` feature).
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as a TOML string (requires the `toml` feature).
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            partition_capacity_hint: 0,
            entity_capacity_hint: Self::default_entity_capacity_hint(),
        }
    }
}

/// Store statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of records across all entity types.
    pub record_count: usize,
    /// Number of entity types with at least one record ever inserted.
    pub entity_count: usize,
    /// Number of partitions across all entity types.
    pub partition_count: usize,
    /// Total number of insert attempts.
    pub insert_count: u64,
    /// Insert attempts rejected for colliding time keys.
    pub duplicate_insert_count: u64,
}

impl StoreStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_key_ordering() {
        let t0 = TimeKey::from_millis(-5);
        let t1 = TimeKey::from_millis(0);
        let t2 = TimeKey::from_millis(5);
        assert!(t0 < t1 && t1 < t2);
        assert_eq!(t1, TimeKey::default());
    }

    #[test]
    fn test_time_key_from_system_time() {
        let t = TimeKey::from_system_time(UNIX_EPOCH).unwrap();
        assert_eq!(t.as_millis(), 0);

        let later = UNIX_EPOCH + std::time::Duration::from_millis(1500);
        assert_eq!(TimeKey::from_system_time(later).unwrap().as_millis(), 1500);

        let earlier = UNIX_EPOCH - std::time::Duration::from_millis(250);
        assert_eq!(TimeKey::from_system_time(earlier).unwrap().as_millis(), -250);
    }

    #[test]
    fn test_time_key_now_is_positive() {
        assert!(TimeKey::now().as_millis() > 0);
    }

    #[test]
    fn test_record_id_uniqueness() {
        let a = RecordId::new();
        let b = RecordId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_id_roundtrip() {
        let uuid = Uuid::new_v4();
        let id = RecordId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
        assert_eq!(RecordId::from(uuid), id);
    }

    #[test]
    fn test_owner_ref_sentinel_sorts_first() {
        let mut owners = vec![
            OwnerRef::Owned(2u32),
            OwnerRef::Absent,
            OwnerRef::Owned(1u32),
        ];
        owners.sort();
        assert_eq!(
            owners,
            vec![OwnerRef::Absent, OwnerRef::Owned(1), OwnerRef::Owned(2)]
        );
    }

    #[test]
    fn test_owner_ref_option_conversions() {
        assert_eq!(OwnerRef::from(Some(3u8)), OwnerRef::Owned(3));
        assert_eq!(OwnerRef::from(None::<u8>), OwnerRef::Absent);
        assert_eq!(Option::<u8>::from(OwnerRef::Owned(3u8)), Some(3));
        assert!(OwnerRef::<u8>::Absent.is_absent());
        assert_eq!(OwnerRef::Owned(3u8).as_option(), Some(&3));
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.partition_capacity_hint, 0);
        assert_eq!(config.entity_capacity_hint, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default().with_partition_capacity_hint(usize::MAX);
        assert!(config.validate().is_err());

        let config = Config::default().with_entity_capacity_hint(usize::MAX);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default()
            .with_partition_capacity_hint(128)
            .with_entity_capacity_hint(4);

        let json = config.to_json().unwrap();
        let deserialized = Config::from_json(&json).unwrap();

        assert_eq!(deserialized.partition_capacity_hint, 128);
        assert_eq!(deserialized.entity_capacity_hint, 4);
    }

    #[test]
    fn test_config_from_json_rejects_invalid() {
        let json = format!(r#"{{ "partition_capacity_hint": {} }}"#, 1u64 << 31);
        assert!(Config::from_json(&json).is_err());
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_config_toml_roundtrip() {
        let config = Config::default().with_partition_capacity_hint(64);
        let toml_str = config.to_toml().unwrap();
        let deserialized = Config::from_toml(&toml_str).unwrap();
        assert_eq!(deserialized.partition_capacity_hint, 64);
    }
}
