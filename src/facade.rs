//! Typed per-entity facades over the store.
//!
//! The source data model exposes hundreds of near-identical typed getters
//! (one family per entity type). Rather than hand-writing that cross
//! product, the [`entity_facade!`] macro emits a thin typed binding per
//! entity: a concrete payload type (serde + bincode encoded), a concrete
//! owner-key type, and call-throughs onto the generic query shapes. The
//! facade contains no logic of its own.

use crate::error::{Result, TidemarkError};
use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Encode a typed payload for storage.
pub fn encode_payload<T: Serialize>(payload: &T) -> Result<Bytes> {
    let encoded = bincode::serialize(payload).map_err(|e| {
        TidemarkError::SerializationErrorWithContext(format!("failed to encode payload: {e}"))
    })?;
    Ok(Bytes::from(encoded))
}

/// Decode one stored payload.
pub fn decode_payload<T: DeserializeOwned>(bytes: &Bytes) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| {
        TidemarkError::SerializationErrorWithContext(format!("failed to decode payload: {e}"))
    })
}

/// Decode an optional stored payload.
pub fn decode_optional<T: DeserializeOwned>(bytes: Option<Bytes>) -> Result<Option<T>> {
    bytes.map(|b| decode_payload(&b)).transpose()
}

/// Decode a sequence of stored payloads, preserving order.
pub fn decode_all<T: DeserializeOwned>(items: Vec<Bytes>) -> Result<Vec<T>> {
    items.iter().map(decode_payload).collect()
}

/// Define a typed facade over a [`Store`](crate::Store) entity.
///
/// Takes the entity name, the owner-key type (anything `Into<Uuid>`), and
/// the payload type (serde serializable). Emits a struct with the full
/// query surface: `insert`, `by_id`, `all`, `by_owner`,
/// `by_absent_owner`, the five temporal shapes scoped by owner, their
/// `*_absent` variants for the ownerless partition, and the unscoped
/// `*_all` family.
///
/// # Examples
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use tidemark::{Store, TimeKey, entity_facade};
/// use uuid::Uuid;
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// struct RadarStatus {
///     rotating: bool,
///     rpm: u16,
/// }
///
/// entity_facade! {
///     /// Radar status history, keyed by radar device id.
///     pub struct RadarStatusFacade {
///         entity: "radar_status",
///         owner: Uuid,
///         payload: RadarStatus,
///     }
/// }
///
/// let store = Store::new();
/// let radars = RadarStatusFacade::new(store);
/// let device = Uuid::new_v4();
///
/// let status = RadarStatus { rotating: true, rpm: 24 };
/// radars.insert(Some(device), TimeKey::from_millis(10), &status)?;
///
/// let found = radars.as_of(device, TimeKey::from_millis(15))?;
/// assert_eq!(found, Some(status));
/// # Ok::<(), tidemark::TidemarkError>(())
/// ```
#[macro_export]
macro_rules! entity_facade {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            entity: $entity:literal,
            owner: $owner:ty,
            payload: $payload:ty $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone)]
        $vis struct $name {
            store: $crate::Store,
        }

        impl $name {
            /// The entity type name this facade is bound to.
            $vis const ENTITY: &'static str = $entity;

            /// Bind the facade to a store.
            $vis fn new(store: $crate::Store) -> Self {
                Self { store }
            }

            /// The underlying store handle.
            $vis fn store(&self) -> &$crate::Store {
                &self.store
            }

            /// Ingest one record; `None` files it under the absent-owner
            /// partition.
            $vis fn insert(
                &self,
                owner: Option<$owner>,
                time: $crate::TimeKey,
                payload: &$payload,
            ) -> $crate::Result<$crate::RecordId> {
                let bytes = $crate::facade::encode_payload(payload)?;
                self.store.insert(
                    Self::ENTITY,
                    owner.map(|o| $crate::__private::Uuid::from(o)),
                    time,
                    bytes,
                )
            }

            /// Direct lookup by record id.
            $vis fn by_id(
                &self,
                id: $crate::RecordId,
            ) -> $crate::Result<Option<$payload>> {
                $crate::facade::decode_optional(self.store.by_id(id))
            }

            /// Every record of this entity type.
            $vis fn all(&self) -> $crate::Result<Vec<$payload>> {
                $crate::facade::decode_all(self.store.all(Self::ENTITY))
            }

            /// Every record owned by `owner`, time ascending.
            $vis fn by_owner(&self, owner: $owner) -> $crate::Result<Vec<$payload>> {
                $crate::facade::decode_all(
                    self.store.by_owner(Self::ENTITY, Some($crate::__private::Uuid::from(owner))),
                )
            }

            /// Every ownerless record, time ascending.
            $vis fn by_absent_owner(&self) -> $crate::Result<Vec<$payload>> {
                $crate::facade::decode_all(self.store.by_absent_owner(Self::ENTITY))
            }

            /// The owner's record whose time key equals `time`.
            $vis fn exact(
                &self,
                owner: $owner,
                time: $crate::TimeKey,
            ) -> $crate::Result<Option<$payload>> {
                $crate::facade::decode_optional(self.store.exact(
                    Self::ENTITY,
                    Some($crate::__private::Uuid::from(owner)),
                    time,
                ))
            }

            /// The owner's record in effect at `time`.
            $vis fn as_of(
                &self,
                owner: $owner,
                time: $crate::TimeKey,
            ) -> $crate::Result<Option<$payload>> {
                $crate::facade::decode_optional(self.store.as_of(
                    Self::ENTITY,
                    Some($crate::__private::Uuid::from(owner)),
                    time,
                ))
            }

            /// The owner's records with time key >= `time`, ascending.
            $vis fn from(
                &self,
                owner: $owner,
                time: $crate::TimeKey,
            ) -> $crate::Result<Vec<$payload>> {
                $crate::facade::decode_all(self.store.from(
                    Self::ENTITY,
                    Some($crate::__private::Uuid::from(owner)),
                    time,
                ))
            }

            /// The owner's records with time key <= `time`, ascending.
            $vis fn until(
                &self,
                owner: $owner,
                time: $crate::TimeKey,
            ) -> $crate::Result<Vec<$payload>> {
                $crate::facade::decode_all(self.store.until(
                    Self::ENTITY,
                    Some($crate::__private::Uuid::from(owner)),
                    time,
                ))
            }

            /// The owner's records inside the closed interval, ascending.
            $vis fn range(
                &self,
                owner: $owner,
                from: $crate::TimeKey,
                until: $crate::TimeKey,
            ) -> $crate::Result<Vec<$payload>> {
                $crate::facade::decode_all(self.store.range(
                    Self::ENTITY,
                    Some($crate::__private::Uuid::from(owner)),
                    from,
                    until,
                )?)
            }

            /// The ownerless record whose time key equals `time`.
            $vis fn exact_absent(
                &self,
                time: $crate::TimeKey,
            ) -> $crate::Result<Option<$payload>> {
                $crate::facade::decode_optional(self.store.exact(Self::ENTITY, None, time))
            }

            /// The ownerless record in effect at `time`.
            $vis fn as_of_absent(
                &self,
                time: $crate::TimeKey,
            ) -> $crate::Result<Option<$payload>> {
                $crate::facade::decode_optional(self.store.as_of(Self::ENTITY, None, time))
            }

            /// Ownerless records with time key >= `time`, ascending.
            $vis fn from_absent(
                &self,
                time: $crate::TimeKey,
            ) -> $crate::Result<Vec<$payload>> {
                $crate::facade::decode_all(self.store.from(Self::ENTITY, None, time))
            }

            /// Ownerless records with time key <= `time`, ascending.
            $vis fn until_absent(
                &self,
                time: $crate::TimeKey,
            ) -> $crate::Result<Vec<$payload>> {
                $crate::facade::decode_all(self.store.until(Self::ENTITY, None, time))
            }

            /// Ownerless records inside the closed interval, ascending.
            $vis fn range_absent(
                &self,
                from: $crate::TimeKey,
                until: $crate::TimeKey,
            ) -> $crate::Result<Vec<$payload>> {
                $crate::facade::decode_all(self.store.range(Self::ENTITY, None, from, until)?)
            }

            /// Across all owners, records whose time key equals `time`.
            $vis fn exact_all(
                &self,
                time: $crate::TimeKey,
            ) -> $crate::Result<Vec<$payload>> {
                $crate::facade::decode_all(self.store.exact_all(Self::ENTITY, time))
            }

            /// Each owner's record in effect at `time`.
            $vis fn as_of_all(
                &self,
                time: $crate::TimeKey,
            ) -> $crate::Result<Vec<$payload>> {
                $crate::facade::decode_all(self.store.as_of_all(Self::ENTITY, time))
            }

            /// Across all owners, records with time key >= `time`.
            $vis fn from_all(
                &self,
                time: $crate::TimeKey,
            ) -> $crate::Result<Vec<$payload>> {
                $crate::facade::decode_all(self.store.from_all(Self::ENTITY, time))
            }

            /// Across all owners, records with time key <= `time`.
            $vis fn until_all(
                &self,
                time: $crate::TimeKey,
            ) -> $crate::Result<Vec<$payload>> {
                $crate::facade::decode_all(self.store.until_all(Self::ENTITY, time))
            }

            /// Across all owners, records inside the closed interval.
            $vis fn range_all(
                &self,
                from: $crate::TimeKey,
                until: $crate::TimeKey,
            ) -> $crate::Result<Vec<$payload>> {
                $crate::facade::decode_all(self.store.range_all(Self::ENTITY, from, until)?)
            }
        }
    };
}
