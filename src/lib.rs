//! Embedded temporal index and query engine for owner-partitioned
//! timeseries records.
//!
//! ```rust
//! use tidemark::{Store, TimeKey};
//! use uuid::Uuid;
//!
//! let store = Store::new();
//! let device = Uuid::new_v4();
//!
//! store.insert("gyro_course", Some(device), TimeKey::from_millis(10), &b"271.5"[..])?;
//! store.insert("gyro_course", Some(device), TimeKey::from_millis(20), &b"272.0"[..])?;
//!
//! // The value in effect at t=15 is the one recorded at t=10.
//! let course = store.as_of("gyro_course", Some(device), TimeKey::from_millis(15));
//! assert_eq!(course.as_deref(), Some(&b"271.5"[..]));
//! # Ok::<(), tidemark::TidemarkError>(())
//! ```

pub mod absent;
pub mod builder;
pub mod engine;
pub mod error;
pub mod facade;
pub mod index;
pub mod store;
pub mod types;

pub use absent::AbsentOwnerQueries;
pub use builder::StoreBuilder;
pub use engine::{PayloadResolver, TemporalQueryEngine};
pub use error::{Result, TidemarkError};
pub use index::{OwnerIndex, Partition};
pub use store::Store;
pub use types::{Config, IndexEntry, OwnerRef, RecordId, StoreStats, TimeKey};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Result, Store, StoreBuilder, TidemarkError};

    pub use crate::{OwnerRef, RecordId, TimeKey};

    pub use crate::{AbsentOwnerQueries, OwnerIndex, PayloadResolver, TemporalQueryEngine};

    pub use crate::{Config, StoreStats};
}

// Used by the entity_facade! macro expansion; not public API.
#[doc(hidden)]
pub mod __private {
    pub use uuid::Uuid;
}
