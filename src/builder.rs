//! Store builder for flexible configuration.

use crate::error::{Result, TidemarkError};
use crate::store::{Store, StoreInner};
use crate::types::Config;

/// Builder for store configuration.
///
/// # Examples
///
/// ```rust
/// use tidemark::{Config, Store};
///
/// let store = Store::builder()
///     .config(Config::default().with_partition_capacity_hint(256))
///     .build()
///     .unwrap();
/// assert_eq!(store.config().partition_capacity_hint, 256);
/// ```
#[derive(Debug, Default)]
pub struct StoreBuilder {
    config: Config,
}

impl StoreBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Set the store configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Reserve this many entry slots when a partition is first created.
    pub fn partition_capacity_hint(mut self, hint: usize) -> Self {
        self.config.partition_capacity_hint = hint;
        self
    }

    /// Size the entity registry for this many entity types up front.
    pub fn entity_capacity_hint(mut self, hint: usize) -> Self {
        self.config.entity_capacity_hint = hint;
        self
    }

    /// Build the store, validating the configuration.
    pub fn build(self) -> Result<Store> {
        self.config.validate().map_err(TidemarkError::Other)?;
        Ok(Store::from_inner(StoreInner::new_with_config(&self.config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default() {
        let store = StoreBuilder::new().build().unwrap();
        assert_eq!(store.config().partition_capacity_hint, 0);
    }

    #[test]
    fn test_builder_hints() {
        let store = StoreBuilder::new()
            .partition_capacity_hint(64)
            .entity_capacity_hint(4)
            .build()
            .unwrap();

        let config = store.config();
        assert_eq!(config.partition_capacity_hint, 64);
        assert_eq!(config.entity_capacity_hint, 4);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = StoreBuilder::new()
            .partition_capacity_hint(usize::MAX)
            .build();
        assert!(result.is_err());
    }
}
