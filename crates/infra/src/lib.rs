//! Infrastructure layer: catalog storage backends and configuration.

pub mod catalog_store;
pub mod config;

mod integration_tests;

pub use catalog_store::{
    AsyncCatalogStore, CatalogStore, CatalogStoreError, Clock, DeleteSummary, InMemoryCatalogStore,
    PostgresCatalogStore, SteppingClock, SystemClock,
};
pub use config::{CatalogConfig, ConfigError};
