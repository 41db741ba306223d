//! Catalog store boundary.
//!
//! [`CatalogStore`] is the synchronous contract of the in-memory backend.
//! [`AsyncCatalogStore`] carries the same operations for both backends:
//! [`PostgresCatalogStore`] implements it over an SQLx pool and
//! [`InMemoryCatalogStore`] forwards to its synchronous methods.

pub mod clock;
pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use clock::{Clock, SteppingClock, SystemClock};
pub use in_memory::InMemoryCatalogStore;
pub use postgres::PostgresCatalogStore;
pub use r#trait::{AsyncCatalogStore, CatalogStore, CatalogStoreError, DeleteSummary};
