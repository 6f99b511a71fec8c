//! In-memory collaborators for the policy core: the arm catalog and the
//! append-only snapshot store.
//!
//! Production: replace with PostgreSQL (sqlx) or similar ACID store.
//! These provide the same API surface for development and testing.

pub mod catalog;
pub mod snapshot;

pub use catalog::CatalogStore;
pub use snapshot::SnapshotStore;
