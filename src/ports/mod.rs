//! Port traits defining external boundaries.
//!
//! Each trait represents one capability of the external CRM consumed by the
//! allocator: an equality search over a record property (the uniqueness
//! oracle) and a single-field record update. Implementations live in
//! `src/adapters/`.

pub mod oracle;
pub mod store;

pub use oracle::{ExistsFuture, UniquenessOracle};
pub use store::{RecordStore, UpdateFuture};
