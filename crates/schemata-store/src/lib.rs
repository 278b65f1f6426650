//! # Schemata Store
//!
//! Storage for the Schemata registry: the abstract [`Store`] seam the
//! engine runs against, an in-memory implementation, and a Sled-backed
//! durable implementation that rebuilds its index at open.

pub mod memory;
pub mod records;
pub mod sled_store;
pub mod store;

pub use memory::MemoryStore;
pub use records::{ConfigEntry, NewSchema, StoredSchema, SubjectState, VersionBinding};
pub use sled_store::SledStore;
pub use store::{Page, Scope, Store, VersionSelector};
