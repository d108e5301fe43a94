//! # creativehub-database
//!
//! PostgreSQL connection management, migrations, and the transactional
//! store used by the batch and copy engine. An in-memory store with the
//! same transaction semantics backs tests and embedded use.

pub mod connection;
pub mod migration;
pub mod store;

pub use connection::DatabasePool;
pub use store::{
    CreativeStore, CreativeTx, FailurePoint, MemoryCreativeStore, MemoryTables, PgCreativeStore,
};
