//! Document store adapters
//!
//! - [`InMemoryStore`]: HashMap-backed, for tests and local development
//! - [`SqliteStore`]: `sqlx` SQLite pool

pub mod memory;
pub mod sqlite_native;

pub use memory::InMemoryStore;
pub use sqlite_native::SqliteStore;
