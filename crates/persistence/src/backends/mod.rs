//! Resource store backend implementations.
//!
//! # Available Backends
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | Memory | always | Process-local store, the default for development and tests |
//! | SQLite | `sqlite` | Embedded database, survives restarts |
//!
//! # Example
//!
//! ```no_run
//! use optigate_persistence::backends::memory::MemoryStore;
//! # #[cfg(feature = "sqlite")]
//! use optigate_persistence::backends::sqlite::SqliteStore;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let memory = MemoryStore::new();
//!
//! # #[cfg(feature = "sqlite")]
//! # {
//! let sqlite = SqliteStore::open("./data/gateway.db")?;
//! sqlite.init_schema()?;
//! # }
//! # Ok(())
//! # }
//! ```

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;
