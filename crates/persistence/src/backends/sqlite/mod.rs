//! SQLite resource store.
//!
//! Supports both in-memory databases (useful for testing) and file-based
//! databases, so registered databases, gateways and finished queries survive
//! a gateway restart.
//!
//! # Example
//!
//! ```no_run
//! use optigate_persistence::backends::sqlite::SqliteStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::open("gateway.db")?;
//! store.init_schema()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE documents (
//!     seq INTEGER PRIMARY KEY AUTOINCREMENT,  -- insertion order
//!     collection TEXT NOT NULL,
//!     id TEXT NOT NULL,
//!     data TEXT NOT NULL,                     -- JSON document
//!     created_at TEXT NOT NULL,
//!     last_modified TEXT NOT NULL,
//!     UNIQUE (collection, id)
//! );
//! ```

mod backend;
mod schema;
mod storage;

pub use backend::{SqliteStore, SqliteStoreConfig};
pub use schema::SCHEMA_VERSION;
