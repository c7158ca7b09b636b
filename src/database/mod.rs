//! Tabfix persistence layer.
//!
//! Defines the [`PersistenceStore`] seam and its SQLite implementation.
//!
//! # Usage
//!
//! ```no_run
//! use tabfix::database::Database;
//!
//! // Open a persistent database
//! let db = Database::open("tabfix.db").expect("failed to open database");
//!
//! // Or use an in-memory database for testing
//! let db = Database::open_in_memory().expect("failed to open in-memory database");
//! ```

pub mod connection;
pub mod migrations;
pub mod store;

pub use connection::Database;
pub use store::{PersistenceStore, StorageArea};
