//! Scrollkeeper database layer.
//!
//! Provides the SQLite connection that backs the durable session storage tier.
//!
//! # Usage
//!
//! ```no_run
//! use scrollkeeper::database::Database;
//!
//! // Open a persistent database
//! let db = Database::open("scrollkeeper.db").expect("failed to open database");
//!
//! // Or use an in-memory database for testing
//! let db = Database::open_in_memory().expect("failed to open in-memory database");
//!
//! let conn = db.connection();
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
