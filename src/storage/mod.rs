//! Storage Layer
//!
//! Handles all data persistence: versioned project/session stores (SQLite or
//! in-memory) and the JSON config file.

pub mod config;
pub mod database;
pub mod memory;
pub mod sqlite_store;

pub use config::*;
pub use database::*;
pub use memory::*;
pub use sqlite_store::*;
