//! Data Models
//!
//! Contains the data structures exchanged with callers and the configuration
//! schema.

pub mod parameters;
pub mod request;
pub mod settings;

pub use parameters::*;
pub use request::*;
pub use settings::*;
