//! Windsite Tools
//!
//! Types and collaborator traits for reaching the external tool services:
//! - `ToolIdentity` / `ToolTimeouts` - which tool backs each intent and how long it may run
//! - `ToolInvoker` - the outbound call seam, with an HTTP implementation
//! - `normalize` - raw tool output into response artifacts
//! - `ToolResult` - normalized execution outcome
//!
//! The dispatcher that ties these together lives in the main crate's
//! `services::dispatch` module.

pub mod catalog;
pub mod executor;
pub mod invoker;
pub mod normalize;

// Re-export core types
pub use catalog::{ToolIdentity, ToolTimeouts};
pub use executor::ToolResult;
pub use invoker::{HttpToolInvoker, ToolInvokeError, ToolInvoker};
pub use normalize::normalize;
