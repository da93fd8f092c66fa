//! Project Context Services

pub mod naming;
pub mod resolver;

pub use naming::LocationNaming;
pub use resolver::{ProjectContextResolver, ProjectOrigin, ResolvedProject};
