//! Windsite Core
//!
//! Foundational domain types, error types, and collaborator traits for the
//! Windsite workflow orchestrator. This crate has no dependencies on the
//! application crate (storage engines, HTTP clients, LLM providers).
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `StoreError`)
//! - `intent` - Workflow intents and the step prerequisite graph
//! - `project` - Persisted project and session records
//! - `artifact` - Response artifacts and action buttons
//! - `thought` - Ordered per-request diagnostic trace (`ThoughtRecorder`)
//! - `store` - Persistence collaborator trait (`ProjectStore`)
//! - `context` - Explicit request context accessors
//!
//! ## Design Principles
//!
//! 1. **Zero external dependencies beyond serde/async-trait/thiserror/chrono**
//! 2. **Trait-based collaborators** - the store is abstract so tests can swap it
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod artifact;
pub mod context;
pub mod error;
pub mod intent;
pub mod project;
pub mod store;
pub mod thought;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult, StoreError};

// ── Intents ────────────────────────────────────────────────────────────
pub use intent::{WorkflowIntent, WorkflowStep};

// ── Project State ──────────────────────────────────────────────────────
pub use project::{Location, Project, SessionRecord, StepStatus};

// ── Artifacts ──────────────────────────────────────────────────────────
pub use artifact::{ActionButton, Artifact};

// ── Thought Steps ──────────────────────────────────────────────────────
pub use thought::{StepHandle, ThoughtRecorder, ThoughtStatus, ThoughtStep};

// ── Collaborators ──────────────────────────────────────────────────────
pub use store::ProjectStore;

// ── Request Context ────────────────────────────────────────────────────
pub use context::ExplicitContext;
