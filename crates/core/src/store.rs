//! Persistence Collaborator
//!
//! Keyed storage for projects and session bindings. Implementations hold no
//! business logic; they only enforce versioned writes.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::project::{Project, SessionRecord};

/// Versioned key-value store for orchestrator state.
///
/// Write semantics shared by every implementation:
/// - `expected = None` creates the record and fails with
///   `StoreError::VersionConflict` if it already exists.
/// - `expected = Some(v)` replaces the record only if its stored version is
///   still `v`.
/// - On success the new stored version is returned. Versions start at 1.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn get_project(&self, id: &str) -> Result<Option<Project>, StoreError>;

    async fn put_project(&self, project: &Project, expected: Option<u64>) -> Result<u64, StoreError>;

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError>;

    async fn put_session(
        &self,
        session: &SessionRecord,
        expected: Option<u64>,
    ) -> Result<u64, StoreError>;
}
