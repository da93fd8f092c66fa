//! In-Memory Project Store
//!
//! Versioned `ProjectStore` over two hash maps. Used for ephemeral runs and
//! tests; state is lost when the process exits.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use windsite_core::{Project, ProjectStore, SessionRecord, StoreError};

#[derive(Debug, Default)]
pub struct MemoryProjectStore {
    projects: RwLock<HashMap<String, Project>>,
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project_count(&self) -> usize {
        self.projects.read().map(|p| p.len()).unwrap_or(0)
    }
}

fn poisoned() -> StoreError {
    StoreError::unavailable("memory store lock poisoned")
}

/// Shared compare-and-swap over a versioned map.
fn cas_put<T: Clone>(
    map: &RwLock<HashMap<String, T>>,
    key: &str,
    value: &T,
    expected: Option<u64>,
    version_of: impl Fn(&T) -> u64,
    set_version: impl Fn(&mut T, u64),
) -> Result<u64, StoreError> {
    let mut guard = map.write().map_err(|_| poisoned())?;
    let found = guard.get(key).map(&version_of);
    if found != expected {
        return Err(StoreError::VersionConflict {
            key: key.to_string(),
            expected,
            found,
        });
    }
    let next = expected.map_or(1, |v| v + 1);
    let mut stored = value.clone();
    set_version(&mut stored, next);
    guard.insert(key.to_string(), stored);
    Ok(next)
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn get_project(&self, id: &str) -> Result<Option<Project>, StoreError> {
        let guard = self.projects.read().map_err(|_| poisoned())?;
        Ok(guard.get(id).cloned())
    }

    async fn put_project(&self, project: &Project, expected: Option<u64>) -> Result<u64, StoreError> {
        cas_put(
            &self.projects,
            &project.id,
            project,
            expected,
            |p| p.version,
            |p, v| p.version = v,
        )
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let guard = self.sessions.read().map_err(|_| poisoned())?;
        Ok(guard.get(session_id).cloned())
    }

    async fn put_session(
        &self,
        session: &SessionRecord,
        expected: Option<u64>,
    ) -> Result<u64, StoreError> {
        cas_put(
            &self.sessions,
            &session.session_id,
            session,
            expected,
            |s| s.version,
            |s, v| s.version = v,
        )
    }
}
