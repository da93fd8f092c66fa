//! Project Context Resolver
//!
//! Turns `(session, explicit project id?, inferred location?)` into a
//! persisted project. Resolution order:
//!
//! 1. an explicit id that exists in the store;
//! 2. the project the session is bound to;
//! 3. a synthesized id (location-derived, else a session counter), reusing
//!    the project if it already exists and creating it otherwise.
//!
//! The project is written before the session binding, so a failed binding
//! never leaves the session pointing at a project that does not exist.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use windsite_core::{Location, Project, ProjectStore, SessionRecord, StoreError};

use super::naming::{session_display_name, session_project_id, LocationNaming};

/// How the project for a request was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectOrigin {
    Explicit,
    SessionBound,
    Existing,
    Created,
}

impl ProjectOrigin {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Explicit => "loaded explicitly requested project",
            Self::SessionBound => "loaded project bound to this session",
            Self::Existing => "reused existing project",
            Self::Created => "created new project",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedProject {
    pub project: Project,
    pub origin: ProjectOrigin,
}

pub struct ProjectContextResolver {
    store: Arc<dyn ProjectStore>,
    naming: LocationNaming,
}

impl ProjectContextResolver {
    pub fn new(store: Arc<dyn ProjectStore>, naming: LocationNaming) -> Self {
        Self { store, naming }
    }

    pub async fn resolve(
        &self,
        session_id: &str,
        explicit_id: Option<&str>,
        location: Option<Location>,
    ) -> Result<ResolvedProject, StoreError> {
        let session = self.store.get_session(session_id).await?;

        if let Some(id) = explicit_id {
            match self.store.get_project(id).await? {
                Some(project) => {
                    self.bind_session(session_id, session, &project.id, None).await?;
                    return Ok(ResolvedProject {
                        project,
                        origin: ProjectOrigin::Explicit,
                    });
                }
                None => debug!(project_id = id, "explicit project not found, resolving from session"),
            }
        }

        // A bound session keeps its project even when the query names another
        // site; switching sites takes an explicit project id.
        if let Some(bound_id) = session.as_ref().and_then(|s| s.active_project_id.as_deref()) {
            match self.store.get_project(bound_id).await? {
                Some(project) => {
                    return Ok(ResolvedProject {
                        project,
                        origin: ProjectOrigin::SessionBound,
                    });
                }
                None => debug!(bound_id, "session bound to a missing project"),
            }
        }

        let (candidate_id, display_name, ordinal) = match &location {
            Some(loc) => (self.naming.project_id(session_id, loc), self.naming.display_name(loc), None),
            None => {
                let ordinal = session.as_ref().map(|s| s.projects_created).unwrap_or(0) + 1;
                (
                    session_project_id(session_id, ordinal),
                    session_display_name(ordinal),
                    Some(ordinal),
                )
            }
        };

        let (project, origin) = match self.store.get_project(&candidate_id).await? {
            Some(project) => (project, ProjectOrigin::Existing),
            None => self.create(candidate_id, display_name, location).await?,
        };

        let ordinal = if origin == ProjectOrigin::Created { ordinal } else { None };
        self.bind_session(session_id, session, &project.id, ordinal).await?;

        Ok(ResolvedProject { project, origin })
    }

    /// Create-only write. Losing a create race to a concurrent request for
    /// the same id is not an error: the winner's record is returned.
    async fn create(
        &self,
        id: String,
        display_name: String,
        location: Option<Location>,
    ) -> Result<(Project, ProjectOrigin), StoreError> {
        let mut project = Project::new(id, display_name, location);
        match self.store.put_project(&project, None).await {
            Ok(version) => {
                project.version = version;
                info!(project_id = %project.id, "created project");
                Ok((project, ProjectOrigin::Created))
            }
            Err(e) if e.is_conflict() => match self.store.get_project(&project.id).await? {
                Some(existing) => Ok((existing, ProjectOrigin::Existing)),
                None => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    /// Point the session at `project_id`, retrying once on a version conflict.
    async fn bind_session(
        &self,
        session_id: &str,
        current: Option<SessionRecord>,
        project_id: &str,
        created_ordinal: Option<u64>,
    ) -> Result<(), StoreError> {
        let apply = |record: Option<SessionRecord>| -> Option<(SessionRecord, Option<u64>)> {
            let expected = record.as_ref().map(|r| r.version);
            let mut record = record.unwrap_or_else(|| SessionRecord::new(session_id));
            let counter = created_ordinal.map_or(record.projects_created, |n| n.max(record.projects_created));
            if expected.is_some()
                && record.active_project_id.as_deref() == Some(project_id)
                && counter == record.projects_created
            {
                return None;
            }
            record.active_project_id = Some(project_id.to_string());
            record.projects_created = counter;
            record.updated_at = Utc::now();
            Some((record, expected))
        };

        let Some((record, expected)) = apply(current) else {
            return Ok(());
        };
        match self.store.put_session(&record, expected).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_conflict() => {
                debug!(session_id, "session binding conflict, retrying once");
                let fresh = self.store.get_session(session_id).await?;
                match apply(fresh) {
                    Some((record, expected)) => self.store.put_session(&record, expected).await.map(|_| ()),
                    None => Ok(()),
                }
            }
            Err(e) => Err(e),
        }
    }
}
