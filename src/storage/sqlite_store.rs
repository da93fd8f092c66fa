//! SQLite Project Store
//!
//! `ProjectStore` backed by the pooled SQLite `Database`. Blocking rusqlite
//! calls run on tokio's blocking pool.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use windsite_core::{Project, ProjectStore, SessionRecord, StoreError};

use crate::storage::database::{Database, Table};

pub struct SqliteProjectStore {
    db: Database,
}

impl SqliteProjectStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    async fn read<T>(&self, table: Table, id: &str) -> Result<Option<(T, u64)>, StoreError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let db = self.db.clone();
        let id = id.to_string();
        let row = tokio::task::spawn_blocking(move || db.get_record(table, &id))
            .await
            .map_err(|e| StoreError::unavailable(e.to_string()))??;

        match row {
            Some(row) => {
                let value = serde_json::from_str::<T>(&row.body)
                    .map_err(|e| StoreError::corrupt(format!("{}: {}", row.id, e)))?;
                Ok(Some((value, row.version)))
            }
            None => Ok(None),
        }
    }

    async fn write<T>(
        &self,
        table: Table,
        id: &str,
        value: &T,
        expected: Option<u64>,
    ) -> Result<u64, StoreError>
    where
        T: Serialize,
    {
        let body = serde_json::to_string(value).map_err(|e| StoreError::corrupt(e.to_string()))?;
        let db = self.db.clone();
        let key = id.to_string();

        let outcome = tokio::task::spawn_blocking(move || -> Result<Result<u64, Option<u64>>, StoreError> {
            let written = match expected {
                None => db.insert_record(table, &key, &body)?,
                Some(version) => db.update_record(table, &key, &body, version)?,
            };
            if written {
                Ok(Ok(expected.map_or(1, |v| v + 1)))
            } else {
                Ok(Err(db.record_version(table, &key)?))
            }
        })
        .await
        .map_err(|e| StoreError::unavailable(e.to_string()))??;

        outcome.map_err(|found| StoreError::VersionConflict {
            key: id.to_string(),
            expected,
            found,
        })
    }
}

#[async_trait]
impl ProjectStore for SqliteProjectStore {
    async fn get_project(&self, id: &str) -> Result<Option<Project>, StoreError> {
        Ok(self
            .read::<Project>(Table::Projects, id)
            .await?
            .map(|(mut project, version)| {
                project.version = version;
                project
            }))
    }

    async fn put_project(&self, project: &Project, expected: Option<u64>) -> Result<u64, StoreError> {
        self.write(Table::Projects, &project.id, project, expected).await
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self
            .read::<SessionRecord>(Table::Sessions, session_id)
            .await?
            .map(|(mut session, version)| {
                session.version = version;
                session
            }))
    }

    async fn put_session(
        &self,
        session: &SessionRecord,
        expected: Option<u64>,
    ) -> Result<u64, StoreError> {
        self.write(Table::Sessions, &session.session_id, session, expected)
            .await
    }
}
