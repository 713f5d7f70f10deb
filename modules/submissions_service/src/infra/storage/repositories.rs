//! SeaORM repository implementations

use crate::contract::{FormId, Submission, SubmissionId, SUBMISSION_ID};
use crate::domain::query::{Predicate, SubmissionQuery};
use crate::domain::repository::{ColumnValues, SubmissionRepository};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sea_orm::{ConnectionTrait, DatabaseConnection};
use std::sync::Arc;
use tracing::debug;

use super::mapper::read_submission;
use super::statements::{SqlDialect, COUNT_ALIAS, EARLIEST_ALIAS};

// ===== Submission Repository =====

pub struct SeaOrmSubmissionRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmSubmissionRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn dialect(&self) -> SqlDialect {
        self.db.get_database_backend().into()
    }
}

#[async_trait]
impl SubmissionRepository for SeaOrmSubmissionRepository {
    async fn select(&self, form_id: FormId, query: &SubmissionQuery) -> Result<Vec<Submission>> {
        let backend = self.db.get_database_backend();
        let stmt = self.dialect().select(form_id, query);
        let rows = self.db.query_all(backend.build(&stmt)).await?;
        rows.iter()
            .map(|row| read_submission(row, &query.columns))
            .collect()
    }

    async fn count(&self, form_id: FormId, predicate: &Predicate) -> Result<u64> {
        let backend = self.db.get_database_backend();
        let stmt = self.dialect().count(form_id, predicate);
        let count = match self.db.query_one(backend.build(&stmt)).await? {
            Some(row) => row.try_get::<i64>("", COUNT_ALIAS)?,
            None => 0,
        };
        Ok(u64::try_from(count)?)
    }

    async fn earliest_submission_date(
        &self,
        form_id: FormId,
        predicate: &Predicate,
    ) -> Result<Option<NaiveDateTime>> {
        let backend = self.db.get_database_backend();
        let stmt = self.dialect().earliest_submission_date(form_id, predicate);
        match self.db.query_one(backend.build(&stmt)).await? {
            Some(row) => Ok(row.try_get::<Option<NaiveDateTime>>("", EARLIEST_ALIAS)?),
            None => Ok(None),
        }
    }

    async fn insert(&self, form_id: FormId, values: &ColumnValues) -> Result<SubmissionId> {
        let backend = self.db.get_database_backend();
        let dialect = self.dialect();
        let stmt = dialect.insert(form_id, values)?;

        let submission_id = if dialect == SqlDialect::Postgres {
            let row = self
                .db
                .query_one(backend.build(&stmt))
                .await?
                .ok_or_else(|| anyhow!("Insert into form_{form_id} returned no row"))?;
            row.try_get::<i64>("", SUBMISSION_ID)?
        } else {
            let result = self.db.execute(backend.build(&stmt)).await?;
            i64::try_from(result.last_insert_id())?
        };

        debug!(form_id, submission_id, "Inserted submission row");
        Ok(submission_id)
    }

    async fn update(
        &self,
        form_id: FormId,
        submission_id: SubmissionId,
        values: &ColumnValues,
    ) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        let backend = self.db.get_database_backend();
        let stmt = self.dialect().update(form_id, submission_id, values);
        let result = self.db.execute(backend.build(&stmt)).await?;
        debug!(form_id, submission_id, rows = result.rows_affected(), "Updated submission row");
        Ok(())
    }

    async fn delete(&self, form_id: FormId, submission_ids: &[SubmissionId]) -> Result<u64> {
        if submission_ids.is_empty() {
            return Ok(0);
        }
        let backend = self.db.get_database_backend();
        let stmt = self.dialect().delete(form_id, submission_ids);
        let result = self.db.execute(backend.build(&stmt)).await?;
        Ok(result.rows_affected())
    }

    async fn exists(&self, form_id: FormId, submission_id: SubmissionId) -> Result<bool> {
        Ok(self
            .count(form_id, &Predicate::IdEquals(submission_id))
            .await?
            > 0)
    }
}
