//! PostgreSQL Directory Adapter

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{
    BatchId, DomainPort, HealthCheckResult, HealthCheckable, InstituteId, PortError, StudentId,
    UserId,
};
use domain_fees::{BatchProfile, DirectoryPort, StudentProfile};

use crate::error::db_to_port_error;
use crate::repositories::directory::{BatchRow, DirectoryRepository, StudentRow};

/// PostgreSQL-backed implementation of `DirectoryPort`
#[derive(Debug, Clone)]
pub struct PostgresDirectoryAdapter {
    repository: DirectoryRepository,
    pool: PgPool,
}

impl PostgresDirectoryAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: DirectoryRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresDirectoryAdapter {}

#[async_trait]
impl HealthCheckable for PostgresDirectoryAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, "postgres-directory-adapter").await
    }
}

#[async_trait]
impl DirectoryPort for PostgresDirectoryAdapter {
    #[instrument(skip(self), fields(student_id = %id))]
    async fn find_student(&self, id: StudentId) -> Result<Option<StudentProfile>, PortError> {
        let row = self
            .repository
            .find_student(id.into())
            .await
            .map_err(db_to_port_error)?;
        Ok(row.map(row_to_student))
    }

    #[instrument(skip(self), fields(batch_id = %id))]
    async fn find_batch(&self, id: BatchId) -> Result<Option<BatchProfile>, PortError> {
        let row = self
            .repository
            .find_batch(id.into())
            .await
            .map_err(db_to_port_error)?;
        Ok(row.map(row_to_batch))
    }

    async fn list_students(&self, institute_id: InstituteId) -> Result<Vec<StudentProfile>, PortError> {
        let rows = self
            .repository
            .list_students(institute_id.into())
            .await
            .map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(row_to_student).collect())
    }

    async fn list_batches(&self, institute_id: InstituteId) -> Result<Vec<BatchProfile>, PortError> {
        let rows = self
            .repository
            .list_batches(institute_id.into())
            .await
            .map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(row_to_batch).collect())
    }

    async fn list_student_batches(&self, student_id: StudentId) -> Result<Vec<BatchId>, PortError> {
        let ids = self
            .repository
            .student_batch_ids(student_id.into())
            .await
            .map_err(db_to_port_error)?;
        Ok(ids.into_iter().map(BatchId::from).collect())
    }
}

fn row_to_student(row: StudentRow) -> StudentProfile {
    StudentProfile {
        id: StudentId::from(row.id),
        institute_id: InstituteId::from(row.institute_id),
        user_id: row.user_id.map(UserId::from),
        full_name: row.full_name,
        email: row.email,
    }
}

fn row_to_batch(row: BatchRow) -> BatchProfile {
    BatchProfile {
        id: BatchId::from(row.id),
        institute_id: InstituteId::from(row.institute_id),
        name: row.name,
        course: row.course,
    }
}
