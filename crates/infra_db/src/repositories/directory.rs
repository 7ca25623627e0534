//! Student and batch lookups

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Read-only repository over `students`, `batches` and `student_batches`
#[derive(Debug, Clone)]
pub struct DirectoryRepository {
    pool: PgPool,
}

impl DirectoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_student(&self, id: Uuid) -> Result<Option<StudentRow>, DatabaseError> {
        let row = sqlx::query_as::<_, StudentRow>(
            "SELECT id, institute_id, user_id, full_name, email FROM students WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn find_batch(&self, id: Uuid) -> Result<Option<BatchRow>, DatabaseError> {
        let row = sqlx::query_as::<_, BatchRow>(
            "SELECT id, institute_id, name, course FROM batches WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Students of an institute by name
    pub async fn list_students(&self, institute_id: Uuid) -> Result<Vec<StudentRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, StudentRow>(
            r#"
            SELECT id, institute_id, user_id, full_name, email
            FROM students
            WHERE institute_id = $1
            ORDER BY full_name ASC
            "#,
        )
        .bind(institute_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Batches of an institute by name
    pub async fn list_batches(&self, institute_id: Uuid) -> Result<Vec<BatchRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT id, institute_id, name, course
            FROM batches
            WHERE institute_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(institute_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn student_batch_ids(&self, student_id: Uuid) -> Result<Vec<Uuid>, DatabaseError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT batch_id FROM student_batches WHERE student_id = $1",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}

/// Database row for `students`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StudentRow {
    pub id: Uuid,
    pub institute_id: Uuid,
    pub user_id: Option<Uuid>,
    pub full_name: String,
    pub email: Option<String>,
}

/// Database row for `batches`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BatchRow {
    pub id: Uuid,
    pub institute_id: Uuid,
    pub name: String,
    pub course: Option<String>,
}
