//! Database Test Utilities
//!
//! Starts a throwaway PostgreSQL container, applies the embedded migrations
//! and seeds directory rows that the API has no endpoints for.

use sqlx::PgPool;
use std::sync::Arc;
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use core_kernel::{BatchId, InstituteId, StudentId};
use infra_db::{create_pool, run_migrations, DatabaseConfig};

const POSTGRES_TAG: &str = "16-alpine";
const POSTGRES_USER: &str = "postgres";
const POSTGRES_PASSWORD: &str = "postgres";
const POSTGRES_DB: &str = "postgres";

pub type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Connection settings of a test database
#[derive(Debug, Clone)]
pub struct TestDatabaseConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl Default for TestDatabaseConfig {
    fn default() -> Self {
        Self {
            user: POSTGRES_USER.to_string(),
            password: POSTGRES_PASSWORD.to_string(),
            database: POSTGRES_DB.to_string(),
            host: "localhost".to_string(),
            port: 5432,
        }
    }
}

impl TestDatabaseConfig {
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// A migrated PostgreSQL container
pub struct TestDatabase {
    _container: ContainerAsync<Postgres>,
    pub config: TestDatabaseConfig,
    pub pool: PgPool,
}

impl TestDatabase {
    pub async fn new() -> TestResult<Self> {
        let container = Postgres::default().with_tag(POSTGRES_TAG).start().await?;

        let config = TestDatabaseConfig {
            host: container.get_host().await?.to_string(),
            port: container.get_host_port_ipv4(5432).await?,
            ..Default::default()
        };

        let pool = create_pool(DatabaseConfig::new(config.connection_url()).max_connections(5)).await?;
        run_migrations(&pool).await?;

        Ok(Self {
            _container: container,
            config,
            pool,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Deletes every row while keeping the schema
    pub async fn clear_data(&self) -> TestResult<()> {
        let tables = [
            "notifications",
            "reminder_rules",
            "payments",
            "student_fees",
            "student_batches",
            "batches",
            "students",
            "institutes",
        ];

        for table in tables {
            sqlx::query(&format!("TRUNCATE TABLE {} CASCADE", table))
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    pub async fn seed_institute(&self, name: &str) -> TestResult<InstituteId> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO institutes (id, name) VALUES ($1, $2)")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(InstituteId::from(id))
    }

    pub async fn seed_student(&self, institute_id: InstituteId, full_name: &str) -> TestResult<StudentId> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO students (id, institute_id, full_name) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(Uuid::from(institute_id))
            .bind(full_name)
            .execute(&self.pool)
            .await?;
        Ok(StudentId::from(id))
    }

    pub async fn seed_batch(&self, institute_id: InstituteId, name: &str) -> TestResult<BatchId> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO batches (id, institute_id, name) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(Uuid::from(institute_id))
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(BatchId::from(id))
    }

    pub async fn enroll(&self, student_id: StudentId, batch_id: BatchId) -> TestResult<()> {
        sqlx::query("INSERT INTO student_batches (student_id, batch_id) VALUES ($1, $2)")
            .bind(Uuid::from(student_id))
            .bind(Uuid::from(batch_id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

static SHARED_TEST_DB: OnceCell<Arc<TestDatabase>> = OnceCell::const_new();

/// A container shared by every test in the binary
///
/// # Panics
///
/// Panics if the container cannot be started.
pub async fn get_shared_test_database() -> Arc<TestDatabase> {
    SHARED_TEST_DB
        .get_or_init(|| async {
            Arc::new(
                TestDatabase::new()
                    .await
                    .expect("Failed to create shared test database"),
            )
        })
        .await
        .clone()
}

/// A container owned by a single test
pub async fn create_isolated_test_database() -> TestResult<TestDatabase> {
    TestDatabase::new().await
}
