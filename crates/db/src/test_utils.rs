//! Postgres fixtures for integration tests.
//!
//! Connection settings come from `TEST_DB_*` environment variables. Each
//! [`TestDatabase`] can own a throwaway database so tests run in parallel.

use std::sync::Arc;

use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::migrations::Migrator;
use crate::repositories::{AdminAccountRepository, NgoProfileRepository, ReportRepository};

/// Tables owned by the schema, children first.
const TABLES: [&str; 3] = ["report", "profiles", "admin_account"];

/// Test database connection settings.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: env_or("TEST_DB_HOST", "localhost"),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: env_or("TEST_DB_USER", "pawlink_test"),
            password: env_or("TEST_DB_PASSWORD", "pawlink_test"),
            database: env_or("TEST_DB_NAME", "pawlink_test"),
        }
    }
}

impl TestDbConfig {
    /// URL of the configured database.
    #[must_use]
    pub fn database_url(&self) -> String {
        self.url_for(&self.database)
    }

    /// URL of the maintenance database used to create and drop test databases.
    #[must_use]
    pub fn postgres_url(&self) -> String {
        self.url_for("postgres")
    }

    fn url_for(&self, database: &str) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{database}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// A migrated test database.
pub struct TestDatabase {
    pub conn: Arc<DatabaseConnection>,
    pub config: TestDbConfig,
}

impl TestDatabase {
    /// Connect to the configured database and migrate it.
    pub async fn new() -> Result<Self, DbErr> {
        Self::with_config(TestDbConfig::default()).await
    }

    /// Connect with explicit settings and migrate.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to test database");
        Ok(Self {
            conn: Arc::new(conn),
            config,
        })
    }

    /// Create a fresh, uniquely named database and migrate it.
    pub async fn create_unique() -> Result<Self, DbErr> {
        let mut config = TestDbConfig::default();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        config.database = format!("pawlink_test_{}", &suffix[..8]);

        let admin = Database::connect(&config.postgres_url()).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{}\"", config.database),
            ))
            .await?;
        admin.close().await?;

        Self::with_config(config).await
    }

    /// Shared connection handle.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Repositories bound to this database.
    #[must_use]
    pub fn repositories(
        &self,
    ) -> (ReportRepository, NgoProfileRepository, AdminAccountRepository) {
        (
            ReportRepository::new(self.connection()),
            NgoProfileRepository::new(self.connection()),
            AdminAccountRepository::new(self.connection()),
        )
    }

    /// Delete all rows, keeping the schema.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        let sql = format!("TRUNCATE TABLE {} CASCADE", TABLES.join(", "));
        self.conn
            .execute(Statement::from_string(DatabaseBackend::Postgres, sql))
            .await?;
        Ok(())
    }

    /// Drop a database created by [`Self::create_unique`].
    pub async fn drop_database(self) -> Result<(), DbErr> {
        let Self { conn, config } = self;
        drop(conn);

        let admin = Database::connect(&config.postgres_url()).await?;
        // Stray pool connections would block the drop
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!(
                    "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}'",
                    config.database
                ),
            ))
            .await
            .ok();
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("DROP DATABASE IF EXISTS \"{}\"", config.database),
            ))
            .await?;
        admin.close().await?;

        info!(database = %config.database, "Dropped test database");
        Ok(())
    }
}
