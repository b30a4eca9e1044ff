//! The concrete migration manifest.
//!
//! Units are named `<app>.<NNNN>_<label>`. Each app module contributes its units
//! through `units()`; [`manifest`] collects them. Statements of one unit and its
//! `schema_migrations` row commit in a single transaction.

pub mod appointments;
pub mod emis;
pub mod projects;
pub mod publishing;

use async_trait::async_trait;
use campus_core::errors::CampusResult;
use campus_core::migration::{Manifest, MigrationLedger, MigrationStep};
use campus_core::reference::ReferenceAllocator;
use chrono_tz::Tz;
use sqlx::{PgConnection, Postgres};
use tracing::debug;

use crate::models::DbMigrationRecord;
use crate::{DbPool, to_campus_error};

pub type PgTransaction = sqlx::Transaction<'static, Postgres>;

/// Everything a migration unit may need at run time.
#[derive(Debug, Clone)]
pub struct MigrationContext {
    pub pool: DbPool,
    pub time_zone: Tz,
    pub allocator: ReferenceAllocator,
}

impl MigrationContext {
    pub fn new(pool: DbPool, time_zone: Tz) -> Self {
        Self {
            pool,
            time_zone,
            allocator: ReferenceAllocator::default(),
        }
    }

    pub fn with_allocator(mut self, allocator: ReferenceAllocator) -> Self {
        self.allocator = allocator;
        self
    }
}

#[async_trait]
impl MigrationLedger for MigrationContext {
    type Transaction = PgTransaction;

    async fn applied_migrations(&self) -> CampusResult<Vec<String>> {
        let records = sqlx::query_as::<_, DbMigrationRecord>(
            r#"
            SELECT name, applied_at
            FROM schema_migrations
            ORDER BY applied_at ASC, name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(to_campus_error)?;

        Ok(records.into_iter().map(|record| record.name).collect())
    }

    async fn begin(&self) -> CampusResult<PgTransaction> {
        self.pool.begin().await.map_err(to_campus_error)
    }

    async fn record_applied(&self, tx: &mut PgTransaction, name: &str) -> CampusResult<()> {
        sqlx::query(
            r#"
            INSERT INTO schema_migrations (name, applied_at)
            VALUES ($1, clock_timestamp())
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(name)
        .execute(&mut **tx)
        .await
        .map_err(to_campus_error)?;

        Ok(())
    }

    async fn record_reverted(&self, tx: &mut PgTransaction, name: &str) -> CampusResult<()> {
        sqlx::query("DELETE FROM schema_migrations WHERE name = $1")
            .bind(name)
            .execute(&mut **tx)
            .await
            .map_err(to_campus_error)?;

        Ok(())
    }

    async fn commit(&self, tx: PgTransaction) -> CampusResult<()> {
        tx.commit().await.map_err(to_campus_error)
    }
}

/// Plain SQL in both directions.
#[derive(Debug, Clone, Default)]
pub struct Sql {
    forward: Vec<String>,
    backward: Vec<String>,
}

impl Sql {
    pub fn forward<I, S>(statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            forward: statements.into_iter().map(Into::into).collect(),
            backward: Vec::new(),
        }
    }

    pub fn backward<I, S>(mut self, statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backward = statements.into_iter().map(Into::into).collect();
        self
    }
}

pub(crate) async fn execute_all<S: AsRef<str>>(
    conn: &mut PgConnection,
    statements: &[S],
) -> CampusResult<()> {
    for statement in statements {
        let statement = statement.as_ref();
        debug!("Executing: {}", statement.trim());
        sqlx::query(statement)
            .execute(&mut *conn)
            .await
            .map_err(to_campus_error)?;
    }
    Ok(())
}

#[async_trait]
impl MigrationStep<MigrationContext> for Sql {
    async fn forward(&self, _ctx: &MigrationContext, tx: &mut PgTransaction) -> CampusResult<()> {
        execute_all(&mut **tx, &self.forward).await
    }

    async fn backward(&self, _ctx: &MigrationContext, tx: &mut PgTransaction) -> CampusResult<()> {
        execute_all(&mut **tx, &self.backward).await
    }
}

/// All migration units of the backend.
pub fn manifest() -> Manifest<MigrationContext> {
    let mut manifest = Manifest::new();
    for unit in appointments::units()
        .into_iter()
        .chain(publishing::units())
        .chain(emis::units())
        .chain(projects::units())
    {
        manifest.push(unit);
    }
    manifest
}
