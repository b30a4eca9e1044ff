//! Project slugs: nullable and non-unique at first, then backfilled and made
//! unique.

use async_trait::async_trait;
use campus_core::errors::CampusResult;
use campus_core::migration::{MigrationKind, MigrationStep, MigrationUnit};
use tracing::info;

use super::{MigrationContext, PgTransaction, Sql};
use crate::repositories::project;

pub const INITIAL: &str = "projects.0001_initial";
pub const POPULATE_SLUGS: &str = "projects.0002_populate_slugs";
pub const UNIQUE_SLUG: &str = "projects.0003_unique_slug";

pub fn units() -> Vec<MigrationUnit<MigrationContext>> {
    vec![
        MigrationUnit::new(
            INITIAL,
            Sql::forward([r#"
                CREATE TABLE projects (
                    id BIGSERIAL PRIMARY KEY,
                    title VARCHAR(255) NOT NULL,
                    slug VARCHAR(255) NULL,
                    description TEXT NOT NULL DEFAULT '',
                    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
                )
                "#])
            .backward(["DROP TABLE projects"]),
        )
        .kind(MigrationKind::IntroduceRelaxed),
        MigrationUnit::new(POPULATE_SLUGS, PopulateSlugs)
            .depends_on([INITIAL])
            .kind(MigrationKind::Backfill),
        MigrationUnit::new(
            UNIQUE_SLUG,
            Sql::forward([
                "ALTER TABLE projects ALTER COLUMN slug SET NOT NULL",
                "ALTER TABLE projects ADD CONSTRAINT projects_slug_key UNIQUE (slug)",
            ])
            .backward([
                "ALTER TABLE projects DROP CONSTRAINT projects_slug_key",
                "ALTER TABLE projects ALTER COLUMN slug DROP NOT NULL",
            ]),
        )
        .depends_on([POPULATE_SLUGS])
        .kind(MigrationKind::Tighten),
    ]
}

pub struct PopulateSlugs;

#[async_trait]
impl MigrationStep<MigrationContext> for PopulateSlugs {
    async fn forward(&self, _ctx: &MigrationContext, tx: &mut PgTransaction) -> CampusResult<()> {
        let changed = project::populate_slugs(&mut **tx).await?;
        info!("Wrote slugs for {} project(s)", changed);
        Ok(())
    }

    async fn backward(&self, _ctx: &MigrationContext, _tx: &mut PgTransaction) -> CampusResult<()> {
        Ok(())
    }
}
