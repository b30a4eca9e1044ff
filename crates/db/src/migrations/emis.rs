//! EMIS downloads: the category remap from `report_form`/`resource` to
//! `reports`/`forms`/`downloads`.

use async_trait::async_trait;
use campus_core::errors::CampusResult;
use campus_core::migration::{MigrationKind, MigrationStep, MigrationUnit, Reversibility};
use campus_core::models::emis::{EmisCategory, backward_pairs, forward_pairs};
use tracing::info;

use super::{MigrationContext, PgTransaction, Sql};
use crate::repositories::emis;

pub const INITIAL: &str = "emis.0001_initial";
pub const REMAP_CATEGORIES: &str = "emis.0002_remap_categories";
pub const CATEGORY_CONSTRAINT: &str = "emis.0003_category_constraint";

pub const REMAP_LOSS: &str =
    "forms has no predecessor category; those rows keep the value forms after rollback";

pub fn units() -> Vec<MigrationUnit<MigrationContext>> {
    let allowed = EmisCategory::ALL
        .iter()
        .map(|category| format!("'{}'", category.as_str()))
        .collect::<Vec<_>>()
        .join(", ");

    vec![
        MigrationUnit::new(
            INITIAL,
            Sql::forward([r#"
                CREATE TABLE emis_downloads (
                    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                    title VARCHAR(255) NOT NULL,
                    file_url VARCHAR(500) NOT NULL,
                    category VARCHAR(20) NOT NULL DEFAULT 'resource',
                    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
                )
                "#])
            .backward(["DROP TABLE emis_downloads"]),
        ),
        MigrationUnit::new(REMAP_CATEGORIES, RemapCategories)
            .depends_on([INITIAL])
            .kind(MigrationKind::Remap)
            .reversibility(Reversibility::Lossy(REMAP_LOSS)),
        MigrationUnit::new(
            CATEGORY_CONSTRAINT,
            Sql::forward([
                "ALTER TABLE emis_downloads ALTER COLUMN category SET DEFAULT 'downloads'".to_string(),
                format!(
                    "ALTER TABLE emis_downloads ADD CONSTRAINT emis_downloads_category_check CHECK (category IN ({allowed}))"
                ),
            ])
            .backward([
                "ALTER TABLE emis_downloads DROP CONSTRAINT emis_downloads_category_check",
                "ALTER TABLE emis_downloads ALTER COLUMN category SET DEFAULT 'resource'",
            ]),
        )
        .depends_on([REMAP_CATEGORIES])
        .kind(MigrationKind::Tighten),
    ]
}

pub struct RemapCategories;

#[async_trait]
impl MigrationStep<MigrationContext> for RemapCategories {
    async fn forward(&self, _ctx: &MigrationContext, tx: &mut PgTransaction) -> CampusResult<()> {
        let moved = emis::remap_categories(&mut **tx, &forward_pairs()).await?;
        info!("Remapped {} EMIS download(s) to the new categories", moved);
        Ok(())
    }

    async fn backward(&self, _ctx: &MigrationContext, tx: &mut PgTransaction) -> CampusResult<()> {
        let moved = emis::remap_categories(&mut **tx, &backward_pairs()).await?;
        info!("Restored {} EMIS download(s) to legacy categories", moved);
        Ok(())
    }
}
