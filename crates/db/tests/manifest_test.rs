use std::collections::HashSet;

use campus_core::errors::CampusError;
use campus_core::migration::{Manifest, MigrationKind, MigrationUnit, Noop, Reversibility};
use campus_db::migrations::{appointments, emis, manifest, projects, publishing};
use campus_db::mock::repositories::MockMigrationLedger;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn names(applied: &[&str]) -> HashSet<String> {
    applied.iter().map(|name| name.to_string()).collect()
}

#[test]
fn test_fresh_database_plans_every_unit() {
    let manifest = manifest();
    let plan = manifest.plan(&HashSet::new()).unwrap();

    assert_eq!(plan.len(), 21);
    assert_eq!(plan[0].name(), appointments::INITIAL);
}

#[rstest]
#[case(appointments::ADD_REFERENCE_ID, appointments::POPULATE_REFERENCE_ID, appointments::UNIQUE_REFERENCE_ID)]
#[case(appointments::ADD_DATETIME, appointments::POPULATE_DATETIME, appointments::REQUIRE_DATETIME)]
#[case(projects::INITIAL, projects::POPULATE_SLUGS, projects::UNIQUE_SLUG)]
fn test_relaxed_backfill_tighten_run_in_order(
    #[case] relaxed: &str,
    #[case] backfill: &str,
    #[case] tighten: &str,
) {
    let manifest = manifest();
    let plan: Vec<&str> = manifest
        .plan(&HashSet::new())
        .unwrap()
        .into_iter()
        .map(|unit| unit.name())
        .collect();
    let at = |name: &str| plan.iter().position(|planned| *planned == name).unwrap();

    assert!(at(relaxed) < at(backfill));
    assert!(at(backfill) < at(tighten));

    assert_eq!(manifest.get(relaxed).unwrap().migration_kind(), MigrationKind::IntroduceRelaxed);
    assert_eq!(manifest.get(backfill).unwrap().migration_kind(), MigrationKind::Backfill);
    assert_eq!(
        manifest.get(backfill).unwrap().migration_reversibility(),
        Reversibility::DataNoop
    );
    assert_eq!(manifest.get(tighten).unwrap().migration_kind(), MigrationKind::Tighten);
}

#[test]
fn test_emis_remap_is_marked_lossy() {
    let manifest = manifest();
    let remap = manifest.get(emis::REMAP_CATEGORIES).unwrap();

    assert_eq!(remap.migration_kind(), MigrationKind::Remap);
    assert!(matches!(
        remap.migration_reversibility(),
        Reversibility::Lossy(note) if note.contains("forms")
    ));
}

#[test]
fn test_notices_follow_departments() {
    let manifest = manifest();
    let plan: Vec<&str> = manifest
        .plan(&HashSet::new())
        .unwrap()
        .into_iter()
        .map(|unit| unit.name())
        .collect();
    let at = |name: &str| plan.iter().position(|planned| *planned == name).unwrap();

    assert!(at(publishing::DEPARTMENTS_INITIAL) < at(publishing::NOTICES_INITIAL));
    assert!(at(publishing::NOTICES_INITIAL) < at(publishing::NOTICE_APPROVAL));
}

#[test]
fn test_partially_migrated_database_plans_the_rest() {
    let manifest = manifest();
    let applied = names(&[
        appointments::INITIAL,
        appointments::STATUS,
        appointments::ADD_REFERENCE_ID,
    ]);

    let plan = manifest.plan(&applied).unwrap();

    assert_eq!(plan.len(), 18);
    assert!(plan.iter().all(|unit| !applied.contains(unit.name())));
}

#[test]
fn test_ledger_with_gap_is_refused() {
    let manifest = manifest();
    let applied = names(&[appointments::INITIAL, appointments::ADD_REFERENCE_ID]);

    assert!(matches!(
        manifest.plan(&applied),
        Err(CampusError::MigrationDependencyUnmet { .. })
    ));
}

#[test]
fn test_rolling_back_the_datetime_backfill_also_reverts_the_tighten() {
    let manifest = manifest();
    let applied: HashSet<String> = manifest
        .units()
        .iter()
        .map(|unit| unit.name().to_string())
        .collect();

    let plan: Vec<&str> = manifest
        .rollback_plan(&applied, appointments::POPULATE_DATETIME)
        .unwrap()
        .into_iter()
        .map(|unit| unit.name())
        .collect();

    assert_eq!(
        plan,
        vec![appointments::REQUIRE_DATETIME, appointments::POPULATE_DATETIME]
    );
}

#[tokio::test]
async fn test_migrate_records_each_unit_through_the_ledger() {
    let manifest = Manifest::new()
        .unit(MigrationUnit::new("a.0001_initial", Noop))
        .unit(
            MigrationUnit::new("a.0002_flags", Noop)
                .depends_on(["a.0001_initial"]),
        );

    let mut ledger = MockMigrationLedger::new();
    ledger
        .expect_applied_migrations()
        .times(1)
        .returning(|| Ok(vec!["a.0001_initial".to_string()]));
    ledger.expect_begin().times(1).returning(|| Ok(()));
    ledger
        .expect_record_applied()
        .withf(|_, name| name == "a.0002_flags")
        .times(1)
        .returning(|_, _| Ok(()));
    ledger.expect_commit().times(1).returning(|_| Ok(()));

    let report = manifest.migrate(&ledger).await.unwrap();

    assert_eq!(report.applied, vec!["a.0002_flags"]);
}

#[tokio::test]
async fn test_ledger_failure_stops_the_run() {
    let manifest = Manifest::new()
        .unit(MigrationUnit::new("a.0001_initial", Noop))
        .unit(
            MigrationUnit::new("a.0002_flags", Noop)
                .depends_on(["a.0001_initial"]),
        );

    let mut ledger = MockMigrationLedger::new();
    ledger.expect_applied_migrations().returning(|| Ok(Vec::new()));
    ledger.expect_begin().times(1).returning(|| Ok(()));
    ledger
        .expect_record_applied()
        .times(1)
        .returning(|_, _| Err(CampusError::Database(eyre::eyre!("ledger is read-only"))));
    // The unit's work is only kept if the ledger row commits with it.
    ledger.expect_commit().never();

    let err = manifest.migrate(&ledger).await.unwrap_err();

    assert!(matches!(err, CampusError::Database(_)));
}

#[tokio::test]
async fn test_rollback_deletes_the_ledger_row_in_the_unit_transaction() {
    let manifest = Manifest::new().unit(MigrationUnit::new("a.0001_initial", Noop));

    let mut ledger = MockMigrationLedger::new();
    ledger
        .expect_applied_migrations()
        .returning(|| Ok(vec!["a.0001_initial".to_string()]));
    ledger.expect_begin().times(1).returning(|| Ok(()));
    ledger
        .expect_record_reverted()
        .withf(|_, name| name == "a.0001_initial")
        .times(1)
        .returning(|_, _| Ok(()));
    ledger.expect_commit().times(1).returning(|_| Ok(()));

    let report = manifest.rollback(&ledger, "a.0001_initial").await.unwrap();

    assert_eq!(report.reverted, vec!["a.0001_initial"]);
}
