use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use campus_core::errors::{CampusError, CampusResult};
use campus_core::migration::{
    Manifest, MigrationKind, MigrationLedger, MigrationStep, MigrationUnit, Noop, Reversibility,
};

/// Records every operation run against it, plus the ledger. Nothing a unit does
/// is visible until its transaction commits.
#[derive(Default)]
struct Journal {
    log: Mutex<Vec<String>>,
    applied: Mutex<Vec<String>>,
    failing_ledger_writes: Mutex<usize>,
}

#[derive(Default)]
struct Pending {
    log: Vec<String>,
    applied: Vec<String>,
    reverted: Vec<String>,
}

impl Journal {
    fn with_applied(names: &[&str]) -> Self {
        let journal = Self::default();
        journal
            .applied
            .lock()
            .unwrap()
            .extend(names.iter().map(|name| name.to_string()));
        journal
    }

    /// The next `count` ledger writes fail.
    fn with_failing_ledger_writes(count: usize) -> Self {
        let journal = Self::default();
        *journal.failing_ledger_writes.lock().unwrap() = count;
        journal
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn applied(&self) -> Vec<String> {
        self.applied.lock().unwrap().clone()
    }

    fn ledger_write(&self) -> CampusResult<()> {
        let mut failing = self.failing_ledger_writes.lock().unwrap();
        if *failing > 0 {
            *failing -= 1;
            return Err(CampusError::Database(eyre::eyre!("connection lost")));
        }
        Ok(())
    }
}

#[async_trait]
impl MigrationLedger for Journal {
    type Transaction = Pending;

    async fn applied_migrations(&self) -> CampusResult<Vec<String>> {
        Ok(self.applied())
    }

    async fn begin(&self) -> CampusResult<Pending> {
        Ok(Pending::default())
    }

    async fn record_applied(&self, tx: &mut Pending, name: &str) -> CampusResult<()> {
        self.ledger_write()?;
        tx.applied.push(name.to_string());
        Ok(())
    }

    async fn record_reverted(&self, tx: &mut Pending, name: &str) -> CampusResult<()> {
        self.ledger_write()?;
        tx.reverted.push(name.to_string());
        Ok(())
    }

    async fn commit(&self, tx: Pending) -> CampusResult<()> {
        self.log.lock().unwrap().extend(tx.log);
        let mut applied = self.applied.lock().unwrap();
        applied.extend(tx.applied);
        applied.retain(|name| !tx.reverted.contains(name));
        Ok(())
    }
}

struct Record(&'static str);

#[async_trait]
impl MigrationStep<Journal> for Record {
    async fn forward(&self, _ctx: &Journal, tx: &mut Pending) -> CampusResult<()> {
        tx.log.push(format!("+{}", self.0));
        Ok(())
    }

    async fn backward(&self, _ctx: &Journal, tx: &mut Pending) -> CampusResult<()> {
        tx.log.push(format!("-{}", self.0));
        Ok(())
    }
}

/// Like `ALTER TABLE .. ADD COLUMN`: refuses to run forward twice.
struct AddColumn(&'static str);

#[async_trait]
impl MigrationStep<Journal> for AddColumn {
    async fn forward(&self, ctx: &Journal, tx: &mut Pending) -> CampusResult<()> {
        let entry = format!("+{}", self.0);
        if ctx.log().contains(&entry) {
            return Err(CampusError::Database(eyre::eyre!(
                "column {} already exists",
                self.0
            )));
        }
        tx.log.push(entry);
        Ok(())
    }

    async fn backward(&self, ctx: &Journal, tx: &mut Pending) -> CampusResult<()> {
        let entry = format!("-{}", self.0);
        if ctx.log().contains(&entry) {
            return Err(CampusError::Database(eyre::eyre!(
                "column {} does not exist",
                self.0
            )));
        }
        tx.log.push(entry);
        Ok(())
    }
}

struct Failing;

#[async_trait]
impl MigrationStep<Journal> for Failing {
    async fn forward(&self, _ctx: &Journal, _tx: &mut Pending) -> CampusResult<()> {
        Err(CampusError::Database(eyre::eyre!("row 17 could not be written")))
    }

    async fn backward(&self, _ctx: &Journal, _tx: &mut Pending) -> CampusResult<()> {
        Ok(())
    }
}

fn unit(name: &'static str, deps: &[&'static str]) -> MigrationUnit<Journal> {
    MigrationUnit::new(name, Record(name)).depends_on(deps.iter().copied())
}

/// Declared out of order on purpose.
fn shuffled_manifest() -> Manifest<Journal> {
    Manifest::new()
        .unit(unit("a.0003_tighten", &["a.0002_backfill"]))
        .unit(unit("b.0001_initial", &[]))
        .unit(unit("a.0002_backfill", &["a.0001_relaxed"]).kind(MigrationKind::Backfill))
        .unit(unit("b.0002_flags", &["b.0001_initial", "a.0001_relaxed"]))
        .unit(unit("a.0001_relaxed", &[]))
}

fn position(log: &[String], entry: &str) -> usize {
    log.iter()
        .position(|line| line == entry)
        .unwrap_or_else(|| panic!("{} not in {:?}", entry, log))
}

#[tokio::test]
async fn test_migrate_runs_units_in_dependency_order() {
    let manifest = shuffled_manifest();
    let journal = Journal::default();

    let report = manifest.migrate(&journal).await.unwrap();
    let log = journal.log();

    assert_eq!(report.applied.len(), 5);
    assert_eq!(log.len(), 5);
    for unit in manifest.units() {
        for dependency in unit.dependencies() {
            assert!(
                position(&log, &format!("+{}", dependency))
                    < position(&log, &format!("+{}", unit.name())),
                "{} ran before its dependency {}",
                unit.name(),
                dependency
            );
        }
    }
    // Ties go to declaration order.
    assert_eq!(
        log,
        vec![
            "+b.0001_initial",
            "+a.0001_relaxed",
            "+a.0002_backfill",
            "+a.0003_tighten",
            "+b.0002_flags",
        ]
    );
}

#[tokio::test]
async fn test_second_run_is_a_noop() {
    let manifest = shuffled_manifest();
    let journal = Journal::default();

    manifest.migrate(&journal).await.unwrap();
    let report = manifest.migrate(&journal).await.unwrap();

    assert!(report.applied.is_empty());
    assert_eq!(journal.log().len(), 5);
}

#[tokio::test]
async fn test_resume_after_partial_run() {
    let manifest = shuffled_manifest();
    let journal = Journal::with_applied(&["a.0001_relaxed", "b.0001_initial"]);

    let report = manifest.migrate(&journal).await.unwrap();

    assert_eq!(
        report.applied,
        vec!["a.0002_backfill", "a.0003_tighten", "b.0002_flags"]
    );
}

#[tokio::test]
async fn test_missing_dependency_refuses_before_any_mutation() {
    let manifest = shuffled_manifest().unit(unit("c.0001_initial", &["c.0000_missing"]));
    let journal = Journal::default();

    let err = manifest.migrate(&journal).await.unwrap_err();

    match err {
        CampusError::MigrationDependencyUnmet {
            migration,
            dependency,
        } => {
            assert_eq!(migration, "c.0001_initial");
            assert_eq!(dependency, "c.0000_missing");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(journal.log().is_empty());
    assert!(journal.applied().is_empty());
}

#[test]
fn test_dependency_satisfied_by_ledger_only() {
    let manifest = Manifest::new().unit(unit("c.0002_next", &["c.0001_squashed"]));
    let applied: HashSet<String> = ["c.0001_squashed".to_string()].into();

    let plan = manifest.plan(&applied).unwrap();
    assert_eq!(plan.len(), 1);
    assert!(manifest.plan(&HashSet::new()).is_err());
}

#[test]
fn test_cycles_are_rejected() {
    let manifest = Manifest::new()
        .unit(unit("x", &["z"]))
        .unit(unit("y", &["x"]))
        .unit(unit("z", &["y"]))
        .unit(unit("free", &[]));

    let err = manifest.plan(&HashSet::new()).unwrap_err();
    match err {
        CampusError::MigrationCycle(names) => assert_eq!(names, vec!["x", "y", "z"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_duplicate_names_are_rejected() {
    let manifest = Manifest::new().unit(unit("x", &[])).unit(unit("x", &[]));

    assert!(matches!(
        manifest.plan(&HashSet::new()),
        Err(CampusError::Validation(_))
    ));
}

#[test]
fn test_inconsistent_ledger_is_rejected() {
    let manifest = shuffled_manifest();
    let applied: HashSet<String> = ["a.0003_tighten".to_string()].into();

    assert!(matches!(
        manifest.plan(&applied),
        Err(CampusError::MigrationDependencyUnmet { .. })
    ));
}

#[tokio::test]
async fn test_backfill_failure_aborts_and_is_not_recorded() {
    let manifest = Manifest::new()
        .unit(unit("a.0001_relaxed", &[]))
        .unit(
            MigrationUnit::new("a.0002_backfill", Failing)
                .depends_on(["a.0001_relaxed"])
                .kind(MigrationKind::Backfill),
        )
        .unit(unit("a.0003_tighten", &["a.0002_backfill"]));
    let journal = Journal::default();

    let err = manifest.migrate(&journal).await.unwrap_err();

    assert!(matches!(
        err,
        CampusError::MigrationBackfill { ref migration, .. } if migration == "a.0002_backfill"
    ));
    assert_eq!(journal.applied(), vec!["a.0001_relaxed"]);
    assert_eq!(journal.log(), vec!["+a.0001_relaxed"]);
}

#[tokio::test]
async fn test_rollback_reverts_dependents_in_reverse_order() {
    let manifest = shuffled_manifest();
    let journal = Journal::default();
    manifest.migrate(&journal).await.unwrap();

    let report = manifest.rollback(&journal, "a.0002_backfill").await.unwrap();

    assert_eq!(report.reverted, vec!["a.0003_tighten", "a.0002_backfill"]);
    assert_eq!(
        journal.applied(),
        vec!["b.0001_initial", "a.0001_relaxed", "b.0002_flags"]
    );
    let log = journal.log();
    assert_eq!(&log[5..], &["-a.0003_tighten", "-a.0002_backfill"]);
}

#[tokio::test]
async fn test_lossy_rollback_is_reported() {
    let manifest = Manifest::new()
        .unit(unit("emis.0001_initial", &[]))
        .unit(
            MigrationUnit::new("emis.0002_remap", Record("emis.0002_remap"))
                .depends_on(["emis.0001_initial"])
                .kind(MigrationKind::Remap)
                .reversibility(Reversibility::Lossy("forms has no predecessor")),
        )
        .unit(
            MigrationUnit::new("emis.0003_noop", Noop)
                .depends_on(["emis.0002_remap"]),
        );
    let journal = Journal::default();
    manifest.migrate(&journal).await.unwrap();

    let report = manifest.rollback(&journal, "emis.0002_remap").await.unwrap();

    assert_eq!(report.reverted, vec!["emis.0003_noop", "emis.0002_remap"]);
    assert_eq!(
        report.lossy,
        vec![("emis.0002_remap".to_string(), "forms has no predecessor")]
    );
}

#[tokio::test]
async fn test_rollback_of_unapplied_unit_is_refused() {
    let manifest = shuffled_manifest();
    let journal = Journal::default();

    assert!(matches!(
        manifest.rollback(&journal, "a.0001_relaxed").await,
        Err(CampusError::Validation(_))
    ));
    assert!(matches!(
        manifest.rollback(&journal, "nope").await,
        Err(CampusError::NotFound(_))
    ));
}

#[test]
fn test_backfill_units_default_to_noop_inverse() {
    let unit = unit("a.0002_backfill", &[]).kind(MigrationKind::Backfill);

    assert_eq!(unit.migration_reversibility(), Reversibility::DataNoop);
}

#[tokio::test]
async fn test_migrate_to_stops_at_target() {
    let manifest = shuffled_manifest();
    let journal = Journal::default();

    let report = manifest.migrate_to(&journal, "a.0002_backfill").await.unwrap();

    assert_eq!(report.applied, vec!["a.0001_relaxed", "a.0002_backfill"]);
    assert_eq!(journal.applied(), vec!["a.0001_relaxed", "a.0002_backfill"]);

    let rest = manifest.migrate(&journal).await.unwrap();
    assert_eq!(
        rest.applied,
        vec!["b.0001_initial", "a.0003_tighten", "b.0002_flags"]
    );
}

#[test]
fn test_plan_to_unknown_unit_is_not_found() {
    let manifest = shuffled_manifest();

    assert!(matches!(
        manifest.plan_to(&HashSet::new(), "c.0001_initial"),
        Err(CampusError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_failed_ledger_write_discards_the_unit_and_rerun_succeeds() {
    let manifest = Manifest::new()
        .unit(MigrationUnit::new("a.0001_add_reference_id", AddColumn("reference_id")))
        .unit(unit("a.0002_backfill", &["a.0001_add_reference_id"]).kind(MigrationKind::Backfill));
    let journal = Journal::with_failing_ledger_writes(1);

    let err = manifest.migrate(&journal).await.unwrap_err();

    assert!(matches!(err, CampusError::Database(_)));
    assert!(journal.applied().is_empty());
    assert!(journal.log().is_empty());

    let report = manifest.migrate(&journal).await.unwrap();

    assert_eq!(report.applied, vec!["a.0001_add_reference_id", "a.0002_backfill"]);
    assert_eq!(journal.log(), vec!["+reference_id", "+a.0002_backfill"]);
}

#[tokio::test]
async fn test_failed_ledger_delete_keeps_the_unit_applied_and_rollback_can_be_retried() {
    let manifest = Manifest::new()
        .unit(MigrationUnit::new("a.0001_add_reference_id", AddColumn("reference_id")));
    let journal = Journal::default();
    manifest.migrate(&journal).await.unwrap();
    *journal.failing_ledger_writes.lock().unwrap() = 1;

    let err = manifest
        .rollback(&journal, "a.0001_add_reference_id")
        .await
        .unwrap_err();

    assert!(matches!(err, CampusError::Database(_)));
    assert_eq!(journal.applied(), vec!["a.0001_add_reference_id"]);

    let report = manifest
        .rollback(&journal, "a.0001_add_reference_id")
        .await
        .unwrap();

    assert_eq!(report.reverted, vec!["a.0001_add_reference_id"]);
    assert!(journal.applied().is_empty());
    assert_eq!(journal.log(), vec!["+reference_id", "-reference_id"]);
}
