//! # Migration harness
//!
//! Schema and data changes are declared as a [`Manifest`] of named units. Each unit
//! names the units it depends on and carries a forward and an inverse operation.
//! The harness plans the whole run before touching anything: unknown dependencies,
//! duplicate names, cycles and an inconsistent ledger all abort up front.
//!
//! Required or unique columns on populated tables are introduced in three units:
//!
//! 1. add the column relaxed (nullable, no constraint),
//! 2. backfill it row by row, touching only that column (inverse is a no-op),
//! 3. tighten it to `NOT NULL` / `UNIQUE`.
//!
//! Backfills only select rows whose target column is still empty, so an
//! interrupted run is resumed by running the harness again.
//!
//! Each unit runs inside one ledger transaction that also carries its ledger
//! entry: a unit is either applied and recorded, or neither.

use std::collections::{HashMap, HashSet};
use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::{CampusError, CampusResult};

/// What a unit does; backfill and remap failures are reported as
/// [`CampusError::MigrationBackfill`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationKind {
    Schema,
    IntroduceRelaxed,
    Backfill,
    Tighten,
    Remap,
}

impl MigrationKind {
    pub fn touches_data(self) -> bool {
        matches!(self, MigrationKind::Backfill | MigrationKind::Remap)
    }
}

impl fmt::Display for MigrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MigrationKind::Schema => "schema",
            MigrationKind::IntroduceRelaxed => "introduce relaxed",
            MigrationKind::Backfill => "backfill",
            MigrationKind::Tighten => "tighten",
            MigrationKind::Remap => "remap",
        };
        f.write_str(label)
    }
}

/// How faithfully a unit's inverse undoes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reversibility {
    Reversible,
    /// The inverse does nothing; data written forward stays.
    DataNoop,
    /// The inverse runs but cannot restore everything.
    Lossy(&'static str),
}

/// Forward and inverse operation of one unit, run against a context `C` inside
/// the transaction the harness opened for the unit.
#[async_trait]
pub trait MigrationStep<C: MigrationLedger>: Send + Sync {
    async fn forward(&self, ctx: &C, tx: &mut C::Transaction) -> CampusResult<()>;

    async fn backward(&self, ctx: &C, tx: &mut C::Transaction) -> CampusResult<()>;
}

/// A step that does nothing in either direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Noop;

#[async_trait]
impl<C: MigrationLedger> MigrationStep<C> for Noop {
    async fn forward(&self, _ctx: &C, _tx: &mut C::Transaction) -> CampusResult<()> {
        Ok(())
    }

    async fn backward(&self, _ctx: &C, _tx: &mut C::Transaction) -> CampusResult<()> {
        Ok(())
    }
}

/// Where applied unit names are recorded.
#[async_trait]
pub trait MigrationLedger: Send + Sync {
    /// Work of one unit plus its ledger entry. Dropping it without
    /// [`MigrationLedger::commit`] discards both.
    type Transaction: Send;

    async fn applied_migrations(&self) -> CampusResult<Vec<String>>;

    async fn begin(&self) -> CampusResult<Self::Transaction>;

    async fn record_applied(&self, tx: &mut Self::Transaction, name: &str) -> CampusResult<()>;

    async fn record_reverted(&self, tx: &mut Self::Transaction, name: &str) -> CampusResult<()>;

    async fn commit(&self, tx: Self::Transaction) -> CampusResult<()>;
}

pub struct MigrationUnit<C: MigrationLedger> {
    name: String,
    dependencies: Vec<String>,
    kind: MigrationKind,
    reversibility: Reversibility,
    step: Box<dyn MigrationStep<C>>,
}

impl<C: MigrationLedger> MigrationUnit<C> {
    pub fn new(name: impl Into<String>, step: impl MigrationStep<C> + 'static) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            kind: MigrationKind::Schema,
            reversibility: Reversibility::Reversible,
            step: Box::new(step),
        }
    }

    pub fn depends_on<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies
            .extend(dependencies.into_iter().map(Into::into));
        self
    }

    pub fn kind(mut self, kind: MigrationKind) -> Self {
        self.kind = kind;
        if kind == MigrationKind::Backfill && self.reversibility == Reversibility::Reversible {
            self.reversibility = Reversibility::DataNoop;
        }
        self
    }

    pub fn reversibility(mut self, reversibility: Reversibility) -> Self {
        self.reversibility = reversibility;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn migration_kind(&self) -> MigrationKind {
        self.kind
    }

    pub fn migration_reversibility(&self) -> Reversibility {
        self.reversibility
    }
}

impl<C: MigrationLedger> fmt::Debug for MigrationUnit<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationUnit")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("kind", &self.kind)
            .field("reversibility", &self.reversibility)
            .finish()
    }
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub applied: Vec<String>,
    pub reverted: Vec<String>,
    /// Units whose inverse could not restore everything, with the reason.
    pub lossy: Vec<(String, &'static str)>,
}

pub struct Manifest<C: MigrationLedger> {
    units: Vec<MigrationUnit<C>>,
}

impl<C: MigrationLedger> Default for Manifest<C> {
    fn default() -> Self {
        Self { units: Vec::new() }
    }
}

impl<C: MigrationLedger> Manifest<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit(mut self, unit: MigrationUnit<C>) -> Self {
        self.units.push(unit);
        self
    }

    pub fn push(&mut self, unit: MigrationUnit<C>) {
        self.units.push(unit);
    }

    pub fn units(&self) -> &[MigrationUnit<C>] {
        &self.units
    }

    pub fn get(&self, name: &str) -> Option<&MigrationUnit<C>> {
        self.units.iter().find(|unit| unit.name == name)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Every unit in dependency order. Among units that are ready at the same
    /// time, the one declared first goes first.
    ///
    /// A dependency is satisfied by another unit of the manifest or by a name in
    /// `applied` (units recorded by an earlier deployment and since removed from
    /// the manifest).
    pub fn ordered(&self, applied: &HashSet<String>) -> CampusResult<Vec<&MigrationUnit<C>>> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(self.units.len());
        for (position, unit) in self.units.iter().enumerate() {
            if index.insert(unit.name.as_str(), position).is_some() {
                return Err(CampusError::Validation(format!(
                    "Migration {} is declared twice",
                    unit.name
                )));
            }
        }

        let mut waiting_on = vec![0usize; self.units.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.units.len()];
        for (position, unit) in self.units.iter().enumerate() {
            for dependency in &unit.dependencies {
                match index.get(dependency.as_str()) {
                    Some(&parent) => {
                        waiting_on[position] += 1;
                        dependents[parent].push(position);
                    }
                    None if applied.contains(dependency) => {}
                    None => {
                        return Err(CampusError::MigrationDependencyUnmet {
                            migration: unit.name.clone(),
                            dependency: dependency.clone(),
                        });
                    }
                }
            }
        }

        let mut done = vec![false; self.units.len()];
        let mut order = Vec::with_capacity(self.units.len());
        while order.len() < self.units.len() {
            let Some(next) = (0..self.units.len()).find(|&i| !done[i] && waiting_on[i] == 0) else {
                let stuck = (0..self.units.len())
                    .filter(|&i| !done[i])
                    .map(|i| self.units[i].name.clone())
                    .collect();
                return Err(CampusError::MigrationCycle(stuck));
            };
            done[next] = true;
            for &child in &dependents[next] {
                waiting_on[child] -= 1;
            }
            order.push(&self.units[next]);
        }

        Ok(order)
    }

    /// Units still to run, in execution order.
    ///
    /// Fails when a recorded unit depends on one that is not recorded, since the
    /// ledger no longer describes a state this manifest can reach.
    pub fn plan(&self, applied: &HashSet<String>) -> CampusResult<Vec<&MigrationUnit<C>>> {
        let ordered = self.ordered(applied)?;

        for unit in ordered.iter().filter(|unit| applied.contains(&unit.name)) {
            if let Some(missing) = unit
                .dependencies
                .iter()
                .find(|dependency| !applied.contains(*dependency))
            {
                return Err(CampusError::MigrationDependencyUnmet {
                    migration: unit.name.clone(),
                    dependency: missing.clone(),
                });
            }
        }

        Ok(ordered
            .into_iter()
            .filter(|unit| !applied.contains(&unit.name))
            .collect())
    }

    /// Pending units needed to bring `target` up: the target and whatever it
    /// depends on, directly or not, in execution order.
    pub fn plan_to(
        &self,
        applied: &HashSet<String>,
        target: &str,
    ) -> CampusResult<Vec<&MigrationUnit<C>>> {
        if self.get(target).is_none() {
            return Err(CampusError::NotFound(format!("Migration {}", target)));
        }

        let pending = self.plan(applied)?;
        let mut needed: HashSet<&str> = HashSet::from([target]);
        for unit in pending.iter().rev() {
            if needed.contains(unit.name.as_str()) {
                needed.extend(unit.dependencies.iter().map(String::as_str));
            }
        }

        Ok(pending
            .into_iter()
            .filter(|unit| needed.contains(unit.name.as_str()))
            .collect())
    }

    /// Applied units that must be reverted to undo `target`: the target itself and
    /// every applied unit that depends on it, directly or not. Returned in
    /// reverse execution order.
    pub fn rollback_plan(
        &self,
        applied: &HashSet<String>,
        target: &str,
    ) -> CampusResult<Vec<&MigrationUnit<C>>> {
        if self.get(target).is_none() {
            return Err(CampusError::NotFound(format!("Migration {}", target)));
        }
        if !applied.contains(target) {
            return Err(CampusError::Validation(format!(
                "Migration {} has not been applied",
                target
            )));
        }

        let ordered = self.ordered(applied)?;
        let mut affected: HashSet<&str> = HashSet::from([target]);
        for unit in &ordered {
            if unit
                .dependencies
                .iter()
                .any(|dependency| affected.contains(dependency.as_str()))
            {
                affected.insert(unit.name.as_str());
            }
        }

        Ok(ordered
            .into_iter()
            .rev()
            .filter(|unit| affected.contains(unit.name.as_str()) && applied.contains(&unit.name))
            .collect())
    }
}

impl<C: MigrationLedger> Manifest<C> {
    /// Runs every pending unit, recording each in the same transaction as its work.
    pub async fn migrate(&self, ctx: &C) -> CampusResult<MigrationReport> {
        let applied: HashSet<String> = ctx.applied_migrations().await?.into_iter().collect();
        let pending = self.plan(&applied)?;
        Self::apply(ctx, pending).await
    }

    /// Runs only what is needed to bring `target` up.
    pub async fn migrate_to(&self, ctx: &C, target: &str) -> CampusResult<MigrationReport> {
        let applied: HashSet<String> = ctx.applied_migrations().await?.into_iter().collect();
        let pending = self.plan_to(&applied, target)?;
        Self::apply(ctx, pending).await
    }

    async fn apply(ctx: &C, pending: Vec<&MigrationUnit<C>>) -> CampusResult<MigrationReport> {
        let mut report = MigrationReport::default();

        if pending.is_empty() {
            info!("No migrations to apply");
            return Ok(report);
        }

        for unit in pending {
            info!("Applying {} ({})", unit.name, unit.kind);
            let mut tx = ctx.begin().await?;
            unit.step
                .forward(ctx, &mut tx)
                .await
                .map_err(|err| wrap_data_error(unit, err))?;
            ctx.record_applied(&mut tx, &unit.name).await?;
            ctx.commit(tx).await?;
            report.applied.push(unit.name.clone());
        }

        info!("Applied {} migration(s)", report.applied.len());
        Ok(report)
    }

    /// Reverts `target` and everything applied on top of it.
    pub async fn rollback(&self, ctx: &C, target: &str) -> CampusResult<MigrationReport> {
        let applied: HashSet<String> = ctx.applied_migrations().await?.into_iter().collect();
        let to_revert = self.rollback_plan(&applied, target)?;
        let mut report = MigrationReport::default();

        for unit in to_revert {
            info!("Reverting {} ({})", unit.name, unit.kind);
            let mut tx = ctx.begin().await?;
            unit.step
                .backward(ctx, &mut tx)
                .await
                .map_err(|err| wrap_data_error(unit, err))?;
            ctx.record_reverted(&mut tx, &unit.name).await?;
            ctx.commit(tx).await?;
            match unit.reversibility {
                Reversibility::Lossy(note) => {
                    warn!("Rollback of {} is lossy: {}", unit.name, note);
                    report.lossy.push((unit.name.clone(), note));
                }
                Reversibility::DataNoop => {
                    info!("{} leaves backfilled data in place", unit.name);
                }
                Reversibility::Reversible => {}
            }
            report.reverted.push(unit.name.clone());
        }

        Ok(report)
    }
}

fn wrap_data_error<C: MigrationLedger>(unit: &MigrationUnit<C>, err: CampusError) -> CampusError {
    match err {
        err @ CampusError::MigrationBackfill { .. } => err,
        err if unit.kind.touches_data() => CampusError::MigrationBackfill {
            migration: unit.name.clone(),
            source: eyre::Report::new(err),
        },
        err => err,
    }
}
