use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use sqlmigrate_common::{Dialect, Error, MigrationId, Phase, Result};
use tracing::{debug, info, warn};

use crate::backend::{Database, Transaction};
use crate::migration::Migration;
use crate::registry::Registry;
use crate::version_store::VersionStore;

/// Outcome of a successful [`Runner::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Highest id applied with no gap below it when the run started.
    pub resume_point: Option<MigrationId>,
    /// Migrations applied by this run, in order.
    pub applied: Vec<MigrationId>,
    /// Registered migrations left alone because they were already recorded.
    pub skipped: Vec<MigrationId>,
}

impl RunReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationState {
    Pending,
    Applied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub id: MigrationId,
    pub name: String,
    pub state: MigrationState,
    pub revertible: bool,
}

/// Applies the migrations of a [`Registry`] in order, each in its own
/// transaction, skipping those already recorded in the [`VersionStore`].
///
/// The internal lock only serialises calls made through this instance. Two
/// processes migrating the same database are not coordinated.
pub struct Runner {
    registry: Registry,
    store: VersionStore,
    lock: Mutex<()>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Runner {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            store: VersionStore::default(),
            lock: Mutex::new(()),
            cancel: None,
        }
    }

    pub fn with_store(mut self, store: VersionStore) -> Self {
        self.store = store;
        self
    }

    /// Stop before the next pending migration once `flag` is set. A migration
    /// that has already started always runs to completion.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &VersionStore {
        &self.store
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock.lock().map_err(|_| Error::LockPoisoned)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Apply every pending migration. Stops at the first failure; migrations
    /// committed before it stay committed and the next run resumes at it.
    pub fn run<D: Database>(&self, db: &mut D, dialect: Dialect) -> Result<RunReport> {
        let _guard = self.lock()?;

        self.store.ensure_schema(db, dialect)?;
        let applied = self.store.applied_ids(db, dialect)?;
        let resume = resume_point(&applied);
        self.warn_unregistered(&applied);

        info!(
            "running migrations: {} registered, {} recorded, resuming after {}",
            self.registry.len(),
            applied.len(),
            resume.map_or_else(|| "none".to_string(), |id| id.to_string()),
        );

        let mut report = RunReport {
            resume_point: resume,
            ..RunReport::default()
        };

        for migration in self.registry.migrations() {
            let id = migration.id();
            if applied.contains(&id) {
                if resume.is_none_or(|r| id > r) {
                    warn!(
                        "migration {id} ({}) is recorded but an earlier one is not; skipping",
                        migration.name()
                    );
                } else {
                    debug!("migration {id} ({}) already applied", migration.name());
                }
                report.skipped.push(id);
                continue;
            }

            if self.is_cancelled() {
                info!("run cancelled before migration {id}");
                return Err(Error::Cancelled { next: id });
            }

            self.apply_one(db, dialect, migration)?;
            report.applied.push(id);
        }

        if report.is_noop() {
            info!("no pending migrations");
        } else {
            info!("applied {} migration(s)", report.applied.len());
        }
        Ok(report)
    }

    fn apply_one<D: Database>(
        &self,
        db: &mut D,
        dialect: Dialect,
        migration: &Migration,
    ) -> Result<()> {
        let id = migration.id();
        debug!("applying migration {id} ({})", migration.name());

        let tx = db.begin().map_err(|source| Error::Execution {
            id,
            phase: Phase::Begin,
            source,
        })?;

        if let Err(source) = migration.apply(&tx) {
            rollback(tx, id);
            return Err(Error::Execution {
                id,
                phase: Phase::Apply,
                source,
            });
        }

        if let Err(e) = self.store.mark_applied(&tx, dialect, id) {
            rollback(tx, id);
            return Err(e);
        }

        tx.commit().map_err(|source| Error::Commit { id, source })?;
        info!("applied migration {id} ({})", migration.name());
        Ok(())
    }

    /// Revert the most recently applied migration. Returns the reverted id, or
    /// `None` when nothing is recorded.
    pub fn revert_last<D: Database>(
        &self,
        db: &mut D,
        dialect: Dialect,
    ) -> Result<Option<MigrationId>> {
        let _guard = self.lock()?;

        self.store.ensure_schema(db, dialect)?;
        let applied = self.store.applied_ids(db, dialect)?;
        let Some(latest) = applied.last().copied() else {
            info!("no applied migrations to revert");
            return Ok(None);
        };

        self.revert_one(db, dialect, latest)?;
        Ok(Some(latest))
    }

    /// Revert `id`, which must be the most recently applied migration.
    pub fn revert<D: Database>(
        &self,
        db: &mut D,
        dialect: Dialect,
        id: MigrationId,
    ) -> Result<()> {
        let _guard = self.lock()?;

        self.store.ensure_schema(db, dialect)?;
        let applied = self.store.applied_ids(db, dialect)?;
        if !applied.contains(&id) {
            return Err(Error::NotApplied { id });
        }
        if let Some(&latest) = applied.last()
            && latest != id
        {
            return Err(Error::NotLatest { id, latest });
        }

        self.revert_one(db, dialect, id)
    }

    fn revert_one<D: Database>(
        &self,
        db: &mut D,
        dialect: Dialect,
        id: MigrationId,
    ) -> Result<()> {
        let migration = self
            .registry
            .get(id)
            .ok_or(Error::UnknownMigration { id })?;
        if !migration.is_revertible() {
            return Err(Error::NotRevertible { id });
        }
        debug!("reverting migration {id} ({})", migration.name());

        let tx = db.begin().map_err(|source| Error::Execution {
            id,
            phase: Phase::Begin,
            source,
        })?;

        if let Err(source) = migration.revert(&tx) {
            rollback(tx, id);
            return Err(Error::Execution {
                id,
                phase: Phase::Revert,
                source,
            });
        }

        if let Err(e) = self.store.mark_reverted(&tx, dialect, id) {
            rollback(tx, id);
            return Err(e);
        }

        tx.commit().map_err(|source| Error::Commit { id, source })?;
        info!("reverted migration {id} ({})", migration.name());
        Ok(())
    }

    /// Applied/pending state of every registered migration.
    pub fn status<D: Database>(
        &self,
        db: &mut D,
        dialect: Dialect,
    ) -> Result<Vec<MigrationStatus>> {
        let _guard = self.lock()?;

        self.store.ensure_schema(db, dialect)?;
        let applied = self.store.applied_ids(db, dialect)?;
        self.warn_unregistered(&applied);

        Ok(self
            .registry
            .migrations()
            .iter()
            .map(|m| MigrationStatus {
                id: m.id(),
                name: m.name().to_string(),
                state: if applied.contains(&m.id()) {
                    MigrationState::Applied
                } else {
                    MigrationState::Pending
                },
                revertible: m.is_revertible(),
            })
            .collect())
    }

    fn warn_unregistered(&self, applied: &BTreeSet<MigrationId>) {
        for id in applied.iter().filter(|id| id.index() >= self.registry.len()) {
            warn!("database records migration {id}, which is not registered");
        }
    }
}

/// Highest id `k` such that every id in `0..=k` is applied.
pub fn resume_point(applied: &BTreeSet<MigrationId>) -> Option<MigrationId> {
    let mut resume = None;
    for (expected, &id) in applied.iter().enumerate() {
        if id.index() != expected {
            break;
        }
        resume = Some(id);
    }
    resume
}

fn rollback<T: Transaction>(tx: T, id: MigrationId) {
    if let Err(e) = tx.rollback() {
        warn!("rollback of migration {id} failed: {e}");
    }
}
