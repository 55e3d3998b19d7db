use std::fmt;

use sqlmigrate_common::{Cause, Error, MigrationId};

use crate::backend::Executor;

/// Signature of a migration action written in Rust.
pub type ActionFn = dyn Fn(&dyn Executor) -> Result<(), Cause> + Send + Sync;

/// What a migration does in one direction.
pub enum Action {
    Noop,
    Sql(String),
    Code(Box<ActionFn>),
}

impl Action {
    /// Empty or whitespace-only SQL is treated as a no-op.
    fn from_sql(sql: impl Into<String>) -> Self {
        let sql = sql.into();
        if sql.trim().is_empty() {
            Action::Noop
        } else {
            Action::Sql(sql)
        }
    }

    fn run(&self, ex: &dyn Executor) -> Result<(), Cause> {
        match self {
            Action::Noop => Ok(()),
            Action::Sql(sql) => ex.exec(sql),
            Action::Code(f) => f(ex),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Noop => f.write_str("Noop"),
            Action::Sql(sql) => f.debug_tuple("Sql").field(sql).finish(),
            Action::Code(_) => f.write_str("Code(..)"),
        }
    }
}

/// A single schema change. The id is assigned when the migration is added to
/// a [`Registry`](crate::Registry) and never changes afterwards.
#[derive(Debug)]
pub struct Migration {
    id: MigrationId,
    name: String,
    apply: Action,
    revert: Option<Action>,
}

impl Migration {
    /// Build a migration from raw SQL. An empty `up` applies nothing; an empty
    /// `down` leaves the migration without a revert action.
    pub fn sql(
        name: impl Into<String>,
        up: impl Into<String>,
        down: impl Into<String>,
    ) -> Self {
        let revert = match Action::from_sql(down) {
            Action::Noop => None,
            action => Some(action),
        };
        Self {
            id: MigrationId::new(0),
            name: name.into(),
            apply: Action::from_sql(up),
            revert,
        }
    }

    /// Build a migration whose apply step is Rust code.
    pub fn new<F>(name: impl Into<String>, apply: F) -> Self
    where
        F: Fn(&dyn Executor) -> Result<(), Cause> + Send + Sync + 'static,
    {
        Self {
            id: MigrationId::new(0),
            name: name.into(),
            apply: Action::Code(Box::new(apply)),
            revert: None,
        }
    }

    pub fn with_revert<F>(mut self, revert: F) -> Self
    where
        F: Fn(&dyn Executor) -> Result<(), Cause> + Send + Sync + 'static,
    {
        self.revert = Some(Action::Code(Box::new(revert)));
        self
    }

    pub fn with_revert_sql(mut self, down: impl Into<String>) -> Self {
        self.revert = match Action::from_sql(down) {
            Action::Noop => None,
            action => Some(action),
        };
        self
    }

    pub fn id(&self) -> MigrationId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_revertible(&self) -> bool {
        self.revert.is_some()
    }

    /// Run the apply action against an open transaction.
    pub fn apply(&self, ex: &dyn Executor) -> Result<(), Cause> {
        self.apply.run(ex)
    }

    /// Run the revert action against an open transaction. Fails with
    /// [`Error::NotRevertible`] when the migration has none.
    pub fn revert(&self, ex: &dyn Executor) -> Result<(), Cause> {
        match &self.revert {
            Some(action) => action.run(ex),
            None => Err(Error::NotRevertible { id: self.id }.into()),
        }
    }

    pub(crate) fn assign(&mut self, id: MigrationId) {
        self.id = id;
        if self.name.trim().is_empty() {
            self.name = format!("migration_{id}");
        }
    }
}
