use std::fmt;

use thiserror::Error;

use crate::types::MigrationId;

pub type Result<T> = std::result::Result<T, Error>;

/// Underlying driver or action failure carried inside an [`Error`].
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which step of a migration's transaction was executing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Begin,
    Apply,
    Revert,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Begin => "begin",
            Phase::Apply => "apply",
            Phase::Revert => "revert",
        })
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to initialise migrations table `{table}`: {source}")]
    SchemaInit {
        table: String,
        #[source]
        source: Cause,
    },

    #[error("failed to read applied migrations from `{table}`: {source}")]
    Lookup {
        table: String,
        #[source]
        source: Cause,
    },

    #[error("migration {id} failed during {phase}: {source}")]
    Execution {
        id: MigrationId,
        phase: Phase,
        #[source]
        source: Cause,
    },

    #[error("failed to record state of migration {id}: {source}")]
    Record {
        id: MigrationId,
        #[source]
        source: Cause,
    },

    #[error("failed to commit migration {id}: {source}")]
    Commit {
        id: MigrationId,
        #[source]
        source: Cause,
    },

    #[error("migration {id} has no revert action")]
    NotRevertible { id: MigrationId },

    #[error("migration {id} has not been applied")]
    NotApplied { id: MigrationId },

    #[error("migration {id} is not the latest applied migration (latest is {latest})")]
    NotLatest {
        id: MigrationId,
        latest: MigrationId,
    },

    #[error("migration {id} is not registered")]
    UnknownMigration { id: MigrationId },

    #[error("run cancelled before migration {next}")]
    Cancelled { next: MigrationId },

    #[error("invalid SQL identifier: {0}")]
    InvalidIdentifier(String),

    #[error("unknown SQL dialect: {0}")]
    UnknownDialect(String),

    #[error("migration runner lock poisoned")]
    LockPoisoned,

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// The migration this error is attributed to, if any.
    pub fn migration_id(&self) -> Option<MigrationId> {
        match self {
            Error::Execution { id, .. }
            | Error::Record { id, .. }
            | Error::Commit { id, .. }
            | Error::NotRevertible { id }
            | Error::NotApplied { id }
            | Error::NotLatest { id, .. }
            | Error::UnknownMigration { id } => Some(*id),
            Error::Cancelled { next } => Some(*next),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::{Error, Phase};
    use crate::types::MigrationId;

    #[test]
    fn error_display_includes_context() {
        let e = Error::Execution {
            id: MigrationId::new(3),
            phase: Phase::Apply,
            source: "no such table: items".into(),
        };
        assert_eq!(
            e.to_string(),
            "migration 3 failed during apply: no such table: items"
        );

        let e = Error::SchemaInit {
            table: "migrations".into(),
            source: "permission denied".into(),
        };
        assert_eq!(
            e.to_string(),
            "failed to initialise migrations table `migrations`: permission denied"
        );

        let e = Error::NotLatest {
            id: MigrationId::new(0),
            latest: MigrationId::new(2),
        };
        assert_eq!(
            e.to_string(),
            "migration 0 is not the latest applied migration (latest is 2)"
        );
    }

    #[test]
    fn source_chain_is_preserved() {
        let e = Error::Commit {
            id: MigrationId::new(1),
            source: "disk I/O error".into(),
        };
        let source = e.source().expect("commit error carries a source");
        assert_eq!(source.to_string(), "disk I/O error");
    }

    #[test]
    fn migration_id_reports_failing_migration() {
        let e = Error::Record {
            id: MigrationId::new(7),
            source: "UNIQUE constraint failed".into(),
        };
        assert_eq!(e.migration_id(), Some(MigrationId::new(7)));
        assert_eq!(Error::LockPoisoned.migration_id(), None);
        assert_eq!(
            Error::Cancelled {
                next: MigrationId::new(4)
            }
            .migration_id(),
            Some(MigrationId::new(4))
        );
    }
}
