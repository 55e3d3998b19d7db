pub mod backend;
pub mod migration;
pub mod registry;
pub mod runner;
pub mod sqlite;
pub mod version_store;

pub use backend::{Database, Executor, Transaction};
pub use migration::{Action, ActionFn, Migration};
pub use registry::Registry;
pub use runner::{MigrationState, MigrationStatus, RunReport, Runner, resume_point};
pub use sqlmigrate_common::{Cause, Dialect, Error, MigrationId, Phase, Result, SqlIdent};
pub use version_store::VersionStore;
