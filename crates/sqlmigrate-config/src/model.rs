use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sqlmigrate_common::{Dialect, SqlIdent};

/// Settings for a migration run. Every field has a default, so an empty file
/// is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrateConfig {
    /// Database file to migrate.
    pub database: Option<PathBuf>,
    /// Directory holding `NNNN_name.up.sql` / `NNNN_name.down.sql` files.
    pub migrations_dir: PathBuf,
    pub dialect: Dialect,
    /// Table recording applied migration ids.
    pub table: SqlIdent,
    /// Integer column of `table` holding one applied id per row.
    pub column: SqlIdent,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            database: None,
            migrations_dir: PathBuf::from("migrations"),
            dialect: Dialect::default(),
            table: SqlIdent::default_table(),
            column: SqlIdent::default_column(),
        }
    }
}
