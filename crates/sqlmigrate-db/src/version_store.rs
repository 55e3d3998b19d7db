use std::collections::BTreeSet;

use sqlmigrate_common::{Dialect, Error, MigrationId, Result, SqlIdent};
use tracing::{debug, info};

use crate::backend::{Database, Transaction};

/// The table recording which migrations have been applied, one row per id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionStore {
    table: SqlIdent,
    column: SqlIdent,
}

impl Default for VersionStore {
    fn default() -> Self {
        Self::new(SqlIdent::default_table(), SqlIdent::default_column())
    }
}

impl VersionStore {
    pub fn new(table: SqlIdent, column: SqlIdent) -> Self {
        Self { table, column }
    }

    pub fn table(&self) -> &SqlIdent {
        &self.table
    }

    pub fn column(&self) -> &SqlIdent {
        &self.column
    }

    pub fn create_table_sql(&self, dialect: Dialect) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({} {} NOT NULL PRIMARY KEY)",
            dialect.quote_ident(&self.table),
            dialect.quote_ident(&self.column),
            dialect.id_column_type(),
        )
    }

    fn select_sql(&self, dialect: Dialect) -> String {
        let column = dialect.quote_ident(&self.column);
        format!(
            "SELECT {column} FROM {} ORDER BY {column}",
            dialect.quote_ident(&self.table)
        )
    }

    fn insert_sql(&self, dialect: Dialect) -> String {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            dialect.quote_ident(&self.table),
            dialect.quote_ident(&self.column),
            dialect.placeholder(),
        )
    }

    fn delete_sql(&self, dialect: Dialect) -> String {
        format!(
            "DELETE FROM {} WHERE {} = {}",
            dialect.quote_ident(&self.table),
            dialect.quote_ident(&self.column),
            dialect.placeholder(),
        )
    }

    /// Create the table if it does not exist yet. Safe to call on every run.
    pub fn ensure_schema<D: Database>(&self, db: &mut D, dialect: Dialect) -> Result<()> {
        db.exec_batch(&self.create_table_sql(dialect))
            .map_err(|source| Error::SchemaInit {
                table: self.table.to_string(),
                source,
            })?;
        debug!("migrations table `{}` ready ({dialect})", self.table);
        Ok(())
    }

    /// Every id recorded as applied. An empty table is an empty set.
    pub fn applied_ids<D: Database>(
        &self,
        db: &mut D,
        dialect: Dialect,
    ) -> Result<BTreeSet<MigrationId>> {
        let raw = db
            .query_ids(&self.select_sql(dialect))
            .map_err(|source| Error::Lookup {
                table: self.table.to_string(),
                source,
            })?;

        raw.into_iter()
            .map(|value| {
                MigrationId::from_i64(value).ok_or_else(|| Error::Lookup {
                    table: self.table.to_string(),
                    source: format!("invalid migration id {value} in column `{}`", self.column)
                        .into(),
                })
            })
            .collect()
    }

    /// Record `id` as applied inside the caller's transaction.
    pub fn mark_applied<T: Transaction>(
        &self,
        tx: &T,
        dialect: Dialect,
        id: MigrationId,
    ) -> Result<()> {
        tx.exec_with_id(&self.insert_sql(dialect), id.as_i64())
            .map_err(|source| Error::Record { id, source })?;
        info!("recorded migration {id} in `{}`", self.table);
        Ok(())
    }

    /// Remove the record for `id` inside the caller's transaction.
    pub fn mark_reverted<T: Transaction>(
        &self,
        tx: &T,
        dialect: Dialect,
        id: MigrationId,
    ) -> Result<()> {
        let removed = tx
            .exec_with_id(&self.delete_sql(dialect), id.as_i64())
            .map_err(|source| Error::Record { id, source })?;
        if removed == 0 {
            return Err(Error::Record {
                id,
                source: format!("no row for migration {id} in `{}`", self.table).into(),
            });
        }
        info!("removed migration {id} from `{}`", self.table);
        Ok(())
    }
}
