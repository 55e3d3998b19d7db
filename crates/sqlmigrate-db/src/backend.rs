//! Capability traits the engine needs from a database driver.
//!
//! Migration actions only ever see an [`Executor`]; the runner and the
//! version store use [`Database`] and [`Transaction`] on top of it. The
//! `rusqlite` implementation lives in [`crate::sqlite`].

use sqlmigrate_common::Cause;

/// Execute SQL inside an open transaction.
pub trait Executor {
    /// Run one statement, or a `;`-separated batch where the driver allows it.
    fn exec(&self, sql: &str) -> Result<(), Cause>;
}

/// An open transaction. Dropping it without calling [`Transaction::commit`]
/// must roll it back.
pub trait Transaction: Executor {
    /// Run a statement with a single bound integer parameter, returning the
    /// number of affected rows.
    fn exec_with_id(&self, sql: &str, id: i64) -> Result<usize, Cause>;

    /// Make the transaction durable. On failure nothing done inside it may
    /// survive.
    fn commit(self) -> Result<(), Cause>;

    fn rollback(self) -> Result<(), Cause>;
}

/// A live connection borrowed from the caller.
pub trait Database {
    type Tx<'a>: Transaction
    where
        Self: 'a;

    /// Run statements outside of any engine-managed transaction.
    fn exec_batch(&mut self, sql: &str) -> Result<(), Cause>;

    /// Run a query whose first column is an integer, collecting every row.
    fn query_ids(&mut self, sql: &str) -> Result<Vec<i64>, Cause>;

    fn begin(&mut self) -> Result<Self::Tx<'_>, Cause>;
}
