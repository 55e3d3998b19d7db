use rusqlite::{Connection, params};
use sqlmigrate_common::Cause;

use crate::backend::{Database, Executor, Transaction};

impl Executor for rusqlite::Transaction<'_> {
    fn exec(&self, sql: &str) -> Result<(), Cause> {
        self.execute_batch(sql)?;
        Ok(())
    }
}

impl Transaction for rusqlite::Transaction<'_> {
    fn exec_with_id(&self, sql: &str, id: i64) -> Result<usize, Cause> {
        let conn: &Connection = self;
        Ok(conn.execute(sql, params![id])?)
    }

    fn commit(self) -> Result<(), Cause> {
        rusqlite::Transaction::commit(self)?;
        Ok(())
    }

    fn rollback(self) -> Result<(), Cause> {
        rusqlite::Transaction::rollback(self)?;
        Ok(())
    }
}

impl Database for Connection {
    type Tx<'a> = rusqlite::Transaction<'a>;

    fn exec_batch(&mut self, sql: &str) -> Result<(), Cause> {
        self.execute_batch(sql)?;
        Ok(())
    }

    fn query_ids(&mut self, sql: &str) -> Result<Vec<i64>, Cause> {
        let mut stmt = self.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn begin(&mut self) -> Result<Self::Tx<'_>, Cause> {
        Ok(self.transaction()?)
    }
}
