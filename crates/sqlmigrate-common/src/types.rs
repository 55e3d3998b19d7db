use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Zero-based position of a migration in its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MigrationId(u32);

impl MigrationId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Id for a registry position; `None` past `u32::MAX`.
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    /// Value written to the integer column of the migrations table.
    pub fn as_i64(self) -> i64 {
        i64::from(self.0)
    }

    /// Convert a stored column value back into an id; `None` for negative or
    /// out-of-range values.
    pub fn from_i64(value: i64) -> Option<Self> {
        u32::try_from(value).ok().map(Self)
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u32> for MigrationId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// SQL syntax variant used when building the statements the engine issues
/// itself. Migration bodies are passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    #[serde(alias = "sqlite3")]
    Sqlite,
    #[serde(alias = "postgresql", alias = "pgx", alias = "pg")]
    Postgres,
    #[serde(alias = "mariadb")]
    Mysql,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
            Dialect::Mysql => "mysql",
        }
    }

    pub fn quote_ident(self, ident: &SqlIdent) -> String {
        let q = match self {
            Dialect::Mysql => '`',
            Dialect::Sqlite | Dialect::Postgres => '"',
        };
        let escaped = ident.as_str().replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// Placeholder for the single bound parameter of engine statements.
    pub fn placeholder(self) -> &'static str {
        match self {
            Dialect::Sqlite => "?1",
            Dialect::Postgres => "$1",
            Dialect::Mysql => "?",
        }
    }

    pub fn id_column_type(self) -> &'static str {
        match self {
            Dialect::Sqlite => "INTEGER",
            Dialect::Postgres | Dialect::Mysql => "BIGINT",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    /// Accepts the common driver names as well as the canonical ones.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" | "pgx" | "pg" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::Mysql),
            _ => Err(Error::UnknownDialect(s.to_string())),
        }
    }
}

const MAX_IDENT_LEN: usize = 63;

/// A table or column name safe to interpolate into engine SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SqlIdent(String);

impl SqlIdent {
    pub fn new(ident: impl Into<String>) -> Result<Self, Error> {
        let ident = ident.into();
        if ident.is_empty() {
            return Err(Error::InvalidIdentifier("identifier cannot be empty".into()));
        }
        if ident.len() > MAX_IDENT_LEN {
            return Err(Error::InvalidIdentifier(format!(
                "`{ident}` is longer than {MAX_IDENT_LEN} characters"
            )));
        }
        let mut chars = ident.chars();
        let first_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::InvalidIdentifier(format!(
                "`{ident}` must match [A-Za-z_][A-Za-z0-9_]*"
            )));
        }
        Ok(Self(ident))
    }

    /// Default name of the applied-migrations table.
    pub fn default_table() -> Self {
        Self("migrations".to_string())
    }

    /// Default name of the applied-id column.
    pub fn default_column() -> Self {
        Self("version".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SqlIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SqlIdent {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SqlIdent> for String {
    fn from(ident: SqlIdent) -> Self {
        ident.0
    }
}
