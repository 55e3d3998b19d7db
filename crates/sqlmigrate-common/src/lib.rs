pub mod error;
pub mod types;

pub use error::{Cause, Error, Phase, Result};
pub use types::{Dialect, MigrationId, SqlIdent};
