use std::path::Path;

use sqlmigrate_common::{Error, Result};
use tracing::{debug, info};

use crate::model::MigrateConfig;

/// Loads [`MigrateConfig`] from YAML or TOML, picked by file extension.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Path) -> Result<MigrateConfig> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = match ext {
            "yml" | "yaml" => Self::from_yaml_str(&contents)?,
            "toml" => Self::from_toml_str(&contents)?,
            other => {
                return Err(Error::Config(format!(
                    "unsupported config extension: {other}"
                )));
            }
        };

        info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` when given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<MigrateConfig> {
        match path {
            Some(path) => Self::load(path),
            None => {
                debug!("no config file given, using defaults");
                Ok(MigrateConfig::default())
            }
        }
    }

    pub fn from_yaml_str(contents: &str) -> Result<MigrateConfig> {
        // serde_yaml reads an empty document as unit rather than an empty map
        if contents.trim().is_empty() {
            return Ok(MigrateConfig::default());
        }
        serde_yaml::from_str(contents).map_err(|e| Error::Config(format!("YAML parse error: {e}")))
    }

    pub fn from_toml_str(contents: &str) -> Result<MigrateConfig> {
        toml::from_str(contents).map_err(|e| Error::Config(format!("TOML parse error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use sqlmigrate_common::Dialect;

    use super::*;

    #[test]
    fn empty_documents_use_defaults() {
        let yaml = ConfigLoader::from_yaml_str("").unwrap();
        let toml = ConfigLoader::from_toml_str("").unwrap();
        assert_eq!(yaml, MigrateConfig::default());
        assert_eq!(toml, MigrateConfig::default());
        assert_eq!(yaml.table.as_str(), "migrations");
        assert_eq!(yaml.column.as_str(), "version");
        assert_eq!(yaml.migrations_dir, PathBuf::from("migrations"));
    }

    #[test]
    fn yaml_overrides_fields() {
        let config = ConfigLoader::from_yaml_str(
            "database: app.db\ndialect: postgres\ntable: schema_history\ncolumn: step\n",
        )
        .unwrap();
        assert_eq!(config.database, Some(PathBuf::from("app.db")));
        assert_eq!(config.dialect, Dialect::Postgres);
        assert_eq!(config.table.as_str(), "schema_history");
        assert_eq!(config.column.as_str(), "step");
    }

    #[test]
    fn toml_overrides_fields() {
        let config = ConfigLoader::from_toml_str(
            "migrations_dir = \"db/migrations\"\ndialect = \"mysql\"\n",
        )
        .unwrap();
        assert_eq!(config.migrations_dir, PathBuf::from("db/migrations"));
        assert_eq!(config.dialect, Dialect::Mysql);
    }

    #[test]
    fn unsafe_table_name_is_rejected() {
        let err = ConfigLoader::from_yaml_str("table: \"users; DROP TABLE users\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("invalid SQL identifier")));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(ConfigLoader::from_toml_str("tabel = \"typo\"\n").is_err());
    }

    #[test]
    fn load_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("migrate.yml");
        std::fs::write(&yaml_path, "dialect: sqlite3\n").unwrap();
        assert_eq!(
            ConfigLoader::load(&yaml_path).unwrap().dialect,
            Dialect::Sqlite
        );

        let toml_path = dir.path().join("migrate.toml");
        std::fs::write(&toml_path, "table = \"applied\"\n").unwrap();
        assert_eq!(
            ConfigLoader::load(&toml_path).unwrap().table.as_str(),
            "applied"
        );

        let json_path = dir.path().join("migrate.json");
        std::fs::write(&json_path, "{}").unwrap();
        assert!(ConfigLoader::load(&json_path).is_err());

        assert!(ConfigLoader::load(&dir.path().join("missing.yml")).is_err());
    }

    #[test]
    fn load_or_default_without_path() {
        assert_eq!(
            ConfigLoader::load_or_default(None).unwrap(),
            MigrateConfig::default()
        );
    }
}
