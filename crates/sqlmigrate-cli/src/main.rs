mod output;
mod source;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use sqlmigrate_config::{ConfigLoader, MigrateConfig};
use sqlmigrate_db::{Dialect, Runner, VersionStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlmigrate", version, about = "Apply ordered SQL migrations exactly once")]
struct Cli {
    /// Path to a YAML or TOML config file
    #[arg(short, long, global = true, env = "SQLMIGRATE_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the config file)
    #[arg(short, long, global = true, env = "SQLMIGRATE_DATABASE")]
    database: Option<PathBuf>,

    /// Directory of NNNN_name.up.sql / NNNN_name.down.sql files
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply all pending migrations
    Up,
    /// Show which migrations are applied and which are pending
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Revert the most recently applied migration
    Down,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn open_database(config: &MigrateConfig) -> Result<Connection> {
    if config.dialect != Dialect::Sqlite {
        bail!(
            "the sqlmigrate binary only drives SQLite databases (config dialect is {})",
            config.dialect
        );
    }
    let Some(path) = &config.database else {
        bail!("no database given; pass --database or set `database` in the config file");
    };

    info!("opening database at {}", path.display());
    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database {}", path.display()))?;
    conn.busy_timeout(Duration::from_secs(5))
        .context("failed to set busy timeout")?;
    Ok(conn)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = ConfigLoader::load_or_default(cli.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(database) = cli.database {
        config.database = Some(database);
    }
    if let Some(dir) = cli.dir {
        config.migrations_dir = dir;
    }

    let registry = source::load_dir(&config.migrations_dir)?;
    let runner = Runner::new(registry).with_store(VersionStore::new(
        config.table.clone(),
        config.column.clone(),
    ));
    let mut conn = open_database(&config)?;

    match cli.command {
        Command::Up => {
            let report = runner.run(&mut conn, config.dialect)?;
            output::print_report(&runner, &report);
        }
        Command::Status { json } => {
            let status = runner.status(&mut conn, config.dialect)?;
            output::print_status(&status, json)?;
        }
        Command::Down => match runner.revert_last(&mut conn, config.dialect)? {
            Some(id) => println!("reverted migration {id}"),
            None => println!("nothing to revert"),
        },
    }

    Ok(())
}
