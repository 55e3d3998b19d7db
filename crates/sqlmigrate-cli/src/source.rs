use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use sqlmigrate_db::{Migration, Registry};
use tracing::debug;

/// One `NNNN_name` pair found on disk.
#[derive(Debug, Default)]
struct SqlPair {
    name: String,
    up: Option<PathBuf>,
    down: Option<PathBuf>,
}

enum Direction {
    Up,
    Down,
}

/// Split `0003_add_price.up.sql` into `(3, "add_price", Up)`. Files that do
/// not follow the pattern are ignored.
fn parse_file_name(file_name: &str) -> Option<(u64, &str, Direction)> {
    let (stem, direction) = if let Some(stem) = file_name.strip_suffix(".up.sql") {
        (stem, Direction::Up)
    } else if let Some(stem) = file_name.strip_suffix(".down.sql") {
        (stem, Direction::Down)
    } else {
        return None;
    };

    let (prefix, name) = stem.split_once('_').unwrap_or((stem, ""));
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((prefix.parse().ok()?, name, direction))
}

/// Build a registry from the SQL files in `dir`. Prefixes start at 1 and run
/// without gaps, so file `n` is always migration id `n - 1` and a file added
/// between two numbered ones cannot shift ids already recorded.
/// Every prefix needs an `.up.sql`; the `.down.sql` is optional.
pub fn load_dir(dir: &Path) -> Result<Registry> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read migrations directory {}", dir.display()))?;

    let mut pairs: BTreeMap<u64, SqlPair> = BTreeMap::new();
    for entry in entries {
        let path = entry?.path();
        let Some(file_name) = path.file_name().and_then(|f| f.to_str()) else {
            continue;
        };
        let Some((number, name, direction)) = parse_file_name(file_name) else {
            debug!("ignoring {}", path.display());
            continue;
        };

        let pair = pairs.entry(number).or_default();
        if pair.up.is_some() || pair.down.is_some() {
            if pair.name != name {
                bail!(
                    "migration number {number} is used by both `{}` and `{name}`",
                    pair.name
                );
            }
        } else {
            pair.name = name.to_string();
        }

        match direction {
            Direction::Up => pair.up = Some(path),
            Direction::Down => pair.down = Some(path),
        }
    }

    let mut registry = Registry::new();
    for (expected, (number, pair)) in (1u64..).zip(pairs) {
        if number != expected {
            bail!(
                "migration numbers must start at 1 with no gaps: expected {expected}, found \
                 {number} ({})",
                pair.name
            );
        }
        let Some(up_path) = pair.up else {
            bail!("migration {number} ({}) has a .down.sql but no .up.sql", pair.name);
        };
        let up = std::fs::read_to_string(&up_path)
            .with_context(|| format!("failed to read {}", up_path.display()))?;
        let down = match &pair.down {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
            None => String::new(),
        };

        let id = registry.add(Migration::sql(pair.name, up, down));
        debug!("registered {} as migration {id}", up_path.display());
    }

    Ok(registry)
}
