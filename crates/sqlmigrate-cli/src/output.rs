use anyhow::{Context, Result};
use sqlmigrate_db::{MigrationState, MigrationStatus, RunReport, Runner};

fn migration_name(runner: &Runner, id: sqlmigrate_db::MigrationId) -> &str {
    runner.registry().get(id).map_or("?", |m| m.name())
}

pub fn print_report(runner: &Runner, report: &RunReport) {
    if report.is_noop() {
        println!("database is up to date ({} migrations)", runner.registry().len());
        return;
    }
    for id in &report.applied {
        println!("applied   {id:>4}  {}", migration_name(runner, *id));
    }
    println!(
        "{} applied, {} already up to date",
        report.applied.len(),
        report.skipped.len()
    );
}

fn format_status_line(status: &MigrationStatus) -> String {
    let state = match status.state {
        MigrationState::Applied => "applied",
        MigrationState::Pending => "pending",
    };
    let revert = if status.revertible { "" } else { "  (irreversible)" };
    format!("{state:<8}  {:>4}  {}{revert}", status.id, status.name)
}

pub fn print_status(status: &[MigrationStatus], json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(status).context("failed to serialize status")?;
        println!("{out}");
        return Ok(());
    }

    if status.is_empty() {
        println!("no migrations registered");
    }
    for line in status.iter().map(format_status_line) {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use sqlmigrate_db::MigrationId;

    use super::*;

    #[test]
    fn status_line_marks_irreversible_migrations() {
        let line = format_status_line(&MigrationStatus {
            id: MigrationId::new(3),
            name: "add_price".into(),
            state: MigrationState::Pending,
            revertible: false,
        });
        assert_eq!(line, "pending      3  add_price  (irreversible)");

        let line = format_status_line(&MigrationStatus {
            id: MigrationId::new(12),
            name: "create_items".into(),
            state: MigrationState::Applied,
            revertible: true,
        });
        assert_eq!(line, "applied     12  create_items");
    }
}
