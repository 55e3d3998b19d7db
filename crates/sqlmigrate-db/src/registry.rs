use sqlmigrate_common::MigrationId;

use crate::migration::Migration;

/// Ordered, append-only list of migrations. A migration's id is its position.
#[derive(Debug, Default)]
pub struct Registry {
    migrations: Vec<Migration>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a migration and return the id it was assigned.
    ///
    /// # Panics
    ///
    /// Panics if the registry already holds `u32::MAX + 1` migrations, the
    /// most the integer id column can address.
    pub fn add(&mut self, mut migration: Migration) -> MigrationId {
        let Some(id) = MigrationId::from_index(self.migrations.len()) else {
            panic!("registry is full: migration ids are limited to u32");
        };
        migration.assign(id);
        self.migrations.push(migration);
        id
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    pub fn get(&self, id: MigrationId) -> Option<&Migration> {
        self.migrations.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

impl FromIterator<Migration> for Registry {
    fn from_iter<I: IntoIterator<Item = Migration>>(iter: I) -> Self {
        let mut registry = Registry::new();
        for migration in iter {
            registry.add(migration);
        }
        registry
    }
}
