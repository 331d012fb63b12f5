use super::memory::MemoryLineStore;
#[cfg(feature = "sqlite")]
use super::sqlite::SqliteLineStore;
use super::{LineStore, PersistenceError, PersistenceResult, StoreTransaction};
use crate::config::PlannerConfig;

/// The store chosen at startup by the binaries.
pub enum PlannerStore {
    Memory(MemoryLineStore),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteLineStore),
}

impl PlannerStore {
    /// SQLite when `database_path` is configured, memory otherwise.
    pub fn open(config: &PlannerConfig) -> PersistenceResult<Self> {
        match &config.database_path {
            #[cfg(feature = "sqlite")]
            Some(path) => Ok(PlannerStore::Sqlite(SqliteLineStore::new(path)?)),
            #[cfg(not(feature = "sqlite"))]
            Some(path) => Err(PersistenceError::InvalidData(format!(
                "database '{}' configured but sqlite support is not compiled in",
                path.display()
            ))),
            None => Ok(PlannerStore::Memory(MemoryLineStore::new())),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            PlannerStore::Memory(_) => "memory",
            #[cfg(feature = "sqlite")]
            PlannerStore::Sqlite(_) => "sqlite",
        }
    }

    pub fn as_memory(&self) -> Option<&MemoryLineStore> {
        match self {
            PlannerStore::Memory(store) => Some(store),
            #[cfg(feature = "sqlite")]
            PlannerStore::Sqlite(_) => None,
        }
    }
}

impl LineStore for PlannerStore {
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<T, E>,
        E: From<PersistenceError>,
    {
        match self {
            PlannerStore::Memory(store) => store.transaction(work),
            #[cfg(feature = "sqlite")]
            PlannerStore::Sqlite(store) => store.transaction(work),
        }
    }
}
