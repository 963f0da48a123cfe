use std::sync::{Arc, PoisonError, RwLock};

use super::table::DistrictTable;
use super::TableSource;

/// A district table together with the source it was built from. Both are
/// published as one value, so readers never pair a table with a stale source.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTable {
    pub table: DistrictTable,
    pub source: TableSource,
}

/// Shared handle on the current district table. Readers take a snapshot and
/// keep it for the whole request; a refresh swaps in a new table.
#[derive(Debug)]
pub struct DistrictStore {
    current: RwLock<Arc<LoadedTable>>,
}

impl DistrictStore {
    pub fn new(table: DistrictTable, source: TableSource) -> Self {
        Self {
            current: RwLock::new(Arc::new(LoadedTable { table, source })),
        }
    }

    pub fn snapshot(&self) -> Arc<LoadedTable> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Installs `table` with its `source` and returns what it replaced.
    pub fn replace(&self, table: DistrictTable, source: TableSource) -> Arc<LoadedTable> {
        let next = Arc::new(LoadedTable { table, source });
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }
}
