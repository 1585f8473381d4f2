use std::fmt::Debug;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::expr::scalar::DataType;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableColumn {
    pub name: String,
    pub datatype: DataType,
}

impl TableColumn {
    pub fn new(name: impl Into<String>, datatype: DataType) -> Self {
        TableColumn {
            name: name.into(),
            datatype,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<TableColumn>,
}

/// Table lookups needed during analysis.
pub trait Catalog: Debug + Send + Sync {
    /// Get a table by name, returning None if it doesn't exist.
    fn get_table(&self, name: &str) -> Option<TableSchema>;
}

impl<C: Catalog + ?Sized> Catalog for Arc<C> {
    fn get_table(&self, name: &str) -> Option<TableSchema> {
        self.as_ref().get_table(name)
    }
}

/// In-memory catalog, good enough for tests and embedding.
///
/// Table names are case insensitive. Tables are kept in insertion order.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    tables: RwLock<IndexMap<String, TableSchema>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a table.
    pub fn create_table<S, C>(&self, name: S, columns: C)
    where
        S: Into<String>,
        C: IntoIterator<Item = (S, DataType)>,
    {
        let name = name.into();
        let schema = TableSchema {
            name: name.clone(),
            columns: columns
                .into_iter()
                .map(|(name, datatype)| TableColumn::new(name, datatype))
                .collect(),
        };
        self.tables.write().insert(name.to_lowercase(), schema);
    }

    /// Drop a table, returning if it existed.
    pub fn drop_table(&self, name: &str) -> bool {
        self.tables
            .write()
            .shift_remove(&name.to_lowercase())
            .is_some()
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables
            .read()
            .values()
            .map(|t| t.name.clone())
            .collect()
    }
}

impl Catalog for MemoryCatalog {
    fn get_table(&self, name: &str) -> Option<TableSchema> {
        self.tables.read().get(&name.to_lowercase()).cloned()
    }
}
