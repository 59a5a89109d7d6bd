//! Catalog - schema and OID oracle consumed by the plan IR
//!
//! The catalog hands out object identifiers, stores table definitions
//! (column names, types, nullability and defaults) and owns the in-memory
//! row stores backing system tables such as `pg_attribute`.
//!
//! Plan construction only ever reads from the catalog: insert resolution
//! looks up column positions and defaults on a [`TableDef`], and the
//! attribute handle answers column lookups by OID or by name.

pub mod attribute;
pub mod table;

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{TypeId, Value};

pub use attribute::{AttributeEntry, AttributeHandle};
pub use table::{Row, SqlTableRw};

/// First OID handed out by a fresh catalog; lower values are reserved
pub const START_OID: u32 = 1001;

macro_rules! define_oid {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(oid: u32) -> Self {
                $name(oid)
            }
        }
    };
}

define_oid!(
    /// Table object identifier
    TableOid
);
define_oid!(
    /// Column object identifier
    ColumnOid
);
define_oid!(
    /// Index object identifier
    IndexOid
);

/// Column definition
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Value type
    pub type_id: TypeId,
    /// Whether NULL values are allowed
    pub nullable: bool,
    /// Declared default value
    pub default: Option<Value>,
    /// Column OID, assigned by the catalog when the table is created
    pub oid: ColumnOid,
}

impl ColumnDef {
    /// Create a new column definition
    pub fn new(name: impl Into<String>, type_id: TypeId) -> Self {
        Self {
            name: name.into(),
            type_id,
            nullable: true,
            default: None,
            oid: ColumnOid(0),
        }
    }

    /// Set nullable
    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set default value
    #[must_use]
    pub fn default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set an explicit column OID
    #[must_use]
    pub fn with_oid(mut self, oid: ColumnOid) -> Self {
        self.oid = oid;
        self
    }
}

/// Table definition
#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    /// Table name
    pub name: String,
    /// Table OID, assigned by the catalog when the table is created
    pub oid: TableOid,
    /// Column definitions in schema order
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    /// Create a new table definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            oid: TableOid(0),
            columns: Vec::new(),
        }
    }

    /// Add a column
    #[must_use]
    pub fn column(mut self, col: ColumnDef) -> Self {
        self.columns.push(col);
        self
    }

    /// Get column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get column index by name
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Get column by OID
    pub fn get_column_by_oid(&self, oid: ColumnOid) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.oid == oid)
    }
}

/// Catalog error
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// Table already exists
    TableExists(String),
    /// Table not found
    TableNotFound(String),
    /// Column not found
    ColumnNotFound(String, String),
    /// Attribute row not found in `pg_attribute`
    AttributeNotFound { table_oid: TableOid, name: String },
    /// Row does not match the table's column layout
    InvalidRow(String),
    /// Value type does not match the column type
    TypeMismatch { expected: TypeId, found: TypeId },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::TableExists(name) => write!(f, "Table '{}' already exists", name),
            CatalogError::TableNotFound(name) => write!(f, "Table '{}' not found", name),
            CatalogError::ColumnNotFound(table, col) => {
                write!(f, "Column '{}' not found in table '{}'", col, table)
            }
            CatalogError::AttributeNotFound { table_oid, name } => {
                write!(f, "Attribute '{}' doesn't exist for table {}", name, table_oid)
            }
            CatalogError::InvalidRow(msg) => write!(f, "Invalid row: {}", msg),
            CatalogError::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {}, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Database catalog - OID allocator, table definitions and system row stores
#[derive(Debug)]
pub struct Catalog {
    next_oid: AtomicU32,
    /// Tables by OID
    tables: HashMap<TableOid, TableDef>,
    /// Table OIDs by name
    names: HashMap<String, TableOid>,
    /// Row stores backing system tables, by OID
    storage: HashMap<TableOid, Arc<SqlTableRw>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self {
            next_oid: AtomicU32::new(START_OID),
            tables: HashMap::new(),
            names: HashMap::new(),
            storage: HashMap::new(),
        }
    }

    /// Allocate the next object identifier
    pub fn next_oid(&self) -> u32 {
        self.next_oid.fetch_add(1, Ordering::Relaxed)
    }

    /// Create a table, allocating its table OID and one OID per column
    pub fn create_table(&mut self, mut def: TableDef) -> CatalogResult<TableOid> {
        if self.names.contains_key(&def.name) {
            return Err(CatalogError::TableExists(def.name.clone()));
        }
        def.oid = TableOid(self.next_oid());
        for col in &mut def.columns {
            col.oid = ColumnOid(self.next_oid());
        }
        debug!(table = %def.name, oid = %def.oid, columns = def.columns.len(), "Created table");
        let oid = def.oid;
        self.names.insert(def.name.clone(), oid);
        self.tables.insert(oid, def);
        Ok(oid)
    }

    /// Register a row store under `name`, together with its table definition
    pub fn add_to_maps(&mut self, name: impl Into<String>, table: Arc<SqlTableRw>) -> CatalogResult<()> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(CatalogError::TableExists(name));
        }
        let oid = table.oid();
        let def = TableDef {
            name: name.clone(),
            oid,
            columns: table.columns().to_vec(),
        };
        self.names.insert(name, oid);
        self.tables.insert(oid, def);
        self.storage.insert(oid, table);
        Ok(())
    }

    /// Drop a table
    pub fn drop_table(&mut self, name: &str) -> CatalogResult<TableDef> {
        let oid = self
            .names
            .remove(name)
            .ok_or_else(|| CatalogError::TableNotFound(name.to_string()))?;
        self.storage.remove(&oid);
        self.tables
            .remove(&oid)
            .ok_or_else(|| CatalogError::TableNotFound(name.to_string()))
    }

    /// Get a table definition by OID
    pub fn get_table(&self, oid: TableOid) -> Option<&TableDef> {
        self.tables.get(&oid)
    }

    /// Get a table definition by name
    pub fn get_table_by_name(&self, name: &str) -> Option<&TableDef> {
        self.names.get(name).and_then(|oid| self.tables.get(oid))
    }

    /// Get the row store registered for a table
    pub fn get_sql_table(&self, oid: TableOid) -> Option<Arc<SqlTableRw>> {
        self.storage.get(&oid).cloned()
    }

    /// Check if a table exists
    pub fn table_exists(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// List all table names
    pub fn list_tables(&self) -> Vec<&str> {
        self.names.keys().map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_create_drop_table() {
        let mut catalog = Catalog::new();

        let table = TableDef::new("users")
            .column(ColumnDef::new("id", TypeId::Integer).nullable(false))
            .column(ColumnDef::new("name", TypeId::Varchar));

        let oid = catalog.create_table(table).unwrap();
        assert!(catalog.table_exists("users"));

        // Duplicate should fail
        assert!(matches!(
            catalog.create_table(TableDef::new("users")),
            Err(CatalogError::TableExists(_))
        ));

        let t = catalog.get_table(oid).unwrap();
        assert_eq!(t.columns.len(), 2);
        assert_eq!(catalog.get_table_by_name("users").unwrap().oid, oid);

        // Column OIDs are allocated after the table OID
        assert_eq!(t.columns[0].oid, ColumnOid(oid.0 + 1));
        assert_eq!(t.columns[1].oid, ColumnOid(oid.0 + 2));

        catalog.drop_table("users").unwrap();
        assert!(!catalog.table_exists("users"));
        assert!(catalog.get_table(oid).is_none());

        assert!(matches!(
            catalog.drop_table("users"),
            Err(CatalogError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_next_oid_is_monotonic() {
        let catalog = Catalog::new();
        let a = catalog.next_oid();
        let b = catalog.next_oid();
        assert_eq!(a, START_OID);
        assert_eq!(b, a + 1);
    }

    #[test]
    fn test_table_def_lookups() {
        let table = TableDef::new("test")
            .column(ColumnDef::new("flag", TypeId::Boolean))
            .column(ColumnDef::new("n", TypeId::Integer).nullable(false).default(0))
            .column(ColumnDef::new("s", TypeId::Varchar).with_oid(ColumnOid(77)));

        let n = table.get_column("n").unwrap();
        assert!(!n.nullable);
        assert_eq!(n.default, Some(Value::Integer(0)));

        assert!(table.get_column("nonexistent").is_none());
        assert_eq!(table.get_column_index("s"), Some(2));
        assert_eq!(table.get_column_by_oid(ColumnOid(77)).unwrap().name, "s");
    }
}
