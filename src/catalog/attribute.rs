//! `pg_attribute` - the system table describing every table column
//!
//! One row per column with the layout `oid, attrelid, attname, atttypid,
//! attlen, attnum`. The column order is not Postgres's.

use std::sync::Arc;

use tracing::debug;

use super::{
    Catalog, CatalogError, CatalogResult, ColumnOid, Row, SqlTableRw, TableDef, TableOid,
};
use crate::types::{TypeId, Value};

/// System table name
pub const PG_ATTRIBUTE: &str = "pg_attribute";

/// Column layout of `pg_attribute`
pub const SCHEMA_COLUMNS: &[(&str, TypeId)] = &[
    ("oid", TypeId::Integer),
    ("attrelid", TypeId::Integer),
    ("attname", TypeId::Varchar),
    ("atttypid", TypeId::Integer),
    ("attlen", TypeId::Integer),
    ("attnum", TypeId::Integer),
];

/// A single `pg_attribute` row
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeEntry {
    oid: ColumnOid,
    row: Row,
}

impl AttributeEntry {
    fn from_row(row: Row) -> CatalogResult<Self> {
        let oid = row
            .first()
            .and_then(Value::as_i64)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| CatalogError::InvalidRow("pg_attribute row without oid".to_string()))?;
        Ok(Self {
            oid: ColumnOid(oid),
            row,
        })
    }

    /// Column OID
    pub fn oid(&self) -> ColumnOid {
        self.oid
    }

    /// OID of the table owning the column
    pub fn table_oid(&self) -> Option<TableOid> {
        self.int_at(1).map(TableOid)
    }

    /// Column name
    pub fn name(&self) -> Option<&str> {
        self.row.get(2).and_then(Value::as_str)
    }

    /// Column type
    pub fn type_id(&self) -> Option<TypeId> {
        self.row
            .get(3)
            .and_then(Value::as_i64)
            .and_then(|v| i32::try_from(v).ok())
            .and_then(TypeId::from_code)
    }

    /// Ordinal position of the column in its table, starting at 1
    pub fn attnum(&self) -> Option<u32> {
        self.int_at(5)
    }

    /// Raw row
    pub fn row(&self) -> &[Value] {
        &self.row
    }

    fn int_at(&self, idx: usize) -> Option<u32> {
        self.row
            .get(idx)
            .and_then(Value::as_i64)
            .and_then(|v| u32::try_from(v).ok())
    }
}

/// Accessor over the `pg_attribute` row store
#[derive(Debug, Clone)]
pub struct AttributeHandle {
    pg_attribute: Arc<SqlTableRw>,
}

impl AttributeHandle {
    /// Wrap an existing `pg_attribute` row store
    pub fn new(pg_attribute: Arc<SqlTableRw>) -> Self {
        Self { pg_attribute }
    }

    /// Create the `pg_attribute` table and register it in the catalog
    ///
    /// Allocates the table OID and one OID per schema column.
    pub fn create(catalog: &mut Catalog, name: &str) -> CatalogResult<Self> {
        let table_oid = TableOid(catalog.next_oid());
        let mut table = SqlTableRw::new(table_oid);
        for (col_name, type_id) in SCHEMA_COLUMNS {
            table.define_column(*col_name, *type_id, false, ColumnOid(catalog.next_oid()))?;
        }
        table.create();
        let table = Arc::new(table);
        catalog.add_to_maps(name, Arc::clone(&table))?;
        debug!(%table_oid, name, "Created attribute catalog");
        Ok(Self::new(table))
    }

    /// Underlying row store
    pub fn sql_table(&self) -> &Arc<SqlTableRw> {
        &self.pg_attribute
    }

    /// Insert one row per column of `table`
    pub fn add_table_columns(&self, table: &TableDef) -> CatalogResult<()> {
        for (idx, col) in table.columns.iter().enumerate() {
            let attnum = i32::try_from(idx + 1)
                .map_err(|_| CatalogError::InvalidRow("too many columns".to_string()))?;
            self.pg_attribute.insert_row(vec![
                Value::Integer(oid_value(col.oid.0)?),
                Value::Integer(oid_value(table.oid.0)?),
                Value::Varchar(col.name.clone()),
                Value::Integer(col.type_id.code()),
                Value::Integer(col.type_id.size()),
                Value::Integer(attnum),
            ])?;
        }
        Ok(())
    }

    /// Look up a column by OID
    ///
    /// Returns `Ok(None)` when no such column is registered for the table.
    pub fn get_attribute_entry(
        &self,
        table_oid: TableOid,
        col_oid: ColumnOid,
    ) -> CatalogResult<Option<AttributeEntry>> {
        let search = vec![
            Value::Integer(oid_value(col_oid.0)?),
            Value::Integer(oid_value(table_oid.0)?),
        ];
        match self.pg_attribute.find_row(&search)? {
            Some(row) => Ok(Some(AttributeEntry::from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Look up a column by name
    ///
    /// Fails with [`CatalogError::AttributeNotFound`] when the table has no
    /// column of that name.
    pub fn get_attribute_entry_by_name(
        &self,
        table_oid: TableOid,
        name: &str,
    ) -> CatalogResult<AttributeEntry> {
        let search = vec![
            Value::Null(TypeId::Integer),
            Value::Integer(oid_value(table_oid.0)?),
            Value::Varchar(name.to_string()),
        ];
        let row = self
            .pg_attribute
            .find_row(&search)?
            .ok_or_else(|| CatalogError::AttributeNotFound {
                table_oid,
                name: name.to_string(),
            })?;
        AttributeEntry::from_row(row)
    }

    /// Delete all attribute rows of a table, returning the count
    pub fn delete_entries(&self, table_oid: TableOid) -> usize {
        let target = i64::from(table_oid.0);
        let deleted = self
            .pg_attribute
            .delete_where(|row| row.get(1).and_then(Value::as_i64) == Some(target));
        debug!(%table_oid, deleted, "Deleted attribute entries");
        deleted
    }
}

fn oid_value(oid: u32) -> CatalogResult<i32> {
    i32::try_from(oid).map_err(|_| CatalogError::InvalidRow(format!("oid {} out of range", oid)))
}
