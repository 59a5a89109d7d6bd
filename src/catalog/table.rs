//! In-memory row store for catalog tables
//!
//! A `SqlTableRw` is defined column by column, then frozen with
//! [`SqlTableRw::create`]. After that rows can be inserted, looked up by a
//! search vector, scanned and deleted by predicate. Readers and writers may
//! run concurrently; rows live behind a `parking_lot::RwLock`.

use parking_lot::RwLock;

use super::{CatalogError, CatalogResult, ColumnDef, ColumnOid, TableOid};
use crate::types::{TypeId, Value};

/// A catalog row
pub type Row = Vec<Value>;

/// Row store for a single catalog table
#[derive(Debug)]
pub struct SqlTableRw {
    oid: TableOid,
    columns: Vec<ColumnDef>,
    created: bool,
    rows: RwLock<Vec<Row>>,
}

impl SqlTableRw {
    /// Create an empty, undefined table
    pub fn new(oid: TableOid) -> Self {
        Self {
            oid,
            columns: Vec::new(),
            created: false,
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Table OID
    pub fn oid(&self) -> TableOid {
        self.oid
    }

    /// Column layout
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Add a column to the layout. Only valid before [`SqlTableRw::create`].
    pub fn define_column(
        &mut self,
        name: impl Into<String>,
        type_id: TypeId,
        nullable: bool,
        oid: ColumnOid,
    ) -> CatalogResult<()> {
        let name = name.into();
        if self.created {
            return Err(CatalogError::InvalidRow(format!(
                "cannot define column '{}' after table {} was created",
                name, self.oid
            )));
        }
        self.columns
            .push(ColumnDef::new(name, type_id).nullable(nullable).with_oid(oid));
        Ok(())
    }

    /// Freeze the column layout
    pub fn create(&mut self) {
        self.created = true;
    }

    /// Position of a column by name
    pub fn col_name_to_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Insert a row, checking arity, nullability and column types
    pub fn insert_row(&self, row: Row) -> CatalogResult<()> {
        if !self.created {
            return Err(CatalogError::InvalidRow(format!(
                "table {} has not been created",
                self.oid
            )));
        }
        if row.len() != self.columns.len() {
            return Err(CatalogError::InvalidRow(format!(
                "expected {} values, got {}",
                self.columns.len(),
                row.len()
            )));
        }
        for (value, col) in row.iter().zip(&self.columns) {
            if value.is_null() {
                if !col.nullable {
                    return Err(CatalogError::InvalidRow(format!(
                        "column '{}' is not nullable",
                        col.name
                    )));
                }
            } else if value.type_id() != col.type_id {
                return Err(CatalogError::TypeMismatch {
                    expected: col.type_id,
                    found: value.type_id(),
                });
            }
        }
        self.rows.write().push(row);
        Ok(())
    }

    /// Find the first row matching a search vector
    ///
    /// The search vector is matched positionally against the leading
    /// columns. NULL entries are wildcards. A search vector longer than the
    /// row fails with `InvalidRow`.
    pub fn find_row(&self, search: &[Value]) -> CatalogResult<Option<Row>> {
        if search.len() > self.columns.len() {
            return Err(CatalogError::InvalidRow(format!(
                "search has {} values, table {} has {} columns",
                search.len(),
                self.oid,
                self.columns.len()
            )));
        }
        let rows = self.rows.read();
        for row in rows.iter() {
            if Self::matches(row, search)? {
                return Ok(Some(row.clone()));
            }
        }
        Ok(None)
    }

    fn matches(row: &[Value], search: &[Value]) -> CatalogResult<bool> {
        for (value, key) in row.iter().zip(search) {
            if key.is_null() {
                continue;
            }
            let eq = value
                .sql_eq(key)
                .map_err(|_| CatalogError::TypeMismatch {
                    expected: value.type_id(),
                    found: key.type_id(),
                })?;
            if eq != Some(true) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Snapshot of all rows
    pub fn scan(&self) -> Vec<Row> {
        self.rows.read().clone()
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.rows.read().len()
    }

    /// Delete every row for which `predicate` holds, returning the count
    pub fn delete_where<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&[Value]) -> bool,
    {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|row| !predicate(row));
        before - rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_table() -> SqlTableRw {
        let mut table = SqlTableRw::new(TableOid(1));
        table
            .define_column("id", TypeId::Integer, false, ColumnOid(2))
            .unwrap();
        table
            .define_column("name", TypeId::Varchar, true, ColumnOid(3))
            .unwrap();
        table.create();
        table
    }

    #[test]
    fn test_define_after_create_fails() {
        let mut table = test_table();
        assert!(matches!(
            table.define_column("x", TypeId::Integer, true, ColumnOid(4)),
            Err(CatalogError::InvalidRow(_))
        ));
    }

    #[test]
    fn test_insert_validates_rows() {
        let table = test_table();
        table.insert_row(vec![Value::Integer(1), Value::from("a")]).unwrap();

        assert!(matches!(
            table.insert_row(vec![Value::Integer(1)]),
            Err(CatalogError::InvalidRow(_))
        ));
        assert!(matches!(
            table.insert_row(vec![Value::from("x"), Value::from("a")]),
            Err(CatalogError::TypeMismatch { .. })
        ));
        assert!(matches!(
            table.insert_row(vec![Value::Null(TypeId::Integer), Value::from("a")]),
            Err(CatalogError::InvalidRow(_))
        ));
        assert_eq!(table.num_rows(), 1);
    }

    #[test]
    fn test_find_row_rejects_long_search() {
        let table = test_table();
        table.insert_row(vec![Value::Integer(1), Value::from("a")]).unwrap();

        let search = [Value::Integer(1), Value::from("a"), Value::from("extra")];
        assert!(matches!(
            table.find_row(&search),
            Err(CatalogError::InvalidRow(_))
        ));
        assert!(table
            .find_row(&[Value::Integer(1), Value::from("a")])
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_find_row_with_wildcards() {
        let table = test_table();
        table.insert_row(vec![Value::Integer(1), Value::from("a")]).unwrap();
        table.insert_row(vec![Value::Integer(2), Value::from("b")]).unwrap();

        let row = table.find_row(&[Value::Integer(2)]).unwrap().unwrap();
        assert_eq!(row[1], Value::from("b"));

        let row = table
            .find_row(&[Value::Null(TypeId::Integer), Value::from("a")])
            .unwrap()
            .unwrap();
        assert_eq!(row[0], Value::Integer(1));

        assert!(table.find_row(&[Value::Integer(3)]).unwrap().is_none());
        assert!(matches!(
            table.find_row(&[Value::from("1")]),
            Err(CatalogError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_delete_where() {
        let table = test_table();
        for i in 0..5 {
            table.insert_row(vec![Value::Integer(i), Value::Null(TypeId::Varchar)]).unwrap();
        }
        let deleted = table.delete_where(|row| row[0].as_i64().is_some_and(|v| v % 2 == 0));
        assert_eq!(deleted, 3);
        assert_eq!(table.scan().len(), 2);
        assert_eq!(table.col_name_to_index("name"), Some(1));
    }
}
