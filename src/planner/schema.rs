//! Output schemas attached to plan nodes

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::TableDef;
use crate::types::TypeId;

/// Output schema shared between plan nodes describing the same tuple shape
pub type SchemaRef = Arc<OutputSchema>;

/// Output column of a plan node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputColumn {
    /// Column name (or alias)
    pub name: String,
    /// Value type
    pub type_id: TypeId,
    /// Whether the column can be NULL
    pub nullable: bool,
}

impl OutputColumn {
    /// Create a nullable output column
    pub fn new(name: impl Into<String>, type_id: TypeId) -> Self {
        Self {
            name: name.into(),
            type_id,
            nullable: true,
        }
    }

    /// Set nullable
    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

/// Ordered list of output columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputSchema {
    columns: Vec<OutputColumn>,
}

impl OutputSchema {
    pub fn new(columns: Vec<OutputColumn>) -> Self {
        Self { columns }
    }

    /// Schema with one column per table column, in table order
    pub fn from_table(table: &TableDef) -> Self {
        Self::new(
            table
                .columns
                .iter()
                .map(|c| OutputColumn::new(c.name.clone(), c.type_id).nullable(c.nullable))
                .collect(),
        )
    }

    /// Wrap in a shareable reference
    pub fn into_ref(self) -> SchemaRef {
        Arc::new(self)
    }

    pub fn columns(&self) -> &[OutputColumn] {
        &self.columns
    }

    pub fn column(&self, idx: usize) -> Option<&OutputColumn> {
        self.columns.get(idx)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
