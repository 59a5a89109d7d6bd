//! Insert into a table
//!
//! An insert either carries literal rows (`INSERT ... VALUES`) or takes its
//! tuples from a single child (`INSERT ... SELECT`). Literal rows are stored
//! in table-schema order with every column filled: listed columns get the
//! statement's values, the rest get their declared default.
//!
//! Parameter placeholders (`$n`) in VALUES lists are not resolved here. The
//! slot holds a typed NULL and a matching [`InsertParameter`] records where
//! the bound value goes at execution time.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{required, BuilderBase, PlanBody, PlanNode, PlanNodeBuilder, PlanNodeType};
use crate::catalog::{ColumnDef, TableDef, TableOid};
use crate::planner::error::{PlannerError, PlannerResult};
use crate::planner::expr::Expression;
use crate::types::{TypeId, Value};

fn default_bulk_insert_count() -> u32 {
    1
}

/// Destination of a bound parameter in the VALUES rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InsertParameter {
    /// Row in [`InsertPlan::values`]
    pub tuple_index: u32,
    /// Column in table-schema order
    pub column_index: u32,
    /// Ordinal of the statement parameter
    pub parameter_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InsertPlan {
    target_table_oid: TableOid,
    #[serde(default = "default_bulk_insert_count")]
    bulk_insert_count: u32,
    #[serde(default)]
    values: Vec<Vec<Value>>,
    #[serde(default)]
    parameters: Vec<InsertParameter>,
    #[serde(default)]
    parameter_types: Vec<TypeId>,
}

impl InsertPlan {
    pub fn builder() -> InsertBuilder {
        InsertBuilder::default()
    }

    pub fn target_table_oid(&self) -> TableOid {
        self.target_table_oid
    }

    /// Number of times the rows are inserted
    pub fn bulk_insert_count(&self) -> u32 {
        self.bulk_insert_count
    }

    /// Literal rows in table-schema order
    pub fn values(&self) -> &[Vec<Value>] {
        &self.values
    }

    pub fn parameters(&self) -> &[InsertParameter] {
        &self.parameters
    }

    /// Expected type of each entry of [`InsertPlan::parameters`]
    pub fn parameter_types(&self) -> &[TypeId] {
        &self.parameter_types
    }

    /// Whether the rows need bound parameters before execution
    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.bulk_insert_count == 0 {
            return Err(format!("{} bulk count must be positive", PlanNodeType::Insert));
        }
        if self.parameters.len() != self.parameter_types.len() {
            return Err(format!(
                "{} has {} parameters but {} parameter types",
                PlanNodeType::Insert,
                self.parameters.len(),
                self.parameter_types.len()
            ));
        }
        if let Some(first) = self.values.first() {
            if self.values.iter().any(|row| row.len() != first.len()) {
                return Err(format!("{} rows differ in width", PlanNodeType::Insert));
            }
        }
        let width = self.values.first().map_or(0, Vec::len);
        for p in &self.parameters {
            if p.tuple_index as usize >= self.values.len() || p.column_index as usize >= width {
                return Err(format!(
                    "{} parameter ${} targets ({}, {}) outside the VALUES rows",
                    PlanNodeType::Insert,
                    p.parameter_index,
                    p.tuple_index,
                    p.column_index
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct InsertBuilder {
    base: BuilderBase,
    target_table_oid: Option<TableOid>,
    bulk_insert_count: u32,
    values: Vec<Vec<Value>>,
    parameters: Vec<InsertParameter>,
    parameter_types: Vec<TypeId>,
}

impl Default for InsertBuilder {
    fn default() -> Self {
        Self {
            base: BuilderBase::default(),
            target_table_oid: None,
            bulk_insert_count: default_bulk_insert_count(),
            values: Vec::new(),
            parameters: Vec::new(),
            parameter_types: Vec::new(),
        }
    }
}

impl InsertBuilder {
    #[must_use]
    pub fn target_table_oid(mut self, oid: TableOid) -> Self {
        self.target_table_oid = Some(oid);
        self
    }

    #[must_use]
    pub fn bulk_insert_count(mut self, count: u32) -> Self {
        self.bulk_insert_count = count;
        self
    }

    /// Append an already resolved row in table-schema order
    #[must_use]
    pub fn row(mut self, row: Vec<Value>) -> Self {
        self.values.push(row);
        self
    }

    /// Resolve `INSERT INTO table (columns) VALUES rows` against the table.
    ///
    /// An empty `columns` list means every table column in schema order.
    /// Sets the target table. Fails with [`PlannerError::NotFound`] for an
    /// unknown column name, [`PlannerError::TypeMismatch`] for a constant
    /// that cannot be converted to its column's type, and
    /// [`PlannerError::BuilderValidation`] if the builder already targets a
    /// different table.
    pub fn values_from_columns<S: AsRef<str>>(
        mut self,
        table: &TableDef,
        columns: &[S],
        rows: Vec<Vec<Expression>>,
    ) -> PlannerResult<Self> {
        if let Some(existing) = self.target_table_oid {
            if existing != table.oid {
                return Err(PlannerError::BuilderValidation(format!(
                    "INSERT already targets table {}, cannot add rows for '{}' ({})",
                    existing, table.name, table.oid
                )));
            }
        }
        let targets = resolve_columns(table, columns)?;

        for (tuple_idx, exprs) in rows.into_iter().enumerate() {
            if exprs.len() != targets.len() {
                return Err(PlannerError::BuilderValidation(format!(
                    "INSERT row {} has {} values for {} columns",
                    tuple_idx,
                    exprs.len(),
                    targets.len()
                )));
            }

            let mut row: Vec<Option<Value>> = vec![None; table.columns.len()];
            for (expr, &schema_idx) in exprs.into_iter().zip(&targets) {
                let column = &table.columns[schema_idx];
                let value = match expr {
                    Expression::Constant { value } => {
                        if value.is_null() && !column.nullable {
                            return Err(PlannerError::BuilderValidation(format!(
                                "NULL value for non-nullable column '{}'",
                                column.name
                            )));
                        }
                        value.cast_to(column.type_id)?
                    }
                    Expression::Parameter { value_idx } => {
                        self.parameters.push(InsertParameter {
                            tuple_index: index_u32(self.values.len())?,
                            column_index: index_u32(schema_idx)?,
                            parameter_index: value_idx,
                        });
                        self.parameter_types.push(column.type_id);
                        Value::Null(column.type_id)
                    }
                    other => {
                        return Err(PlannerError::BuilderValidation(format!(
                            "INSERT value for column '{}' must be a constant or parameter, got {:?}",
                            column.name,
                            other.expression_type()
                        )));
                    }
                };
                row[schema_idx] = Some(value);
            }

            let row = row
                .into_iter()
                .zip(&table.columns)
                .map(|(slot, column)| match slot {
                    Some(v) => Ok(v),
                    None => default_value(column),
                })
                .collect::<PlannerResult<Vec<_>>>()?;
            self.values.push(row);
        }

        debug!(
            table = %table.name,
            rows = self.values.len(),
            parameters = self.parameters.len(),
            "Resolved INSERT values"
        );
        self.target_table_oid = Some(table.oid);
        Ok(self)
    }
}

/// Map statement column names to table-schema indexes
fn resolve_columns<S: AsRef<str>>(table: &TableDef, columns: &[S]) -> PlannerResult<Vec<usize>> {
    if columns.is_empty() {
        return Ok((0..table.columns.len()).collect());
    }
    let mut targets = Vec::with_capacity(columns.len());
    for name in columns {
        let name = name.as_ref();
        let idx = table.get_column_index(name).ok_or_else(|| {
            PlannerError::NotFound(format!("column '{}' in table '{}'", name, table.name))
        })?;
        if targets.contains(&idx) {
            return Err(PlannerError::BuilderValidation(format!(
                "column '{}' specified more than once",
                name
            )));
        }
        targets.push(idx);
    }
    Ok(targets)
}

fn default_value(column: &ColumnDef) -> PlannerResult<Value> {
    match &column.default {
        Some(default) => Ok(default.cast_to(column.type_id)?),
        None if column.nullable => Ok(Value::Null(column.type_id)),
        None => Err(PlannerError::BuilderValidation(format!(
            "column '{}' is not nullable and has no default",
            column.name
        ))),
    }
}

fn index_u32(idx: usize) -> PlannerResult<u32> {
    u32::try_from(idx)
        .map_err(|_| PlannerError::BuilderValidation(format!("index {} out of range", idx)))
}

impl PlanNodeBuilder for InsertBuilder {
    fn base_mut(&mut self) -> &mut BuilderBase {
        &mut self.base
    }

    fn build(self) -> PlannerResult<PlanNode> {
        let body = InsertPlan {
            target_table_oid: required(
                self.target_table_oid,
                PlanNodeType::Insert,
                "target_table_oid",
            )?,
            bulk_insert_count: self.bulk_insert_count,
            values: self.values,
            parameters: self.parameters,
            parameter_types: self.parameter_types,
        };
        self.base.finish(PlanBody::Insert(body))
    }
}
