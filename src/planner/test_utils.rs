//! Shared test utilities for planner module tests

use crate::catalog::{Catalog, ColumnDef, TableDef};
use crate::planner::expr::{Expression, ExpressionType};
use crate::planner::node::{HashPlan, PlanNode, PlanNodeBuilder, SeqScanPlan};
use crate::planner::schema::{OutputSchema, SchemaRef};
use crate::types::TypeId;

/// Create a test catalog with a "users" table
pub fn test_catalog() -> Catalog {
    let mut catalog = Catalog::new();

    let users = TableDef::new("users")
        .column(ColumnDef::new("id", TypeId::Integer).nullable(false))
        .column(ColumnDef::new("name", TypeId::Varchar))
        .column(ColumnDef::new("age", TypeId::Integer).default(0));

    catalog.create_table(users).unwrap();
    catalog
}

/// The "users" table with its assigned OIDs
pub fn users_table() -> TableDef {
    test_catalog().get_table_by_name("users").unwrap().clone()
}

pub fn users_schema() -> SchemaRef {
    OutputSchema::from_table(&users_table()).into_ref()
}

/// `Hash(users.id)` over `SeqScan(users) WHERE age > 18`
pub fn hash_join_build_plan() -> PlanNode {
    let users = users_table();
    let col = |name: &str| {
        let c = users.get_column(name).unwrap();
        Expression::column(users.oid, c.oid, c.type_id)
    };

    let scan = SeqScanPlan::builder()
        .table_oid(users.oid)
        .predicate(Expression::compare(
            ExpressionType::CompareGreaterThan,
            col("age"),
            Expression::constant(18),
        )
        .unwrap())
        .output_schema(users_schema())
        .estimated_cardinality(250)
        .build()
        .unwrap();

    HashPlan::builder()
        .hash_key(col("id"))
        .output_schema(users_schema())
        .estimated_cardinality(250)
        .add_child(scan)
        .build()
        .unwrap()
}
