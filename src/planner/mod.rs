//! Physical query plans
//!
//! Plan trees handed from the optimizer to the execution engine: immutable
//! operator nodes built through builders, scalar expressions they own, and
//! a tagged JSON form that round-trips a tree exactly.
//!
//! ## Example
//!
//! ```
//! use qplan::catalog::TableOid;
//! use qplan::planner::{Expression, HashPlan, PlanNode, PlanNodeBuilder, SeqScanPlan};
//!
//! let scan = SeqScanPlan::builder().table_oid(TableOid(1001)).build()?;
//! let plan = HashPlan::builder()
//!     .hash_key(Expression::parameter(0))
//!     .add_child(scan)
//!     .build()?;
//!
//! let back = PlanNode::from_json(&plan.to_json()?)?;
//! assert_eq!(back, plan);
//! # Ok::<(), qplan::planner::PlannerError>(())
//! ```

pub mod cache;
pub mod codec;
pub mod error;
pub mod explain;
pub mod expr;
pub mod node;
pub mod schema;

#[cfg(test)]
pub(crate) mod test_utils;

pub use cache::{CacheStats, PlanCache, PlanCacheConfig};
pub use codec::deserialize_plan_node;
pub use error::{PlannerError, PlannerResult};
pub use explain::ExplainOutput;
pub use expr::{Expression, ExpressionType};
pub use node::{
    AggregateBuilder, AggregatePlan, AggregateStrategy, AggregateTerm, BuilderBase,
    CreateFunctionBuilder, CreateFunctionPlan, CsvScanBuilder, CsvScanPlan, HashBuilder, HashPlan,
    IndexScanBuilder, IndexScanPlan, InsertBuilder, InsertParameter, InsertPlan, PlanBody,
    PlanNode, PlanNodeBuilder, PlanNodeType, SeqScanBuilder, SeqScanPlan,
    DEFAULT_ESTIMATED_CARDINALITY,
};
pub use schema::{OutputColumn, OutputSchema, SchemaRef};
