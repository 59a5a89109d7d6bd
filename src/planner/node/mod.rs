//! Physical plan nodes
//!
//! A [`PlanNode`] carries the fields every operator shares (children,
//! output schema, estimated cardinality) around a [`PlanBody`] that holds
//! the operator-specific payload. The set of operators is closed; adding
//! one means adding a `PlanBody` variant, a `PlanNodeType` tag and a match
//! arm in the codec, all of which the compiler checks.
//!
//! Nodes are produced only by builders (see [`PlanNodeBuilder`]) and are
//! immutable afterwards, so a built tree is `Send + Sync` and can be read
//! by any number of executors without locking.
//!
//! ## Structural identity
//!
//! Equality and hashing are defined once, here, over
//! `(node type, output schema, body, children in order)`. The estimated
//! cardinality never participates. Output schemas do: two nodes that
//! produce differently shaped tuples are never interchangeable in a plan
//! cache.

pub mod aggregate;
pub mod create_function;
pub mod csv_scan;
pub mod hash;
pub mod index_scan;
pub mod insert;
pub mod seq_scan;

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::planner::error::{PlannerError, PlannerResult};
use crate::planner::expr::Expression;
use crate::planner::schema::SchemaRef;

pub use aggregate::{AggregateBuilder, AggregatePlan, AggregateStrategy, AggregateTerm};
pub use create_function::{CreateFunctionBuilder, CreateFunctionPlan};
pub use csv_scan::{CsvScanBuilder, CsvScanPlan};
pub use hash::{HashBuilder, HashPlan};
pub use index_scan::{IndexScanBuilder, IndexScanPlan};
pub use insert::{InsertBuilder, InsertParameter, InsertPlan};
pub use seq_scan::{SeqScanBuilder, SeqScanPlan};

/// Cardinality reported for nodes the planner never estimated
pub const DEFAULT_ESTIMATED_CARDINALITY: u32 = 500_000;

/// Plan node type tags, as written in serialized plans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanNodeType {
    #[serde(rename = "SEQSCAN")]
    SeqScan,
    #[serde(rename = "INDEXSCAN")]
    IndexScan,
    #[serde(rename = "CSVSCAN")]
    CsvScan,
    #[serde(rename = "HASH")]
    Hash,
    #[serde(rename = "AGGREGATE")]
    Aggregate,
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "CREATE_FUNC")]
    CreateFunc,
}

impl PlanNodeType {
    /// All known tags
    pub const ALL: [PlanNodeType; 7] = [
        PlanNodeType::SeqScan,
        PlanNodeType::IndexScan,
        PlanNodeType::CsvScan,
        PlanNodeType::Hash,
        PlanNodeType::Aggregate,
        PlanNodeType::Insert,
        PlanNodeType::CreateFunc,
    ];

    /// Serialized tag
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanNodeType::SeqScan => "SEQSCAN",
            PlanNodeType::IndexScan => "INDEXSCAN",
            PlanNodeType::CsvScan => "CSVSCAN",
            PlanNodeType::Hash => "HASH",
            PlanNodeType::Aggregate => "AGGREGATE",
            PlanNodeType::Insert => "INSERT",
            PlanNodeType::CreateFunc => "CREATE_FUNC",
        }
    }

    /// Parse a serialized tag; `None` for tags no variant is registered under
    pub fn from_tag(tag: &str) -> Option<PlanNodeType> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }

    /// Allowed number of children, inclusive
    pub fn arity(&self) -> (usize, usize) {
        match self {
            PlanNodeType::SeqScan
            | PlanNodeType::IndexScan
            | PlanNodeType::CsvScan
            | PlanNodeType::CreateFunc => (0, 0),
            PlanNodeType::Hash | PlanNodeType::Aggregate => (1, 1),
            // INSERT ... SELECT has the SELECT as its only child
            PlanNodeType::Insert => (0, 1),
        }
    }

    /// Check a child count against [`PlanNodeType::arity`]
    pub fn check_arity(&self, children: usize) -> Result<(), String> {
        let (min, max) = self.arity();
        if children < min || children > max {
            let expected = if min == max {
                format!("{}", min)
            } else {
                format!("{} to {}", min, max)
            };
            return Err(format!(
                "{} expects {} children, got {}",
                self, expected, children
            ));
        }
        Ok(())
    }
}

impl fmt::Display for PlanNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-specific payload of a plan node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlanBody {
    SeqScan(SeqScanPlan),
    IndexScan(IndexScanPlan),
    CsvScan(CsvScanPlan),
    Hash(HashPlan),
    Aggregate(AggregatePlan),
    Insert(InsertPlan),
    CreateFunction(CreateFunctionPlan),
}

impl PlanBody {
    pub fn node_type(&self) -> PlanNodeType {
        match self {
            PlanBody::SeqScan(_) => PlanNodeType::SeqScan,
            PlanBody::IndexScan(_) => PlanNodeType::IndexScan,
            PlanBody::CsvScan(_) => PlanNodeType::CsvScan,
            PlanBody::Hash(_) => PlanNodeType::Hash,
            PlanBody::Aggregate(_) => PlanNodeType::Aggregate,
            PlanBody::Insert(_) => PlanNodeType::Insert,
            PlanBody::CreateFunction(_) => PlanNodeType::CreateFunc,
        }
    }

    /// Expressions carried by the payload, in field order
    pub fn expressions(&self) -> Vec<&Expression> {
        match self {
            PlanBody::SeqScan(p) => p.predicate().into_iter().collect(),
            PlanBody::IndexScan(p) => p.predicate().into_iter().collect(),
            PlanBody::Hash(p) => p.hash_keys().iter().collect(),
            PlanBody::Aggregate(p) => p
                .having_clause_predicate()
                .into_iter()
                .chain(p.aggregate_terms().iter().map(|t| &t.expression))
                .collect(),
            PlanBody::CsvScan(_) | PlanBody::Insert(_) | PlanBody::CreateFunction(_) => Vec::new(),
        }
    }

    /// Payload invariants shared by builders and the deserializer
    pub(crate) fn validate(&self) -> Result<(), String> {
        for expr in self.expressions() {
            expr.check_operators()
                .map_err(|e| format!("{}: {}", self.node_type(), e))?;
        }
        match self {
            PlanBody::SeqScan(_) | PlanBody::IndexScan(_) => Ok(()),
            PlanBody::CsvScan(p) => p.validate(),
            PlanBody::Hash(p) => p.validate(),
            PlanBody::Aggregate(p) => p.validate(),
            PlanBody::Insert(p) => p.validate(),
            PlanBody::CreateFunction(p) => p.validate(),
        }
    }
}

/// A node in a physical plan tree
#[derive(Debug, Clone)]
pub struct PlanNode {
    children: Vec<PlanNode>,
    output_schema: Option<SchemaRef>,
    estimated_cardinality: Option<u32>,
    body: PlanBody,
}

impl PlanNode {
    /// Assemble a node after its body has been validated
    pub(crate) fn assemble(
        body: PlanBody,
        children: Vec<PlanNode>,
        output_schema: Option<SchemaRef>,
        estimated_cardinality: Option<u32>,
    ) -> Result<Self, String> {
        body.node_type().check_arity(children.len())?;
        body.validate()?;
        Ok(Self {
            children,
            output_schema,
            estimated_cardinality,
            body,
        })
    }

    pub fn node_type(&self) -> PlanNodeType {
        self.body.node_type()
    }

    pub fn body(&self) -> &PlanBody {
        &self.body
    }

    pub fn children(&self) -> &[PlanNode] {
        &self.children
    }

    pub fn child(&self, idx: usize) -> Option<&PlanNode> {
        self.children.get(idx)
    }

    pub fn children_size(&self) -> usize {
        self.children.len()
    }

    pub fn output_schema(&self) -> Option<&SchemaRef> {
        self.output_schema.as_ref()
    }

    /// Estimated cardinality, or [`DEFAULT_ESTIMATED_CARDINALITY`] if the
    /// planner never set one
    pub fn estimated_cardinality(&self) -> u32 {
        self.estimated_cardinality
            .unwrap_or(DEFAULT_ESTIMATED_CARDINALITY)
    }

    /// Whether the planner supplied an estimate
    pub fn is_cardinality_estimated(&self) -> bool {
        self.estimated_cardinality.is_some()
    }

    pub(crate) fn raw_estimated_cardinality(&self) -> Option<u32> {
        self.estimated_cardinality
    }

    /// Override the estimated cardinality.
    ///
    /// Only for plan construction and tests; a node shared with executors
    /// is behind a shared reference and cannot reach this.
    pub fn set_estimated_cardinality(&mut self, cardinality: u32) {
        self.estimated_cardinality = Some(cardinality);
    }

    /// Structural fingerprint of the whole subtree, usable as a plan-cache key
    pub fn plan_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Total number of nodes in the subtree
    pub fn tree_size(&self) -> usize {
        1 + self.children.iter().map(PlanNode::tree_size).sum::<usize>()
    }

    pub fn as_seq_scan(&self) -> Option<&SeqScanPlan> {
        match &self.body {
            PlanBody::SeqScan(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_index_scan(&self) -> Option<&IndexScanPlan> {
        match &self.body {
            PlanBody::IndexScan(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_csv_scan(&self) -> Option<&CsvScanPlan> {
        match &self.body {
            PlanBody::CsvScan(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_hash(&self) -> Option<&HashPlan> {
        match &self.body {
            PlanBody::Hash(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_aggregate(&self) -> Option<&AggregatePlan> {
        match &self.body {
            PlanBody::Aggregate(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_insert(&self) -> Option<&InsertPlan> {
        match &self.body {
            PlanBody::Insert(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_create_function(&self) -> Option<&CreateFunctionPlan> {
        match &self.body {
            PlanBody::CreateFunction(p) => Some(p),
            _ => None,
        }
    }
}

impl PartialEq for PlanNode {
    fn eq(&self, other: &Self) -> bool {
        if self.node_type() != other.node_type() {
            return false;
        }
        if self.output_schema != other.output_schema || self.body != other.body {
            return false;
        }
        self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a == b)
    }
}

impl Eq for PlanNode {}

impl Hash for PlanNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node_type().hash(state);
        self.output_schema.hash(state);
        self.body.hash(state);
        self.children.len().hash(state);
        for child in &self.children {
            child.hash(state);
        }
    }
}

/// Fields every builder accumulates before `build()`
#[derive(Debug, Default)]
pub struct BuilderBase {
    children: Vec<PlanNode>,
    output_schema: Option<SchemaRef>,
    estimated_cardinality: Option<u32>,
}

impl BuilderBase {
    /// Validate arity and payload, then produce the node
    pub(crate) fn finish(self, body: PlanBody) -> PlannerResult<PlanNode> {
        PlanNode::assemble(
            body,
            self.children,
            self.output_schema,
            self.estimated_cardinality,
        )
        .map_err(PlannerError::BuilderValidation)
    }
}

/// Staged construction of an immutable plan node
///
/// Setters consume and return the builder; `build` consumes it, so a
/// builder cannot be reused after producing a node.
pub trait PlanNodeBuilder: Sized {
    /// Shared fields
    fn base_mut(&mut self) -> &mut BuilderBase;

    /// Validate the accumulated fields and produce the node
    fn build(self) -> PlannerResult<PlanNode>;

    /// Append a child; order is significant
    #[must_use]
    fn add_child(mut self, child: PlanNode) -> Self {
        self.base_mut().children.push(child);
        self
    }

    /// Append several children in order
    #[must_use]
    fn add_children(mut self, children: impl IntoIterator<Item = PlanNode>) -> Self {
        self.base_mut().children.extend(children);
        self
    }

    #[must_use]
    fn output_schema(mut self, schema: SchemaRef) -> Self {
        self.base_mut().output_schema = Some(schema);
        self
    }

    #[must_use]
    fn estimated_cardinality(mut self, cardinality: u32) -> Self {
        self.base_mut().estimated_cardinality = Some(cardinality);
        self
    }
}

/// Unwrap a required builder field
pub(crate) fn required<T>(field: Option<T>, node: PlanNodeType, name: &str) -> PlannerResult<T> {
    field.ok_or_else(|| {
        PlannerError::BuilderValidation(format!("{} requires '{}' to be set", node, name))
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::TableOid;
    use crate::planner::expr::{Expression, ExpressionType};
    use crate::planner::schema::{OutputColumn, OutputSchema};
    use crate::types::TypeId;

    fn scan(table: u32) -> PlanNode {
        SeqScanPlan::builder()
            .table_oid(TableOid(table))
            .build()
            .unwrap()
    }

    fn hash_over(child: PlanNode, key: Expression) -> PlanNode {
        HashPlan::builder().hash_key(key).add_child(child).build().unwrap()
    }

    #[test]
    fn test_tag_roundtrip() {
        for t in PlanNodeType::ALL {
            assert_eq!(PlanNodeType::from_tag(t.as_str()), Some(t));
        }
        assert_eq!(PlanNodeType::from_tag("NESTLOOP"), None);
    }

    #[test]
    fn test_cardinality_default_and_override() {
        let mut node = scan(1);
        assert!(!node.is_cardinality_estimated());
        assert_eq!(node.estimated_cardinality(), DEFAULT_ESTIMATED_CARDINALITY);

        let before = node.plan_hash();
        node.set_estimated_cardinality(42);
        assert_eq!(node.estimated_cardinality(), 42);
        // Cardinality is not part of structural identity
        assert_eq!(node.plan_hash(), before);
        assert_eq!(node, scan(1));
    }

    #[test]
    fn test_equality_checks_children_pairwise() {
        let a = hash_over(scan(1), Expression::constant(1));
        let b = hash_over(scan(1), Expression::constant(1));
        let c = hash_over(scan(2), Expression::constant(1));
        assert_eq!(a, b);
        assert_eq!(a.plan_hash(), b.plan_hash());
        assert_ne!(a, c);
        assert_ne!(a.plan_hash(), c.plan_hash());
    }

    #[test]
    fn test_different_variants_are_not_equal() {
        let seq = scan(7);
        let idx = IndexScanPlan::builder()
            .index_oid(crate::catalog::IndexOid(7))
            .build()
            .unwrap();
        assert_ne!(seq, idx);
    }

    #[test]
    fn test_output_schema_participates_in_identity() {
        let schema_a = OutputSchema::new(vec![OutputColumn::new("a", TypeId::Integer)]).into_ref();
        let schema_b = OutputSchema::new(vec![OutputColumn::new("b", TypeId::Integer)]).into_ref();
        let a = SeqScanPlan::builder()
            .table_oid(TableOid(1))
            .output_schema(Arc::clone(&schema_a))
            .build()
            .unwrap();
        let a2 = SeqScanPlan::builder()
            .table_oid(TableOid(1))
            .output_schema(Arc::new((*schema_a).clone()))
            .build()
            .unwrap();
        let b = SeqScanPlan::builder()
            .table_oid(TableOid(1))
            .output_schema(schema_b)
            .build()
            .unwrap();
        // Equal contents in distinct allocations compare equal
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_ne!(a, scan(1));
    }

    #[test]
    fn test_clone_shares_only_schema() {
        let schema = OutputSchema::new(vec![OutputColumn::new("k", TypeId::Integer)]).into_ref();
        let key = Expression::compare(
            ExpressionType::CompareEqual,
            Expression::parameter(0),
            Expression::constant(1),
        )
        .unwrap();
        let original = HashPlan::builder()
            .hash_key(key)
            .output_schema(Arc::clone(&schema))
            .add_child(scan(3))
            .build()
            .unwrap();
        let copy = original.clone();

        assert_eq!(copy, original);
        assert!(!std::ptr::eq(copy.child(0).unwrap(), original.child(0).unwrap()));
        assert!(!std::ptr::eq(
            &copy.as_hash().unwrap().hash_keys()[0],
            &original.as_hash().unwrap().hash_keys()[0]
        ));
        assert!(Arc::ptr_eq(
            copy.output_schema().unwrap(),
            original.output_schema().unwrap()
        ));
    }

    #[test]
    fn test_arity_enforced_by_builders() {
        let err = HashPlan::builder()
            .hash_key(Expression::constant(1))
            .build()
            .unwrap_err();
        assert!(matches!(err, PlannerError::BuilderValidation(_)));

        let err = SeqScanPlan::builder()
            .table_oid(TableOid(1))
            .add_child(scan(2))
            .build()
            .unwrap_err();
        assert!(matches!(err, PlannerError::BuilderValidation(_)));
    }

    #[test]
    fn test_tree_size_and_child_access() {
        let tree = hash_over(scan(1), Expression::constant(1));
        assert_eq!(tree.tree_size(), 2);
        assert_eq!(tree.children_size(), 1);
        assert!(tree.child(0).is_some());
        assert!(tree.child(1).is_none());
    }

    #[test]
    fn test_nodes_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PlanNode>();
    }

    #[test]
    fn test_leaf_tagged_operator_rejected_by_builders() {
        let bogus = Expression::Operator {
            op: ExpressionType::Star,
            return_type: TypeId::Invalid,
            children: vec![],
        };
        let result = SeqScanPlan::builder()
            .table_oid(TableOid(1))
            .predicate(Expression::and(Expression::parameter(0), bogus.clone()))
            .build();
        assert!(matches!(result, Err(PlannerError::BuilderValidation(_))));

        let result = HashPlan::builder().hash_key(bogus).add_child(scan(2)).build();
        assert!(matches!(result, Err(PlannerError::BuilderValidation(_))));
    }
}
