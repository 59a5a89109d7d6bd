//! Aggregation over a single child
//!
//! Terms are an ordered list: `COUNT(x), SUM(y)` and `SUM(y), COUNT(x)`
//! produce different output columns and are different plans.

use serde::{Deserialize, Serialize};

use super::{BuilderBase, PlanBody, PlanNode, PlanNodeBuilder, PlanNodeType};
use crate::planner::error::PlannerResult;
use crate::planner::expr::{Expression, ExpressionType};

/// How the executor groups input tuples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregateStrategy {
    /// Single group, no grouping keys
    #[default]
    Plain,
    /// Input arrives sorted on the grouping keys
    Sorted,
    /// Groups kept in a hash table
    Hash,
}

/// One aggregate function application, e.g. `COUNT(DISTINCT x)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregateTerm {
    pub aggregate_type: ExpressionType,
    pub expression: Expression,
    #[serde(default)]
    pub distinct: bool,
}

impl AggregateTerm {
    pub fn new(aggregate_type: ExpressionType, expression: Expression) -> Self {
        Self {
            aggregate_type,
            expression,
            distinct: false,
        }
    }

    #[must_use]
    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregatePlan {
    #[serde(default)]
    having_clause_predicate: Option<Expression>,
    aggregate_terms: Vec<AggregateTerm>,
    #[serde(default)]
    aggregate_strategy: AggregateStrategy,
    /// Aggregates the whole input into one group
    #[serde(default)]
    is_global: bool,
}

impl AggregatePlan {
    pub fn builder() -> AggregateBuilder {
        AggregateBuilder::default()
    }

    pub fn having_clause_predicate(&self) -> Option<&Expression> {
        self.having_clause_predicate.as_ref()
    }

    pub fn aggregate_terms(&self) -> &[AggregateTerm] {
        &self.aggregate_terms
    }

    pub fn aggregate_strategy(&self) -> AggregateStrategy {
        self.aggregate_strategy
    }

    pub fn is_global(&self) -> bool {
        self.is_global
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if let Some(term) = self
            .aggregate_terms
            .iter()
            .find(|t| !t.aggregate_type.is_aggregate())
        {
            return Err(format!(
                "{} term has non-aggregate type {:?}",
                PlanNodeType::Aggregate,
                term.aggregate_type
            ));
        }
        if self.is_global && self.aggregate_strategy != AggregateStrategy::Plain {
            return Err(format!(
                "global {} must use the PLAIN strategy, got {:?}",
                PlanNodeType::Aggregate,
                self.aggregate_strategy
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct AggregateBuilder {
    base: BuilderBase,
    having_clause_predicate: Option<Expression>,
    aggregate_terms: Vec<AggregateTerm>,
    aggregate_strategy: AggregateStrategy,
    is_global: bool,
}

impl AggregateBuilder {
    #[must_use]
    pub fn having_clause_predicate(mut self, predicate: Expression) -> Self {
        self.having_clause_predicate = Some(predicate);
        self
    }

    #[must_use]
    pub fn aggregate_term(mut self, term: AggregateTerm) -> Self {
        self.aggregate_terms.push(term);
        self
    }

    #[must_use]
    pub fn aggregate_terms(mut self, terms: Vec<AggregateTerm>) -> Self {
        self.aggregate_terms = terms;
        self
    }

    #[must_use]
    pub fn aggregate_strategy(mut self, strategy: AggregateStrategy) -> Self {
        self.aggregate_strategy = strategy;
        self
    }

    #[must_use]
    pub fn global(mut self, is_global: bool) -> Self {
        self.is_global = is_global;
        self
    }
}

impl PlanNodeBuilder for AggregateBuilder {
    fn base_mut(&mut self) -> &mut BuilderBase {
        &mut self.base
    }

    fn build(self) -> PlannerResult<PlanNode> {
        let body = AggregatePlan {
            having_clause_predicate: self.having_clause_predicate,
            aggregate_terms: self.aggregate_terms,
            aggregate_strategy: self.aggregate_strategy,
            is_global: self.is_global,
        };
        self.base.finish(PlanBody::Aggregate(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnOid, TableOid};
    use crate::planner::error::PlannerError;
    use crate::planner::node::SeqScanPlan;
    use crate::types::TypeId;

    fn scan() -> PlanNode {
        SeqScanPlan::builder().table_oid(TableOid(1)).build().unwrap()
    }

    fn count_star() -> AggregateTerm {
        AggregateTerm::new(ExpressionType::AggregateCount, Expression::star())
    }

    fn sum_age() -> AggregateTerm {
        AggregateTerm::new(
            ExpressionType::AggregateSum,
            Expression::column(TableOid(1), ColumnOid(4), TypeId::Integer),
        )
    }

    fn aggregate(terms: Vec<AggregateTerm>) -> PlanNode {
        AggregatePlan::builder()
            .aggregate_terms(terms)
            .aggregate_strategy(AggregateStrategy::Hash)
            .add_child(scan())
            .build()
            .unwrap()
    }

    #[test]
    fn test_term_order_changes_identity() {
        let a = aggregate(vec![count_star(), sum_age()]);
        let b = aggregate(vec![sum_age(), count_star()]);
        assert_ne!(a, b);
        assert_ne!(a.plan_hash(), b.plan_hash());
        assert_eq!(a, aggregate(vec![count_star(), sum_age()]));
    }

    #[test]
    fn test_distinct_changes_identity() {
        let a = aggregate(vec![sum_age()]);
        let b = aggregate(vec![sum_age().distinct(true)]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_global_flag() {
        let node = AggregatePlan::builder()
            .aggregate_term(count_star())
            .global(true)
            .add_child(scan())
            .build()
            .unwrap();
        let agg = node.as_aggregate().unwrap();
        assert!(agg.is_global());
        assert_eq!(agg.aggregate_strategy(), AggregateStrategy::Plain);

        // An empty term list does not make an aggregate global
        let empty = AggregatePlan::builder().add_child(scan()).build().unwrap();
        assert!(!empty.as_aggregate().unwrap().is_global());
    }

    #[test]
    fn test_global_rejects_hash_strategy() {
        let result = AggregatePlan::builder()
            .aggregate_term(count_star())
            .global(true)
            .aggregate_strategy(AggregateStrategy::Hash)
            .add_child(scan())
            .build();
        assert!(matches!(result, Err(PlannerError::BuilderValidation(_))));
    }

    #[test]
    fn test_rejects_non_aggregate_term() {
        let result = AggregatePlan::builder()
            .aggregate_term(AggregateTerm::new(
                ExpressionType::CompareEqual,
                Expression::star(),
            ))
            .add_child(scan())
            .build();
        assert!(matches!(result, Err(PlannerError::BuilderValidation(_))));
    }
}
