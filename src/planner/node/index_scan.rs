//! Index scan

use serde::{Deserialize, Serialize};

use super::{required, BuilderBase, PlanBody, PlanNode, PlanNodeBuilder, PlanNodeType};
use crate::catalog::IndexOid;
use crate::planner::error::PlannerResult;
use crate::planner::expr::Expression;

/// Scan through an index, optionally filtered
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexScanPlan {
    index_oid: IndexOid,
    #[serde(default)]
    predicate: Option<Expression>,
}

impl IndexScanPlan {
    pub fn builder() -> IndexScanBuilder {
        IndexScanBuilder::default()
    }

    pub fn index_oid(&self) -> IndexOid {
        self.index_oid
    }

    pub fn predicate(&self) -> Option<&Expression> {
        self.predicate.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct IndexScanBuilder {
    base: BuilderBase,
    index_oid: Option<IndexOid>,
    predicate: Option<Expression>,
}

impl IndexScanBuilder {
    #[must_use]
    pub fn index_oid(mut self, oid: IndexOid) -> Self {
        self.index_oid = Some(oid);
        self
    }

    #[must_use]
    pub fn predicate(mut self, predicate: Expression) -> Self {
        self.predicate = Some(predicate);
        self
    }
}

impl PlanNodeBuilder for IndexScanBuilder {
    fn base_mut(&mut self) -> &mut BuilderBase {
        &mut self.base
    }

    fn build(self) -> PlannerResult<PlanNode> {
        let body = IndexScanPlan {
            index_oid: required(self.index_oid, PlanNodeType::IndexScan, "index_oid")?,
            predicate: self.predicate,
        };
        self.base.finish(PlanBody::IndexScan(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::error::PlannerError;

    #[test]
    fn test_build_index_scan() {
        let node = IndexScanPlan::builder()
            .index_oid(IndexOid(77))
            .estimated_cardinality(12)
            .build()
            .unwrap();
        let scan = node.as_index_scan().unwrap();
        assert_eq!(scan.index_oid(), IndexOid(77));
        assert!(scan.predicate().is_none());
        assert_eq!(node.estimated_cardinality(), 12);
    }

    #[test]
    fn test_missing_index_oid() {
        assert!(matches!(
            IndexScanPlan::builder().build(),
            Err(PlannerError::BuilderValidation(_))
        ));
    }
}
