//! Sequential table scan

use serde::{Deserialize, Serialize};

use super::{required, BuilderBase, PlanBody, PlanNode, PlanNodeBuilder, PlanNodeType};
use crate::catalog::TableOid;
use crate::planner::error::PlannerResult;
use crate::planner::expr::Expression;

/// Full scan of a table, optionally filtered
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeqScanPlan {
    table_oid: TableOid,
    #[serde(default)]
    predicate: Option<Expression>,
    /// Rows are locked for a following UPDATE/DELETE
    #[serde(default)]
    is_for_update: bool,
    /// Scan may be split across workers
    #[serde(default)]
    is_parallel: bool,
}

impl SeqScanPlan {
    pub fn builder() -> SeqScanBuilder {
        SeqScanBuilder::default()
    }

    pub fn table_oid(&self) -> TableOid {
        self.table_oid
    }

    pub fn predicate(&self) -> Option<&Expression> {
        self.predicate.as_ref()
    }

    pub fn is_for_update(&self) -> bool {
        self.is_for_update
    }

    pub fn is_parallel(&self) -> bool {
        self.is_parallel
    }
}

/// Builder for [`SeqScanPlan`] nodes
#[derive(Debug, Default)]
pub struct SeqScanBuilder {
    base: BuilderBase,
    table_oid: Option<TableOid>,
    predicate: Option<Expression>,
    is_for_update: bool,
    is_parallel: bool,
}

impl SeqScanBuilder {
    #[must_use]
    pub fn table_oid(mut self, oid: TableOid) -> Self {
        self.table_oid = Some(oid);
        self
    }

    #[must_use]
    pub fn predicate(mut self, predicate: Expression) -> Self {
        self.predicate = Some(predicate);
        self
    }

    #[must_use]
    pub fn for_update(mut self, is_for_update: bool) -> Self {
        self.is_for_update = is_for_update;
        self
    }

    #[must_use]
    pub fn parallel(mut self, is_parallel: bool) -> Self {
        self.is_parallel = is_parallel;
        self
    }
}

impl PlanNodeBuilder for SeqScanBuilder {
    fn base_mut(&mut self) -> &mut BuilderBase {
        &mut self.base
    }

    fn build(self) -> PlannerResult<PlanNode> {
        let body = SeqScanPlan {
            table_oid: required(self.table_oid, PlanNodeType::SeqScan, "table_oid")?,
            predicate: self.predicate,
            is_for_update: self.is_for_update,
            is_parallel: self.is_parallel,
        };
        self.base.finish(PlanBody::SeqScan(body))
    }
}
