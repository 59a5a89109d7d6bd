//! Hash build over a single child

use serde::{Deserialize, Serialize};

use super::{BuilderBase, PlanBody, PlanNode, PlanNodeBuilder, PlanNodeType};
use crate::planner::error::PlannerResult;
use crate::planner::expr::Expression;

/// Hashes its child's tuples on an ordered list of key expressions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashPlan {
    hash_keys: Vec<Expression>,
}

impl HashPlan {
    pub fn builder() -> HashBuilder {
        HashBuilder::default()
    }

    pub fn hash_keys(&self) -> &[Expression] {
        &self.hash_keys
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.hash_keys.is_empty() {
            return Err(format!("{} requires at least one hash key", PlanNodeType::Hash));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct HashBuilder {
    base: BuilderBase,
    hash_keys: Vec<Expression>,
}

impl HashBuilder {
    #[must_use]
    pub fn hash_key(mut self, key: Expression) -> Self {
        self.hash_keys.push(key);
        self
    }

    #[must_use]
    pub fn hash_keys(mut self, keys: Vec<Expression>) -> Self {
        self.hash_keys = keys;
        self
    }
}

impl PlanNodeBuilder for HashBuilder {
    fn base_mut(&mut self) -> &mut BuilderBase {
        &mut self.base
    }

    fn build(self) -> PlannerResult<PlanNode> {
        let body = HashPlan {
            hash_keys: self.hash_keys,
        };
        self.base.finish(PlanBody::Hash(body))
    }
}
