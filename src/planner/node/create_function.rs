//! CREATE FUNCTION
//!
//! Pure data holder; the node has no children and produces no tuples.

use serde::{Deserialize, Serialize};

use super::{required, BuilderBase, PlanBody, PlanNode, PlanNodeBuilder, PlanNodeType};
use crate::planner::error::PlannerResult;
use crate::sql::{CreateFunctionStatement, PlLanguage};
use crate::types::TypeId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreateFunctionPlan {
    language: PlLanguage,
    function_name: String,
    #[serde(default)]
    param_names: Vec<String>,
    #[serde(default)]
    param_types: Vec<TypeId>,
    #[serde(default)]
    body: Vec<String>,
    #[serde(default)]
    is_replace: bool,
    return_type: TypeId,
}

impl CreateFunctionPlan {
    pub fn builder() -> CreateFunctionBuilder {
        CreateFunctionBuilder::default()
    }

    pub fn language(&self) -> PlLanguage {
        self.language
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    pub fn param_types(&self) -> &[TypeId] {
        &self.param_types
    }

    pub fn param_count(&self) -> usize {
        self.param_names.len()
    }

    pub fn body(&self) -> &[String] {
        &self.body
    }

    pub fn is_replace(&self) -> bool {
        self.is_replace
    }

    pub fn return_type(&self) -> TypeId {
        self.return_type
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.function_name.is_empty() {
            return Err(format!("{} requires a function name", PlanNodeType::CreateFunc));
        }
        if self.param_names.len() != self.param_types.len() {
            return Err(format!(
                "{} '{}' has {} parameter names but {} parameter types",
                PlanNodeType::CreateFunc,
                self.function_name,
                self.param_names.len(),
                self.param_types.len()
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CreateFunctionBuilder {
    base: BuilderBase,
    language: PlLanguage,
    function_name: Option<String>,
    param_names: Vec<String>,
    param_types: Vec<TypeId>,
    body: Vec<String>,
    is_replace: bool,
    return_type: Option<TypeId>,
}

impl CreateFunctionBuilder {
    #[must_use]
    pub fn language(mut self, language: PlLanguage) -> Self {
        self.language = language;
        self
    }

    #[must_use]
    pub fn function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    /// Append a parameter
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, type_id: TypeId) -> Self {
        self.param_names.push(name.into());
        self.param_types.push(type_id);
        self
    }

    #[must_use]
    pub fn param_names(mut self, names: Vec<String>) -> Self {
        self.param_names = names;
        self
    }

    #[must_use]
    pub fn param_types(mut self, types: Vec<TypeId>) -> Self {
        self.param_types = types;
        self
    }

    #[must_use]
    pub fn body(mut self, body: Vec<String>) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn replace(mut self, is_replace: bool) -> Self {
        self.is_replace = is_replace;
        self
    }

    #[must_use]
    pub fn return_type(mut self, type_id: TypeId) -> Self {
        self.return_type = Some(type_id);
        self
    }

    /// Copy every field from a parsed statement
    #[must_use]
    pub fn from_statement(mut self, stmt: &CreateFunctionStatement) -> Self {
        self.language = stmt.language;
        self.function_name = Some(stmt.name.clone());
        self.param_names = stmt.parameters.iter().map(|p| p.name.clone()).collect();
        self.param_types = stmt.parameters.iter().map(|p| p.data_type).collect();
        self.body = stmt.body.clone();
        self.is_replace = stmt.or_replace;
        self.return_type = Some(stmt.return_type);
        self
    }
}

impl PlanNodeBuilder for CreateFunctionBuilder {
    fn base_mut(&mut self) -> &mut BuilderBase {
        &mut self.base
    }

    fn build(self) -> PlannerResult<PlanNode> {
        let body = CreateFunctionPlan {
            language: self.language,
            function_name: required(self.function_name, PlanNodeType::CreateFunc, "function_name")?,
            param_names: self.param_names,
            param_types: self.param_types,
            body: self.body,
            is_replace: self.is_replace,
            return_type: required(self.return_type, PlanNodeType::CreateFunc, "return_type")?,
        };
        self.base.finish(PlanBody::CreateFunction(body))
    }
}
