//! Planner error types

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::types::{TypeId, ValueError};

/// Planner error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    /// A named column, attribute or schema entry does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A serialized plan could not be reconstructed
    #[error("Malformed plan: {0}")]
    MalformedPlan(String),

    /// A builder was asked to build with missing or inconsistent fields
    #[error("Builder validation failed: {0}")]
    BuilderValidation(String),

    /// Incompatible value types
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: TypeId, found: TypeId },

    /// Catalog collaborator error
    #[error("Catalog error: {0}")]
    Catalog(CatalogError),
}

impl From<CatalogError> for PlannerError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::TableNotFound(_)
            | CatalogError::ColumnNotFound(_, _)
            | CatalogError::AttributeNotFound { .. } => PlannerError::NotFound(e.to_string()),
            CatalogError::TypeMismatch { expected, found } => {
                PlannerError::TypeMismatch { expected, found }
            }
            other => PlannerError::Catalog(other),
        }
    }
}

impl From<ValueError> for PlannerError {
    fn from(e: ValueError) -> Self {
        match e {
            ValueError::TypeMismatch { left, right } => PlannerError::TypeMismatch {
                expected: right,
                found: left,
            },
            ValueError::Parse { .. } => PlannerError::BuilderValidation(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for PlannerError {
    fn from(e: serde_json::Error) -> Self {
        PlannerError::MalformedPlan(e.to_string())
    }
}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
