//! Internal AST types
//!
//! Statement forms consumed by the planner. Parsing produces these; the
//! plan builders read them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::TypeId;

/// Procedural language of a user-defined function
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlLanguage {
    #[default]
    Plpgsql,
    Sql,
    C,
}

impl fmt::Display for PlLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlLanguage::Plpgsql => "plpgsql",
            PlLanguage::Sql => "sql",
            PlLanguage::C => "c",
        };
        f.write_str(name)
    }
}

/// Declared function parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncParameter {
    pub name: String,
    pub data_type: TypeId,
}

impl FuncParameter {
    pub fn new(name: impl Into<String>, data_type: TypeId) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// CREATE [OR REPLACE] FUNCTION
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFunctionStatement {
    pub name: String,
    pub or_replace: bool,
    pub language: PlLanguage,
    pub parameters: Vec<FuncParameter>,
    pub return_type: TypeId,
    /// Function body, one entry per source line
    pub body: Vec<String>,
}
