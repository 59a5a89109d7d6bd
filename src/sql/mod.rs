//! SQL layer - statement types handed to the planner

pub mod ast;

pub use ast::*;
