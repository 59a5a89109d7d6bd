//! qplan - physical query-plan representation for a relational engine
//!
//! Features:
//! - Immutable plan trees with structural hashing and equality
//! - Builders that validate required fields and child counts
//! - Tagged JSON serialization with a fail-closed deserializer
//! - In-memory catalog with a `pg_attribute` system table

pub mod catalog;
pub mod planner;
pub mod sql;
pub mod types;
