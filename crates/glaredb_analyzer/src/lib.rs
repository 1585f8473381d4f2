//! Analysis of logical plans containing subqueries.
//!
//! Takes an unresolved plan, binds tables and columns, and analyzes subquery
//! expressions and derived tables as queries of their own within the scope of
//! the query containing them. The resolved plan carries result caching flags
//! and join scope annotations.

pub mod analyzer;
pub mod catalog;
pub mod config;
pub mod context;
pub mod errors;
pub mod explain;
pub mod expr;
pub mod logical;
pub mod transform;
