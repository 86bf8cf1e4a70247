//! Structural plan-construction errors.
//!
//! Only genuinely unrecoverable structural issues are errors: a query with no
//! FROM clause, or a FROM/JOIN source the front end cannot resolve. Missing
//! statistics and unattributable predicates are diagnostics, not errors --
//! the estimator and the pushdown pass handle them inline and log via
//! `tracing`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    /// The query has no FROM clause; there is nothing to build a tree from.
    #[error("no FROM clause found in query")]
    NoFromClause,

    /// A FROM/JOIN source that is neither a table, an aliased table, nor a
    /// subquery.
    #[error("unresolved source node in FROM clause: {0}")]
    UnresolvedSource(String),

    /// A structurally invalid hand-built plan or clause AST.
    #[error("malformed plan: {0}")]
    MalformedPlan(String),
}
