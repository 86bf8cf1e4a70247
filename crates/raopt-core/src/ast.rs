//! # Clause AST
//!
//! The structured query representation handed to the tree builder by a SQL
//! parser collaborator. It carries exactly the clauses the optimizer consumes:
//! the FROM source, the ordered JOIN clauses, an optional WHERE predicate, and
//! the SELECT output expressions. Everything else in the SQL statement
//! (GROUP BY, ORDER BY, set operations) is outside the optimizer's scope and
//! never reaches this type.

use crate::predicate::Predicate;
use serde::{Deserialize, Serialize};

/// A single-statement SELECT query, reduced to the clauses the optimizer
/// consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// The FROM-clause source. `None` means the query had no FROM clause,
    /// which the builder rejects with `PlanError::NoFromClause`.
    pub from: Option<SourceNode>,
    /// Explicit JOIN clauses in query-text order.
    pub joins: Vec<JoinClause>,
    /// The WHERE predicate, if present.
    pub filter: Option<Predicate>,
    /// SELECT output expressions as SQL text, in order.
    pub select: Vec<String>,
}

/// A FROM or JOIN source: a base table (optionally aliased) or a nested
/// subquery (optionally aliased).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourceNode {
    Table {
        name: String,
        alias: Option<String>,
    },
    Subquery {
        alias: Option<String>,
        query: Box<QuerySpec>,
    },
}

/// One explicit JOIN clause: its source and an optional ON predicate.
/// An absent predicate means a cross join and defaults to always-true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinClause {
    pub source: SourceNode,
    pub on: Option<Predicate>,
}
