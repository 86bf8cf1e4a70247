//! # raopt-core: Relational-Algebra Plan Model and Cost Estimation
//!
//! This crate is the foundation of the raopt logical query optimizer. It defines
//! the relational-algebra (RA) plan tree, the clause AST consumed from a SQL
//! parser front end, table statistics, and the bottom-up cardinality estimator
//! that annotates every plan node with an estimated row count.
//!
//! ## Module Overview
//!
//! - **`plan`**: The `PlanNode` tree -- Relation, Selection, Projection, Join,
//!   and Subquery operators with exclusively-owned children.
//! - **`predicate`**: Opaque boolean predicates with a queryable set of
//!   referenced table/alias identifiers.
//! - **`ast`**: The clause AST (FROM/JOIN/WHERE/SELECT) produced by a SQL
//!   parser collaborator.
//! - **`builder`**: Constructs a left-deep RA tree from a clause AST.
//! - **`stats`**: Table-cardinality statistics and the source trait for
//!   catalog-backed providers.
//! - **`cost`**: The post-order cardinality estimator with fixed selectivity
//!   heuristics.
//! - **`render`**: Presentation adapters -- Graphviz DOT output and
//!   serializable per-node summaries.
//! - **`error`**: Structural plan-construction errors.

pub mod ast;
pub mod builder;
pub mod cost;
pub mod error;
pub mod plan;
pub mod predicate;
pub mod render;
pub mod stats;

pub use error::PlanError;
pub use plan::{NodeKind, PlanNode};
pub use predicate::Predicate;
pub use stats::TableStatistics;
