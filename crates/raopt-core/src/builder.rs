//! # Tree Builder
//!
//! Constructs an RA plan tree from a clause AST. The shape mirrors how the
//! query reads: the FROM source at the bottom, JOIN clauses folded left-deep
//! in query order, the WHERE predicate as a Selection above the join chain,
//! and the SELECT list as a Projection at the root. Subquery sources build
//! recursively and appear as `Subquery` nodes.
//!
//! The builder performs only structural validation: an absent FROM clause is
//! `NoFromClause`, an empty table name is `MalformedPlan`. Predicate content
//! is never validated. The returned tree carries no cardinality annotations;
//! run the cost estimator before comparing plans.

use crate::ast::{QuerySpec, SourceNode};
use crate::error::PlanError;
use crate::plan::PlanNode;
use crate::predicate::Predicate;

/// Build an RA tree from a clause AST.
pub fn build_plan(spec: &QuerySpec) -> Result<PlanNode, PlanError> {
    let from = spec.from.as_ref().ok_or(PlanError::NoFromClause)?;
    let mut node = build_source(from)?;

    // Fold explicit JOINs left-deep, in query-text order.
    for join in &spec.joins {
        let right = build_source(&join.source)?;
        let predicate = join.on.clone().unwrap_or_else(Predicate::always_true);
        node = PlanNode::join(node, right, predicate);
    }

    if let Some(filter) = &spec.filter {
        node = PlanNode::selection(filter.clone(), node);
    }
    if !spec.select.is_empty() {
        node = PlanNode::projection(spec.select.clone(), node);
    }

    Ok(node)
}

fn build_source(source: &SourceNode) -> Result<PlanNode, PlanError> {
    match source {
        SourceNode::Table { name, alias } => {
            if name.is_empty() {
                return Err(PlanError::MalformedPlan("empty table name".into()));
            }
            Ok(PlanNode::relation(name.clone(), alias.clone()))
        }
        SourceNode::Subquery { alias, query } => {
            let child = build_plan(query)?;
            Ok(PlanNode::subquery(alias.clone(), child))
        }
    }
}
