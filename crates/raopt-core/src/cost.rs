//! # Cardinality Estimation
//!
//! Annotates every node of an RA tree with an estimated output row count,
//! bottom-up, using a fixed selectivity model:
//!
//! - **Relation**: the table's row count from statistics (missing = 0).
//! - **Selection**: 10% of the child's rows ([`SELECTIVITY_SELECTION`]),
//!   independent of predicate content.
//! - **Projection**: unchanged -- a column list cannot change row count.
//! - **Join**: 1% of the Cartesian product ([`SELECTIVITY_JOIN`]), truncated
//!   to an integer value (never rounded).
//! - **Subquery**: pass-through of the wrapped plan's estimate.
//!
//! The root's value is the plan's single scalar "cumulative cost", used by
//! the host to compare plan variants before and after each rewrite pass.
//!
//! ## Missing Statistics
//!
//! A statistics miss yields zero rows for that relation, which cascades zero
//! cost through every ancestor that depends on it. This is a known weakness
//! of the heuristic and is reproduced deliberately so that plan comparisons
//! stay compatible across hosts; the miss is logged as a debug diagnostic,
//! never raised as an error.

use crate::plan::PlanNode;
use crate::stats::TableStatistics;

/// Fraction of input rows a filter is assumed to retain.
pub const SELECTIVITY_SELECTION: f64 = 0.1;

/// Fraction of the Cartesian product an equi-join is assumed to retain.
pub const SELECTIVITY_JOIN: f64 = 0.01;

/// Annotate every node with its estimated row count and return the root's
/// value, the plan's cumulative cost.
///
/// Traversal is post-order: children are estimated before their parents. The
/// pass mutates only the `rows` annotations; tree shape is untouched.
pub fn estimate(plan: &mut PlanNode, stats: &TableStatistics) -> f64 {
    let estimated = match plan {
        PlanNode::Relation { table, rows, .. } => {
            let count = stats.get(table) as f64;
            if !stats.contains(table) {
                tracing::debug!(table = %table, "no statistic for relation, estimating 0 rows");
            }
            *rows = Some(count);
            count
        }
        PlanNode::Selection { child, rows, .. } => {
            let filtered = estimate(child, stats) * SELECTIVITY_SELECTION;
            *rows = Some(filtered);
            filtered
        }
        PlanNode::Projection { child, rows, .. } => {
            let count = estimate(child, stats);
            *rows = Some(count);
            count
        }
        PlanNode::Join { left, right, rows, .. } => {
            let left_rows = estimate(left, stats);
            let right_rows = estimate(right, stats);
            let joined = join_cardinality(left_rows, right_rows);
            *rows = Some(joined);
            joined
        }
        PlanNode::Subquery { child, rows, .. } => {
            let count = estimate(child, stats);
            *rows = Some(count);
            count
        }
    };
    estimated
}

/// The join-output rule applied uniformly by the estimator and the join
/// reordering pass: `floor(left * right * SELECTIVITY_JOIN)`. Truncation,
/// never rounding, so the result is always a non-negative integer value.
pub fn join_cardinality(left_rows: f64, right_rows: f64) -> f64 {
    (left_rows * right_rows * SELECTIVITY_JOIN).trunc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Predicate;

    fn stats() -> TableStatistics {
        [("orders", 1500u64), ("customer", 150)].into_iter().collect()
    }

    #[test]
    fn test_relation_reads_statistics() {
        let mut plan = PlanNode::relation("ORDERS", None);
        assert_eq!(estimate(&mut plan, &stats()), 1500.0);
        assert_eq!(plan.estimated_rows(), Some(1500.0));
    }

    #[test]
    fn test_missing_statistic_yields_zero() {
        let mut plan = PlanNode::relation("orders", None);
        assert_eq!(estimate(&mut plan, &TableStatistics::new()), 0.0);
        assert_eq!(plan.estimated_rows(), Some(0.0));
    }

    #[test]
    fn test_zero_statistics_cascade_to_ancestors() {
        let mut plan = PlanNode::selection(
            Predicate::new("orders.total > 10"),
            PlanNode::join(
                PlanNode::relation("orders", None),
                PlanNode::relation("customer", None),
                Predicate::new("orders.custkey = customer.custkey"),
            ),
        );
        assert_eq!(estimate(&mut plan, &TableStatistics::new()), 0.0);
    }

    #[test]
    fn test_selection_keeps_ten_percent() {
        let mut plan = PlanNode::selection(
            Predicate::new("orders.total > 10"),
            PlanNode::relation("orders", None),
        );
        assert_eq!(estimate(&mut plan, &stats()), 150.0);
        // monotone: never more rows than the child
        let child_rows = plan.children()[0].estimated_rows().unwrap();
        assert!(plan.estimated_rows().unwrap() <= child_rows);
    }

    #[test]
    fn test_projection_preserves_cardinality() {
        let mut plan = PlanNode::projection(
            vec!["orderkey".into()],
            PlanNode::relation("orders", None),
        );
        assert_eq!(estimate(&mut plan, &stats()), 1500.0);
    }

    #[test]
    fn test_join_formula_truncates() {
        // floor(100 * 50 * 0.01) == 50
        assert_eq!(join_cardinality(100.0, 50.0), 50.0);
        // floor(150 * 33 * 0.01) == floor(49.5) == 49
        assert_eq!(join_cardinality(150.0, 33.0), 49.0);
    }

    #[test]
    fn test_join_estimate_end_to_end() {
        let mut plan = PlanNode::join(
            PlanNode::relation("orders", None),
            PlanNode::relation("customer", None),
            Predicate::new("orders.custkey = customer.custkey"),
        );
        // floor(1500 * 150 * 0.01) == 2250
        assert_eq!(estimate(&mut plan, &stats()), 2250.0);
    }

    #[test]
    fn test_subquery_is_pass_through() {
        let mut plan = PlanNode::subquery(
            Some("tmp".into()),
            PlanNode::relation("orders", None),
        );
        assert_eq!(estimate(&mut plan, &stats()), 1500.0);
    }

    #[test]
    fn test_every_node_annotated_after_estimation() {
        let mut plan = PlanNode::projection(
            vec!["o.orderkey".into()],
            PlanNode::selection(
                Predicate::new("o.total > 10"),
                PlanNode::relation("orders", Some("o".into())),
            ),
        );
        estimate(&mut plan, &stats());
        fn all_annotated(node: &PlanNode) -> bool {
            node.estimated_rows().is_some() && node.children().iter().all(|c| all_annotated(c))
        }
        assert!(all_annotated(&plan));
    }
}
