//! # Predicate Pushdown
//!
//! Moves Selection nodes as close as possible to the Relation leaves they
//! reference. Filtering early shrinks every intermediate result above the
//! filter, which is usually the single biggest win available to a logical
//! optimizer.
//!
//! ## Legality
//!
//! A Selection may move below a Join only if every table/alias it references
//! resolves entirely into one side of that join. A predicate referencing both
//! sides is a join condition in disguise and stays above the join. A
//! Selection may swap with a Projection only when every qualified column it
//! references survives the projection's output list; anything the pass cannot
//! prove survives blocks the swap. A predicate whose reference set is empty
//! (only unqualified columns, or a constant condition) cannot be attributed
//! to either side; it is logged and left unmoved -- never dropped, since
//! dropping would change query semantics.
//!
//! ## Fixed Point
//!
//! The pass is a single recursive descent that re-applies the rules to every
//! Selection it relocates, so each filter travels as far down as legality
//! allows in one call. Applying the pass twice yields the same tree as
//! applying it once.

use raopt_core::plan::PlanNode;
use raopt_core::predicate::Predicate;

/// Push every Selection in the tree as far toward its relations as legality
/// allows. Tree semantics are preserved; only Selection positions change.
pub fn pushdown(plan: PlanNode) -> PlanNode {
    match plan {
        PlanNode::Selection { predicate, child, rows } => {
            let child = pushdown(*child);
            push_selection(predicate, child, rows)
        }
        PlanNode::Projection { columns, child, rows } => PlanNode::Projection {
            columns,
            child: Box::new(pushdown(*child)),
            rows,
        },
        PlanNode::Join { left, right, predicate, rows } => PlanNode::Join {
            left: Box::new(pushdown(*left)),
            right: Box::new(pushdown(*right)),
            predicate,
            rows,
        },
        PlanNode::Subquery { alias, child, rows } => PlanNode::Subquery {
            alias,
            child: Box::new(pushdown(*child)),
            rows,
        },
        leaf @ PlanNode::Relation { .. } => leaf,
    }
}

/// Place `predicate` above `child`, pushing it further down when the rules
/// allow. `child` has already been fully pushed.
fn push_selection(predicate: Predicate, child: PlanNode, rows: Option<f64>) -> PlanNode {
    match child {
        PlanNode::Join { left, right, predicate: join_pred, .. } => {
            let refs = predicate.tables();
            if refs.is_empty() {
                tracing::debug!(
                    predicate = %predicate,
                    "selection references no qualified identifiers, leaving above join"
                );
                return PlanNode::Selection {
                    predicate,
                    child: Box::new(PlanNode::Join { left, right, predicate: join_pred, rows: None }),
                    rows,
                };
            }
            if refs.is_subset(&left.visible_names()) {
                // Entirely the left side's business: re-root onto the left
                // child and keep pushing from there.
                let new_left = push_selection(predicate, *left, None);
                return PlanNode::Join {
                    left: Box::new(new_left),
                    right,
                    predicate: join_pred,
                    rows: None,
                };
            }
            if refs.is_subset(&right.visible_names()) {
                let new_right = push_selection(predicate, *right, None);
                return PlanNode::Join {
                    left,
                    right: Box::new(new_right),
                    predicate: join_pred,
                    rows: None,
                };
            }
            // References both sides (or names outside this join): cannot
            // cross the join boundary without correctness risk.
            tracing::debug!(
                predicate = %predicate,
                "selection references both join sides, leaving in place"
            );
            PlanNode::Selection {
                predicate,
                child: Box::new(PlanNode::Join { left, right, predicate: join_pred, rows: None }),
                rows,
            }
        }
        PlanNode::Projection { columns, child: proj_child, .. } => {
            if columns_survive(&predicate, &columns) {
                // Selection commutes with a column list that keeps every
                // column the predicate needs.
                let pushed = push_selection(predicate, *proj_child, None);
                PlanNode::Projection {
                    columns,
                    child: Box::new(pushed),
                    rows: None,
                }
            } else {
                PlanNode::Selection {
                    predicate,
                    child: Box::new(PlanNode::Projection { columns, child: proj_child, rows: None }),
                    rows,
                }
            }
        }
        // Relation, Subquery, or an already-blocked Selection: terminal.
        other => PlanNode::Selection {
            predicate,
            child: Box::new(other),
            rows,
        },
    }
}

/// Conservative survival check for the Selection/Projection swap: every
/// qualified column the predicate references must appear verbatim (case
/// insensitively) in the projection's output list. Predicates with no
/// qualified column references are not provably safe and block the swap.
fn columns_survive(predicate: &Predicate, columns: &[String]) -> bool {
    if predicate.columns().is_empty() {
        return false;
    }
    let output: Vec<String> = columns.iter().map(|c| c.trim().to_ascii_lowercase()).collect();
    predicate.columns().iter().all(|c| output.iter().any(|o| o == c))
}
