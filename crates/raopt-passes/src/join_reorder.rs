//! # Join Reordering
//!
//! Restructures a chain of Join nodes to reduce estimated intermediate
//! cardinalities, without changing the final output rows or the set of base
//! relations joined.
//!
//! ## Algorithm
//!
//! 1. **Flatten** a maximal chain of consecutive Join nodes into its leaf
//!    operands and the predicates connecting them (the join graph). Any
//!    non-Join subtree -- a Relation or Subquery leaf, or a Selection or
//!    Projection root -- interrupts flattening and becomes an opaque operand.
//! 2. **Greedy rebuild**: among all operand pairs connected by a known
//!    predicate, commit the join with the smallest estimated output (the cost
//!    estimator's join rule applied to each side's current best estimate),
//!    treat the result as a new composite operand, and repeat. Ties break by
//!    leftmost operand position in the original chain, so the pass is
//!    deterministic.
//! 3. A predicate falling entirely inside one operand becomes a residual
//!    Selection on that operand; a predicate that can never be placed wraps
//!    the final tree. Predicates are never dropped and never invented.
//! 4. A disconnected join graph is not an error: the remaining components are
//!    cross-joined in their original left-to-right order.
//!
//! The pass recurses into operand interiors (subquery bodies, filtered
//! subtrees) so nested join chains are reordered too, but it never moves a
//! Selection or Projection node itself.
//!
//! Operand estimates come from the `rows` annotations of a preceding
//! estimation pass; an unestimated operand counts as zero rows, consistent
//! with the missing-statistic convention.

use raopt_core::cost::{join_cardinality, SELECTIVITY_SELECTION};
use raopt_core::plan::PlanNode;
use raopt_core::predicate::Predicate;
use std::collections::BTreeSet;

/// Reorder every join chain in the tree to minimize estimated intermediate
/// results. The multiset of reachable base relations is unchanged.
pub fn reorder(plan: PlanNode) -> PlanNode {
    match plan {
        join @ PlanNode::Join { .. } => reorder_chain(join),
        PlanNode::Selection { predicate, child, rows } => PlanNode::Selection {
            predicate,
            child: Box::new(reorder(*child)),
            rows,
        },
        PlanNode::Projection { columns, child, rows } => PlanNode::Projection {
            columns,
            child: Box::new(reorder(*child)),
            rows,
        },
        PlanNode::Subquery { alias, child, rows } => PlanNode::Subquery {
            alias,
            child: Box::new(reorder(*child)),
            rows,
        },
        leaf @ PlanNode::Relation { .. } => leaf,
    }
}

/// One operand of a flattened join chain, possibly a composite of several
/// already-committed joins.
struct Component {
    node: PlanNode,
    /// Lowercased relation/alias names visible to join predicates.
    names: BTreeSet<String>,
    /// Current best row estimate for the greedy search.
    est: f64,
    /// Leftmost original operand index, for deterministic tie-breaking.
    order: usize,
}

fn reorder_chain(root: PlanNode) -> PlanNode {
    let mut operands = Vec::new();
    let mut predicates = Vec::new();
    flatten(root, &mut operands, &mut predicates);

    // Reorder nested chains inside each operand before re-assembly.
    let operands: Vec<PlanNode> = operands.into_iter().map(reorder).collect();

    rebuild(operands, predicates)
}

/// Flatten consecutive Join nodes into operands and join-graph edges.
/// Always-true predicates (cross joins) contribute no edge.
fn flatten(node: PlanNode, operands: &mut Vec<PlanNode>, predicates: &mut Vec<Predicate>) {
    match node {
        PlanNode::Join { left, right, predicate, .. } => {
            flatten(*left, operands, predicates);
            flatten(*right, operands, predicates);
            if !predicate.is_always_true() {
                predicates.push(predicate);
            }
        }
        other => operands.push(other),
    }
}

fn rebuild(operands: Vec<PlanNode>, mut predicates: Vec<Predicate>) -> PlanNode {
    let mut components: Vec<Component> = operands
        .into_iter()
        .enumerate()
        .map(|(order, node)| Component {
            names: node.visible_names(),
            est: node.estimated_rows().unwrap_or(0.0),
            order,
            node,
        })
        .collect();

    loop {
        absorb_single_component_predicates(&mut components, &mut predicates);
        if components.len() <= 1 {
            break;
        }

        match best_connected_pair(&components, &predicates) {
            Some((i, j)) => commit_join(&mut components, &mut predicates, i, j),
            None => {
                // Disconnected join graph: cross-join the two leftmost
                // components and keep going.
                let (i, j) = leftmost_pair(&components);
                tracing::debug!(
                    "no predicate connects remaining join operands, falling back to cross join"
                );
                commit_cross_join(&mut components, i, j);
            }
        }
    }

    // The loop above always reduces a non-empty operand set to exactly one
    // component.
    let mut result = components
        .pop()
        .expect("join chain has at least one operand")
        .node;

    // Predicates referencing names not visible anywhere in the chain can
    // never be placed on a join edge; preserve them above the result rather
    // than dropping them.
    for predicate in predicates {
        tracing::debug!(predicate = %predicate, "unplaceable join predicate kept as residual filter");
        result = PlanNode::selection(predicate, result);
    }
    result
}

/// Move predicates that fall entirely inside a single component onto that
/// component as residual Selection filters. This covers one-sided ON
/// conditions and predicates whose endpoints were merged by earlier commits.
fn absorb_single_component_predicates(components: &mut [Component], predicates: &mut Vec<Predicate>) {
    let mut remaining = Vec::new();
    'next: for predicate in std::mem::take(predicates) {
        if !predicate.tables().is_empty() {
            for component in components.iter_mut() {
                if predicate.tables().is_subset(&component.names) {
                    let node =
                        std::mem::replace(&mut component.node, PlanNode::relation("absorbed", None));
                    component.node = PlanNode::selection(predicate, node);
                    component.est *= SELECTIVITY_SELECTION;
                    continue 'next;
                }
            }
        }
        remaining.push(predicate);
    }
    *predicates = remaining;
}

/// Whether a predicate is a direct edge between two components: its
/// reference set resolves entirely into their union and touches both.
fn connects(predicate: &Predicate, a: &Component, b: &Component) -> bool {
    let tables = predicate.tables();
    !tables.is_empty()
        && tables.iter().all(|t| a.names.contains(t) || b.names.contains(t))
        && tables.iter().any(|t| a.names.contains(t))
        && tables.iter().any(|t| b.names.contains(t))
}

/// Pick the connected pair with the smallest estimated join output. Ties
/// break by the pair's original operand positions (leftmost first).
fn best_connected_pair(components: &[Component], predicates: &[Predicate]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize, f64, (usize, usize))> = None;
    for i in 0..components.len() {
        for j in (i + 1)..components.len() {
            let (a, b) = (&components[i], &components[j]);
            if !predicates.iter().any(|p| connects(p, a, b)) {
                continue;
            }
            let est = join_cardinality(a.est, b.est);
            let key = (a.order.min(b.order), a.order.max(b.order));
            let better = match &best {
                None => true,
                Some((_, _, best_est, best_key)) => {
                    est < *best_est || (est == *best_est && key < *best_key)
                }
            };
            if better {
                best = Some((i, j, est, key));
            }
        }
    }
    best.map(|(i, j, _, _)| (i, j))
}

/// Indices of the two components with the smallest original positions.
fn leftmost_pair(components: &[Component]) -> (usize, usize) {
    let mut indices: Vec<usize> = (0..components.len()).collect();
    indices.sort_by_key(|&i| components[i].order);
    (indices[0], indices[1])
}

/// Join components `i` and `j` under the conjunction of every predicate that
/// directly connects them. The original left-to-right operand order decides
/// which side becomes the join's left child.
fn commit_join(components: &mut Vec<Component>, predicates: &mut Vec<Predicate>, i: usize, j: usize) {
    let (first, second) = (i.min(j), i.max(j));
    let b = components.remove(second);
    let a = components.remove(first);

    let mut condition = Predicate::always_true();
    let mut remaining = Vec::new();
    for predicate in predicates.drain(..) {
        if connects(&predicate, &a, &b) {
            condition = condition.and(&predicate);
        } else {
            remaining.push(predicate);
        }
    }
    *predicates = remaining;

    let (left, right) = if a.order <= b.order { (a, b) } else { (b, a) };
    let est = join_cardinality(left.est, right.est);
    let mut names = left.names;
    names.extend(right.names);
    components.push(Component {
        node: PlanNode::join(left.node, right.node, condition),
        names,
        est,
        order: left.order.min(right.order),
    });
}

fn commit_cross_join(components: &mut Vec<Component>, i: usize, j: usize) {
    let (first, second) = (i.min(j), i.max(j));
    let b = components.remove(second);
    let a = components.remove(first);
    let (left, right) = if a.order <= b.order { (a, b) } else { (b, a) };
    let est = join_cardinality(left.est, right.est);
    let mut names = left.names;
    names.extend(right.names);
    components.push(Component {
        node: PlanNode::join(left.node, right.node, Predicate::always_true()),
        names,
        est,
        order: left.order.min(right.order),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use raopt_core::cost::estimate;
    use raopt_core::plan::NodeKind;
    use raopt_core::stats::TableStatistics;

    fn t(name: &str) -> PlanNode {
        PlanNode::relation(name, None)
    }

    fn estimated(mut plan: PlanNode, stats: &[(&str, u64)]) -> PlanNode {
        let stats: TableStatistics = stats.iter().map(|&(n, r)| (n, r)).collect();
        estimate(&mut plan, &stats);
        plan
    }

    /// Collect the relation labels of a join tree left-to-right.
    fn leaf_order(node: &PlanNode, out: &mut Vec<String>) {
        match node {
            PlanNode::Join { left, right, .. } => {
                leaf_order(left, out);
                leaf_order(right, out);
            }
            other => out.push(other.label()),
        }
    }

    /// A=1000, B=10, C=5000 with edges A-B and B-C: A⋈B (est 100) must be
    /// committed before composing with C, rather than B⋈C (est 500).
    #[test]
    fn test_greedy_picks_cheapest_first_join() {
        let chain = PlanNode::join(
            PlanNode::join(t("a"), t("b"), Predicate::new("a.x = b.x")),
            t("c"),
            Predicate::new("b.y = c.y"),
        );
        let plan = estimated(chain, &[("a", 1000), ("b", 10), ("c", 5000)]);
        let reordered = reorder(plan);

        let PlanNode::Join { left, right, .. } = &reordered else {
            panic!("expected join at root");
        };
        assert_eq!(right.label(), "c");
        let mut inner = Vec::new();
        leaf_order(left, &mut inner);
        assert_eq!(inner, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_reorder_moves_small_tables_first() {
        // Text order joins the two big tables first; the pass should start
        // from the small pair instead.
        let chain = PlanNode::join(
            PlanNode::join(
                PlanNode::join(t("big1"), t("big2"), Predicate::new("big1.k = big2.k")),
                t("small1"),
                Predicate::new("big2.k = small1.k"),
            ),
            t("small2"),
            Predicate::new("small1.k = small2.k"),
        );
        let plan = estimated(
            chain,
            &[("big1", 100_000), ("big2", 200_000), ("small1", 10), ("small2", 20)],
        );
        let reordered = reorder(plan);
        // small1 ⋈ small2 is the cheapest connected first step, so it is the
        // innermost committed join
        fn has_join_of(node: &PlanNode, a: &str, b: &str) -> bool {
            match node {
                PlanNode::Join { left, right, .. } => {
                    (left.label() == a && right.label() == b)
                        || has_join_of(left, a, b)
                        || has_join_of(right, a, b)
                }
                _ => false,
            }
        }
        assert!(has_join_of(&reordered, "small1", "small2"));
        // and the two big tables are no longer joined directly to each other
        assert!(!has_join_of(&reordered, "big1", "big2"));
    }

    #[test]
    fn test_relation_multiset_preserved() {
        let chain = PlanNode::join(
            PlanNode::join(t("a"), t("b"), Predicate::new("a.x = b.x")),
            t("c"),
            Predicate::new("b.y = c.y"),
        );
        let plan = estimated(chain, &[("a", 10), ("b", 20), ("c", 30)]);
        let before = plan.relation_multiset();
        assert_eq!(reorder(plan).relation_multiset(), before);
    }

    #[test]
    fn test_ties_break_by_leftmost_operand() {
        // Symmetric costs: a-b and b-c both estimate the same. The leftmost
        // pair in the original chain must win.
        let chain = PlanNode::join(
            PlanNode::join(t("a"), t("b"), Predicate::new("a.x = b.x")),
            t("c"),
            Predicate::new("b.y = c.y"),
        );
        let plan = estimated(chain, &[("a", 100), ("b", 100), ("c", 100)]);
        let reordered = reorder(plan);
        let mut leaves = Vec::new();
        leaf_order(&reordered, &mut leaves);
        assert_eq!(leaves, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_disconnected_graph_falls_back_to_cross_join() {
        // No predicate connects {a, b} to c.
        let chain = PlanNode::join(
            PlanNode::join(t("a"), t("b"), Predicate::new("a.x = b.x")),
            t("c"),
            Predicate::always_true(),
        );
        let plan = estimated(chain, &[("a", 10), ("b", 20), ("c", 30)]);
        let reordered = reorder(plan);
        assert_eq!(
            reordered.relation_multiset(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        let PlanNode::Join { predicate, .. } = &reordered else {
            panic!("expected join at root");
        };
        assert!(predicate.is_always_true());
    }

    #[test]
    fn test_one_sided_predicate_becomes_residual_filter() {
        // An ON condition referencing only one side is preserved as a
        // Selection on that operand, never dropped.
        let chain = PlanNode::join(t("a"), t("b"), Predicate::new("b.flag = 1"));
        let plan = estimated(chain, &[("a", 10), ("b", 20)]);
        let reordered = reorder(plan);

        let PlanNode::Join { left, right, predicate, .. } = &reordered else {
            panic!("expected join at root");
        };
        assert!(predicate.is_always_true());
        assert_eq!(left.label(), "a");
        assert_eq!(right.kind(), NodeKind::Selection);
    }

    #[test]
    fn test_unplaceable_predicate_wraps_result() {
        // References a name absent from the chain entirely.
        let chain = PlanNode::join(t("a"), t("b"), Predicate::new("a.x = z.x"));
        let plan = estimated(chain, &[("a", 10), ("b", 20)]);
        let reordered = reorder(plan);
        assert_eq!(reordered.kind(), NodeKind::Selection);
        assert_eq!(
            reordered.relation_multiset(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_selection_interrupts_flattening() {
        // The filtered subtree is an opaque operand; the Selection above the
        // inner join must survive in place.
        let filtered = PlanNode::selection(
            Predicate::new("a.flag = 1"),
            PlanNode::join(t("a"), t("b"), Predicate::new("a.x = b.x")),
        );
        let chain = PlanNode::join(filtered, t("c"), Predicate::new("a.y = c.y"));
        let plan = estimated(chain, &[("a", 10), ("b", 20), ("c", 30)]);
        let reordered = reorder(plan);

        let PlanNode::Join { left, .. } = &reordered else {
            panic!("expected join at root");
        };
        assert_eq!(left.kind(), NodeKind::Selection);
    }

    #[test]
    fn test_reorders_inside_subqueries() {
        let inner = PlanNode::join(
            PlanNode::join(t("x"), t("y"), Predicate::new("x.k = y.k")),
            t("z"),
            Predicate::new("y.k = z.k"),
        );
        let plan = estimated(
            PlanNode::subquery(Some("tmp".into()), inner),
            &[("x", 1000), ("y", 10), ("z", 5000)],
        );
        let reordered = reorder(plan);
        let PlanNode::Subquery { child, .. } = &reordered else {
            panic!("expected subquery at root");
        };
        let mut leaves = Vec::new();
        leaf_order(child, &mut leaves);
        assert_eq!(leaves, vec!["x".to_string(), "y".to_string(), "z".to_string()]);
    }

    #[test]
    fn test_multiple_edges_between_pair_are_conjoined() {
        let chain = PlanNode::join(
            PlanNode::join(t("a"), t("b"), Predicate::new("a.x = b.x")),
            t("c"),
            Predicate::new("a.y = b.y"),
        );
        let plan = estimated(chain, &[("a", 10), ("b", 20), ("c", 5)]);
        let reordered = reorder(plan);
        // both a-b predicates end up on the same join edge
        fn find_ab_join(node: &PlanNode) -> Option<&Predicate> {
            if let PlanNode::Join { left, right, predicate, .. } = node {
                if left.label() == "a" && right.label() == "b" {
                    return Some(predicate);
                }
                return find_ab_join(left).or_else(|| find_ab_join(right));
            }
            None
        }
        let predicate = find_ab_join(&reordered).expect("a ⋈ b join present");
        assert!(predicate.text().contains("a.x = b.x"));
        assert!(predicate.text().contains("a.y = b.y"));
    }
}
