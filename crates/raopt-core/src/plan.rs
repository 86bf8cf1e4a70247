//! # RA Plan Tree
//!
//! This module defines the relational-algebra plan tree that every stage of
//! the optimizer consumes and produces. The tree is a closed enum: the cost
//! estimator and both rewrite passes match on it exhaustively, so adding a
//! variant is a compile error everywhere it is not handled.
//!
//! ## Ownership
//!
//! Every non-leaf node owns its children exclusively (`Box`ed fields). There
//! are no shared subtrees; a deep copy is `Clone`. Each optimization pass
//! takes the tree by value and returns a new tree, so independent plan
//! versions ("baseline", "reordered", "pushed-down") never alias state.
//!
//! ## Cardinality Annotation
//!
//! `rows` is `None` until the cost estimator has run. After a successful
//! estimation pass it is a finite, non-negative number on every node, and the
//! root's value is the plan's cumulative cost.

use crate::predicate::Predicate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum predicate text length in a node label before truncation.
const LABEL_PREDICATE_LEN: usize = 50;
/// Maximum number of projection columns shown in a node label.
const LABEL_PROJECTION_COLS: usize = 3;

/// A node in a relational-algebra plan tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanNode {
    /// A leaf referencing a base table, optionally aliased.
    Relation {
        table: String,
        alias: Option<String>,
        rows: Option<f64>,
    },
    /// A unary filter over its child.
    Selection {
        predicate: Predicate,
        child: Box<PlanNode>,
        rows: Option<f64>,
    },
    /// An ordered output column list; cardinality-preserving.
    Projection {
        columns: Vec<String>,
        child: Box<PlanNode>,
        rows: Option<f64>,
    },
    /// A binary join under the given predicate.
    Join {
        left: Box<PlanNode>,
        right: Box<PlanNode>,
        predicate: Predicate,
        rows: Option<f64>,
    },
    /// A fully-built sub-plan, cardinality-opaque to its parent.
    Subquery {
        alias: Option<String>,
        child: Box<PlanNode>,
        rows: Option<f64>,
    },
}

/// Kind discriminant for pattern matching and rendering (without data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Relation,
    Selection,
    Projection,
    Join,
    Subquery,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Relation => "Relation",
            NodeKind::Selection => "Selection",
            NodeKind::Projection => "Projection",
            NodeKind::Join => "Join",
            NodeKind::Subquery => "Subquery",
        };
        f.write_str(s)
    }
}

impl PlanNode {
    pub fn relation(table: impl Into<String>, alias: Option<String>) -> Self {
        PlanNode::Relation {
            table: table.into(),
            alias,
            rows: None,
        }
    }

    pub fn selection(predicate: Predicate, child: PlanNode) -> Self {
        PlanNode::Selection {
            predicate,
            child: Box::new(child),
            rows: None,
        }
    }

    pub fn projection(columns: Vec<String>, child: PlanNode) -> Self {
        PlanNode::Projection {
            columns,
            child: Box::new(child),
            rows: None,
        }
    }

    pub fn join(left: PlanNode, right: PlanNode, predicate: Predicate) -> Self {
        PlanNode::Join {
            left: Box::new(left),
            right: Box::new(right),
            predicate,
            rows: None,
        }
    }

    pub fn subquery(alias: Option<String>, child: PlanNode) -> Self {
        PlanNode::Subquery {
            alias,
            child: Box::new(child),
            rows: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            PlanNode::Relation { .. } => NodeKind::Relation,
            PlanNode::Selection { .. } => NodeKind::Selection,
            PlanNode::Projection { .. } => NodeKind::Projection,
            PlanNode::Join { .. } => NodeKind::Join,
            PlanNode::Subquery { .. } => NodeKind::Subquery,
        }
    }

    /// Ordered list of direct subtrees (empty for `Relation`).
    pub fn children(&self) -> Vec<&PlanNode> {
        match self {
            PlanNode::Relation { .. } => vec![],
            PlanNode::Selection { child, .. }
            | PlanNode::Projection { child, .. }
            | PlanNode::Subquery { child, .. } => vec![child],
            PlanNode::Join { left, right, .. } => vec![left, right],
        }
    }

    /// Estimated output cardinality, `None` before the estimator has run.
    pub fn estimated_rows(&self) -> Option<f64> {
        match self {
            PlanNode::Relation { rows, .. }
            | PlanNode::Selection { rows, .. }
            | PlanNode::Projection { rows, .. }
            | PlanNode::Join { rows, .. }
            | PlanNode::Subquery { rows, .. } => *rows,
        }
    }

    /// Lowercased relation and alias names visible to operators above this
    /// subtree. An aliased relation is visible only through its alias; a
    /// subquery is visible only through its alias and hides everything
    /// inside it.
    pub fn visible_names(&self) -> std::collections::BTreeSet<String> {
        let mut names = std::collections::BTreeSet::new();
        self.collect_visible_names(&mut names);
        names
    }

    fn collect_visible_names(&self, out: &mut std::collections::BTreeSet<String>) {
        match self {
            PlanNode::Relation { table, alias, .. } => {
                let name = alias.as_deref().unwrap_or(table);
                out.insert(name.to_ascii_lowercase());
            }
            PlanNode::Subquery { alias, .. } => {
                if let Some(alias) = alias {
                    out.insert(alias.to_ascii_lowercase());
                }
            }
            PlanNode::Selection { child, .. } | PlanNode::Projection { child, .. } => {
                child.collect_visible_names(out);
            }
            PlanNode::Join { left, right, .. } => {
                left.collect_visible_names(out);
                right.collect_visible_names(out);
            }
        }
    }

    /// Sorted multiset of base table names reachable from this subtree,
    /// including relations inside subqueries. The rewrite passes must leave
    /// this multiset unchanged.
    pub fn relation_multiset(&self) -> Vec<String> {
        let mut tables = Vec::new();
        self.collect_relations(&mut tables);
        tables.sort();
        tables
    }

    fn collect_relations(&self, out: &mut Vec<String>) {
        match self {
            PlanNode::Relation { table, .. } => out.push(table.to_ascii_lowercase()),
            PlanNode::Selection { child, .. }
            | PlanNode::Projection { child, .. }
            | PlanNode::Subquery { child, .. } => child.collect_relations(out),
            PlanNode::Join { left, right, .. } => {
                left.collect_relations(out);
                right.collect_relations(out);
            }
        }
    }

    /// Short human label derived from the node's defining attribute, bounded
    /// in length for rendering.
    pub fn label(&self) -> String {
        match self {
            PlanNode::Relation { table, alias, .. } => match alias {
                Some(alias) => format!("{} AS {}", table, alias),
                None => table.clone(),
            },
            PlanNode::Selection { predicate, .. } => truncate(predicate.text(), LABEL_PREDICATE_LEN),
            PlanNode::Projection { columns, .. } => {
                let mut label = columns
                    .iter()
                    .take(LABEL_PROJECTION_COLS)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ");
                if columns.len() > LABEL_PROJECTION_COLS {
                    label.push_str(", ...");
                }
                label
            }
            PlanNode::Join { predicate, .. } => truncate(predicate.text(), LABEL_PREDICATE_LEN),
            PlanNode::Subquery { alias, .. } => alias.clone().unwrap_or_default(),
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    }
}

impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanNode::Relation { table, alias, .. } => match alias {
                Some(alias) => write!(f, "Relation(\"{} AS {}\")", table, alias),
                None => write!(f, "Relation(\"{}\")", table),
            },
            PlanNode::Selection { predicate, child, .. } => {
                write!(f, "Selection(\"{}\", {})", predicate, child)
            }
            PlanNode::Projection { columns, child, .. } => {
                write!(f, "Projection([{}], {})", columns.join(", "), child)
            }
            PlanNode::Join { left, right, predicate, .. } => {
                write!(f, "Join({}, {}, \"{}\")", left, right, predicate)
            }
            PlanNode::Subquery { alias, child, .. } => {
                write!(f, "Subquery(\"{}\", {})", alias.as_deref().unwrap_or(""), child)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_join() -> PlanNode {
        PlanNode::join(
            PlanNode::relation("orders", Some("o".into())),
            PlanNode::relation("customer", None),
            Predicate::new("o.custkey = customer.custkey"),
        )
    }

    #[test]
    fn test_children_order() {
        let join = sample_join();
        let kids = join.children();
        assert_eq!(kids.len(), 2);
        assert_eq!(kids[0].label(), "orders AS o");
        assert_eq!(kids[1].label(), "customer");
        assert!(kids[0].children().is_empty());
    }

    #[test]
    fn test_rows_undefined_before_estimation() {
        let join = sample_join();
        assert_eq!(join.estimated_rows(), None);
        for child in join.children() {
            assert_eq!(child.estimated_rows(), None);
        }
    }

    #[test]
    fn test_visible_names_respect_aliases() {
        let join = sample_join();
        let names = join.visible_names();
        assert!(names.contains("o"));
        assert!(names.contains("customer"));
        // the aliased table is not visible under its base name
        assert!(!names.contains("orders"));
    }

    #[test]
    fn test_subquery_hides_inner_relations() {
        let sub = PlanNode::subquery(
            Some("tmp".into()),
            PlanNode::relation("nation", None),
        );
        let names = sub.visible_names();
        assert_eq!(names.len(), 1);
        assert!(names.contains("tmp"));
        // but the multiset still sees through it
        assert_eq!(sub.relation_multiset(), vec!["nation".to_string()]);
    }

    #[test]
    fn test_deep_copy_is_independent() {
        let join = sample_join();
        let copy = join.clone();
        assert_eq!(join, copy);
        // mutating the copy must not affect the original
        let mutated = PlanNode::selection(Predicate::new("o.total > 10"), copy);
        assert_eq!(join.kind(), NodeKind::Join);
        assert_eq!(mutated.kind(), NodeKind::Selection);
    }

    #[test]
    fn test_projection_label_is_bounded() {
        let cols: Vec<String> = (0..10).map(|i| format!("c{}", i)).collect();
        let proj = PlanNode::projection(cols, PlanNode::relation("t", None));
        assert_eq!(proj.label(), "c0, c1, c2, ...");
    }

    #[test]
    fn test_predicate_label_is_truncated() {
        let long = format!("t.x = '{}'", "a".repeat(80));
        let sel = PlanNode::selection(Predicate::new(long), PlanNode::relation("t", None));
        assert!(sel.label().len() <= 53);
        assert!(sel.label().ends_with("..."));
    }

    #[test]
    fn test_serde_round_trip() {
        let join = sample_join();
        let json = serde_json::to_string(&join).unwrap();
        let back: PlanNode = serde_json::from_str(&json).unwrap();
        assert_eq!(join, back);
    }
}
