//! # Plan Rendering
//!
//! Pure presentation adapters over the RA tree; no optimization logic lives
//! here. Two surfaces for hosts:
//!
//! - [`summarize`]: a flat, serializable list of per-node summaries (type
//!   tag, bounded label, current row estimate) for hosts that do their own
//!   layout.
//! - [`to_dot`]: Graphviz DOT text with bottom-to-top layout, per-kind fill
//!   colors, and cost annotations when the tree has been estimated.
//!
//! Node identity is per-render: ids are assigned fresh on each walk and carry
//! no relationship to node content, so two structurally identical trees
//! render as distinct graphs.

use crate::plan::{NodeKind, PlanNode};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// What a renderer is allowed to know about a plan node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub kind: NodeKind,
    pub label: String,
    pub estimated_rows: Option<f64>,
}

impl NodeSummary {
    pub fn from_node(node: &PlanNode) -> Self {
        Self {
            kind: node.kind(),
            label: node.label(),
            estimated_rows: node.estimated_rows(),
        }
    }
}

/// Post-order list of node summaries (children before parents, root last).
pub fn summarize(plan: &PlanNode) -> Vec<NodeSummary> {
    let mut out = Vec::new();
    collect_summaries(plan, &mut out);
    out
}

fn collect_summaries(node: &PlanNode, out: &mut Vec<NodeSummary>) {
    for child in node.children() {
        collect_summaries(child, out);
    }
    out.push(NodeSummary::from_node(node));
}

fn fill_color(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Relation => "#AED6F1",   // light blue
        NodeKind::Selection => "#F9E79F",  // light yellow
        NodeKind::Projection => "#ABEBC6", // light green
        NodeKind::Join => "#F5B7B1",       // light red
        NodeKind::Subquery => "#D7BDE2",   // light purple
    }
}

/// Render the tree as Graphviz DOT text.
///
/// Edges point from child to parent with a bottom-to-top rank direction, so
/// leaves sit at the bottom of the drawing and the root at the top.
pub fn to_dot(plan: &PlanNode) -> String {
    let mut dot = String::new();
    dot.push_str("digraph {\n");
    dot.push_str("  rankdir=BT;\n");
    let mut next_id = 0usize;
    write_node(plan, None, &mut next_id, &mut dot);
    dot.push_str("}\n");
    dot
}

fn write_node(node: &PlanNode, parent: Option<usize>, next_id: &mut usize, dot: &mut String) {
    let id = *next_id;
    *next_id += 1;

    let mut label = format!("{}: {}", node.kind(), node.label());
    if let Some(rows) = node.estimated_rows() {
        write!(label, "\\nrows: {}", rows).expect("writing to String cannot fail");
    }
    writeln!(
        dot,
        "  n{} [label=\"{}\", shape=box, style=\"rounded,filled\", fillcolor=\"{}\", fontname=\"Helvetica\"];",
        id,
        escape(&label),
        fill_color(node.kind()),
    )
    .expect("writing to String cannot fail");

    if let Some(parent) = parent {
        writeln!(dot, "  n{} -> n{};", id, parent).expect("writing to String cannot fail");
    }

    for child in node.children() {
        write_node(child, Some(id), next_id, dot);
    }
}

fn escape(label: &str) -> String {
    label.replace('"', "\\\"")
}
