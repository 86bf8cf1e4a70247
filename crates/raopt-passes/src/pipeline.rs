//! # Per-Query Optimization Pipeline
//!
//! Hosts typically want to compare a query's plan before and after each
//! rewrite. This module runs the full pipeline once and hands back three
//! named, independently-owned plan variants:
//!
//! ```text
//! clause AST ─ build ─ estimate ──────────────────────────▶ baseline
//!                         │
//!                         └─ reorder ─ estimate ──────────▶ reordered
//!                                         │
//!                                         └─ pushdown ─ estimate ─▶ pushed_down
//! ```
//!
//! Each variant is a deep copy; the caller may keep all three alive for
//! side-by-side rendering with no coordination. There is no ambient state:
//! everything a stage needs arrives as an argument.

use crate::join_reorder::reorder;
use crate::pushdown::pushdown;
use raopt_core::ast::QuerySpec;
use raopt_core::builder::build_plan;
use raopt_core::cost::estimate;
use raopt_core::error::PlanError;
use raopt_core::plan::PlanNode;
use raopt_core::stats::TableStatistics;

/// A plan variant together with its cumulative cost (the root's estimated
/// row count after the final estimation pass).
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedPlan {
    pub plan: PlanNode,
    pub cost: f64,
}

/// The three plan variants produced for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanReport {
    /// The tree as built from the query, estimated but not rewritten.
    pub baseline: OptimizedPlan,
    /// After join reordering.
    pub reordered: OptimizedPlan,
    /// After join reordering and predicate pushdown.
    pub pushed_down: OptimizedPlan,
}

/// Build and optimize one query against a statistics snapshot.
pub fn optimize(spec: &QuerySpec, stats: &TableStatistics) -> Result<PlanReport, PlanError> {
    let mut baseline = build_plan(spec)?;
    let baseline_cost = estimate(&mut baseline, stats);

    let mut reordered = reorder(baseline.clone());
    let reordered_cost = estimate(&mut reordered, stats);

    let mut pushed_down = pushdown(reordered.clone());
    let pushed_down_cost = estimate(&mut pushed_down, stats);

    Ok(PlanReport {
        baseline: OptimizedPlan { plan: baseline, cost: baseline_cost },
        reordered: OptimizedPlan { plan: reordered, cost: reordered_cost },
        pushed_down: OptimizedPlan { plan: pushed_down, cost: pushed_down_cost },
    })
}
