//! # raopt-passes: Rewrite Passes over RA Plan Trees
//!
//! The two semantics-preserving plan-to-plan transformations of the raopt
//! logical optimizer, plus the per-query pipeline that runs them:
//!
//! - **`join_reorder`**: flattens a chain of joins into a join graph and
//!   greedily re-assembles it to minimize estimated intermediate
//!   cardinalities.
//! - **`pushdown`**: relocates Selection nodes as close as possible to the
//!   relations they reference without crossing a join boundary that would
//!   require both sides.
//! - **`pipeline`**: builds the baseline, reordered, and pushed-down plan
//!   variants for one query and annotates each with its cumulative cost.
//!
//! Every pass consumes an owned tree and returns a complete, independently
//! valid tree; passes never share mutable state, and neither pass changes the
//! multiset of base relations reachable from the plan.

pub mod join_reorder;
pub mod pipeline;
pub mod pushdown;

pub use join_reorder::reorder;
pub use pipeline::{optimize, OptimizedPlan, PlanReport};
pub use pushdown::pushdown;
