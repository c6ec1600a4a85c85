//! Run aggregation and comparison
//!
//! Two stages, usable separately:
//!
//! - [`make_run_groups`] partitions runs by deep structural equality of
//!   their parameter maps and reduces each group's metrics and
//!   step-series by averaging,
//! - [`compare_runs`] flattens the (optionally grouped) rows into a
//!   diff-focused [`Table`](crate::record::Table) showing only the
//!   parameters that vary.
//!
//! Both are pure transforms: no I/O, deterministic output ordering
//! (first-seen for groups, members and columns).

mod groups;
mod table;

pub use groups::make_run_groups;
pub use table::{compare_runs, compare_runs_with};
