//! Record model for the experiment notebook
//!
//! ```text
//! Experiment (1) ──< run_ids ──< Run (N)
//!                                 │
//!                                 └── params / metrics / step_metrics
//! RunGroup = derived view over Runs sharing identical params
//! ```
//!
//! Params, metrics and per-step measurements are nested maps of string
//! keys to scalars or further maps, modeled as [`serde_json::Value`]
//! trees. Map iteration order is insertion order (the `preserve_order`
//! feature), which downstream comparison relies on.

mod experiment;
mod merge;
mod note;
mod run;

pub use experiment::Experiment;
pub use merge::merge_values;
pub use note::{Note, Table};
pub use run::{Run, RunBuilder, RunGroup};

/// Nested string-keyed map used for params, metrics and run info.
pub type Map = serde_json::Map<String, serde_json::Value>;
