//! # Labnote: a file-backed experiment notebook
//!
//! Labnote records experiment runs (params + metrics), stages related
//! runs into draft experiments in a workspace, and commits finished
//! experiments into a permanent log — the moral equivalent of `git
//! add` / `git commit` for training runs.
//!
//! The crate splits into a pure core and an I/O shell:
//!
//! - [`workspace`]: the in-memory bookkeeping state machine for
//!   untracked runs and uncommitted experiments
//! - [`compare`]: grouping runs by identical configuration and
//!   building diff-focused comparison tables
//! - [`record`]: the Run / Experiment / Note data model
//! - [`recording`]: session-scoped run recording
//! - [`storage`]: the `.labnote` object store and repository facade
//!
//! ## Example
//!
//! ```rust
//! use labnote::compare::compare_runs;
//! use labnote::record::Run;
//! use labnote::workspace::Workspace;
//!
//! # fn main() -> labnote::Result<()> {
//! let params = serde_json::json!({"lr": 0.5}).as_object().cloned().unwrap();
//! let metrics = serde_json::json!({"acc": 0.8}).as_object().cloned().unwrap();
//! let run = Run::new("a1b2", params, metrics);
//!
//! let mut ws = Workspace::new();
//! ws.add_untracked_run(run.id());
//! ws.add_uncommitted_experiment("1");
//! ws.assign_run_to_experiment(run.id(), "1")?;
//! let committed = ws.commit(None)?;
//! assert_eq!(committed, [run.id()]);
//!
//! let table = compare_runs(&[run])?;
//! println!("{table}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod compare;
pub mod error;
pub mod record;
pub mod recording;
pub mod storage;
pub mod workspace;

pub use error::{Error, Result};
