//! Run recording
//!
//! A [`Recorder`] opens a [`RecordingSession`] per run: the session
//! owns a [`Memory`] buffer that deep-merges incremental params and
//! metrics, upserts step-series rows, and persists the finished run to
//! the repository. The session is an explicit value held by the caller
//! for the duration of the run; there is no ambient recording context.

mod memory;
mod recorder;

pub use memory::Memory;
pub use recorder::{Recorder, RecordingSession};
