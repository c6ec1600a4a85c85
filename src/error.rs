//! Error types for labnote

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Labnote error types
#[derive(Error, Debug)]
pub enum Error {
    /// Operation referenced an experiment id that is not currently uncommitted
    #[error("no uncommitted experiment with the id: {id}")]
    UnknownExperiment {
        /// The offending experiment id
        id: String,
    },

    /// Run id absent from both the untracked pool and all assignment lists
    #[error("run id not found in untracked or assigned runs ({id})")]
    RunNotFound {
        /// The offending run id
        id: String,
    },

    /// Experiment record does not exist in the store
    #[error("no experiment record for the id: {id}")]
    ExperimentNotFound {
        /// The offending experiment id
        id: String,
    },

    /// Commit attempted with zero uncommitted experiments
    #[error("uncommitted experiment does not exist")]
    EmptyWorkspace,

    /// Commit without an explicit id while more than one candidate exists
    #[error("specify the experiment id to be committed; candidates: {}", candidates.join(", "))]
    AmbiguousCommit {
        /// Every currently-uncommitted experiment id
        candidates: Vec<String>,
    },

    /// No shared step key across the step-series of grouped runs
    #[error("no common step key across step-series (expected one of: epoch, epochs, step, steps, iteration, iterations, iter)")]
    NoCommonStepKey,

    /// Storage object does not exist
    #[error("object not found ({path})")]
    ObjectNotFound {
        /// The requested object path
        path: String,
    },

    /// Object path contains an empty or reserved segment
    #[error("invalid object path ({path})")]
    InvalidObjectPath {
        /// The rejected object path
        path: String,
    },

    /// No storage directory found walking up from the base directory
    #[error("local storage not found (dir name: {dir})")]
    StorageNotFound {
        /// The directory name that was searched for
        dir: String,
    },

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
