//! Recording sessions backed by a repository

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::record::{Map, Run};
use crate::storage::Repository;

use super::Memory;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

fn timestamp() -> Value {
    Value::String(Utc::now().format(TIMESTAMP_FORMAT).to_string())
}

/// Creates recording sessions against a repository.
pub struct Recorder {
    repo: Repository,
}

impl Recorder {
    /// Create a recorder writing to the given repository.
    #[must_use]
    pub const fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Start a recording session.
    ///
    /// Generates a fresh run id, registers it as untracked in the
    /// workspace, stamps start info and persists the initial (empty)
    /// run so the id is visible immediately.
    ///
    /// # Errors
    ///
    /// Storage failures while persisting the initial run or updating
    /// the workspace.
    pub fn start(&self) -> Result<RecordingSession<'_>> {
        let run_id = Uuid::new_v4().simple().to_string();

        let mut memory = Memory::new(run_id.clone());
        let mut start_info = Map::new();
        start_info.insert("start_time".to_string(), timestamp());
        start_info.insert("end_time".to_string(), Value::Null);
        start_info.insert("status".to_string(), Value::from("running"));
        memory.set_info(start_info);

        self.repo.save_run(&memory.to_run())?;
        self.repo.open_workspace(|ws| {
            ws.add_untracked_run(run_id.as_str());
            Ok(())
        })?;
        info!(%run_id, "recording started");

        Ok(RecordingSession {
            repo: &self.repo,
            memory,
            sealed: false,
        })
    }

    /// The underlying repository.
    #[must_use]
    pub const fn repository(&self) -> &Repository {
        &self.repo
    }
}

/// One run's recording scope.
///
/// The session persists the run exactly once on every exit path:
/// [`finish`](Self::finish) marks it complete, [`abort`](Self::abort)
/// marks it failed, and dropping an unsealed session marks it
/// interrupted on a best-effort basis.
pub struct RecordingSession<'a> {
    repo: &'a Repository,
    memory: Memory,
    sealed: bool,
}

impl RecordingSession<'_> {
    /// Get the generated run id.
    #[must_use]
    pub fn run_id(&self) -> &str {
        self.memory.run_id()
    }

    /// Record params, deep-merged with what is already buffered.
    pub fn params(&mut self, data: Map) {
        self.memory.set_params(data);
    }

    /// Record whole-run metrics, deep-merged with what is already
    /// buffered.
    pub fn metrics(&mut self, data: Map) {
        self.memory.set_metrics(data);
    }

    /// Record one step's measurements, keyed by `step_key` (for
    /// example `"epoch"`).
    pub fn step_metrics(&mut self, step_key: &str, step: i64, data: Map) {
        self.memory.set_step_metrics(step_key, step, data);
    }

    /// Record free-form metadata.
    pub fn info(&mut self, data: Map) {
        self.memory.set_info(data);
    }

    /// Finish the session, persisting the run with complete status.
    ///
    /// # Errors
    ///
    /// Storage failures while persisting the final run.
    pub fn finish(mut self) -> Result<Run> {
        self.seal("complete")
    }

    /// Abort the session, persisting the run with failed status.
    ///
    /// # Errors
    ///
    /// Storage failures while persisting the final run.
    pub fn abort(mut self) -> Result<Run> {
        self.seal("failed")
    }

    fn seal(&mut self, status: &str) -> Result<Run> {
        self.sealed = true;

        let mut end_info = Map::new();
        end_info.insert("end_time".to_string(), timestamp());
        end_info.insert("status".to_string(), Value::from(status));
        self.memory.set_info(end_info);

        let run = self.memory.to_run();
        self.repo.save_run(&run)?;
        info!(run_id = %run.id(), status, "recording sealed");
        Ok(run)
    }
}

impl Drop for RecordingSession<'_> {
    fn drop(&mut self) {
        if !self.sealed {
            if let Err(err) = self.seal("interrupted") {
                warn!(run_id = %self.memory.run_id(), %err, "failed to persist interrupted run");
            }
        }
    }
}
