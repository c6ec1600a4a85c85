//! Workspace state machine
//!
//! Tracks the lifecycle of runs and draft experiments between recording
//! and commit. Per experiment id: uncommitted -> (commit) -> committed,
//! at which point the id leaves the live state entirely. Per run id:
//! untracked -> (assign) -> assigned, back to untracked via reset or
//! unassignment, and permanently out of the pool once its experiment
//! commits.
//!
//! All operations are synchronous, pure transforms over the in-memory
//! snapshot; persistence and locking belong to the storage layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Live bookkeeping for untracked runs, uncommitted experiments and
/// run-to-experiment assignments.
///
/// Invariants:
/// - every key of the assignment map is an uncommitted experiment id
/// - the untracked view is derived: stored untracked ids minus any id
///   present in an assignment list
/// - no run id appears twice within one experiment's assignment list
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workspace {
    #[serde(default)]
    untracked_runs: Vec<String>,
    #[serde(default)]
    uncommitted_experiments: Vec<String>,
    #[serde(default)]
    assigned_runs: BTreeMap<String, Vec<String>>,
}

impl Workspace {
    /// Create an empty workspace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Untracked run ids: stored ids minus those currently assigned to
    /// any experiment, in recording order.
    #[must_use]
    pub fn untracked_runs(&self) -> Vec<String> {
        self.untracked_runs
            .iter()
            .filter(|run_id| !self.is_assigned(run_id))
            .cloned()
            .collect()
    }

    /// Uncommitted experiment ids, in creation order.
    #[must_use]
    pub fn uncommitted_experiments(&self) -> Vec<String> {
        self.uncommitted_experiments.clone()
    }

    /// Assigned run ids per uncommitted experiment, in creation order.
    /// Experiments with no assignments map to an empty list.
    #[must_use]
    pub fn assigned_runs(&self) -> Vec<(String, Vec<String>)> {
        self.uncommitted_experiments
            .iter()
            .map(|exp_id| (exp_id.clone(), self.assigned_to(exp_id)))
            .collect()
    }

    /// Run ids assigned to one experiment, in assignment order.
    #[must_use]
    pub fn assigned_to(&self, experiment_id: &str) -> Vec<String> {
        self.assigned_runs
            .get(experiment_id)
            .cloned()
            .unwrap_or_default()
    }

    fn is_assigned(&self, run_id: &str) -> bool {
        self.assigned_runs
            .values()
            .any(|run_ids| run_ids.iter().any(|id| id == run_id))
    }

    /// Add a run id to the untracked pool. Re-adding a known id is a
    /// no-op.
    pub fn add_untracked_run(&mut self, run_id: impl Into<String>) {
        let run_id = run_id.into();
        if !self.untracked_runs.contains(&run_id) {
            self.untracked_runs.push(run_id);
        }
    }

    /// Add an experiment id to the uncommitted list, preserving
    /// creation order. Duplicate insertion is a no-op.
    pub fn add_uncommitted_experiment(&mut self, experiment_id: impl Into<String>) {
        let experiment_id = experiment_id.into();
        if !self.uncommitted_experiments.contains(&experiment_id) {
            self.uncommitted_experiments.push(experiment_id);
        }
    }

    /// Assign a run to an uncommitted experiment, appending in call
    /// order. Re-assigning the same pair is a no-op.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownExperiment`] when the experiment id is not
    /// currently uncommitted.
    pub fn assign_run_to_experiment(
        &mut self,
        run_id: impl Into<String>,
        experiment_id: &str,
    ) -> Result<()> {
        if !self.uncommitted_experiments.iter().any(|e| e == experiment_id) {
            return Err(Error::UnknownExperiment {
                id: experiment_id.to_string(),
            });
        }
        let run_id = run_id.into();
        let run_ids = self.assigned_runs.entry(experiment_id.to_string()).or_default();
        if !run_ids.contains(&run_id) {
            run_ids.push(run_id);
        }
        Ok(())
    }

    /// Clear every run-to-experiment assignment. Previously assigned
    /// runs immediately reappear in the untracked view.
    pub fn reset_assignments(&mut self) {
        self.assigned_runs.clear();
    }

    /// Remove a run id from the untracked pool and from every
    /// assignment list, wherever found. Removing from only one of the
    /// possible locations is still a success.
    ///
    /// # Errors
    ///
    /// [`Error::RunNotFound`] when the id is absent from the untracked
    /// pool and all assignment lists.
    pub fn remove_run(&mut self, run_id: &str) -> Result<()> {
        let mut found = false;

        if let Some(pos) = self.untracked_runs.iter().position(|id| id == run_id) {
            self.untracked_runs.remove(pos);
            found = true;
        }

        for run_ids in self.assigned_runs.values_mut() {
            if let Some(pos) = run_ids.iter().position(|id| id == run_id) {
                run_ids.remove(pos);
                found = true;
            }
        }

        if found {
            Ok(())
        } else {
            Err(Error::RunNotFound {
                id: run_id.to_string(),
            })
        }
    }

    /// Commit an experiment: the target leaves the uncommitted list,
    /// its assignment entry is deleted, and its assigned run ids leave
    /// the untracked pool permanently. Returns the committed run id
    /// list (possibly empty).
    ///
    /// With no explicit id the single uncommitted experiment is
    /// auto-selected.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyWorkspace`] when no uncommitted experiment exists
    /// - [`Error::AmbiguousCommit`] when no id is given and several
    ///   candidates exist; the error lists them
    /// - [`Error::UnknownExperiment`] when the given id is not
    ///   currently uncommitted
    pub fn commit(&mut self, experiment_id: Option<&str>) -> Result<Vec<String>> {
        if self.uncommitted_experiments.is_empty() {
            return Err(Error::EmptyWorkspace);
        }

        let target = match experiment_id {
            Some(id) => {
                if !self.uncommitted_experiments.iter().any(|e| e == id) {
                    return Err(Error::UnknownExperiment { id: id.to_string() });
                }
                id.to_string()
            }
            None => {
                if self.uncommitted_experiments.len() > 1 {
                    return Err(Error::AmbiguousCommit {
                        candidates: self.uncommitted_experiments.clone(),
                    });
                }
                self.uncommitted_experiments[0].clone()
            }
        };

        let committed = self.assigned_runs.remove(&target).unwrap_or_default();
        self.uncommitted_experiments.retain(|id| *id != target);
        self.untracked_runs.retain(|id| !committed.contains(id));

        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_untracked_run_idempotent() {
        let mut ws = Workspace::new();
        ws.add_untracked_run("r1");
        ws.add_untracked_run("r1");
        assert_eq!(ws.untracked_runs(), ["r1"]);
    }

    #[test]
    fn test_assignment_hides_run_from_untracked_view() {
        let mut ws = Workspace::new();
        ws.add_untracked_run("r1");
        ws.add_untracked_run("r2");
        ws.add_uncommitted_experiment("e1");
        ws.assign_run_to_experiment("r1", "e1").unwrap();

        assert_eq!(ws.untracked_runs(), ["r2"]);
        assert_eq!(ws.assigned_to("e1"), ["r1"]);
    }

    #[test]
    fn test_reset_restores_untracked_view() {
        let mut ws = Workspace::new();
        ws.add_untracked_run("r1");
        ws.add_uncommitted_experiment("e1");
        ws.assign_run_to_experiment("r1", "e1").unwrap();
        ws.reset_assignments();

        assert_eq!(ws.untracked_runs(), ["r1"]);
        assert!(ws.assigned_to("e1").is_empty());
    }

    #[test]
    fn test_assign_to_unknown_experiment() {
        let mut ws = Workspace::new();
        let err = ws.assign_run_to_experiment("r1", "exp99").unwrap_err();
        assert!(matches!(err, Error::UnknownExperiment { id } if id == "exp99"));
    }

    #[test]
    fn test_commit_removes_runs_permanently() {
        let mut ws = Workspace::new();
        ws.add_untracked_run("r1");
        ws.add_untracked_run("r2");
        ws.add_uncommitted_experiment("e1");
        ws.assign_run_to_experiment("r1", "e1").unwrap();

        let committed = ws.commit(None).unwrap();
        assert_eq!(committed, ["r1"]);
        assert!(ws.uncommitted_experiments().is_empty());
        assert_eq!(ws.untracked_runs(), ["r2"]);
    }

    #[test]
    fn test_commit_ambiguous_lists_candidates() {
        let mut ws = Workspace::new();
        ws.add_uncommitted_experiment("e1");
        ws.add_uncommitted_experiment("e2");

        let err = ws.commit(None).unwrap_err();
        match err {
            Error::AmbiguousCommit { candidates } => {
                assert_eq!(candidates, ["e1", "e2"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_remove_run_not_found() {
        let mut ws = Workspace::new();
        let err = ws.remove_run("rX").unwrap_err();
        assert!(matches!(err, Error::RunNotFound { id } if id == "rX"));
    }
}
