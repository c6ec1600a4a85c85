//! Repository facade over the run, experiment and workspace stores

use std::path::Path;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::{Experiment, Run};
use crate::workspace::Workspace;

use super::FileStorage;

const RUNS_DIR: &str = "runs";
const EXPERIMENTS_DIR: &str = "experiments";
const WORKSPACE_PATH: &str = "workspace";

/// File-based local repository for runs, experiments and the workspace.
///
/// Workspace mutation goes through [`Repository::open_workspace`],
/// which serializes read-modify-write cycles behind a storage lock so
/// at most one writer touches the workspace at a time.
#[derive(Debug)]
pub struct Repository {
    storage: FileStorage,
}

impl Repository {
    /// Open the repository discovered from the current directory.
    ///
    /// # Errors
    ///
    /// [`Error::StorageNotFound`](crate::Error::StorageNotFound) when
    /// no repository exists here or above.
    pub fn open() -> Result<Self> {
        Ok(Self {
            storage: FileStorage::open()?,
        })
    }

    /// Open the repository discovered from `base_dir`.
    ///
    /// # Errors
    ///
    /// [`Error::StorageNotFound`](crate::Error::StorageNotFound) when
    /// no repository exists there or above.
    pub fn open_from(base_dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            storage: FileStorage::open_from(base_dir)?,
        })
    }

    /// Initialize a repository in the current directory.
    ///
    /// # Errors
    ///
    /// Propagates the IO failure, including when already initialized.
    pub fn initialize() -> Result<Self> {
        Ok(Self {
            storage: FileStorage::initialize()?,
        })
    }

    /// Initialize a repository under `base_dir`.
    ///
    /// # Errors
    ///
    /// Propagates the IO failure, including when already initialized.
    pub fn initialize_at(base_dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            storage: FileStorage::initialize_at(base_dir)?,
        })
    }

    /// Save the run data.
    ///
    /// # Errors
    ///
    /// Storage or serialization failures.
    pub fn save_run(&self, run: &Run) -> Result<()> {
        let data = serde_json::to_string(run)?;
        self.storage.save(&format!("{RUNS_DIR}/{}", run.id()), &data)
    }

    /// Get the run data.
    ///
    /// # Errors
    ///
    /// [`Error::RunNotFound`](crate::Error::RunNotFound) for an unknown
    /// id.
    pub fn get_run(&self, run_id: &str) -> Result<Run> {
        let data = self
            .storage
            .get(&format!("{RUNS_DIR}/{run_id}"))
            .map_err(|err| run_not_found(err, run_id))?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Remove the run data.
    ///
    /// # Errors
    ///
    /// [`Error::RunNotFound`](crate::Error::RunNotFound) for an unknown
    /// id.
    pub fn remove_run(&self, run_id: &str) -> Result<()> {
        self.storage
            .remove(&format!("{RUNS_DIR}/{run_id}"))
            .map_err(|err| run_not_found(err, run_id))
    }

    /// Find runs whose id starts with `run_id_prefix`, sorted by id.
    ///
    /// # Errors
    ///
    /// Storage or deserialization failures.
    pub fn find_runs(&self, run_id_prefix: &str) -> Result<Vec<Run>> {
        let obj_paths = self.storage.find(RUNS_DIR, run_id_prefix)?;
        obj_paths
            .iter()
            .filter_map(|obj_path| obj_path.strip_prefix(&format!("{RUNS_DIR}/")))
            .map(|run_id| self.get_run(run_id))
            .collect()
    }

    /// Save an experiment, assigning the next sequential id on first
    /// save. Returns the stored record.
    ///
    /// # Errors
    ///
    /// Storage or serialization failures.
    pub fn save_experiment(&self, mut experiment: Experiment) -> Result<Experiment> {
        if experiment.id().is_none() {
            let next = self.next_experiment_id()?;
            info!(id = %next, title = experiment.title(), "registered experiment");
            experiment.assign_id(next);
        }
        let data = serde_json::to_string(&experiment)?;
        // id is always present after assign_id
        let id = experiment.id().unwrap_or_default().to_string();
        self.storage.save(&format!("{EXPERIMENTS_DIR}/{id}"), &data)?;
        Ok(experiment)
    }

    /// Get an experiment by id.
    ///
    /// # Errors
    ///
    /// [`Error::ExperimentNotFound`](crate::Error::ExperimentNotFound)
    /// for an unknown id.
    pub fn get_experiment(&self, experiment_id: &str) -> Result<Experiment> {
        let data = self
            .storage
            .get(&format!("{EXPERIMENTS_DIR}/{experiment_id}"))
            .map_err(|err| match err {
                Error::ObjectNotFound { .. } => Error::ExperimentNotFound {
                    id: experiment_id.to_string(),
                },
                other => other,
            })?;
        Ok(serde_json::from_str(&data)?)
    }

    /// List stored experiments in id order, oldest first (newest first
    /// with `reverse`), truncated to `limit` when given.
    ///
    /// # Errors
    ///
    /// Storage or deserialization failures.
    pub fn find_experiments(&self, limit: Option<usize>, reverse: bool) -> Result<Vec<Experiment>> {
        let mut ids: Vec<u64> = self
            .storage
            .find(EXPERIMENTS_DIR, "")?
            .iter()
            .filter_map(|obj_path| obj_path.strip_prefix(&format!("{EXPERIMENTS_DIR}/")))
            .filter_map(|id| id.parse().ok())
            .collect();
        ids.sort_unstable();
        if reverse {
            ids.reverse();
        }
        if let Some(limit) = limit {
            ids.truncate(limit);
        }
        ids.iter()
            .map(|id| self.get_experiment(&id.to_string()))
            .collect()
    }

    /// Run a read-modify-write cycle against the workspace under its
    /// exclusive lock: load the snapshot, apply `f`, persist on
    /// success. The lock is released on every exit path.
    ///
    /// # Errors
    ///
    /// Propagates the closure's failure (the snapshot is not persisted
    /// in that case), or storage failures.
    pub fn open_workspace<T>(&self, f: impl FnOnce(&mut Workspace) -> Result<T>) -> Result<T> {
        let _lock = self.storage.lock(WORKSPACE_PATH)?;
        let mut workspace = self.load_workspace()?;
        let ret = f(&mut workspace)?;
        self.save_workspace(&workspace)?;
        debug!("workspace updated");
        Ok(ret)
    }

    fn load_workspace(&self) -> Result<Workspace> {
        match self.storage.get(WORKSPACE_PATH) {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(Error::ObjectNotFound { .. }) => Ok(Workspace::new()),
            Err(err) => Err(err),
        }
    }

    fn save_workspace(&self, workspace: &Workspace) -> Result<()> {
        let data = serde_json::to_string(workspace)?;
        self.storage.save(WORKSPACE_PATH, &data)
    }

    fn next_experiment_id(&self) -> Result<String> {
        let max = self
            .storage
            .find(EXPERIMENTS_DIR, "")?
            .iter()
            .filter_map(|obj_path| obj_path.strip_prefix(&format!("{EXPERIMENTS_DIR}/")))
            .filter_map(|id| id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Ok((max + 1).to_string())
    }
}

fn run_not_found(err: Error, run_id: &str) -> Error {
    match err {
        Error::ObjectNotFound { .. } => Error::RunNotFound {
            id: run_id.to_string(),
        },
        other => other,
    }
}
