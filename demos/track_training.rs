//! Track Training Example
//!
//! Records a small hyperparameter sweep, stages the runs into a draft
//! experiment and commits it with a comparison table attached.
//!
//! Run with: cargo run --example track_training

use anyhow::Result;
use labnote::compare::compare_runs;
use labnote::record::{Experiment, Map, Note};
use labnote::recording::Recorder;
use labnote::storage::Repository;
use serde_json::json;

fn as_map(value: serde_json::Value) -> Map {
    value.as_object().cloned().expect("object literal")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let workdir = tempfile::tempdir()?;
    let recorder = Recorder::new(Repository::initialize_at(workdir.path())?);

    println!("=== Labnote Experiment Tracking ===\n");

    // -------------------------------------------------------------------------
    // 1. Record a sweep over two learning rates, two seeds each
    // -------------------------------------------------------------------------
    println!("1. Recording runs...");

    let mut run_ids = Vec::new();
    for &lr in &[0.1f64, 0.5f64] {
        for seed in 0..2 {
            let mut session = recorder.start()?;
            session.params(as_map(json!({"lr": lr, "seed": seed})));

            let mut acc = 0.0;
            for epoch in 0..5 {
                acc = 1.0 - lr.mul_add(0.2, (1.0 + epoch as f64).recip());
                session.step_metrics("epoch", epoch, as_map(json!({"acc": acc})));
            }
            session.metrics(as_map(json!({"acc": acc})));

            let run = session.finish()?;
            println!("   recorded {} (lr={lr}, seed={seed})", run.id());
            run_ids.push(run.id().to_string());
        }
    }

    let repo = recorder.repository();

    // -------------------------------------------------------------------------
    // 2. Stage the runs into a draft experiment
    // -------------------------------------------------------------------------
    println!("\n2. Staging runs...");

    let experiment = repo.save_experiment(
        Experiment::builder("lr sweep")
            .purpose("how does the learning rate affect final accuracy?")
            .build(),
    )?;
    let exp_id = experiment.id().expect("assigned on save").to_string();

    repo.open_workspace(|ws| {
        ws.add_uncommitted_experiment(exp_id.as_str());
        for run_id in &run_ids {
            ws.assign_run_to_experiment(run_id.as_str(), &exp_id)?;
        }
        Ok(())
    })?;
    println!("   experiment {exp_id} holds {} runs", run_ids.len());

    // -------------------------------------------------------------------------
    // 3. Compare: seeds with equal params collapse into groups
    // -------------------------------------------------------------------------
    println!("\n3. Comparing runs...\n");

    let runs = run_ids
        .iter()
        .map(|run_id| repo.get_run(run_id))
        .collect::<labnote::Result<Vec<_>>>()?;
    let table = compare_runs(&runs)?;
    println!("{table}");

    // -------------------------------------------------------------------------
    // 4. Commit the experiment into the log
    // -------------------------------------------------------------------------
    println!("\n4. Committing...");

    let committed = repo.open_workspace(|ws| ws.commit(Some(&exp_id)))?;
    let mut experiment = repo.get_experiment(&exp_id)?;
    experiment.set_run_ids(committed);
    experiment.prepend_note(Note::Table(table));
    experiment.set_conclusion("lr 0.1 reaches the better final accuracy");
    repo.save_experiment(experiment)?;

    // -------------------------------------------------------------------------
    // 5. Read the log back
    // -------------------------------------------------------------------------
    println!("\n5. Experiment log:\n");
    for logged in repo.find_experiments(None, true)? {
        println!("{logged}\n");
    }

    Ok(())
}
