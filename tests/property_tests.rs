//! Property-based tests for grouping, comparison and the workspace
//!
//! - grouping partitions the input by deep param equality
//! - averaged metrics are arithmetic means
//! - diff-only tables never show constant parameter columns
//! - the untracked view is derived, never stored
//! - Run with ProptestConfig::with_cases(100)

use labnote::compare::{compare_runs_with, make_run_groups};
use labnote::record::{Map, Run};
use labnote::workspace::Workspace;
use proptest::prelude::*;
use serde_json::{json, Value};

fn as_map(value: Value) -> Map {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

// ============================================================================
// Strategies
// ============================================================================

/// A small closed parameter space, so grouping collisions are common.
fn arb_params() -> impl Strategy<Value = Map> {
    (
        prop::sample::select(vec![0.1f64, 0.5]),
        prop::sample::select(vec![0.01f64, 0.001]),
        prop::sample::select(vec!["resnet18", "resnet50"]),
    )
        .prop_map(|(lr, wd, backbone)| {
            as_map(json!({"lr": lr, "wd": wd, "model": {"backbone": backbone}}))
        })
}

fn arb_runs(max: usize) -> impl Strategy<Value = Vec<Run>> {
    prop::collection::vec((arb_params(), 0.0f64..1.0), 1..max).prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (params, acc))| Run::new(format!("r{i}"), params, as_map(json!({"acc": acc}))))
            .collect()
    })
}

// ============================================================================
// Grouping properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: two runs land in the same group iff their params are
    /// deeply equal, and the members cover the input exactly.
    #[test]
    fn prop_grouping_partitions_by_param_equality(runs in arb_runs(12)) {
        let groups = make_run_groups(&runs).unwrap();

        // union of members equals the input set
        let mut member_ids: Vec<&str> = groups
            .iter()
            .flat_map(|group| group.ids().iter().map(String::as_str))
            .collect();
        member_ids.sort_unstable();
        let mut input_ids: Vec<&str> = runs.iter().map(Run::id).collect();
        input_ids.sort_unstable();
        prop_assert_eq!(member_ids, input_ids);

        // members share their group's params
        for group in &groups {
            for id in group.ids() {
                let run = runs.iter().find(|run| run.id() == id).unwrap();
                prop_assert_eq!(run.params(), group.params());
            }
        }

        // distinct groups hold distinct params
        for (i, a) in groups.iter().enumerate() {
            for b in &groups[i + 1..] {
                prop_assert_ne!(a.params(), b.params());
            }
        }
    }

    /// Property: group and member order is first-seen input order.
    #[test]
    fn prop_grouping_keeps_first_seen_order(runs in arb_runs(12)) {
        let groups = make_run_groups(&runs).unwrap();

        let first_member_positions: Vec<usize> = groups
            .iter()
            .map(|group| {
                runs.iter().position(|run| run.id() == group.ids()[0]).unwrap()
            })
            .collect();
        let mut sorted = first_member_positions.clone();
        sorted.sort_unstable();
        prop_assert_eq!(first_member_positions, sorted);
    }

    /// Property: a metric present in all members averages to the
    /// arithmetic mean.
    #[test]
    fn prop_averaged_metric_is_arithmetic_mean(values in prop::collection::vec(0.0f64..10.0, 1..8)) {
        let runs: Vec<Run> = values
            .iter()
            .enumerate()
            .map(|(i, acc)| {
                Run::new(
                    format!("r{i}"),
                    as_map(json!({"lr": 0.5})),
                    as_map(json!({"acc": acc})),
                )
            })
            .collect();

        let groups = make_run_groups(&runs).unwrap();
        prop_assert_eq!(groups.len(), 1);

        let expected = values.iter().sum::<f64>() / values.len() as f64;
        let actual = groups[0].metrics()["acc"].as_f64().unwrap();
        prop_assert!((actual - expected).abs() < 1e-9);
    }

    /// Property: diff-only tables show a parameter column iff its value
    /// varies across rows.
    #[test]
    fn prop_diff_only_hides_constant_params(runs in arb_runs(10)) {
        let table = compare_runs_with(&runs, false, true).unwrap();

        for key in ["lr", "wd", "model.backbone"] {
            let values: Vec<Value> = runs
                .iter()
                .map(|run| match key {
                    "model.backbone" => run.params()["model"]["backbone"].clone(),
                    _ => run.params()[key].clone(),
                })
                .collect();
            let varies = values.iter().any(|value| *value != values[0]);
            prop_assert_eq!(
                table.columns.contains(&key.to_string()),
                varies,
                "column {} presence should track variation",
                key
            );
        }
    }
}

// ============================================================================
// Workspace properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: the untracked view equals the configured ids minus
    /// every assigned id, and reset restores the full pool.
    #[test]
    fn prop_untracked_view_is_derived(
        run_count in 1usize..8,
        exp_count in 1usize..4,
        assignments in prop::collection::vec((0usize..8, 0usize..4), 0..12),
    ) {
        let mut ws = Workspace::new();
        for i in 0..run_count {
            ws.add_untracked_run(format!("r{i}"));
        }
        for j in 0..exp_count {
            ws.add_uncommitted_experiment(format!("e{j}"));
        }

        let mut assigned: Vec<String> = Vec::new();
        for (i, j) in assignments {
            let run_id = format!("r{}", i % run_count);
            let exp_id = format!("e{}", j % exp_count);
            ws.assign_run_to_experiment(run_id.as_str(), &exp_id).unwrap();
            if !assigned.contains(&run_id) {
                assigned.push(run_id);
            }
        }

        let expected: Vec<String> = (0..run_count)
            .map(|i| format!("r{i}"))
            .filter(|id| !assigned.contains(id))
            .collect();
        prop_assert_eq!(ws.untracked_runs(), expected);

        ws.reset_assignments();
        let full: Vec<String> = (0..run_count).map(|i| format!("r{i}")).collect();
        prop_assert_eq!(ws.untracked_runs(), full);
    }

    /// Property: add and assign operations are idempotent under
    /// repeated identical calls.
    #[test]
    fn prop_workspace_ops_idempotent(repeat in 1usize..5) {
        let mut ws = Workspace::new();
        for _ in 0..repeat {
            ws.add_untracked_run("r1");
            ws.add_uncommitted_experiment("e1");
            ws.assign_run_to_experiment("r1", "e1").unwrap();
        }

        prop_assert_eq!(ws.uncommitted_experiments(), vec!["e1".to_string()]);
        prop_assert_eq!(ws.assigned_to("e1"), vec!["r1".to_string()]);
        prop_assert!(ws.untracked_runs().is_empty());
    }
}
