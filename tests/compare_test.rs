//! Run grouping and comparison table tests

use labnote::compare::{compare_runs, compare_runs_with, make_run_groups};
use labnote::record::{Map, Run};
use labnote::Error;
use serde_json::{json, Value};

fn as_map(value: Value) -> Map {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn run(id: &str, params: Value, metrics: Value) -> Run {
    Run::new(id, as_map(params), as_map(metrics))
}

fn sample_runs() -> Vec<Run> {
    vec![
        run("1", json!({"lr": 0.5, "wd": 0.01}), json!({"acc": 0.80})),
        run("2", json!({"lr": 0.5, "wd": 0.01}), json!({"acc": 0.82})),
        run("3", json!({"lr": 0.1, "wd": 0.01}), json!({"acc": 0.70})),
    ]
}

// =============================================================================
// Grouping
// =============================================================================

#[test]
fn test_groups_partition_by_params() {
    let groups = make_run_groups(&sample_runs()).unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].ids(), ["1", "2"]);
    assert_eq!(
        serde_json::to_value(groups[0].params()).unwrap(),
        json!({"lr": 0.5, "wd": 0.01})
    );
    assert!((groups[0].metrics()["acc"].as_f64().unwrap() - 0.81).abs() < 1e-9);

    assert_eq!(groups[1].ids(), ["3"]);
    assert!((groups[1].metrics()["acc"].as_f64().unwrap() - 0.70).abs() < 1e-9);
}

#[test]
fn test_group_members_cover_the_input() {
    let runs = sample_runs();
    let groups = make_run_groups(&runs).unwrap();

    let mut grouped_ids: Vec<&str> = groups
        .iter()
        .flat_map(|group| group.ids().iter().map(String::as_str))
        .collect();
    grouped_ids.sort_unstable();
    assert_eq!(grouped_ids, ["1", "2", "3"]);
}

#[test]
fn test_step_series_align_on_common_step_key() {
    let a = Run::builder("a")
        .params(as_map(json!({"lr": 0.5})))
        .step_metrics(vec![
            as_map(json!({"epoch": 0, "acc": 0.5})),
            as_map(json!({"epoch": 1, "acc": 0.5})),
        ])
        .build();
    let b = Run::builder("b")
        .params(as_map(json!({"lr": 0.5})))
        .step_metrics(vec![
            as_map(json!({"epoch": 1, "acc": 0.7})),
            as_map(json!({"epoch": 2, "acc": 0.7})),
        ])
        .build();

    let groups = make_run_groups(&[a, b]).unwrap();
    let series = groups[0].step_metrics().unwrap();

    let rendered: Vec<(f64, f64)> = series
        .iter()
        .map(|row| {
            (
                row["epoch"].as_f64().unwrap(),
                row["acc"].as_f64().unwrap(),
            )
        })
        .collect();
    assert_eq!(rendered.len(), 3);
    assert!((rendered[0].0 - 0.0).abs() < 1e-9);
    assert!((rendered[0].1 - 0.5).abs() < 1e-9);
    assert!((rendered[1].0 - 1.0).abs() < 1e-9);
    assert!((rendered[1].1 - 0.6).abs() < 1e-9);
    assert!((rendered[2].0 - 2.0).abs() < 1e-9);
    assert!((rendered[2].1 - 0.7).abs() < 1e-9);
}

#[test]
fn test_disjoint_step_keys_fail() {
    let a = Run::builder("a")
        .params(as_map(json!({})))
        .step_metrics(vec![as_map(json!({"iteration": 0, "loss": 1.0}))])
        .build();
    let b = Run::builder("b")
        .params(as_map(json!({})))
        .step_metrics(vec![as_map(json!({"minute": 0, "loss": 2.0}))])
        .build();

    let err = make_run_groups(&[a, b]).unwrap_err();
    assert!(matches!(err, Error::NoCommonStepKey));
}

// =============================================================================
// Comparison tables
// =============================================================================

#[test]
fn test_grouped_diff_table() {
    let table = compare_runs(&sample_runs()).unwrap();

    // wd is constant, so only lr survives diff filtering
    assert_eq!(table.columns, ["id", "lr", "acc", "comment"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0][0], json!("1,2"));
    assert!((table.rows[0][2].as_f64().unwrap() - 0.81).abs() < 1e-9);
    assert_eq!(table.rows[1][0], json!("3"));
    assert_eq!(table.rows[0][3], Value::Null);
}

#[test]
fn test_ungrouped_table_keeps_all_rows_and_columns() {
    let table = compare_runs_with(&sample_runs(), false, false).unwrap();

    assert_eq!(table.columns, ["id", "lr", "wd", "acc", "comment"]);
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.rows[0][0], json!("1"));
    assert_eq!(table.rows[2][0], json!("3"));
}

#[test]
fn test_diff_only_never_shows_constant_params() {
    let table = compare_runs_with(&sample_runs(), true, true).unwrap();
    assert!(!table.columns.contains(&"wd".to_string()));

    let full = compare_runs_with(&sample_runs(), true, false).unwrap();
    assert!(full.columns.contains(&"wd".to_string()));
}

#[test]
fn test_identical_params_collapse_to_id_and_metrics() {
    let runs = vec![
        run("1", json!({"lr": 0.5}), json!({"acc": 0.8})),
        run("2", json!({"lr": 0.5}), json!({"acc": 0.9})),
    ];
    let table = compare_runs(&runs).unwrap();

    assert_eq!(table.columns, ["id", "acc", "comment"]);
    assert_eq!(table.rows.len(), 1);
}

#[test]
fn test_table_renders_plain_text() {
    let table = compare_runs_with(&sample_runs(), false, true).unwrap();
    let text = table.to_string();
    let lines: Vec<&str> = text.lines().collect();

    // header + rule + one line per run
    assert_eq!(lines.len(), 5);
    assert!(lines[0].contains("id"));
    assert!(lines[0].contains("lr"));
    assert!(lines[2].contains('1'));
}
