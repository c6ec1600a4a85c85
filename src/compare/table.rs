//! Diff-focused tabular summaries of runs

use serde_json::Value;

use crate::error::Result;
use crate::record::{Map, Run, RunGroup, Table};

use super::make_run_groups;

/// Compare runs with grouping enabled and constant parameters hidden.
///
/// Equivalent to `compare_runs_with(runs, true, true)`.
///
/// # Errors
///
/// Propagates [`make_run_groups`] failures.
pub fn compare_runs(runs: &[Run]) -> Result<Table> {
    compare_runs_with(runs, true, true)
}

/// Compare runs and return the result as table data.
///
/// With `grouping`, rows are run groups (runs with identical params
/// merged, metrics averaged); otherwise one row per run. With
/// `diff_only`, parameter columns whose value is identical across all
/// rows are dropped. Metric columns are never filtered. Columns are
/// `id`, the (varying) parameters, the metrics, then a trailing
/// always-null `comment` for downstream editing; cell lookups that miss
/// produce null.
///
/// # Errors
///
/// Propagates [`make_run_groups`] failures when `grouping` is set.
pub fn compare_runs_with(runs: &[Run], grouping: bool, diff_only: bool) -> Result<Table> {
    let rows: Vec<RunGroup> = if grouping {
        make_run_groups(runs)?
    } else {
        runs.iter()
            .map(|run| {
                RunGroup::new(
                    vec![run.id().to_string()],
                    run.params().clone(),
                    run.metrics().clone(),
                    None,
                )
            })
            .collect()
    };

    let mut param_variations: Vec<(Vec<String>, Vec<Value>)> = Vec::new();
    let mut metric_keys: Vec<Vec<String>> = Vec::new();
    for row in &rows {
        for (key_path, value) in flatten(row.params()) {
            match param_variations
                .iter_mut()
                .find(|(known, _)| *known == key_path)
            {
                Some((_, seen)) => {
                    if !seen.contains(&value) {
                        seen.push(value);
                    }
                }
                None => param_variations.push((key_path, vec![value])),
            }
        }
        for (key_path, _) in flatten(row.metrics()) {
            if !metric_keys.contains(&key_path) {
                metric_keys.push(key_path);
            }
        }
    }

    if diff_only {
        param_variations.retain(|(_, seen)| seen.len() > 1);
    }
    let param_keys: Vec<Vec<String>> = param_variations
        .into_iter()
        .map(|(key_path, _)| key_path)
        .collect();

    let mut columns = vec!["id".to_string()];
    columns.extend(param_keys.iter().map(|key_path| key_path.join(".")));
    columns.extend(metric_keys.iter().map(|key_path| key_path.join(".")));
    columns.push("comment".to_string());

    let table_rows = rows
        .iter()
        .map(|row| {
            let mut cells = Vec::with_capacity(columns.len());
            cells.push(Value::String(row.composite_id()));
            cells.extend(param_keys.iter().map(|key_path| lookup(row.params(), key_path)));
            cells.extend(metric_keys.iter().map(|key_path| lookup(row.metrics(), key_path)));
            cells.push(Value::Null);
            cells
        })
        .collect();

    Ok(Table {
        columns,
        rows: table_rows,
    })
}

/// Flatten a nested map into dot-path leaves, depth-first, in map
/// iteration order.
fn flatten(data: &Map) -> Vec<(Vec<String>, Value)> {
    let mut out = Vec::new();
    let mut scope = Vec::new();
    flatten_into(data, &mut scope, &mut out);
    out
}

fn flatten_into(data: &Map, scope: &mut Vec<String>, out: &mut Vec<(Vec<String>, Value)>) {
    for (key, value) in data {
        scope.push(key.clone());
        match value {
            Value::Object(nested) => flatten_into(nested, scope, out),
            leaf => out.push((scope.clone(), leaf.clone())),
        }
        scope.pop();
    }
}

/// Resolve a key path against a nested map; any miss yields null.
fn lookup(data: &Map, key_path: &[String]) -> Value {
    let Some((first, rest)) = key_path.split_first() else {
        return Value::Null;
    };
    let mut current = match data.get(first) {
        Some(value) => value,
        None => return Value::Null,
    };
    for key in rest {
        current = match current.as_object().and_then(|map| map.get(key)) {
            Some(value) => value,
            None => return Value::Null,
        };
    }
    current.clone()
}
