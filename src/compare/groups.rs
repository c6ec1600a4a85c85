//! Grouping runs by identical parameters and averaging their metrics

use std::cmp::Ordering;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::record::{Map, Run, RunGroup};

/// Step-key candidates, in preference order. The first one present in
/// every contributing run's first step record wins.
const STEP_KEY_CANDIDATES: [&str; 7] = [
    "epoch",
    "epochs",
    "step",
    "steps",
    "iteration",
    "iterations",
    "iter",
];

/// Group runs by deep structural equality of their parameter maps.
///
/// Groups and their members keep first-seen order. Each group's metrics
/// are averaged over the values actually present per key; step-series
/// are merged by step value and averaged the same way.
///
/// # Errors
///
/// [`Error::NoCommonStepKey`] when contributing step-series share no
/// step key.
pub fn make_run_groups(runs: &[Run]) -> Result<Vec<RunGroup>> {
    let mut groups: Vec<Vec<&Run>> = Vec::new();
    for run in runs {
        match groups
            .iter_mut()
            .find(|members| members[0].params() == run.params())
        {
            Some(members) => members.push(run),
            None => groups.push(vec![run]),
        }
    }

    let mut out = Vec::with_capacity(groups.len());
    for members in groups {
        let series: Vec<&[Map]> = members
            .iter()
            .filter_map(|run| run.step_metrics().map(Vec::as_slice))
            .collect();
        let step_metrics = if series.is_empty() {
            None
        } else {
            Some(averaged_step_metrics(&series)?)
        };

        out.push(RunGroup::new(
            members.iter().map(|run| run.id().to_string()).collect(),
            members[0].params().clone(),
            averaged_metrics(&members),
            step_metrics,
        ));
    }
    Ok(out)
}

/// Mean per metric key over the values present across members, key
/// order first-seen.
fn averaged_metrics(members: &[&Run]) -> Map {
    let mut keys: Vec<&String> = Vec::new();
    for run in members {
        for key in run.metrics().keys() {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }

    let mut averaged = Map::new();
    for key in keys {
        let present: Vec<&Value> = members
            .iter()
            .filter_map(|run| run.metrics().get(key))
            .collect();
        averaged.insert(key.clone(), mean_values(&present));
    }
    averaged
}

/// Reduce the values present for one key to a single value.
///
/// A single value passes through unchanged. Several numeric values
/// reduce to their arithmetic mean; several nested maps reduce per key
/// recursively over present values; anything else passes the first
/// value through.
fn mean_values(values: &[&Value]) -> Value {
    let [first, rest @ ..] = values else {
        return Value::Null;
    };
    if rest.is_empty() {
        return (*first).clone();
    }

    let maps: Vec<&Map> = values.iter().filter_map(|value| value.as_object()).collect();
    if maps.len() == values.len() {
        let mut keys: Vec<&String> = Vec::new();
        for map in &maps {
            for key in map.keys() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        let mut averaged = Map::new();
        for key in keys {
            let present: Vec<&Value> = maps.iter().filter_map(|map| map.get(key)).collect();
            averaged.insert(key.clone(), mean_values(&present));
        }
        return Value::Object(averaged);
    }

    values
        .iter()
        .map(|value| value.as_f64())
        .collect::<Option<Vec<f64>>>()
        .map_or_else(
            || (*first).clone(),
            |numbers| Value::from(numbers.iter().sum::<f64>() / numbers.len() as f64),
        )
}

/// Pick the step key shared by every contributing series.
fn determine_step_key(series: &[&[Map]]) -> Result<&'static str> {
    for candidate in STEP_KEY_CANDIDATES {
        let shared = series.iter().all(|step_metrics| {
            step_metrics
                .first()
                .is_some_and(|record| record.contains_key(candidate))
        });
        if shared {
            return Ok(candidate);
        }
    }
    Err(Error::NoCommonStepKey)
}

fn compare_steps(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Merge step records across contributors by step value and average
/// each metric key over the records present for that value. Output is
/// ascending by step value, the step key leading each record.
fn averaged_step_metrics(series: &[&[Map]]) -> Result<Vec<Map>> {
    let step_key = determine_step_key(series)?;

    let mut steps: Vec<(Value, Vec<&Map>)> = Vec::new();
    for step_metrics in series {
        for record in *step_metrics {
            let Some(step) = record.get(step_key) else {
                continue;
            };
            match steps.iter_mut().find(|(value, _)| value == step) {
                Some((_, records)) => records.push(record),
                None => steps.push((step.clone(), vec![record])),
            }
        }
    }
    steps.sort_by(|(a, _), (b, _)| compare_steps(a, b));

    let mut merged_series = Vec::with_capacity(steps.len());
    for (step, records) in steps {
        let mut keys: Vec<&String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if *key != step_key && !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }

        let mut merged = Map::new();
        merged.insert(step_key.to_string(), step);
        for key in keys {
            let present: Vec<&Value> = records.iter().filter_map(|record| record.get(key)).collect();
            merged.insert(key.clone(), mean_values(&present));
        }
        merged_series.push(merged);
    }
    Ok(merged_series)
}
