//! Per-run buffer gathering params, metrics and step-series

use serde_json::Value;

use crate::record::{merge_values, Map, Run};

/// A memory to gather and organize one run's data before it is
/// persisted.
///
/// Params, metrics and info accumulate by deep merge, so a training
/// script can contribute nested configuration piecemeal. Step-series
/// rows upsert by step value: a second write for the same step updates
/// the existing row instead of appending.
#[derive(Debug, Clone)]
pub struct Memory {
    run_id: String,
    params: Map,
    metrics: Map,
    step_metrics: Option<Vec<Map>>,
    info: Map,
}

impl Memory {
    /// Create an empty memory for the given run id.
    #[must_use]
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            params: Map::new(),
            metrics: Map::new(),
            step_metrics: None,
            info: Map::new(),
        }
    }

    /// Get the run id.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Deep-merge params into the buffer.
    pub fn set_params(&mut self, data: Map) {
        self.params = merged(std::mem::take(&mut self.params), data);
    }

    /// Deep-merge whole-run metrics into the buffer.
    pub fn set_metrics(&mut self, data: Map) {
        self.metrics = merged(std::mem::take(&mut self.metrics), data);
    }

    /// Upsert one step's measurements into the step-series.
    ///
    /// The row whose `step_key` value equals `step` is updated;
    /// otherwise a new row `{step_key: step, ..data}` appends in call
    /// order.
    pub fn set_step_metrics(&mut self, step_key: &str, step: i64, data: Map) {
        let step_value = Value::from(step);
        let series = self.step_metrics.get_or_insert_with(Vec::new);

        if let Some(row) = series
            .iter_mut()
            .find(|row| row.get(step_key) == Some(&step_value))
        {
            for (key, value) in data {
                row.insert(key, value);
            }
            return;
        }

        let mut row = Map::new();
        row.insert(step_key.to_string(), step_value);
        for (key, value) in data {
            row.insert(key, value);
        }
        series.push(row);
    }

    /// Deep-merge free-form metadata into the buffer.
    pub fn set_info(&mut self, data: Map) {
        self.info = merged(std::mem::take(&mut self.info), data);
    }

    /// Snapshot the buffer as a [`Run`].
    #[must_use]
    pub fn to_run(&self) -> Run {
        let mut builder = Run::builder(self.run_id.clone())
            .params(self.params.clone())
            .metrics(self.metrics.clone());
        if let Some(series) = &self.step_metrics {
            builder = builder.step_metrics(series.clone());
        }
        if !self.info.is_empty() {
            builder = builder.info(self.info.clone());
        }
        builder.build()
    }
}

fn merged(mut base: Map, overlay: Map) -> Map {
    for (key, value) in overlay {
        match base.get_mut(&key) {
            Some(existing) => {
                let merged = merge_values(existing.take(), value);
                *existing = merged;
            }
            None => {
                base.insert(key, value);
            }
        }
    }
    base
}
