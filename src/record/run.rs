//! Run records and derived run groups

use serde::{Deserialize, Serialize};

use super::Map;

/// A single recorded execution with parameters, metrics and an optional
/// ordered step-series.
///
/// Runs are immutable once persisted; the run store owns them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Run {
    id: String,
    params: Map,
    metrics: Map,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    step_metrics: Option<Vec<Map>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    info: Option<Map>,
}

impl Run {
    /// Create a run with params and metrics only.
    #[must_use]
    pub fn new(id: impl Into<String>, params: Map, metrics: Map) -> Self {
        Self {
            id: id.into(),
            params,
            metrics,
            step_metrics: None,
            info: None,
        }
    }

    /// Create a builder for constructing a run with optional fields.
    #[must_use]
    pub fn builder(id: impl Into<String>) -> RunBuilder {
        RunBuilder::new(id)
    }

    /// Get the run id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the parameter map.
    #[must_use]
    pub const fn params(&self) -> &Map {
        &self.params
    }

    /// Get the metric map.
    #[must_use]
    pub const fn metrics(&self) -> &Map {
        &self.metrics
    }

    /// Get the step-series, if the run recorded one.
    #[must_use]
    pub const fn step_metrics(&self) -> Option<&Vec<Map>> {
        self.step_metrics.as_ref()
    }

    /// Get the free-form metadata map, if any.
    #[must_use]
    pub const fn info(&self) -> Option<&Map> {
        self.info.as_ref()
    }
}

/// Builder for [`Run`].
#[derive(Debug)]
pub struct RunBuilder {
    id: String,
    params: Map,
    metrics: Map,
    step_metrics: Option<Vec<Map>>,
    info: Option<Map>,
}

impl RunBuilder {
    /// Create a new builder with the run id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: Map::new(),
            metrics: Map::new(),
            step_metrics: None,
            info: None,
        }
    }

    /// Set the parameter map.
    #[must_use]
    pub fn params(mut self, params: Map) -> Self {
        self.params = params;
        self
    }

    /// Set the metric map.
    #[must_use]
    pub fn metrics(mut self, metrics: Map) -> Self {
        self.metrics = metrics;
        self
    }

    /// Set the ordered step-series.
    #[must_use]
    pub fn step_metrics(mut self, step_metrics: Vec<Map>) -> Self {
        self.step_metrics = Some(step_metrics);
        self
    }

    /// Set the free-form metadata map.
    #[must_use]
    pub fn info(mut self, info: Map) -> Self {
        self.info = Some(info);
        self
    }

    /// Build the [`Run`].
    #[must_use]
    pub fn build(self) -> Run {
        Run {
            id: self.id,
            params: self.params,
            metrics: self.metrics,
            step_metrics: self.step_metrics,
            info: self.info,
        }
    }
}

/// A derived group of runs sharing identical parameters, with metrics
/// reduced by averaging. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RunGroup {
    ids: Vec<String>,
    params: Map,
    metrics: Map,
    step_metrics: Option<Vec<Map>>,
}

impl RunGroup {
    pub(crate) const fn new(
        ids: Vec<String>,
        params: Map,
        metrics: Map,
        step_metrics: Option<Vec<Map>>,
    ) -> Self {
        Self {
            ids,
            params,
            metrics,
            step_metrics,
        }
    }

    /// Member run ids in first-seen order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// The composite identifier: member ids joined with `,`.
    #[must_use]
    pub fn composite_id(&self) -> String {
        self.ids.join(",")
    }

    /// Representative parameters (deep copy of the first member's).
    #[must_use]
    pub const fn params(&self) -> &Map {
        &self.params
    }

    /// Metrics averaged over the values present across members.
    #[must_use]
    pub const fn metrics(&self) -> &Map {
        &self.metrics
    }

    /// Averaged step-series, if any member recorded one.
    #[must_use]
    pub const fn step_metrics(&self) -> Option<&Vec<Map>> {
        self.step_metrics.as_ref()
    }
}
