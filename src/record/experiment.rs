//! Experiment records - committed log entries and uncommitted drafts

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Note;

/// An experiment: a titled collection of runs, notes and conclusions.
///
/// A draft experiment has no id until the repository assigns one on
/// first save. `run_ids` stays `None` until commit records the final
/// run list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Experiment {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    id: Option<String>,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    conclusion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    run_ids: Option<Vec<String>>,
    #[serde(default)]
    notes: Vec<Note>,
    created_at: DateTime<Utc>,
}

impl Experiment {
    /// Create a draft experiment with the given title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            purpose: None,
            conclusion: None,
            run_ids: None,
            notes: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Create a builder for constructing an experiment with optional fields.
    #[must_use]
    pub fn builder(title: impl Into<String>) -> ExperimentBuilder {
        ExperimentBuilder::new(title)
    }

    /// Get the experiment id, if the repository has assigned one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Get the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Get the purpose, if set.
    #[must_use]
    pub fn purpose(&self) -> Option<&str> {
        self.purpose.as_deref()
    }

    /// Get the conclusion, if set.
    #[must_use]
    pub fn conclusion(&self) -> Option<&str> {
        self.conclusion.as_deref()
    }

    /// Get the committed run id list, if recorded.
    #[must_use]
    pub fn run_ids(&self) -> Option<&[String]> {
        self.run_ids.as_deref()
    }

    /// Get the attached notes.
    #[must_use]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Append a note.
    pub fn add_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    /// Insert a note at the front of the note list.
    pub fn prepend_note(&mut self, note: Note) {
        self.notes.insert(0, note);
    }

    /// True when a note of tabular kind is already attached.
    #[must_use]
    pub fn has_table_note(&self) -> bool {
        self.notes.iter().any(|note| matches!(note, Note::Table(_)))
    }

    /// Set the conclusion.
    pub fn set_conclusion(&mut self, conclusion: impl Into<String>) {
        self.conclusion = Some(conclusion.into());
    }

    /// Record the committed run id list.
    pub fn set_run_ids(&mut self, run_ids: Vec<String>) {
        self.run_ids = Some(run_ids);
    }

    pub(crate) fn assign_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "# {}", self.title)?;
        if let Some(purpose) = &self.purpose {
            write!(f, "\n\nPurpose: {purpose}")?;
        }
        if let Some(conclusion) = &self.conclusion {
            write!(f, "\n\nConclusion: {conclusion}")?;
        }
        for note in &self.notes {
            write!(f, "\n\n{note}")?;
        }
        Ok(())
    }
}

/// Builder for [`Experiment`].
#[derive(Debug)]
pub struct ExperimentBuilder {
    title: String,
    purpose: Option<String>,
    conclusion: Option<String>,
    notes: Vec<Note>,
}

impl ExperimentBuilder {
    /// Create a new builder with the experiment title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            purpose: None,
            conclusion: None,
            notes: Vec::new(),
        }
    }

    /// Set the purpose.
    #[must_use]
    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    /// Set the conclusion.
    #[must_use]
    pub fn conclusion(mut self, conclusion: impl Into<String>) -> Self {
        self.conclusion = Some(conclusion.into());
        self
    }

    /// Attach a note.
    #[must_use]
    pub fn note(mut self, note: Note) -> Self {
        self.notes.push(note);
        self
    }

    /// Build the [`Experiment`].
    #[must_use]
    pub fn build(self) -> Experiment {
        Experiment {
            id: None,
            title: self.title,
            purpose: self.purpose,
            conclusion: self.conclusion,
            run_ids: None,
            notes: self.notes,
            created_at: Utc::now(),
        }
    }
}
