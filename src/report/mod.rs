//! Outcome records of a run and their aggregation into a [Report].

use std::fmt;

use chrono::{DateTime, Local};
use derive_more::Display;

pub mod humanize;

use crate::target::TargetClass;

/// Result of a single backup.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    #[display("OK")]
    Ok,
    #[display("INFO")]
    Info,
    #[display("WARNING")]
    Warning,
    #[display("ERROR")]
    Error,
}

/// Normalized result of the backup of one target, or one part of it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Outcome {
    pub status: Status,
    pub class: TargetClass,
    pub message: String,
    pub target_name: String,
    pub size_bytes: Option<u64>,
    pub duration_nanos: Option<u64>,
}

impl Outcome {
    pub fn new(status: Status, class: TargetClass, target_name: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            class,
            message: message.into(),
            target_name: target_name.to_owned(),
            size_bytes: None,
            duration_nanos: None,
        }
    }

    pub fn with_size(mut self, size_bytes: Option<u64>) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    pub fn with_duration(mut self, duration_nanos: u64) -> Self {
        self.duration_nanos = Some(duration_nanos);
        self
    }

    /// Size as shown in reports, empty if unknown.
    pub fn humanized_size(&self) -> String {
        self.size_bytes.map(humanize::bytes).unwrap_or_default()
    }

    /// Duration as shown in reports, empty if unknown.
    pub fn humanized_duration(&self) -> String {
        self.duration_nanos
            .map(humanize::duration)
            .unwrap_or_default()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} \"{}\": {}",
            self.status, self.class, self.target_name, self.message
        )?;

        let details: Vec<_> = [self.humanized_size(), self.humanized_duration()]
            .into_iter()
            .filter(|d| !d.is_empty())
            .collect();
        if !details.is_empty() {
            write!(f, " ({})", details.join(", "))?;
        }

        Ok(())
    }
}

/// Append-only collection of the [Outcome]s of a run.
#[derive(Debug, Clone, Default)]
pub struct Report {
    outcomes: Vec<Outcome>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    /// All outcomes in the order they were added.
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn by_class(&self, class: TargetClass) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(move |o| o.class == class)
    }

    pub fn has_errors(&self) -> bool {
        self.outcomes.iter().any(|o| o.status == Status::Error)
    }

    /// Pre-formatted view of the report, grouped by class.
    ///
    /// Classes without outcomes are left out.
    pub fn summary(&self, generated_at: DateTime<Local>) -> Summary {
        let sections = TargetClass::ALL
            .into_iter()
            .map(|class| Section {
                class,
                tasks: self.by_class(class).map(Task::from).collect(),
            })
            .filter(|section| !section.tasks.is_empty())
            .collect();

        Summary {
            generated_at: generated_at.to_rfc3339(),
            error_occurred: self.has_errors(),
            sections,
        }
    }
}

impl Extend<Outcome> for Report {
    fn extend<I: IntoIterator<Item = Outcome>>(&mut self, iter: I) {
        self.outcomes.extend(iter);
    }
}

/// What a report renderer gets to see.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Summary {
    pub generated_at: String,
    pub error_occurred: bool,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Section {
    pub class: TargetClass,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Task {
    pub status: Status,
    pub name: String,
    pub message: String,
    pub size: String,
    pub duration: String,
}

impl From<&Outcome> for Task {
    fn from(outcome: &Outcome) -> Self {
        Self {
            status: outcome.status,
            name: outcome.target_name.clone(),
            message: outcome.message.clone(),
            size: outcome.humanized_size(),
            duration: outcome.humanized_duration(),
        }
    }
}
