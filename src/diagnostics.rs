//! Structured diagnostic events and the sinks that receive them.
//!
//! The engine never owns log storage; callers pass a [`DiagnosticSink`] in.

use crate::category::Category;
use crate::error::{ReportError, Result};
use crate::types::{QualityCounts, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum DataQualityIssue {
    InvalidNumber { role: Role, value: String },
    NegativeQuantity { value: f64 },
    NegativeCost { value: f64 },
    InvalidDate { value: String },
    MissingName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    DataQuality {
        /// 1-based data row, header excluded.
        row: usize,
        #[serde(flatten)]
        issue: DataQualityIssue,
    },
    UncategorizedBatch {
        count: usize,
        products: Vec<String>,
    },
    UnexpectedFailure {
        message: String,
    },
    Misclassification {
        product: String,
        assigned: Category,
        expected: Category,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::DataQuality { .. } => "data_quality",
            EventKind::UncategorizedBatch { .. } => "uncategorized_batch",
            EventKind::UnexpectedFailure { .. } => "unexpected_failure",
            EventKind::Misclassification { .. } => "misclassification",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            EventKind::DataQuality { row, issue } => match issue {
                DataQualityIssue::InvalidNumber { role, value } => {
                    format!("row {row}: {role} '{value}' is not a number, using 0")
                }
                DataQualityIssue::NegativeQuantity { value } => {
                    format!("row {row}: negative quantity {value} clamped to 0")
                }
                DataQualityIssue::NegativeCost { value } => {
                    format!("row {row}: negative cost {value} clamped to 0")
                }
                DataQualityIssue::InvalidDate { value } => {
                    format!("row {row}: unparseable date '{value}'")
                }
                DataQualityIssue::MissingName => format!("row {row}: missing product name"),
            },
            EventKind::UncategorizedBatch { count, products } => {
                format!("{count} uncategorized product(s): {}", products.join(", "))
            }
            EventKind::UnexpectedFailure { message } => message.clone(),
            EventKind::Misclassification {
                product,
                assigned,
                expected,
                note,
            } => {
                let mut s = format!("'{product}' classified as {assigned}, expected {expected}");
                if let Some(n) = note {
                    s.push_str(&format!(" ({n})"));
                }
                s
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl DiagnosticEvent {
    pub fn now(kind: EventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
        }
    }
}

pub trait DiagnosticSink {
    fn record(&mut self, event: DiagnosticEvent);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&mut self, _event: DiagnosticEvent) {}
}

/// In-memory sink, kept in arrival order.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    pub events: Vec<DiagnosticEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| e.kind.name() == kind).count()
    }

    pub fn quality_counts(&self) -> QualityCounts {
        let mut counts = QualityCounts::default();
        for e in &self.events {
            if let EventKind::DataQuality { issue, .. } = &e.kind {
                match issue {
                    DataQualityIssue::InvalidNumber { .. } => counts.invalid_numbers += 1,
                    DataQualityIssue::NegativeQuantity { .. } => counts.negative_quantities += 1,
                    DataQualityIssue::NegativeCost { .. } => counts.negative_costs += 1,
                    DataQualityIssue::InvalidDate { .. } => counts.invalid_dates += 1,
                    DataQualityIssue::MissingName => counts.missing_names += 1,
                }
            }
        }
        counts
    }

    /// Forward every buffered event to another sink, in order.
    pub fn drain_into(&mut self, sink: &mut dyn DiagnosticSink) {
        for e in self.events.drain(..) {
            sink.record(e);
        }
    }
}

impl DiagnosticSink for EventLog {
    fn record(&mut self, event: DiagnosticEvent) {
        self.events.push(event);
    }
}

/// Append-only JSON Lines file. Write failures are logged, never fatal.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    file: File,
}

impl JsonLinesSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| ReportError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(Self { path, file })
    }
}

impl DiagnosticSink for JsonLinesSink {
    fn record(&mut self, event: DiagnosticEvent) {
        let line = match serde_json::to_string(&event) {
            Ok(l) => l,
            Err(e) => {
                warn!(error = %e, "could not serialize diagnostic event");
                return;
            }
        };
        if let Err(e) = writeln!(self.file, "{}", line) {
            warn!(path = %self.path.display(), error = %e, "could not append diagnostic event");
        }
    }
}

/// Sends each event to two sinks.
pub struct Tee<'a> {
    first: &'a mut dyn DiagnosticSink,
    second: &'a mut dyn DiagnosticSink,
}

impl<'a> Tee<'a> {
    pub fn new(first: &'a mut dyn DiagnosticSink, second: &'a mut dyn DiagnosticSink) -> Self {
        Self { first, second }
    }
}

impl DiagnosticSink for Tee<'_> {
    fn record(&mut self, event: DiagnosticEvent) {
        self.first.record(event.clone());
        self.second.record(event);
    }
}

/// Read a JSON Lines event log. Malformed lines are skipped with a warning.
pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<DiagnosticEvent>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut events = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<DiagnosticEvent>(&line) {
            Ok(e) => events.push(e),
            Err(e) => warn!(line = idx + 1, error = %e, "skipping malformed event"),
        }
    }
    Ok(events)
}
