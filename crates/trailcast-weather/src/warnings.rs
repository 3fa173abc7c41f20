//! Per-location weather warning queue.
//!
//! Warnings are retrieved most severe first; among equal severities the one
//! added earliest wins. Acknowledging removes exactly the warning that
//! [`WarningsContainer::next_warning`] currently reports.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

/// Warning urgency. Higher values are more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Severity(pub u8);

impl Severity {
    pub const ADVISORY: Severity = Severity(1);
    pub const WATCH: Severity = Severity(4);
    pub const WARNING: Severity = Severity(7);
    pub const EMERGENCY: Severity = Severity(10);

    /// Name of the highest named level at or below this severity.
    pub fn label(&self) -> &'static str {
        match self.0 {
            0 => "None",
            1..=3 => "Advisory",
            4..=6 => "Watch",
            7..=9 => "Warning",
            _ => "Emergency",
        }
    }
}

impl From<u8> for Severity {
    fn from(value: u8) -> Self {
        Severity(value)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.0)
    }
}

/// A single weather advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    message: String,
    severity: Severity,
    sequence: u64,
}

impl Warning {
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Insertion order within the owning container.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

// Greater means "retrieved sooner".
impl Ord for Warning {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity
            .cmp(&other.severity)
            .then_with(|| other.sequence.cmp(&self.sequence))
            .then_with(|| self.message.cmp(&other.message))
    }
}

impl PartialOrd for Warning {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Severity-ordered queue of pending warnings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "StoredWarnings", into = "StoredWarnings")]
pub struct WarningsContainer {
    pending: BinaryHeap<Warning>,
    next_sequence: u64,
}

impl WarningsContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a warning. Never fails.
    pub fn add_warning(&mut self, message: impl Into<String>, severity: Severity) {
        let warning = Warning {
            message: message.into(),
            severity,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.pending.push(warning);
    }

    /// The most urgent pending warning, if any.
    pub fn next_warning(&self) -> Option<&Warning> {
        self.pending.peek()
    }

    /// Remove and return the warning reported by [`Self::next_warning`].
    ///
    /// Returns `None` and leaves the queue untouched when it is empty.
    pub fn acknowledge_warning(&mut self) -> Option<Warning> {
        self.pending.pop()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending warnings in retrieval order.
    pub fn iter_ordered(&self) -> impl Iterator<Item = &Warning> {
        let mut all: Vec<&Warning> = self.pending.iter().collect();
        all.sort_by(|a, b| b.cmp(a));
        all.into_iter()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// On-disk form: pending warnings in retrieval order.
#[derive(Serialize, Deserialize)]
struct StoredWarnings {
    #[serde(default)]
    pending: Vec<Warning>,
    #[serde(default)]
    next_sequence: u64,
}

impl From<StoredWarnings> for WarningsContainer {
    fn from(stored: StoredWarnings) -> Self {
        // A hand-edited file may carry a stale counter; never reuse a sequence.
        let floor = stored
            .pending
            .iter()
            .map(|w| w.sequence + 1)
            .max()
            .unwrap_or(0);
        Self {
            next_sequence: stored.next_sequence.max(floor),
            pending: stored.pending.into_iter().collect(),
        }
    }
}

impl From<WarningsContainer> for StoredWarnings {
    fn from(container: WarningsContainer) -> Self {
        Self {
            next_sequence: container.next_sequence,
            pending: container.pending.into_sorted_vec().into_iter().rev().collect(),
        }
    }
}
