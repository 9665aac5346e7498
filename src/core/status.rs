//! Result set
//!
//! Insertion-ordered mapping from probe name to outcome. Each probe writes
//! its entry exactly once per invocation; the set becomes read-only once the
//! runner reaches its finishing phase.

use crate::core::outcome::{Outcome, Severity};
use indexmap::IndexMap;

/// The full collection of outcomes for one invocation.
#[derive(Debug, Default)]
pub struct Status {
    items: IndexMap<String, Outcome>,
}

impl Status {
    /// Create an empty result set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for a probe.
    pub fn set(&mut self, name: &str, outcome: Outcome) {
        self.items.insert(name.to_string(), outcome);
    }

    /// Outcome recorded for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Outcome> {
        self.items.get(name)
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Outcome)> {
        self.items.iter().map(|(name, outcome)| (name.as_str(), outcome))
    }

    /// All entries matching the given severity, as name → rendered message.
    pub fn by_severity(&self, severity: Severity) -> IndexMap<String, String> {
        self.items
            .iter()
            .filter(|(_, outcome)| outcome.severity() == severity)
            .map(|(name, outcome)| (name.clone(), outcome.message()))
            .collect()
    }

    /// Render the result set as a text table, one entry per line.
    pub fn text_table(&self, separator: &str) -> String {
        let lines: Vec<String> = self
            .items
            .iter()
            .map(|(name, outcome)| {
                format!("{:<20} {:<10} {}", name, outcome.severity().as_str(), outcome.message())
            })
            .collect();
        lines.join(separator)
    }
}
