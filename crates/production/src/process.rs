use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use shopfloor_core::DomainError;

/// A stage of the fixed manufacturing sequence.
///
/// Variant order is workflow order, so `Ord` sorts steps the way the floor
/// runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessStep {
    /// Cutting.
    Potong,
    /// Punching.
    Plong,
    Press,
    /// Welding.
    Las,
    Phosphating,
    /// Painting.
    Cat,
    Packing,
}

impl ProcessStep {
    pub const ALL: [ProcessStep; 7] = [
        ProcessStep::Potong,
        ProcessStep::Plong,
        ProcessStep::Press,
        ProcessStep::Las,
        ProcessStep::Phosphating,
        ProcessStep::Cat,
        ProcessStep::Packing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessStep::Potong => "POTONG",
            ProcessStep::Plong => "PLONG",
            ProcessStep::Press => "PRESS",
            ProcessStep::Las => "LAS",
            ProcessStep::Phosphating => "PHOSPHATING",
            ProcessStep::Cat => "CAT",
            ProcessStep::Packing => "PACKING",
        }
    }
}

impl fmt::Display for ProcessStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessStep {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProcessStep::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown process step '{s}'")))
    }
}

/// Parse a stored process list, dropping anything that is not a known step.
///
/// A value that is not a JSON array is treated as an empty list.
pub fn parse_stored_processes(raw: &str) -> Vec<ProcessStep> {
    let items = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items,
        Ok(other) => {
            tracing::warn!(stored = %other, "stored processes is not an array, treating as empty");
            return Vec::new();
        }
        Err(err) => {
            tracing::warn!(error = %err, "stored processes is not valid JSON, treating as empty");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| match item.as_str().map(str::parse::<ProcessStep>) {
            Some(Ok(step)) => Some(step),
            _ => {
                tracing::warn!(stored = %item, "dropping unrecognized stored process step");
                None
            }
        })
        .collect()
}
