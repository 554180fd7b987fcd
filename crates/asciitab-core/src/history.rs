//! History tracking for table mutations
//!
//! Records every change applied during a session with a timestamp.

use crate::error::Result;
use crate::table::{Pair, SortOrder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// A change applied to the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Table replaced by the contents of its file
    Load { rows: usize },
    /// Fresh random table generated
    Create { rows: usize, cols: usize },
    /// A single cell changed
    Edit {
        row: usize,
        col: usize,
        old: Pair,
        new: Pair,
    },
    /// Random row inserted at `index`
    AddRow { index: usize, cells: usize },
    /// Row sorted (`row` is 0-based)
    Sort { row: usize, order: SortOrder },
    /// Table regenerated with new dimensions
    Reset { rows: usize, cols: usize },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Load { rows } => write!(f, "loaded {} row(s)", rows),
            Action::Create { rows, cols } => write!(f, "created {}x{} table", rows, cols),
            Action::Edit { row, col, old, new } => {
                write!(f, "edited [{},{}] {} -> {}", row, col, old, new)
            }
            Action::AddRow { index, cells } => {
                write!(f, "added row at {} with {} cell(s)", index, cells)
            }
            Action::Sort { row, order } => write!(f, "sorted row {} {}", row + 1, order),
            Action::Reset { rows, cols } => write!(f, "reset to {}x{} table", rows, cols),
        }
    }
}

/// A record of a change that was applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the change was applied
    pub timestamp: DateTime<Utc>,
    pub action: Action,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.timestamp.format("%Y-%m-%d %H:%M:%S"), self.action)
    }
}

/// Changes applied during a session, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    /// Create a new empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an action with the current time
    pub fn record(&mut self, action: Action) {
        self.entries.push(HistoryEntry {
            timestamp: Utc::now(),
            action,
        });
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Save history to a file as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
