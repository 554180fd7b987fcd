//! asciitab-core: Core library for `(key , value)` text tables
//!
//! This library provides functionality to:
//! - Parse and render the one-row-per-line `(key , value)` text format
//! - Hold a table as rows of key/value pairs
//! - Search, edit, insert, sort and regenerate table content
//! - Persist every change through a pluggable storage backend
//! - Keep a timestamped history of the changes made in a session

pub mod error;
pub mod generate;
pub mod history;
pub mod input;
pub mod serializer;
pub mod service;
pub mod storage;
pub mod table;

pub use error::{Error, Result};
pub use history::{Action, History, HistoryEntry};
pub use input::{parse_cell_index, parse_dimensions, parse_number};
pub use serializer::{
    check_key, check_value, parse, parse_str, render, render_string, EmptyRows,
};
pub use service::{
    count_occurrences, CellEdit, EditField, EditOutcome, SearchHit, SearchReport, TableService,
};
pub use storage::{ensure_extension, FileStorage, MemoryStorage, Storage, DEFAULT_DIR};
pub use table::{Pair, Row, SortOrder, Table};
