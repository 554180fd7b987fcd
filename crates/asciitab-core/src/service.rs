//! Table session and mutation engine
//!
//! [`TableService`] owns the table of one file together with the storage it
//! is persisted to. Every operation validates its input first and only then
//! applies the change, so a failed call leaves the table untouched. Each
//! successful mutation is written back to storage immediately.
//!
//! If that write fails the error is returned but the in-memory table keeps
//! the change; the file catches up on the next successful save.

use crate::error::{Error, Result};
use crate::generate::{random_pairs, random_table};
use crate::history::{Action, History};
use crate::serializer::{self, EmptyRows};
use crate::storage::Storage;
use crate::table::{Pair, Row, SortOrder, Table};
use rand::rngs::ThreadRng;
use rand::Rng;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Count occurrences of `query` in `text`, overlapping matches included.
///
/// `count_occurrences("aaa", "aa")` is 2. An empty query matches nothing.
pub fn count_occurrences(text: &str, query: &str) -> usize {
    if query.is_empty() {
        return 0;
    }
    text.char_indices()
        .filter(|&(i, _)| text[i..].starts_with(query))
        .count()
}

/// Matches of a search query inside one cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub row: usize,
    pub col: usize,
    pub key_count: usize,
    pub value_count: usize,
}

/// Result of [`TableService::search`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    pub query: String,
    /// Cells with at least one match, in row-major order
    pub hits: Vec<SearchHit>,
}

impl SearchReport {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Total matches across keys and values
    pub fn total(&self) -> usize {
        self.hits.iter().map(|h| h.key_count + h.value_count).sum()
    }
}

impl fmt::Display for SearchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits.is_empty() {
            return write!(f, "No occurrences found for \"{}\".", self.query);
        }

        let q = &self.query;
        for (i, hit) in self.hits.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match (hit.key_count, hit.value_count) {
                (k, 0) => write!(f, "{} <{}> occurrence/s at key", k, q)?,
                (0, v) => write!(f, "{} <{}> occurrence/s at value", v, q)?,
                (k, v) => write!(
                    f,
                    "{} <{}> occurrence/s at key and {} <{}> occurrence/s at value",
                    k, q, v, q
                )?,
            }
            write!(f, " of [{},{}]", hit.row, hit.col)?;
        }
        Ok(())
    }
}

/// Which part of a cell an edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Key,
    Value,
    Both,
}

impl EditField {
    pub fn edits_key(self) -> bool {
        matches!(self, EditField::Key | EditField::Both)
    }

    pub fn edits_value(self) -> bool {
        matches!(self, EditField::Value | EditField::Both)
    }
}

impl FromStr for EditField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "key" => Ok(EditField::Key),
            "value" => Ok(EditField::Value),
            "both" => Ok(EditField::Both),
            other => Err(Error::Validation(format!(
                "expected 'key', 'value', or 'both', got '{}'",
                other
            ))),
        }
    }
}

/// New content for a cell. An empty string keeps the old field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellEdit {
    Key(String),
    Value(String),
    Both { key: String, value: String },
}

impl CellEdit {
    /// Build an edit for `field`, ignoring the input it does not target
    pub fn new(field: EditField, key: impl Into<String>, value: impl Into<String>) -> Self {
        match field {
            EditField::Key => CellEdit::Key(key.into()),
            EditField::Value => CellEdit::Value(value.into()),
            EditField::Both => CellEdit::Both {
                key: key.into(),
                value: value.into(),
            },
        }
    }

    fn key(&self) -> Option<&str> {
        match self {
            CellEdit::Key(key) | CellEdit::Both { key, .. } => {
                (!key.is_empty()).then_some(key.as_str())
            }
            CellEdit::Value(_) => None,
        }
    }

    fn value(&self) -> Option<&str> {
        match self {
            CellEdit::Value(value) | CellEdit::Both { value, .. } => {
                (!value.is_empty()).then_some(value.as_str())
            }
            CellEdit::Key(_) => None,
        }
    }
}

/// Cell content before and after an edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub old: Pair,
    pub new: Pair,
}

/// An open table file and the operations on it
#[derive(Debug)]
pub struct TableService<S, R = ThreadRng> {
    file_name: String,
    table: Table,
    storage: S,
    rng: R,
    history: History,
    empty_rows: EmptyRows,
}

impl<S: Storage> TableService<S, ThreadRng> {
    /// Open a session on `file_name` with an empty table
    pub fn new(storage: S, file_name: impl Into<String>) -> Self {
        Self::with_rng(storage, file_name, rand::thread_rng())
    }
}

impl<S: Storage, R: Rng> TableService<S, R> {
    /// Open a session that draws random content from `rng`
    pub fn with_rng(storage: S, file_name: impl Into<String>, rng: R) -> Self {
        Self {
            file_name: file_name.into(),
            table: Table::new(),
            storage,
            rng,
            history: History::new(),
            empty_rows: EmptyRows::default(),
        }
    }

    /// Set how lines without pairs are treated by [`load`](Self::load)
    pub fn with_empty_rows(mut self, policy: EmptyRows) -> Self {
        self.empty_rows = policy;
        self
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    fn require_data(&self) -> Result<()> {
        if self.table.is_empty() {
            Err(Error::EmptyTable)
        } else {
            Ok(())
        }
    }

    fn check_dimensions(rows: usize, cols: usize) -> Result<()> {
        if rows == 0 || cols == 0 {
            return Err(Error::Validation(format!(
                "table dimensions must be greater than 0, got {}x{}",
                rows, cols
            )));
        }
        Ok(())
    }

    /// Write the table to its file
    pub fn save(&mut self) -> Result<()> {
        let lines = serializer::render(&self.table);
        if let Err(e) = self.storage.write_lines(&self.file_name, &lines) {
            warn!(file = %self.file_name, error = %e, "save failed, file is behind the table");
            return Err(e);
        }
        Ok(())
    }

    /// Replace the table with the contents of its file. Returns the row count.
    pub fn load(&mut self) -> Result<usize> {
        let lines = self.storage.read_lines(&self.file_name)?;
        self.table = serializer::parse(&lines, self.empty_rows);

        let rows = self.table.len();
        info!(file = %self.file_name, rows, "loaded table");
        self.history.record(Action::Load { rows });
        Ok(rows)
    }

    /// `count` random pairs
    pub fn generate_random_key_pair(&mut self, count: usize) -> Vec<Pair> {
        random_pairs(&mut self.rng, count)
    }

    /// Replace the table with `rows` x `cols` random pairs and save it
    pub fn create_new_table(&mut self, rows: usize, cols: usize) -> Result<()> {
        Self::check_dimensions(rows, cols)?;

        self.table = random_table(&mut self.rng, rows, cols);
        info!(file = %self.file_name, rows, cols, "created table");
        self.history.record(Action::Create { rows, cols });
        self.save()
    }

    /// Count occurrences of `query` in every key and value
    pub fn search(&self, query: &str) -> Result<SearchReport> {
        self.require_data()?;
        if query.is_empty() {
            return Err(Error::Validation(
                "enter at least one character to search for".to_string(),
            ));
        }

        let hits: Vec<SearchHit> = self
            .table
            .cells()
            .filter_map(|(row, col, pair)| {
                let key_count = count_occurrences(pair.key(), query);
                let value_count = count_occurrences(pair.value(), query);
                (key_count + value_count > 0).then_some(SearchHit {
                    row,
                    col,
                    key_count,
                    value_count,
                })
            })
            .collect();

        debug!(query, hits = hits.len(), "searched table");
        Ok(SearchReport {
            query: query.to_string(),
            hits,
        })
    }

    /// Check that `key` could be given to the cell at (`row`, `col`).
    ///
    /// The cell's own key does not count as a duplicate.
    pub fn check_key_available(&self, row: usize, col: usize, key: &str) -> Result<()> {
        let taken = self
            .table
            .cells()
            .any(|(r, c, pair)| (r, c) != (row, col) && pair.key() == key);
        if taken {
            return Err(Error::DuplicateKey(key.to_string()));
        }
        Ok(())
    }

    /// Change the key and/or value of one cell and save.
    ///
    /// New text that would not read back from the file unchanged is
    /// rejected with [`Error::Validation`].
    pub fn edit(&mut self, row: usize, col: usize, edit: CellEdit) -> Result<EditOutcome> {
        self.require_data()?;
        let old = self.table.cell(row, col)?.clone();

        let new_key = edit.key().unwrap_or(old.key()).to_string();
        let new_value = edit.value().unwrap_or(old.value()).to_string();
        if new_key != old.key() {
            serializer::check_key(&new_key)?;
            self.check_key_available(row, col, &new_key)?;
        }
        if new_value != old.value() {
            serializer::check_value(&new_value)?;
        }

        let cell = self.table.cell_mut(row, col)?;
        cell.set_key(new_key);
        cell.set_value(new_value);
        let new = cell.clone();

        info!(row, col, old = %old, new = %new, "edited cell");
        self.history.record(Action::Edit {
            row,
            col,
            old: old.clone(),
            new: new.clone(),
        });
        self.save()?;
        Ok(EditOutcome { old, new })
    }

    /// Insert a row of `cell_count` random pairs so it lands at `index`
    /// (0 = before the first row, `len()` = after the last) and save
    pub fn add_row(&mut self, cell_count: usize, index: usize) -> Result<()> {
        self.require_data()?;
        if cell_count == 0 {
            return Err(Error::Validation(
                "number of cells must be greater than 0".to_string(),
            ));
        }
        if index > self.table.len() {
            return Err(Error::row_out_of_range(index, self.table.len()));
        }

        let row = Row::from_cells(self.generate_random_key_pair(cell_count));
        self.table.insert_row(index, row)?;

        info!(index, cells = cell_count, "added row");
        self.history.record(Action::AddRow {
            index,
            cells: cell_count,
        });
        self.save()
    }

    /// Sort the row with 1-based number `row_number` and save
    pub fn sort_row(&mut self, row_number: usize, order: SortOrder) -> Result<()> {
        self.require_data()?;
        if row_number == 0 || row_number > self.table.len() {
            return Err(Error::row_out_of_range(row_number, self.table.len()));
        }

        let row = row_number - 1;
        self.table.row_mut(row)?.sort_by_concat(order);

        info!(row = row_number, %order, "sorted row");
        self.history.record(Action::Sort { row, order });
        self.save()
    }

    /// Regenerate the whole table with new dimensions and save.
    ///
    /// The session's file must already exist.
    pub fn reset_table(&mut self, rows: usize, cols: usize) -> Result<()> {
        if !self.storage.exists(&self.file_name) {
            return Err(Error::NoFile(self.file_name.clone()));
        }
        Self::check_dimensions(rows, cols)?;

        self.table = random_table(&mut self.rng, rows, cols);
        info!(file = %self.file_name, rows, cols, "reset table");
        self.history.record(Action::Reset { rows, cols });
        self.save()
    }

    /// Human-readable dump of the table
    pub fn print_table(&self) -> String {
        if self.table.is_empty() {
            return "Table is empty or not loaded.".to_string();
        }
        format!("Table Contents:\n{}", self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{MAX_CHAR, MIN_CHAR, TOKEN_LEN};
    use crate::serializer::parse;
    use crate::storage::MemoryStorage;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const FILE: &str = "t.txt";

    fn service(lines: &[&str]) -> TableService<MemoryStorage, StdRng> {
        let storage = MemoryStorage::new().with_file(FILE, lines);
        let mut service = TableService::with_rng(storage, FILE, StdRng::seed_from_u64(3));
        service.load().unwrap();
        service
    }

    fn sample() -> TableService<MemoryStorage, StdRng> {
        service(&["(k1 , v1) (k2 , v2)", "(k3 , v3)"])
    }

    fn stored_table(service: &TableService<MemoryStorage, StdRng>) -> Table {
        let lines = service.storage().read_lines(FILE).unwrap();
        parse(&lines, EmptyRows::Keep)
    }

    fn is_token(s: &str) -> bool {
        s.len() == TOKEN_LEN && s.bytes().all(|b| (MIN_CHAR..=MAX_CHAR).contains(&b))
    }

    #[test]
    fn test_count_occurrences() {
        assert_eq!(count_occurrences("aaa", "aa"), 2);
        assert_eq!(count_occurrences("abc", "x"), 0);
        assert_eq!(count_occurrences("", "a"), 0);
        assert_eq!(count_occurrences("abc", ""), 0);
        assert_eq!(count_occurrences("éé", "é"), 2);
    }

    #[test]
    fn test_create_new_table_round_trips() {
        let storage = MemoryStorage::new();
        let mut service = TableService::with_rng(storage, FILE, StdRng::seed_from_u64(11));
        service.create_new_table(2, 2).unwrap();

        let reparsed = stored_table(&service);
        assert_eq!(reparsed.len(), 2);
        for row in reparsed.rows() {
            assert_eq!(row.len(), 2);
            for pair in row.cells() {
                assert!(is_token(pair.key()), "bad key {:?}", pair.key());
                assert!(is_token(pair.value()), "bad value {:?}", pair.value());
            }
        }
        assert_eq!(&reparsed, service.table());
    }

    #[test]
    fn test_create_rejects_zero_dimensions() {
        let mut service = TableService::with_rng(MemoryStorage::new(), FILE, StdRng::seed_from_u64(0));
        assert!(matches!(service.create_new_table(0, 2), Err(Error::Validation(_))));
        assert!(!service.storage().exists(FILE));
    }

    #[test]
    fn test_load_keeps_empty_rows_by_default() {
        let service = service(&["(a , 1)", "", "(b , 2)"]);
        assert_eq!(service.table().len(), 3);

        let storage = MemoryStorage::new().with_file(FILE, &["(a , 1)", "", "(b , 2)"]);
        let mut dropping = TableService::new(storage, FILE).with_empty_rows(EmptyRows::Drop);
        assert_eq!(dropping.load().unwrap(), 2);
    }

    #[test]
    fn test_search_counts_per_cell() {
        let service = service(&["(aaa , xa) (bbb , bbb)", "(zz , aa)"]);
        let report = service.search("aa").unwrap();

        assert_eq!(
            report.hits,
            vec![
                SearchHit { row: 0, col: 0, key_count: 2, value_count: 0 },
                SearchHit { row: 1, col: 0, key_count: 0, value_count: 1 },
            ]
        );
        assert_eq!(report.total(), 3);
        assert_eq!(
            report.to_string(),
            "2 <aa> occurrence/s at key of [0,0]\n1 <aa> occurrence/s at value of [1,0]"
        );
    }

    #[test]
    fn test_search_key_and_value_message() {
        let service = service(&["(ab , ba)"]);
        let report = service.search("a").unwrap();
        assert_eq!(
            report.to_string(),
            "1 <a> occurrence/s at key and 1 <a> occurrence/s at value of [0,0]"
        );
    }

    #[test]
    fn test_search_no_matches_and_errors() {
        let service = sample();
        let report = service.search("nope").unwrap();
        assert!(report.is_empty());
        assert_eq!(report.to_string(), "No occurrences found for \"nope\".");

        assert!(matches!(service.search(""), Err(Error::Validation(_))));

        let empty = TableService::new(MemoryStorage::new(), FILE);
        assert!(matches!(empty.search("a"), Err(Error::EmptyTable)));
    }

    #[test]
    fn test_edit_value_persists() {
        let mut service = sample();
        let outcome = service.edit(1, 0, CellEdit::Value("new".to_string())).unwrap();

        assert_eq!(outcome.old, Pair::new("k3", "v3"));
        assert_eq!(outcome.new, Pair::new("k3", "new"));
        assert_eq!(service.table().cell(1, 0).unwrap(), &Pair::new("k3", "new"));
        assert_eq!(&stored_table(&service), service.table());
    }

    #[test]
    fn test_edit_rejects_duplicate_key() {
        let mut service = sample();
        let err = service
            .edit(0, 0, CellEdit::new(EditField::Both, "k3", "x"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(ref k) if k == "k3"));
        assert_eq!(service.table().cell(0, 0).unwrap(), &Pair::new("k1", "v1"));
    }

    #[test]
    fn test_edit_to_own_key_or_blank_is_accepted() {
        let mut service = sample();
        service.edit(0, 1, CellEdit::Key("k2".to_string())).unwrap();
        service.edit(0, 1, CellEdit::Key(String::new())).unwrap();
        let outcome = service
            .edit(0, 1, CellEdit::Both { key: String::new(), value: String::new() })
            .unwrap();
        assert_eq!(outcome.old, outcome.new);
        assert_eq!(service.table().cell(0, 1).unwrap(), &Pair::new("k2", "v2"));
    }

    #[test]
    fn test_edit_rejects_unreadable_value() {
        let mut service = sample();
        let err = service
            .edit(0, 0, CellEdit::Value("x) (y , z".to_string()))
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(service.table().cell(0, 0).unwrap(), &Pair::new("k1", "v1"));
        assert_eq!(service.table().rows()[0].len(), 2);
        assert_eq!(&stored_table(&service), service.table());
    }

    #[test]
    fn test_edit_rejects_unreadable_key() {
        let mut service = sample();
        let err = service
            .edit(0, 0, CellEdit::new(EditField::Both, "a , b", "v"))
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(service.table().cell(0, 0).unwrap(), &Pair::new("k1", "v1"));
        assert_eq!(service.history().len(), 1);
    }

    #[test]
    fn test_edit_with_parentheses_reads_back() {
        let mut service = sample();
        service
            .edit(0, 0, CellEdit::new(EditField::Both, "(a,b", "x) y)"))
            .unwrap();

        assert_eq!(service.table().cell(0, 0).unwrap(), &Pair::new("(a,b", "x) y)"));
        assert_eq!(&stored_table(&service), service.table());
    }

    #[test]
    fn test_edit_out_of_range() {
        let mut service = sample();
        assert!(matches!(
            service.edit(2, 0, CellEdit::Value("x".to_string())),
            Err(Error::IndexOutOfRange { what: "row", .. })
        ));
        assert!(matches!(
            service.edit(1, 1, CellEdit::Value("x".to_string())),
            Err(Error::IndexOutOfRange { what: "column", .. })
        ));
    }

    #[test]
    fn test_edit_field_parse() {
        assert_eq!("KEY".parse::<EditField>().unwrap(), EditField::Key);
        assert_eq!(" both".parse::<EditField>().unwrap(), EditField::Both);
        assert!("cell".parse::<EditField>().is_err());
        assert!(EditField::Both.edits_key() && EditField::Both.edits_value());
        assert!(!EditField::Value.edits_key());
    }

    #[test]
    fn test_add_row_positions() {
        let mut service = sample();

        service.add_row(3, 0).unwrap();
        assert_eq!(service.table().len(), 3);
        assert_eq!(service.table().rows()[0].len(), 3);
        assert_eq!(service.table().rows()[1].cells()[0].key(), "k1");

        service.add_row(1, 3).unwrap();
        assert_eq!(service.table().len(), 4);
        assert_eq!(service.table().rows()[3].len(), 1);
        assert_eq!(service.table().rows()[2].cells()[0].key(), "k3");

        let err = service.add_row(1, 5).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 5, len: 4, .. }));
        assert!(matches!(service.add_row(0, 0), Err(Error::Validation(_))));
        assert_eq!(service.table().len(), 4);
        assert_eq!(stored_table(&service).len(), 4);
    }

    #[test]
    fn test_sort_row_one_based() {
        let mut service = service(&["(b , 1) (a , 2) (a , 1)", "(z , 0)"]);

        service.sort_row(1, SortOrder::Asc).unwrap();
        assert_eq!(
            service.table().rows()[0].to_string(),
            "(a , 1) (a , 2) (b , 1)"
        );

        service.sort_row(1, SortOrder::Desc).unwrap();
        assert_eq!(
            service.table().rows()[0].to_string(),
            "(b , 1) (a , 2) (a , 1)"
        );
        assert_eq!(&stored_table(&service), service.table());

        assert!(matches!(
            service.sort_row(0, SortOrder::Asc),
            Err(Error::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            service.sort_row(3, SortOrder::Asc),
            Err(Error::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_reset_table() {
        let mut service = sample();
        service.reset_table(3, 1).unwrap();

        assert_eq!(service.table().len(), 3);
        assert!(service.table().rows().iter().all(|r| r.len() == 1));
        assert_eq!(&stored_table(&service), service.table());
    }

    #[test]
    fn test_reset_requires_file() {
        let mut service = TableService::with_rng(MemoryStorage::new(), FILE, StdRng::seed_from_u64(0));
        assert!(matches!(service.reset_table(1, 1), Err(Error::NoFile(_))));
    }

    #[test]
    fn test_empty_table_operations_are_rejected() {
        let storage = MemoryStorage::new().with_file(FILE, &[]);
        let mut service = TableService::with_rng(storage, FILE, StdRng::seed_from_u64(0));
        service.load().unwrap();

        assert!(matches!(service.add_row(1, 0), Err(Error::EmptyTable)));
        assert!(matches!(service.sort_row(1, SortOrder::Asc), Err(Error::EmptyTable)));
        assert!(matches!(
            service.edit(0, 0, CellEdit::Value("x".to_string())),
            Err(Error::EmptyTable)
        ));
        assert_eq!(service.print_table(), "Table is empty or not loaded.");
    }

    #[test]
    fn test_failed_save_keeps_mutation() {
        let mut service = sample();
        service.storage_mut().set_fail_writes(true);

        let err = service.edit(0, 0, CellEdit::Value("changed".to_string())).unwrap_err();
        assert!(matches!(err, Error::FileWrite { .. }));
        assert_eq!(service.table().cell(0, 0).unwrap().value(), "changed");
        assert_eq!(
            service.storage().contents(FILE).unwrap()[0],
            "(k1 , v1) (k2 , v2)"
        );

        service.storage_mut().set_fail_writes(false);
        service.save().unwrap();
        assert_eq!(&stored_table(&service), service.table());
    }

    #[test]
    fn test_history_records_mutations() {
        let mut service = sample();
        service.sort_row(1, SortOrder::Desc).unwrap();
        service.add_row(1, 0).unwrap();

        let actions: Vec<&Action> = service.history().entries().iter().map(|e| &e.action).collect();
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0], &Action::Load { rows: 2 });
        assert_eq!(actions[1], &Action::Sort { row: 0, order: SortOrder::Desc });
        assert_eq!(actions[2], &Action::AddRow { index: 0, cells: 1 });
    }

    #[test]
    fn test_print_table() {
        let service = sample();
        assert_eq!(
            service.print_table(),
            "Table Contents:\n(k1 , v1) (k2 , v2)\n(k3 , v3)\n"
        );
    }
}
