//! Core table types for representing key/value grids

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Delimiter between key and value in the text form of a pair
pub const FIELD_DELIMITER: &str = " , ";

/// A single key/value cell
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pair {
    key: String,
    value: String,
}

impl Pair {
    /// Create a new pair. Empty strings are allowed.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_key(&mut self, key: impl Into<String>) {
        self.key = key.into();
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Key followed by value, the ordering used when sorting a row
    pub fn sort_key(&self) -> String {
        let mut s = String::with_capacity(self.key.len() + self.value.len());
        s.push_str(&self.key);
        s.push_str(&self.value);
        s
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}{}{})", self.key, FIELD_DELIMITER, self.value)
    }
}

/// Sort direction for a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(Error::Validation(format!(
                "sort order must be 'asc' or 'desc', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "ASC"),
            SortOrder::Desc => write!(f, "DESC"),
        }
    }
}

/// An ordered list of pairs, one per line of the table file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Row {
    cells: Vec<Pair>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: Vec<Pair>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Pair] {
        &self.cells
    }

    /// Replace all cells of the row
    pub fn set_cells(&mut self, cells: Vec<Pair>) {
        self.cells = cells;
    }

    pub fn push(&mut self, pair: Pair) {
        self.cells.push(pair);
    }

    pub fn cell(&self, index: usize) -> Option<&Pair> {
        self.cells.get(index)
    }

    pub fn cell_mut(&mut self, index: usize) -> Option<&mut Pair> {
        self.cells.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Stable sort of the cells by their key+value concatenation.
    ///
    /// Comparison is by code point, so `"B" < "a"`. Cells with equal
    /// concatenations keep their relative order in both directions.
    pub fn sort_by_concat(&mut self, order: SortOrder) {
        let cmp = |a: &Pair, b: &Pair| -> Ordering {
            let (ka, kb) = (a.sort_key(), b.sort_key());
            match order {
                SortOrder::Asc => ka.cmp(&kb),
                SortOrder::Desc => kb.cmp(&ka),
            }
        };
        self.cells.sort_by(cmp);
    }
}

impl From<Vec<Pair>> for Row {
    fn from(cells: Vec<Pair>) -> Self {
        Self::from_cells(cells)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, pair) in self.cells.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", pair)?;
        }
        Ok(())
    }
}

/// The whole grid, one row per line of the backing file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    /// Create a new empty table
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Get the number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Insert a row so that it ends up at `index`.
    ///
    /// `0` places it before the first row and `len()` appends it.
    pub fn insert_row(&mut self, index: usize, row: Row) -> Result<()> {
        if index > self.rows.len() {
            return Err(Error::row_out_of_range(index, self.rows.len()));
        }
        self.rows.insert(index, row);
        Ok(())
    }

    pub fn row(&self, index: usize) -> Result<&Row> {
        let len = self.rows.len();
        self.rows
            .get(index)
            .ok_or_else(|| Error::row_out_of_range(index, len))
    }

    pub fn row_mut(&mut self, index: usize) -> Result<&mut Row> {
        let len = self.rows.len();
        self.rows
            .get_mut(index)
            .ok_or_else(|| Error::row_out_of_range(index, len))
    }

    pub fn cell(&self, row: usize, col: usize) -> Result<&Pair> {
        let r = self.row(row)?;
        r.cell(col).ok_or_else(|| Error::col_out_of_range(col, r.len()))
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Result<&mut Pair> {
        let r = self.row_mut(row)?;
        let len = r.len();
        r.cell_mut(col)
            .ok_or_else(|| Error::col_out_of_range(col, len))
    }

    /// All cells with their (row, col) coordinates, in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &Pair)> {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.cells()
                .iter()
                .enumerate()
                .map(move |(c, pair)| (r, c, pair))
        })
    }

    /// Every key in the table, in row-major order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells().map(|(_, _, pair)| pair.key())
    }

    /// Total number of cells across all rows
    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Row::len).sum()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}
