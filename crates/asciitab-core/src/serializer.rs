//! Text format for tables
//!
//! Each row is one line, each cell is rendered as `(key , value)` and cells
//! are separated by a single space:
//!
//! ```text
//! (k1 , v1) (k2 , v2)
//! (k3 , v3)
//! ```
//!
//! Parsing is a best-effort scan. A key ends at the first ` , ` and a value
//! ends at the first `)` followed by optional whitespace and then `(` or the
//! end of the line. Keys containing ` , ` and values containing `)(` cannot
//! be represented. Malformed groups are skipped, never reported as errors.

use crate::error::{Error, Result};
use crate::table::{Pair, Row, Table, FIELD_DELIMITER};
use tracing::{debug, warn};

/// What to do with a line that yields no pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyRows {
    /// Keep a zero-cell row so rows stay aligned with file lines
    #[default]
    Keep,
    /// Skip the line
    Drop,
}

/// Render a table to one text line per row
pub fn render(table: &Table) -> Vec<String> {
    table.rows().iter().map(Row::to_string).collect()
}

/// Render a table to a single string, rows separated by `\n`
pub fn render_string(table: &Table) -> String {
    render(table).join("\n")
}

/// Parse text lines into a table
pub fn parse<I, S>(lines: I, empty_rows: EmptyRows) -> Table
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut table = Table::new();

    for (line_no, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        let row = parse_line(line);

        if row.is_empty() {
            if !line.trim().is_empty() {
                warn!(line = line_no + 1, "no (key , value) pairs found on line");
            }
            if empty_rows == EmptyRows::Drop {
                continue;
            }
        }

        debug!(line = line_no + 1, pairs = row.len(), "parsed line");
        table.push_row(row);
    }

    table
}

/// Parse a whole document. A single trailing newline does not add a row.
pub fn parse_str(text: &str, empty_rows: EmptyRows) -> Table {
    parse(text.lines(), empty_rows)
}

/// Parse the pairs of a single line
pub fn parse_line(line: &str) -> Row {
    Row::from_cells(PairScanner::new(line).collect())
}

#[derive(Debug, Clone, Copy)]
enum Scan {
    /// Looking for the `(` that opens the next pair
    Between,
    /// Inside a pair, reading the key that starts at `start`
    Key { start: usize },
    /// Key captured, reading the value that starts at `start`
    Value { key_start: usize, key_end: usize, start: usize },
    Done,
}

/// Iterator over the pairs of one line
#[derive(Debug, Clone)]
pub struct PairScanner<'a> {
    line: &'a str,
    pos: usize,
    state: Scan,
}

impl<'a> PairScanner<'a> {
    pub fn new(line: &'a str) -> Self {
        Self {
            line,
            pos: 0,
            state: Scan::Between,
        }
    }
}

impl Iterator for PairScanner<'_> {
    type Item = Pair;

    fn next(&mut self) -> Option<Pair> {
        // A failed delimiter or terminator search ends the line: any later
        // `(` would need the same delimiter/terminator past this point.
        loop {
            self.state = match self.state {
                Scan::Between => match self.line[self.pos..].find('(') {
                    Some(off) => Scan::Key {
                        start: self.pos + off + 1,
                    },
                    None => Scan::Done,
                },
                Scan::Key { start } => match self.line[start..].find(FIELD_DELIMITER) {
                    Some(off) => Scan::Value {
                        key_start: start,
                        key_end: start + off,
                        start: start + off + FIELD_DELIMITER.len(),
                    },
                    None => Scan::Done,
                },
                Scan::Value {
                    key_start,
                    key_end,
                    start,
                } => match find_value_end(self.line, start) {
                    Some((end, next)) => {
                        self.pos = next;
                        self.state = Scan::Between;
                        return Some(Pair::new(
                            &self.line[key_start..key_end],
                            &self.line[start..end],
                        ));
                    }
                    None => Scan::Done,
                },
                Scan::Done => return None,
            };
        }
    }
}

/// Find the `)` closing a value that starts at `from`.
///
/// Returns the position of that `)` and the position where scanning for the
/// next pair resumes (after any whitespace following it).
/// Reject a key that would not read back as itself once rendered
pub fn check_key(key: &str) -> Result<()> {
    check_single_line("key", key)?;
    let rendered = format!("{}{}", key, FIELD_DELIMITER);
    if rendered.find(FIELD_DELIMITER) != Some(key.len()) {
        return Err(Error::Validation(format!(
            "key '{}' cannot contain '{}'",
            key, FIELD_DELIMITER
        )));
    }
    Ok(())
}

/// Reject a value that would not read back as itself once rendered
pub fn check_value(value: &str) -> Result<()> {
    check_single_line("value", value)?;
    let rendered = format!("{})", value);
    match find_value_end(&rendered, 0) {
        Some((close, _)) if close == value.len() => Ok(()),
        _ => Err(Error::Validation(format!(
            "value '{}' cannot contain ')' followed by '('",
            value
        ))),
    }
}

fn check_single_line(what: &str, text: &str) -> Result<()> {
    if text.contains(['\n', '\r']) {
        return Err(Error::Validation(format!("{} cannot span lines", what)));
    }
    Ok(())
}

fn find_value_end(line: &str, from: usize) -> Option<(usize, usize)> {
    let mut search = from;
    while let Some(off) = line[search..].find(')') {
        let close = search + off;
        let rest = line[close + 1..].trim_start();
        if rest.is_empty() || rest.starts_with('(') {
            return Some((close, line.len() - rest.len()));
        }
        search = close + 1;
    }
    None
}
