//! Parsing of `rowxcol` style user input

use crate::error::{Error, Result};

fn split_row_col(input: &str) -> Option<(usize, usize)> {
    let (row, col) = input.trim().split_once('x')?;
    Some((row.trim().parse().ok()?, col.trim().parse().ok()?))
}

/// Parse table dimensions like `3x3`. Both numbers must be greater than 0.
pub fn parse_dimensions(input: &str) -> Result<(usize, usize)> {
    match split_row_col(input) {
        Some((rows, cols)) if rows > 0 && cols > 0 => Ok((rows, cols)),
        _ => Err(Error::Validation(format!(
            "'{}' is not a valid dimension, use rowxcol (ex. 1x1, 3x3) with both numbers greater than 0",
            input.trim()
        ))),
    }
}

/// Parse a 0-based cell index like `0x1`
pub fn parse_cell_index(input: &str) -> Result<(usize, usize)> {
    split_row_col(input).ok_or_else(|| {
        Error::Validation(format!(
            "'{}' is not a valid cell index, use rowxcol (ex. 0x0)",
            input.trim()
        ))
    })
}

/// Parse a non-negative number
pub fn parse_number(input: &str) -> Result<usize> {
    input
        .trim()
        .parse()
        .map_err(|_| Error::Validation(format!("'{}' is not a number", input.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimensions() {
        assert_eq!(parse_dimensions("3x3").unwrap(), (3, 3));
        assert_eq!(parse_dimensions(" 2x10 ").unwrap(), (2, 10));
    }

    #[test]
    fn test_parse_dimensions_rejects_zero_and_garbage() {
        for input in ["0x3", "3x0", "3", "x", "3x3x3", "ax3", "-1x2", ""] {
            assert!(
                matches!(parse_dimensions(input), Err(Error::Validation(_))),
                "accepted {:?}",
                input
            );
        }
    }

    #[test]
    fn test_parse_cell_index_allows_zero() {
        assert_eq!(parse_cell_index("0x0").unwrap(), (0, 0));
        assert_eq!(parse_cell_index("4x2").unwrap(), (4, 2));
        assert!(parse_cell_index("0,0").is_err());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 7 ").unwrap(), 7);
        assert!(parse_number("seven").is_err());
        assert!(parse_number("-1").is_err());
    }
}
