//! Spreadsheet-style cell references such as `B3`.
use crate::table::cell::CellIndex;
use regex::Regex;
use thiserror::Error;

/// Errors related to cell reference parsing.
#[derive(Error, Debug, PartialEq)]
pub enum ReferenceError {
    #[error("Invalid cell reference '{0}'")]
    FormatError(String),
}

/// Converts uppercase column letters (`A`, `Z`, `AA`) to a 0-based column index.
pub fn col_to_index(letters: &str) -> Option<usize> {
    letters
        .chars()
        .map(|letter| letter.is_ascii_uppercase().then(|| letter as usize - 'A' as usize + 1))
        .try_fold(0usize, |index, digit| index.checked_mul(26)?.checked_add(digit?))
        .filter(|column| *column > 0)
        .map(|column| column - 1)
}

/// Converts a 1-based row number to a 0-based row index.
pub fn row_to_index(number: &str) -> Option<usize> {
    number
        .parse()
        .ok()
        .filter(|row| *row > 0)
        .map(|row: usize| row - 1)
}

/// Converts a 0-based column index to column letters.
pub fn index_to_col(index: usize) -> String {
    let mut letters = Vec::new();
    let mut remaining = index + 1;
    while remaining > 0 {
        let digit = (remaining - 1) % 26;
        letters.push(char::from(b'A' + digit as u8));
        remaining = (remaining - 1) / 26;
    }
    letters.iter().rev().collect()
}

impl CellIndex {
    /// The spreadsheet-style reference of this position, e.g. `B3` for (2, 1).
    pub fn reference(&self) -> String {
        format!("{}{}", index_to_col(self.col), self.row + 1)
    }
}

impl TryFrom<&str> for CellIndex {
    type Error = ReferenceError;

    /// Parses a single cell reference such as `A1` or `ab12` (case-insensitive).
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let pattern = Regex::new(r"^([A-Z]+)(\d+)$").expect("Hardcode regex pattern");
        let upper = value.trim().to_ascii_uppercase();
        let captures = pattern
            .captures(upper.as_str())
            .ok_or_else(|| ReferenceError::FormatError(value.to_owned()))?;
        let col = col_to_index(&captures[1]).ok_or_else(|| ReferenceError::FormatError(value.to_owned()))?;
        let row = row_to_index(&captures[2]).ok_or_else(|| ReferenceError::FormatError(value.to_owned()))?;
        Ok(CellIndex::new(row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_references() {
        assert_eq!(CellIndex::try_from("A1"), Ok(CellIndex::new(0, 0)));
        assert_eq!(CellIndex::try_from("b3"), Ok(CellIndex::new(2, 1)));
        assert_eq!(CellIndex::try_from("AA10"), Ok(CellIndex::new(9, 26)));
    }

    #[test]
    fn rejects_malformed_references() {
        for value in ["", "A", "12", "A0", "1A", "A1:B2"] {
            assert_eq!(CellIndex::try_from(value), Err(ReferenceError::FormatError(value.to_owned())));
        }
    }

    #[test]
    fn formats_references() {
        assert_eq!(CellIndex::new(2, 1).reference(), "B3");
        assert_eq!(CellIndex::new(0, 25).reference(), "Z1");
        assert_eq!(CellIndex::new(99, 27).reference(), "AB100");
        assert_eq!(index_to_col(701), "ZZ");
        assert_eq!(index_to_col(702), "AAA");
    }

    #[test]
    fn column_letters_map_to_indices() {
        assert_eq!(col_to_index("A"), Some(0));
        assert_eq!(col_to_index("Z"), Some(25));
        assert_eq!(col_to_index("AZ"), Some(51));
        assert_eq!(col_to_index(""), None);
        assert_eq!(col_to_index("1"), None);
        assert_eq!(col_to_index("a"), None);
        assert_eq!(col_to_index("A@"), None);
    }
}
