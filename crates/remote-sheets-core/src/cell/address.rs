//! A1 notation: single cells, rectangular bounds and sheet-qualified ranges

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// One cell, 0-based. Written as column letters plus a 1-based row (`C2`).
///
/// ```
/// use remote_sheets_core::CellAddress;
///
/// assert_eq!(CellAddress::parse("C2").unwrap(), CellAddress::new(1, 2));
/// assert_eq!(CellAddress::new(0, 27).to_string(), "AB1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub row: usize,
    pub col: usize,
}

impl CellAddress {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Parse `C2` or `$C$2`; absolute markers carry no meaning for ranges
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |why: &str| Error::InvalidAddress(format!("{} in {:?}", why, text));

        let cell = text.trim().replace('$', "");
        let split = cell
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(cell.len());
        let (letters, digits) = cell.split_at(split);
        if letters.is_empty() {
            return Err(invalid("missing column"));
        }
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("missing row"));
        }

        let row: usize = digits.parse().map_err(|_| invalid("row out of range"))?;
        let row = row.checked_sub(1).ok_or_else(|| invalid("row 0"))?;
        Ok(Self::new(row, Self::letters_to_column(letters)?))
    }

    /// Bijective base-26 column name: 0 is `A`, 25 is `Z`, 26 is `AA`
    pub fn column_to_letters(col: usize) -> String {
        let mut letters = Vec::new();
        let mut rest = col + 1;
        while rest > 0 {
            let digit = (rest - 1) % 26;
            letters.push(b'A' + digit as u8);
            rest = (rest - 1) / 26;
        }
        letters.iter().rev().map(|&b| b as char).collect()
    }

    /// Inverse of [`CellAddress::column_to_letters`], case-insensitive
    pub fn letters_to_column(letters: &str) -> Result<usize> {
        let too_large = || Error::InvalidAddress(format!("column {:?} is too large", letters));
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }

        let value = letters.bytes().try_fold(0usize, |acc, b| {
            if !b.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!(
                    "{:?} is not a column letter",
                    b as char
                )));
            }
            let digit = (b.to_ascii_uppercase() - b'A') as usize + 1;
            acc.checked_mul(26)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| too_large())
        })?;
        Ok(value - 1)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::column_to_letters(self.col), self.row + 1)
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A rectangular block of cells with half-open bounds
/// `[start_row, end_row) x [start_col, end_col)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridBounds {
    pub start_row: usize,
    pub end_row: usize,
    pub start_col: usize,
    pub end_col: usize,
}

impl GridBounds {
    /// Create bounds; an end before its start collapses to an empty extent
    pub fn new(start_row: usize, end_row: usize, start_col: usize, end_col: usize) -> Self {
        Self {
            start_row,
            end_row: end_row.max(start_row),
            start_col,
            end_col: end_col.max(start_col),
        }
    }

    /// Bounds of a single cell
    pub fn cell(row: usize, col: usize) -> Self {
        Self::new(row, row + 1, col, col + 1)
    }

    /// Number of rows covered
    pub fn row_count(&self) -> usize {
        self.end_row - self.start_row
    }

    /// Number of columns covered
    pub fn col_count(&self) -> usize {
        self.end_col - self.start_col
    }

    /// Whether the bounds cover no cell at all
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0 || self.col_count() == 0
    }

    /// Check if a cell is within these bounds
    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.start_row..self.end_row).contains(&row) && (self.start_col..self.end_col).contains(&col)
    }

    /// Format the bounds as `A1:C2` (inclusive last cell)
    pub fn to_a1_string(&self) -> Result<String> {
        if self.is_empty() {
            return Err(Error::InvalidRange(format!(
                "rows {}..{} x columns {}..{} is empty",
                self.start_row, self.end_row, self.start_col, self.end_col
            )));
        }
        let start = CellAddress::new(self.start_row, self.start_col);
        let end = CellAddress::new(self.end_row - 1, self.end_col - 1);
        Ok(format!("{}:{}", start, end))
    }
}

/// A range qualified by a sheet title, e.g. `'Sheet 1'!A1:C2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Range {
    /// Sheet title, unescaped
    pub sheet: Option<String>,
    pub bounds: GridBounds,
}

impl A1Range {
    pub fn new(sheet: impl Into<String>, bounds: GridBounds) -> Self {
        Self {
            sheet: Some(sheet.into()),
            bounds,
        }
    }

    /// Parse `Title!A1:B2`, `'Quoted title'!A1:B2`, `A1:B2` or a single cell
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let (sheet, cells) = if let Some(rest) = s.strip_prefix('\'') {
            let (title, consumed) = unquote_sheet_title(rest)
                .ok_or_else(|| Error::InvalidRange(format!("unterminated sheet title in '{}'", s)))?;
            let cells = rest[consumed..]
                .strip_prefix('!')
                .ok_or_else(|| Error::InvalidRange(format!("missing '!' in '{}'", s)))?;
            (Some(title), cells)
        } else if let Some(bang) = s.rfind('!') {
            (Some(s[..bang].to_string()), &s[bang + 1..])
        } else {
            (None, s)
        };

        let (start, end) = match cells.find(':') {
            Some(colon) => (
                CellAddress::parse(&cells[..colon])?,
                CellAddress::parse(&cells[colon + 1..])?,
            ),
            None => {
                let addr = CellAddress::parse(cells)?;
                (addr, addr)
            }
        };

        Ok(Self {
            sheet,
            bounds: GridBounds::new(
                start.row.min(end.row),
                start.row.max(end.row) + 1,
                start.col.min(end.col),
                start.col.max(end.col) + 1,
            ),
        })
    }

    /// Format in the notation the remote service expects
    pub fn to_a1_notation(&self) -> Result<String> {
        let cells = self.bounds.to_a1_string()?;
        Ok(match &self.sheet {
            Some(title) => format!("{}!{}", quote_sheet_title(title), cells),
            None => cells,
        })
    }
}

impl FromStr for A1Range {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Quote a sheet title for A1 notation, doubling embedded quotes
pub fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Read a quoted title (after the opening quote). Returns the title and the
/// number of bytes consumed including the closing quote.
fn unquote_sheet_title(s: &str) -> Option<(String, usize)> {
    let mut title = String::new();
    let mut chars = s.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\'' {
            if let Some((_, '\'')) = chars.peek() {
                chars.next();
                title.push('\'');
                continue;
            }
            return Some((title, i + 1));
        }
        title.push(c);
    }
    None
}

/// Format a sheet-qualified range from half-open bounds
pub fn format_range_a1_notation(sheet_title: &str, bounds: GridBounds) -> Result<String> {
    A1Range::new(sheet_title, bounds).to_a1_notation()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names() {
        let cases = [(0, "A"), (25, "Z"), (26, "AA"), (51, "AZ"), (52, "BA"), (701, "ZZ"), (702, "AAA")];
        for (col, name) in cases {
            assert_eq!(CellAddress::column_to_letters(col), name);
            assert_eq!(CellAddress::letters_to_column(name).unwrap(), col);
        }
        assert_eq!(CellAddress::letters_to_column("az").unwrap(), 51);
        assert!(CellAddress::letters_to_column("A1").is_err());
        assert!(CellAddress::letters_to_column(&"Z".repeat(40)).is_err());
    }

    #[test]
    fn test_parse_cells() {
        assert_eq!(CellAddress::parse("B2").unwrap(), CellAddress::new(1, 1));
        assert_eq!(CellAddress::parse(" $AA$10 ").unwrap(), CellAddress::new(9, 26));
        assert_eq!("c3".parse::<CellAddress>().unwrap(), CellAddress::new(2, 2));

        for bad in ["", "A", "7", "A0", "A1B", "1A", "A-1"] {
            assert!(CellAddress::parse(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_bounds_to_a1() {
        let bounds = GridBounds::new(0, 2, 0, 3);
        assert_eq!(bounds.to_a1_string().unwrap(), "A1:C2");
        assert_eq!(GridBounds::cell(1, 2).to_a1_string().unwrap(), "C2:C2");
        assert!(GridBounds::new(3, 3, 0, 5).to_a1_string().is_err());
    }

    #[test]
    fn test_bounds_collapse() {
        let bounds = GridBounds::new(4, 1, 2, 0);
        assert_eq!(bounds.row_count(), 0);
        assert_eq!(bounds.col_count(), 0);
        assert!(bounds.is_empty());
    }

    #[test]
    fn test_format_range() {
        let s = format_range_a1_notation("Sheet1", GridBounds::new(1, 3, 26, 28)).unwrap();
        assert_eq!(s, "'Sheet1'!AA2:AB3");

        let s = format_range_a1_notation("Bob's data", GridBounds::cell(0, 0)).unwrap();
        assert_eq!(s, "'Bob''s data'!A1:A1");
    }

    #[test]
    fn test_a1_range_parse() {
        let range = A1Range::parse("'Bob''s data'!B2:D4").unwrap();
        assert_eq!(range.sheet.as_deref(), Some("Bob's data"));
        assert_eq!(range.bounds, GridBounds::new(1, 4, 1, 4));

        let range = A1Range::parse("Sheet1!C3").unwrap();
        assert_eq!(range.sheet.as_deref(), Some("Sheet1"));
        assert_eq!(range.bounds, GridBounds::cell(2, 2));

        let range = A1Range::parse("B2:A1").unwrap();
        assert_eq!(range.sheet, None);
        assert_eq!(range.bounds, GridBounds::new(0, 2, 0, 2));

        assert!(A1Range::parse("'Unterminated!A1").is_err());
    }

    #[test]
    fn test_a1_range_notation_roundtrip() {
        let range = A1Range::new("It's", GridBounds::new(0, 10, 3, 5));
        let text = range.to_a1_notation().unwrap();
        assert_eq!(A1Range::parse(&text).unwrap(), range);
    }
}
