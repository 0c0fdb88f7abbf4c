//! Board coordinates and the textual locus used by the move protocol.
//!
//! A board cell prints as `<column letter><row number>` with `A1` at the
//! first column and first row. Off-board areas have single-letter loci:
//! `R` (rack), `P` (capture bar, "prisoners"), `T` (trade area) and `U`
//! (unknown/scratch).

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::ParseError;

/// A board cell, 0-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub col: u8,
    pub row: u8,
}

impl Cell {
    #[must_use]
    pub const fn new(col: u8, row: u8) -> Self {
        Self { col, row }
    }

    /// Signed displacement `(dx, dy)` from `self` to `to`.
    #[must_use]
    pub fn delta(self, to: Cell) -> (i32, i32) {
        (
            i32::from(to.col) - i32::from(self.col),
            i32::from(to.row) - i32::from(self.row),
        )
    }

    /// The cell displaced by `(dx, dy)`, if it lies on a `size`×`size` board.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32, size: usize) -> Option<Cell> {
        let col = i32::from(self.col) + dx;
        let row = i32::from(self.row) + dy;
        let size = size as i32;
        if (0..size).contains(&col) && (0..size).contains(&row) {
            Some(Cell::new(col as u8, row as u8))
        } else {
            None
        }
    }

    /// True if the cell lies on the outer ring of a `size`×`size` board.
    #[must_use]
    pub fn is_edge(self, size: usize) -> bool {
        let last = (size - 1) as u8;
        self.col == 0 || self.row == 0 || self.col == last || self.row == last
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", char::from(b'A' + self.col), u32::from(self.row) + 1)
    }
}

impl FromStr for Cell {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseError::BadLocus(s.to_string());
        let mut chars = s.chars();
        let letter = chars.next().ok_or_else(bad)?.to_ascii_uppercase();
        if !letter.is_ascii_uppercase() {
            return Err(bad());
        }
        let row: u8 = chars.as_str().parse().map_err(|_| bad())?;
        if row == 0 {
            return Err(bad());
        }
        Ok(Cell::new(letter as u8 - b'A', row - 1))
    }
}

/// Where a stack lives, as written in move tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locus {
    Cell(Cell),
    Rack,
    Bar,
    Trade,
    Unknown,
}

impl std::fmt::Display for Locus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locus::Cell(c) => write!(f, "{c}"),
            Locus::Rack => f.write_str("R"),
            Locus::Bar => f.write_str("P"),
            Locus::Trade => f.write_str("T"),
            Locus::Unknown => f.write_str("U"),
        }
    }
}

impl FromStr for Locus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "R" => Ok(Locus::Rack),
            "P" => Ok(Locus::Bar),
            "T" => Ok(Locus::Trade),
            "U" => Ok(Locus::Unknown),
            _ => s.parse().map(Locus::Cell),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text() {
        let c: Cell = "B3".parse().unwrap();
        assert_eq!(c, Cell::new(1, 2));
        assert_eq!(c.to_string(), "B3");
        assert!("B0".parse::<Cell>().is_err());
        assert!("3B".parse::<Cell>().is_err());
        assert!("".parse::<Cell>().is_err());
    }

    #[test]
    fn test_locus_literals() {
        assert_eq!("P".parse::<Locus>().unwrap(), Locus::Bar);
        assert_eq!("T".parse::<Locus>().unwrap(), Locus::Trade);
        assert_eq!("A1".parse::<Locus>().unwrap(), Locus::Cell(Cell::new(0, 0)));
        assert!(matches!("?".parse::<Locus>(), Err(ParseError::BadLocus(_))));
    }

    #[test]
    fn test_geometry_helpers() {
        let c = Cell::new(1, 1);
        assert_eq!(c.delta(Cell::new(3, 0)), (2, -1));
        assert_eq!(c.offset(-1, 2, 4), Some(Cell::new(0, 3)));
        assert_eq!(c.offset(-2, 0, 4), None);
        assert!(!c.is_edge(4));
        assert!(Cell::new(3, 2).is_edge(4));
    }
}
