//! Board view model: turns raw boards into what a player is allowed to see.
//!
//! The game service sends the opponent's board in full, ships included, and
//! hiding them is left to the client. [`render`] applies that fog-of-war;
//! hits and misses are always shown since play has already revealed them.

use std::fmt;

use crate::protocol::{Board, Cell};

/// Side length of a board on the game service.
pub const BOARD_SIZE: usize = 12;

/// Visual class of a rendered cell, for renderers that style squares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellClass {
    Water,
    Ship,
    Hit,
    Miss,
}

impl CellClass {
    /// Stable lowercase name (`"water"`, `"ship"`, `"hit"`, `"miss"`).
    pub fn name(self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Ship => "ship",
            Self::Hit => "hit",
            Self::Miss => "miss",
        }
    }
}

impl From<Cell> for CellClass {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Water => Self::Water,
            Cell::Ship => Self::Ship,
            Cell::Hit => Self::Hit,
            Cell::Miss => Self::Miss,
        }
    }
}

/// A board ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayGrid {
    cells: Vec<Vec<Cell>>,
    placeholder: bool,
}

impl DisplayGrid {
    /// An all-water `size`×`size` shell shown before the first snapshot.
    pub fn placeholder(size: usize) -> Self {
        Self {
            cells: vec![vec![Cell::Water; size]; size],
            placeholder: true,
        }
    }

    /// `true` when no board has been received yet.
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn class_at(&self, row: usize, col: usize) -> Option<CellClass> {
        self.cell(row, col).map(CellClass::from)
    }

    /// `true` if any rendered square shows a ship.
    pub fn shows_ships(&self) -> bool {
        self.cells.iter().flatten().any(|c| *c == Cell::Ship)
    }
}

/// Render a raw board, hiding ships when `fog_of_war` is set.
///
/// `None` (no snapshot yet) produces a [`BOARD_SIZE`] placeholder.
pub fn render(board: Option<&Board>, fog_of_war: bool) -> DisplayGrid {
    let Some(board) = board else {
        return DisplayGrid::placeholder(BOARD_SIZE);
    };
    let cells = board
        .rows()
        .iter()
        .map(|row| row.iter().map(|&cell| visible(cell, fog_of_war)).collect())
        .collect();
    DisplayGrid {
        cells,
        placeholder: false,
    }
}

fn visible(cell: Cell, fog_of_war: bool) -> Cell {
    match cell {
        Cell::Ship if fog_of_war => Cell::Water,
        other => other,
    }
}

/// Terminal rendering: column header, then one line per row.
///
/// ```text
///      0  1  2
///  0   ~  S  X
///  1   o  ~  ~
/// ```
impl fmt::Display for DisplayGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for col in 0..self.size() {
            write!(f, " {col:2}")?;
        }
        writeln!(f)?;
        for (index, row) in self.cells.iter().enumerate() {
            write!(f, "{index:2} ")?;
            for cell in row {
                let glyph = match cell {
                    Cell::Water => '~',
                    Cell::Ship => 'S',
                    Cell::Hit => 'X',
                    Cell::Miss => 'o',
                };
                write!(f, "  {glyph}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
