use serde::{Deserialize, Serialize};

use crate::BoardSizeError;

use super::piece::{Piece, PieceKind};

/// A single board cell: empty, or settled material from a specific piece kind.
///
/// The cell carries the piece identity directly: `tag()` is both the
/// occupancy test (0 = empty) and the color/identity lookup key for the
/// renderer. There is no separate occupancy bitmap to fall out of sync with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Cell {
    #[default]
    Empty,
    Piece(PieceKind),
}

impl Cell {
    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    /// Wire value: 0 for empty, 1-7 for the owning piece kind.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Piece(kind) => kind.tag(),
        }
    }

    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        if tag == 0 {
            return Some(Cell::Empty);
        }
        match PieceKind::from_tag(tag) {
            Some(kind) => Some(Cell::Piece(kind)),
            None => None,
        }
    }
}

/// Board dimensions, validated once at construction and never changed.
///
/// Serialized as a `(width, height)` pair; deserialization re-validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "(usize, usize)", into = "(usize, usize)")]
pub struct BoardSize {
    width: usize,
    height: usize,
}

impl BoardSize {
    /// Smallest accepted span per axis: the largest rotation matrix is 4x4
    /// and must fit inside the grid.
    pub const MIN_SPAN: usize = 4;

    /// The conventional 10x20 playfield.
    pub const DEFAULT: Self = Self {
        width: 10,
        height: 20,
    };

    pub const fn new(width: usize, height: usize) -> Result<Self, BoardSizeError> {
        if width < Self::MIN_SPAN || height < Self::MIN_SPAN {
            return Err(BoardSizeError { width, height });
        }
        Ok(Self { width, height })
    }

    #[must_use]
    pub const fn width(self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(self) -> usize {
        self.height
    }
}

impl Default for BoardSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<(usize, usize)> for BoardSize {
    type Error = BoardSizeError;

    fn try_from((width, height): (usize, usize)) -> Result<Self, Self::Error> {
        Self::new(width, height)
    }
}

impl From<BoardSize> for (usize, usize) {
    fn from(size: BoardSize) -> Self {
        (size.width, size.height)
    }
}

/// The playfield grid: `width x height` cells, row 0 at the top.
///
/// The board only ever holds settled material. The falling piece is drawn
/// over it by the renderer and merged in by [`Board::lock`] once it comes to
/// rest. Rows above the top (negative `y`) are deliberately untracked: pieces
/// spawn at row 0 and may overhang that edge without colliding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: BoardSize,
    cells: Vec<Cell>,
}

impl Serialize for Board {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Format: one digit per cell, rows top to bottom, comma-separated
        // (e.g. "0000,0300,3330" for a 4x3 board).
        let mut text = String::with_capacity(self.cells.len() + self.height());
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                text.push(',');
            }
            for cell in row {
                text.push(char::from(b'0' + cell.tag()));
            }
        }
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as _;

        let text = String::deserialize(deserializer)?;
        let rows: Vec<&str> = text.split(',').collect();
        let width = rows[0].len();
        let mut cells = Vec::with_capacity(width * rows.len());
        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(D::Error::custom(format!(
                    "row {y} has {} cells, expected {width}",
                    row.len()
                )));
            }
            for ch in row.chars() {
                let cell = ch
                    .to_digit(10)
                    .and_then(|tag| u8::try_from(tag).ok())
                    .and_then(Cell::from_tag)
                    .ok_or_else(|| {
                        D::Error::custom(format!("invalid cell '{ch}' in row {y}"))
                    })?;
                cells.push(cell);
            }
        }
        let size = BoardSize::new(width, rows.len()).map_err(D::Error::custom)?;
        Ok(Board { size, cells })
    }
}

impl Board {
    #[must_use]
    pub fn new(size: BoardSize) -> Self {
        Self {
            size,
            cells: vec![Cell::Empty; size.width() * size.height()],
        }
    }

    #[must_use]
    pub const fn size(&self) -> BoardSize {
        self.size
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.size.width()
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.size.height()
    }

    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.cells[y * self.width() + x]
    }

    /// Rows top to bottom; every row has exactly `width` cells.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks_exact(self.width())
    }

    /// Whether the given board coordinate blocks a piece.
    ///
    /// Columns outside `[0, width)` and rows at or below the floor are
    /// occupied; rows above the top (`y < 0`) are not, so a piece can hang
    /// over the top edge while spawning or rotating into place.
    #[must_use]
    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        let Ok(col) = usize::try_from(x) else {
            return true;
        };
        if col >= self.width() {
            return true;
        }
        let Ok(row) = usize::try_from(y) else {
            return false;
        };
        if row >= self.height() {
            return true;
        }
        !self.cell(col, row).is_empty()
    }

    /// Whether any occupied cell of the piece lands on an occupied board
    /// coordinate.
    ///
    /// This is the single collision predicate behind translation, rotation,
    /// and spawn validation.
    #[must_use]
    pub fn is_colliding(&self, piece: Piece) -> bool {
        piece.cells().iter().any(|&(x, y)| self.is_occupied(x, y))
    }

    /// Merges the piece's occupied cells into the grid at their current
    /// positions. Cells above the top edge are silently dropped; a piece may
    /// lock while partially outside the visible grid.
    pub fn lock(&mut self, piece: Piece) {
        let width = self.width();
        for (x, y) in piece.cells() {
            let Ok(row) = usize::try_from(y) else {
                continue;
            };
            let Ok(col) = usize::try_from(x) else {
                continue;
            };
            self.cells[row * width + col] = Cell::Piece(piece.kind());
        }
    }

    /// Removes every full row and returns how many were removed.
    ///
    /// Scans bottom-up, compacting surviving rows downward and refilling the
    /// top with empty rows. Adjacent and non-adjacent simultaneous clears
    /// both come out right, and a second call immediately after returns 0.
    pub fn clear_full_lines(&mut self) -> usize {
        let width = self.width();
        let mut cleared = 0;
        for y in (0..self.height()).rev() {
            if self.row_is_full(y) {
                cleared += 1;
                continue;
            }
            if cleared > 0 {
                let src = y * width;
                self.cells.copy_within(src..src + width, src + cleared * width);
            }
        }
        self.cells[..cleared * width].fill(Cell::Empty);
        cleared
    }

    fn row_is_full(&self, y: usize) -> bool {
        let start = y * self.width();
        self.cells[start..start + self.width()]
            .iter()
            .all(|cell| !cell.is_empty())
    }

    /// Builds a board from ASCII art for tests: '.' is an empty cell, a piece
    /// letter (I, O, T, S, Z, J, L) is a settled cell of that kind. Dimensions
    /// come from the text; rows run top to bottom.
    ///
    /// # Panics
    ///
    /// Panics on ragged rows, unknown characters, or an undersized grid.
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        let lines: Vec<&str> = art
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        assert!(!lines.is_empty(), "board art must contain at least one row");

        let width = lines[0].chars().count();
        let mut cells = Vec::with_capacity(width * lines.len());
        for (y, line) in lines.iter().enumerate() {
            assert_eq!(
                line.chars().count(),
                width,
                "row {y} must have exactly {width} cells"
            );
            for ch in line.chars() {
                let cell = match ch {
                    '.' => Cell::Empty,
                    _ => Cell::Piece(
                        PieceKind::from_char(ch)
                            .unwrap_or_else(|| panic!("unknown cell character '{ch}' in row {y}")),
                    ),
                };
                cells.push(cell);
            }
        }

        let size = BoardSize::new(width, lines.len())
            .unwrap_or_else(|e| panic!("board art too small: {e}"));
        Self { size, cells }
    }
}
