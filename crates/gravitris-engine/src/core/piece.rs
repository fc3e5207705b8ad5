use arrayvec::ArrayVec;
use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

use super::board::Cell;

/// A falling piece with a kind, rotation index, and board-relative anchor.
///
/// The anchor `(x, y)` is where the rotation matrix's top-left corner sits on
/// the board; it may be negative or point above row 0 while the piece hangs
/// over an edge. Pieces are immutable - movement and rotation return new
/// `Piece` values, so a rejected attempt is discarded rather than rolled back.
///
/// # Example
///
/// ```
/// use gravitris_engine::{Piece, PieceKind};
///
/// let piece = Piece::spawn(PieceKind::T, 10);
/// let moved = piece.right().down();
/// let turned = moved.rotated();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    kind: PieceKind,
    rotation: usize,
    x: i32,
    y: i32,
}

impl Serialize for Piece {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Format: "kind#rotation@x,y" (e.g., "T#1@3,0")
        let s = format!(
            "{}#{}@{},{}",
            self.kind.as_char(),
            self.rotation,
            self.x,
            self.y
        );
        serializer.serialize_str(&s)
    }
}

impl<'de> Deserialize<'de> for Piece {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as _;

        let s = String::deserialize(deserializer)?;
        let parts = s
            .split_once('#')
            .and_then(|(kind, rest)| rest.split_once('@').map(|(rot, pos)| (kind, rot, pos)))
            .and_then(|(kind, rot, pos)| pos.split_once(',').map(|(x, y)| (kind, rot, x, y)));
        let Some((kind_str, rotation_str, x_str, y_str)) = parts else {
            return Err(D::Error::custom(format!(
                "expected format 'kind#rotation@x,y', got '{s}'"
            )));
        };

        let mut kind_chars = kind_str.chars();
        let kind = kind_chars
            .next()
            .filter(|_| kind_chars.next().is_none())
            .and_then(PieceKind::from_char)
            .ok_or_else(|| D::Error::custom(format!("invalid piece kind: '{kind_str}'")))?;

        let rotation = rotation_str.parse::<usize>().map_err(|e| {
            D::Error::custom(format!("invalid rotation: {rotation_str} ({e})"))
        })?;
        if rotation >= kind.rotation_states().len() {
            return Err(D::Error::custom(format!(
                "rotation {rotation} out of range for piece {}",
                kind.as_char()
            )));
        }

        let x = x_str
            .parse::<i32>()
            .map_err(|e| D::Error::custom(format!("invalid x position: {x_str} ({e})")))?;
        let y = y_str
            .parse::<i32>()
            .map_err(|e| D::Error::custom(format!("invalid y position: {y_str} ({e})")))?;

        Ok(Piece {
            kind,
            rotation,
            x,
            y,
        })
    }
}

impl Piece {
    /// Creates a piece at its spawn placement: rotation 0, row 0, centered
    /// horizontally (`(board_width - matrix_width) / 2`, rounded down).
    #[must_use]
    pub fn spawn(kind: PieceKind, board_width: usize) -> Self {
        let shape = kind.spawn_shape();
        Self {
            kind,
            rotation: 0,
            x: centered_spawn_x(board_width, shape[0].len()),
            y: 0,
        }
    }

    #[cfg(test)]
    pub(crate) const fn at(kind: PieceKind, rotation: usize, x: i32, y: i32) -> Self {
        Self {
            kind,
            rotation,
            x,
            y,
        }
    }

    #[must_use]
    pub const fn kind(self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub const fn rotation(self) -> usize {
        self.rotation
    }

    #[must_use]
    pub const fn x(self) -> i32 {
        self.x
    }

    #[must_use]
    pub const fn y(self) -> i32 {
        self.y
    }

    /// The rotation matrix for the piece's current orientation.
    #[must_use]
    pub fn shape(self) -> ShapeMatrix {
        self.kind.rotation_states()[self.rotation]
    }

    /// Absolute board coordinates of the piece's occupied cells.
    ///
    /// A tetromino always occupies exactly 4 cells, so the result never
    /// spills the fixed capacity.
    #[must_use]
    pub fn cells(self) -> ArrayVec<(i32, i32), 4> {
        let mut cells = ArrayVec::new();
        for (dy, row) in (0i32..).zip(self.shape()) {
            for (dx, cell) in (0i32..).zip(row.iter()) {
                if !cell.is_empty() {
                    cells.push((self.x + dx, self.y + dy));
                }
            }
        }
        cells
    }

    #[must_use]
    pub const fn left(self) -> Self {
        Self {
            x: self.x - 1,
            ..self
        }
    }

    #[must_use]
    pub const fn right(self) -> Self {
        Self {
            x: self.x + 1,
            ..self
        }
    }

    #[must_use]
    pub const fn down(self) -> Self {
        Self {
            y: self.y + 1,
            ..self
        }
    }

    /// Advances to the next rotation state, wrapping around the kind's state
    /// count. The anchor is unchanged; callers decide whether the rotated
    /// placement is acceptable.
    #[must_use]
    pub fn rotated(self) -> Self {
        Self {
            rotation: (self.rotation + 1) % self.kind.rotation_states().len(),
            ..self
        }
    }
}

#[expect(clippy::cast_possible_truncation)]
const fn centered_spawn_x(board_width: usize, shape_width: usize) -> i32 {
    (board_width.saturating_sub(shape_width) / 2) as i32
}

/// Enum identifying the 7 piece kinds.
///
/// The discriminant is the kind's cell tag (1-7); the board stores this value
/// directly, so a cell's integer value identifies the piece that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    I = 1,
    O = 2,
    T = 3,
    S = 4,
    Z = 5,
    J = 6,
    L = 7,
}

impl Distribution<PieceKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        match rng.random_range(1..=7) {
            1 => PieceKind::I,
            2 => PieceKind::O,
            3 => PieceKind::T,
            4 => PieceKind::S,
            5 => PieceKind::Z,
            6 => PieceKind::J,
            _ => PieceKind::L,
        }
    }
}

impl PieceKind {
    /// Number of piece kinds (7).
    pub const LEN: usize = 7;

    /// All kinds in tag order.
    pub const ALL: [Self; Self::LEN] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// The cell tag written to the board for this kind (1-7).
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(PieceKind::I),
            2 => Some(PieceKind::O),
            3 => Some(PieceKind::T),
            4 => Some(PieceKind::S),
            5 => Some(PieceKind::Z),
            6 => Some(PieceKind::J),
            7 => Some(PieceKind::L),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::T => 'T',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
        }
    }

    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(PieceKind::I),
            'O' => Some(PieceKind::O),
            'T' => Some(PieceKind::T),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            'J' => Some(PieceKind::J),
            'L' => Some(PieceKind::L),
            _ => None,
        }
    }

    /// The ordered rotation states of this kind.
    ///
    /// Each state is a square matrix whose occupied cells carry the kind's
    /// own tag. States of one kind share dimensions, but kinds differ: the
    /// I-piece uses a 4x4 matrix, the O-piece 2x2, everything else 3x3.
    /// S, Z and I have 2 states; O repeats its single shape 4 times; T, J
    /// and L cycle through 4 distinct states.
    #[must_use]
    pub const fn rotation_states(self) -> &'static [ShapeMatrix] {
        match self {
            PieceKind::I => &I_STATES,
            PieceKind::O => &O_STATES,
            PieceKind::T => &T_STATES,
            PieceKind::S => &S_STATES,
            PieceKind::Z => &Z_STATES,
            PieceKind::J => &J_STATES,
            PieceKind::L => &L_STATES,
        }
    }

    /// Rotation state 0, the orientation a fresh piece spawns in and the one
    /// shown in the next-piece preview.
    #[must_use]
    pub const fn spawn_shape(self) -> ShapeMatrix {
        self.rotation_states()[0]
    }
}

/// A rotation state: one square matrix of cells, row-major, top row first.
pub type ShapeMatrix = &'static [&'static [Cell]];

// The matrices are transcribed, not generated: S, Z and I deliberately keep
// only two states (rotating back and forth between them), and O's four
// states are the same shape.

const I_STATES: [ShapeMatrix; 2] = {
    use Cell::Empty as E;
    const I: Cell = Cell::Piece(PieceKind::I);
    [
        &[
            &[E, E, E, E],
            &[I, I, I, I],
            &[E, E, E, E],
            &[E, E, E, E],
        ],
        &[
            &[E, E, I, E],
            &[E, E, I, E],
            &[E, E, I, E],
            &[E, E, I, E],
        ],
    ]
};

const O_STATES: [ShapeMatrix; 4] = {
    const O: Cell = Cell::Piece(PieceKind::O);
    const SQUARE: ShapeMatrix = &[&[O, O], &[O, O]];
    [SQUARE, SQUARE, SQUARE, SQUARE]
};

const T_STATES: [ShapeMatrix; 4] = {
    use Cell::Empty as E;
    const T: Cell = Cell::Piece(PieceKind::T);
    [
        &[&[E, T, E], &[T, T, T], &[E, E, E]],
        &[&[E, T, E], &[E, T, T], &[E, T, E]],
        &[&[E, E, E], &[T, T, T], &[E, T, E]],
        &[&[E, T, E], &[T, T, E], &[E, T, E]],
    ]
};

const S_STATES: [ShapeMatrix; 2] = {
    use Cell::Empty as E;
    const S: Cell = Cell::Piece(PieceKind::S);
    [
        &[&[E, S, S], &[S, S, E], &[E, E, E]],
        &[&[E, S, E], &[E, S, S], &[E, E, S]],
    ]
};

const Z_STATES: [ShapeMatrix; 2] = {
    use Cell::Empty as E;
    const Z: Cell = Cell::Piece(PieceKind::Z);
    [
        &[&[Z, Z, E], &[E, Z, Z], &[E, E, E]],
        &[&[E, E, Z], &[E, Z, Z], &[E, Z, E]],
    ]
};

const J_STATES: [ShapeMatrix; 4] = {
    use Cell::Empty as E;
    const J: Cell = Cell::Piece(PieceKind::J);
    [
        &[&[J, E, E], &[J, J, J], &[E, E, E]],
        &[&[E, J, J], &[E, J, E], &[E, J, E]],
        &[&[E, E, E], &[J, J, J], &[E, E, J]],
        &[&[E, J, E], &[E, J, E], &[J, J, E]],
    ]
};

const L_STATES: [ShapeMatrix; 4] = {
    use Cell::Empty as E;
    const L: Cell = Cell::Piece(PieceKind::L);
    [
        &[&[E, E, L], &[L, L, L], &[E, E, E]],
        &[&[E, L, E], &[E, L, E], &[E, L, L]],
        &[&[E, E, E], &[L, L, L], &[L, E, E]],
        &[&[L, L, E], &[E, L, E], &[E, L, E]],
    ]
};
