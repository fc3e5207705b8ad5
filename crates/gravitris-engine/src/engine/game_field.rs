use crate::{
    PieceCollisionError,
    core::{
        board::{Board, BoardSize},
        piece::{Piece, PieceKind},
    },
};

use super::piece_stream::{PieceSeed, PieceStream};

/// Single-turn game state: the board, the falling piece, and the piece ahead
/// of it.
///
/// `GameField` knows nothing about scoring, pausing, or time - that lives in
/// [`GameSession`](super::GameSession). It enforces exactly one rule: the
/// falling piece never occupies a colliding placement.
#[derive(Debug, Clone)]
pub struct GameField {
    board: Board,
    falling_piece: Piece,
    next_kind: PieceKind,
    piece_stream: PieceStream,
}

impl GameField {
    #[must_use]
    pub fn new(size: BoardSize) -> Self {
        Self::with_stream(size, PieceStream::new())
    }

    #[must_use]
    pub fn with_seed(size: BoardSize, seed: PieceSeed) -> Self {
        Self::with_stream(size, PieceStream::with_seed(seed))
    }

    fn with_stream(size: BoardSize, mut piece_stream: PieceStream) -> Self {
        // The first spawn draws twice: once for the active piece, once for
        // the preview. An empty board cannot reject the spawn.
        let falling_piece = Piece::spawn(piece_stream.next_kind(), size.width());
        let next_kind = piece_stream.next_kind();
        Self {
            board: Board::new(size),
            falling_piece,
            next_kind,
            piece_stream,
        }
    }

    /// Empties the board and spawns afresh. The piece stream keeps its state,
    /// so a seeded field stays deterministic across resets.
    pub fn reset(&mut self) {
        self.board = Board::new(self.board.size());
        self.falling_piece = Piece::spawn(self.piece_stream.next_kind(), self.board.width());
        self.next_kind = self.piece_stream.next_kind();
    }

    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    #[cfg(test)]
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    #[must_use]
    pub const fn falling_piece(&self) -> Piece {
        self.falling_piece
    }

    #[must_use]
    pub const fn next_kind(&self) -> PieceKind {
        self.next_kind
    }

    /// Adopts the piece as the new falling piece if its placement is free;
    /// a colliding placement is rejected and the current piece stays put.
    pub fn set_falling_piece(&mut self, piece: Piece) -> Result<(), PieceCollisionError> {
        if self.board.is_colliding(piece) {
            return Err(PieceCollisionError);
        }
        self.falling_piece = piece;
        Ok(())
    }

    /// Locks the falling piece into the board, clears full lines, and spawns
    /// the next piece.
    ///
    /// Returns the number of cleared lines, paired with `Err` when the fresh
    /// spawn collides at its centered position, which ends the game. The
    /// failed spawn writes nothing to the board.
    pub fn complete_piece_drop(&mut self) -> (usize, Result<(), PieceCollisionError>) {
        self.board.lock(self.falling_piece);
        let cleared_lines = self.board.clear_full_lines();

        self.falling_piece = Piece::spawn(self.next_kind, self.board.width());
        self.next_kind = self.piece_stream.next_kind();
        if self.board.is_colliding(self.falling_piece) {
            return (cleared_lines, Err(PieceCollisionError));
        }
        (cleared_lines, Ok(()))
    }
}
