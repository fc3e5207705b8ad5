//! Falling-block puzzle game core.
//!
//! This crate owns the board grid, the piece catalog, collision detection,
//! line clearing, scoring, and the tick-driven session state machine.
//! Rendering, input binding, and frame timing are external collaborators:
//! they drive the engine through [`GameSession::tick`] and
//! [`GameSession::command`] and read back via the snapshot accessors.

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("piece colliding at the requested placement")]
pub struct PieceCollisionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("board size {width}x{height} is too small for the piece grid")]
pub struct BoardSizeError {
    pub width: usize,
    pub height: usize,
}
