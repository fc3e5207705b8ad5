//! Game engine logic and state management.
//!
//! The high-level layer that drives the core data structures turn by turn:
//!
//! - [`GameField`] - single-turn state (board, falling piece, next piece)
//! - [`GameSession`] - the tick/command state machine with scoring
//! - [`GameStats`] - score, cleared lines, level, drop interval
//! - [`PieceStream`] - seeded uniform piece randomizer
//! - [`PieceSeed`] - seed for deterministic piece generation
//!
//! A session advances when an external clock calls [`GameSession::tick`] and
//! an external input source calls [`GameSession::command`]; both report what
//! changed as a [`StateChange`]. Everything else is read-only snapshot
//! access for rendering.

pub use self::{game_field::*, game_session::*, game_stats::*, piece_stream::*};

mod game_field;
mod game_session;
mod game_stats;
mod piece_stream;
