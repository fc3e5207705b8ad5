use std::time::Duration;

use crate::{
    PieceCollisionError,
    core::{
        board::{Board, BoardSize},
        piece::{Piece, PieceKind},
    },
};

use super::{GameStats, game_field::GameField, piece_stream::PieceSeed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum SessionState {
    Playing,
    Paused,
    GameOver,
}

/// Discrete player actions accepted by [`GameSession::command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Rotate,
    HardDrop,
    TogglePause,
    Restart,
}

/// What a tick or command did to the board and falling piece.
///
/// `TogglePause` and `Restart` report `Unchanged`; observe
/// [`GameSession::session_state`] for those.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum StateChange {
    /// Nothing visible happened (rejected move, idle tick, gated command).
    Unchanged,
    /// The falling piece translated or rotated.
    PieceMoved,
    /// The falling piece locked; lines may have cleared and the next piece
    /// spawned.
    PieceLocked { cleared_lines: usize },
    /// The falling piece locked and the respawn was blocked; the session is
    /// now terminal until a restart.
    GameOver,
}

/// The game state machine.
///
/// A session is driven from outside: a clock collaborator calls
/// [`tick`](Self::tick) with elapsed time and an input collaborator calls
/// [`command`](Self::command). Both are synchronous and non-reentrant, and
/// every mutation (a move, a rotation, the whole lock/clear/respawn chain)
/// completes before the call returns, so readers never observe a half-applied
/// action.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use gravitris_engine::{BoardSize, Command, GameSession};
///
/// let mut session = GameSession::new(BoardSize::DEFAULT);
/// session.command(Command::MoveLeft);
/// session.command(Command::Rotate);
/// session.tick(Duration::from_millis(1000));
///
/// println!("{} points at level {}", session.score(), session.level());
/// ```
#[derive(Debug, Clone)]
pub struct GameSession {
    field: GameField,
    stats: GameStats,
    session_state: SessionState,
    drop_timer: Duration,
}

impl GameSession {
    #[must_use]
    pub fn new(size: BoardSize) -> Self {
        Self::from_field(GameField::new(size))
    }

    /// Like [`Self::new`], but with a fixed seed so the piece sequence is
    /// reproducible.
    #[must_use]
    pub fn with_seed(size: BoardSize, seed: PieceSeed) -> Self {
        Self::from_field(GameField::with_seed(size, seed))
    }

    fn from_field(field: GameField) -> Self {
        Self {
            field,
            stats: GameStats::new(),
            session_state: SessionState::Playing,
            drop_timer: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        self.field.board()
    }

    #[must_use]
    pub fn falling_piece(&self) -> Piece {
        self.field.falling_piece()
    }

    #[must_use]
    pub fn next_kind(&self) -> PieceKind {
        self.field.next_kind()
    }

    #[must_use]
    pub const fn stats(&self) -> &GameStats {
        &self.stats
    }

    #[must_use]
    pub const fn score(&self) -> usize {
        self.stats.score()
    }

    #[must_use]
    pub const fn lines(&self) -> usize {
        self.stats.total_cleared_lines()
    }

    #[must_use]
    pub const fn level(&self) -> usize {
        self.stats.level()
    }

    #[must_use]
    pub fn drop_interval(&self) -> Duration {
        self.stats.drop_interval()
    }

    #[must_use]
    pub const fn session_state(&self) -> SessionState {
        self.session_state
    }

    /// Advances game time.
    ///
    /// Elapsed time accumulates while the session is playing; once the total
    /// reaches the drop interval the timer resets and one gravity step fires.
    /// A blocked gravity step is the lock signal: the piece locks, full lines
    /// clear and score, and the next piece spawns, all before this returns.
    pub fn tick(&mut self, elapsed: Duration) -> StateChange {
        if !self.session_state.is_playing() {
            return StateChange::Unchanged;
        }
        self.drop_timer += elapsed;
        if self.drop_timer < self.stats.drop_interval() {
            return StateChange::Unchanged;
        }
        self.drop_timer = Duration::ZERO;
        self.gravity_step()
    }

    /// Applies one discrete player action.
    ///
    /// While paused, everything but `TogglePause` and `Restart` is ignored;
    /// after a game over, everything but `Restart` is.
    pub fn command(&mut self, command: Command) -> StateChange {
        match self.session_state {
            SessionState::GameOver if command != Command::Restart => {
                return StateChange::Unchanged;
            }
            SessionState::Paused
                if !matches!(command, Command::TogglePause | Command::Restart) =>
            {
                return StateChange::Unchanged;
            }
            _ => {}
        }

        match command {
            Command::MoveLeft => absorb(self.try_move_left()),
            Command::MoveRight => absorb(self.try_move_right()),
            Command::SoftDrop => self.gravity_step(),
            Command::Rotate => absorb(self.try_rotate()),
            Command::HardDrop => self.hard_drop(),
            Command::TogglePause => {
                self.toggle_pause();
                StateChange::Unchanged
            }
            Command::Restart => {
                self.restart();
                StateChange::Unchanged
            }
        }
    }

    pub fn try_move_left(&mut self) -> Result<(), PieceCollisionError> {
        self.field.set_falling_piece(self.field.falling_piece().left())
    }

    pub fn try_move_right(&mut self) -> Result<(), PieceCollisionError> {
        self.field
            .set_falling_piece(self.field.falling_piece().right())
    }

    /// One downward step. Unlike [`Self::command`] with `SoftDrop`, a blocked
    /// step here is reported as an error instead of triggering the lock.
    pub fn try_soft_drop(&mut self) -> Result<(), PieceCollisionError> {
        self.field.set_falling_piece(self.field.falling_piece().down())
    }

    /// Advances the falling piece to its next rotation state in place.
    ///
    /// There is no wall kick: if the rotated matrix collides at the unchanged
    /// anchor, the rotation is rejected and the piece keeps its orientation.
    pub fn try_rotate(&mut self) -> Result<(), PieceCollisionError> {
        self.field
            .set_falling_piece(self.field.falling_piece().rotated())
    }

    /// Drops the falling piece straight down and locks it.
    ///
    /// Each descended cell awards 2 points before the terminal blocked step
    /// runs the usual lock/clear/respawn chain.
    pub fn hard_drop(&mut self) -> StateChange {
        let mut descended = 0;
        while self.try_soft_drop().is_ok() {
            descended += 1;
        }
        self.stats.add_descent_bonus(descended);
        self.lock_and_respawn()
    }

    pub fn toggle_pause(&mut self) {
        self.session_state = match self.session_state {
            SessionState::Playing => SessionState::Paused,
            SessionState::Paused => SessionState::Playing,
            SessionState::GameOver => SessionState::GameOver, // No change from game over
        };
    }

    /// Starts a fresh game: empty board, zeroed stats, fresh spawn. The piece
    /// stream is not reseeded, so a seeded session stays reproducible across
    /// restarts.
    pub fn restart(&mut self) {
        self.field.reset();
        self.stats = GameStats::new();
        self.drop_timer = Duration::ZERO;
        self.session_state = SessionState::Playing;
    }

    fn gravity_step(&mut self) -> StateChange {
        if self.try_soft_drop().is_ok() {
            return StateChange::PieceMoved;
        }
        self.lock_and_respawn()
    }

    fn lock_and_respawn(&mut self) -> StateChange {
        let (cleared_lines, respawn) = self.field.complete_piece_drop();
        self.stats.complete_piece_drop(cleared_lines);
        if respawn.is_err() {
            self.session_state = SessionState::GameOver;
            return StateChange::GameOver;
        }
        StateChange::PieceLocked { cleared_lines }
    }
}

fn absorb(result: Result<(), PieceCollisionError>) -> StateChange {
    match result {
        Ok(()) => StateChange::PieceMoved,
        Err(PieceCollisionError) => StateChange::Unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::board::Cell;

    fn seed(byte: u8) -> PieceSeed {
        serde_json::from_str(&format!("\"{}\"", format!("{byte:02x}").repeat(16))).unwrap()
    }

    fn seeded_session() -> GameSession {
        GameSession::with_seed(BoardSize::DEFAULT, seed(0x42))
    }

    #[test]
    fn tick_fires_one_gravity_step_per_full_interval() {
        let mut session = seeded_session();
        let y0 = session.falling_piece().y();

        // Level 1: 1000ms interval.
        assert_eq!(session.drop_interval(), Duration::from_millis(1000));
        assert_eq!(
            session.tick(Duration::from_millis(999)),
            StateChange::Unchanged
        );
        assert_eq!(session.falling_piece().y(), y0);

        assert_eq!(
            session.tick(Duration::from_millis(1)),
            StateChange::PieceMoved
        );
        assert_eq!(session.falling_piece().y(), y0 + 1);

        // A huge elapsed still fires a single step and resets the timer.
        assert_eq!(
            session.tick(Duration::from_secs(60)),
            StateChange::PieceMoved
        );
        assert_eq!(session.falling_piece().y(), y0 + 2);
        assert_eq!(
            session.tick(Duration::from_millis(1)),
            StateChange::Unchanged
        );
    }

    #[test]
    fn horizontal_moves_apply_or_reject_without_locking() {
        let mut session = seeded_session();
        let piece = session.falling_piece();

        assert_eq!(session.command(Command::MoveLeft), StateChange::PieceMoved);
        assert_eq!(session.falling_piece().x(), piece.x() - 1);

        // Grind into the left wall; the final rejections change nothing.
        for _ in 0..12 {
            session.command(Command::MoveLeft);
        }
        let pinned = session.falling_piece();
        assert_eq!(session.command(Command::MoveLeft), StateChange::Unchanged);
        assert_eq!(session.falling_piece(), pinned);
        assert!(session.session_state().is_playing());
    }

    #[test]
    fn soft_drop_on_a_resting_piece_locks_it() {
        let mut session = seeded_session();

        let mut outcome = StateChange::Unchanged;
        for _ in 0..=20 {
            outcome = session.command(Command::SoftDrop);
            if !outcome.is_piece_moved() {
                break;
            }
        }
        assert_eq!(outcome, StateChange::PieceLocked { cleared_lines: 0 });
        assert_eq!(session.stats().completed_pieces(), 1);
        assert!(
            session
                .board()
                .rows()
                .flatten()
                .any(|cell| !cell.is_empty())
        );
    }

    #[test]
    fn hard_drop_locks_at_the_floor_and_pays_two_per_cell() {
        let mut session = seeded_session();
        let piece = session.falling_piece();
        let lowest = piece.cells().iter().map(|&(_, y)| y).max().unwrap();
        let expected_descent = 19 - lowest;

        let outcome = session.command(Command::HardDrop);
        assert_eq!(outcome, StateChange::PieceLocked { cleared_lines: 0 });
        assert_eq!(
            session.score(),
            2 * usize::try_from(expected_descent).unwrap()
        );

        // The piece rests on the floor: its former cells, shifted down by the
        // descent, are now settled.
        for (x, y) in piece.cells() {
            assert!(session.board().is_occupied(x, y + expected_descent));
        }
    }

    #[test]
    fn completing_a_row_scores_and_shifts() {
        let mut session = seeded_session();

        // Bottom row filled except column 9; a vertical I in that column
        // finishes it.
        *session.field.board_mut() = {
            let mut art = String::new();
            for _ in 0..19 {
                art.push_str("..........\n");
            }
            art.push_str("JJJJJJJJJ.\n");
            Board::from_ascii(&art)
        };
        session
            .field
            .set_falling_piece(Piece::at(PieceKind::I, 1, 7, 16))
            .unwrap();

        // The piece already rests on the floor, so one soft drop locks it.
        let outcome = session.command(Command::SoftDrop);
        assert_eq!(outcome, StateChange::PieceLocked { cleared_lines: 1 });
        assert_eq!(session.lines(), 1);
        assert_eq!(session.score(), 100 * session.level());

        // The matched row is gone; the three leftover I cells dropped one row
        // onto the floor, and the top row is empty.
        assert!(
            session
                .board()
                .rows()
                .next()
                .unwrap()
                .iter()
                .all(|cell| cell.is_empty())
        );
        assert_eq!(session.board().cell(9, 19), Cell::Piece(PieceKind::I));
        assert_eq!(session.board().cell(9, 17), Cell::Piece(PieceKind::I));
        assert_eq!(session.board().cell(0, 19), Cell::Empty);
    }

    #[test]
    fn rotation_against_the_wall_is_rejected_without_a_kick() {
        let mut session = seeded_session();

        // Vertical I hugging the left wall: its occupied column is x + 2, so
        // the anchor sits at -2. Rotating to horizontal would reach columns
        // -2 and -1.
        session
            .field
            .set_falling_piece(Piece::at(PieceKind::I, 1, -2, 5))
            .unwrap();

        assert_eq!(session.command(Command::Rotate), StateChange::Unchanged);
        let piece = session.falling_piece();
        assert_eq!(piece.rotation(), 1);
        assert_eq!(piece.x(), -2);
    }

    #[test]
    fn blocked_spawn_ends_the_session() {
        let mut session = seeded_session();

        // Park the falling piece, then choke the spawn rows in the center.
        while session.try_soft_drop().is_ok() {}
        let mut art = String::from("..TTTTTT..\n..TTTTTT..\n");
        for _ in 0..18 {
            art.push_str("..........\n");
        }
        *session.field.board_mut() = Board::from_ascii(&art);

        assert_eq!(session.command(Command::SoftDrop), StateChange::GameOver);
        assert!(session.session_state().is_game_over());

        // Terminal: gravity and every non-restart command are ignored, and
        // the final score stays readable.
        let board = session.board().clone();
        let score = session.score();
        assert_eq!(session.tick(Duration::from_secs(10)), StateChange::Unchanged);
        assert_eq!(session.command(Command::MoveLeft), StateChange::Unchanged);
        assert_eq!(session.command(Command::Rotate), StateChange::Unchanged);
        assert_eq!(session.command(Command::HardDrop), StateChange::Unchanged);
        assert_eq!(session.command(Command::TogglePause), StateChange::Unchanged);
        assert!(session.session_state().is_game_over());
        assert_eq!(session.board(), &board);
        assert_eq!(session.score(), score);
    }

    #[test]
    fn restart_leaves_game_over_with_a_clean_slate() {
        let mut session = seeded_session();
        while session.try_soft_drop().is_ok() {}
        let mut art = String::from("..TTTTTT..\n..TTTTTT..\n");
        for _ in 0..18 {
            art.push_str("..........\n");
        }
        *session.field.board_mut() = Board::from_ascii(&art);
        session.command(Command::SoftDrop);
        assert!(session.session_state().is_game_over());

        session.command(Command::Restart);
        assert!(session.session_state().is_playing());
        assert_eq!(session.score(), 0);
        assert_eq!(session.lines(), 0);
        assert_eq!(session.level(), 1);
        assert!(
            session
                .board()
                .rows()
                .flatten()
                .all(|cell| cell.is_empty())
        );
        assert_eq!(session.falling_piece().y(), 0);
    }

    #[test]
    fn pause_freezes_time_and_commands() {
        let mut session = seeded_session();
        let piece = session.falling_piece();

        session.command(Command::TogglePause);
        assert!(session.session_state().is_paused());

        assert_eq!(session.tick(Duration::from_secs(5)), StateChange::Unchanged);
        assert_eq!(session.command(Command::MoveLeft), StateChange::Unchanged);
        assert_eq!(session.command(Command::HardDrop), StateChange::Unchanged);
        assert_eq!(session.falling_piece(), piece);

        // Unpause resumes exactly where the game left off.
        session.command(Command::TogglePause);
        assert!(session.session_state().is_playing());
        assert_eq!(session.falling_piece(), piece);
    }

    #[test]
    fn restart_works_while_paused() {
        let mut session = seeded_session();
        session.command(Command::HardDrop);
        session.command(Command::TogglePause);

        session.command(Command::Restart);
        assert!(session.session_state().is_playing());
        assert_eq!(session.stats().completed_pieces(), 0);
    }

    #[test]
    fn faster_levels_shorten_the_tick_cadence() {
        let mut session = seeded_session();
        // Pretend 10 lines were cleared earlier in the session.
        for _ in 0..5 {
            session.stats.complete_piece_drop(2);
        }
        assert_eq!(session.level(), 2);

        let y0 = session.falling_piece().y();
        assert_eq!(
            session.tick(Duration::from_millis(949)),
            StateChange::Unchanged
        );
        assert_eq!(
            session.tick(Duration::from_millis(1)),
            StateChange::PieceMoved
        );
        assert_eq!(session.falling_piece().y(), y0 + 1);
    }
}
