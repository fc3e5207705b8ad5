use std::time::Duration;

/// Score values for line clears.
///
/// Indexed by the number of lines cleared simultaneously; the table value is
/// multiplied by the level in effect after the clear. Only 0-4 simultaneous
/// clears have defined values.
const SCORE_TABLE: [usize; 5] = [0, 100, 300, 500, 800];

/// Score, cleared-line count, and the values derived from them.
///
/// The level is `lines / 10 + 1` and the gravity interval is
/// `max(100, 1000 - (level - 1) * 50)` milliseconds, so the game speeds up by
/// 50ms every 10 lines and bottoms out at 100ms from level 19 on.
///
/// # Example
///
/// ```
/// use gravitris_engine::GameStats;
///
/// let mut stats = GameStats::new();
/// stats.complete_piece_drop(4);
///
/// assert_eq!(stats.score(), 800);
/// assert_eq!(stats.total_cleared_lines(), 4);
/// assert_eq!(stats.level(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GameStats {
    score: usize,
    total_cleared_lines: usize,
    completed_pieces: usize,
}

impl GameStats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            score: 0,
            total_cleared_lines: 0,
            completed_pieces: 0,
        }
    }

    #[must_use]
    pub const fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub const fn total_cleared_lines(&self) -> usize {
        self.total_cleared_lines
    }

    /// Total number of pieces locked into place.
    #[must_use]
    pub const fn completed_pieces(&self) -> usize {
        self.completed_pieces
    }

    /// Current level: starts at 1, up one per 10 cleared lines.
    #[must_use]
    pub const fn level(&self) -> usize {
        self.total_cleared_lines / 10 + 1
    }

    /// Time between gravity steps at the current level.
    #[must_use]
    pub fn drop_interval(&self) -> Duration {
        Duration::from_millis(drop_interval_millis(self.level()))
    }

    /// Updates the counters after a piece locks.
    ///
    /// The cleared-line total (and with it the level) moves first, so the
    /// points for this clear are scaled by the level the clear produced.
    pub fn complete_piece_drop(&mut self, cleared_lines: usize) {
        self.completed_pieces += 1;
        self.total_cleared_lines += cleared_lines;
        if let Some(points) = SCORE_TABLE.get(cleared_lines) {
            self.score += points * self.level();
        }
    }

    /// Awards the hard-drop bonus: 2 points per cell descended, regardless of
    /// level.
    pub fn add_descent_bonus(&mut self, cells: usize) {
        self.score += 2 * cells;
    }
}

fn drop_interval_millis(level: usize) -> u64 {
    let speedup = u64::try_from(level.saturating_sub(1)).unwrap_or(u64::MAX);
    100 + 900u64.saturating_sub(speedup.saturating_mul(50))
}
