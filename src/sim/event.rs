/// Events emitted by a play session.
/// The shell drains these every frame for screen changes and sound.

use crate::domain::map::Position;

/// Summary handed to the shell when a level ends.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct LevelSummary {
    pub score: i64,
    pub level: u32,
    pub coins_collected: usize,
    pub total_coins: usize,
    pub time_remaining: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    CoinCollected { index: usize, x: usize, y: usize },
    MoveBlocked { at: Position },
    CommandExecuted { message: String },
    CommandFailed { error: String },
    LevelWon(LevelSummary),
    LevelLost(LevelSummary),
    QuitRequested,
}
