/// The player cursor and its movement rules.
///
/// Movement is instantaneous and bounded by the map rectangle: a move
/// that would leave `[0, width-1] × [0, height-1]` is rejected without
/// touching the position. Word blocks never block movement, they are
/// only queried (which word is the cursor on, and where inside it).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::map::{Block, MapLayout, Position};

/// vim motion keys: h=left, j=down, k=up, l=right.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Direction {
    Left,
    Down,
    Up,
    Right,
}

impl Direction {
    pub fn from_key(key: char) -> Option<Direction> {
        match key {
            'h' => Some(Direction::Left),
            'j' => Some(Direction::Down),
            'k' => Some(Direction::Up),
            'l' => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn key(self) -> char {
        match self {
            Direction::Left => 'h',
            Direction::Down => 'j',
            Direction::Up => 'k',
            Direction::Right => 'l',
        }
    }
}

/// vim editing mode shown in the status bar.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Normal,
    Insert,
    Visual,
    Command,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Insert => "INSERT",
            Mode::Visual => "VISUAL",
            Mode::Command => "COMMAND",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MoveOutcome {
    pub success: bool,
    pub position: Position,
    pub direction: Direction,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("Invalid movement key: {key}")]
#[allow(dead_code)]
pub struct InvalidMove {
    pub key: char,
    pub position: Position,
}

pub const DEFAULT_MOVEMENT_SPEED_MS: u64 = 150;

#[derive(Clone, Debug)]
pub struct Player {
    pub x: usize,
    pub y: usize,
    pub mode: Mode,
    map: MapLayout,
    history: Vec<Direction>,
    movement_speed_ms: u64,
}

impl Player {
    pub fn new(start: Position, map: MapLayout) -> Self {
        Player {
            x: start.x,
            y: start.y,
            mode: Mode::Normal,
            map,
            history: Vec::new(),
            movement_speed_ms: DEFAULT_MOVEMENT_SPEED_MS,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    #[allow(dead_code)]
    pub fn set_position(&mut self, x: usize, y: usize) {
        self.x = x;
        self.y = y;
    }

    pub fn map(&self) -> &MapLayout {
        &self.map
    }

    /// Move one cell. Blocked moves report `success: false` and leave the
    /// cursor where it was.
    pub fn step(&mut self, direction: Direction) -> MoveOutcome {
        let target = match direction {
            Direction::Left => self.x.checked_sub(1).map(|x| (x, self.y)),
            Direction::Up => self.y.checked_sub(1).map(|y| (self.x, y)),
            Direction::Right => {
                if self.x + 1 < self.map.width { Some((self.x + 1, self.y)) } else { None }
            }
            Direction::Down => {
                if self.y + 1 < self.map.height { Some((self.x, self.y + 1)) } else { None }
            }
        };

        let success = match target {
            Some((x, y)) => {
                self.x = x;
                self.y = y;
                self.history.push(direction);
                true
            }
            None => false,
        };

        MoveOutcome { success, position: self.position(), direction }
    }

    /// Move by raw key. Anything other than h/j/k/l is an `InvalidMove`.
    #[allow(dead_code)]
    pub fn move_key(&mut self, key: char) -> Result<MoveOutcome, InvalidMove> {
        match Direction::from_key(key) {
            Some(dir) => Ok(self.step(dir)),
            None => Err(InvalidMove { key, position: self.position() }),
        }
    }

    #[allow(dead_code)]
    pub fn history(&self) -> &[Direction] {
        &self.history
    }

    #[allow(dead_code)]
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    #[allow(dead_code)]
    pub fn current_block(&self) -> Option<&Block> {
        self.map.blocks.iter().find(|b| b.contains(self.x, self.y))
    }

    #[allow(dead_code)]
    pub fn is_on_block(&self) -> bool {
        self.current_block().is_some()
    }

    /// Column offset inside the current word, or -1 off-word.
    #[allow(dead_code)]
    pub fn char_position_in_block(&self) -> i64 {
        match self.current_block() {
            Some(b) => (self.x - b.x) as i64,
            None => -1,
        }
    }

    /// Animation pacing for the view. Has no effect on `step`.
    #[allow(dead_code)]
    pub fn movement_speed_ms(&self) -> u64 {
        self.movement_speed_ms
    }

    pub fn set_movement_speed_ms(&mut self, ms: u64) {
        self.movement_speed_ms = ms;
    }
}
