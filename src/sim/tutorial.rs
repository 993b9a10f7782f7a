/// Tutorial level 0: "How to Quit Vim".
///
/// No map and no clock. The player has to type `:q` (or `:quit`) once;
/// completion is remembered in the save blob so later launches skip it.

use crate::error::GameResult;
use crate::sim::save::{BlobStore, SaveManager};

pub const TITLE: &str = "Tutorial Level 0: How to Quit Vim";

pub const INSTRUCTIONS: &str = "\
Welcome to Vim Motions Arcade!

Before you begin your journey mastering vim motions,
you must first learn the most important command of all:

How to quit vim.

╔════════════════════════════════════════╗
║  Type :q and press Enter to continue   ║
╚════════════════════════════════════════╝

(Press : to enter command mode, then type q and press Enter)";

pub const HINT: &str = "Hint: Press : (colon) to enter command mode, then type \"q\" and press Enter";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NextAction {
    MainMenu,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TutorialResponse {
    pub completed: bool,
    pub message: String,
    pub next_action: Option<NextAction>,
}

#[derive(Clone, Debug, Default)]
pub struct TutorialLevel {
    completed: bool,
}

impl TutorialLevel {
    /// Completion status as recorded in the save blob.
    pub fn load<S: BlobStore>(saves: &SaveManager<S>) -> Self {
        TutorialLevel { completed: saves.tutorial_completed() }
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Judge one command line (without the leading colon).
    pub fn handle_command(&self, command: &str) -> TutorialResponse {
        match command.trim().to_lowercase().as_str() {
            "q" | "quit" => TutorialResponse {
                completed: true,
                message: "Success! You've learned how to quit vim. You're ready to begin your journey!".into(),
                next_action: Some(NextAction::MainMenu),
            },
            "help" => TutorialResponse {
                completed: false,
                message: "To complete this tutorial, type :q and press Enter".into(),
                next_action: None,
            },
            _ => TutorialResponse {
                completed: false,
                message: format!("Unknown command: {}. Try :q to quit, or :help for assistance.", command),
                next_action: None,
            },
        }
    }

    pub fn mark_complete<S: BlobStore>(&mut self, saves: &SaveManager<S>) -> GameResult<()> {
        self.completed = true;
        saves.set_tutorial_completed(true)
    }

    #[allow(dead_code)]
    pub fn reset<S: BlobStore>(&mut self, saves: &SaveManager<S>) -> GameResult<()> {
        self.completed = false;
        saves.set_tutorial_completed(false)
    }
}
