/// Application shell: screens, menus, persistence and the play session.
///
/// `Shell` owns every collaborator; `App` pairs it with the
/// `ScreenManager` whose callbacks receive the shell by `&mut`.
///
/// ## Key routing
///   - main menu, tutorial pending: tutorial command line only
///   - main menu: command line when open, otherwise the list navigator
///   - playing: the coordinator (movement or its own command line)
///   - level complete / failed: Enter continues, Esc goes to the menu
///
/// ## Persistence
///   - level won: progress saved (continue starts the next level)
///   - `:q` mid-level: snapshot + map seed saved (continue resumes it)
///   - level lost: save cleared, score offered to the leaderboard

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::config::Config;
use crate::error::GameResult;
use crate::sim::coordinator::GameCoordinator;
use crate::sim::event::{GameEvent, LevelSummary};
use crate::sim::leaderboard::{Leaderboard, RankedEntry, ScoreEntry, MAX_SCORES};
use crate::sim::save::{FileBlobStore, SaveManager};
use crate::sim::screen::{Screen, ScreenManager};
use crate::sim::state::GameState;
use crate::sim::tutorial::{NextAction, TutorialLevel};
use crate::sim::view::RenderTarget;
use crate::ui::command::{CommandAction, CommandMode, CommandResult, CommandTable};
use crate::ui::menu::{MenuInput, MenuNavigator};
use crate::ui::renderer::{DebugInfo, Frame, MenuFrame, PlayingFrame, ResultFrame, TutorialFrame};
use crate::ui::scene::{Feedback, Scene};

/// How a finished level is shown, and what Enter does next.
struct LevelResult {
    summary: LevelSummary,
    /// Finished state a won level advances from.
    finished: Option<GameState>,
    rank: Option<usize>,
    top_scores: Vec<RankedEntry>,
}

pub struct Shell {
    config: Config,
    saves: SaveManager<FileBlobStore>,
    leaderboard: Leaderboard<FileBlobStore>,
    tutorial: TutorialLevel,
    tutorial_line: CommandMode,
    coordinator: GameCoordinator<Scene>,
    menu: MenuNavigator,
    menu_command: CommandMode,
    feedback: Option<Feedback>,
    top_scores: Vec<RankedEntry>,
    result: Option<LevelResult>,
    viewport: RenderTarget,
    exit_requested: bool,
}

pub struct App {
    screens: ScreenManager<Shell>,
    shell: Shell,
}

impl App {
    pub fn new(config: Config, store: FileBlobStore, viewport: RenderTarget) -> Self {
        let saves = SaveManager::new(store.clone());
        let leaderboard = Leaderboard::new(store);
        let tutorial = TutorialLevel::load(&saves);

        let save_check = saves.clone();
        let menu_command = CommandMode::new(CommandTable::menu(move || save_check.has_game()));
        let coordinator = GameCoordinator::new(
            config.coordinator_settings(),
            Box::new(config.map_generator()),
            Scene::new(),
        );

        let shell = Shell {
            config,
            saves,
            leaderboard,
            tutorial,
            tutorial_line: CommandMode::new(CommandTable::new()),
            coordinator,
            menu: MenuNavigator::main_menu(),
            menu_command,
            feedback: None,
            top_scores: vec![],
            result: None,
            viewport,
            exit_requested: false,
        };

        let mut screens = ScreenManager::new();
        screens.on_screen_enter(Screen::MainMenu, |shell: &mut Shell| shell.enter_menu());
        screens.on_screen_exit(Screen::MainMenu, |shell: &mut Shell| shell.leave_menu());
        screens.on_screen_exit(Screen::LevelComplete, |shell: &mut Shell| shell.result = None);
        screens.on_screen_exit(Screen::LevelFailed, |shell: &mut Shell| shell.result = None);

        let mut app = App { screens, shell };
        // The manager starts on the menu without running its enter hooks
        app.shell.enter_menu();
        if !app.shell.tutorial.is_completed() {
            log::info!("first launch, showing tutorial");
        }
        app
    }

    #[allow(dead_code)]
    pub fn current_screen(&self) -> Screen {
        self.screens.current()
    }

    pub fn in_tutorial(&self) -> bool {
        self.screens.current() == Screen::MainMenu && !self.shell.tutorial.is_completed()
    }

    pub fn should_exit(&self) -> bool {
        self.shell.exit_requested
    }

    /// Terminal size changed: new games and the live scene use `target`.
    pub fn set_viewport(&mut self, target: RenderTarget) {
        if self.shell.viewport == target {
            return;
        }
        self.shell.viewport = target;
        if self.shell.coordinator.game_state().is_some() {
            self.shell.coordinator.view_mut().resize(target);
        }
    }

    fn go(&mut self, next: Screen) {
        self.screens.switch_to(next, &mut self.shell);
        if next == Screen::Playing {
            // Leaving the game by any route tears the session down
            self.screens.register_cleanup(|shell: &mut Shell| shell.coordinator.cleanup());
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Per-frame driving
    // ══════════════════════════════════════════════════════════════

    pub fn handle_key(&mut self, key: &KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        let next = match self.screens.current() {
            Screen::MainMenu if !self.shell.tutorial.is_completed() => self.shell.tutorial_key(key),
            Screen::MainMenu => self.shell.menu_key(key),
            Screen::Playing => {
                self.shell.coordinator.handle_key(key);
                None
            }
            Screen::LevelComplete => self.shell.level_complete_key(key),
            Screen::LevelFailed => self.shell.level_failed_key(key),
        };
        if let Some(next) = next {
            self.go(next);
        }
    }

    /// Advance the live session against wall-clock time and react to
    /// what happened. Returns the events for sound.
    pub fn update(&mut self) -> Vec<GameEvent> {
        self.step(None)
    }

    fn step(&mut self, delta_ms: Option<f64>) -> Vec<GameEvent> {
        if self.screens.current() == Screen::Playing {
            match delta_ms {
                Some(delta) => self.shell.coordinator.tick(delta),
                None => self.shell.coordinator.frame(),
            };
        }
        let events = self.shell.coordinator.drain_events();
        for event in &events {
            if let Some(next) = self.shell.on_game_event(event) {
                self.go(next);
            }
        }
        events
    }

    /// Save a live level before the process goes away.
    pub fn shutdown(&mut self) {
        if self.screens.current() == Screen::Playing && self.shell.coordinator.is_running() {
            self.shell.save_snapshot();
        }
        self.shell.coordinator.cleanup();
    }

    /// JSON snapshot of the live game state. Debug builds of the config only.
    pub fn inspect(&self) -> Option<String> {
        if !self.shell.config.general.debug {
            return None;
        }
        let state = self.shell.coordinator.game_state()?;
        match state.to_json() {
            Ok(json) => Some(json),
            Err(e) => {
                log::warn!("inspect failed: {}", e);
                None
            }
        }
    }

    pub fn frame(&self) -> Frame<'_> {
        let shell = &self.shell;
        match self.screens.current() {
            Screen::MainMenu if self.in_tutorial() => Frame::Tutorial(TutorialFrame {
                command_line: active_line(&shell.tutorial_line),
                feedback: shell.feedback.as_ref(),
            }),
            Screen::MainMenu => shell.menu_frame(),
            Screen::Playing => {
                let state = shell.coordinator.game_state();
                Frame::Playing(PlayingFrame {
                    scene: shell.coordinator.view(),
                    level: state.map_or(0, |s| s.level.current),
                    health: state.map_or(0, |s| s.health),
                    debug: shell.config.general.debug.then(|| DebugInfo {
                        fps: shell.coordinator.average_fps(),
                        seed: shell.coordinator.seed(),
                    }),
                })
            }
            Screen::LevelComplete | Screen::LevelFailed => {
                let Some(r) = shell.result.as_ref() else {
                    return shell.menu_frame();
                };
                let frame = ResultFrame { summary: &r.summary, rank: r.rank, top_scores: &r.top_scores };
                if self.screens.current() == Screen::LevelComplete {
                    Frame::LevelComplete(frame)
                } else {
                    Frame::LevelFailed(frame)
                }
            }
        }
    }
}

fn active_line(cmd: &CommandMode) -> Option<&str> {
    cmd.is_active().then(|| cmd.buffer())
}

enum LineEdit {
    Editing,
    Submitted(String),
    Cancelled,
    Ignored,
}

/// Shared line editing for the menu and tutorial command lines.
fn edit_line(cmd: &mut CommandMode, key: &KeyEvent) -> LineEdit {
    match key.code {
        KeyCode::Esc => {
            cmd.cancel();
            LineEdit::Cancelled
        }
        KeyCode::Enter => {
            let text = cmd.buffer().to_string();
            cmd.deactivate();
            LineEdit::Submitted(text)
        }
        KeyCode::Backspace if cmd.buffer().is_empty() => {
            cmd.cancel();
            LineEdit::Cancelled
        }
        KeyCode::Backspace => {
            cmd.backspace();
            LineEdit::Editing
        }
        KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            cmd.add_char(c);
            LineEdit::Editing
        }
        _ => LineEdit::Ignored,
    }
}

impl Shell {
    // ── Screen hooks ──

    fn enter_menu(&mut self) {
        self.menu_command.deactivate();
        self.tutorial_line.deactivate();
        self.menu.enable();
        self.menu.set_item_enabled(CommandAction::ContinueGame, self.saves.has_game());
        self.top_scores = self.leaderboard.top_scores(MAX_SCORES);
    }

    fn leave_menu(&mut self) {
        self.menu_command.deactivate();
        self.feedback = None;
    }

    fn menu_frame(&self) -> Frame<'_> {
        Frame::Menu(MenuFrame {
            items: self.menu.items(),
            selected: self.menu.selected(),
            navigable: self.menu.is_enabled(),
            command_line: active_line(&self.menu_command),
            feedback: self.feedback.as_ref(),
            top_scores: &self.top_scores,
        })
    }

    fn set_feedback(&mut self, message: impl Into<String>, is_error: bool) {
        let message = message.into();
        self.feedback = if message.is_empty() { None } else { Some(Feedback { message, is_error }) };
    }

    // ── Tutorial ──

    fn tutorial_key(&mut self, key: &KeyEvent) -> Option<Screen> {
        if !self.tutorial_line.is_active() {
            if let KeyCode::Char(c) = key.code {
                self.tutorial_line.try_activate(c);
            }
            return None;
        }
        let LineEdit::Submitted(text) = edit_line(&mut self.tutorial_line, key) else {
            return None;
        };

        let response = self.tutorial.handle_command(&text);
        self.set_feedback(response.message.as_str(), !response.completed && text.trim() != "help");
        if response.completed {
            if let Err(e) = self.tutorial.mark_complete(&self.saves) {
                log::warn!("could not record tutorial completion: {}", e);
            }
            log::info!("tutorial completed");
        }
        if response.next_action == Some(NextAction::MainMenu) {
            self.enter_menu();
        }
        None
    }

    // ── Main menu ──

    fn menu_key(&mut self, key: &KeyEvent) -> Option<Screen> {
        if self.menu_command.is_active() {
            let edit = edit_line(&mut self.menu_command, key);
            if matches!(edit, LineEdit::Submitted(_) | LineEdit::Cancelled) {
                self.menu.enable();
            }
            return match edit {
                LineEdit::Submitted(text) => {
                    let result = self.menu_command.execute_command(&text);
                    self.apply_menu_result(result)
                }
                _ => None,
            };
        }

        if let KeyCode::Char(c) = key.code {
            if self.menu_command.try_activate(c) {
                self.menu.disable();
                self.feedback = None;
                return None;
            }
        }

        match self.menu.handle_key(key) {
            MenuInput::Activated(_) => {
                // The list is a shortcut for the same command table
                let verb = self.menu.selected_item()?.command.trim_start_matches(':').to_string();
                let result = self.menu_command.execute_command(&verb);
                self.apply_menu_result(result)
            }
            MenuInput::Moved | MenuInput::Ignored => None,
        }
    }

    fn apply_menu_result(&mut self, result: CommandResult) -> Option<Screen> {
        match result {
            CommandResult::Failed(error) => {
                log::debug!("menu command rejected: {}", error);
                self.set_feedback(error, true);
                None
            }
            CommandResult::Ok { action, message } => {
                self.set_feedback(message.unwrap_or_default(), false);
                self.perform(action?)
            }
        }
    }

    fn perform(&mut self, action: CommandAction) -> Option<Screen> {
        let started = match action {
            CommandAction::NewGame => {
                if let Err(e) = self.saves.clear_game() {
                    log::warn!("could not clear save: {}", e);
                }
                self.coordinator.start_new_game(&self.viewport, 1)
            }
            CommandAction::ContinueGame => self.continue_game(),
            CommandAction::Exit => {
                self.exit_requested = true;
                return None;
            }
            CommandAction::ShowHelp | CommandAction::Quit => return None,
        };
        match started {
            Ok(()) => Some(Screen::Playing),
            Err(e) => {
                log::error!("could not start game: {}", e);
                self.set_feedback(format!("Could not start game: {}", e), true);
                None
            }
        }
    }

    fn continue_game(&mut self) -> GameResult<()> {
        let blob = self.saves.load().unwrap_or_default();
        let Some(state) = blob.game else {
            // `:edit` already checked, but the file may have changed since
            self.set_feedback("No saved game found", true);
            return self.coordinator.start_new_game(&self.viewport, 1);
        };
        if state.is_level_complete {
            return self.coordinator.advance_level(&self.viewport, state);
        }
        match blob.map_seed {
            Some(seed) => self.coordinator.resume_game(&self.viewport, state, seed),
            None => self.coordinator.start_new_game(&self.viewport, state.level.current),
        }
    }

    // ── Level results ──

    fn level_complete_key(&mut self, key: &KeyEvent) -> Option<Screen> {
        match key.code {
            KeyCode::Enter => {
                let finished = self.result.as_ref()?.finished.clone()?;
                match self.coordinator.advance_level(&self.viewport, finished) {
                    Ok(()) => Some(Screen::Playing),
                    Err(e) => {
                        log::error!("could not start next level: {}", e);
                        Some(Screen::MainMenu)
                    }
                }
            }
            KeyCode::Esc => Some(Screen::MainMenu),
            _ => None,
        }
    }

    fn level_failed_key(&mut self, key: &KeyEvent) -> Option<Screen> {
        match key.code {
            KeyCode::Enter => match self.coordinator.start_new_game(&self.viewport, 1) {
                Ok(()) => Some(Screen::Playing),
                Err(e) => {
                    log::error!("could not restart: {}", e);
                    Some(Screen::MainMenu)
                }
            },
            KeyCode::Esc => Some(Screen::MainMenu),
            _ => None,
        }
    }

    // ── Session events ──

    fn on_game_event(&mut self, event: &GameEvent) -> Option<Screen> {
        match event {
            GameEvent::LevelWon(summary) => {
                log::info!("level {} won with {} points", summary.level, summary.score);
                let finished = self.coordinator.snapshot().ok();
                if let Some(state) = &finished {
                    if let Err(e) = self.saves.save_game(state, None) {
                        log::warn!("could not save progress: {}", e);
                    }
                }
                self.result = Some(LevelResult { summary: *summary, finished, rank: None, top_scores: vec![] });
                Some(Screen::LevelComplete)
            }
            GameEvent::LevelLost(summary) => {
                log::info!("level {} lost with {} points", summary.level, summary.score);
                let rank = self.leaderboard.rank_for_score(summary.score);
                self.leaderboard.add_score(ScoreEntry::now(summary.score, summary.level));
                if let Err(e) = self.saves.clear_game() {
                    log::warn!("could not clear save: {}", e);
                }
                self.result = Some(LevelResult {
                    summary: *summary,
                    finished: None,
                    rank: (rank <= MAX_SCORES).then_some(rank),
                    top_scores: self.leaderboard.top_scores(MAX_SCORES),
                });
                Some(Screen::LevelFailed)
            }
            GameEvent::QuitRequested => {
                self.save_snapshot();
                self.set_feedback("Game saved. Type :edit to continue.", false);
                Some(Screen::MainMenu)
            }
            _ => None,
        }
    }

    fn save_snapshot(&mut self) {
        let result = self
            .coordinator
            .snapshot()
            .and_then(|state| self.saves.save_game(&state, self.coordinator.seed()));
        match result {
            Ok(()) => log::info!("mid-level snapshot saved"),
            Err(e) => log::warn!("could not save snapshot: {}", e),
        }
    }
}
