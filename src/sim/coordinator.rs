/// GameCoordinator: one playthrough, wired together.
///
/// ## Ownership
/// The coordinator owns the only `GameState` of the live session, the
/// `Player` that judges movement, the loop, the input manager and the
/// command line. The view is a sink it pushes snapshots into.
///
/// ## Focus
/// Exactly one of {movement, command line} holds the keyboard:
///   - `:` pauses the level clock and hands focus to `CommandMode`
///   - Enter/Esc hand it back and resume
///   - while focus is `Command`, no key reaches `handle_movement`
///
/// ## Pause vs. stop
///   - command line open: loop keeps rendering, level clock frozen
///   - `pause()`: loop stopped and input disabled, always together

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::map::{LayoutGenerator, MapLayout, Position};
use crate::domain::player::{Direction, Mode, Player};
use crate::error::{GameError, GameResult};
use crate::sim::event::{GameEvent, LevelSummary};
use crate::sim::game_loop::{GameLoop, LevelOutcome, LoopHooks};
use crate::sim::state::{Coin, GameState, DEFAULT_HEALTH, DEFAULT_LEVEL_TIME};
use crate::sim::view::{GameView, RenderTarget};
use crate::ui::command::{CommandAction, CommandMode, CommandResult};
use crate::ui::input::{InputAction, InputHandler, InputManager};

/// Where a fresh level drops the cursor, clamped to the map.
const START_POSITION: Position = Position { x: 5, y: 5 };

#[derive(Clone, Debug)]
pub struct CoordinatorSettings {
    pub coin_value: i64,
    pub level_time_secs: f64,
    pub start_health: u32,
    pub movement_speed_ms: u64,
    /// Fixed base seed for deterministic maps; random when `None`.
    pub seed: Option<u64>,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        CoordinatorSettings {
            coin_value: 10,
            level_time_secs: DEFAULT_LEVEL_TIME,
            start_health: DEFAULT_HEALTH,
            movement_speed_ms: 150,
            seed: None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Focus {
    Movement,
    Command,
}

struct Session {
    state: GameState,
    player: Player,
    game_loop: GameLoop,
    input: InputManager,
    command: CommandMode,
    focus: Focus,
    seed: u64,
    /// Accepting movement; false once the level is decided or paused.
    active: bool,
}

pub struct GameCoordinator<V: GameView> {
    settings: CoordinatorSettings,
    generator: Box<dyn LayoutGenerator>,
    view: V,
    session: Option<Session>,
    events: Vec<GameEvent>,
}

impl<V: GameView> GameCoordinator<V> {
    pub fn new(settings: CoordinatorSettings, generator: Box<dyn LayoutGenerator>, view: V) -> Self {
        GameCoordinator {
            settings,
            generator,
            view,
            session: None,
            events: Vec::new(),
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Session lifecycle
    // ══════════════════════════════════════════════════════════════

    /// Fresh playthrough at `level`: new state, new map, new loop.
    pub fn start_new_game(&mut self, target: &RenderTarget, level: u32) -> GameResult<()> {
        target.validate()?;
        check_level(level)?;
        let mut state = GameState::new();
        state.update_health(self.settings.start_health as i64);
        self.start_level(target, level, state)
    }

    /// Next level for a finished state. Score, health and unlocks carry over.
    pub fn advance_level(&mut self, target: &RenderTarget, finished: GameState) -> GameResult<()> {
        target.validate()?;
        let next = finished.level.current + 1;
        self.start_level(target, next, finished)
    }

    /// Pick a saved mid-level snapshot back up. The map is regenerated
    /// from `seed`, everything else comes from `state` as saved.
    pub fn resume_game(&mut self, target: &RenderTarget, mut state: GameState, seed: u64) -> GameResult<()> {
        target.validate()?;
        check_level(state.level.current)?;
        self.cleanup();

        let map = self.generator.generate(state.level.current, seed);
        let x = state.player.x.min(map.width.saturating_sub(1));
        let y = state.player.y.min(map.height.saturating_sub(1));
        state.update_player_position(x, y);
        state.update_player_mode(Mode::Normal);
        state.resume();
        if !state.timer.is_expired() {
            state.timer.start();
        }

        log::info!("resuming level {} at ({}, {})", state.level.current, x, y);
        self.install(target, state, map, seed);
        Ok(())
    }

    fn start_level(&mut self, target: &RenderTarget, level: u32, mut state: GameState) -> GameResult<()> {
        self.cleanup();

        let seed = self.level_seed(level);
        let map = self.generator.generate(level, seed);
        let coins = map.coin_positions.iter().map(|p| Coin::at(*p)).collect();
        state.initialize_level(level, coins);
        state.update_timer(self.settings.level_time_secs);
        state.update_player_mode(Mode::Normal);
        state.resume();

        let start = Position::new(
            START_POSITION.x.min(map.width.saturating_sub(1)),
            START_POSITION.y.min(map.height.saturating_sub(1)),
        );
        state.update_player_position(start.x, start.y);

        log::info!(
            "starting level {} (seed {}, {} coins, {}s)",
            level, seed, state.level.total_coins, self.settings.level_time_secs
        );
        self.install(target, state, map, seed);
        Ok(())
    }

    fn level_seed(&self, level: u32) -> u64 {
        match self.settings.seed {
            Some(base) => base.wrapping_add(level as u64),
            None => rand::random(),
        }
    }

    fn install(&mut self, target: &RenderTarget, state: GameState, map: MapLayout, seed: u64) {
        let mut player = Player::new(Position::new(state.player.x, state.player.y), map);
        player.set_movement_speed_ms(self.settings.movement_speed_ms);

        let view = &mut self.view;
        view.attach(*target);
        view.draw_map(player.map());
        view.draw_cursor(player.x, player.y);
        view.center_camera(player.x, player.y);
        view.draw_coins(&state.level.coins);
        view.hud_score(state.score);
        view.hud_timer(state.time_remaining());
        view.hud_mode(state.player.mode);
        view.hud_coins(state.level.collected_coins, state.level.total_coins);
        view.show_command_line(None);

        let mut input = InputManager::new();
        input.enable();

        let mut game_loop = GameLoop::new();
        game_loop.start();

        self.session = Some(Session {
            state,
            player,
            game_loop,
            input,
            command: CommandMode::with_builtins(),
            focus: Focus::Movement,
            seed,
            active: true,
        });
    }

    /// Stop the loop and input, wipe the view. Safe to repeat.
    pub fn cleanup(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        session.game_loop.stop();
        session.input.disable();
        session.command.deactivate();

        self.view.clear_map();
        self.view.clear_cursor();
        self.view.clear_coins();
        self.view.destroy_hud();
        log::debug!("session for level {} torn down", session.state.level.current);
    }

    /// Stop simulation and input together.
    pub fn pause(&mut self) {
        if let Some(s) = self.session.as_mut() {
            s.game_loop.stop();
            s.input.disable();
            s.active = false;
        }
    }

    /// Restart simulation and input together. A decided level stays stopped.
    #[allow(dead_code)]
    pub fn resume(&mut self) {
        if let Some(s) = self.session.as_mut() {
            if s.state.is_game_over || s.state.is_level_complete {
                return;
            }
            s.game_loop.start();
            s.input.enable();
            s.active = true;
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Loop driving
    // ══════════════════════════════════════════════════════════════

    /// Run the loop against wall-clock time.
    pub fn frame(&mut self) -> Option<LevelOutcome> {
        self.drive(|game_loop, state, hooks| game_loop.frame(state, hooks))
    }

    /// Run one loop iteration with a synthetic delta.
    pub fn tick(&mut self, delta_ms: f64) -> Option<LevelOutcome> {
        self.drive(|game_loop, state, hooks| game_loop.tick(delta_ms, state, hooks))
    }

    fn drive(
        &mut self,
        run: impl FnOnce(&mut GameLoop, &mut GameState, &mut SessionHooks<'_, V>) -> Option<LevelOutcome>,
    ) -> Option<LevelOutcome> {
        let session = self.session.as_mut()?;
        let mut hooks = SessionHooks {
            view: &mut self.view,
            events: &mut self.events,
            input: &mut session.input,
            active: &mut session.active,
        };
        run(&mut session.game_loop, &mut session.state, &mut hooks)
    }

    // ══════════════════════════════════════════════════════════════
    // Input
    // ══════════════════════════════════════════════════════════════

    /// Route one key to whoever holds focus. Returns true when consumed.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        let Some(focus) = self.focus() else {
            return false;
        };
        match focus {
            Focus::Command => self.handle_command_key(key),
            Focus::Movement => {
                let mut pending = PendingAction::default();
                let consumed = self.session.as_ref()
                    .map(|s| s.input.dispatch(key, &mut pending))
                    .unwrap_or(false);
                if !consumed {
                    return false;
                }
                match pending.0 {
                    Some(InputAction::Move(dir)) => self.handle_movement(dir),
                    Some(InputAction::EnterCommand) => self.enter_command_mode(),
                    Some(InputAction::Escape) | None => {}
                }
                true
            }
        }
    }

    /// Move the cursor. Player judges legality, GameState mirrors it.
    pub fn handle_movement(&mut self, direction: Direction) {
        let Some(s) = self.session.as_mut() else {
            return;
        };
        if !s.active || s.focus != Focus::Movement {
            return;
        }

        let outcome = s.player.step(direction);
        s.state.update_player_position(s.player.x, s.player.y);
        if !outcome.success {
            self.events.push(GameEvent::MoveBlocked { at: outcome.position });
        }

        self.check_coin_collection();

        let pos = outcome.position;
        self.view.draw_cursor(pos.x, pos.y);
        self.view.center_camera(pos.x, pos.y);
    }

    /// Collect every uncollected coin under the cursor. Repeat calls at
    /// the same spot change nothing.
    pub fn check_coin_collection(&mut self) {
        let Some(s) = self.session.as_mut() else {
            return;
        };
        let (x, y) = (s.state.player.x, s.state.player.y);
        let hits: Vec<usize> = s.state.level.coins
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.collected && c.is_at(x, y))
            .map(|(i, _)| i)
            .collect();

        let mut collected_any = false;
        for index in hits {
            if s.state.collect_coin(index) {
                s.state.add_score(self.settings.coin_value);
                self.events.push(GameEvent::CoinCollected { index, x, y });
                collected_any = true;
            }
        }

        if collected_any {
            self.view.draw_coins(&s.state.level.coins);
            self.view.hud_score(s.state.score);
            self.view.hud_coins(s.state.level.collected_coins, s.state.level.total_coins);
        }
    }

    fn enter_command_mode(&mut self) {
        let Some(s) = self.session.as_mut() else {
            return;
        };
        if !s.active {
            return;
        }
        s.game_loop.pause(&mut s.state);
        s.input.disable();
        s.command.activate();
        s.focus = Focus::Command;
        s.player.mode = Mode::Command;
        s.state.update_player_mode(s.player.mode);

        self.view.hud_mode(Mode::Command);
        self.view.show_command_line(Some(s.command.buffer()));
    }

    fn leave_command_mode(&mut self) {
        let Some(s) = self.session.as_mut() else {
            return;
        };
        s.command.deactivate();
        s.focus = Focus::Movement;
        s.player.mode = Mode::Normal;
        s.state.update_player_mode(s.player.mode);
        if s.active {
            s.input.enable();
            s.game_loop.resume(&mut s.state);
        }

        self.view.hud_mode(Mode::Normal);
        self.view.show_command_line(None);
    }

    fn handle_command_key(&mut self, key: &KeyEvent) -> bool {
        if key.kind == KeyEventKind::Release {
            return false;
        }
        let Some(s) = self.session.as_mut() else {
            return false;
        };

        match key.code {
            KeyCode::Esc => {
                self.leave_command_mode();
            }
            KeyCode::Enter => {
                let result = s.command.submit();
                self.leave_command_mode();
                self.apply_command_result(result);
            }
            KeyCode::Backspace if s.command.buffer().is_empty() => {
                self.leave_command_mode();
            }
            KeyCode::Backspace => {
                s.command.backspace();
                self.view.show_command_line(Some(s.command.buffer()));
            }
            KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                s.command.add_char(c);
                self.view.show_command_line(Some(s.command.buffer()));
            }
            _ => return false,
        }
        true
    }

    fn apply_command_result(&mut self, result: CommandResult) {
        match &result {
            CommandResult::Failed(error) => {
                log::debug!("command rejected: {}", error);
                self.view.show_feedback(error, true);
                self.events.push(GameEvent::CommandFailed { error: error.clone() });
            }
            CommandResult::Ok { action, message } => {
                let message = message.clone().unwrap_or_default();
                self.view.show_feedback(&message, false);
                self.events.push(GameEvent::CommandExecuted { message });
                if *action == Some(CommandAction::Quit) {
                    self.pause();
                    self.events.push(GameEvent::QuitRequested);
                }
            }
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Accessors
    // ══════════════════════════════════════════════════════════════

    pub fn game_state(&self) -> Option<&GameState> {
        self.session.as_ref().map(|s| &s.state)
    }

    pub fn seed(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.seed)
    }

    pub fn focus(&self) -> Option<Focus> {
        self.session.as_ref().map(|s| s.focus)
    }

    pub fn is_running(&self) -> bool {
        self.session.as_ref().map(|s| s.active).unwrap_or(false)
    }

    pub fn average_fps(&self) -> u32 {
        self.session.as_ref().map(|s| s.game_loop.average_fps()).unwrap_or(0)
    }

    /// Snapshot of the live state, for saving.
    pub fn snapshot(&self) -> GameResult<GameState> {
        self.game_state().cloned().ok_or(GameError::NoSession)
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

// ── Loop → coordinator bridge ──

struct SessionHooks<'a, V: GameView> {
    view: &'a mut V,
    events: &'a mut Vec<GameEvent>,
    input: &'a mut InputManager,
    active: &'a mut bool,
}

impl<V: GameView> SessionHooks<'_, V> {
    fn finish(&mut self) {
        *self.active = false;
        self.input.disable();
    }
}

/// Levels count from 1; level 0 is the tutorial, which never runs here.
fn check_level(level: u32) -> GameResult<()> {
    if level == 0 {
        return Err(GameError::InvalidLevel(level));
    }
    Ok(())
}

fn summarize(state: &GameState) -> LevelSummary {
    LevelSummary {
        score: state.score,
        level: state.level.current,
        coins_collected: state.level.collected_coins,
        total_coins: state.level.total_coins,
        time_remaining: state.time_remaining(),
    }
}

impl<V: GameView> LoopHooks for SessionHooks<'_, V> {
    fn on_update(&mut self, state: &mut GameState, _delta_ms: f64) {
        self.view.hud_timer(state.time_remaining());
    }

    fn on_render(&mut self, _state: &GameState) {
        self.view.present();
    }

    fn on_win(&mut self, state: &mut GameState) {
        self.finish();
        let summary = summarize(state);
        self.events.push(GameEvent::LevelWon(summary));
    }

    fn on_lose(&mut self, state: &mut GameState) {
        self.finish();
        let summary = summarize(state);
        self.events.push(GameEvent::LevelLost(summary));
    }
}

#[derive(Default)]
struct PendingAction(Option<InputAction>);

impl InputHandler for PendingAction {
    fn on_move(&mut self, direction: Direction) {
        self.0 = Some(InputAction::Move(direction));
    }
    fn on_command_mode(&mut self) {
        self.0 = Some(InputAction::EnterCommand);
    }
    fn on_escape(&mut self) {
        self.0 = Some(InputAction::Escape);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::map::Block;
    use crate::sim::game_loop::FIXED_STEP_MS;
    use crate::sim::view::testing::RecordingView;

    /// Fixed 10x8 map with coins at (6,5), (7,5) and (5,2).
    struct FixedLayout;

    impl LayoutGenerator for FixedLayout {
        fn generate(&self, _difficulty: u32, _seed: u64) -> MapLayout {
            MapLayout {
                width: 10,
                height: 8,
                blocks: vec![Block { x: 4, y: 5, width: 4, text: "word".into() }],
                coin_positions: vec![Position::new(6, 5), Position::new(7, 5), Position::new(5, 2)],
            }
        }
    }

    fn target() -> RenderTarget {
        RenderTarget::new(0, 0, 80, 24)
    }

    fn coordinator() -> GameCoordinator<RecordingView> {
        let settings = CoordinatorSettings { seed: Some(1), ..CoordinatorSettings::default() };
        GameCoordinator::new(settings, Box::new(FixedLayout), RecordingView::default())
    }

    fn started() -> GameCoordinator<RecordingView> {
        let mut c = coordinator();
        c.start_new_game(&target(), 1).unwrap();
        c
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn code(k: KeyCode) -> KeyEvent {
        KeyEvent::new(k, KeyModifiers::NONE)
    }

    fn type_command(c: &mut GameCoordinator<RecordingView>, text: &str) {
        c.handle_key(&key(':'));
        for ch in text.chars() {
            c.handle_key(&key(ch));
        }
        c.handle_key(&code(KeyCode::Enter));
    }

    // ── Lifecycle ──

    #[test]
    fn zero_sized_target_is_rejected() {
        let mut c = coordinator();
        let err = c.start_new_game(&RenderTarget::new(0, 0, 0, 10), 1).unwrap_err();
        assert!(matches!(err, GameError::InvalidRenderTarget { width: 0, height: 10 }));
        assert!(c.game_state().is_none());
    }

    #[test]
    fn level_zero_is_rejected() {
        let mut c = coordinator();
        let err = c.start_new_game(&target(), 0).unwrap_err();
        assert!(matches!(err, GameError::InvalidLevel(0)));
        assert!(c.game_state().is_none());

        let mut saved = GameState::new();
        saved.initialize_level(0, vec![]);
        assert!(matches!(c.resume_game(&target(), saved, 7), Err(GameError::InvalidLevel(0))));
        assert!(c.game_state().is_none());
    }

    #[test]
    fn new_game_seeds_state_and_view() {
        let c = started();
        let s = c.game_state().unwrap();
        assert_eq!(s.level.current, 1);
        assert_eq!(s.level.total_coins, 3);
        assert_eq!(s.level.collected_coins, 0);
        assert_eq!((s.player.x, s.player.y), (5, 5));
        assert!(c.is_running());
        assert_eq!(c.focus(), Some(Focus::Movement));

        let v = c.view();
        assert_eq!(v.target, Some(target()));
        assert!(v.map_drawn);
        assert_eq!(v.cursor, Some((5, 5)));
        assert_eq!(v.coins.len(), 3);
    }

    #[test]
    fn cleanup_is_idempotent_and_safe_before_start() {
        let mut c = coordinator();
        c.cleanup();
        assert_eq!(c.view().hud_destroyed, 0);

        c.start_new_game(&target(), 1).unwrap();
        c.cleanup();
        c.cleanup();
        let v = c.view();
        assert_eq!(v.hud_destroyed, 1);
        assert_eq!(v.cleared, 1);
        assert!(!v.map_drawn);
        assert_eq!(v.cursor, None);
        assert!(v.coins.is_empty());
        assert!(c.game_state().is_none());
        assert!(!c.is_running());
        assert_eq!(c.tick(100.0), None);
    }

    // ── Movement / coins ──

    #[test]
    fn movement_collects_coin_once() {
        let mut c = started();
        c.handle_key(&key('l'));
        let s = c.game_state().unwrap();
        assert_eq!((s.player.x, s.player.y), (6, 5));
        assert_eq!(s.level.collected_coins, 1);
        assert_eq!(s.score, 10);

        c.check_coin_collection();
        c.check_coin_collection();
        let s = c.game_state().unwrap();
        assert_eq!(s.level.collected_coins, 1);
        assert_eq!(s.score, 10);

        let events = c.drain_events();
        let coins = events.iter().filter(|e| matches!(e, GameEvent::CoinCollected { .. })).count();
        assert_eq!(coins, 1);
        assert_eq!(c.view().score, 10);
        assert_eq!(c.view().camera, Some((6, 5)));
    }

    #[test]
    fn blocked_move_reports_event() {
        let mut c = started();
        for _ in 0..3 {
            c.handle_key(&key('j'));
        }
        let s = c.game_state().unwrap();
        assert_eq!(s.player.y, 7);
        let blocked = c.drain_events().into_iter()
            .filter(|e| matches!(e, GameEvent::MoveBlocked { .. }))
            .count();
        assert_eq!(blocked, 1);
    }

    #[test]
    fn modified_keys_do_not_move() {
        let mut c = started();
        assert!(!c.handle_key(&KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL)));
        assert_eq!(c.game_state().unwrap().player.x, 5);
    }

    // ── Win / lose ──

    #[test]
    fn collecting_everything_wins() {
        let mut c = started();

        c.handle_key(&key('l'));
        c.handle_key(&key('l'));
        for _ in 0..3 {
            c.handle_key(&key('k'));
        }
        c.handle_key(&key('h'));
        c.handle_key(&key('h'));
        assert!(c.game_state().unwrap().all_coins_collected());

        assert_eq!(c.tick(FIXED_STEP_MS), Some(LevelOutcome::Won));
        assert_eq!(c.tick(FIXED_STEP_MS), None);

        let won: Vec<LevelSummary> = c.drain_events().into_iter()
            .filter_map(|e| match e {
                GameEvent::LevelWon(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(won.len(), 1);
        assert_eq!(won[0].score, 30);
        assert_eq!(won[0].coins_collected, 3);
        assert!(!c.is_running());

        c.handle_key(&key('j'));
        assert_eq!(c.game_state().unwrap().player.y, 2);
    }

    #[test]
    fn running_out_of_time_loses_once() {
        let mut c = started();
        let outcomes: Vec<LevelOutcome> = (0..70).filter_map(|_| c.tick(1_000.0)).collect();
        assert_eq!(outcomes, vec![LevelOutcome::Lost]);

        let s = c.game_state().unwrap();
        assert!(s.is_game_over);
        assert_eq!(s.time_remaining(), 0.0);
        let lost: Vec<LevelSummary> = c.drain_events().into_iter()
            .filter_map(|e| match e {
                GameEvent::LevelLost(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(lost.len(), 1);
        assert_eq!(lost[0].total_coins, 3);
    }

    // ── Command focus ──

    #[test]
    fn command_focus_blocks_movement_and_freezes_clock() {
        let mut c = started();
        c.handle_key(&key(':'));
        assert_eq!(c.focus(), Some(Focus::Command));
        assert_eq!(c.view().command_line.as_deref(), Some(""));

        let before = c.game_state().unwrap().time_remaining();
        c.handle_key(&key('h'));
        c.handle_movement(Direction::Left);
        c.tick(5_000.0);
        let s = c.game_state().unwrap();
        assert_eq!(s.player.x, 5);
        assert_eq!(s.time_remaining(), before);
        assert_eq!(s.player.mode, Mode::Command);
        assert_eq!(c.view().command_line.as_deref(), Some("h"));

        c.handle_key(&code(KeyCode::Esc));
        assert_eq!(c.focus(), Some(Focus::Movement));
        assert_eq!(c.view().command_line, None);
        c.tick(1_000.0);
        assert!(c.game_state().unwrap().time_remaining() < before);
    }

    #[test]
    fn quit_command_requests_quit_and_stops() {
        let mut c = started();
        type_command(&mut c, "q");
        let events = c.drain_events();
        assert!(events.contains(&GameEvent::QuitRequested));
        assert!(!c.is_running());
        assert_eq!(c.focus(), Some(Focus::Movement));
        assert_eq!(c.view().feedback.last(), Some(&("Returning to main menu...".to_string(), false)));
    }

    #[test]
    fn unknown_command_shows_error_and_resumes() {
        let mut c = started();
        type_command(&mut c, "wq!");
        let events = c.drain_events();
        assert!(matches!(events.last(), Some(GameEvent::CommandFailed { .. })));
        assert!(c.is_running());
        let (msg, is_error) = c.view().feedback.last().cloned().unwrap();
        assert!(is_error);
        assert!(msg.starts_with("Unknown command: wq!"));
    }

    #[test]
    fn backspace_on_empty_line_leaves_command_mode() {
        let mut c = started();
        c.handle_key(&key(':'));
        c.handle_key(&key('x'));
        c.handle_key(&code(KeyCode::Backspace));
        assert_eq!(c.focus(), Some(Focus::Command));
        c.handle_key(&code(KeyCode::Backspace));
        assert_eq!(c.focus(), Some(Focus::Movement));
    }

    // ── Pause / progression ──

    #[test]
    fn pause_stops_loop_and_input_together() {
        let mut c = started();
        c.pause();
        assert!(!c.is_running());
        let t = c.game_state().unwrap().time_remaining();
        c.tick(5_000.0);
        c.handle_key(&key('l'));
        assert_eq!(c.game_state().unwrap().time_remaining(), t);
        assert_eq!(c.game_state().unwrap().player.x, 5);

        c.resume();
        c.handle_key(&key('l'));
        assert_eq!(c.game_state().unwrap().player.x, 6);
    }

    #[test]
    fn advance_level_carries_score_and_resets_coins() {
        let mut c = started();
        c.handle_key(&key('l'));
        let mut finished = c.snapshot().unwrap();
        finished.update_health(2);

        c.advance_level(&target(), finished).unwrap();
        let s = c.game_state().unwrap();
        assert_eq!(s.level.current, 2);
        assert_eq!(s.score, 10);
        assert_eq!(s.health, 2);
        assert_eq!(s.level.collected_coins, 0);
        assert_eq!(s.time_remaining(), DEFAULT_LEVEL_TIME);
    }

    #[test]
    fn resume_game_restores_snapshot() {
        let mut c = started();
        c.handle_key(&key('l'));
        c.tick(2_000.0);
        let saved = c.snapshot().unwrap();
        let seed = c.seed().unwrap();
        c.cleanup();

        c.resume_game(&target(), saved.clone(), seed).unwrap();
        let s = c.game_state().unwrap();
        assert_eq!(s.level, saved.level);
        assert_eq!(s.score, saved.score);
        assert_eq!((s.player.x, s.player.y), (6, 5));
        assert_eq!(s.time_remaining(), saved.time_remaining());
        assert!(c.is_running());
    }

    #[test]
    fn fixed_seed_is_per_level() {
        let c = started();
        assert_eq!(c.seed(), Some(2));
    }
}
