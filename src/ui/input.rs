/// Keyboard input for the game surface.
///
/// Two layers:
///   - `poll_key_presses()` drains crossterm's queue without blocking,
///     keeping only Press/Repeat events.
///   - `InputManager` turns one key event into a game action
///     (move, enter command mode, escape) while enabled.
///
/// Keys held with Ctrl/Alt/Super/Meta are never game actions; they stay
/// free for terminal and OS shortcuts. Shift is allowed (`:` needs it).

use std::collections::HashSet;
use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::player::Direction;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputAction {
    Move(Direction),
    EnterCommand,
    Escape,
}

/// Receiver for dispatched actions. Unimplemented slots do nothing.
pub trait InputHandler {
    fn on_move(&mut self, _direction: Direction) {}
    fn on_command_mode(&mut self) {}
    fn on_escape(&mut self) {}
}

const RESERVED_MODIFIERS: KeyModifiers = KeyModifiers::CONTROL
    .union(KeyModifiers::ALT)
    .union(KeyModifiers::SUPER)
    .union(KeyModifiers::META);

pub struct InputManager {
    enabled: bool,
    /// Lower-cased key names: "h", ":", "escape".
    blocked: HashSet<String>,
}

impl InputManager {
    pub fn new() -> Self {
        InputManager { enabled: false, blocked: HashSet::new() }
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    #[allow(dead_code)]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    // ── Block list ──

    #[allow(dead_code)]
    pub fn block_keys(&mut self, keys: &[&str]) {
        self.blocked.extend(keys.iter().map(|k| k.to_lowercase()));
    }

    #[allow(dead_code)]
    pub fn unblock_keys(&mut self, keys: &[&str]) {
        for k in keys {
            self.blocked.remove(&k.to_lowercase());
        }
    }

    #[allow(dead_code)]
    pub fn clear_blocked_keys(&mut self) {
        self.blocked.clear();
    }

    // ── Classification ──

    /// Map a key to a game action, ignoring the enabled flag.
    pub fn classify(&self, key: &KeyEvent) -> Option<InputAction> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if key.modifiers.intersects(RESERVED_MODIFIERS) {
            return None;
        }

        let name = key_name(key.code)?;
        if self.blocked.contains(&name) {
            return None;
        }

        match key.code {
            KeyCode::Esc => Some(InputAction::Escape),
            KeyCode::Char(':') => Some(InputAction::EnterCommand),
            KeyCode::Char(c) => {
                c.to_lowercase().next().and_then(Direction::from_key).map(InputAction::Move)
            }
            _ => None,
        }
    }

    /// Deliver `key` to `handler` if it is a game action. Returns true
    /// when the key was consumed.
    pub fn dispatch(&self, key: &KeyEvent, handler: &mut impl InputHandler) -> bool {
        if !self.enabled {
            return false;
        }
        match self.classify(key) {
            Some(InputAction::Move(dir)) => handler.on_move(dir),
            Some(InputAction::EnterCommand) => handler.on_command_mode(),
            Some(InputAction::Escape) => handler.on_escape(),
            None => return false,
        }
        true
    }
}

impl Default for InputManager {
    fn default() -> Self {
        InputManager::new()
    }
}

fn key_name(code: KeyCode) -> Option<String> {
    match code {
        KeyCode::Char(c) => Some(c.to_lowercase().collect()),
        KeyCode::Esc => Some("escape".to_string()),
        KeyCode::Enter => Some("enter".to_string()),
        KeyCode::Backspace => Some("backspace".to_string()),
        _ => None,
    }
}

// ══════════════════════════════════════════════════════════════
// Terminal polling
// ══════════════════════════════════════════════════════════════

/// Drain all pending terminal events. Call once per frame.
pub fn poll_key_presses() -> Vec<KeyEvent> {
    let mut keys = Vec::with_capacity(8);
    while poll(Duration::ZERO).unwrap_or(false) {
        match event::read() {
            Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => keys.push(key),
            Ok(_) => {}
            Err(e) => {
                log::warn!("terminal read failed: {}", e);
                break;
            }
        }
    }
    keys
}

/// Ctrl+C always leaves the application, whatever screen is up.
pub fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn with(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[derive(Default)]
    struct Calls {
        moves: Vec<Direction>,
        commands: u32,
        escapes: u32,
    }

    impl InputHandler for Calls {
        fn on_move(&mut self, direction: Direction) {
            self.moves.push(direction);
        }
        fn on_command_mode(&mut self) {
            self.commands += 1;
        }
        fn on_escape(&mut self) {
            self.escapes += 1;
        }
    }

    struct Deaf;
    impl InputHandler for Deaf {}

    fn enabled() -> InputManager {
        let mut im = InputManager::new();
        im.enable();
        im
    }

    #[test]
    fn hjkl_move() {
        let im = enabled();
        let mut calls = Calls::default();
        for c in ['h', 'j', 'k', 'l'] {
            assert!(im.dispatch(&press(KeyCode::Char(c)), &mut calls));
        }
        assert_eq!(calls.moves, vec![Direction::Left, Direction::Down, Direction::Up, Direction::Right]);
    }

    #[test]
    fn uppercase_is_lowered() {
        let im = enabled();
        assert_eq!(
            im.classify(&with(KeyCode::Char('L'), KeyModifiers::SHIFT)),
            Some(InputAction::Move(Direction::Right))
        );
    }

    #[test]
    fn ctrl_alt_meta_are_ignored() {
        let im = enabled();
        let mut calls = Calls::default();
        for m in [KeyModifiers::CONTROL, KeyModifiers::ALT, KeyModifiers::META, KeyModifiers::SUPER] {
            assert!(!im.dispatch(&with(KeyCode::Char('h'), m), &mut calls));
        }
        assert!(calls.moves.is_empty());

        assert!(im.dispatch(&press(KeyCode::Char('h')), &mut calls));
        assert_eq!(calls.moves, vec![Direction::Left]);
    }

    #[test]
    fn colon_and_escape() {
        let im = enabled();
        let mut calls = Calls::default();
        im.dispatch(&with(KeyCode::Char(':'), KeyModifiers::SHIFT), &mut calls);
        im.dispatch(&press(KeyCode::Esc), &mut calls);
        assert_eq!(calls.commands, 1);
        assert_eq!(calls.escapes, 1);
    }

    #[test]
    fn other_keys_pass_through() {
        let im = enabled();
        let mut calls = Calls::default();
        assert!(!im.dispatch(&press(KeyCode::Char('x')), &mut calls));
        assert!(!im.dispatch(&press(KeyCode::Enter), &mut calls));
        assert!(!im.dispatch(&press(KeyCode::Up), &mut calls));
    }

    #[test]
    fn disabled_manager_consumes_nothing() {
        let mut im = enabled();
        im.disable();
        im.disable();
        let mut calls = Calls::default();
        assert!(!im.dispatch(&press(KeyCode::Char('j')), &mut calls));
        assert!(calls.moves.is_empty());
    }

    #[test]
    fn blocked_keys_are_case_insensitive() {
        let mut im = enabled();
        im.block_keys(&["H", "Escape"]);
        let mut calls = Calls::default();
        assert!(!im.dispatch(&press(KeyCode::Char('h')), &mut calls));
        assert!(!im.dispatch(&press(KeyCode::Esc), &mut calls));
        assert!(im.dispatch(&press(KeyCode::Char('j')), &mut calls));

        im.unblock_keys(&["h"]);
        assert!(im.dispatch(&press(KeyCode::Char('h')), &mut calls));

        im.block_keys(&["l"]);
        im.clear_blocked_keys();
        assert!(im.dispatch(&press(KeyCode::Char('l')), &mut calls));
    }

    #[test]
    fn missing_handlers_are_fine() {
        let im = enabled();
        assert!(im.dispatch(&press(KeyCode::Char('k')), &mut Deaf));
        assert!(im.dispatch(&press(KeyCode::Esc), &mut Deaf));
    }

    #[test]
    fn release_events_are_not_actions() {
        let im = enabled();
        let mut key = press(KeyCode::Char('h'));
        key.kind = KeyEventKind::Release;
        assert_eq!(im.classify(&key), None);
    }

    #[test]
    fn interrupt_detection() {
        assert!(is_interrupt(&with(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_interrupt(&press(KeyCode::Char('c'))));
    }
}
