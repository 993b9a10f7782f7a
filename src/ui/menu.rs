/// Main menu list navigation.
///
/// j/k (or the arrow keys) move focus, skipping disabled items and
/// wrapping at both ends. Enter activates the focused item. The shell
/// disables the navigator while the menu's command line holds focus.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::ui::command::CommandAction;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MenuItem {
    pub label: &'static str,
    /// Equivalent command, shown next to the label.
    pub command: &'static str,
    pub action: CommandAction,
    pub enabled: bool,
}

impl MenuItem {
    pub const fn new(label: &'static str, command: &'static str, action: CommandAction) -> Self {
        MenuItem { label, command, action, enabled: true }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MenuInput {
    Moved,
    Activated(CommandAction),
    Ignored,
}

#[derive(Clone, Debug)]
pub struct MenuNavigator {
    items: Vec<MenuItem>,
    selected: usize,
    enabled: bool,
}

impl MenuNavigator {
    pub fn new(items: Vec<MenuItem>) -> Self {
        let mut nav = MenuNavigator { items, selected: 0, enabled: true };
        nav.settle();
        nav
    }

    /// The four main menu entries, mirroring the menu command table.
    pub fn main_menu() -> Self {
        MenuNavigator::new(vec![
            MenuItem::new("New Game", ":new", CommandAction::NewGame),
            MenuItem::new("Continue", ":edit", CommandAction::ContinueGame),
            MenuItem::new("Help", ":help", CommandAction::ShowHelp),
            MenuItem::new("Quit", ":q", CommandAction::Exit),
        ])
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&MenuItem> {
        self.items.get(self.selected).filter(|i| i.enabled)
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Grey out (or restore) every item bound to `action`.
    pub fn set_item_enabled(&mut self, action: CommandAction, enabled: bool) {
        for item in self.items.iter_mut().filter(|i| i.action == action) {
            item.enabled = enabled;
        }
        self.settle();
    }

    pub fn move_down(&mut self) {
        self.step(1);
    }

    pub fn move_up(&mut self) {
        self.step(self.items.len().saturating_sub(1));
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> MenuInput {
        if !self.enabled || key.kind == KeyEventKind::Release {
            return MenuInput::Ignored;
        }
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_down();
                MenuInput::Moved
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_up();
                MenuInput::Moved
            }
            KeyCode::Enter => match self.selected_item() {
                Some(item) => MenuInput::Activated(item.action),
                None => MenuInput::Ignored,
            },
            _ => MenuInput::Ignored,
        }
    }

    /// Advance by `offset` (mod len) until an enabled item is reached.
    fn step(&mut self, offset: usize) {
        let len = self.items.len();
        if len == 0 {
            return;
        }
        let mut idx = self.selected;
        for _ in 0..len {
            idx = (idx + offset) % len;
            if self.items[idx].enabled {
                self.selected = idx;
                return;
            }
        }
    }

    /// Keep the focus off a disabled item.
    fn settle(&mut self) {
        if self.items.get(self.selected).map_or(true, |i| !i.enabled) {
            self.selected = self.selected.min(self.items.len().saturating_sub(1));
            self.step(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn moves_and_wraps() {
        let mut nav = MenuNavigator::main_menu();
        assert_eq!(nav.selected(), 0);
        nav.move_down();
        nav.move_down();
        nav.move_down();
        assert_eq!(nav.selected(), 3);
        nav.move_down();
        assert_eq!(nav.selected(), 0);
        nav.move_up();
        assert_eq!(nav.selected(), 3);
    }

    #[test]
    fn skips_disabled_items() {
        let mut nav = MenuNavigator::main_menu();
        nav.set_item_enabled(CommandAction::ContinueGame, false);
        nav.move_down();
        assert_eq!(nav.selected_item().map(|i| i.action), Some(CommandAction::ShowHelp));
        nav.move_up();
        assert_eq!(nav.selected(), 0);
    }

    #[test]
    fn disabling_the_focused_item_moves_focus() {
        let mut nav = MenuNavigator::main_menu();
        nav.move_down();
        nav.set_item_enabled(CommandAction::ContinueGame, false);
        assert_eq!(nav.selected(), 2);
    }

    #[test]
    fn enter_activates_focused_item() {
        let mut nav = MenuNavigator::main_menu();
        assert_eq!(nav.handle_key(&press(KeyCode::Char('j'))), MenuInput::Moved);
        assert_eq!(
            nav.handle_key(&press(KeyCode::Enter)),
            MenuInput::Activated(CommandAction::ContinueGame)
        );
        assert_eq!(nav.handle_key(&press(KeyCode::Char('x'))), MenuInput::Ignored);
    }

    #[test]
    fn disabled_navigator_ignores_keys() {
        let mut nav = MenuNavigator::main_menu();
        nav.disable();
        assert_eq!(nav.handle_key(&press(KeyCode::Char('j'))), MenuInput::Ignored);
        assert_eq!(nav.selected(), 0);
        nav.enable();
        assert_eq!(nav.handle_key(&press(KeyCode::Down)), MenuInput::Moved);
        assert_eq!(nav.selected(), 1);
    }

    #[test]
    fn all_disabled_has_no_selection() {
        let mut nav = MenuNavigator::new(vec![MenuItem {
            enabled: false,
            ..MenuItem::new("Only", ":x", CommandAction::Exit)
        }]);
        assert!(nav.selected_item().is_none());
        assert_eq!(nav.handle_key(&press(KeyCode::Enter)), MenuInput::Ignored);
    }
}
