/// Top-level screens and the transitions between them.
///
/// Every screen can switch to every other one. A switch runs, in order:
///   1. exit callbacks of the current screen
///   2. cleanups registered since the previous switch (each once)
///   3. enter callbacks of the new screen
///
/// Callbacks get the shell context `C` by `&mut`, so the manager itself
/// can live next to that context instead of inside it.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::GameError;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Screen {
    MainMenu,
    Playing,
    LevelComplete,
    LevelFailed,
}

impl Screen {
    pub const ALL: [Screen; 4] = [Screen::MainMenu, Screen::Playing, Screen::LevelComplete, Screen::LevelFailed];

    pub fn as_str(self) -> &'static str {
        match self {
            Screen::MainMenu => "MAIN_MENU",
            Screen::Playing => "PLAYING",
            Screen::LevelComplete => "LEVEL_COMPLETE",
            Screen::LevelFailed => "LEVEL_FAILED",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Screen {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Screen::ALL
            .into_iter()
            .find(|screen| screen.as_str() == s)
            .ok_or_else(|| GameError::InvalidScreen(s.to_string()))
    }
}

type Callback<C> = Box<dyn FnMut(&mut C)>;
type Cleanup<C> = Box<dyn FnOnce(&mut C)>;

pub struct ScreenManager<C> {
    current: Screen,
    enter: HashMap<Screen, Vec<Callback<C>>>,
    exit: HashMap<Screen, Vec<Callback<C>>>,
    cleanups: Vec<Cleanup<C>>,
}

impl<C> ScreenManager<C> {
    pub fn new() -> Self {
        ScreenManager {
            current: Screen::MainMenu,
            enter: HashMap::new(),
            exit: HashMap::new(),
            cleanups: Vec::new(),
        }
    }

    pub fn current(&self) -> Screen {
        self.current
    }

    pub fn switch_to(&mut self, screen: Screen, ctx: &mut C) {
        log::debug!("screen {} -> {}", self.current, screen);

        if let Some(callbacks) = self.exit.get_mut(&self.current) {
            for cb in callbacks.iter_mut() {
                cb(ctx);
            }
        }

        for cleanup in std::mem::take(&mut self.cleanups) {
            cleanup(ctx);
        }

        self.current = screen;

        if let Some(callbacks) = self.enter.get_mut(&screen) {
            for cb in callbacks.iter_mut() {
                cb(ctx);
            }
        }
    }

    /// Switch by name. Unknown names fail and leave the current screen alone.
    #[allow(dead_code)]
    pub fn switch_to_named(&mut self, name: &str, ctx: &mut C) -> Result<(), GameError> {
        let screen: Screen = name.parse()?;
        self.switch_to(screen, ctx);
        Ok(())
    }

    pub fn on_screen_enter(&mut self, screen: Screen, callback: impl FnMut(&mut C) + 'static) {
        self.enter.entry(screen).or_default().push(Box::new(callback));
    }

    pub fn on_screen_exit(&mut self, screen: Screen, callback: impl FnMut(&mut C) + 'static) {
        self.exit.entry(screen).or_default().push(Box::new(callback));
    }

    /// Run once on the next switch, whatever the destination.
    pub fn register_cleanup(&mut self, cleanup: impl FnOnce(&mut C) + 'static) {
        self.cleanups.push(Box::new(cleanup));
    }
}

impl<C> Default for ScreenManager<C> {
    fn default() -> Self {
        ScreenManager::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Vec<String>;

    fn logger(tag: &'static str) -> impl FnMut(&mut Log) {
        move |log: &mut Log| log.push(tag.to_string())
    }

    #[test]
    fn starts_on_main_menu() {
        let sm: ScreenManager<Log> = ScreenManager::new();
        assert_eq!(sm.current(), Screen::MainMenu);
    }

    #[test]
    fn exit_then_cleanup_then_enter() {
        let mut sm = ScreenManager::new();
        let mut log = Log::new();
        sm.on_screen_exit(Screen::Playing, logger("exit playing 1"));
        sm.on_screen_exit(Screen::Playing, logger("exit playing 2"));
        sm.on_screen_enter(Screen::MainMenu, logger("enter menu"));

        sm.switch_to(Screen::Playing, &mut log);
        sm.register_cleanup(|log: &mut Log| log.push("cleanup a".into()));
        sm.register_cleanup(|log: &mut Log| log.push("cleanup b".into()));
        sm.switch_to_named("MAIN_MENU", &mut log).unwrap();

        assert_eq!(log, vec!["exit playing 1", "exit playing 2", "cleanup a", "cleanup b", "enter menu"]);
        assert_eq!(sm.current(), Screen::MainMenu);
    }

    #[test]
    fn cleanups_run_once() {
        let mut sm = ScreenManager::new();
        let mut log = Log::new();
        sm.register_cleanup(|log: &mut Log| log.push("cleanup".into()));
        sm.switch_to(Screen::LevelFailed, &mut log);
        sm.switch_to(Screen::MainMenu, &mut log);
        assert_eq!(log, vec!["cleanup"]);
    }

    #[test]
    fn invalid_name_keeps_current_screen() {
        let mut sm = ScreenManager::new();
        let mut log = Log::new();
        sm.on_screen_exit(Screen::MainMenu, logger("exit menu"));
        sm.register_cleanup(|log: &mut Log| log.push("cleanup".into()));

        let err = sm.switch_to_named("NOT_A_SCREEN", &mut log).unwrap_err();
        assert_eq!(err.to_string(), "Invalid screen: NOT_A_SCREEN");
        assert_eq!(sm.current(), Screen::MainMenu);
        assert!(log.is_empty());
    }

    #[test]
    fn names_round_trip() {
        for screen in Screen::ALL {
            assert_eq!(screen.as_str().parse::<Screen>().unwrap(), screen);
        }
        assert!("playing".parse::<Screen>().is_err());
    }

    #[test]
    fn self_transition_runs_callbacks() {
        let mut sm = ScreenManager::new();
        let mut log = Log::new();
        sm.on_screen_exit(Screen::MainMenu, logger("exit"));
        sm.on_screen_enter(Screen::MainMenu, logger("enter"));
        sm.switch_to(Screen::MainMenu, &mut log);
        assert_eq!(log, vec!["exit", "enter"]);
    }
}
