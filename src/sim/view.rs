/// Presentation sink for a play session.
///
/// The coordinator pushes snapshots into a `GameView`; the view never
/// reads back game rules. The terminal scene implements it for real
/// play, tests implement it with a recorder.

use crate::domain::map::MapLayout;
use crate::domain::player::Mode;
use crate::error::{GameError, GameResult};
use crate::sim::state::Coin;

/// Rectangle of terminal cells a session draws into.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RenderTarget {
    pub col: u16,
    pub row: u16,
    pub width: u16,
    pub height: u16,
}

impl RenderTarget {
    pub fn new(col: u16, row: u16, width: u16, height: u16) -> Self {
        RenderTarget { col, row, width, height }
    }

    /// A target with no area cannot hold a map.
    pub fn validate(&self) -> GameResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(GameError::InvalidRenderTarget { width: self.width, height: self.height });
        }
        Ok(())
    }
}

pub trait GameView {
    /// Bind to a render target. Called once per session before any draw.
    fn attach(&mut self, target: RenderTarget);

    // ── Map / cursor / coins ──
    fn draw_map(&mut self, map: &MapLayout);
    fn center_camera(&mut self, x: usize, y: usize);
    fn draw_cursor(&mut self, x: usize, y: usize);
    fn draw_coins(&mut self, coins: &[Coin]);

    // ── HUD ──
    fn hud_score(&mut self, score: i64);
    fn hud_timer(&mut self, seconds: f64);
    fn hud_mode(&mut self, mode: Mode);
    fn hud_coins(&mut self, collected: usize, total: usize);

    // ── Command line ──
    /// `Some(buffer)` while command mode holds focus, `None` to hide it.
    fn show_command_line(&mut self, buffer: Option<&str>);
    /// Result of the last command, `is_error` picks the style.
    fn show_feedback(&mut self, message: &str, is_error: bool);

    /// Push the frame out. Views that draw immediately ignore it.
    fn present(&mut self) {}

    // ── Teardown ──
    fn clear_map(&mut self);
    fn clear_cursor(&mut self);
    fn clear_coins(&mut self);
    fn destroy_hud(&mut self);
}
