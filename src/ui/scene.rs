/// Retained terminal scene for a play session.
///
/// `Scene` is the real `GameView`: the coordinator pushes snapshots into
/// it, the renderer reads them back out once per frame. Nothing here
/// touches the terminal directly.

use crate::domain::map::{MapLayout, Position};
use crate::domain::player::Mode;
use crate::sim::state::Coin;
use crate::sim::view::{GameView, RenderTarget};

/// Viewport into the map.
///
/// `(x, y)` is the map coordinate of the top-left visible cell and may be
/// negative when the map is smaller than the viewport (it is centered).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Camera {
    pub x: i32,
    pub y: i32,
    pub view_w: usize,
    pub view_h: usize,
}

impl Camera {
    pub fn new(view_w: usize, view_h: usize) -> Self {
        Camera { x: 0, y: 0, view_w, view_h }
    }

    /// Scroll only when the target leaves the inner dead zone
    /// (a fifth of the viewport on each side).
    pub fn follow(&mut self, target: Position, map_w: usize, map_h: usize) {
        if self.view_w == 0 || self.view_h == 0 {
            return;
        }
        self.x = follow_axis(self.x, target.x as i32, self.view_w as i32, map_w as i32);
        self.y = follow_axis(self.y, target.y as i32, self.view_h as i32, map_h as i32);
    }

    /// Snap to the target, no dead zone. Used when a map is first shown.
    pub fn center_on(&mut self, target: Position, map_w: usize, map_h: usize) {
        if self.view_w == 0 || self.view_h == 0 {
            return;
        }
        self.x = center_axis(target.x as i32, self.view_w as i32, map_w as i32);
        self.y = center_axis(target.y as i32, self.view_h as i32, map_h as i32);
    }

    /// Map cell to viewport cell, `None` when off screen.
    #[allow(dead_code)]
    pub fn map_to_view(&self, mx: usize, my: usize) -> Option<(usize, usize)> {
        let vx = mx as i32 - self.x;
        let vy = my as i32 - self.y;
        if vx >= 0 && vx < self.view_w as i32 && vy >= 0 && vy < self.view_h as i32 {
            Some((vx as usize, vy as usize))
        } else {
            None
        }
    }

    /// Viewport cell to map cell; may fall outside the map.
    pub fn view_to_map(&self, vx: usize, vy: usize) -> (i32, i32) {
        (self.x + vx as i32, self.y + vy as i32)
    }
}

fn follow_axis(origin: i32, target: i32, view: i32, world: i32) -> i32 {
    if world <= view {
        return -((view - world) / 2);
    }
    let margin = view / 5;
    let mut origin = origin;
    if target < origin + margin {
        origin = target - margin;
    } else if target > origin + view - margin - 1 {
        origin = target - view + margin + 1;
    }
    origin.clamp(0, world - view)
}

fn center_axis(target: i32, view: i32, world: i32) -> i32 {
    if world <= view {
        return -((view - world) / 2);
    }
    (target - view / 2).clamp(0, world - view)
}

// ══════════════════════════════════════════════════════════════
// Scene
// ══════════════════════════════════════════════════════════════

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Feedback {
    pub message: String,
    pub is_error: bool,
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Hud {
    pub score: i64,
    pub seconds: f64,
    pub mode: Mode,
    pub coins_collected: usize,
    pub coins_total: usize,
}

#[derive(Debug, Default)]
pub struct Scene {
    target: Option<RenderTarget>,
    map: Option<MapLayout>,
    camera: Camera,
    /// Next `center_camera` snaps instead of following.
    snap: bool,
    cursor: Option<Position>,
    coins: Vec<Coin>,
    hud: Option<Hud>,
    command_line: Option<String>,
    feedback: Option<Feedback>,
}

impl Scene {
    pub fn new() -> Self {
        Scene::default()
    }

    /// Terminal resized mid-session: keep the cursor in view.
    pub fn resize(&mut self, target: RenderTarget) {
        if self.target == Some(target) {
            return;
        }
        self.target = Some(target);
        self.camera.view_w = target.width as usize;
        self.camera.view_h = target.height as usize;
        if let (Some(map), Some(cursor)) = (&self.map, self.cursor) {
            self.camera.center_on(cursor, map.width, map.height);
        }
    }

    pub fn target(&self) -> Option<RenderTarget> {
        self.target
    }

    pub fn map(&self) -> Option<&MapLayout> {
        self.map.as_ref()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn cursor(&self) -> Option<Position> {
        self.cursor
    }

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    /// Uncollected coin at a map cell?
    pub fn coin_at(&self, x: usize, y: usize) -> bool {
        self.coins.iter().any(|c| !c.collected && c.is_at(x, y))
    }

    pub fn hud(&self) -> Option<&Hud> {
        self.hud.as_ref()
    }

    pub fn command_line(&self) -> Option<&str> {
        self.command_line.as_deref()
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    fn hud_mut(&mut self) -> &mut Hud {
        self.hud.get_or_insert_with(Hud::default)
    }
}

impl GameView for Scene {
    fn attach(&mut self, target: RenderTarget) {
        self.target = Some(target);
        self.camera = Camera::new(target.width as usize, target.height as usize);
        self.feedback = None;
    }

    fn draw_map(&mut self, map: &MapLayout) {
        self.map = Some(map.clone());
        self.snap = true;
    }

    fn center_camera(&mut self, x: usize, y: usize) {
        let Some(map) = &self.map else {
            return;
        };
        let (w, h) = (map.width, map.height);
        if std::mem::take(&mut self.snap) {
            self.camera.center_on(Position::new(x, y), w, h);
        } else {
            self.camera.follow(Position::new(x, y), w, h);
        }
    }

    fn draw_cursor(&mut self, x: usize, y: usize) {
        self.cursor = Some(Position::new(x, y));
    }

    fn draw_coins(&mut self, coins: &[Coin]) {
        self.coins = coins.to_vec();
    }

    fn hud_score(&mut self, score: i64) {
        self.hud_mut().score = score;
    }

    fn hud_timer(&mut self, seconds: f64) {
        self.hud_mut().seconds = seconds;
    }

    fn hud_mode(&mut self, mode: Mode) {
        self.hud_mut().mode = mode;
    }

    fn hud_coins(&mut self, collected: usize, total: usize) {
        let hud = self.hud_mut();
        hud.coins_collected = collected;
        hud.coins_total = total;
    }

    fn show_command_line(&mut self, buffer: Option<&str>) {
        self.command_line = buffer.map(str::to_string);
    }

    fn show_feedback(&mut self, message: &str, is_error: bool) {
        self.feedback = if message.is_empty() {
            None
        } else {
            Some(Feedback { message: message.to_string(), is_error })
        };
    }

    fn clear_map(&mut self) {
        self.map = None;
        self.camera = Camera::new(self.camera.view_w, self.camera.view_h);
    }

    fn clear_cursor(&mut self) {
        self.cursor = None;
    }

    fn clear_coins(&mut self) {
        self.coins.clear();
    }

    fn destroy_hud(&mut self) {
        self.hud = None;
        self.command_line = None;
    }
}
