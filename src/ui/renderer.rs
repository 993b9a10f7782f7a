/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. The shell describes the screen as a `Frame`
///   2. `compose` paints it into the `front` buffer
///   3. `flush_diff` emits terminal commands only for cells that differ
///      from `back` (the previous frame), batched with `queue!`
///   4. Swap front/back
///
/// Screen layout while playing:
///   row 0          HUD (level, score, coins, health, clock)
///   row 1          rule, debug overlay on the right
///   rows 2..h-3    map viewport (one map cell per terminal column)
///   row h-3        mode line or `:` command line
///   row h-2        feedback from the last command
///   row h-1        key help

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::timer::format_clock;
use crate::sim::event::LevelSummary;
use crate::sim::leaderboard::{RankedEntry, MAX_SCORES};
use crate::sim::tutorial;
use crate::sim::view::RenderTarget;
use crate::ui::menu::MenuItem;
use crate::ui::scene::{Feedback, Scene};

// ── Palette ──

const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };
const VOID_BG: Color = Color::Rgb { r: 14, g: 14, b: 22 };
const TEXT: Color = Color::Rgb { r: 150, g: 150, b: 170 };
const DIM: Color = Color::DarkGrey;
const ACCENT: Color = Color::Rgb { r: 110, g: 200, b: 255 };
const GOLD: Color = Color::Rgb { r: 255, g: 210, b: 60 };
const GOLD_BG: Color = Color::Rgb { r: 70, g: 55, b: 10 };
const GOOD: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const BAD: Color = Color::Rgb { r: 255, g: 60, b: 60 };
const CURSOR_BG: Color = Color::Rgb { r: 230, g: 230, b: 230 };

/// Under this many seconds the clock turns red.
const LOW_TIME_SECS: f64 = 10.0;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: BASE_BG };

    /// Never produced by composing, so a back buffer full of these
    /// repaints every position.
    const INVALID: Cell = Cell { ch: '\0', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn invalidate(&mut self) {
        self.cells.fill(Cell::INVALID);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// One char per column, clipped at the right edge.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn put_right(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let len = s.chars().count();
        let x = self.width.saturating_sub(len + 1);
        self.put_str(x, y, s, fg, bg);
    }

    fn fill_row(&mut self, y: usize, ch: char, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(ch, fg, bg));
        }
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect::<String>().trim_end().to_string()
    }
}

// ══════════════════════════════════════════════════════════════
// Frames
// ══════════════════════════════════════════════════════════════

pub struct MenuFrame<'a> {
    pub items: &'a [MenuItem],
    pub selected: usize,
    /// False while the command line holds focus.
    pub navigable: bool,
    pub command_line: Option<&'a str>,
    pub feedback: Option<&'a Feedback>,
    pub top_scores: &'a [RankedEntry],
}

pub struct TutorialFrame<'a> {
    pub command_line: Option<&'a str>,
    pub feedback: Option<&'a Feedback>,
}

#[derive(Clone, Copy, Debug)]
pub struct DebugInfo {
    pub fps: u32,
    pub seed: Option<u64>,
}

pub struct PlayingFrame<'a> {
    pub scene: &'a Scene,
    pub level: u32,
    pub health: u32,
    pub debug: Option<DebugInfo>,
}

pub struct ResultFrame<'a> {
    pub summary: &'a LevelSummary,
    /// Leaderboard placement of the final score, when it made the board.
    pub rank: Option<usize>,
    pub top_scores: &'a [RankedEntry],
}

pub enum Frame<'a> {
    Menu(MenuFrame<'a>),
    Tutorial(TutorialFrame<'a>),
    Playing(PlayingFrame<'a>),
    LevelComplete(ResultFrame<'a>),
    LevelFailed(ResultFrame<'a>),
}

impl Frame<'_> {
    fn kind(&self) -> u8 {
        match self {
            Frame::Menu(_) => 0,
            Frame::Tutorial(_) => 1,
            Frame::Playing(_) => 2,
            Frame::LevelComplete(_) => 3,
            Frame::LevelFailed(_) => 4,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Renderer
// ══════════════════════════════════════════════════════════════

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// Rows below the map: mode/command line, feedback, help.
const FOOTER_ROWS: usize = 3;

/// Map viewport for a terminal of the given size.
pub fn map_target(term_w: u16, term_h: u16) -> RenderTarget {
    let reserved = (MAP_ROW + FOOTER_ROWS) as u16;
    RenderTarget::new(0, MAP_ROW as u16, term_w, term_h.saturating_sub(reserved).max(1))
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_kind: Option<u8>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_kind: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.invalidate();
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Map viewport for the current terminal size.
    pub fn viewport(&self) -> RenderTarget {
        map_target(self.term_w as u16, self.term_h as u16)
    }

    pub fn render(&mut self, frame: &Frame) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.invalidate();
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
            log::debug!("terminal resized to {}x{}", tw, th);
        }

        // Screen change: clean transition
        if self.last_kind != Some(frame.kind()) {
            self.back.invalidate();
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
            self.last_kind = Some(frame.kind());
        }

        self.front.clear();
        compose(&mut self.front, frame);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors, never ResetColor: the terminal default
        // may differ from BASE_BG.
        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

// ══════════════════════════════════════════════════════════════
// Composition
// ══════════════════════════════════════════════════════════════

fn compose(fb: &mut FrameBuffer, frame: &Frame) {
    match frame {
        Frame::Menu(m) => compose_menu(fb, m),
        Frame::Tutorial(t) => compose_tutorial(fb, t),
        Frame::Playing(p) => compose_playing(fb, p),
        Frame::LevelComplete(r) => compose_level_complete(fb, r),
        Frame::LevelFailed(r) => compose_level_failed(fb, r),
    }
}

fn compose_banner(fb: &mut FrameBuffer, x: usize, y: usize, title: &str, color: Color) {
    let inner: usize = 32;
    let pad = inner.saturating_sub(title.chars().count());
    let left = pad / 2;
    fb.put_str(x, y, &format!("╔{}╗", "═".repeat(inner)), color, BASE_BG);
    fb.put_str(
        x,
        y + 1,
        &format!("║{}{}{}║", " ".repeat(left), title, " ".repeat(pad - left)),
        color,
        BASE_BG,
    );
    fb.put_str(x, y + 2, &format!("╚{}╝", "═".repeat(inner)), color, BASE_BG);
}

/// Bottom three rows shared by every interactive screen.
fn compose_footer(fb: &mut FrameBuffer, status: Option<&str>, command_line: Option<&str>, feedback: Option<&Feedback>, help: &str) {
    if fb.height < FOOTER_ROWS {
        return;
    }
    let status_row = fb.height - 3;
    let feedback_row = fb.height - 2;
    let help_row = fb.height - 1;

    match command_line {
        Some(buffer) => {
            fb.fill_row(status_row, ' ', Color::White, VOID_BG);
            fb.put_str(0, status_row, &format!(":{}█", buffer), Color::White, VOID_BG);
        }
        None => {
            if let Some(status) = status {
                fb.put_str(0, status_row, status, ACCENT, BASE_BG);
            }
        }
    }

    if let Some(fb_msg) = feedback {
        let color = if fb_msg.is_error { BAD } else { GOOD };
        // Multi-line messages (`:help`) grow upward over the screen
        let lines: Vec<&str> = fb_msg.message.lines().collect();
        let top = (feedback_row + 1).saturating_sub(lines.len()).max(MAP_ROW);
        for (i, line) in lines.iter().enumerate() {
            let row = top + i;
            if row > feedback_row {
                break;
            }
            if lines.len() > 1 {
                fb.fill_row(row, ' ', color, VOID_BG);
            }
            fb.put_str(1, row, line, color, if lines.len() > 1 { VOID_BG } else { BASE_BG });
        }
    }

    fb.put_str(1, help_row, help, DIM, BASE_BG);
}

fn compose_scores(fb: &mut FrameBuffer, x: usize, y: usize, scores: &[RankedEntry], highlight: Option<usize>) {
    fb.put_str(x, y, "HIGH SCORES", GOLD, BASE_BG);
    if scores.is_empty() {
        fb.put_str(x, y + 1, "no scores yet", DIM, BASE_BG);
        return;
    }
    for (i, r) in scores.iter().take(MAX_SCORES).enumerate() {
        let line = format!(
            "{:>2}. {:>6}  L{:<3} {}",
            r.rank,
            r.entry.score,
            r.entry.level,
            r.entry.date.format("%Y-%m-%d")
        );
        let color = if highlight == Some(r.rank) { GOLD } else { TEXT };
        fb.put_str(x, y + 1 + i, &line, color, BASE_BG);
    }
}

// ── Main menu ──

fn compose_menu(fb: &mut FrameBuffer, m: &MenuFrame) {
    compose_banner(fb, 4, 1, "VIM  MOTIONS  ARCADE", ACCENT);
    fb.put_str(6, 4, "master hjkl one coin at a time", DIM, BASE_BG);

    for (i, item) in m.items.iter().enumerate() {
        let row = 6 + i;
        let focused = m.navigable && i == m.selected;
        let (marker, fg) = match (focused, item.enabled) {
            (true, _) => ("▸ ", GOLD),
            (false, true) => ("  ", Color::White),
            (false, false) => ("  ", DIM),
        };
        fb.put_str(6, row, &format!("{}{:<12}", marker, item.label), fg, BASE_BG);
        fb.put_str(22, row, item.command, DIM, BASE_BG);
    }

    let scores_row = 7 + m.items.len();
    compose_scores(fb, 6, scores_row, m.top_scores, None);

    compose_footer(
        fb,
        None,
        m.command_line,
        m.feedback,
        "j/k select   Enter choose   : command   Ctrl+C exit",
    );
}

// ── Tutorial ──

fn compose_tutorial(fb: &mut FrameBuffer, t: &TutorialFrame) {
    fb.put_str(2, 1, tutorial::TITLE, GOLD, BASE_BG);
    for (i, line) in tutorial::INSTRUCTIONS.lines().enumerate() {
        let color = if line.starts_with(['╔', '║', '╚']) { ACCENT } else { TEXT };
        fb.put_str(2, 3 + i, line, color, BASE_BG);
    }
    compose_footer(fb, None, t.command_line, t.feedback, tutorial::HINT);
}

// ── Playing ──

fn compose_playing(fb: &mut FrameBuffer, p: &PlayingFrame) {
    let scene = p.scene;

    if let Some(hud) = scene.hud() {
        let left = format!(
            " LEVEL {}   SCORE {}   COINS {}/{}   HP {}",
            p.level, hud.score, hud.coins_collected, hud.coins_total, p.health
        );
        fb.put_str(0, HUD_ROW, &left, Color::White, BASE_BG);
        let clock = format!("TIME {}", format_clock(hud.seconds));
        let color = if hud.seconds < LOW_TIME_SECS { BAD } else { ACCENT };
        fb.put_right(HUD_ROW, &clock, color, BASE_BG);
    }
    fb.fill_row(HUD_ROW + 1, '─', DIM, BASE_BG);
    if let Some(d) = p.debug {
        let seed = d.seed.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
        fb.put_right(HUD_ROW + 1, &format!(" FPS {}  seed {} ", d.fps, seed), GOLD, BASE_BG);
    }

    compose_map(fb, scene);

    let status = scene.hud().map(|h| format!("-- {} --", h.mode.label()));
    compose_footer(
        fb,
        status.as_deref(),
        scene.command_line(),
        scene.feedback(),
        "h/j/k/l move   : command   :q menu   :help",
    );
}

fn compose_map(fb: &mut FrameBuffer, scene: &Scene) {
    let (Some(map), Some(target)) = (scene.map(), scene.target()) else {
        return;
    };
    let cam = scene.camera();
    let origin_x = target.col as usize;
    let origin_y = target.row as usize;
    let cursor = scene.cursor();

    for vy in 0..cam.view_h {
        for vx in 0..cam.view_w {
            let (mx, my) = cam.view_to_map(vx, vy);
            let (col, row) = (origin_x + vx, origin_y + vy);
            if mx < 0 || my < 0 || mx as usize >= map.width || my as usize >= map.height {
                fb.set(col, row, Cell::new(' ', DIM, VOID_BG));
                continue;
            }
            let (mx, my) = (mx as usize, my as usize);
            let ch = map.char_at(mx, my);
            let is_cursor = cursor.map_or(false, |c| c.x == mx && c.y == my);
            let is_coin = scene.coin_at(mx, my);

            let cell = if is_cursor {
                Cell::new(ch, Color::Black, if is_coin { GOLD } else { CURSOR_BG })
            } else if is_coin {
                Cell::new(if ch == ' ' { '●' } else { ch }, GOLD, GOLD_BG)
            } else {
                Cell::new(ch, TEXT, BASE_BG)
            };
            fb.set(col, row, cell);
        }
    }
}

// ── Level results ──

fn compose_summary(fb: &mut FrameBuffer, y: usize, s: &LevelSummary) {
    fb.put_str(8, y, &format!("◈ Score:      {}", s.score), Color::White, BASE_BG);
    fb.put_str(8, y + 1, &format!("◈ Coins:      {}/{}", s.coins_collected, s.total_coins), Color::White, BASE_BG);
    fb.put_str(8, y + 2, &format!("◈ Time left:  {}", format_clock(s.time_remaining)), Color::White, BASE_BG);
}

fn compose_level_complete(fb: &mut FrameBuffer, r: &ResultFrame) {
    compose_banner(fb, 6, 2, &format!("LEVEL {}  CLEAR", r.summary.level), GOOD);
    compose_summary(fb, 6, r.summary);
    fb.put_str(8, 10, "▸ ENTER: Next level", GOOD, BASE_BG);
    fb.put_str(8, 11, "▸ ESC:   Save and return to menu", DIM, BASE_BG);
}

fn compose_level_failed(fb: &mut FrameBuffer, r: &ResultFrame) {
    compose_banner(fb, 6, 2, "TIME'S  UP", BAD);
    compose_summary(fb, 6, r.summary);
    fb.put_str(8, 9, &format!("◈ Reached level {}", r.summary.level), Color::White, BASE_BG);
    if let Some(rank) = r.rank {
        fb.put_str(8, 10, &format!("★ New high score! Rank #{}", rank), GOLD, BASE_BG);
    }
    fb.put_str(8, 12, "▸ ENTER: Try again from level 1", GOOD, BASE_BG);
    fb.put_str(8, 13, "▸ ESC:   Back to menu", DIM, BASE_BG);
    compose_scores(fb, 8, 15, r.top_scores, r.rank);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::map::{Block, MapLayout, Position};
    use crate::domain::player::Mode;
    use crate::sim::leaderboard::ScoreEntry;
    use crate::sim::state::Coin;
    use crate::sim::view::GameView;
    use crate::ui::menu::MenuNavigator;

    fn buffer() -> FrameBuffer {
        FrameBuffer::new(80, 24)
    }

    fn scene() -> Scene {
        let mut scene = Scene::new();
        scene.attach(map_target(80, 24));
        scene.draw_map(&MapLayout {
            width: 10,
            height: 3,
            blocks: vec![Block { x: 0, y: 1, width: 4, text: "word".into() }],
            coin_positions: vec![],
        });
        scene.draw_cursor(1, 1);
        scene.center_camera(1, 1);
        scene.draw_coins(&[Coin::at(Position::new(3, 1))]);
        scene.hud_score(40);
        scene.hud_timer(5.0);
        scene.hud_mode(Mode::Normal);
        scene.hud_coins(1, 2);
        scene
    }

    #[test]
    fn viewport_leaves_room_for_hud_and_footer() {
        let t = map_target(80, 24);
        assert_eq!((t.col, t.row, t.width, t.height), (0, 2, 80, 19));
        assert_eq!(map_target(80, 3).height, 1);
    }

    #[test]
    fn playing_frame_shows_hud_map_and_mode() {
        let mut fb = buffer();
        let scene = scene();
        compose(&mut fb, &Frame::Playing(PlayingFrame { scene: &scene, level: 3, health: 2, debug: None }));

        let hud = fb.row_text(HUD_ROW);
        assert!(hud.contains("LEVEL 3"));
        assert!(hud.contains("SCORE 40"));
        assert!(hud.contains("COINS 1/2"));
        assert!(hud.ends_with("TIME 00:05"));
        assert_eq!(fb.get(79 - 1, HUD_ROW).fg, BAD);

        assert!(fb.row_text(21).contains("-- NORMAL --"));

        // The 10x3 map is centered in the 80x19 viewport
        let cam = scene.camera();
        let (col, row) = cam.map_to_view(1, 1).unwrap();
        let cursor = fb.get(col, MAP_ROW + row);
        assert_eq!(cursor.ch, 'o');
        assert_eq!(cursor.bg, CURSOR_BG);
        let (col, row) = cam.map_to_view(3, 1).unwrap();
        assert_eq!(fb.get(col, MAP_ROW + row).bg, GOLD_BG);
        assert_eq!(fb.get(0, MAP_ROW).bg, VOID_BG);
    }

    #[test]
    fn command_line_replaces_mode_line() {
        let mut fb = buffer();
        let mut scene = scene();
        scene.show_command_line(Some("hel"));
        scene.show_feedback("Unknown command: x", true);
        compose(&mut fb, &Frame::Playing(PlayingFrame { scene: &scene, level: 1, health: 3, debug: None }));
        assert_eq!(fb.row_text(21), ":hel█");
        assert_eq!(fb.row_text(22), " Unknown command: x");
        assert_eq!(fb.get(1, 22).fg, BAD);
    }

    #[test]
    fn debug_overlay_shows_fps_and_seed() {
        let mut fb = buffer();
        let scene = scene();
        let debug = Some(DebugInfo { fps: 60, seed: Some(7) });
        compose(&mut fb, &Frame::Playing(PlayingFrame { scene: &scene, level: 1, health: 3, debug }));
        assert!(fb.row_text(HUD_ROW + 1).contains("FPS 60  seed 7"));
    }

    #[test]
    fn multi_line_feedback_grows_upward() {
        let mut fb = buffer();
        let feedback = Feedback { message: "Available commands:\n  :q - quit\n  :help - help".into(), is_error: false };
        let nav = MenuNavigator::main_menu();
        compose(&mut fb, &Frame::Menu(MenuFrame {
            items: nav.items(),
            selected: 0,
            navigable: true,
            command_line: None,
            feedback: Some(&feedback),
            top_scores: &[],
        }));
        assert_eq!(fb.row_text(20), " Available commands:");
        assert_eq!(fb.row_text(22), "   :help - help");
    }

    #[test]
    fn menu_marks_focus_and_disabled_items() {
        let mut fb = buffer();
        let mut nav = MenuNavigator::main_menu();
        nav.set_item_enabled(crate::ui::command::CommandAction::ContinueGame, false);
        let scores = vec![RankedEntry { rank: 1, entry: ScoreEntry::now(120, 4) }];
        compose(&mut fb, &Frame::Menu(MenuFrame {
            items: nav.items(),
            selected: nav.selected(),
            navigable: true,
            command_line: None,
            feedback: None,
            top_scores: &scores,
        }));
        assert!(fb.row_text(6).contains("▸ New Game"));
        assert_eq!(fb.get(8, 7).fg, DIM);
        assert!(fb.row_text(11).contains("HIGH SCORES"));
        assert!(fb.row_text(12).contains(" 1.    120  L4"));
    }

    #[test]
    fn failed_screen_shows_rank() {
        let mut fb = buffer();
        let summary = LevelSummary { score: 90, level: 2, coins_collected: 3, total_coins: 9, time_remaining: 0.0 };
        compose(&mut fb, &Frame::LevelFailed(ResultFrame { summary: &summary, rank: Some(1), top_scores: &[] }));
        assert!(fb.row_text(3).contains("TIME'S  UP"));
        assert!(fb.row_text(6).contains("Score:      90"));
        assert!(fb.row_text(10).contains("Rank #1"));
    }

    #[test]
    fn banner_centers_title_in_box() {
        let mut fb = buffer();
        compose_banner(&mut fb, 0, 0, "ABCD", GOOD);
        assert_eq!(fb.row_text(0), format!("╔{}╗", "═".repeat(32)));
        assert_eq!(fb.row_text(1), format!("║{}ABCD{}║", " ".repeat(14), " ".repeat(14)));
        assert_eq!(fb.get(15, 1).fg, GOOD);

        // Longer than the box: no padding, no panic
        let long = "X".repeat(40);
        compose_banner(&mut fb, 0, 4, &long, GOOD);
        assert!(fb.row_text(5).starts_with("║XXXX"));
    }

    #[test]
    fn tiny_buffer_does_not_panic() {
        let mut fb = FrameBuffer::new(3, 2);
        let scene = scene();
        compose(&mut fb, &Frame::Playing(PlayingFrame { scene: &scene, level: 1, health: 3, debug: None }));
        compose(&mut fb, &Frame::Tutorial(TutorialFrame { command_line: Some("q"), feedback: None }));
    }
}
