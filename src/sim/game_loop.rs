/// Fixed-timestep game loop.
///
/// ## Iteration
///   1. delta = now - last_time, added to the accumulator
///   2. while accumulator >= FIXED_STEP_MS: update(FIXED_STEP_MS)
///   3. render exactly once
///   4. check win, else check lose
///
/// The loop never owns game data. `GameState` and the hook bundle are
/// handed in for every iteration by whoever owns them (the coordinator),
/// so stopping from inside a win/lose hook is just a flag flip.
///
/// "Scheduling" is cooperative: the driver calls `frame()` as often as it
/// likes and the loop only runs while an iteration is scheduled. `tick()`
/// runs exactly one iteration with a synthetic delta for tests.

use std::time::Instant;

use crate::sim::state::GameState;

/// Logic rate: 60 updates per second.
pub const FIXED_STEP_MS: f64 = 1000.0 / 60.0;

/// FPS is not reported until this much time has passed since `start`.
const FPS_WARMUP_MS: f64 = 1000.0;

/// Millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        MonotonicClock::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Per-iteration callbacks. Every slot is optional: the defaults do nothing.
pub trait LoopHooks {
    /// Called once per fixed step, also while paused.
    fn on_update(&mut self, _state: &mut GameState, _delta_ms: f64) {}
    fn on_render(&mut self, _state: &GameState) {}
    fn on_win(&mut self, _state: &mut GameState) {}
    fn on_lose(&mut self, _state: &mut GameState) {}
}

impl LoopHooks for () {}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LevelOutcome {
    Won,
    Lost,
}

pub struct GameLoop<C: Clock = MonotonicClock> {
    clock: C,
    running: bool,
    scheduled: bool,
    last_time: f64,
    accumulator: f64,
    /// Fixed updates since construction.
    frame_count: u64,
    /// Fixed updates since the last `start`, for FPS.
    fps_frame_count: u64,
    fps_start: f64,
}

impl GameLoop<MonotonicClock> {
    pub fn new() -> Self {
        GameLoop::with_clock(MonotonicClock::new())
    }
}

impl Default for GameLoop<MonotonicClock> {
    fn default() -> Self {
        GameLoop::new()
    }
}

impl<C: Clock> GameLoop<C> {
    pub fn with_clock(clock: C) -> Self {
        GameLoop {
            clock,
            running: false,
            scheduled: false,
            last_time: 0.0,
            accumulator: 0.0,
            frame_count: 0,
            fps_frame_count: 0,
            fps_start: 0.0,
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Lifecycle
    // ══════════════════════════════════════════════════════════════

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_time = self.clock.now_ms();
        self.fps_start = self.last_time;
        self.fps_frame_count = 0;
        self.scheduled = true;
        log::debug!("game loop started");
    }

    /// Safe to call repeatedly. Cancels the pending iteration.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.scheduled = false;
        log::debug!("game loop stopped after {} updates", self.frame_count);
    }

    #[allow(dead_code)]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[allow(dead_code)]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    // ══════════════════════════════════════════════════════════════
    // Iteration
    // ══════════════════════════════════════════════════════════════

    /// Run the scheduled iteration against wall-clock time, if any.
    pub fn frame(&mut self, state: &mut GameState, hooks: &mut impl LoopHooks) -> Option<LevelOutcome> {
        if !self.scheduled {
            return None;
        }
        let now = self.clock.now_ms();
        self.iterate(now, state, hooks)
    }

    /// One iteration as if `delta_ms` had passed since the previous one.
    pub fn tick(&mut self, delta_ms: f64, state: &mut GameState, hooks: &mut impl LoopHooks) -> Option<LevelOutcome> {
        let now = self.last_time + delta_ms;
        self.iterate(now, state, hooks)
    }

    fn iterate(&mut self, now: f64, state: &mut GameState, hooks: &mut impl LoopHooks) -> Option<LevelOutcome> {
        if !self.running {
            return None;
        }
        self.scheduled = false;

        let delta = now - self.last_time;
        self.last_time = now;
        self.accumulator += delta;

        while self.accumulator >= FIXED_STEP_MS {
            self.update(FIXED_STEP_MS, state, hooks);
            self.accumulator -= FIXED_STEP_MS;
            self.frame_count += 1;
            self.fps_frame_count += 1;
        }

        hooks.on_render(state);

        let outcome = self.check_game_conditions(state, hooks);

        if self.running {
            self.scheduled = true;
        }
        outcome
    }

    /// Advance the level clock unless paused, then run the update hook.
    pub fn update(&mut self, delta_ms: f64, state: &mut GameState, hooks: &mut impl LoopHooks) {
        state.advance_timer(delta_ms);
        hooks.on_update(state, delta_ms);
    }

    /// Win takes precedence: a frame that is both won and out of time is a win.
    pub fn check_game_conditions(&mut self, state: &mut GameState, hooks: &mut impl LoopHooks) -> Option<LevelOutcome> {
        if state.all_coins_collected() && !state.is_level_complete {
            state.set_level_complete();
            self.stop();
            log::info!("level {} complete, score {}", state.level.current, state.score);
            hooks.on_win(state);
            Some(LevelOutcome::Won)
        } else if state.time_remaining() <= 0.0 && !state.is_game_over && !state.is_level_complete {
            state.set_game_over();
            self.stop();
            log::info!("level {} failed: out of time", state.level.current);
            hooks.on_lose(state);
            Some(LevelOutcome::Lost)
        } else {
            None
        }
    }

    // ── Pause ──

    pub fn pause(&mut self, state: &mut GameState) {
        state.pause();
    }

    pub fn resume(&mut self, state: &mut GameState) {
        state.resume();
    }

    #[allow(dead_code)]
    pub fn toggle_pause(&mut self, state: &mut GameState) {
        if state.is_paused {
            self.resume(state);
        } else {
            self.pause(state);
        }
    }

    /// Fixed updates per second since `start`, rounded. 0 during warm-up.
    pub fn average_fps(&self) -> u32 {
        let elapsed = self.clock.now_ms() - self.fps_start;
        if elapsed < FPS_WARMUP_MS {
            return 0;
        }
        (self.fps_frame_count as f64 / elapsed * 1000.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::sim::state::Coin;

    /// Clock whose time only moves when a test moves it.
    #[derive(Clone, Default)]
    struct ManualClock {
        now: Rc<Cell<f64>>,
    }

    impl ManualClock {
        fn advance(&self, ms: f64) {
            self.now.set(self.now.get() + ms);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> f64 {
            self.now.get()
        }
    }

    #[derive(Default)]
    struct Recorder {
        updates: u32,
        renders: u32,
        wins: u32,
        losses: u32,
        paused_updates: u32,
    }

    impl LoopHooks for Recorder {
        fn on_update(&mut self, state: &mut GameState, _delta_ms: f64) {
            self.updates += 1;
            if state.is_paused {
                self.paused_updates += 1;
            }
        }
        fn on_render(&mut self, _state: &GameState) {
            self.renders += 1;
        }
        fn on_win(&mut self, _state: &mut GameState) {
            self.wins += 1;
        }
        fn on_lose(&mut self, _state: &mut GameState) {
            self.losses += 1;
        }
    }

    fn state_with_coins(n: usize, seconds: f64) -> GameState {
        let mut s = GameState::new();
        let coins = (0..n).map(|i| Coin { x: i, y: 0, collected: false }).collect();
        s.initialize_level(1, coins);
        s.update_timer(seconds);
        s
    }

    fn started() -> (GameLoop<ManualClock>, ManualClock) {
        let clock = ManualClock::default();
        let mut gl = GameLoop::with_clock(clock.clone());
        gl.start();
        (gl, clock)
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let (mut gl, _) = started();
        gl.start();
        assert!(gl.is_running());
        gl.stop();
        gl.stop();
        assert!(!gl.is_running());
    }

    #[test]
    fn accumulator_runs_whole_steps_only() {
        let (mut gl, _) = started();
        let mut s = state_with_coins(1, 60.0);
        let mut rec = Recorder::default();

        gl.tick(FIXED_STEP_MS / 2.0, &mut s, &mut rec);
        assert_eq!(rec.updates, 0);
        assert_eq!(rec.renders, 1);

        gl.tick(FIXED_STEP_MS / 2.0 + 0.001, &mut s, &mut rec);
        assert_eq!(rec.updates, 1);

        gl.tick(FIXED_STEP_MS * 3.0, &mut s, &mut rec);
        assert_eq!(rec.updates, 4);
        assert_eq!(rec.renders, 3);
    }

    #[test]
    fn timer_runs_out_and_lose_fires_once() {
        let (mut gl, _) = started();
        let mut s = state_with_coins(2, 0.05);
        let mut rec = Recorder::default();

        let mut lost = 0;
        for _ in 0..10 {
            if gl.tick(16.67, &mut s, &mut rec) == Some(LevelOutcome::Lost) {
                lost += 1;
            }
        }
        assert_eq!(lost, 1);
        assert_eq!(rec.losses, 1);
        assert_eq!(rec.wins, 0);
        assert!(!gl.is_running());
        assert!(s.is_game_over);
        assert_eq!(s.time_remaining(), 0.0);

        gl.tick(16.67, &mut s, &mut rec);
        assert_eq!(rec.losses, 1);
    }

    #[test]
    fn win_beats_lose_on_the_same_frame() {
        let (mut gl, _) = started();
        let mut s = state_with_coins(1, 0.0);
        s.collect_coin(0);
        let mut rec = Recorder::default();

        let outcome = gl.tick(16.67, &mut s, &mut rec);
        assert_eq!(outcome, Some(LevelOutcome::Won));
        assert_eq!(rec.wins, 1);
        assert_eq!(rec.losses, 0);
        assert!(s.is_level_complete);
        assert!(!s.is_game_over);
    }

    #[test]
    fn paused_loop_still_renders_and_updates_but_freezes_time() {
        let (mut gl, _) = started();
        let mut s = state_with_coins(1, 10.0);
        let mut rec = Recorder::default();

        gl.pause(&mut s);
        for _ in 0..30 {
            gl.tick(FIXED_STEP_MS, &mut s, &mut rec);
        }
        assert_eq!(s.time_remaining(), 10.0);
        assert_eq!(rec.renders, 30);
        assert_eq!(rec.paused_updates, rec.updates);
        assert!(rec.updates >= 29);

        gl.toggle_pause(&mut s);
        assert!(!s.is_paused);
        gl.tick(1_000.0, &mut s, &mut rec);
        assert!(s.time_remaining() < 10.0);
    }

    #[test]
    fn stopped_loop_ignores_ticks_and_frames() {
        let (mut gl, clock) = started();
        let mut s = state_with_coins(1, 10.0);
        let mut rec = Recorder::default();
        gl.stop();
        clock.advance(500.0);
        assert_eq!(gl.frame(&mut s, &mut rec), None);
        gl.tick(500.0, &mut s, &mut rec);
        assert_eq!(rec.renders, 0);
        assert_eq!(s.time_remaining(), 10.0);
    }

    #[test]
    fn frame_uses_clock_delta() {
        let (mut gl, clock) = started();
        let mut s = state_with_coins(1, 10.0);
        let mut rec = Recorder::default();

        clock.advance(FIXED_STEP_MS * 2.0 + 0.5);
        gl.frame(&mut s, &mut rec);
        assert_eq!(rec.updates, 2);
        assert_eq!(rec.renders, 1);
    }

    #[test]
    fn empty_level_wins_immediately() {
        let (mut gl, _) = started();
        let mut s = state_with_coins(0, 60.0);
        assert_eq!(gl.tick(0.0, &mut s, &mut ()), Some(LevelOutcome::Won));
    }

    #[test]
    fn fps_waits_for_a_second_of_data() {
        let (mut gl, clock) = started();
        let mut s = state_with_coins(1, 60.0);

        for _ in 0..30 {
            clock.advance(FIXED_STEP_MS);
            gl.frame(&mut s, &mut ());
        }
        assert_eq!(gl.average_fps(), 0);

        for _ in 0..40 {
            clock.advance(FIXED_STEP_MS);
            gl.frame(&mut s, &mut ());
        }
        let fps = gl.average_fps();
        assert!((59..=61).contains(&fps), "fps was {}", fps);
    }
}
