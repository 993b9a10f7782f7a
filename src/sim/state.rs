/// GameState: the canonical snapshot of one playthrough.
///
/// Pure data mutation, no I/O. The active coordinator is the only owner.
///
/// ## Level invariants
///   - `level.collected_coins == count(coins where collected)`
///   - `level.collected_coins <= level.total_coins`
///   - collecting an already-collected or out-of-range coin is a no-op
///
/// ## Per-level vs. persistent fields
/// `initialize_level` replaces coins and clears the terminal flags.
/// Score, health, timer and unlocked motions carry over between levels.
///
/// The level countdown is a `Timer` owned here; the game loop advances it
/// through `advance_timer`, nobody pokes the raw value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::map::Position;
use crate::domain::player::Mode;
use crate::domain::timer::Timer;
use crate::error::GameResult;

pub const DEFAULT_LEVEL_TIME: f64 = 60.0;
pub const DEFAULT_HEALTH: u32 = 3;

const BASE_MOTIONS: &[&str] = &["h", "j", "k", "l"];
const LOCKED_MOTIONS: &[&str] = &["w", "b", "e"];

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct PlayerState {
    pub x: usize,
    pub y: usize,
    pub mode: Mode,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Coin {
    pub x: usize,
    pub y: usize,
    pub collected: bool,
}

impl Coin {
    pub fn at(pos: Position) -> Self {
        Coin { x: pos.x, y: pos.y, collected: false }
    }

    pub fn is_at(&self, x: usize, y: usize) -> bool {
        self.x == x && self.y == y
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelState {
    pub current: u32,
    pub coins: Vec<Coin>,
    pub total_coins: usize,
    pub collected_coins: usize,
}

impl Default for LevelState {
    fn default() -> Self {
        LevelState { current: 1, coins: vec![], total_coins: 0, collected_coins: 0 }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub player: PlayerState,
    pub level: LevelState,
    pub score: i64,
    pub timer: Timer,
    pub health: u32,
    pub unlocked_motions: BTreeMap<String, bool>,
    /// Progression counters, carried for forward compatibility.
    pub xp: u32,
    pub player_level: u32,
    pub is_paused: bool,
    pub is_game_over: bool,
    pub is_level_complete: bool,
}

impl GameState {
    pub fn new() -> Self {
        let mut timer = Timer::new(DEFAULT_LEVEL_TIME);
        timer.start();

        let unlocked_motions = BASE_MOTIONS
            .iter()
            .map(|m| (m.to_string(), true))
            .chain(LOCKED_MOTIONS.iter().map(|m| (m.to_string(), false)))
            .collect();

        GameState {
            player: PlayerState::default(),
            level: LevelState::default(),
            score: 0,
            timer,
            health: DEFAULT_HEALTH,
            unlocked_motions,
            xp: 0,
            player_level: 1,
            is_paused: false,
            is_game_over: false,
            is_level_complete: false,
        }
    }

    #[allow(dead_code)]
    pub fn reset(&mut self) {
        *self = GameState::new();
    }

    // ── Player ──

    pub fn update_player_position(&mut self, x: usize, y: usize) {
        self.player.x = x;
        self.player.y = y;
    }

    pub fn update_player_mode(&mut self, mode: Mode) {
        self.player.mode = mode;
    }

    // ── Scoring / vitals ──

    /// No floor here; negative points are the caller's business.
    pub fn add_score(&mut self, points: i64) {
        self.score += points;
    }

    /// Floored at 0, saturates at `u32::MAX`.
    pub fn update_health(&mut self, health: i64) {
        self.health = u32::try_from(health.max(0)).unwrap_or(u32::MAX);
    }

    // ── Timer ──

    /// Set remaining seconds (clamped at 0) and arm the countdown.
    pub fn update_timer(&mut self, seconds: f64) {
        self.timer.set_time(seconds);
        if self.timer.time() > 0.0 {
            self.timer.start();
        }
    }

    pub fn time_remaining(&self) -> f64 {
        self.timer.time()
    }

    /// Advance the countdown unless paused. Returns true on expiry.
    pub fn advance_timer(&mut self, delta_ms: f64) -> bool {
        if self.is_paused {
            return false;
        }
        self.timer.update(delta_ms)
    }

    // ── Level / coins ──

    pub fn initialize_level(&mut self, level_number: u32, coins: Vec<Coin>) {
        self.level.current = level_number;
        self.level.total_coins = coins.len();
        self.level.collected_coins = coins.iter().filter(|c| c.collected).count();
        self.level.coins = coins;
        self.is_level_complete = false;
        self.is_game_over = false;
    }

    /// Idempotent: only the first collection of a valid index counts.
    pub fn collect_coin(&mut self, index: usize) -> bool {
        match self.level.coins.get_mut(index) {
            Some(coin) if !coin.collected => {
                coin.collected = true;
                self.level.collected_coins += 1;
                true
            }
            _ => false,
        }
    }

    /// True for a level with no coins at all.
    pub fn all_coins_collected(&self) -> bool {
        self.level.collected_coins == self.level.total_coins
    }

    // ── Motions ──

    /// Unknown keys are ignored; unlocking is one-way.
    #[allow(dead_code)]
    pub fn unlock_motion(&mut self, key: &str) {
        if let Some(flag) = self.unlocked_motions.get_mut(key) {
            *flag = true;
        }
    }

    #[allow(dead_code)]
    pub fn is_motion_unlocked(&self, key: &str) -> bool {
        self.unlocked_motions.get(key).copied().unwrap_or(false)
    }

    // ── Flags ──

    pub fn pause(&mut self) {
        self.is_paused = true;
    }

    pub fn resume(&mut self) {
        self.is_paused = false;
    }

    pub fn set_game_over(&mut self) {
        self.is_game_over = true;
    }

    pub fn set_level_complete(&mut self) {
        self.is_level_complete = true;
    }

    // ── Serialization ──

    pub fn to_json(&self) -> GameResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    #[allow(dead_code)]
    pub fn from_json(json: &str) -> GameResult<GameState> {
        Ok(serde_json::from_str(json)?)
    }

    /// Overwrite every field from a serialized record.
    #[allow(dead_code)]
    pub fn restore_json(&mut self, json: &str) -> GameResult<()> {
        *self = GameState::from_json(json)?;
        Ok(())
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coins(n: usize) -> Vec<Coin> {
        (0..n).map(|i| Coin { x: i, y: 0, collected: false }).collect()
    }

    #[test]
    fn defaults() {
        let s = GameState::new();
        assert_eq!(s.level.current, 1);
        assert_eq!(s.score, 0);
        assert_eq!(s.time_remaining(), DEFAULT_LEVEL_TIME);
        assert_eq!(s.health, DEFAULT_HEALTH);
        assert!(s.is_motion_unlocked("h"));
        assert!(s.is_motion_unlocked("l"));
        assert!(!s.is_motion_unlocked("w"));
        assert!(!s.is_paused && !s.is_game_over && !s.is_level_complete);
    }

    #[test]
    fn collecting_same_coin_twice_counts_once() {
        let mut s = GameState::new();
        s.initialize_level(1, coins(3));
        assert!(s.collect_coin(2));
        assert!(!s.collect_coin(2));
        assert!(!s.collect_coin(2));
        assert_eq!(s.level.collected_coins, 1);
        assert!(s.level.coins[2].collected);
    }

    #[test]
    fn out_of_range_collect_is_noop() {
        let mut s = GameState::new();
        s.initialize_level(1, coins(2));
        assert!(!s.collect_coin(2));
        assert!(!s.collect_coin(usize::MAX));
        assert_eq!(s.level.collected_coins, 0);
    }

    #[test]
    fn collected_count_tracks_distinct_indices() {
        let mut s = GameState::new();
        s.initialize_level(1, coins(5));
        for i in [0, 3, 0, 4, 3, 3, 9] {
            s.collect_coin(i);
        }
        assert_eq!(s.level.collected_coins, 3);
        let flagged = s.level.coins.iter().filter(|c| c.collected).count();
        assert_eq!(flagged, s.level.collected_coins);
    }

    #[test]
    fn all_coins_collected_edge_cases() {
        let mut s = GameState::new();
        s.initialize_level(1, vec![]);
        assert!(s.all_coins_collected());

        s.initialize_level(2, coins(2));
        assert!(!s.all_coins_collected());
        s.collect_coin(0);
        assert!(!s.all_coins_collected());
        s.collect_coin(1);
        assert!(s.all_coins_collected());
    }

    #[test]
    fn initialize_level_counts_precollected_and_keeps_progress() {
        let mut s = GameState::new();
        s.add_score(40);
        s.update_health(1);
        s.unlock_motion("w");
        s.set_game_over();
        s.set_level_complete();

        let mut cs = coins(3);
        cs[1].collected = true;
        s.initialize_level(4, cs);

        assert_eq!(s.level.current, 4);
        assert_eq!(s.level.total_coins, 3);
        assert_eq!(s.level.collected_coins, 1);
        assert!(!s.is_game_over && !s.is_level_complete);
        assert_eq!(s.score, 40);
        assert_eq!(s.health, 1);
        assert!(s.is_motion_unlocked("w"));
    }

    #[test]
    fn health_floors_at_zero() {
        let mut s = GameState::new();
        s.update_health(-5);
        assert_eq!(s.health, 0);
        s.update_health(12);
        assert_eq!(s.health, 12);
    }

    #[test]
    fn health_saturates_instead_of_wrapping() {
        let mut s = GameState::new();
        s.update_health(1_i64 << 32);
        assert_eq!(s.health, u32::MAX);
        s.update_health((1_i64 << 32) + 3);
        assert_eq!(s.health, u32::MAX);
        s.update_health(u32::MAX as i64);
        assert_eq!(s.health, u32::MAX);
    }

    #[test]
    fn add_score_accepts_negative() {
        let mut s = GameState::new();
        s.add_score(10);
        s.add_score(-25);
        assert_eq!(s.score, -15);
    }

    #[test]
    fn unlock_ignores_unknown_motion() {
        let mut s = GameState::new();
        let before = s.unlocked_motions.clone();
        s.unlock_motion("z");
        assert_eq!(s.unlocked_motions, before);
        s.unlock_motion("e");
        assert!(s.is_motion_unlocked("e"));
    }

    #[test]
    fn timer_freezes_while_paused() {
        let mut s = GameState::new();
        s.update_timer(10.0);
        s.pause();
        s.advance_timer(5_000.0);
        assert_eq!(s.time_remaining(), 10.0);
        s.resume();
        s.advance_timer(5_000.0);
        assert_eq!(s.time_remaining(), 5.0);
    }

    #[test]
    fn update_timer_clamps() {
        let mut s = GameState::new();
        s.update_timer(-3.0);
        assert_eq!(s.time_remaining(), 0.0);
    }

    #[test]
    fn flag_setters_touch_only_their_flag() {
        let mut s = GameState::new();
        s.initialize_level(1, coins(1));
        let before = s.clone();
        s.pause();
        s.set_game_over();
        assert_eq!(s.level, before.level);
        assert_eq!(s.score, before.score);
        assert!(s.is_paused && s.is_game_over && !s.is_level_complete);
    }

    #[test]
    fn json_round_trip_is_exact() {
        let mut s = GameState::new();
        s.initialize_level(3, coins(4));
        s.collect_coin(1);
        s.update_player_position(7, 2);
        s.update_player_mode(Mode::Visual);
        s.add_score(130);
        s.update_timer(42.125);
        s.advance_timer(1_000.0 / 60.0);
        s.update_health(2);
        s.unlock_motion("b");
        s.xp = 17;
        s.player_level = 2;
        s.pause();

        let json = s.to_json().unwrap();
        let mut restored = GameState::new();
        restored.restore_json(&json).unwrap();
        assert_eq!(restored, s);
    }

    #[test]
    fn serialized_field_names_are_camel_case() {
        let json = GameState::new().to_json().unwrap();
        assert!(json.contains("\"unlockedMotions\""));
        assert!(json.contains("\"collectedCoins\""));
        assert!(json.contains("\"isLevelComplete\""));
        assert!(json.contains("\"mode\":\"normal\""));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut s = GameState::new();
        s.add_score(99);
        s.initialize_level(5, coins(2));
        s.pause();
        s.reset();
        assert_eq!(s, GameState::new());
    }
}
