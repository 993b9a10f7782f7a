/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD or the
/// XDG data home, first hit wins. Missing files and missing keys fall
/// back to defaults; a file that does not parse is reported and ignored.
///
/// The logger is not up yet when this runs (its file lives in the data
/// directory configured here), so problems are returned as warnings for
/// `main` to log once it is.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::map::MapGenerator;
use crate::sim::coordinator::CoordinatorSettings;
use crate::sim::save;

pub const CONFIG_FILE: &str = "config.toml";

// ── Public Config Struct ──

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_level_time")]
    pub level_time_secs: f64,
    #[serde(default = "default_frame_sleep")]
    pub frame_sleep_ms: u64,
    #[serde(default = "default_movement_speed")]
    pub movement_speed_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_map_width")]
    pub width: usize,
    #[serde(default = "default_map_height")]
    pub height: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_coin_value")]
    pub coin_value: i64,
    #[serde(default = "default_start_health")]
    pub start_health: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub debug: bool,
}

// ── Defaults ──

fn default_level_time() -> f64 { 60.0 }
fn default_frame_sleep() -> u64 { 5 }
fn default_movement_speed() -> u64 { 150 }
fn default_map_width() -> usize { 40 }
fn default_map_height() -> usize { 20 }
fn default_coin_value() -> i64 { 10 }
fn default_start_health() -> u32 { 3 }

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            level_time_secs: default_level_time(),
            frame_sleep_ms: default_frame_sleep(),
            movement_speed_ms: default_movement_speed(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            width: default_map_width(),
            height: default_map_height(),
            seed: None,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            coin_value: default_coin_value(),
            start_health: default_start_health(),
        }
    }
}

// ── Loading ──

pub struct LoadedConfig {
    pub config: Config,
    /// File the settings came from, `None` for built-in defaults.
    pub source: Option<PathBuf>,
    pub warnings: Vec<String>,
}

impl Config {
    /// Search order: (1) exe directory, (2) CWD, (3) ~/.local/share/vimarcade.
    pub fn load() -> LoadedConfig {
        Config::load_from(&candidate_dirs())
    }

    pub fn load_from(search_dirs: &[PathBuf]) -> LoadedConfig {
        let mut warnings = vec![];
        for dir in search_dirs {
            let path = dir.join(CONFIG_FILE);
            if !path.exists() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    return match Config::parse(&text) {
                        Ok(mut config) => {
                            warnings.extend(config.sanitize());
                            LoadedConfig { config, source: Some(path), warnings }
                        }
                        Err(e) => {
                            warnings.push(format!("{} parse error, using defaults: {}", path.display(), e));
                            LoadedConfig { config: Config::default(), source: None, warnings }
                        }
                    };
                }
                Err(e) => warnings.push(format!("could not read {}: {}", path.display(), e)),
            }
        }
        LoadedConfig { config: Config::default(), source: None, warnings }
    }

    pub fn parse(text: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(text)
    }

    /// Replace values the game cannot run with by their defaults.
    /// Returns one warning per replaced value.
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut warnings = vec![];
        let secs = self.timing.level_time_secs;
        if !(secs.is_finite() && secs > 0.0) {
            self.timing.level_time_secs = default_level_time();
            warnings.push(format!(
                "timing.level_time_secs must be positive (got {}), using {}",
                secs, self.timing.level_time_secs
            ));
        }
        if self.map.width == 0 || self.map.height == 0 {
            warnings.push(format!(
                "map size must be non-zero (got {}x{}), using {}x{}",
                self.map.width, self.map.height, default_map_width(), default_map_height()
            ));
            self.map.width = default_map_width();
            self.map.height = default_map_height();
        }
        warnings
    }

    /// Saves, leaderboard and log file location.
    pub fn data_dir(&self) -> PathBuf {
        match &self.general.data_dir {
            Some(dir) => dir.clone(),
            None => save::default_data_dir(),
        }
    }

    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            coin_value: self.scoring.coin_value,
            level_time_secs: self.timing.level_time_secs,
            start_health: self.scoring.start_health,
            movement_speed_ms: self.timing.movement_speed_ms,
            seed: self.map.seed,
        }
    }

    pub fn map_generator(&self) -> MapGenerator {
        MapGenerator::new(self.map.width, self.map.height)
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = vec![];
    let mut push = |dir: PathBuf| {
        if !dirs.iter().any(|d| d == &dir) {
            dirs.push(dir);
        }
    };

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so an installed link still finds the real binary's dir
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        push(cwd);
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = Path::new(&home).join(".local/share/vimarcade");
        if xdg.is_dir() {
            push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }
    dirs
}
