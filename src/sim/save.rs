/// Save/continue persistence.
///
/// ## Layers
///   - `BlobStore`: string blobs under fixed keys (get / set / remove)
///   - `FileBlobStore`: one `<dir>/<key>.json` file per key
///   - `SaveManager`: the single save slot, a JSON `SaveBlob`
///
/// ## Blob shape
/// `game` is the `GameState` record (absent after a failed level or a
/// fresh install), `mapSeed` regenerates the same map for a mid-level
/// snapshot, `tutorialCompleted` outlives the game itself.
///
/// Corrupt blobs read as "no save" with a warning, never as an error.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::GameResult;
use crate::sim::state::GameState;

pub const SAVE_KEY: &str = "vim-arcade-save";

pub trait BlobStore {
    fn get(&self, key: &str) -> GameResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> GameResult<()>;
    fn remove(&self, key: &str) -> GameResult<()>;
}

// ══════════════════════════════════════════════════════════════
// File-backed store
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileBlobStore { dir: dir.into() }
    }

    #[allow(dead_code)]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> GameResult<Option<String>> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> GameResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> GameResult<()> {
        match std::fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Where saves, the leaderboard and the log live when the config does
/// not say otherwise.
pub fn default_data_dir() -> PathBuf {
    // Next to the executable, if that directory is writable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let probe = parent.join(".write_test_vimarcade");
            if std::fs::write(&probe, "").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return parent.to_path_buf();
            }
        }
    }

    // XDG data home for system installs
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(home).join(".local/share/vimarcade");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ══════════════════════════════════════════════════════════════
// Save slot
// ══════════════════════════════════════════════════════════════

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveBlob {
    pub game: Option<GameState>,
    pub map_seed: Option<u64>,
    pub tutorial_completed: bool,
}

#[derive(Clone, Debug)]
pub struct SaveManager<S: BlobStore> {
    store: S,
}

impl<S: BlobStore> SaveManager<S> {
    pub fn new(store: S) -> Self {
        SaveManager { store }
    }

    pub fn save(&self, blob: &SaveBlob) -> GameResult<()> {
        let json = serde_json::to_string(blob)?;
        self.store.set(SAVE_KEY, &json)
    }

    /// `None` when nothing is saved or the blob does not parse.
    pub fn load(&self) -> Option<SaveBlob> {
        let raw = match self.store.get(SAVE_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("could not read save: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(blob) => Some(blob),
            Err(e) => {
                log::warn!("ignoring corrupt save: {}", e);
                None
            }
        }
    }

    #[allow(dead_code)]
    pub fn has(&self) -> bool {
        matches!(self.store.get(SAVE_KEY), Ok(Some(_)))
    }

    pub fn delete(&self) -> GameResult<()> {
        self.store.remove(SAVE_KEY)
    }

    // ── Field-level helpers (read-modify-write) ──

    /// True when there is a game to continue.
    pub fn has_game(&self) -> bool {
        self.load().map(|b| b.game.is_some()).unwrap_or(false)
    }

    /// Store a game, keeping the tutorial flag.
    pub fn save_game(&self, state: &GameState, map_seed: Option<u64>) -> GameResult<()> {
        let mut blob = self.load().unwrap_or_default();
        blob.game = Some(state.clone());
        blob.map_seed = map_seed;
        self.save(&blob)
    }

    /// Drop the game, keeping the tutorial flag.
    pub fn clear_game(&self) -> GameResult<()> {
        let Some(mut blob) = self.load() else {
            return self.delete();
        };
        blob.game = None;
        blob.map_seed = None;
        self.save(&blob)
    }

    pub fn tutorial_completed(&self) -> bool {
        self.load().map(|b| b.tutorial_completed).unwrap_or(false)
    }

    pub fn set_tutorial_completed(&self, completed: bool) -> GameResult<()> {
        let mut blob = self.load().unwrap_or_default();
        blob.tutorial_completed = completed;
        self.save(&blob)
    }
}
