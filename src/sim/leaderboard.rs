/// Top-10 high score table, persisted through a `BlobStore`.
///
/// Entries are kept sorted by score, highest first. Equal scores keep
/// their insertion order, so an older entry outranks a newer tie.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::sim::save::BlobStore;

pub const LEADERBOARD_KEY: &str = "vim-arcade-leaderboard";
pub const MAX_SCORES: usize = 10;

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub score: i64,
    pub level: u32,
    pub date: DateTime<Local>,
}

impl ScoreEntry {
    pub fn now(score: i64, level: u32) -> Self {
        ScoreEntry { score, level, date: Local::now() }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct RankedEntry {
    pub rank: usize,
    pub entry: ScoreEntry,
}

pub struct Leaderboard<S: BlobStore> {
    store: S,
}

impl<S: BlobStore> Leaderboard<S> {
    pub fn new(store: S) -> Self {
        Leaderboard { store }
    }

    pub fn add_score(&self, entry: ScoreEntry) {
        let mut scores = self.load_scores();
        scores.push(entry);
        // stable: ties keep insertion order
        scores.sort_by(|a, b| b.score.cmp(&a.score));
        scores.truncate(MAX_SCORES);
        self.save_scores(&scores);
    }

    pub fn top_scores(&self, limit: usize) -> Vec<RankedEntry> {
        self.load_scores()
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, entry)| RankedEntry { rank: i + 1, entry })
            .collect()
    }

    /// 1-based rank `score` would get if added now. Does not store it.
    pub fn rank_for_score(&self, score: i64) -> usize {
        let scores = self.load_scores();
        scores
            .iter()
            .position(|e| score > e.score)
            .map(|i| i + 1)
            .unwrap_or(scores.len() + 1)
    }

    /// Would `score` make it onto the board?
    #[allow(dead_code)]
    pub fn qualifies(&self, score: i64) -> bool {
        self.rank_for_score(score) <= MAX_SCORES
    }

    #[allow(dead_code)]
    pub fn clear(&self) {
        if let Err(e) = self.store.remove(LEADERBOARD_KEY) {
            log::warn!("could not clear leaderboard: {}", e);
        }
    }

    fn load_scores(&self) -> Vec<ScoreEntry> {
        let raw = match self.store.get(LEADERBOARD_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return vec![],
            Err(e) => {
                log::warn!("could not read leaderboard: {}", e);
                return vec![];
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::warn!("ignoring corrupt leaderboard: {}", e);
            vec![]
        })
    }

    fn save_scores(&self, scores: &[ScoreEntry]) {
        let result = serde_json::to_string(scores)
            .map_err(Into::into)
            .and_then(|json| self.store.set(LEADERBOARD_KEY, &json));
        if let Err(e) = result {
            log::warn!("could not save leaderboard: {}", e);
        }
    }
}
