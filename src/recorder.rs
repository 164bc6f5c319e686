use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::error::Result;
use crate::models::{GameMode, ProgressData, ProgressHistoryEntry};

/// Where progress lives between sessions.
///
/// `set` persists everything except `history`; history only grows through
/// `append` and only shrinks through `clear`.
pub trait ProgressStore {
    fn get(&self) -> Result<Option<ProgressData>>;
    fn set(&self, data: &ProgressData) -> Result<()>;
    fn append(&self, entry: &ProgressHistoryEntry) -> Result<()>;
    fn clear(&self) -> Result<()>;

    /// `set` followed by `append`. Stores that can should apply both or
    /// neither.
    fn record(&self, data: &ProgressData, entry: &ProgressHistoryEntry) -> Result<()> {
        self.set(data)?;
        self.append(entry)
    }
}

impl<S: ProgressStore + ?Sized> ProgressStore for &S {
    fn get(&self) -> Result<Option<ProgressData>> {
        (**self).get()
    }

    fn set(&self, data: &ProgressData) -> Result<()> {
        (**self).set(data)
    }

    fn append(&self, entry: &ProgressHistoryEntry) -> Result<()> {
        (**self).append(entry)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }

    fn record(&self, data: &ProgressData, entry: &ProgressHistoryEntry) -> Result<()> {
        (**self).record(data, entry)
    }
}

/// Best scores, completed levels and history on top of a [`ProgressStore`].
pub struct ScoreRecorder<S> {
    store: S,
}

impl<S: ProgressStore> ScoreRecorder<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn load(&self, now: DateTime<Utc>) -> Result<ProgressData> {
        Ok(self.store.get()?.unwrap_or_else(|| ProgressData::new(now)))
    }

    pub fn record_score(&self, mode: GameMode, score: u32, level: Option<u32>) -> Result<ProgressData> {
        self.record_score_at(mode, score, level, Utc::now())
    }

    pub fn record_score_at(
        &self,
        mode: GameMode,
        score: u32,
        level: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<ProgressData> {
        let mut progress = self.load(now)?;

        let best = progress.best_scores.entry(mode).or_insert(0);
        if score > *best {
            debug!(mode = mode.as_str(), previous = *best, score, "new best score");
            *best = score;
        }
        progress.last_played = now;

        let entry = ProgressHistoryEntry {
            recorded_at: now,
            mode,
            score,
            level,
        };
        self.store.record(&progress, &entry)?;
        progress.history.push(entry);

        Ok(progress)
    }

    /// Marks `level` complete. Returns false if it already was.
    pub fn record_level(&self, level: u32) -> Result<bool> {
        self.record_level_at(level, Utc::now())
    }

    pub fn record_level_at(&self, level: u32, now: DateTime<Utc>) -> Result<bool> {
        let mut progress = self.load(now)?;
        if progress.completed_levels.contains(&level) {
            return Ok(false);
        }

        progress.completed_levels.push(level);
        progress.completed_levels.sort_unstable();
        progress.last_played = now;
        self.store.set(&progress)?;
        debug!(level, "level completed");
        Ok(true)
    }

    pub fn progress(&self) -> Result<ProgressData> {
        self.load(Utc::now())
    }

    pub fn best_scores(&self) -> Result<BTreeMap<GameMode, u32>> {
        Ok(self.progress()?.best_scores)
    }

    /// Entries from the last `days` days, oldest first. A window reaching
    /// past the earliest representable time returns everything.
    pub fn history(&self, days: u32) -> Result<Vec<ProgressHistoryEntry>> {
        self.history_at(days, Utc::now())
    }

    pub fn history_at(&self, days: u32, now: DateTime<Utc>) -> Result<Vec<ProgressHistoryEntry>> {
        let cutoff = Duration::try_days(i64::from(days)).and_then(|d| now.checked_sub_signed(d));
        let mut entries: Vec<ProgressHistoryEntry> = self
            .load(now)?
            .history
            .into_iter()
            .filter(|e| cutoff.map_or(true, |c| e.recorded_at >= c))
            .collect();
        entries.sort_by_key(|e| e.recorded_at);
        Ok(entries)
    }

    pub fn reset(&self) -> Result<()> {
        self.store.clear()
    }
}
