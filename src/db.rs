use chrono::{DateTime, Duration, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use crate::error;
use crate::models::{GameMode, ProgressData, ProgressHistoryEntry, Profile};
use crate::progression::{apply_xp, LevelingPolicy, ProgressionState, XpAmount, XpApplied};
use crate::recorder::ProgressStore;

pub struct Database {
    conn: Connection,
}

fn parse_timestamp(idx: usize, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_mode(idx: usize, raw: &str) -> Result<GameMode> {
    GameMode::from_str(raw)
        .ok_or_else(|| rusqlite::Error::InvalidColumnType(idx, format!("mode '{}'", raw), Type::Text))
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            -- Single local player
            CREATE TABLE IF NOT EXISTS profile (
                id INTEGER PRIMARY KEY CHECK(id = 1),
                xp INTEGER NOT NULL DEFAULT 0 CHECK(xp >= 0),
                level INTEGER NOT NULL DEFAULT 1 CHECK(level >= 1),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS best_scores (
                mode TEXT PRIMARY KEY CHECK(mode IN ('treble', 'bass', 'both', 'ear-training', 'sight-reading')),
                score INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS completed_levels (
                level INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS progress_meta (
                id INTEGER PRIMARY KEY CHECK(id = 1),
                last_played TEXT NOT NULL
            );

            -- Append-only score history
            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recorded_at TEXT NOT NULL,
                mode TEXT NOT NULL,
                score INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_history_recorded_at ON history(recorded_at);
            CREATE INDEX IF NOT EXISTS idx_history_mode ON history(mode);

            INSERT OR IGNORE INTO profile (id, xp, level) VALUES (1, 0, 1);
            "#,
        )?;

        // Run migrations for existing databases
        self.migrate()?;

        Ok(())
    }

    // Handle schema migrations for existing databases
    fn migrate(&self) -> Result<()> {
        // History rows gained an optional level tag
        let has_level: bool = self
            .conn
            .prepare("SELECT level FROM history LIMIT 1")
            .is_ok();

        if !has_level {
            self.conn
                .execute_batch("ALTER TABLE history ADD COLUMN level INTEGER;")?;
            debug!("migrated history table: added level column");
        }

        Ok(())
    }

    // Profile operations
    fn read_profile(conn: &Connection) -> Result<Profile> {
        let profile = conn
            .query_row("SELECT xp, level FROM profile WHERE id = 1", [], |row| {
                let xp: i64 = row.get(0)?;
                Ok(Profile {
                    xp: xp.max(0) as u64,
                    level: row.get(1)?,
                })
            })
            .optional()?;

        Ok(profile.unwrap_or_default())
    }

    pub fn get_profile(&self) -> Result<Profile> {
        Self::read_profile(&self.conn)
    }

    /// Read-modify-write of the profile in one transaction. The returned
    /// profile is the persisted one.
    pub fn add_xp(&self, amount: XpAmount, policy: LevelingPolicy) -> Result<XpApplied> {
        let tx = self.conn.unchecked_transaction()?;
        let current = Self::read_profile(&tx)?;
        let applied = apply_xp(&ProgressionState::from_profile(current), amount, policy);

        tx.execute(
            r#"
            INSERT INTO profile (id, xp, level, updated_at) VALUES (1, ?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET xp = ?1, level = ?2, updated_at = ?3
            "#,
            params![
                applied.state.xp as i64,
                applied.state.level,
                Utc::now().to_rfc3339()
            ],
        )?;
        tx.commit()?;

        info!(
            gained = amount.get(),
            xp = applied.state.xp,
            level = applied.state.level,
            leveled_up = applied.leveled_up,
            "xp added"
        );
        Ok(applied)
    }

    pub fn reset_profile(&self) -> Result<()> {
        self.conn.execute(
            "UPDATE profile SET xp = 0, level = 1, updated_at = ?1 WHERE id = 1",
            params![Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    // Progress operations
    fn best_scores(&self) -> Result<Vec<(GameMode, u32)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT mode, score FROM best_scores ORDER BY mode")?;
        let rows = stmt.query_map([], |row| {
            let mode: String = row.get(0)?;
            Ok((parse_mode(0, &mode)?, row.get(1)?))
        })?;
        rows.collect()
    }

    fn completed_levels(&self) -> Result<Vec<u32>> {
        let mut stmt = self
            .conn
            .prepare("SELECT level FROM completed_levels ORDER BY level")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect()
    }

    fn last_played(&self) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT last_played FROM progress_meta WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|s| parse_timestamp(0, &s)).transpose()
    }

    pub fn list_history(&self, since: Option<DateTime<Utc>>) -> Result<Vec<ProgressHistoryEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT recorded_at, mode, score, level
            FROM history
            WHERE ?1 IS NULL OR recorded_at >= ?1
            ORDER BY recorded_at, id
            "#,
        )?;

        let rows = stmt.query_map(params![since.map(|t| t.to_rfc3339())], |row| {
            let recorded_at: String = row.get(0)?;
            let mode: String = row.get(1)?;
            Ok(ProgressHistoryEntry {
                recorded_at: parse_timestamp(0, &recorded_at)?,
                mode: parse_mode(1, &mode)?,
                score: row.get(2)?,
                level: row.get(3)?,
            })
        })?;

        rows.collect()
    }

    pub fn get_stats(&self) -> Result<Stats> {
        let profile = self.get_profile()?;

        let total_sessions: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;

        let levels_completed: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM completed_levels", [], |row| row.get(0))?;

        let week_ago = (Utc::now() - Duration::days(7)).to_rfc3339();
        let sessions_this_week: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM history WHERE recorded_at >= ?1",
            params![week_ago],
            |row| row.get(0),
        )?;

        let avg_score: f64 = self
            .conn
            .query_row(
                "SELECT COALESCE(AVG(score), 0) FROM history",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0.0);

        Ok(Stats {
            xp: profile.xp,
            level: profile.level,
            total_sessions,
            levels_completed,
            sessions_this_week,
            avg_score,
        })
    }
}

impl ProgressStore for Database {
    fn get(&self) -> error::Result<Option<ProgressData>> {
        let last_played = self.last_played()?;
        let history = self.list_history(None)?;
        if last_played.is_none() && history.is_empty() {
            return Ok(None);
        }

        let now = Utc::now();
        let mut data = ProgressData::new(last_played.unwrap_or(now));
        data.best_scores.extend(self.best_scores()?);
        data.completed_levels = self.completed_levels()?;
        data.history = history;
        Ok(Some(data))
    }

    fn set(&self, data: &ProgressData) -> error::Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        write_progress(&tx, data)?;
        tx.commit()?;
        Ok(())
    }

    fn append(&self, entry: &ProgressHistoryEntry) -> error::Result<()> {
        insert_history(&self.conn, entry)?;
        Ok(())
    }

    fn record(&self, data: &ProgressData, entry: &ProgressHistoryEntry) -> error::Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        write_progress(&tx, data)?;
        insert_history(&tx, entry)?;
        tx.commit()?;
        Ok(())
    }

    fn clear(&self) -> error::Result<()> {
        self.conn.execute_batch(
            r#"
            DELETE FROM best_scores;
            DELETE FROM completed_levels;
            DELETE FROM progress_meta;
            DELETE FROM history;
            "#,
        )?;
        info!("progress cleared");
        Ok(())
    }
}

/// Everything in `data` except history.
fn write_progress(conn: &Connection, data: &ProgressData) -> Result<()> {
    for (mode, score) in &data.best_scores {
        conn.execute(
            r#"
            INSERT INTO best_scores (mode, score) VALUES (?1, ?2)
            ON CONFLICT(mode) DO UPDATE SET score = ?2
            "#,
            params![mode.as_str(), score],
        )?;
    }

    conn.execute("DELETE FROM completed_levels", [])?;
    for level in &data.completed_levels {
        conn.execute(
            "INSERT OR IGNORE INTO completed_levels (level) VALUES (?1)",
            params![level],
        )?;
    }

    conn.execute(
        r#"
        INSERT INTO progress_meta (id, last_played) VALUES (1, ?1)
        ON CONFLICT(id) DO UPDATE SET last_played = ?1
        "#,
        params![data.last_played.to_rfc3339()],
    )?;
    Ok(())
}

fn insert_history(conn: &Connection, entry: &ProgressHistoryEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO history (recorded_at, mode, score, level) VALUES (?1, ?2, ?3, ?4)",
        params![
            entry.recorded_at.to_rfc3339(),
            entry.mode.as_str(),
            entry.score,
            entry.level
        ],
    )?;
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub xp: u64,
    pub level: u32,
    pub total_sessions: i64,
    pub levels_completed: i64,
    pub sessions_this_week: i64,
    pub avg_score: f64,
}
