//! Local run history.
//!
//! The shell records a finished run here after the session ends; the
//! simulation itself never reads or writes this mid-game. A plain SQLite
//! file is durable enough for a single player's stats page.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::session::RunSummary;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("run store: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Aggregates for the stats screen.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSummary {
    pub total_distance_m: f64,
    pub total_runs: u64,
    pub longest_run_m: f64,
    pub total_coins: u64,
    pub last_run_at: Option<DateTime<Utc>>,
}

pub struct RunStore {
    conn: Connection,
}

impl RunStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS runs (
                id          INTEGER PRIMARY KEY,
                started_at  INTEGER NOT NULL,
                duration_s  REAL NOT NULL,
                distance_m  REAL NOT NULL,
                coins       INTEGER NOT NULL,
                captured    INTEGER NOT NULL
            );",
        )?;
        Ok(RunStore { conn })
    }

    pub fn record(&self, run: &RunSummary) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO runs (started_at, duration_s, distance_m, coins, captured)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run.started_at.timestamp(),
                run.duration_s,
                run.distance_m,
                run.coins as i64,
                run.captured as i64,
            ],
        )?;
        Ok(())
    }

    pub fn stats(&self) -> Result<StatsSummary, StoreError> {
        let (total_distance_m, total_runs, longest_run_m, total_coins, last_started): (
            f64,
            i64,
            f64,
            i64,
            Option<i64>,
        ) = self.conn.query_row(
            "SELECT COALESCE(SUM(distance_m), 0),
                    COUNT(*),
                    COALESCE(MAX(distance_m), 0),
                    COALESCE(SUM(coins), 0),
                    MAX(started_at)
             FROM runs",
            [],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            },
        )?;

        Ok(StatsSummary {
            total_distance_m,
            total_runs: total_runs as u64,
            longest_run_m,
            total_coins: total_coins as u64,
            last_run_at: last_started.and_then(|secs| DateTime::from_timestamp(secs, 0)),
        })
    }
}
