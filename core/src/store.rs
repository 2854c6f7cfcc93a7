//! SQLite persistence layer for runs driven by the runner.
//!
//! RULE: Only store.rs talks to the database.
//! The environment itself never touches the store; drivers persist the
//! events and episode results `step` hands back.

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use crate::{
    error::SimResult,
    event::{EventLogEntry, SimEvent},
    types::{Episode, RunId, Tick},
};

/// One finished episode, as recorded by a driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub run_id:  RunId,
    pub episode: Episode,
    pub ticks:   Tick,
    pub score:   f64,
    pub kills:   u64,
    pub outcome: String,
}

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    /// Open (or create) the run database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, seed: u64, version: &str, started_at: u64) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, version, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, seed as i64, version, started_at as i64],
        )?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> SimResult<()> {
        insert_event(&self.conn, entry)?;
        Ok(())
    }

    /// Append every event of one tick in a single transaction.
    pub fn append_events(
        &mut self,
        run_id: &str,
        episode: Episode,
        tick: Tick,
        events: &[SimEvent],
    ) -> SimResult<()> {
        let tx = self.conn.transaction()?;
        for event in events {
            let entry = EventLogEntry::from_event(run_id, episode, tick, event)?;
            insert_event(&tx, &entry)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn events_for_episode(&self, run_id: &str, episode: Episode) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, episode, tick, event_type, payload
             FROM event_log WHERE run_id = ?1 AND episode = ?2
             ORDER BY id ASC"
        )?;
        let entries = stmt.query_map(params![run_id, episode as i64], |row| {
            Ok(EventLogEntry {
                id:         Some(row.get(0)?),
                run_id:     row.get(1)?,
                episode:    row.get::<_, i64>(2)? as u64,
                tick:       row.get::<_, i64>(3)? as u64,
                event_type: row.get(4)?,
                payload:    row.get(5)?,
            })
        })?.collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // ── Episodes ───────────────────────────────────────────────

    pub fn record_episode(&self, record: &EpisodeRecord) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO episode (run_id, episode, ticks, score, kills, outcome)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.run_id,
                record.episode as i64,
                record.ticks as i64,
                record.score,
                record.kills as i64,
                record.outcome,
            ],
        )?;
        Ok(())
    }

    pub fn episode_records(&self, run_id: &str) -> SimResult<Vec<EpisodeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, episode, ticks, score, kills, outcome
             FROM episode WHERE run_id = ?1
             ORDER BY episode ASC"
        )?;
        let records = stmt.query_map(params![run_id], |row| {
            Ok(EpisodeRecord {
                run_id:  row.get(0)?,
                episode: row.get::<_, i64>(1)? as u64,
                ticks:   row.get::<_, i64>(2)? as u64,
                score:   row.get(3)?,
                kills:   row.get::<_, i64>(4)? as u64,
                outcome: row.get(5)?,
            })
        })?.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Mean score over the episodes of a run, or `None` if none are recorded.
    pub fn mean_score(&self, run_id: &str) -> SimResult<Option<f64>> {
        let mean = self.conn.query_row(
            "SELECT AVG(score) FROM episode WHERE run_id = ?1",
            params![run_id],
            |row| row.get::<_, Option<f64>>(0),
        )?;
        Ok(mean)
    }
}

fn insert_event(conn: &Connection, entry: &EventLogEntry) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO event_log (run_id, episode, tick, event_type, payload)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            entry.run_id,
            entry.episode as i64,
            entry.tick as i64,
            entry.event_type,
            entry.payload,
        ],
    )
}
