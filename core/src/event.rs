//! Tick events: the record of everything `step` and `reset` resolved.
//!
//! RULE: Every state change inside a tick emits exactly one event.
//! Events describe what happened; they are never read back by the
//! simulation.

use crate::types::{ActorId, Episode, GridPos, RunId, Tick};
use serde::{Deserialize, Serialize};

/// Every event emitted during simulation.
/// Variants may be appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Episode lifecycle ──────────────────────────
    EpisodeStarted {
        episode: Episode,
        actors: Vec<GridPos>,
        enemies: Vec<GridPos>,
        blocks: Vec<GridPos>,
    },
    EpisodeEnded {
        episode: Episode,
        tick: Tick,
        outcome: EpisodeOutcome,
    },

    // ── Actor phase ────────────────────────────────
    ActorSlotVacant {
        tick: Tick,
        slot: usize,
    },
    ActorMoved {
        tick: Tick,
        actor: ActorId,
        from: GridPos,
        to: GridPos,
    },
    MoveRejected {
        tick: Tick,
        actor: ActorId,
        target: GridPos,
    },
    EnemyKilled {
        tick: Tick,
        actor: ActorId,
        enemy: GridPos,
    },
    AttackRejected {
        tick: Tick,
        actor: ActorId,
        target: GridPos,
        reason: AttackFailure,
    },

    // ── Enemy phase ────────────────────────────────
    ActorShot {
        tick: Tick,
        enemy: GridPos,
        actor: ActorId,
        at: GridPos,
    },
    ShotBlocked {
        tick: Tick,
        enemy: GridPos,
        target: GridPos,
    },
    EnemiesRepopulated {
        tick: Tick,
        enemies: Vec<GridPos>,
    },
    Stalled {
        tick: Tick,
        ticks_without_progress: u32,
    },
}

impl SimEvent {
    /// Stable string name of the variant.
    /// Used for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::EpisodeStarted { .. }     => "episode_started",
            Self::EpisodeEnded { .. }       => "episode_ended",
            Self::ActorSlotVacant { .. }    => "actor_slot_vacant",
            Self::ActorMoved { .. }         => "actor_moved",
            Self::MoveRejected { .. }       => "move_rejected",
            Self::EnemyKilled { .. }        => "enemy_killed",
            Self::AttackRejected { .. }     => "attack_rejected",
            Self::ActorShot { .. }          => "actor_shot",
            Self::ShotBlocked { .. }        => "shot_blocked",
            Self::EnemiesRepopulated { .. } => "enemies_repopulated",
            Self::Stalled { .. }            => "stalled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackFailure {
    NotAnEnemy,
    LineBlocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeOutcome {
    /// Every actor was shot down.
    Wiped,
    /// The no-progress counter reached the stall threshold.
    Stalled,
}

impl EpisodeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wiped => "wiped",
            Self::Stalled => "stalled",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub episode: Episode,
    pub tick: Tick,
    pub event_type: String,
    pub payload: String, // JSON-serialized SimEvent
}

impl EventLogEntry {
    pub fn from_event(
        run_id: &str,
        episode: Episode,
        tick: Tick,
        event: &SimEvent,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            id: None,
            run_id: run_id.to_string(),
            episode,
            tick,
            event_type: event.type_name().to_string(),
            payload: serde_json::to_string(event)?,
        })
    }
}
