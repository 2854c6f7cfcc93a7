//! The contract a training loop drives.

use crate::{
    action::{Action, ActionSpace},
    error::SimResult,
    event::SimEvent,
    world::Observation,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of one `step`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub observation: Observation,
    pub reward: f64,
    pub done: bool,
    /// Auxiliary info. Always empty; kept so callers can rely on the shape.
    pub info: BTreeMap<String, String>,
    /// Everything resolved this tick, in resolution order.
    pub events: Vec<SimEvent>,
}

/// reset / step / render environment.
///
/// Illegal or infeasible actions never fail a step; they only cost reward.
/// Errors are reserved for caller misuse (stepping outside an episode) and
/// I/O on attached surfaces.
pub trait Environment {
    fn action_space(&self) -> ActionSpace;

    /// Start a new episode and return its first observation.
    fn reset(&mut self) -> SimResult<Observation>;

    /// Resolve one tick.
    fn step(&mut self, action: &Action) -> SimResult<StepOutcome>;

    /// Draw the current state if a surface is attached. Never changes the
    /// simulation.
    fn render(&mut self) -> SimResult<()>;

    /// Release the display surface, if any.
    fn close(&mut self);

    /// Re-derive every random stream from `seed`.
    fn seed(&mut self, seed: u64);
}
