//! Snapshot serialization: full environment state to/from JSON.
//!
//! Captures everything needed to compare two environments tick for tick
//! or to show state to an external driver.

use crate::{
    clock::EpisodeClock,
    render::Shot,
    world::World,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvSnapshot {
    pub seed: u64,
    pub clock: EpisodeClock,
    pub done: bool,
    pub enemy_quota: usize,
    pub world: World,
    pub last_shot: Option<Shot>,
}
