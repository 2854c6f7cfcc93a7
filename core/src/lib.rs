//! Skirmish: a turn-based grid-world environment for reinforcement-learning
//! agents. Actors move and shoot, enemies fire back, and static blocks stop
//! shots that cross them.

pub mod action;
pub mod clock;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod event;
pub mod geometry;
pub mod render;
pub mod rng;
pub mod snapshot;
pub mod store;
pub mod types;
pub mod world;

pub use action::{Action, ActionSpace, Intent};
pub use config::EnvConfig;
pub use engine::GridEnv;
pub use env::{Environment, StepOutcome};
pub use error::{SimError, SimResult};
pub use types::{ActorId, GridPos};
