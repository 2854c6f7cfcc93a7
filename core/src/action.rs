//! The structured action and its flat discrete encoding.
//!
//! Agents pick a single index in `0..ActionSpace::size()`. The index
//! unravels, last axis fastest, over `(x, y, actor, is_attack)`.

use crate::{
    error::{SimError, SimResult},
    types::GridPos,
};
use serde::{Deserialize, Serialize};

/// An optional intent toward a target cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Intent {
    pub enabled: bool,
    pub target: GridPos,
}

impl Intent {
    pub const NONE: Intent = Intent { enabled: false, target: GridPos::new(0, 0) };

    pub fn at(target: GridPos) -> Self {
        Self { enabled: true, target }
    }
}

/// One actor decision for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Actor selector, resolved per `ActorAddressing`.
    pub actor: usize,
    pub movement: Intent,
    /// Accepted for schema compatibility; never applied.
    #[serde(default)]
    pub place_block_at: u8,
    pub attack: Intent,
}

impl Action {
    pub fn move_to(actor: usize, target: GridPos) -> Self {
        Self {
            actor,
            movement: Intent::at(target),
            place_block_at: 0,
            attack: Intent::NONE,
        }
    }

    pub fn attack_at(actor: usize, target: GridPos) -> Self {
        Self {
            actor,
            movement: Intent::NONE,
            place_block_at: 0,
            attack: Intent::at(target),
        }
    }

    /// An action that does nothing but still counts as a tick.
    pub fn idle(actor: usize) -> Self {
        Self {
            actor,
            movement: Intent::NONE,
            place_block_at: 0,
            attack: Intent::NONE,
        }
    }
}

/// Dimensions of the flat discrete action space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpace {
    pub width: usize,
    pub height: usize,
    pub max_actors: usize,
}

impl ActionSpace {
    pub fn new(width: usize, height: usize, max_actors: usize) -> Self {
        Self { width, height, max_actors }
    }

    pub fn size(&self) -> usize {
        self.width * self.height * self.max_actors * 2
    }

    /// Decode a flat index into a pure move or a pure attack.
    pub fn decode(&self, index: usize) -> SimResult<Action> {
        let size = self.size();
        if index >= size {
            return Err(SimError::ActionOutOfRange { index, size });
        }
        let is_attack = index % 2 == 1;
        let rest = index / 2;
        let actor = rest % self.max_actors;
        let rest = rest / self.max_actors;
        let y = rest % self.height;
        let x = rest / self.height;

        let target = GridPos::new(x, y);
        Ok(if is_attack {
            Action::attack_at(actor, target)
        } else {
            Action::move_to(actor, target)
        })
    }

    /// Inverse of `decode` for the pure actions it produces.
    /// Returns `None` for idle actions, actions with both intents set,
    /// or fields outside the space.
    pub fn encode(&self, action: &Action) -> Option<usize> {
        let (is_attack, target) = match (action.movement.enabled, action.attack.enabled) {
            (true, false) => (0, action.movement.target),
            (false, true) => (1, action.attack.target),
            _ => return None,
        };
        if action.actor >= self.max_actors || !target.in_bounds(self.width, self.height) {
            return None;
        }
        Some(((target.x * self.height + target.y) * self.max_actors + action.actor) * 2 + is_attack)
    }
}
