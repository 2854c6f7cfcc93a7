//! Grid world state: who stands where, and the queries `step` resolves
//! against. The state machine itself lives in `engine.rs`.

use crate::{
    config::ActorAddressing,
    rng::StreamRng,
    types::{ActorId, GridPos},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub pos: GridPos,
}

/// Observation value of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CellKind {
    Empty = 0,
    Actor = 1,
    Block = 2,
    Enemy = 3,
}

impl CellKind {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Empty),
            1 => Some(Self::Actor),
            2 => Some(Self::Block),
            3 => Some(Self::Enemy),
            _ => None,
        }
    }
}

/// Flattened x-major grid encoding: `cells[x * height + y]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<u8>,
}

impl Observation {
    pub fn index_of(&self, pos: GridPos) -> Option<usize> {
        pos.in_bounds(self.width, self.height)
            .then(|| pos.x * self.height + pos.y)
    }

    pub fn get(&self, pos: GridPos) -> Option<CellKind> {
        self.index_of(pos)
            .and_then(|i| CellKind::from_code(self.cells[i]))
    }

    pub fn count(&self, kind: CellKind) -> usize {
        self.cells.iter().filter(|&&c| c == kind as u8).count()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    pub width: usize,
    pub height: usize,
    pub actors: Vec<Actor>,
    pub blocks: Vec<GridPos>,
    pub enemies: Vec<GridPos>,
}

impl World {
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            actors: Vec::new(),
            blocks: Vec::new(),
            enemies: Vec::new(),
        }
    }

    pub fn actor_positions(&self) -> Vec<GridPos> {
        self.actors.iter().map(|a| a.pos).collect()
    }

    pub fn has_actor(&self, pos: GridPos) -> bool {
        self.actors.iter().any(|a| a.pos == pos)
    }

    pub fn has_block(&self, pos: GridPos) -> bool {
        self.blocks.contains(&pos)
    }

    pub fn has_enemy(&self, pos: GridPos) -> bool {
        self.enemies.contains(&pos)
    }

    /// A move may only land on a free, on-grid cell.
    pub fn can_enter(&self, pos: GridPos) -> bool {
        pos.in_bounds(self.width, self.height)
            && !self.has_actor(pos)
            && !self.has_block(pos)
            && !self.has_enemy(pos)
    }

    /// Map an action's actor selector to an index into `actors`.
    pub fn resolve_actor(&self, selector: usize, addressing: ActorAddressing) -> Option<usize> {
        match addressing {
            ActorAddressing::Stable => self.actors.iter().position(|a| a.id == ActorId(selector)),
            ActorAddressing::Positional => (selector < self.actors.len()).then_some(selector),
        }
    }

    /// Move the actor at `index` to `to`. Positional addressing removes it
    /// and appends it to the end of the list.
    pub fn relocate(&mut self, index: usize, to: GridPos, addressing: ActorAddressing) {
        match addressing {
            ActorAddressing::Stable => self.actors[index].pos = to,
            ActorAddressing::Positional => {
                let mut actor = self.actors.remove(index);
                actor.pos = to;
                self.actors.push(actor);
            }
        }
    }

    pub fn remove_enemy(&mut self, pos: GridPos) -> bool {
        match self.enemies.iter().position(|&e| e == pos) {
            Some(i) => {
                self.enemies.remove(i);
                true
            }
            None => false,
        }
    }

    /// Every cell on the outermost rows and columns, each listed once:
    /// top row, bottom row, then left and right columns without corners.
    pub fn border_cells(&self) -> Vec<GridPos> {
        let (w, h) = (self.width, self.height);
        let mut cells = Vec::with_capacity(2 * (w + h));
        cells.extend((0..w).map(|x| GridPos::new(x, 0)));
        cells.extend((0..w).map(|x| GridPos::new(x, h - 1)));
        cells.extend((1..h.saturating_sub(1)).map(|y| GridPos::new(0, y)));
        cells.extend((1..h.saturating_sub(1)).map(|y| GridPos::new(w - 1, y)));
        cells.sort_unstable();
        cells.dedup();
        cells
    }

    /// Replace the enemy set with up to `quota` shuffled border cells not
    /// already held by a block or an actor.
    pub fn repopulate_enemies(&mut self, quota: usize, rng: &mut StreamRng) {
        let mut candidates: Vec<GridPos> = self
            .border_cells()
            .into_iter()
            .filter(|&c| !self.has_block(c) && !self.has_actor(c))
            .collect();
        rng.shuffle(&mut candidates);
        candidates.truncate(quota);
        self.enemies = candidates;
    }

    /// Cell value with fixed priority actor > block > enemy > empty.
    pub fn cell_at(&self, pos: GridPos) -> CellKind {
        if self.has_actor(pos) {
            CellKind::Actor
        } else if self.has_block(pos) {
            CellKind::Block
        } else if self.has_enemy(pos) {
            CellKind::Enemy
        } else {
            CellKind::Empty
        }
    }

    pub fn observe(&self) -> Observation {
        let mut cells = Vec::with_capacity(self.width * self.height);
        for x in 0..self.width {
            for y in 0..self.height {
                cells.push(self.cell_at(GridPos::new(x, y)) as u8);
            }
        }
        Observation {
            width: self.width,
            height: self.height,
            cells,
        }
    }
}
