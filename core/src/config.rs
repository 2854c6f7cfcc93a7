use crate::{
    error::{SimError, SimResult},
    types::{Episode, GridPos},
};
use serde::{Deserialize, Serialize};

/// How the action's actor field is resolved to a live actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActorAddressing {
    /// The field names an `ActorId`; moves relocate in place.
    #[default]
    Stable,
    /// The field is a list position; moves remove the actor and append it
    /// to the end of the list, so positions shift within a tick.
    Positional,
}

/// Render-space size of the display, used to derive the cell size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Probability that an enemy fires at its chosen target each tick.
    pub hit_probability: f64,
    /// Consecutive ticks without a move or kill before the episode stalls.
    pub stall_threshold: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Applied per rejected actor decision (vacant slot, illegal move, failed attack).
    pub invalid_action: f64,
    pub kill: f64,
    pub actor_lost: f64,
    pub repopulation_bonus: f64,
    pub stall_penalty: f64,
}

/// One row of the difficulty table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyTier {
    /// The tier applies to episodes strictly below this number.
    /// `None` means open-ended.
    #[serde(default)]
    pub below_episode: Option<Episode>,
    pub actors: usize,
    pub enemies: usize,
}

/// Episode-number driven difficulty schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DifficultyPolicy {
    pub tiers: Vec<DifficultyTier>,
}

impl DifficultyPolicy {
    /// A single tier used for every episode.
    pub fn fixed(actors: usize, enemies: usize) -> Self {
        Self {
            tiers: vec![DifficultyTier { below_episode: None, actors, enemies }],
        }
    }

    /// First tier whose bound exceeds `episode`; falls back to the last row.
    pub fn tier_for(&self, episode: Episode) -> Option<&DifficultyTier> {
        self.tiers
            .iter()
            .find(|t| t.below_episode.map_or(true, |limit| episode < limit))
            .or_else(|| self.tiers.last())
    }
}

impl Default for DifficultyPolicy {
    fn default() -> Self {
        Self {
            tiers: vec![
                DifficultyTier { below_episode: Some(100), actors: 1, enemies: 1 },
                DifficultyTier { below_episode: Some(200), actors: 1, enemies: 3 },
                DifficultyTier { below_episode: None,      actors: 2, enemies: 6 },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    pub width: usize,
    pub height: usize,
    pub max_actors: usize,
    pub max_enemies: usize,
    /// Without a viewport the cell size is 0 and no shot is ever blocked.
    #[serde(default)]
    pub viewport: Option<Viewport>,
    #[serde(default)]
    pub blocks: Vec<GridPos>,
    #[serde(default)]
    pub actor_addressing: ActorAddressing,
    pub rules: RulesConfig,
    pub rewards: RewardConfig,
    #[serde(default)]
    pub difficulty: DifficultyPolicy,
}

impl EnvConfig {
    /// Load an environment config from a JSON file.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: EnvConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Square cell edge in render space, or 0 with no viewport.
    pub fn cell_size(&self) -> f64 {
        match self.viewport {
            Some(v) if self.width > 0 && self.height > 0 => {
                (v.width / self.width as f64).min(v.height / self.height as f64)
            }
            _ => 0.0,
        }
    }

    /// Spawn cell of the `k`-th actor: grid center, then one step right per actor.
    pub fn actor_spawn(&self, k: usize) -> GridPos {
        GridPos::new(self.width / 2 + k, self.height / 2)
    }

    /// Reject configs the environment cannot run.
    pub fn validate(&self) -> SimResult<()> {
        let invalid = |reason: String| Err(SimError::InvalidConfig { reason });

        if self.width == 0 || self.height == 0 {
            return invalid(format!("grid must be non-empty, got {}x{}", self.width, self.height));
        }
        if self.difficulty.tiers.is_empty() {
            return invalid("difficulty table is empty".into());
        }
        if !(0.0..=1.0).contains(&self.rules.hit_probability) {
            return invalid(format!("hit_probability {} outside [0, 1]", self.rules.hit_probability));
        }
        if self.rules.stall_threshold == 0 {
            return invalid("stall_threshold must be at least 1".into());
        }
        for block in &self.blocks {
            if !block.in_bounds(self.width, self.height) {
                return invalid(format!("block {block} lies off the grid"));
            }
        }
        for tier in &self.difficulty.tiers {
            if tier.actors == 0 || tier.actors > self.max_actors {
                return invalid(format!(
                    "tier actor count {} must be in 1..={}", tier.actors, self.max_actors
                ));
            }
            if tier.enemies > self.max_enemies {
                return invalid(format!(
                    "tier enemy quota {} exceeds max_enemies {}", tier.enemies, self.max_enemies
                ));
            }
            for k in 0..tier.actors {
                let spawn = self.actor_spawn(k);
                if !spawn.in_bounds(self.width, self.height) {
                    return invalid(format!("actor spawn {spawn} lies off the grid"));
                }
                if self.blocks.contains(&spawn) {
                    return invalid(format!("actor spawn {spawn} is blocked"));
                }
            }
        }
        Ok(())
    }

    /// Fully populated in-code config for tests: 10x10 grid, 100x100
    /// viewport (cell size 10), no blocks, one actor and one enemy.
    pub fn default_test() -> Self {
        Self {
            width: 10,
            height: 10,
            max_actors: 2,
            max_enemies: 10,
            viewport: Some(Viewport { width: 100.0, height: 100.0 }),
            blocks: Vec::new(),
            actor_addressing: ActorAddressing::Stable,
            rules: RulesConfig::default(),
            rewards: RewardConfig::default(),
            difficulty: DifficultyPolicy::fixed(1, 1),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            hit_probability: 0.6,
            stall_threshold: 10,
        }
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            invalid_action:     -2e-7,
            kill:                1.0,
            actor_lost:         -1.0,
            repopulation_bonus:  0.05,
            stall_penalty:      -0.05,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            max_actors: 2,
            max_enemies: 10,
            viewport: Some(Viewport { width: 640.0, height: 480.0 }),
            blocks: vec![GridPos::new(5, 3)],
            actor_addressing: ActorAddressing::Stable,
            rules: RulesConfig::default(),
            rewards: RewardConfig::default(),
            difficulty: DifficultyPolicy::default(),
        }
    }
}
