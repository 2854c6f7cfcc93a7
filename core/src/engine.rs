//! The environment engine: one `step` is one tick.
//!
//! RESOLUTION ORDER (fixed, never reordered):
//!   1. Actor selector check      (vacant slot → penalty, skip 2–3)
//!   2. Actor move
//!   3. Actor attack              (line of sight against blocks)
//!   4. No-progress bookkeeping
//!   5. Enemy counter-attacks     (sequential; removals visible to later enemies)
//!   6. Enemy repopulation        (only when the enemy set is empty)
//!   7. Stall penalty
//!   8. Termination
//!
//! RULES:
//!   - Infeasible actions cost reward; they never fail the step.
//!   - All randomness flows through the RngBank.
//!   - Every state change is recorded as a SimEvent.

use crate::{
    action::{Action, ActionSpace},
    clock::EpisodeClock,
    config::EnvConfig,
    env::{Environment, StepOutcome},
    error::{SimError, SimResult},
    event::{AttackFailure, EpisodeOutcome, SimEvent},
    geometry::is_shot_blocked,
    render::{Frame, RenderSurface, Shot},
    rng::RngBank,
    snapshot::EnvSnapshot,
    types::{ActorId, Tick},
    world::{Actor, Observation, World},
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EpisodePhase {
    NotStarted,
    Running,
    Finished,
}

pub struct GridEnv {
    pub clock:  EpisodeClock,
    config:     EnvConfig,
    cell_size:  f64,
    rng:        RngBank,
    world:      World,
    quota:      usize,
    phase:      EpisodePhase,
    last_shot:  Option<Shot>,
    surface:    Option<Box<dyn RenderSurface>>,
}

impl GridEnv {
    pub fn new(config: EnvConfig, seed: u64) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            clock:     EpisodeClock::new(),
            cell_size: config.cell_size(),
            rng:       RngBank::new(seed),
            world:     World::empty(config.width, config.height),
            quota:     0,
            phase:     EpisodePhase::NotStarted,
            last_shot: None,
            surface:   None,
            config,
        })
    }

    /// Attach a display. `render` draws to it until it reports quit or
    /// `close` is called.
    pub fn with_surface(mut self, surface: Box<dyn RenderSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct world access for scenario setup in tests and tooling.
    /// Simulation code goes through `reset` and `step`.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn enemy_quota(&self) -> usize {
        self.quota
    }

    pub fn last_shot(&self) -> Option<Shot> {
        self.last_shot
    }

    pub fn is_done(&self) -> bool {
        self.phase == EpisodePhase::Finished
    }

    pub fn snapshot(&self) -> EnvSnapshot {
        EnvSnapshot {
            seed:        self.rng.master_seed(),
            clock:       self.clock.clone(),
            done:        self.is_done(),
            enemy_quota: self.quota,
            world:       self.world.clone(),
            last_shot:   self.last_shot,
        }
    }

    /// Start the next episode. Returns the first observation together with
    /// the `EpisodeStarted` event.
    pub fn begin_episode(&mut self) -> SimResult<(Observation, SimEvent)> {
        let episode = self.clock.begin_episode();
        let tier = self
            .config
            .difficulty
            .tier_for(episode)
            .cloned()
            .ok_or_else(|| SimError::InvalidConfig {
                reason: "difficulty table is empty".into(),
            })?;

        let mut world = World::empty(self.config.width, self.config.height);
        world.actors = (0..tier.actors)
            .map(|k| Actor { id: ActorId(k), pos: self.config.actor_spawn(k) })
            .collect();
        world.blocks = self.config.blocks.clone();
        world.repopulate_enemies(tier.enemies, &mut self.rng.placement);

        self.world = world;
        self.quota = tier.enemies;
        self.last_shot = None;
        self.phase = EpisodePhase::Running;

        log::info!(
            "episode={episode} started: actors={} enemies={} blocks={}",
            self.world.actors.len(),
            self.world.enemies.len(),
            self.world.blocks.len()
        );

        let event = SimEvent::EpisodeStarted {
            episode,
            actors:  self.world.actor_positions(),
            enemies: self.world.enemies.clone(),
            blocks:  self.world.blocks.clone(),
        };
        Ok((self.world.observe(), event))
    }

    /// Steps 1–3. Returns whether the actor made progress.
    fn resolve_actor_phase(
        &mut self,
        tick: Tick,
        action: &Action,
        reward: &mut f64,
        events: &mut Vec<SimEvent>,
    ) -> bool {
        let addressing = self.config.actor_addressing;
        let penalty = self.config.rewards.invalid_action;

        let Some(index) = self.world.resolve_actor(action.actor, addressing) else {
            log::debug!("tick={tick} actor slot {} vacant", action.actor);
            *reward += penalty;
            events.push(SimEvent::ActorSlotVacant { tick, slot: action.actor });
            return false;
        };

        let mut progressed = false;

        if action.movement.enabled {
            let actor = self.world.actors[index];
            let to = action.movement.target;
            if self.world.can_enter(to) {
                self.world.relocate(index, to, addressing);
                events.push(SimEvent::ActorMoved { tick, actor: actor.id, from: actor.pos, to });
                progressed = true;
            } else {
                log::debug!("tick={tick} {} cannot enter {to}", actor.id);
                *reward += penalty;
                events.push(SimEvent::MoveRejected { tick, actor: actor.id, target: to });
            }
        }

        if action.attack.enabled {
            // Positional addressing re-reads the slot, which a move may
            // have handed to a different actor.
            let index = self.world.resolve_actor(action.actor, addressing).unwrap_or(index);
            let shooter = self.world.actors[index];
            let target = action.attack.target;

            let failure = if !self.world.has_enemy(target) {
                Some(AttackFailure::NotAnEnemy)
            } else if is_shot_blocked(shooter.pos, target, &self.world.blocks, self.cell_size) {
                Some(AttackFailure::LineBlocked)
            } else {
                None
            };

            match failure {
                None => {
                    self.world.remove_enemy(target);
                    *reward += self.config.rewards.kill;
                    events.push(SimEvent::EnemyKilled { tick, actor: shooter.id, enemy: target });
                    progressed = true;
                }
                Some(reason) => {
                    log::debug!("tick={tick} {} attack on {target} rejected: {reason:?}", shooter.id);
                    *reward += penalty;
                    events.push(SimEvent::AttackRejected {
                        tick,
                        actor: shooter.id,
                        target,
                        reason,
                    });
                }
            }
        }

        progressed
    }

    /// Step 5. Each enemy picks a live actor and may fire; a hit removes
    /// the actor before the next enemy chooses.
    fn resolve_enemy_phase(&mut self, tick: Tick, reward: &mut f64, events: &mut Vec<SimEvent>) {
        let hit_probability = self.config.rules.hit_probability;

        for i in 0..self.world.enemies.len() {
            if self.world.actors.is_empty() {
                break;
            }
            let enemy = self.world.enemies[i];
            let target_index = self.rng.counter_attack.below(self.world.actors.len());
            if !self.rng.counter_attack.chance(hit_probability) {
                continue;
            }

            let target = self.world.actors[target_index];
            if is_shot_blocked(enemy, target.pos, &self.world.blocks, self.cell_size) {
                events.push(SimEvent::ShotBlocked { tick, enemy, target: target.pos });
                continue;
            }

            self.world.actors.remove(target_index);
            *reward += self.config.rewards.actor_lost;
            self.last_shot = Some(Shot { shooter: enemy, target: target.pos });
            log::debug!("tick={tick} enemy at {enemy} shot {} at {}", target.id, target.pos);
            events.push(SimEvent::ActorShot { tick, enemy, actor: target.id, at: target.pos });
        }
    }
}

impl Environment for GridEnv {
    fn action_space(&self) -> ActionSpace {
        ActionSpace::new(self.config.width, self.config.height, self.config.max_actors)
    }

    fn reset(&mut self) -> SimResult<Observation> {
        self.begin_episode().map(|(observation, _)| observation)
    }

    fn step(&mut self, action: &Action) -> SimResult<StepOutcome> {
        match self.phase {
            EpisodePhase::NotStarted => return Err(SimError::EpisodeNotStarted),
            EpisodePhase::Finished => {
                return Err(SimError::EpisodeFinished { episode: self.clock.episode })
            }
            EpisodePhase::Running => {}
        }

        let tick = self.clock.advance();
        let mut reward = 0.0;
        let mut events = Vec::new();

        let progressed = self.resolve_actor_phase(tick, action, &mut reward, &mut events);
        self.clock.record_progress(progressed);

        self.resolve_enemy_phase(tick, &mut reward, &mut events);

        if self.world.enemies.is_empty() {
            reward += self.config.rewards.repopulation_bonus;
            self.world.repopulate_enemies(self.quota, &mut self.rng.placement);
            events.push(SimEvent::EnemiesRepopulated { tick, enemies: self.world.enemies.clone() });
        }

        let stalled = self.clock.is_stalled(self.config.rules.stall_threshold);
        if stalled {
            reward += self.config.rewards.stall_penalty;
            events.push(SimEvent::Stalled {
                tick,
                ticks_without_progress: self.clock.ticks_without_progress,
            });
        }

        let wiped = self.world.actors.is_empty();
        let done = wiped || stalled;
        if done {
            self.phase = EpisodePhase::Finished;
            let outcome = if wiped { EpisodeOutcome::Wiped } else { EpisodeOutcome::Stalled };
            log::info!("episode={} ended at tick={tick}: {}", self.clock.episode, outcome.as_str());
            events.push(SimEvent::EpisodeEnded { episode: self.clock.episode, tick, outcome });
        }

        log::debug!(
            "tick={tick} reward={reward:.7} actors={} enemies={} idle_ticks={}",
            self.world.actors.len(),
            self.world.enemies.len(),
            self.clock.ticks_without_progress
        );

        Ok(StepOutcome {
            observation: self.world.observe(),
            reward,
            done,
            info: BTreeMap::new(),
            events,
        })
    }

    fn render(&mut self) -> SimResult<()> {
        let Some(surface) = self.surface.as_mut() else {
            return Ok(());
        };
        if surface.poll_quit() {
            surface.close();
            self.surface = None;
            log::info!("render surface detached on quit");
            return Ok(());
        }
        let frame = Frame::capture(&self.world, self.cell_size, self.last_shot.take());
        surface.draw(&frame)
    }

    fn close(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.close();
        }
    }

    fn seed(&mut self, seed: u64) {
        log::debug!("reseeding environment streams with {seed}");
        self.rng = RngBank::new(seed);
    }
}
