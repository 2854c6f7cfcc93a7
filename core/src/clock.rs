//! Episode clock. Owns episode numbering, the in-episode tick, and the
//! no-progress counter.

use crate::types::{Episode, Tick};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EpisodeClock {
    /// Zero until the first reset.
    pub episode: Episode,
    pub tick: Tick,
    /// Consecutive ticks without a successful move or kill.
    pub ticks_without_progress: u32,
}

impl EpisodeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the next episode. Returns its number.
    pub fn begin_episode(&mut self) -> Episode {
        self.episode += 1;
        self.tick = 0;
        self.ticks_without_progress = 0;
        self.episode
    }

    /// Advance one tick. Returns the new tick number.
    pub fn advance(&mut self) -> Tick {
        self.tick += 1;
        self.tick
    }

    /// Reset the counter on progress, otherwise bump it.
    pub fn record_progress(&mut self, progressed: bool) -> u32 {
        if progressed {
            self.ticks_without_progress = 0;
        } else {
            self.ticks_without_progress += 1;
        }
        self.ticks_without_progress
    }

    pub fn is_stalled(&self, threshold: u32) -> bool {
        self.ticks_without_progress >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_resets_the_counter() {
        let mut clock = EpisodeClock::new();
        clock.record_progress(false);
        clock.record_progress(false);
        assert_eq!(clock.ticks_without_progress, 2);
        assert_eq!(clock.record_progress(true), 0);
    }

    #[test]
    fn begin_episode_clears_tick_state() {
        let mut clock = EpisodeClock::new();
        assert_eq!(clock.begin_episode(), 1);
        clock.advance();
        clock.record_progress(false);
        assert_eq!(clock.begin_episode(), 2);
        assert_eq!(clock.tick, 0);
        assert_eq!(clock.ticks_without_progress, 0);
    }
}
