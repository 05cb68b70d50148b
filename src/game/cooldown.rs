//! Per-player click throttling.

use std::collections::HashMap;
use std::time::Duration;

use crate::game::{PlayerId, SimTime};

/// Minimum time between two successful normal actions by the same player.
pub const CLICK_COOLDOWN: Duration = Duration::from_millis(500);

/// When each player may act again.
#[derive(Debug, Clone, Default)]
pub struct Cooldowns {
    ready_at: HashMap<PlayerId, SimTime>,
}

impl Cooldowns {
    /// No player is cooling down.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Time left before `player` may act, zero if ready.
    #[must_use]
    pub fn remaining(&self, player: PlayerId, now: SimTime) -> Duration {
        self.ready_at
            .get(&player)
            .map_or(Duration::ZERO, |&ready| ready.saturating_since(now))
    }

    /// Whether `player` may act at `now`.
    #[must_use]
    pub fn is_ready(&self, player: PlayerId, now: SimTime) -> bool {
        self.remaining(player, now).is_zero()
    }

    /// Start the cooldown after a successful action at `now`.
    pub fn start(&mut self, player: PlayerId, now: SimTime) {
        self.ready_at.insert(player, now + CLICK_COOLDOWN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_window() {
        let mut cooldowns = Cooldowns::new();
        let t0 = SimTime::from_millis(1_000);
        assert!(cooldowns.is_ready(1, t0));

        cooldowns.start(1, t0);
        assert!(!cooldowns.is_ready(1, SimTime::from_millis(1_499)));
        assert_eq!(cooldowns.remaining(1, SimTime::from_millis(1_200)), Duration::from_millis(300));
        assert!(cooldowns.is_ready(1, SimTime::from_millis(1_500)));
        assert!(cooldowns.is_ready(2, t0));
    }
}
