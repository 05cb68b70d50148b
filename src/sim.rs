//! Seeded random-bot matches for soak testing.
//!
//! Provides a pure function interface: `(seed, config) -> MatchSummary`.
//!
//! Each bot clicks once per tick on a random cell in or next to its territory. A toy
//! economy stands in for the real one: bots earn [`Match::passive_income`] every second
//! and spend it on skills and power upgrades. Invariants are asserted after every
//! action in debug builds.

use std::collections::BTreeMap;
use std::ops::Range;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::config::MatchConfig;
use crate::error::MatchError;
use crate::game::{
    ActionOutcome, ActionRequest, CellId, CellRef, Match, MatchEvent, MatchResult, PlayerId,
    SimTime, Skill,
};

/// Gold a bot pays for a random skill.
pub const SKILL_COST: u32 = 15;

/// Gold a bot pays for a power upgrade.
pub const UPGRADE_COST: u32 = 25;

/// Power added by one upgrade.
pub const UPGRADE_STEP: u32 = 5;

const SKILLS: [Skill; 4] = [Skill::Artillery, Skill::Emp, Skill::DeepStrike, Skill::Trap];

/// Salt separating the bot RNG stream from the map RNG stream.
const BOT_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Soak run parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoakConfig {
    /// Board and player count. The seed is replaced per match.
    pub match_config: MatchConfig,
    /// Ticks before a match is abandoned as undecided.
    pub max_ticks: u32,
    /// Simulated time between ticks.
    pub tick: Duration,
    /// Chance per tick that a bot with enough gold buys a skill.
    pub skill_chance: f64,
    /// Chance per tick that a bot with enough gold buys an upgrade.
    pub upgrade_chance: f64,
}

impl Default for SoakConfig {
    fn default() -> Self {
        Self {
            match_config: MatchConfig::default(),
            max_ticks: 3_000,
            tick: Duration::from_millis(100),
            skill_chance: 0.05,
            upgrade_chance: 0.05,
        }
    }
}

/// Result of a single random match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    /// Seed used for the map and the bots.
    pub seed: u64,
    /// Ticks played.
    pub ticks: u32,
    /// Actions submitted.
    pub actions: u64,
    /// Actions rejected.
    pub rejected: u64,
    /// Skills consumed.
    pub skills_used: u64,
    /// Captures that set off a trap.
    pub traps_triggered: u64,
    /// Events emitted.
    pub events: u64,
    /// Players in elimination order.
    pub eliminated: Vec<PlayerId>,
    /// Result, or `None` if the tick limit was hit.
    pub result: Option<MatchResult>,
    /// Cells owned per player at the end.
    pub territory: BTreeMap<PlayerId, usize>,
}

/// Run one seeded random match.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the map is empty.
pub fn run_random_match(seed: u64, soak: &SoakConfig) -> Result<MatchSummary, MatchError> {
    let config = MatchConfig {
        seed,
        ..soak.match_config
    };
    let mut state = Match::new(config)?;
    for id in 1..=config.max_players {
        state.join(id, format!("bot-{id}"))?;
    }
    state.build_grid(SimTime::ZERO)?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ BOT_STREAM);
    let mut gold: BTreeMap<PlayerId, u32> = BTreeMap::new();
    let mut summary = MatchSummary {
        seed,
        ticks: 0,
        actions: 0,
        rejected: 0,
        skills_used: 0,
        traps_triggered: 0,
        events: 0,
        eliminated: Vec::new(),
        result: None,
        territory: BTreeMap::new(),
    };
    let mut last_income = SimTime::ZERO;

    while summary.ticks < soak.max_ticks && !state.is_decided() {
        summary.ticks += 1;
        let now = SimTime::ZERO + soak.tick * summary.ticks;
        state.tick(now);

        let pay_income = now.saturating_since(last_income) >= Duration::from_secs(1);
        if pay_income {
            last_income = now;
        }

        let bots: Vec<PlayerId> = state
            .roster()
            .iter()
            .filter(|p| !p.eliminated && p.spawned)
            .map(|p| p.id)
            .collect();
        for bot in bots {
            if state.is_decided() {
                break;
            }
            if pay_income {
                let income = state.passive_income(bot, now).unwrap_or(0);
                *gold.entry(bot).or_default() += income;
            }
            shop(&mut state, &mut rng, soak, gold.entry(bot).or_default(), bot);

            let Some(target) = pick_target(&state, &mut rng, bot) else {
                continue;
            };
            summary.actions += 1;
            match state.submit(ActionRequest { target: CellRef::Id(target), player: bot }, now) {
                ActionOutcome::Rejected(_) => summary.rejected += 1,
                ActionOutcome::SkillUsed { .. } => summary.skills_used += 1,
                ActionOutcome::Captured { trap_triggered: true, .. } => summary.traps_triggered += 1,
                _ => {}
            }
        }

        for event in state.drain_events() {
            summary.events += 1;
            if let MatchEvent::PlayerEliminated { player } = event {
                summary.eliminated.push(player);
            }
        }
    }

    summary.result = state.result().cloned();
    if let Some(grid) = state.grid() {
        summary.territory = grid.tally_owners();
    }
    debug!(seed, ticks = summary.ticks, decided = summary.result.is_some(), "soak match finished");
    Ok(summary)
}

fn shop(state: &mut Match, rng: &mut ChaCha8Rng, soak: &SoakConfig, gold: &mut u32, bot: PlayerId) {
    let Some(player) = state.player(bot) else {
        return;
    };
    let (power, holding) = (player.power, player.active_skill.is_some());

    if !holding && *gold >= SKILL_COST && rng.gen_bool(soak.skill_chance) {
        *gold -= SKILL_COST;
        state.grant_skill(bot, SKILLS[rng.gen_range(0..SKILLS.len())]);
    }
    if *gold >= UPGRADE_COST && rng.gen_bool(soak.upgrade_chance) {
        *gold -= UPGRADE_COST;
        state.set_power(bot, power.saturating_add(UPGRADE_STEP));
    }
}

/// A random owned cell or one of its neighbors.
fn pick_target(state: &Match, rng: &mut ChaCha8Rng, bot: PlayerId) -> Option<CellId> {
    let grid = state.grid()?;
    let owned: Vec<CellId> = grid.owned_by(bot).map(|(id, _)| id).collect();
    if owned.is_empty() {
        return None;
    }
    let home = owned[rng.gen_range(0..owned.len())];
    let coord = grid.coord_of(home)?;
    let mut candidates: Vec<CellId> = grid.neighbor_ids(coord).collect();
    candidates.push(home);
    Some(candidates[rng.gen_range(0..candidates.len())])
}

/// Aggregated results over many random matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SoakStats {
    /// Matches that ran to a result or the tick limit.
    pub matches: u64,
    /// Matches that failed to start.
    pub errors: u64,
    /// Wins per player id.
    pub wins: BTreeMap<PlayerId, u64>,
    /// Drawn matches.
    pub draws: u64,
    /// Matches abandoned at the tick limit.
    pub undecided: u64,
    /// Total ticks across matches.
    pub ticks: u64,
    /// Total actions submitted.
    pub actions: u64,
    /// Total actions rejected.
    pub rejected: u64,
    /// Total skills consumed.
    pub skills_used: u64,
    /// Total trap detonations.
    pub traps_triggered: u64,
}

impl SoakStats {
    /// Fold in one match.
    pub fn add(&mut self, summary: &MatchSummary) {
        self.matches += 1;
        match &summary.result {
            Some(MatchResult::Won(signal)) => *self.wins.entry(signal.winner_id).or_default() += 1,
            Some(MatchResult::Draw) => self.draws += 1,
            None => self.undecided += 1,
        }
        self.ticks += u64::from(summary.ticks);
        self.actions += summary.actions;
        self.rejected += summary.rejected;
        self.skills_used += summary.skills_used;
        self.traps_triggered += summary.traps_triggered;
    }

    /// Merge stats accumulated on another thread.
    pub fn merge(&mut self, other: &Self) {
        self.matches += other.matches;
        self.errors += other.errors;
        for (&id, &wins) in &other.wins {
            *self.wins.entry(id).or_default() += wins;
        }
        self.draws += other.draws;
        self.undecided += other.undecided;
        self.ticks += other.ticks;
        self.actions += other.actions;
        self.rejected += other.rejected;
        self.skills_used += other.skills_used;
        self.traps_triggered += other.traps_triggered;
    }

    /// Share of matches that ended with a result.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn decided_rate(&self) -> f64 {
        if self.matches == 0 {
            return 0.0;
        }
        (self.matches - self.undecided) as f64 / self.matches as f64
    }
}

/// Run one random match per seed in parallel.
#[must_use]
pub fn run_soak(seeds: Range<u64>, soak: &SoakConfig) -> SoakStats {
    run_soak_with_progress(seeds, soak, |_| {})
}

/// [`run_soak`], calling `on_match` with each seed once its match has finished.
///
/// `on_match` runs on the rayon worker threads, in no particular seed order.
#[must_use]
pub fn run_soak_with_progress<F>(seeds: Range<u64>, soak: &SoakConfig, on_match: F) -> SoakStats
where
    F: Fn(u64) + Sync,
{
    // Each rayon job folds into its own stats; they are merged once at the end.
    seeds
        .into_par_iter()
        .fold(SoakStats::default, |mut stats, seed| {
            match run_random_match(seed, soak) {
                Ok(summary) => stats.add(&summary),
                Err(err) => {
                    debug!(seed, %err, "soak match failed to start");
                    stats.errors += 1;
                }
            }
            on_match(seed);
            stats
        })
        .reduce(SoakStats::default, |mut a, b| {
            a.merge(&b);
            a
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SoakConfig {
        SoakConfig {
            match_config: MatchConfig {
                width: 6,
                height: 6,
                max_players: 2,
                ..MatchConfig::default()
            },
            max_ticks: 400,
            ..SoakConfig::default()
        }
    }

    #[test]
    fn test_random_match_is_deterministic() {
        let a = run_random_match(5, &small()).unwrap();
        let b = run_random_match(5, &small()).unwrap();
        assert_eq!(a, b);
        assert!(a.actions > 0);
        assert!(a.ticks <= 400);
    }

    #[test]
    fn test_summary_is_consistent() {
        for seed in 0..5 {
            let summary = run_random_match(seed, &small()).unwrap();
            match &summary.result {
                Some(MatchResult::Won(signal)) => {
                    assert_eq!(summary.territory.keys().copied().collect::<Vec<_>>(), vec![signal.winner_id]);
                }
                Some(MatchResult::Draw) => assert!(summary.territory.is_empty()),
                None => assert_eq!(summary.ticks, 400),
            }
            assert!(summary.rejected <= summary.actions);
        }
    }

    #[test]
    fn test_soak_aggregates() {
        let stats = run_soak(0..6, &small());
        assert_eq!(stats.matches, 6);
        assert_eq!(stats.errors, 0);
        let wins: u64 = stats.wins.values().sum();
        assert_eq!(wins + stats.draws + stats.undecided, 6);
        assert!((0.0..=1.0).contains(&stats.decided_rate()));
    }

    #[test]
    fn test_progress_sees_every_seed() {
        let seen = std::sync::Mutex::new(Vec::new());
        let stats = run_soak_with_progress(10..18, &small(), |seed| {
            seen.lock().unwrap().push(seed);
        });
        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, (10..18).collect::<Vec<_>>());
        assert_eq!(stats, run_soak(10..18, &small()));
    }

    #[test]
    fn test_invalid_config_counts_as_error() {
        let mut soak = small();
        soak.match_config.width = 0;
        let stats = run_soak(0..3, &soak);
        assert_eq!((stats.matches, stats.errors), (0, 3));
    }
}
