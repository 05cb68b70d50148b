//! The match authority.
//!
//! [`Match`] owns every piece of mutable match state and is the only thing that mutates
//! it. Requests are applied one at a time through `&mut self`; observers read the
//! resulting [`MatchEvent`]s with [`Match::drain_events`].

use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::MatchConfig;
use crate::error::MatchError;
use crate::game::invariants::assert_invariants;
use crate::game::resolver::resolve;
use crate::game::spawn::{try_assign, PendingSpawn, SpawnOutcome};
use crate::game::{
    ActionOutcome, CellId, Cooldowns, GridState, MatchEvent, MatchResult, Player, PlayerId,
    Rejection, Roster, SimTime, Skill, WinConditionEvaluator,
};
use crate::hex::Coord;
use crate::mapgen::{generate_layout, MapLayout};

/// How a request names its target cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellRef {
    /// By cell id.
    Id(CellId),
    /// By board coordinate.
    Coord(Coord),
}

/// A player's click on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Target cell.
    pub target: CellRef,
    /// Acting player.
    pub player: PlayerId,
}

impl ActionRequest {
    /// Click the cell at `coord`.
    #[must_use]
    pub const fn at(player: PlayerId, coord: Coord) -> Self {
        Self {
            target: CellRef::Coord(coord),
            player,
        }
    }
}

/// Complete state of one match.
#[derive(Debug, Clone)]
pub struct Match {
    config: MatchConfig,
    rng: ChaCha8Rng,
    layout: Option<MapLayout>,
    grid: Option<GridState>,
    roster: Roster,
    cooldowns: Cooldowns,
    evaluator: WinConditionEvaluator,
    pending_spawns: Vec<PendingSpawn>,
    events: Vec<MatchEvent>,
}

impl Match {
    /// Create a match with no players and no grid.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Config`] if the configuration is invalid.
    pub fn new(config: MatchConfig) -> Result<Self, MatchError> {
        config.validate()?;
        Ok(Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            layout: None,
            grid: None,
            roster: Roster::new(),
            cooldowns: Cooldowns::new(),
            evaluator: WinConditionEvaluator::new(),
            pending_spawns: Vec::new(),
            events: Vec::new(),
        })
    }

    /// Match configuration.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// The layout, once the grid is built.
    #[must_use]
    pub const fn layout(&self) -> Option<&MapLayout> {
        self.layout.as_ref()
    }

    /// The board, once built.
    #[must_use]
    pub const fn grid(&self) -> Option<&GridState> {
        self.grid.as_ref()
    }

    /// All registered players.
    #[must_use]
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    /// A player by id.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.roster.get(id)
    }

    /// Raw mutable access to a player record. Unlike [`Match::grant_skill`] and the other
    /// setters this performs no elimination or match-over check.
    #[must_use]
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.roster.get_mut(id)
    }

    /// The result, once the match is decided.
    #[must_use]
    pub const fn result(&self) -> Option<&MatchResult> {
        self.evaluator.result()
    }

    /// Whether the match has a result.
    #[must_use]
    pub const fn is_decided(&self) -> bool {
        self.evaluator.is_decided()
    }

    /// Register a player.
    ///
    /// # Errors
    ///
    /// Rejects id 0, ids beyond `max_players` and ids already taken.
    pub fn join(&mut self, id: PlayerId, name: impl Into<String>) -> Result<(), MatchError> {
        if id == 0 {
            return Err(MatchError::ReservedPlayerId);
        }
        if id > self.config.max_players {
            return Err(MatchError::PlayerOutOfRange {
                id,
                max: self.config.max_players,
            });
        }
        if self.roster.contains(id) {
            return Err(MatchError::DuplicatePlayer(id));
        }
        let player = Player::new(id, name);
        debug!(player = id, name = %player.name, "joined");
        self.roster.insert(player);
        Ok(())
    }

    /// Generate the board and give every registered player a starting cell.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::GridAlreadyBuilt`] on a second call, or
    /// [`MatchError::MapGen`] if the map has no active cells.
    pub fn build_grid(&mut self, now: SimTime) -> Result<(), MatchError> {
        if self.grid.is_some() {
            return Err(MatchError::GridAlreadyBuilt);
        }
        let layout = generate_layout(&self.config, &mut self.rng)?;
        let grid = GridState::build(&layout, &mut self.rng);
        info!(
            cells = grid.len(),
            map = %self.config.map,
            mines = layout.gold_mines().len(),
            "grid created"
        );
        self.layout = Some(layout);
        self.grid = Some(grid);

        let ids: Vec<PlayerId> = self.roster.iter().map(|p| p.id).collect();
        for id in ids {
            self.ensure_spawn(id, now);
        }
        Ok(())
    }

    /// Give `player` a starting cell now, or schedule retries if the grid or the player
    /// record is not there yet.
    ///
    /// A player is placed at most once. Requests for eliminated players, or made after the
    /// match is decided, are dropped without touching the board.
    pub fn ensure_spawn(&mut self, player: PlayerId, now: SimTime) {
        if self.try_spawn(player).is_resolved() {
            return;
        }
        if self.pending_spawns.iter().any(|p| p.player == player) {
            return;
        }
        debug!(player, "spawn deferred");
        self.pending_spawns.push(PendingSpawn::new(player, now));
    }

    fn try_spawn(&mut self, player: PlayerId) -> SpawnOutcome {
        if player == 0 || player > self.config.max_players {
            return SpawnOutcome::NoSlot;
        }
        if self.is_decided()
            || self
                .roster
                .get(player)
                .is_some_and(|p| p.eliminated || p.spawned)
        {
            debug!(player, "spawn request ignored");
            return SpawnOutcome::Ineligible;
        }
        let Some(grid) = self.grid.as_mut() else {
            return SpawnOutcome::NotReady;
        };
        if !self.roster.contains(player) {
            return SpawnOutcome::NotReady;
        }
        let planned = self.layout.as_ref().and_then(|l| l.planned_spawn(player));
        let outcome = try_assign(grid, planned, player, self.config.max_players);
        match outcome {
            SpawnOutcome::Assigned { cell, coord } => {
                if let Some(p) = self.roster.get_mut(player) {
                    p.spawned = true;
                }
                debug!(player, %coord, "spawn assigned");
                self.flush_cell_changes();
                self.events.push(MatchEvent::SpawnAssigned { player, cell, coord });
            }
            SpawnOutcome::Occupied { holder, .. } => {
                debug!(player, holder, "spawn cell already held");
            }
            SpawnOutcome::NoSlot | SpawnOutcome::Ineligible | SpawnOutcome::NotReady => {}
        }
        outcome
    }

    /// Retry pending spawns that are due at `now`.
    ///
    /// A spawn still unresolved at its deadline is dropped with a warning and a
    /// [`MatchEvent::SpawnFailed`]. Once the match is decided pending spawns are dropped.
    pub fn tick(&mut self, now: SimTime) {
        if self.is_decided() {
            self.pending_spawns.clear();
            return;
        }
        let pending = std::mem::take(&mut self.pending_spawns);
        for mut spawn in pending {
            if !spawn.is_due(now) {
                self.pending_spawns.push(spawn);
                continue;
            }
            if self.try_spawn(spawn.player).is_resolved() {
                continue;
            }
            if spawn.is_expired(now) {
                warn!(player = spawn.player, "failed to assign starting cell (timeout)");
                self.events.push(MatchEvent::SpawnFailed { player: spawn.player });
                continue;
            }
            spawn.reschedule(now);
            self.pending_spawns.push(spawn);
        }
    }

    /// Earliest time a pending spawn wants a [`Match::tick`].
    #[must_use]
    pub fn next_wakeup(&self) -> Option<SimTime> {
        self.pending_spawns.iter().map(|p| p.next_attempt).min()
    }

    /// Whether any spawn is waiting for a retry.
    #[must_use]
    pub fn has_pending_spawns(&self) -> bool {
        !self.pending_spawns.is_empty()
    }

    /// Apply one action request at `now`.
    ///
    /// Normal actions are throttled per player; skills are not. After any successful
    /// action the win condition is evaluated.
    pub fn submit(&mut self, request: ActionRequest, now: SimTime) -> ActionOutcome {
        let outcome = self.apply(request, now);
        match outcome {
            ActionOutcome::Rejected(reason) => {
                debug!(player = request.player, %reason, "action rejected");
            }
            _ => self.after_success(request.player, &outcome, now),
        }
        outcome
    }

    fn apply(&mut self, request: ActionRequest, now: SimTime) -> ActionOutcome {
        if self.is_decided() {
            return ActionOutcome::Rejected(Rejection::MatchOver);
        }
        let Some(grid) = self.grid.as_mut() else {
            return ActionOutcome::Rejected(Rejection::GridNotReady);
        };
        let cell = match request.target {
            CellRef::Id(id) => grid.cell(id).map(|_| id),
            CellRef::Coord(coord) => grid.id_at(coord),
        };
        let Some(cell) = cell else {
            return ActionOutcome::Rejected(Rejection::UnknownCell);
        };
        let Some(player) = self.roster.get(request.player) else {
            return ActionOutcome::Rejected(Rejection::UnknownPlayer);
        };
        if player.active_skill.is_none() {
            let remaining = self.cooldowns.remaining(request.player, now);
            if !remaining.is_zero() {
                return ActionOutcome::Rejected(Rejection::CoolingDown { remaining });
            }
        }
        resolve(grid, &mut self.roster, cell, request.player, now)
    }

    fn after_success(&mut self, player: PlayerId, outcome: &ActionOutcome, now: SimTime) {
        if outcome.is_normal_success() {
            self.cooldowns.start(player, now);
        }
        self.flush_cell_changes();

        let Some(grid) = self.grid.as_ref() else {
            return;
        };
        let evaluation = self.evaluator.evaluate(grid, &mut self.roster);
        for id in evaluation.eliminated {
            self.events.push(MatchEvent::PlayerEliminated { player: id });
        }
        match evaluation.decided {
            Some(MatchResult::Won(signal)) => self.events.push(MatchEvent::MatchWon(signal)),
            Some(MatchResult::Draw) => self.events.push(MatchEvent::MatchDrawn),
            None => {}
        }

        assert_invariants(self);
    }

    fn flush_cell_changes(&mut self) {
        if let Some(grid) = self.grid.as_mut() {
            self.events
                .extend(grid.take_changes().into_iter().map(MatchEvent::CellChanged));
        }
    }

    /// Take all events emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        self.flush_cell_changes();
        std::mem::take(&mut self.events)
    }

    /// Time before `player` may make another normal action.
    #[must_use]
    pub fn cooldown_remaining(&self, player: PlayerId, now: SimTime) -> Duration {
        self.cooldowns.remaining(player, now)
    }

    /// Passive income for `player` at `now`: one plus one per unfrozen gold mine owned.
    ///
    /// `None` for unknown or eliminated players and players without cells.
    #[must_use]
    pub fn passive_income(&self, player: PlayerId, now: SimTime) -> Option<u32> {
        let grid = self.grid.as_ref()?;
        if self.roster.get(player)?.eliminated {
            return None;
        }
        let mut owned = 0_u32;
        let mut mines = 0_u32;
        for (_, cell) in grid.owned_by(player) {
            owned += 1;
            if cell.gold_mine && !cell.is_frozen(now) {
                mines += 1;
            }
        }
        (owned > 0).then_some(1 + mines)
    }

    /// Hand `player` a skill for their next action.
    ///
    /// Returns `false` for unknown or eliminated players and once the match is decided.
    pub fn grant_skill(&mut self, player: PlayerId, skill: Skill) -> bool {
        self.live_player_mut(player)
            .map(|p| p.active_skill = Some(skill))
            .is_some()
    }

    /// Set a player's attack power. Refused like [`Match::grant_skill`].
    pub fn set_power(&mut self, player: PlayerId, power: u32) -> bool {
        self.live_player_mut(player).map(|p| p.power = power).is_some()
    }

    /// Grant or revoke vampirism. Refused like [`Match::grant_skill`].
    pub fn set_vampirism(&mut self, player: PlayerId, enabled: bool) -> bool {
        self.live_player_mut(player)
            .map(|p| p.has_vampirism = enabled)
            .is_some()
    }

    fn live_player_mut(&mut self, player: PlayerId) -> Option<&mut Player> {
        if self.is_decided() {
            debug!(player, "economy update after match end ignored");
            return None;
        }
        let p = self.roster.get_mut(player)?;
        if p.eliminated {
            debug!(player, "economy update for eliminated player ignored");
            return None;
        }
        Some(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapKind;
    use crate::game::STARTING_FORCE;

    fn two_player_match() -> Match {
        let mut m = Match::new(MatchConfig {
            width: 6,
            height: 6,
            max_players: 2,
            seed: 11,
            ..MatchConfig::default()
        })
        .unwrap();
        m.join(1, "ada").unwrap();
        m.join(2, "bo").unwrap();
        m.build_grid(SimTime::ZERO).unwrap();
        m
    }

    #[test]
    fn test_join_validation() {
        let mut m = Match::new(MatchConfig { max_players: 2, ..MatchConfig::default() }).unwrap();
        assert!(matches!(m.join(0, "x"), Err(MatchError::ReservedPlayerId)));
        assert!(matches!(m.join(3, "x"), Err(MatchError::PlayerOutOfRange { id: 3, max: 2 })));
        m.join(1, "a").unwrap();
        assert!(matches!(m.join(1, "b"), Err(MatchError::DuplicatePlayer(1))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MatchConfig { width: 0, ..MatchConfig::default() };
        assert!(matches!(Match::new(config), Err(MatchError::Config(_))));
    }

    #[test]
    fn test_build_grid_spawns_players() {
        let mut m = two_player_match();
        let grid = m.grid().unwrap();
        let p1 = grid.cell_at(Coord::new(0, 0)).unwrap();
        let p2 = grid.cell_at(Coord::new(5, 0)).unwrap();
        assert_eq!((p1.owner, p1.force), (Some(1), STARTING_FORCE));
        assert_eq!((p2.owner, p2.force), (Some(2), STARTING_FORCE));
        assert!(m.player(1).unwrap().spawned);

        let events = m.drain_events();
        let spawns = events
            .iter()
            .filter(|e| matches!(e, MatchEvent::SpawnAssigned { .. }))
            .count();
        assert_eq!(spawns, 2);
        assert!(matches!(m.build_grid(SimTime::ZERO), Err(MatchError::GridAlreadyBuilt)));
    }

    #[test]
    fn test_submit_before_grid() {
        let mut m = Match::new(MatchConfig::default()).unwrap();
        m.join(1, "a").unwrap();
        let outcome = m.submit(ActionRequest::at(1, Coord::new(0, 0)), SimTime::ZERO);
        assert_eq!(outcome, ActionOutcome::Rejected(Rejection::GridNotReady));
    }

    #[test]
    fn test_cooldown_applies_to_normal_actions_only() {
        let mut m = two_player_match();
        let home = ActionRequest::at(1, Coord::new(0, 0));

        assert!(m.submit(home, SimTime::from_millis(1_000)).succeeded());
        let outcome = m.submit(home, SimTime::from_millis(1_200));
        assert_eq!(
            outcome,
            ActionOutcome::Rejected(Rejection::CoolingDown { remaining: Duration::from_millis(300) })
        );
        assert_eq!(m.cooldown_remaining(1, SimTime::from_millis(1_400)), Duration::from_millis(100));

        // Skills bypass the cooldown and do not restart it.
        m.grant_skill(1, Skill::Emp);
        assert!(m.submit(ActionRequest::at(1, Coord::new(3, 3)), SimTime::from_millis(1_300)).succeeded());
        assert_eq!(m.cooldown_remaining(1, SimTime::from_millis(1_300)), Duration::from_millis(200));

        assert!(m.submit(home, SimTime::from_millis(1_500)).succeeded());
    }

    #[test]
    fn test_failed_action_does_not_start_cooldown() {
        let mut m = two_player_match();
        let far = ActionRequest::at(1, Coord::new(3, 3));
        assert_eq!(m.submit(far, SimTime::ZERO), ActionOutcome::Rejected(Rejection::NotAdjacent));
        assert!(m.cooldown_remaining(1, SimTime::ZERO).is_zero());
    }

    #[test]
    fn test_unknown_target() {
        let mut m = two_player_match();
        let outcome = m.submit(ActionRequest { target: CellRef::Id(CellId(10_000)), player: 1 }, SimTime::ZERO);
        assert_eq!(outcome, ActionOutcome::Rejected(Rejection::UnknownCell));
        let outcome = m.submit(ActionRequest::at(1, Coord::new(-1, 2)), SimTime::ZERO);
        assert_eq!(outcome, ActionOutcome::Rejected(Rejection::UnknownCell));
        let outcome = m.submit(ActionRequest::at(9, Coord::new(0, 0)), SimTime::ZERO);
        assert_eq!(outcome, ActionOutcome::Rejected(Rejection::UnknownPlayer));
    }

    #[test]
    fn test_events_follow_action() {
        let mut m = two_player_match();
        m.drain_events();
        m.submit(ActionRequest::at(1, Coord::new(0, 0)), SimTime::ZERO);
        let events = m.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], MatchEvent::CellChanged(change) if change.cell.force == STARTING_FORCE + 10));
    }

    #[test]
    fn test_spawn_retry_until_player_joins() {
        let mut m = Match::new(MatchConfig { width: 5, height: 5, max_players: 2, ..MatchConfig::default() }).unwrap();
        m.build_grid(SimTime::ZERO).unwrap();

        m.ensure_spawn(2, SimTime::ZERO);
        assert!(m.has_pending_spawns());
        assert_eq!(m.next_wakeup(), Some(SimTime::from_millis(100)));

        m.tick(SimTime::from_millis(100));
        assert!(m.has_pending_spawns());

        m.join(2, "late").unwrap();
        m.tick(SimTime::from_millis(150));
        assert!(m.has_pending_spawns(), "not due until 200ms");
        m.tick(SimTime::from_millis(200));
        assert!(!m.has_pending_spawns());
        assert_eq!(m.grid().unwrap().cell_at(Coord::new(4, 0)).unwrap().owner, Some(2));
    }

    #[test]
    fn test_spawn_gives_up_after_timeout() {
        let mut m = Match::new(MatchConfig { width: 5, height: 5, ..MatchConfig::default() }).unwrap();
        m.build_grid(SimTime::ZERO).unwrap();
        m.ensure_spawn(3, SimTime::ZERO);

        let mut t = 0;
        while m.has_pending_spawns() {
            t += 100;
            m.tick(SimTime::from_millis(t));
            assert!(t <= 5_000, "retry never gave up");
        }
        assert_eq!(t, 5_000);
        let failed: Vec<_> = m
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, MatchEvent::SpawnFailed { player: 3 }))
            .collect();
        assert_eq!(failed.len(), 1);
    }

    #[test]
    fn test_spawn_is_one_shot() {
        let mut m = two_player_match();
        assert!(m.submit(ActionRequest::at(1, Coord::new(0, 0)), SimTime::ZERO).succeeded());
        m.drain_events();

        m.ensure_spawn(1, SimTime::from_millis(600));
        assert!(!m.has_pending_spawns());
        assert!(m.drain_events().is_empty());
        assert_eq!(m.grid().unwrap().cell_at(Coord::new(0, 0)).unwrap().force, STARTING_FORCE + 10);
    }

    #[test]
    fn test_out_of_range_spawn_resolves_immediately() {
        let mut m = Match::new(MatchConfig { max_players: 2, ..MatchConfig::default() }).unwrap();
        m.ensure_spawn(4, SimTime::ZERO);
        assert!(!m.has_pending_spawns());
    }

    #[test]
    fn test_passive_income() {
        let mut m = Match::new(MatchConfig {
            width: 10,
            height: 10,
            max_players: 2,
            map: MapKind::Full,
            seed: 3,
            ..MatchConfig::default()
        })
        .unwrap();
        m.join(1, "a").unwrap();
        m.join(2, "b").unwrap();
        assert_eq!(m.passive_income(1, SimTime::ZERO), None);
        m.build_grid(SimTime::ZERO).unwrap();

        assert_eq!(m.passive_income(1, SimTime::ZERO), Some(1));
        assert_eq!(m.passive_income(7, SimTime::ZERO), None);
    }

    #[test]
    fn test_economy_hooks() {
        let mut m = two_player_match();
        assert!(m.set_power(1, 33));
        assert!(m.set_vampirism(1, true));
        assert!(m.grant_skill(1, Skill::Trap));
        assert!(!m.set_power(9, 1));
        let p = m.player(1).unwrap();
        assert_eq!((p.power, p.has_vampirism, p.active_skill), (33, true, Some(Skill::Trap)));
        m.player_mut(2).unwrap().name = "renamed".to_string();
        assert_eq!(m.roster().name_of(2), "renamed");
    }
}
