//! Match invariants - sanity checks that detect bugs.
//!
//! None of these should ever trigger in a correctly implemented match. If one does, the
//! rules have a bug. The force bound is a sanity check, not a gameplay limit.

use std::collections::BTreeSet;

use crate::game::{Match, MatchResult, PlayerId};

/// Sanity bound: force on a single cell should never exceed this.
pub const SANITY_MAX_FORCE: u32 = 100_000_000;

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all match invariants.
///
/// Returns the violations found, or an empty list if all invariants hold.
#[must_use]
pub fn check_invariants(state: &Match) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let Some(grid) = state.grid() else {
        return violations;
    };
    let roster = state.roster();
    let mut violation = |message: String| violations.push(InvariantViolation { message });

    let mut owners = BTreeSet::new();
    for (id, cell) in grid.iter() {
        if grid.id_at(cell.coord) != Some(id) {
            violation(format!("Cell {id} at {} is not found by its coordinate", cell.coord));
        }
        if cell.force > SANITY_MAX_FORCE {
            violation(format!(
                "Cell {id} has force {} > sanity max {SANITY_MAX_FORCE}",
                cell.force
            ));
        }
        if let Some(owner) = cell.owner {
            owners.insert(owner);
            if !roster.contains(owner) {
                violation(format!("Cell {id} owned by unregistered player {owner}"));
            }
        }
        if let Some(trap_owner) = cell.trap_owner.filter(|&t| !roster.contains(t)) {
            violation(format!("Cell {id} holds a trap of unregistered player {trap_owner}"));
        }
    }

    for player in roster.iter().filter(|p| p.eliminated) {
        if owners.contains(&player.id) {
            let territory = grid.owned_by(player.id).count();
            violation(format!(
                "Eliminated player {} still owns {territory} cells",
                player.id
            ));
        }
        if player.active_skill.is_some() {
            violation(format!("Eliminated player {} still holds a skill", player.id));
        }
    }

    if let Some(MatchResult::Won(signal)) = state.result() {
        let expected: BTreeSet<PlayerId> = [signal.winner_id].into();
        if owners != expected {
            violation(format!(
                "Winner {} is not the sole owner (owners: {owners:?})",
                signal.winner_id
            ));
        }
    }

    violations
}

/// Assert all match invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(state: &Match) {
    let violations = check_invariants(state);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Match invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_state: &Match) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::game::{ActionRequest, SimTime, Skill};
    use crate::hex::Coord;

    fn started_match() -> Match {
        let mut m = Match::new(MatchConfig {
            width: 5,
            height: 5,
            max_players: 2,
            ..MatchConfig::default()
        })
        .unwrap();
        m.join(1, "a").unwrap();
        m.join(2, "b").unwrap();
        m.build_grid(SimTime::ZERO).unwrap();
        m
    }

    #[test]
    fn test_fresh_match_passes() {
        let m = Match::new(MatchConfig::default()).unwrap();
        assert!(check_invariants(&m).is_empty());
        assert!(check_invariants(&started_match()).is_empty());
    }

    #[test]
    fn test_eliminated_player_with_skill_detected() {
        let mut m = started_match();
        let player = m.player_mut(2).unwrap();
        player.eliminated = true;
        player.active_skill = Some(Skill::Emp);

        let violations = check_invariants(&m);
        assert_eq!(violations.len(), 2);
        assert!(violations[0].message.contains("still owns 1 cells"));
        assert!(violations[1].message.contains("skill"));
    }

    #[test]
    fn test_force_exactly_at_max_passes() {
        let mut m = started_match();
        m.set_power(1, SANITY_MAX_FORCE - 200);
        m.submit(ActionRequest::at(1, Coord::new(0, 0)), SimTime::ZERO);
        assert_eq!(m.grid().unwrap().cell_at(Coord::new(0, 0)).unwrap().force, SANITY_MAX_FORCE);
        assert!(check_invariants(&m).is_empty());
    }

    #[test]
    fn test_force_one_above_max_fails() {
        let mut m = started_match();
        m.set_power(1, SANITY_MAX_FORCE - 199);
        // The debug assertion inside submit fires on the offending action.
        let result = std::panic::catch_unwind(move || {
            m.submit(ActionRequest::at(1, Coord::new(0, 0)), SimTime::ZERO);
        });
        assert_eq!(result.is_err(), cfg!(debug_assertions));
    }
}
