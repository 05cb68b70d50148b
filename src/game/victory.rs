//! Elimination and win detection.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::game::{GridState, PlayerId, Roster};

/// Announcement of the winner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinSignal {
    /// Winning player.
    pub winner_id: PlayerId,
    /// Winner's display name, or `"Player <id>"` if the roster has no record.
    pub winner_name: String,
}

/// How a match ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    /// One player owns every owned cell.
    Won(WinSignal),
    /// Every cell went neutral after players had spawned.
    Draw,
}

/// Outcome of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Players eliminated by this pass, in id order.
    pub eliminated: Vec<PlayerId>,
    /// The match result, if this pass decided the match.
    pub decided: Option<MatchResult>,
}

/// Tracks whether the match has been decided and applies eliminations.
#[derive(Debug, Clone, Default)]
pub struct WinConditionEvaluator {
    result: Option<MatchResult>,
}

impl WinConditionEvaluator {
    /// A fresh, undecided evaluator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The result, once decided.
    #[must_use]
    pub const fn result(&self) -> Option<&MatchResult> {
        self.result.as_ref()
    }

    /// Whether the match has been decided.
    #[must_use]
    pub const fn is_decided(&self) -> bool {
        self.result.is_some()
    }

    /// Tally owners and update eliminations and the result.
    ///
    /// A spawned, non-eliminated player with no cells is eliminated and loses any held
    /// skill. A single remaining owner wins. If nobody owns anything although some player
    /// has spawned, the match is a draw. Once decided, further calls do nothing.
    pub fn evaluate(&mut self, grid: &GridState, roster: &mut Roster) -> Evaluation {
        let mut evaluation = Evaluation::default();
        if self.is_decided() {
            return evaluation;
        }

        let tally = grid.tally_owners();

        for player in roster.iter_mut() {
            if player.eliminated || !player.spawned || tally.contains_key(&player.id) {
                continue;
            }
            player.eliminate();
            debug!(player = player.id, "eliminated");
            evaluation.eliminated.push(player.id);
        }

        let mut owners = tally.keys().copied();
        match (owners.next(), owners.next()) {
            (Some(winner_id), None) => {
                let winner_name = roster.name_of(winner_id);
                info!(winner = winner_id, name = %winner_name, "match won");
                let result = MatchResult::Won(WinSignal { winner_id, winner_name });
                self.result = Some(result.clone());
                evaluation.decided = Some(result);
            }
            (None, _) => {
                warn!("no player owns any cell");
                if roster.iter().any(|p| p.spawned) {
                    self.result = Some(MatchResult::Draw);
                    evaluation.decided = Some(MatchResult::Draw);
                }
            }
            (Some(_), Some(_)) => {}
        }
        evaluation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Cell, Player, Skill};
    use crate::hex::Coord;

    fn setup(owners: &[Option<PlayerId>]) -> (GridState, Roster) {
        let cells = owners
            .iter()
            .enumerate()
            .map(|(x, &owner)| {
                let mut cell = Cell::neutral(Coord::new(x as i32, 0), 10, false);
                cell.owner = owner;
                cell
            })
            .collect();
        let grid = GridState::from_cells(owners.len() as u16, 1, cells);

        let mut roster = Roster::new();
        for id in 1..=3 {
            let mut p = Player::new(id, format!("p{id}"));
            p.spawned = true;
            roster.insert(p);
        }
        (grid, roster)
    }

    #[test]
    fn test_no_decision_with_two_owners() {
        let (grid, mut roster) = setup(&[Some(1), Some(2), None]);
        let mut eval = WinConditionEvaluator::new();
        let result = eval.evaluate(&grid, &mut roster);
        assert_eq!(result.eliminated, vec![3]);
        assert!(result.decided.is_none());
        assert!(roster.get(3).unwrap().eliminated);
        assert!(!eval.is_decided());
    }

    #[test]
    fn test_single_owner_wins_once() {
        let (grid, mut roster) = setup(&[Some(2), None, Some(2)]);
        let mut eval = WinConditionEvaluator::new();

        let first = eval.evaluate(&grid, &mut roster);
        assert_eq!(
            first.decided,
            Some(MatchResult::Won(WinSignal { winner_id: 2, winner_name: "p2".to_string() }))
        );
        assert_eq!(first.eliminated, vec![1, 3]);

        let second = eval.evaluate(&grid, &mut roster);
        assert_eq!(second, Evaluation::default());
        assert!(eval.is_decided());
    }

    #[test]
    fn test_winner_name_fallback() {
        let (grid, mut roster) = setup(&[Some(7)]);
        let mut eval = WinConditionEvaluator::new();
        let result = eval.evaluate(&grid, &mut roster);
        assert!(matches!(
            result.decided,
            Some(MatchResult::Won(WinSignal { winner_id: 7, ref winner_name })) if winner_name == "Player 7"
        ));
    }

    #[test]
    fn test_elimination_clears_skill_and_happens_once() {
        let (grid, mut roster) = setup(&[Some(1), Some(2)]);
        roster.get_mut(3).unwrap().active_skill = Some(Skill::Trap);
        let mut eval = WinConditionEvaluator::new();

        assert_eq!(eval.evaluate(&grid, &mut roster).eliminated, vec![3]);
        assert!(roster.get(3).unwrap().active_skill.is_none());
        assert!(eval.evaluate(&grid, &mut roster).eliminated.is_empty());
    }

    #[test]
    fn test_unspawned_players_survive() {
        let (grid, mut roster) = setup(&[Some(1), Some(2)]);
        roster.get_mut(3).unwrap().spawned = false;
        let mut eval = WinConditionEvaluator::new();
        assert!(eval.evaluate(&grid, &mut roster).eliminated.is_empty());
    }

    #[test]
    fn test_zero_owners_is_draw() {
        let (grid, mut roster) = setup(&[None, None]);
        let mut eval = WinConditionEvaluator::new();
        let result = eval.evaluate(&grid, &mut roster);
        assert_eq!(result.decided, Some(MatchResult::Draw));
        assert_eq!(result.eliminated, vec![1, 2, 3]);
    }

    #[test]
    fn test_zero_owners_before_spawn_is_undecided() {
        let (grid, mut roster) = setup(&[None, None]);
        for p in roster.iter_mut() {
            p.spawned = false;
        }
        let mut eval = WinConditionEvaluator::new();
        assert!(eval.evaluate(&grid, &mut roster).decided.is_none());
        assert!(!eval.is_decided());
    }
}
